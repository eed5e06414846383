//! Decision engine: one actuation decision per sampling cycle, computed
//! from the current reading and the active crop parameters. Sanity bounds
//! run before thresholds; a reading outside physical plausibility is a
//! sensor fault and the cycle keeps the pump off.

use thiserror::Error;

use crate::catalog::CropParameters;
use crate::state::SensorReading;

/// Physically plausible temperature band. Anything outside reads as a
/// wiring or sensor fault, not weather.
pub const TEMP_SANITY_MIN_C: f32 = -20.0;
pub const TEMP_SANITY_MAX_C: f32 = 100.0;

/// A calibrated reading outside the sanity bounds. Recovered locally: the
/// actuation result for the cycle is forced off and nothing is retried
/// faster than the normal cycle period.
#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum SensorOutOfRange {
    #[error("temperature {0} C outside plausible range [-20, 100]")]
    Temperature(f32),
    #[error("humidity {0} % outside plausible range [0, 100]")]
    Humidity(f32),
}

/// Decide whether to irrigate this cycle.
///
/// Irrigate iff the temperature sits inside the crop's band and soil
/// humidity has not passed `max_humidity_pct`; humidity above the maximum
/// means the soil is already wet enough. There is no hysteresis: the
/// decision is recomputed from scratch every cycle, so a reading hovering
/// on a boundary may chatter between cycles.
pub fn decide(reading: &SensorReading, params: &CropParameters) -> Result<bool, SensorOutOfRange> {
    // Sanity bounds first: never irrigate on suspect data.
    let t = reading.temperature_c;
    if !(TEMP_SANITY_MIN_C..=TEMP_SANITY_MAX_C).contains(&t) {
        return Err(SensorOutOfRange::Temperature(t));
    }
    let h = reading.humidity_pct;
    if !(0.0..=100.0).contains(&h) {
        return Err(SensorOutOfRange::Humidity(h));
    }

    Ok(t >= params.min_temp_c && t <= params.max_temp_c && h <= params.max_humidity_pct)
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn cilantro() -> CropParameters {
        CropParameters {
            min_temp_c: 15.0,
            max_temp_c: 24.0,
            min_humidity_pct: 40.0,
            max_humidity_pct: 50.0,
        }
    }

    fn reading(temperature_c: f32, humidity_pct: f32) -> SensorReading {
        SensorReading {
            temperature_c,
            humidity_pct,
        }
    }

    // -- Threshold evaluation ---------------------------------------------

    #[test]
    fn irrigates_inside_band_and_dry_enough() {
        assert_eq!(decide(&reading(20.0, 45.0), &cilantro()), Ok(true));
    }

    #[test]
    fn no_irrigation_when_soil_wet_enough() {
        assert_eq!(decide(&reading(20.0, 55.0), &cilantro()), Ok(false));
    }

    #[test]
    fn no_irrigation_above_temp_band() {
        assert_eq!(decide(&reading(30.0, 45.0), &cilantro()), Ok(false));
    }

    #[test]
    fn no_irrigation_below_temp_band() {
        assert_eq!(decide(&reading(10.0, 45.0), &cilantro()), Ok(false));
    }

    #[test]
    fn irrigates_when_very_dry() {
        // Humidity far below the crop minimum still triggers irrigation.
        assert_eq!(decide(&reading(20.0, 5.0), &cilantro()), Ok(true));
    }

    #[test]
    fn temp_band_edges_are_inclusive() {
        assert_eq!(decide(&reading(15.0, 45.0), &cilantro()), Ok(true));
        assert_eq!(decide(&reading(24.0, 45.0), &cilantro()), Ok(true));
    }

    #[test]
    fn humidity_ceiling_is_inclusive() {
        assert_eq!(decide(&reading(20.0, 50.0), &cilantro()), Ok(true));
        assert_eq!(decide(&reading(20.0, 50.1), &cilantro()), Ok(false));
    }

    // -- Sanity bounds ----------------------------------------------------

    #[test]
    fn temperature_below_sanity_is_a_fault() {
        assert_eq!(
            decide(&reading(-25.0, 45.0), &cilantro()),
            Err(SensorOutOfRange::Temperature(-25.0))
        );
    }

    #[test]
    fn temperature_above_sanity_is_a_fault() {
        assert_eq!(
            decide(&reading(120.0, 45.0), &cilantro()),
            Err(SensorOutOfRange::Temperature(120.0))
        );
    }

    #[test]
    fn humidity_below_zero_is_a_fault() {
        assert_eq!(
            decide(&reading(20.0, -1.0), &cilantro()),
            Err(SensorOutOfRange::Humidity(-1.0))
        );
    }

    #[test]
    fn humidity_above_hundred_is_a_fault() {
        assert_eq!(
            decide(&reading(20.0, 101.0), &cilantro()),
            Err(SensorOutOfRange::Humidity(101.0))
        );
    }

    #[test]
    fn sanity_edges_are_not_faults() {
        // Exactly -20/100 °C and 0/100 % are still plausible readings.
        assert!(decide(&reading(-20.0, 45.0), &cilantro()).is_ok());
        assert!(decide(&reading(100.0, 45.0), &cilantro()).is_ok());
        assert!(decide(&reading(20.0, 0.0), &cilantro()).is_ok());
        assert!(decide(&reading(20.0, 100.0), &cilantro()).is_ok());
    }

    #[test]
    fn temperature_fault_reported_before_humidity() {
        // Both channels implausible: the temperature fault wins.
        assert_eq!(
            decide(&reading(-30.0, 150.0), &cilantro()),
            Err(SensorOutOfRange::Temperature(-30.0))
        );
    }

    #[test]
    fn nan_reading_is_a_fault() {
        assert!(decide(&reading(f32::NAN, 45.0), &cilantro()).is_err());
        assert!(decide(&reading(20.0, f32::NAN), &cilantro()).is_err());
    }

    #[test]
    fn fault_regardless_of_parameters() {
        // Even a crop band that would cover the reading cannot override the
        // sanity check.
        let wide = CropParameters {
            min_temp_c: -100.0,
            max_temp_c: 200.0,
            min_humidity_pct: 0.0,
            max_humidity_pct: 100.0,
        };
        assert!(decide(&reading(150.0, 45.0), &wide).is_err());
        assert!(decide(&reading(20.0, 130.0), &wide).is_err());
    }

    #[test]
    fn error_messages() {
        assert_eq!(
            SensorOutOfRange::Temperature(120.0).to_string(),
            "temperature 120 C outside plausible range [-20, 100]"
        );
        assert_eq!(
            SensorOutOfRange::Humidity(-1.0).to_string(),
            "humidity -1 % outside plausible range [0, 100]"
        );
    }
}
