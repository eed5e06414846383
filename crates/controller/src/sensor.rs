//! Sensor front-end: pure calibration math over raw ADC counts, plus the
//! backend that produces those counts (simulator on a dev host, ADS1115 on
//! real hardware). Every read re-samples the hardware; nothing is cached
//! between cycles.

use crate::config::Calibration;
use crate::state::SensorReading;

// ---------------------------------------------------------------------------
// Calibration math
// ---------------------------------------------------------------------------

/// Convert one raw temperature sample to °C.
///
/// TMP36 transfer function: 10 mV per °C with a 500 mV offset at 0 °C, so
/// the voltage expressed as a percentage of full scale minus 50 lands on the
/// Celsius scale.
pub fn temperature_c(cal: &Calibration, raw: u16) -> f32 {
    (raw as f32 * cal.vcc / cal.adc_max as f32) * 100.0 + cal.temp_offset_c
}

/// Convert one raw soil-moisture sample to percent.
pub fn humidity_pct(cal: &Calibration, raw: u16) -> f32 {
    (raw as f32 * cal.vcc / cal.adc_max as f32) * 100.0
}

// ---------------------------------------------------------------------------
// Backend: simulator (development — no hardware)
// ---------------------------------------------------------------------------

#[cfg(all(feature = "sim", not(feature = "gpio")))]
pub struct SensorBank {
    sim: crate::sim::GardenSim,
    cal: Calibration,
}

#[cfg(all(feature = "sim", not(feature = "gpio")))]
impl SensorBank {
    pub fn new(cfg: &crate::config::Config) -> anyhow::Result<Self> {
        let scenario = crate::sim::Scenario::from_str_lossy(
            &std::env::var("SIM_SCENARIO").unwrap_or_default(),
        );
        tracing::info!(%scenario, "sensor simulator initialised");
        Ok(Self {
            sim: crate::sim::GardenSim::new(scenario, cfg.calibration),
            cal: cfg.calibration,
        })
    }

    /// Sample both channels and apply calibration.
    pub fn read(&mut self) -> anyhow::Result<SensorReading> {
        let raw_t = self.sim.sample_temperature();
        let raw_h = self.sim.sample_humidity();
        Ok(SensorReading {
            temperature_c: temperature_c(&self.cal, raw_t),
            humidity_pct: humidity_pct(&self.cal, raw_h),
        })
    }

    /// Feed the actuation state back so simulated soil humidity responds to
    /// watering.
    pub fn set_watering(&mut self, active: bool) {
        self.sim.set_watering(active);
    }
}

// ---------------------------------------------------------------------------
// Backend: ADS1115 (production — requires rppal + Raspberry Pi hardware)
// ---------------------------------------------------------------------------

#[cfg(feature = "gpio")]
pub struct SensorBank {
    adc: crate::adc::Ads1115,
    cal: Calibration,
    temperature_channel: u8,
    humidity_channel: u8,
}

#[cfg(feature = "gpio")]
impl SensorBank {
    pub fn new(cfg: &crate::config::Config) -> anyhow::Result<Self> {
        let adc = crate::adc::Ads1115::new(cfg.adc.i2c_address, cfg.calibration.adc_max)?;
        Ok(Self {
            adc,
            cal: cfg.calibration,
            temperature_channel: cfg.adc.temperature_channel,
            humidity_channel: cfg.adc.humidity_channel,
        })
    }

    /// Sample both channels and apply calibration.
    pub fn read(&mut self) -> anyhow::Result<SensorReading> {
        let raw_t = self.adc.read_raw(self.temperature_channel)?;
        let raw_h = self.adc.read_raw(self.humidity_channel)?;
        Ok(SensorReading {
            temperature_c: temperature_c(&self.cal, raw_t),
            humidity_pct: humidity_pct(&self.cal, raw_h),
        })
    }

    /// Real soil responds to watering on its own.
    pub fn set_watering(&mut self, _active: bool) {}
}

// ===========================================================================
// Tests
// ===========================================================================
