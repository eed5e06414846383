//! Stateful garden sensor simulator for local development.
//!
//! Models a TMP36 temperature channel and a YL-69 soil moisture channel:
//! - Temporal coherence via random walk with mean reversion
//! - Gradual drying drift on the soil channel (evaporation)
//! - Per-reading ADC electronic noise
//! - Occasional spikes (sensor flakiness)
//! - Diurnal (day/night) temperature swing
//! - Closed-loop watering response (soil humidity rises while the pump runs)

use std::fmt;

use crate::config::Calibration;

/// Day/night cycle length. 10 minutes compresses a full diurnal swing into a
/// dev session instead of a real day.
const DIURNAL_PERIOD_S: f64 = 600.0;

// ---------------------------------------------------------------------------
// Gaussian approximation (no extra dependency)
// ---------------------------------------------------------------------------

/// Approximate a sample from N(0,1) using the Irwin-Hall method:
/// sum of 12 uniform [0,1) values minus 6.
fn approx_std_normal() -> f64 {
    let mut sum: f64 = 0.0;
    for _ in 0..12 {
        sum += fastrand::f64();
    }
    sum - 6.0
}

/// Sample from N(mean, sigma).
fn gaussian(mean: f64, sigma: f64) -> f64 {
    mean + sigma * approx_std_normal()
}

// ---------------------------------------------------------------------------
// Scenario presets
// ---------------------------------------------------------------------------

/// Pre-configured simulation profiles selectable via `SIM_SCENARIO` env var.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scenario {
    /// Soil starts mid-range and slowly dries out. Moderate noise, ~3% spike
    /// rate. Realistic steady-state for a warm day; ends up triggering
    /// irrigation.
    Drying,
    /// Soil hovers near the middle of the band. Low noise, rare spikes.
    /// Good for watching the display without triggering the pump.
    Stable,
    /// High noise, ~10% spike rate, larger spike magnitude. Exercises the
    /// decision engine's sanity check.
    Flaky,
    /// Soil starts near saturation and dries very slowly. Verifies the
    /// controller does nothing while moisture is adequate.
    Wet,
}

impl Scenario {
    pub fn from_str_lossy(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "stable" => Self::Stable,
            "flaky" => Self::Flaky,
            "wet" => Self::Wet,
            _ => Self::Drying, // default
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Drying => write!(f, "drying"),
            Self::Stable => write!(f, "stable"),
            Self::Flaky => write!(f, "flaky"),
            Self::Wet => write!(f, "wet"),
        }
    }
}

// ---------------------------------------------------------------------------
// Per-channel state
// ---------------------------------------------------------------------------

/// One simulated analog channel, evolved in physical units and converted to
/// raw ADC counts only at the sampling edge.
struct Channel {
    /// Current "true" physical value. Evolves each tick.
    base: f64,
    /// Mean-reversion target.
    center: f64,
    mean_reversion: f64,
    walk_sigma: f64,
    /// Per-sample deterministic drift (soil drying; zero for temperature).
    drift: f64,
    /// Electronic noise sigma, physical units.
    noise_sigma: f64,
    /// Spike magnitude sigma, physical units.
    spike_sigma: f64,
    /// Clamp range for the underlying base value.
    min: f64,
    max: f64,
}

impl Channel {
    /// Advance the base value one tick. `extra` carries tick-specific inputs
    /// such as the watering response.
    fn evolve(&mut self, extra: f64) -> f64 {
        let pull = self.mean_reversion * (self.center - self.base);
        let walk = gaussian(0.0, self.walk_sigma);
        self.base = (self.base + self.drift + pull + walk + extra).clamp(self.min, self.max);
        self.base
    }
}

// ---------------------------------------------------------------------------
// Main simulator
// ---------------------------------------------------------------------------

/// Stateful simulator producing raw ADC readings for both sensor channels.
pub struct GardenSim {
    cal: Calibration,
    temperature: Channel,
    humidity: Channel,

    // Spike parameters (shared trigger probability, per-channel magnitude)
    spike_prob: f32,

    // Diurnal temperature cycle
    diurnal_amplitude: f64,

    // Watering response
    watering: bool,
    wet_rate: f64,
}

impl GardenSim {
    /// Create a simulator whose raw output matches `cal`'s ADC domain, so
    /// the calibrated values land on the physical scales the presets target.
    pub fn new(scenario: Scenario, cal: Calibration) -> Self {
        // (start %, drift %/tick, walk σ, reversion, noise σ, spike prob, spike σ)
        let (hum_start, hum_drift, hum_walk, hum_rev, hum_noise, spike_prob, hum_spike) =
            match scenario {
                Scenario::Drying => (55.0, -0.03, 0.25, 0.01, 0.4, 0.03_f32, 8.0),
                Scenario::Stable => (45.0, -0.005, 0.10, 0.05, 0.2, 0.005, 4.0),
                Scenario::Flaky => (50.0, -0.02, 0.40, 0.02, 1.5, 0.10, 15.0),
                Scenario::Wet => (85.0, -0.008, 0.15, 0.02, 0.3, 0.02, 6.0),
            };

        Self {
            cal,
            temperature: Channel {
                base: 21.0,
                center: 21.0,
                mean_reversion: 0.05,
                walk_sigma: 0.05,
                drift: 0.0,
                noise_sigma: 0.15,
                spike_sigma: 3.0,
                min: 5.0,
                max: 35.0,
            },
            humidity: Channel {
                base: hum_start,
                center: hum_start,
                mean_reversion: hum_rev,
                walk_sigma: hum_walk,
                drift: hum_drift,
                noise_sigma: hum_noise,
                spike_sigma: hum_spike,
                min: 0.0,
                max: 100.0,
            },
            spike_prob,
            diurnal_amplitude: 3.0,
            watering: false,
            wet_rate: 0.15,
        }
    }

    /// Inform the simulator whether the irrigation output is currently on.
    pub fn set_watering(&mut self, active: bool) {
        self.watering = active;
    }

    /// Produce the next raw temperature reading.
    ///
    /// The internal base value evolves with each call, so the order and
    /// frequency of calls matters.
    pub fn sample_temperature(&mut self) -> u16 {
        let base = self.temperature.evolve(0.0);

        // Sinusoidal day/night swing, peaking mid-"afternoon".
        let now_s = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs_f64();
        let phase = 2.0 * std::f64::consts::PI * now_s / DIURNAL_PERIOD_S;
        let diurnal = self.diurnal_amplitude * phase.sin();

        let value = base + diurnal + self.channel_noise(&self.temperature);
        self.raw_for_temperature(value)
    }

    /// Produce the next raw soil humidity reading.
    pub fn sample_humidity(&mut self) -> u16 {
        let wet = if self.watering { self.wet_rate } else { 0.0 };
        let base = self.humidity.evolve(wet);

        let value = base + self.channel_noise(&self.humidity);
        self.raw_for_humidity(value)
    }

    /// Electronic noise plus the occasional flaky-sensor spike.
    fn channel_noise(&self, ch: &Channel) -> f64 {
        let noise = gaussian(0.0, ch.noise_sigma);
        let spike = if fastrand::f32() < self.spike_prob {
            gaussian(0.0, ch.spike_sigma)
        } else {
            0.0
        };
        noise + spike
    }

    // Inverse of the calibration formulas: physical value -> raw counts,
    // clamped to the converter's domain.

    fn raw_for_temperature(&self, celsius: f64) -> u16 {
        let frac = (celsius - self.cal.temp_offset_c as f64) / (self.cal.vcc as f64 * 100.0);
        self.clamp_raw(frac * self.cal.adc_max as f64)
    }

    fn raw_for_humidity(&self, pct: f64) -> u16 {
        let frac = pct / (self.cal.vcc as f64 * 100.0);
        self.clamp_raw(frac * self.cal.adc_max as f64)
    }

    fn clamp_raw(&self, raw: f64) -> u16 {
        raw.round().clamp(0.0, self.cal.adc_max as f64) as u16
    }
}

// ===========================================================================
// Tests
// ===========================================================================
