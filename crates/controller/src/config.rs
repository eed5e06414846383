//! TOML config file loading and validation: sensor calibration constants,
//! cycle timing, and pin assignments. Built-in defaults match the reference
//! wiring, so a missing config file is not an error.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::time::Duration;

// ---------------------------------------------------------------------------
// Config file structures
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub calibration: Calibration,
    pub timing: Timing,
    pub relay: RelayCfg,
    pub keypad: KeypadCfg,
    pub lcd: LcdCfg,
    pub adc: AdcCfg,
}

/// Analog front-end constants shared by both sensor channels.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct Calibration {
    /// Supply voltage feeding both analog sensors.
    pub vcc: f32,
    /// Highest raw count the ADC produces (10-bit converter: 1023).
    pub adc_max: u16,
    /// Additive correction applied to the temperature conversion. The TMP36
    /// transfer function puts 0 °C at 500 mV, hence the -50 default.
    pub temp_offset_c: f32,
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            vcc: 5.0,
            adc_max: 1023,
            temp_offset_c: -50.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct Timing {
    /// Sampling loop period.
    pub cycle_ms: u64,
    /// Delay between keypad polls while awaiting a crop selection.
    pub key_poll_ms: u64,
    /// How long menu and notice screens stay on the display.
    pub message_hold_ms: u64,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            cycle_ms: 1000,
            key_poll_ms: 150,
            message_hold_ms: 2000,
        }
    }
}

impl Timing {
    pub fn cycle(&self) -> Duration {
        Duration::from_millis(self.cycle_ms)
    }

    pub fn key_poll(&self) -> Duration {
        Duration::from_millis(self.key_poll_ms)
    }

    pub fn message_hold(&self) -> Duration {
        Duration::from_millis(self.message_hold_ms)
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct RelayCfg {
    pub gpio_pin: u8,
    /// Many common relay boards are active-low.
    pub active_low: bool,
}

impl Default for RelayCfg {
    fn default() -> Self {
        Self {
            gpio_pin: 17,
            active_low: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct KeypadCfg {
    /// Row drive lines of the 4x4 matrix, top row first.
    pub row_pins: [u8; 4],
    /// Column sense lines, leftmost column first.
    pub col_pins: [u8; 4],
}

impl Default for KeypadCfg {
    fn default() -> Self {
        Self {
            row_pins: [5, 6, 13, 19],
            col_pins: [12, 16, 20, 21],
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct LcdCfg {
    pub rs_pin: u8,
    pub e_pin: u8,
    /// D4..D7 in order (4-bit interface).
    pub data_pins: [u8; 4],
}

impl Default for LcdCfg {
    fn default() -> Self {
        Self {
            rs_pin: 26,
            e_pin: 25,
            data_pins: [22, 23, 24, 27],
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct AdcCfg {
    /// ADS1115 I2C address (ADDR strap selects 0x48-0x4B).
    pub i2c_address: u16,
    pub temperature_channel: u8,
    pub humidity_channel: u8,
}

impl Default for AdcCfg {
    fn default() -> Self {
        Self {
            i2c_address: 0x48,
            temperature_channel: 0,
            humidity_channel: 1,
        }
    }
}

// ---------------------------------------------------------------------------
// GPIO whitelist
// ---------------------------------------------------------------------------

/// BCM GPIO pins available on the Raspberry Pi 40-pin header for general
/// use. GPIO 0-1 are reserved for the ID EEPROM and must never be used.
/// GPIO 28+ are not exposed on the standard header.
const VALID_GPIO_PINS: &[u8] = &[
    2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17, 18, 19, 20, 21, 22, 23, 24, 25, 26, 27,
];

/// Highest single-ended input index on the ADS1115.
const MAX_ADC_CHANNEL: u8 = 3;

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

impl Config {
    /// Validate all config entries. Returns `Ok(())` or an error describing
    /// every violation found (not just the first one).
    pub fn validate(&self) -> Result<()> {
        let mut errors: Vec<String> = Vec::new();

        self.validate_calibration(&mut errors);
        self.validate_timing(&mut errors);
        self.validate_pins(&mut errors);
        self.validate_adc(&mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            bail!(
                "config validation failed ({} error{}):\n  - {}",
                errors.len(),
                if errors.len() == 1 { "" } else { "s" },
                errors.join("\n  - ")
            );
        }
    }

    fn validate_calibration(&self, errors: &mut Vec<String>) {
        let c = &self.calibration;
        if !(c.vcc.is_finite() && c.vcc > 0.0) {
            errors.push(format!("calibration: vcc must be positive, got {}", c.vcc));
        }
        if c.adc_max == 0 {
            errors.push("calibration: adc_max must be at least 1".to_string());
        }
        if !c.temp_offset_c.is_finite() {
            errors.push(format!(
                "calibration: temp_offset_c is not finite: {}",
                c.temp_offset_c
            ));
        }
    }

    fn validate_timing(&self, errors: &mut Vec<String>) {
        let t = &self.timing;
        if t.cycle_ms == 0 {
            errors.push("timing: cycle_ms must be positive".to_string());
        }
        if t.key_poll_ms == 0 {
            errors.push("timing: key_poll_ms must be positive".to_string());
        }
        if t.message_hold_ms == 0 {
            errors.push("timing: message_hold_ms must be positive".to_string());
        }
    }

    fn validate_pins(&self, errors: &mut Vec<String>) {
        let mut seen: HashSet<u8> = HashSet::new();

        let mut check = |label: String, pin: u8, errors: &mut Vec<String>| {
            if !VALID_GPIO_PINS.contains(&pin) {
                errors.push(format!(
                    "{label}: pin {pin} is not a valid BCM GPIO pin (allowed: 2-27)"
                ));
            } else if !seen.insert(pin) {
                errors.push(format!("{label}: pin {pin} is assigned more than once"));
            }
        };

        check("relay".to_string(), self.relay.gpio_pin, errors);
        for (i, &p) in self.keypad.row_pins.iter().enumerate() {
            check(format!("keypad row {i}"), p, errors);
        }
        for (i, &p) in self.keypad.col_pins.iter().enumerate() {
            check(format!("keypad col {i}"), p, errors);
        }
        check("lcd rs".to_string(), self.lcd.rs_pin, errors);
        check("lcd e".to_string(), self.lcd.e_pin, errors);
        for (i, &p) in self.lcd.data_pins.iter().enumerate() {
            check(format!("lcd d{}", i + 4), p, errors);
        }
    }

    fn validate_adc(&self, errors: &mut Vec<String>) {
        let a = &self.adc;
        if !(0x48..=0x4B).contains(&a.i2c_address) {
            errors.push(format!(
                "adc: i2c_address {:#04x} outside ADS1115 range [0x48, 0x4b]",
                a.i2c_address
            ));
        }
        if a.temperature_channel > MAX_ADC_CHANNEL {
            errors.push(format!(
                "adc: temperature_channel {} exceeds maximum ({MAX_ADC_CHANNEL})",
                a.temperature_channel
            ));
        }
        if a.humidity_channel > MAX_ADC_CHANNEL {
            errors.push(format!(
                "adc: humidity_channel {} exceeds maximum ({MAX_ADC_CHANNEL})",
                a.humidity_channel
            ));
        }
        if a.temperature_channel == a.humidity_channel {
            errors.push(format!(
                "adc: temperature_channel and humidity_channel are both {}",
                a.temperature_channel
            ));
        }
    }
}

// ---------------------------------------------------------------------------
// Load
// ---------------------------------------------------------------------------

/// Read, parse, and validate a TOML config file.
pub fn load(path: &str) -> Result<Config> {
    let contents =
        std::fs::read_to_string(path).with_context(|| format!("failed to read config: {path}"))?;
    let config: Config =
        toml::from_str(&contents).with_context(|| format!("failed to parse config: {path}"))?;
    config
        .validate()
        .with_context(|| format!("invalid config: {path}"))?;
    Ok(config)
}

/// Load `path` if it exists, otherwise fall back to the built-in defaults.
pub fn load_or_default(path: &str) -> Result<Config> {
    if std::path::Path::new(path).exists() {
        load(path)
    } else {
        tracing::info!(path, "config file not found, using built-in defaults");
        Ok(Config::default())
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    /// Assert validation fails and the error message contains `needle`.
    fn assert_validation_err(cfg: &Config, needle: &str) {
        let err = cfg.validate().unwrap_err();
        let msg = format!("{err:#}");
        assert!(
            msg.contains(needle),
            "expected error containing {needle:?}, got: {msg}"
        );
    }

    // -- Parsing ----------------------------------------------------------

    #[test]
    fn parse_empty_config_gives_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.calibration.adc_max, 1023);
        assert_eq!(config.calibration.vcc, 5.0);
        assert_eq!(config.calibration.temp_offset_c, -50.0);
        assert_eq!(config.timing.cycle_ms, 1000);
        assert_eq!(config.timing.key_poll_ms, 150);
        assert_eq!(config.timing.message_hold_ms, 2000);
        assert!(config.relay.active_low);
    }

    #[test]
    fn parse_partial_override() {
        let toml_str = r#"
[calibration]
vcc = 3.3
adc_max = 4095

[timing]
cycle_ms = 500

[relay]
gpio_pin = 18
active_low = false
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.calibration.vcc, 3.3);
        assert_eq!(config.calibration.adc_max, 4095);
        // untouched sections keep their defaults
        assert_eq!(config.calibration.temp_offset_c, -50.0);
        assert_eq!(config.timing.cycle_ms, 500);
        assert_eq!(config.timing.key_poll_ms, 150);
        assert_eq!(config.relay.gpio_pin, 18);
        assert!(!config.relay.active_low);
    }

    #[test]
    fn parse_rejects_out_of_range_pin() {
        assert!(toml::from_str::<Config>("[relay]\ngpio_pin = 300\n").is_err());
    }

    // -- Validation: valid configs pass -----------------------------------

    #[test]
    fn default_config_passes() {
        Config::default().validate().unwrap();
    }

    // -- Calibration ------------------------------------------------------

    #[test]
    fn vcc_zero_rejected() {
        let mut cfg = Config::default();
        cfg.calibration.vcc = 0.0;
        assert_validation_err(&cfg, "vcc must be positive");
    }

    #[test]
    fn vcc_negative_rejected() {
        let mut cfg = Config::default();
        cfg.calibration.vcc = -5.0;
        assert_validation_err(&cfg, "vcc must be positive");
    }

    #[test]
    fn vcc_nan_rejected() {
        let mut cfg = Config::default();
        cfg.calibration.vcc = f32::NAN;
        assert_validation_err(&cfg, "vcc must be positive");
    }

    #[test]
    fn adc_max_zero_rejected() {
        let mut cfg = Config::default();
        cfg.calibration.adc_max = 0;
        assert_validation_err(&cfg, "adc_max must be at least 1");
    }

    #[test]
    fn temp_offset_infinite_rejected() {
        let mut cfg = Config::default();
        cfg.calibration.temp_offset_c = f32::INFINITY;
        assert_validation_err(&cfg, "temp_offset_c is not finite");
    }

    // -- Timing -----------------------------------------------------------

    #[test]
    fn cycle_zero_rejected() {
        let mut cfg = Config::default();
        cfg.timing.cycle_ms = 0;
        assert_validation_err(&cfg, "cycle_ms must be positive");
    }

    #[test]
    fn key_poll_zero_rejected() {
        let mut cfg = Config::default();
        cfg.timing.key_poll_ms = 0;
        assert_validation_err(&cfg, "key_poll_ms must be positive");
    }

    #[test]
    fn message_hold_zero_rejected() {
        let mut cfg = Config::default();
        cfg.timing.message_hold_ms = 0;
        assert_validation_err(&cfg, "message_hold_ms must be positive");
    }

    #[test]
    fn timing_durations() {
        let t = Timing::default();
        assert_eq!(t.cycle(), Duration::from_secs(1));
        assert_eq!(t.key_poll(), Duration::from_millis(150));
        assert_eq!(t.message_hold(), Duration::from_secs(2));
    }

    // -- GPIO whitelist ---------------------------------------------------

    #[test]
    fn relay_pin_0_rejected() {
        let mut cfg = Config::default();
        cfg.relay.gpio_pin = 0;
        assert_validation_err(&cfg, "not a valid BCM GPIO pin");
    }

    #[test]
    fn relay_pin_1_rejected() {
        let mut cfg = Config::default();
        cfg.relay.gpio_pin = 1;
        assert_validation_err(&cfg, "not a valid BCM GPIO pin");
    }

    #[test]
    fn relay_pin_28_rejected() {
        let mut cfg = Config::default();
        cfg.relay.gpio_pin = 28;
        assert_validation_err(&cfg, "not a valid BCM GPIO pin");
    }

    #[test]
    fn keypad_pin_out_of_range_rejected() {
        let mut cfg = Config::default();
        cfg.keypad.col_pins[3] = 40;
        assert_validation_err(&cfg, "keypad col 3: pin 40");
    }

    #[test]
    fn lcd_pin_out_of_range_rejected() {
        let mut cfg = Config::default();
        cfg.lcd.data_pins[0] = 1;
        assert_validation_err(&cfg, "lcd d4: pin 1");
    }

    #[test]
    fn boundary_pins_accepted() {
        let mut cfg = Config::default();
        cfg.relay.gpio_pin = 2;
        cfg.lcd.rs_pin = 27;
        cfg.lcd.data_pins = [22, 23, 24, 26];
        cfg.validate().unwrap();
    }

    #[test]
    fn duplicate_pin_across_sections_rejected() {
        let mut cfg = Config::default();
        cfg.relay.gpio_pin = cfg.keypad.row_pins[0];
        assert_validation_err(&cfg, "assigned more than once");
    }

    #[test]
    fn duplicate_pin_within_keypad_rejected() {
        let mut cfg = Config::default();
        cfg.keypad.col_pins[1] = cfg.keypad.col_pins[0];
        assert_validation_err(&cfg, "assigned more than once");
    }

    // -- ADC --------------------------------------------------------------

    #[test]
    fn adc_address_out_of_range_rejected() {
        let mut cfg = Config::default();
        cfg.adc.i2c_address = 0x50;
        assert_validation_err(&cfg, "i2c_address 0x50");
    }

    #[test]
    fn adc_addresses_48_to_4b_accepted() {
        for addr in 0x48..=0x4B {
            let mut cfg = Config::default();
            cfg.adc.i2c_address = addr;
            cfg.validate().unwrap();
        }
    }

    #[test]
    fn adc_channel_4_rejected() {
        let mut cfg = Config::default();
        cfg.adc.humidity_channel = 4;
        assert_validation_err(&cfg, "humidity_channel 4 exceeds maximum");
    }

    #[test]
    fn adc_same_channel_rejected() {
        let mut cfg = Config::default();
        cfg.adc.humidity_channel = cfg.adc.temperature_channel;
        assert_validation_err(&cfg, "are both 0");
    }

    // -- Multiple errors reported at once ---------------------------------

    #[test]
    fn multiple_errors_collected() {
        let mut cfg = Config::default();
        cfg.calibration.vcc = 0.0;
        cfg.timing.cycle_ms = 0;
        cfg.relay.gpio_pin = 0;
        cfg.adc.humidity_channel = 7;
        let err = cfg.validate().unwrap_err();
        let msg = format!("{err:#}");
        assert!(msg.contains("vcc must be positive"), "missing vcc error in: {msg}");
        assert!(msg.contains("cycle_ms must be positive"), "missing timing error in: {msg}");
        assert!(msg.contains("not a valid BCM GPIO pin"), "missing gpio error in: {msg}");
        assert!(msg.contains("humidity_channel 7"), "missing adc error in: {msg}");
    }

    // -- Load -------------------------------------------------------------

    #[test]
    fn load_or_default_missing_file() {
        let cfg = load_or_default("/nonexistent/controller.toml").unwrap();
        assert_eq!(cfg.calibration.adc_max, 1023);
    }
}
