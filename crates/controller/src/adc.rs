//! ADS1115 16-bit ADC driver over I2C for the analog sensor pair.
//!
//! Reads single-ended channels at PGA ±4.096 V, 128 SPS, single-shot mode.
//! The 15-bit single-ended result is rescaled to the configured converter
//! domain so the calibration math sees the same `0..=adc_max` counts the
//! simulator produces.

use rppal::i2c::I2c;
use std::{thread, time::Duration};

// ── ADS1115 register addresses ──────────────────────────────────────────────

/// Conversion result register (read-only, 16-bit signed).
const REG_CONVERSION: u8 = 0x00;
/// Configuration register (read/write).
const REG_CONFIG: u8 = 0x01;

// ── Config register bit fields ──────────────────────────────────────────────
//
// Layout (MSB first):
//   [15]    OS       — write 1 to start single-shot conversion
//   [14:12] MUX      — input multiplexer (channel selection)
//   [11:9]  PGA      — programmable gain amplifier
//   [8]     MODE     — 0 = continuous, 1 = single-shot
//   [7:5]   DR       — data rate
//   [4]     COMP_MODE
//   [3]     COMP_POL
//   [2]     COMP_LAT
//   [1:0]   COMP_QUE — 11 = disable comparator (default)

/// Bits common to all channel reads:
///   OS=1 (start), PGA=001 (±4.096 V), MODE=1 (single-shot),
///   DR=100 (128 SPS), COMP_QUE=11 (comparator off).
const CONFIG_BASE: u16 = 0b1_000_001_1_100_0_0_0_11;

/// MUX values for single-ended reads (AINx vs GND).
///   AIN0: MUX=100, AIN1: MUX=101, AIN2: MUX=110, AIN3: MUX=111
const MUX_SHIFT: u8 = 12;
const MUX_SINGLE_ENDED: [u16; 4] = [0b100, 0b101, 0b110, 0b111];

/// Maximum single-ended reading (15-bit positive range).
const RAW_FULL_SCALE: i32 = 32767;

/// Conversion time at 128 SPS is ~7.8 ms.  We wait 9 ms for margin.
const CONVERSION_WAIT: Duration = Duration::from_millis(9);

/// Bit 15 of the config register: conversion-ready flag when read.
const OS_READY_BIT: u16 = 1 << 15;

/// Build the config register value for a single-ended read on `channel`.
fn config_for_channel(channel: u8) -> u16 {
    CONFIG_BASE | (MUX_SINGLE_ENDED[channel as usize] << MUX_SHIFT)
}

/// Map a raw single-ended result onto the configured converter domain.
/// Negative values (bus glitches) clamp to zero.
fn rescale(raw: i16, adc_max: u16) -> u16 {
    let clamped = (raw as i32).clamp(0, RAW_FULL_SCALE);
    (clamped as u32 * adc_max as u32 / RAW_FULL_SCALE as u32) as u16
}

// ── Driver ──────────────────────────────────────────────────────────────────

/// ADS1115 driver backed by `rppal::i2c`.
pub struct Ads1115 {
    i2c: I2c,
    adc_max: u16,
}

impl Ads1115 {
    /// Open I2C bus 1 and address the ADS1115 at `addr`. Readings are
    /// rescaled to `0..=adc_max`.
    pub fn new(addr: u16, adc_max: u16) -> anyhow::Result<Self> {
        let mut i2c = I2c::new()?;
        i2c.set_slave_address(addr)?;

        tracing::info!(
            addr = format_args!("0x{addr:02x}"),
            adc_max,
            "ads1115 initialised"
        );

        Ok(Self { i2c, adc_max })
    }

    /// Perform a single-shot read on `channel` and return the count in the
    /// configured `0..=adc_max` domain.
    pub fn read_raw(&mut self, channel: u8) -> anyhow::Result<u16> {
        let config = config_for_channel(channel);
        let config_bytes = config.to_be_bytes();

        // Write config register to start conversion.
        self.i2c.block_write(REG_CONFIG, &config_bytes)?;

        // Wait for conversion to complete.
        thread::sleep(CONVERSION_WAIT);

        // Poll the OS bit to confirm conversion is done.  Normally one wait
        // is enough at 128 SPS; we retry briefly to be safe.
        for _ in 0..3 {
            let mut buf = [0u8; 2];
            self.i2c.block_read(REG_CONFIG, &mut buf)?;
            let status = u16::from_be_bytes(buf);
            if status & OS_READY_BIT != 0 {
                break;
            }
            thread::sleep(Duration::from_millis(2));
        }

        // Read the conversion result.
        let mut buf = [0u8; 2];
        self.i2c.block_read(REG_CONVERSION, &mut buf)?;
        Ok(rescale(i16::from_be_bytes(buf), self.adc_max))
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
