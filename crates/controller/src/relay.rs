//! Irrigation relay control via GPIO. The `gpio` feature gates the real
//! rppal driver; without it, a mock implementation logs state changes to
//! stderr.

use anyhow::Result;

#[cfg(feature = "gpio")]
use rppal::gpio::{Gpio, OutputPin};

// ---------------------------------------------------------------------------
// Real relay (production — requires rppal + Raspberry Pi hardware)
// ---------------------------------------------------------------------------
#[cfg(feature = "gpio")]
pub struct Relay {
    pin: OutputPin,
    active_low: bool,
    on: bool,
}

#[cfg(feature = "gpio")]
impl Relay {
    pub fn new(pin_num: u8, active_low: bool) -> Result<Self> {
        let gpio = Gpio::new()?;
        let mut pin = gpio.get(pin_num)?.into_output();

        // Fail-safe: ensure "OFF" before the first decision runs
        if active_low {
            pin.set_high(); // active-low relay OFF
        } else {
            pin.set_low(); // active-high relay OFF
        }

        tracing::info!(pin = pin_num, active_low, "irrigation relay initialised");

        Ok(Self {
            pin,
            active_low,
            on: false,
        })
    }

    /// Apply the commanded state. Idempotent; the line is re-driven every
    /// call and there is no read-back.
    pub fn set(&mut self, on: bool) {
        if self.active_low {
            // active-low relay: LOW = ON, HIGH = OFF
            if on {
                self.pin.set_low()
            } else {
                self.pin.set_high()
            }
        } else {
            // active-high relay: HIGH = ON, LOW = OFF
            if on {
                self.pin.set_high()
            } else {
                self.pin.set_low()
            }
        }
        if on != self.on {
            tracing::info!(state = if on { "ON" } else { "OFF" }, "irrigation relay");
        }
        self.on = on;
    }

    pub fn is_on(&self) -> bool {
        self.on
    }
}

// ---------------------------------------------------------------------------
// Mock relay (development — no hardware, logs state to stderr)
// ---------------------------------------------------------------------------
#[cfg(not(feature = "gpio"))]
pub struct Relay {
    on: bool,
}

#[cfg(not(feature = "gpio"))]
impl Relay {
    pub fn new(pin_num: u8, _active_low: bool) -> Result<Self> {
        eprintln!("[mock-relay] registered gpio {pin_num} (not wired)");
        Ok(Self { on: false })
    }

    pub fn set(&mut self, on: bool) {
        self.on = on;
        eprintln!("[mock-relay] irrigation set {}", if on { "ON" } else { "OFF" });
    }

    pub fn is_on(&self) -> bool {
        self.on
    }
}

// ===========================================================================
// Tests
// ===========================================================================
