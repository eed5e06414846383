//! 16x2 character display. The `gpio` feature drives a real HD44780 panel
//! over a 4-bit parallel interface; without it, a mock records the lines and
//! echoes them to stderr. The core only ever supplies two lines of content.

use anyhow::Result;

use crate::config::LcdCfg;

#[cfg(feature = "gpio")]
use rppal::gpio::{Gpio, OutputPin};
#[cfg(feature = "gpio")]
use std::{thread, time::Duration};

/// Panel width in characters.
pub const LCD_COLS: usize = 16;

/// Clip a line to the panel width.
fn fit_line(s: &str) -> String {
    s.chars().take(LCD_COLS).collect()
}

// ---------------------------------------------------------------------------
// Real HD44780 panel (production — requires rppal + Raspberry Pi hardware)
// ---------------------------------------------------------------------------

// HD44780 instruction set (write with RS low).
#[cfg(feature = "gpio")]
mod cmd {
    pub const CLEAR: u8 = 0x01;
    /// Entry mode: increment cursor, no display shift.
    pub const ENTRY_MODE: u8 = 0x06;
    /// Display on, cursor off, blink off.
    pub const DISPLAY_ON: u8 = 0x0C;
    /// Function set: 4-bit bus, two lines, 5x8 font.
    pub const FUNCTION_SET: u8 = 0x28;
    /// DDRAM address command; OR with the cell address.
    pub const SET_DDRAM: u8 = 0x80;
    /// DDRAM offset of the second display line.
    pub const ROW1_OFFSET: u8 = 0x40;
}

#[cfg(feature = "gpio")]
pub struct Display {
    rs: OutputPin,
    e: OutputPin,
    data: [OutputPin; 4], // D4..D7
}

#[cfg(feature = "gpio")]
impl Display {
    pub fn new(cfg: &LcdCfg) -> Result<Self> {
        let gpio = Gpio::new()?;
        let rs = gpio.get(cfg.rs_pin)?.into_output_low();
        let e = gpio.get(cfg.e_pin)?.into_output_low();
        let data = [
            gpio.get(cfg.data_pins[0])?.into_output_low(),
            gpio.get(cfg.data_pins[1])?.into_output_low(),
            gpio.get(cfg.data_pins[2])?.into_output_low(),
            gpio.get(cfg.data_pins[3])?.into_output_low(),
        ];

        let mut lcd = Self { rs, e, data };
        lcd.init();

        tracing::info!(
            rs = cfg.rs_pin,
            e = cfg.e_pin,
            data = ?cfg.data_pins,
            "hd44780 initialised"
        );

        Ok(lcd)
    }

    /// Power-on initialisation per the HD44780 datasheet: the controller
    /// wakes in 8-bit mode and must see 0x3 three times before switching to
    /// the 4-bit bus.
    fn init(&mut self) {
        thread::sleep(Duration::from_millis(50));

        self.rs.set_low();
        self.write_nibble(0x3);
        thread::sleep(Duration::from_millis(5));
        self.write_nibble(0x3);
        thread::sleep(Duration::from_micros(150));
        self.write_nibble(0x3);
        thread::sleep(Duration::from_micros(150));
        self.write_nibble(0x2); // switch to 4-bit

        self.command(cmd::FUNCTION_SET);
        self.command(cmd::DISPLAY_ON);
        self.command(cmd::ENTRY_MODE);
        self.clear();
    }

    /// Show both lines, replacing whatever was on the panel. Content longer
    /// than 16 columns is clipped.
    pub fn show_lines(&mut self, line1: &str, line2: &str) {
        self.clear();
        self.set_cursor(0, 0);
        self.print(&fit_line(line1));
        self.set_cursor(1, 0);
        self.print(&fit_line(line2));
    }

    pub fn clear(&mut self) {
        self.command(cmd::CLEAR);
        // Clear is the one slow instruction (~1.5 ms).
        thread::sleep(Duration::from_millis(2));
    }

    fn set_cursor(&mut self, row: u8, col: u8) {
        let addr = if row == 0 { col } else { cmd::ROW1_OFFSET + col };
        self.command(cmd::SET_DDRAM | addr);
    }

    fn print(&mut self, s: &str) {
        for ch in s.chars() {
            // The character ROM covers ASCII; anything else renders as '?'.
            let byte = if ch.is_ascii() { ch as u8 } else { b'?' };
            self.write_byte(byte, true);
        }
    }

    fn command(&mut self, byte: u8) {
        self.write_byte(byte, false);
    }

    fn write_byte(&mut self, byte: u8, is_data: bool) {
        if is_data {
            self.rs.set_high();
        } else {
            self.rs.set_low();
        }
        self.write_nibble(byte >> 4);
        self.write_nibble(byte & 0x0F);
        // Ordinary instructions complete in ~37 us.
        thread::sleep(Duration::from_micros(50));
    }

    fn write_nibble(&mut self, nibble: u8) {
        for (i, pin) in self.data.iter_mut().enumerate() {
            if (nibble >> i) & 1 == 1 {
                pin.set_high();
            } else {
                pin.set_low();
            }
        }
        // Latch on the falling edge of E.
        self.e.set_high();
        thread::sleep(Duration::from_micros(1));
        self.e.set_low();
        thread::sleep(Duration::from_micros(1));
    }
}

// ---------------------------------------------------------------------------
// Mock panel (development — no hardware, echoes lines to stderr)
// ---------------------------------------------------------------------------

#[cfg(not(feature = "gpio"))]
pub struct Display {
    lines: [String; 2],
}

#[cfg(not(feature = "gpio"))]
impl Display {
    pub fn new(_cfg: &LcdCfg) -> Result<Self> {
        eprintln!("[mock-lcd] 16x2 panel initialised (no hardware)");
        Ok(Self {
            lines: [String::new(), String::new()],
        })
    }

    pub fn show_lines(&mut self, line1: &str, line2: &str) {
        self.lines = [fit_line(line1), fit_line(line2)];
        eprintln!(
            "[mock-lcd] |{:<16}|\n[mock-lcd] |{:<16}|",
            self.lines[0], self.lines[1]
        );
    }

    pub fn clear(&mut self) {
        self.lines = [String::new(), String::new()];
    }

    /// Last content handed to the panel.
    #[cfg(test)]
    pub fn lines(&self) -> &[String; 2] {
        &self.lines
    }
}

// ===========================================================================
// Tests
// ===========================================================================
