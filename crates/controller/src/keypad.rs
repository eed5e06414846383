//! 4x4 matrix keypad input. The `gpio` feature scans the real matrix via
//! rppal; without it, keys come from a scripted queue (tests) or stdin (dev
//! host). "No key pressed" is always a distinguishable `None`, never a
//! placeholder character.

use anyhow::Result;

use crate::config::KeypadCfg;

#[cfg(feature = "gpio")]
use rppal::gpio::{Gpio, InputPin, OutputPin};
#[cfg(feature = "gpio")]
use std::{thread, time::Duration};

#[cfg(not(feature = "gpio"))]
use std::collections::VecDeque;
#[cfg(not(feature = "gpio"))]
use std::io::BufRead;
#[cfg(not(feature = "gpio"))]
use std::sync::mpsc;

/// Key legend of the membrane panel, row-major.
pub const KEY_LAYOUT: [[char; 4]; 4] = [
    ['1', '2', '3', 'A'],
    ['4', '5', '6', 'B'],
    ['7', '8', '9', 'C'],
    ['*', '0', '#', 'D'],
];

// ---------------------------------------------------------------------------
// Real matrix keypad (production — requires rppal + Raspberry Pi hardware)
// ---------------------------------------------------------------------------

#[cfg(feature = "gpio")]
pub struct Keypad {
    rows: Vec<OutputPin>,
    cols: Vec<InputPin>,
    last: Option<char>,
}

#[cfg(feature = "gpio")]
impl Keypad {
    /// Claim row drive lines as outputs (idle low) and column sense lines as
    /// pulled-down inputs.
    pub fn new(cfg: &KeypadCfg) -> Result<Self> {
        let gpio = Gpio::new()?;

        let mut rows = Vec::with_capacity(cfg.row_pins.len());
        for &pin in &cfg.row_pins {
            rows.push(gpio.get(pin)?.into_output_low());
        }
        let mut cols = Vec::with_capacity(cfg.col_pins.len());
        for &pin in &cfg.col_pins {
            cols.push(gpio.get(pin)?.into_input_pulldown());
        }

        tracing::info!(rows = ?cfg.row_pins, cols = ?cfg.col_pins, "keypad initialised");

        Ok(Self {
            rows,
            cols,
            last: None,
        })
    }

    /// Drive each row high in turn and sense the columns. First hit wins;
    /// multi-key chords are not supported by the menu.
    fn scan(&mut self) -> Option<char> {
        for (r, row) in self.rows.iter_mut().enumerate() {
            row.set_high();
            // Settle time for the column pulldowns.
            thread::sleep(Duration::from_micros(5));

            let mut hit = None;
            for (c, col) in self.cols.iter().enumerate() {
                if col.is_high() {
                    hit = Some(KEY_LAYOUT[r][c]);
                    break;
                }
            }
            row.set_low();

            if hit.is_some() {
                return hit;
            }
        }
        None
    }

    /// Non-blocking poll. A key is reported once per press transition, so a
    /// held key does not repeat; release-and-press reports again.
    pub fn poll_key(&mut self) -> Option<char> {
        let current = self.scan();
        let pressed = match (self.last, current) {
            (None, Some(k)) => Some(k),
            _ => None,
        };
        self.last = current;
        pressed
    }

    /// The physical matrix never goes away.
    pub fn is_closed(&self) -> bool {
        false
    }
}

// ---------------------------------------------------------------------------
// Host keypad (development — scripted keys or stdin, no hardware)
// ---------------------------------------------------------------------------

#[cfg(not(feature = "gpio"))]
enum Source {
    Scripted(VecDeque<char>),
    Stdin(mpsc::Receiver<char>),
}

#[cfg(not(feature = "gpio"))]
pub struct Keypad {
    source: Source,
    closed: bool,
}

#[cfg(not(feature = "gpio"))]
impl Keypad {
    pub fn new(_cfg: &KeypadCfg) -> Result<Self> {
        // KEYPAD_SCRIPT=52 plays the keys '5', '2' without a terminal
        // attached, then reports the source closed.
        if let Ok(script) = std::env::var("KEYPAD_SCRIPT") {
            let keys: Vec<char> = script.chars().collect();
            eprintln!("[mock-keypad] playing scripted keys: {script:?}");
            return Ok(Self::scripted(&keys));
        }
        Ok(Self::from_stdin())
    }

    /// Keys served from a fixed queue, in order. Used by tests.
    pub fn scripted(keys: &[char]) -> Self {
        Self {
            source: Source::Scripted(keys.iter().copied().collect()),
            closed: false,
        }
    }

    /// Keys typed into stdin. A reader thread feeds a channel that
    /// `poll_key` drains non-blockingly, mirroring the hardware poll.
    /// Characters with no counterpart on the membrane panel are dropped.
    pub fn from_stdin() -> Self {
        let (tx, rx) = mpsc::channel();
        std::thread::spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else { break };
                let keys = line
                    .chars()
                    .map(|c| c.to_ascii_uppercase())
                    .filter(|&c| KEY_LAYOUT.iter().flatten().any(|&k| k == c));
                for ch in keys {
                    if tx.send(ch).is_err() {
                        return;
                    }
                }
            }
        });

        eprintln!("[mock-keypad] reading keys from stdin (type a key, press enter)");

        Self {
            source: Source::Stdin(rx),
            closed: false,
        }
    }

    /// Non-blocking poll over the scripted queue or the stdin channel.
    pub fn poll_key(&mut self) -> Option<char> {
        match &mut self.source {
            Source::Scripted(queue) => match queue.pop_front() {
                Some(k) => Some(k),
                None => {
                    self.closed = true;
                    None
                }
            },
            Source::Stdin(rx) => match rx.try_recv() {
                Ok(k) => Some(k),
                Err(mpsc::TryRecvError::Empty) => None,
                Err(mpsc::TryRecvError::Disconnected) => {
                    self.closed = true;
                    None
                }
            },
        }
    }

    /// True once the input source can never produce another key (script
    /// exhausted, or stdin reached EOF).
    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

// ===========================================================================
// Tests
// ===========================================================================
