//! Crop-selection state machine. Runs exactly once at startup, soliciting
//! keypad digits until a valid crop id is confirmed; invalid keys re-prompt.
//! After confirmation the machine never re-enters; changing crop means
//! restarting the controller.

use anyhow::{bail, Result};
use std::thread;
use tracing::{info, warn};

use crate::catalog::{self, CropParameters, InvalidSelection};
use crate::config::Timing;
use crate::display::Display;
use crate::keypad::Keypad;

/// Outcome of the startup selection: the confirmed crop id and a wholesale
/// copy of its parameter tuple.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Selection {
    pub crop_id: u8,
    pub params: CropParameters,
}

/// Interpret one pressed key as a crop id candidate. Letters, `*`, and `#`
/// are rejected outright rather than silently mapped to a number.
pub fn interpret_key(key: char) -> Result<u8, InvalidSelection> {
    key.to_digit(10)
        .map(|d| d as u8)
        .ok_or(InvalidSelection::NotADigit(key))
}

/// Startup splash shown before the menu.
pub fn show_banner(display: &mut Display, timing: &Timing) {
    display.show_lines("Irrigation", "system");
    thread::sleep(timing.message_hold());
    display.show_lines("Starting...", "");
    thread::sleep(timing.message_hold());
}

/// Page through the crop menu, one screen per catalog entry.
pub fn show_menu(display: &mut Display, timing: &Timing) {
    display.show_lines("Select a", "crop");
    thread::sleep(timing.message_hold());
    for crop in catalog::CATALOG {
        display.show_lines(&format!("Crop {}", crop.id), crop.name);
        thread::sleep(timing.message_hold());
    }
}

/// Run the selection loop until a valid crop id is confirmed.
///
/// This is a poll-and-sleep busy wait: no key leaves the machine at the
/// prompt with a fixed inter-poll delay, which is acceptable as the sole
/// startup task. The only failure is the input source closing before a
/// selection lands (stdin EOF on a dev host); the hardware keypad never
/// closes.
pub fn run(keypad: &mut Keypad, display: &mut Display, timing: &Timing) -> Result<Selection> {
    let prompt = format!("crop (1-{})", catalog::size());

    loop {
        display.show_lines("Select a valid", &prompt);

        let Some(key) = keypad.poll_key() else {
            if keypad.is_closed() {
                bail!("keypad input closed before a crop was selected");
            }
            thread::sleep(timing.key_poll());
            continue;
        };

        match interpret_key(key).and_then(catalog::lookup) {
            Ok(crop) => {
                info!(crop_id = crop.id, crop = crop.name, "crop selection confirmed");
                display.show_lines("You selected:", crop.name);
                thread::sleep(timing.message_hold());
                display.show_lines("Loading...", "");
                thread::sleep(timing.message_hold());
                return Ok(Selection {
                    crop_id: crop.id,
                    params: crop.params,
                });
            }
            Err(e) => {
                warn!(key = %key, "invalid crop selection: {e}");
                display.show_lines("Invalid", "selection");
                thread::sleep(timing.message_hold());
            }
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(all(test, not(feature = "gpio")))]
mod tests {
    use super::*;
    use crate::config::LcdCfg;

    /// Zeroed delays so the poll loop runs flat out under test.
    fn instant() -> Timing {
        Timing {
            cycle_ms: 0,
            key_poll_ms: 0,
            message_hold_ms: 0,
        }
    }

    fn display() -> Display {
        Display::new(&LcdCfg::default()).unwrap()
    }

    // -- Key interpretation -----------------------------------------------

    #[test]
    fn digits_map_to_their_value() {
        for (i, key) in ('0'..='9').enumerate() {
            assert_eq!(interpret_key(key), Ok(i as u8));
        }
    }

    #[test]
    fn letters_rejected() {
        for key in ['A', 'B', 'C', 'D'] {
            assert_eq!(interpret_key(key), Err(InvalidSelection::NotADigit(key)));
        }
    }

    #[test]
    fn star_and_hash_rejected() {
        assert_eq!(interpret_key('*'), Err(InvalidSelection::NotADigit('*')));
        assert_eq!(interpret_key('#'), Err(InvalidSelection::NotADigit('#')));
    }

    // -- Selection loop ---------------------------------------------------

    #[test]
    fn first_valid_key_confirms() {
        let mut pad = Keypad::scripted(&['2']);
        let mut lcd = display();
        let sel = run(&mut pad, &mut lcd, &instant()).unwrap();
        assert_eq!(sel.crop_id, 2);
        assert_eq!(sel.params, catalog::lookup(2).unwrap().params);
    }

    #[test]
    fn out_of_range_then_valid() {
        // '5' has no crop behind it; '2' lands.
        let mut pad = Keypad::scripted(&['5', '2']);
        let mut lcd = display();
        let sel = run(&mut pad, &mut lcd, &instant()).unwrap();
        assert_eq!(sel.crop_id, 2);
        assert_eq!(sel.params, catalog::lookup(2).unwrap().params);
    }

    #[test]
    fn non_digit_keys_then_valid() {
        let mut pad = Keypad::scripted(&['A', '*', '#', '1']);
        let mut lcd = display();
        let sel = run(&mut pad, &mut lcd, &instant()).unwrap();
        assert_eq!(sel.crop_id, 1);
    }

    #[test]
    fn zero_is_out_of_range() {
        let mut pad = Keypad::scripted(&['0', '1']);
        let mut lcd = display();
        let sel = run(&mut pad, &mut lcd, &instant()).unwrap();
        assert_eq!(sel.crop_id, 1);
    }

    #[test]
    fn confirmation_leaves_loading_screen() {
        let mut pad = Keypad::scripted(&['1']);
        let mut lcd = display();
        run(&mut pad, &mut lcd, &instant()).unwrap();
        assert_eq!(lcd.lines()[0], "Loading...");
    }

    #[test]
    fn closed_input_before_selection_fails() {
        let mut pad = Keypad::scripted(&[]);
        let mut lcd = display();
        let err = run(&mut pad, &mut lcd, &instant()).unwrap_err();
        assert!(err.to_string().contains("keypad input closed"));
    }

    #[test]
    fn only_invalid_keys_then_closed_fails() {
        let mut pad = Keypad::scripted(&['9', 'D']);
        let mut lcd = display();
        assert!(run(&mut pad, &mut lcd, &instant()).is_err());
    }

    // -- Menu screens -----------------------------------------------------

    #[test]
    fn menu_ends_on_last_catalog_entry() {
        let mut lcd = display();
        show_menu(&mut lcd, &instant());
        let last = catalog::CATALOG.last().unwrap();
        assert_eq!(lcd.lines()[0], format!("Crop {}", last.id));
        assert_eq!(lcd.lines()[1], last.name);
    }

    #[test]
    fn banner_ends_on_starting_screen() {
        let mut lcd = display();
        show_banner(&mut lcd, &instant());
        assert_eq!(lcd.lines()[0], "Starting...");
    }
}
