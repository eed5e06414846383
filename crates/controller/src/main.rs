#[cfg(feature = "gpio")]
mod adc;
mod catalog;
mod config;
mod display;
mod engine;
mod keypad;
mod relay;
mod select;
mod sensor;
#[cfg(all(feature = "sim", not(feature = "gpio")))]
mod sim;
mod state;

#[cfg(all(not(feature = "sim"), not(feature = "gpio")))]
compile_error!("enable either the \"sim\" (default) or \"gpio\" feature");

use anyhow::{Context, Result};
use std::{env, thread};
use tracing::{info, warn};

use display::Display;
use keypad::Keypad;
use relay::Relay;
use select::Selection;
use sensor::SensorBank;
use state::SystemState;

/// Cycles between "still alive" status lines in the log.
const STATUS_LOG_EVERY: u64 = 60;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // ── Config + catalog ────────────────────────────────────────────
    let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "controller.toml".to_string());
    let cfg = config::load_or_default(&config_path)?;
    catalog::validate().context("crop catalog")?;

    // ── Hardware (relay first, forced off) ──────────────────────────
    let mut relay = Relay::new(cfg.relay.gpio_pin, cfg.relay.active_low)?;
    relay.set(false);

    let mut display = Display::new(&cfg.lcd)?;
    let mut keypad = Keypad::new(&cfg.keypad)?;
    let mut sensors = SensorBank::new(&cfg)?;

    // ── Startup: banner, menu, crop selection (runs exactly once) ───
    select::show_banner(&mut display, &cfg.timing);
    select::show_menu(&mut display, &cfg.timing);

    let Selection { crop_id, params } = select::run(&mut keypad, &mut display, &cfg.timing)?;

    let mut state = SystemState::new();
    state.confirm_selection(crop_id);

    info!(crop_id, cycle_ms = cfg.timing.cycle_ms, "entering sampling loop");

    // ── Sampling loop: read → decide → display → actuate → sleep ────
    loop {
        let reading = match sensors.read() {
            Ok(r) => r,
            Err(e) => {
                // Keep the pump off until the sensors answer again.
                warn!("sensor read failed: {e}");
                display.show_lines("Sensor read", "failed");
                relay.set(false);
                thread::sleep(cfg.timing.cycle());
                continue;
            }
        };

        let on = match engine::decide(&reading, &params) {
            Ok(on) => {
                display.show_lines(
                    &format!("Temp: {:.1} C", reading.temperature_c),
                    &format!("Humidity: {:.1} %", reading.humidity_pct),
                );
                on
            }
            Err(e) => {
                // Fail-safe: suspect data never irrigates.
                warn!(
                    temperature_c = reading.temperature_c,
                    humidity_pct = reading.humidity_pct,
                    "sensor fault: {e}"
                );
                match e {
                    engine::SensorOutOfRange::Temperature(_) => {
                        display.show_lines("Temp out of", "plausible range");
                    }
                    engine::SensorOutOfRange::Humidity(_) => {
                        display.show_lines("Humidity out of", "plausible range");
                    }
                }
                false
            }
        };

        relay.set(on);
        sensors.set_watering(relay.is_on());
        state.record_cycle(reading, on);

        if state.cycles % STATUS_LOG_EVERY == 0 {
            info!(
                cycles = state.cycles,
                crop_id = state.selected_crop_id,
                temperature_c = state.reading.temperature_c,
                humidity_pct = state.reading.humidity_pct,
                actuator_on = state.actuator_on,
                "cycle status"
            );
        }

        thread::sleep(cfg.timing.cycle());
    }
}
