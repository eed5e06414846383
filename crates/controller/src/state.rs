//! Controller state threaded explicitly through startup and the sampling
//! loop. There are no globals; `main` owns the single instance.

/// Calibrated sensor snapshot for one sampling cycle. Recomputed every
/// cycle; no history is kept.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorReading {
    pub temperature_c: f32,
    pub humidity_pct: f32,
}

pub struct SystemState {
    pub reading: SensorReading,
    pub actuator_on: bool,
    pub selection_confirmed: bool,
    pub selected_crop_id: u8,
    pub cycles: u64,
}

impl SystemState {
    pub fn new() -> Self {
        Self {
            reading: SensorReading {
                temperature_c: 0.0,
                humidity_pct: 0.0,
            },
            actuator_on: false,
            selection_confirmed: false,
            selected_crop_id: 0,
            cycles: 0,
        }
    }

    /// Mark the startup crop selection as final. Happens exactly once per
    /// process lifetime; there is no re-selection path.
    pub fn confirm_selection(&mut self, crop_id: u8) {
        debug_assert!(!self.selection_confirmed, "selection confirmed twice");
        self.selection_confirmed = true;
        self.selected_crop_id = crop_id;
    }

    /// Record the outcome of one sampling cycle.
    pub fn record_cycle(&mut self, reading: SensorReading, actuator_on: bool) {
        self.reading = reading;
        self.actuator_on = actuator_on;
        self.cycles += 1;
    }
}

// ===========================================================================
// Tests
// ===========================================================================
