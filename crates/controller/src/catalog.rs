//! Fixed crop catalog: a declarative id → parameter mapping validated at
//! startup. Ids are 1-based and match the order crops appear in the menu.

use anyhow::{bail, Result};
use thiserror::Error;

/// Irrigation thresholds for one crop. The active copy is overwritten
/// wholesale when a new selection is confirmed, never field-by-field.
///
/// Invariants (checked by [`validate`]): `min_temp_c <= max_temp_c` and
/// `0 <= min_humidity_pct <= max_humidity_pct <= 100`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropParameters {
    pub min_temp_c: f32,
    pub max_temp_c: f32,
    pub min_humidity_pct: f32,
    pub max_humidity_pct: f32,
}

#[derive(Debug, PartialEq)]
pub struct CropEntry {
    pub id: u8,
    pub name: &'static str,
    pub params: CropParameters,
}

pub const CATALOG: &[CropEntry] = &[
    CropEntry {
        id: 1,
        name: "Cilantro",
        params: CropParameters {
            min_temp_c: 15.0,
            max_temp_c: 24.0,
            min_humidity_pct: 40.0,
            max_humidity_pct: 50.0,
        },
    },
    CropEntry {
        id: 2,
        name: "Strawberry",
        params: CropParameters {
            min_temp_c: 15.0,
            max_temp_c: 20.0,
            min_humidity_pct: 60.0,
            max_humidity_pct: 80.0,
        },
    },
];

/// Number of crops, also the highest valid id.
pub fn size() -> u8 {
    CATALOG.len() as u8
}

/// A crop selection the controller refused. Recovered locally by
/// re-prompting; never fatal.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum InvalidSelection {
    #[error("key '{0}' is not a digit")]
    NotADigit(char),
    #[error("no crop with id {0}")]
    OutOfRange(u8),
}

/// Look up the catalog entry for `id`. Valid ids are `1..=size()`; anything
/// else is rejected without touching caller-held parameters.
pub fn lookup(id: u8) -> Result<&'static CropEntry, InvalidSelection> {
    CATALOG
        .iter()
        .find(|c| c.id == id)
        .ok_or(InvalidSelection::OutOfRange(id))
}

/// Validate the whole catalog at startup. Returns `Ok(())` or an error
/// describing every violation found (not just the first one).
pub fn validate() -> Result<()> {
    let mut errors: Vec<String> = Vec::new();

    if CATALOG.is_empty() {
        errors.push("catalog is empty".to_string());
    }

    for (i, c) in CATALOG.iter().enumerate() {
        let ctx = || format!("crop '{}' (entry {i})", c.name);

        // Ids must be 1-based, unique, and follow menu order.
        let expected = (i + 1) as u8;
        if c.id != expected {
            errors.push(format!("{}: id {} should be {expected}", ctx(), c.id));
        }

        if c.name.trim().is_empty() {
            errors.push(format!("entry {i}: name is empty"));
        }

        let p = &c.params;
        if p.min_temp_c > p.max_temp_c {
            errors.push(format!(
                "{}: min_temp_c ({}) exceeds max_temp_c ({})",
                ctx(),
                p.min_temp_c,
                p.max_temp_c
            ));
        }
        if !(0.0..=100.0).contains(&p.min_humidity_pct) {
            errors.push(format!(
                "{}: min_humidity_pct {} out of range [0, 100]",
                ctx(),
                p.min_humidity_pct
            ));
        }
        if !(0.0..=100.0).contains(&p.max_humidity_pct) {
            errors.push(format!(
                "{}: max_humidity_pct {} out of range [0, 100]",
                ctx(),
                p.max_humidity_pct
            ));
        }
        if p.min_humidity_pct > p.max_humidity_pct {
            errors.push(format!(
                "{}: min_humidity_pct ({}) exceeds max_humidity_pct ({})",
                ctx(),
                p.min_humidity_pct,
                p.max_humidity_pct
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        bail!(
            "crop catalog validation failed ({} error{}):\n  - {}",
            errors.len(),
            if errors.len() == 1 { "" } else { "s" },
            errors.join("\n  - ")
        );
    }
}

// ===========================================================================
// Tests
// ===========================================================================
