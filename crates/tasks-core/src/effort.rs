//! Effort strings: a number optionally suffixed with `d` (days) or `h` (hours).
//!
//! Unsuffixed values are days. A working day is eight hours.

use crate::error::CoreError;

const HOURS_PER_DAY: f64 = 8.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffortUnit {
    Days,
    Hours,
}

impl EffortUnit {
    pub fn suffix(self) -> char {
        match self {
            EffortUnit::Days => 'd',
            EffortUnit::Hours => 'h',
        }
    }
}

/// The explicit unit of an effort string, if it has one.
pub fn effort_unit(effort: &str) -> Option<EffortUnit> {
    match effort.chars().last() {
        Some('d') => Some(EffortUnit::Days),
        Some('h') => Some(EffortUnit::Hours),
        _ => None,
    }
}

/// Effort for display: appends `d` when no unit is present.
pub fn display_effort(effort: Option<&str>) -> Option<String> {
    let effort = effort.filter(|e| !e.is_empty())?;
    match effort_unit(effort) {
        Some(_) => Some(effort.to_string()),
        None => Some(format!("{effort}d")),
    }
}

/// Converts an effort string to days, rounded to three decimals.
///
/// A missing effort counts as zero days.
pub fn effort_to_days(effort: Option<&str>) -> Result<f64, CoreError> {
    let Some(effort) = effort else {
        return Ok(0.0);
    };
    let invalid = || CoreError::InvalidEffort {
        value: effort.to_string(),
    };

    let (number, unit) = match effort_unit(effort) {
        Some(unit) => (&effort[..effort.len() - 1], unit),
        None => (effort, EffortUnit::Days),
    };
    let value: f64 = number.trim().parse().map_err(|_| invalid())?;
    if !value.is_finite() {
        return Err(invalid());
    }

    let days = match unit {
        EffortUnit::Days => value,
        EffortUnit::Hours => value / HOURS_PER_DAY,
    };
    Ok((days * 1000.0).round() / 1000.0)
}
