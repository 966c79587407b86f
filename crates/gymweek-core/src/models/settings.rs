//! Weekly plan settings model

use std::collections::BTreeSet;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Highest valid day index (Sunday, with Monday = 0).
pub const MAX_DAY_INDEX: u8 = 6;

/// Number of days in the plan week.
pub const DAYS_PER_WEEK: u8 = 7;

const TIME_FORMAT: &str = "%H:%M";

/// Per-user plan settings.
///
/// Stored locally as camelCase JSON, which is the blob format existing
/// installations already have on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Planned sessions per week (1..=7)
    pub workouts_per_week: u8,
    /// Training days, Monday = 0 .. Sunday = 6
    pub selected_days: BTreeSet<u8>,
    /// Workout reminder time, `HH:MM`
    pub workout_time: String,
    /// Motivational quote reminder time, `HH:MM`
    pub quote_time: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            workouts_per_week: 3,
            selected_days: BTreeSet::from([0, 2, 4]),
            workout_time: "18:00".to_string(),
            quote_time: "09:00".to_string(),
        }
    }
}

impl Settings {
    /// Set the weekly target, clamped into `1..=7`.
    #[must_use]
    pub fn with_workouts_per_week(mut self, count: i64) -> Self {
        self.workouts_per_week = clamp_workouts_per_week(count);
        self
    }

    /// Add the day if missing, remove it otherwise.
    pub fn toggle_day(&mut self, day_index: u8) -> Result<()> {
        validate_day_index(day_index)?;
        if !self.selected_days.remove(&day_index) {
            self.selected_days.insert(day_index);
        }
        Ok(())
    }

    /// Whether `day_index` is a training day.
    #[must_use]
    pub fn is_workout_day(&self, day_index: u8) -> bool {
        self.selected_days.contains(&day_index)
    }

    /// Check the onboarding/settings form before it is submitted.
    pub fn validate(&self) -> Result<()> {
        if !(1..=DAYS_PER_WEEK).contains(&self.workouts_per_week) {
            return Err(Error::InvalidInput(format!(
                "workouts per week must be between 1 and {DAYS_PER_WEEK}"
            )));
        }
        if self.selected_days.is_empty() {
            return Err(Error::InvalidInput(
                "select at least one training day".to_string(),
            ));
        }
        if let Some(day) = self.selected_days.iter().find(|day| **day > MAX_DAY_INDEX) {
            return Err(Error::InvalidInput(format!("invalid day index {day}")));
        }
        parse_reminder_time(&self.workout_time)?;
        parse_reminder_time(&self.quote_time)?;
        Ok(())
    }
}

/// Clamp a raw weekly target into `1..=7`.
pub fn clamp_workouts_per_week(count: i64) -> u8 {
    u8::try_from(count.clamp(1, i64::from(DAYS_PER_WEEK))).unwrap_or(1)
}

/// Reject day indices outside Monday..Sunday.
pub fn validate_day_index(day_index: u8) -> Result<()> {
    if day_index > MAX_DAY_INDEX {
        return Err(Error::InvalidInput(format!(
            "day index must be between 0 (Mon) and {MAX_DAY_INDEX} (Sun), got {day_index}"
        )));
    }
    Ok(())
}

/// Parse an `HH:MM` reminder time.
pub fn parse_reminder_time(value: &str) -> Result<NaiveTime> {
    let trimmed = value.trim();
    if trimmed.len() != 5 {
        return Err(Error::InvalidInput(format!(
            "time must use HH:MM, got '{trimmed}'"
        )));
    }
    NaiveTime::parse_from_str(trimmed, TIME_FORMAT)
        .map_err(|_| Error::InvalidInput(format!("time must use HH:MM, got '{trimmed}'")))
}

/// Format a time-of-day the way reminder times are stored.
pub fn format_reminder_time(time: NaiveTime) -> String {
    time.format(TIME_FORMAT).to_string()
}
