//! Monday-based week arithmetic and day labels.

use chrono::{Datelike, Days, NaiveDate};

use crate::models::Settings;

pub const DAY_NAMES: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];
pub const DAY_NAMES_LONG: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// Day index with Monday = 0 and Sunday = 6.
#[must_use]
pub fn weekday_index(date: NaiveDate) -> u8 {
    // num_days_from_monday is always in 0..7
    u8::try_from(date.weekday().num_days_from_monday()).unwrap_or_default()
}

/// Monday of the week containing `date`.
#[must_use]
pub fn start_of_week(date: NaiveDate) -> NaiveDate {
    date.checked_sub_days(Days::new(u64::from(weekday_index(date))))
        .unwrap_or(date)
}

/// The seven dates of the week containing `anchor`, Monday first.
#[must_use]
pub fn week_dates(anchor: NaiveDate) -> Vec<NaiveDate> {
    start_of_week(anchor)
        .iter_days()
        .take(7)
        .collect()
}

/// Shift `anchor` by whole weeks.
#[must_use]
pub fn offset_weeks(anchor: NaiveDate, weeks: i64) -> NaiveDate {
    let days = weeks.saturating_mul(7);
    if days >= 0 {
        anchor.checked_add_days(Days::new(days.unsigned_abs()))
    } else {
        anchor.checked_sub_days(Days::new(days.unsigned_abs()))
    }
    .unwrap_or(anchor)
}

#[must_use]
pub fn format_dd_mm(date: NaiveDate) -> String {
    date.format("%d/%m").to_string()
}

#[must_use]
pub fn day_name(day_index: u8) -> &'static str {
    DAY_NAMES
        .get(usize::from(day_index))
        .copied()
        .unwrap_or_default()
}

#[must_use]
pub fn day_name_long(day_index: u8) -> &'static str {
    DAY_NAMES_LONG
        .get(usize::from(day_index))
        .copied()
        .unwrap_or_default()
}

#[must_use]
pub fn is_workout_day(settings: &Settings, date: NaiveDate) -> bool {
    settings.is_workout_day(weekday_index(date))
}
