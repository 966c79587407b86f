//! Weekly workout notes model

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::settings::DAYS_PER_WEEK;

/// Free-text workout notes keyed by day index (Monday = 0).
///
/// Sparse: a missing day reads as an empty note. Serializes as a JSON object
/// with stringified day keys, e.g. `{"0": "Bench 4x8"}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkoutMap(BTreeMap<u8, String>);

impl WorkoutMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Note for `day_index`, empty when absent.
    #[must_use]
    pub fn get(&self, day_index: u8) -> &str {
        self.0.get(&day_index).map_or("", String::as_str)
    }

    /// Replace the note for `day_index`.
    pub fn set(&mut self, day_index: u8, text: impl Into<String>) {
        self.0.insert(day_index, text.into());
    }

    /// True when at least one day has non-blank text.
    #[must_use]
    pub fn has_content(&self) -> bool {
        self.0.values().any(|text| !text.trim().is_empty())
    }

    /// Number of days with non-blank text.
    #[must_use]
    pub fn filled_days(&self) -> usize {
        self.0.values().filter(|text| !text.trim().is_empty()).count()
    }

    /// Entries whose text is not blank, in day order.
    pub fn non_blank(&self) -> impl Iterator<Item = (u8, &str)> {
        self.0
            .iter()
            .filter(|(_, text)| !text.trim().is_empty())
            .map(|(day, text)| (*day, text.as_str()))
    }

    /// One `(day, text)` pair per weekday, absent days as empty text.
    #[must_use]
    pub fn full_week(&self) -> Vec<(u8, String)> {
        (0..DAYS_PER_WEEK)
            .map(|day| (day, self.get(day).to_string()))
            .collect()
    }

    /// Compare ignoring the blank-vs-absent distinction.
    #[must_use]
    pub fn same_content(&self, other: &Self) -> bool {
        self.non_blank().eq(other.non_blank())
    }
}

impl FromIterator<(u8, String)> for WorkoutMap {
    fn from_iter<I: IntoIterator<Item = (u8, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
