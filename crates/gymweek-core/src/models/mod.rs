//! Data models for Gymweek

mod profile;
mod settings;
mod workouts;

pub use profile::{validate_credentials, PendingProfile, SignUpForm};
pub use settings::{
    clamp_workouts_per_week, format_reminder_time, parse_reminder_time, validate_day_index,
    Settings, DAYS_PER_WEEK, MAX_DAY_INDEX,
};
pub use workouts::WorkoutMap;
