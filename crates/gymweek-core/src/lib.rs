//! gymweek-core - Core library for Gymweek
//!
//! This crate contains the models, local store, cloud sync, session handling
//! and reminder logic used by every Gymweek interface.

pub mod auth;
pub mod calendar;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod quotes;
pub mod reminders;
pub mod remote;
pub mod services;
pub mod session;
pub mod state;
pub mod storage;
pub mod sync;
pub mod util;

pub use config::ClientConfig;
pub use error::{Error, Result};
pub use models::{PendingProfile, Settings, SignUpForm, WorkoutMap};
pub use services::Tracker;
pub use state::SyncState;
