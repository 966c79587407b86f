pub mod auth_cmd;
pub mod common;
pub mod completions;
pub mod config;
pub mod day;
pub mod home;
pub mod quote;
pub mod remind;
pub mod reset;
pub mod settings;
pub mod sync;
pub mod week;
