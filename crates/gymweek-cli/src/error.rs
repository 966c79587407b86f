use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] gymweek_core::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Unknown day '{0}'. Use mon..sun, a full day name or 0..6")]
    InvalidDay(String),
    #[error("Settings are not configured yet. Run `gymweek settings init` first.")]
    SettingsMissing,
    #[error("Editor command failed: {0}")]
    EditorFailed(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Authentication error: {0}")]
    Auth(String),
    #[error("Not signed in. Run `gymweek auth login --email <email> --password <password>`.")]
    NotSignedIn,
    #[error(
        "Cloud sync is not configured. Run `gymweek config init --supabase-url <url> --supabase-anon-key <key>`, or set SUPABASE_URL and SUPABASE_ANON_KEY."
    )]
    CloudNotConfigured,
    #[error("Aborted")]
    Aborted,
}

impl From<gymweek_core::auth::AuthError> for CliError {
    fn from(error: gymweek_core::auth::AuthError) -> Self {
        Self::Auth(error.to_string())
    }
}
