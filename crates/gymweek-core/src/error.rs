//! Error types for gymweek-core

use thiserror::Error;

use crate::auth::AuthError;

/// Result type alias using gymweek-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in gymweek-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Local database error
    #[error("Database error: {0}")]
    Database(String),

    /// libSQL error
    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid input (blocks submission, e.g. empty day selection)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Cloud operation attempted without a signed-in user
    #[error("Not signed in: cloud data requires an authenticated session")]
    Unauthenticated,

    /// Transport failure talking to the remote backend
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Remote backend rejected the request
    #[error("Remote store error: {0}")]
    Remote(String),

    /// Authentication provider error
    #[error(transparent)]
    Auth(#[from] AuthError),
}

impl Error {
    /// Whether the failure came from the cloud side (the app keeps working on local data).
    #[must_use]
    pub const fn is_remote(&self) -> bool {
        matches!(
            self,
            Self::Unauthenticated | Self::Http(_) | Self::Remote(_) | Self::Auth(_)
        )
    }
}
