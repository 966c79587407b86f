//! Account profile captured at sign-up

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

const MIN_PASSWORD_LEN: usize = 6;

/// Profile fields held locally until a matching session can receive them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingProfile {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    /// `YYYY-MM-DD`
    pub birth_date: String,
    pub nationality: String,
    /// Capture time (Unix ms)
    pub created_at: i64,
}

impl PendingProfile {
    /// Whether this record belongs to `email` (case-insensitive).
    #[must_use]
    pub fn matches_email(&self, email: &str) -> bool {
        self.email.trim().eq_ignore_ascii_case(email.trim())
    }
}

/// Sign-up form as submitted by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignUpForm {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub birth_date: String,
    pub nationality: String,
}

impl SignUpForm {
    /// Validate credentials and profile fields, then build the pending record.
    pub fn into_pending_profile(self, created_at: i64) -> Result<(PendingProfile, String)> {
        validate_credentials(&self.email, &self.password)?;
        if self.first_name.trim().is_empty() {
            return Err(Error::InvalidInput("first name is required".to_string()));
        }
        if self.last_name.trim().is_empty() {
            return Err(Error::InvalidInput("last name is required".to_string()));
        }
        let birth_date = self.birth_date.trim();
        if birth_date.is_empty() {
            return Err(Error::InvalidInput("birth date is required".to_string()));
        }
        NaiveDate::parse_from_str(birth_date, "%Y-%m-%d").map_err(|_| {
            Error::InvalidInput(format!("birth date must use YYYY-MM-DD, got '{birth_date}'"))
        })?;
        if self.nationality.trim().is_empty() {
            return Err(Error::InvalidInput("nationality is required".to_string()));
        }

        let profile = PendingProfile {
            email: self.email.trim().to_string(),
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            birth_date: birth_date.to_string(),
            nationality: self.nationality.trim().to_string(),
            created_at,
        };
        Ok((profile, self.password))
    }
}

/// Email/password checks shared by sign-in and sign-up.
pub fn validate_credentials(email: &str, password: &str) -> Result<()> {
    if !email.contains('@') {
        return Err(Error::InvalidInput("enter a valid email address".to_string()));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(Error::InvalidInput(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}
