//! Client configuration shared by every front end.
//!
//! Only public values live here: the Supabase project URL and anon key, quote
//! provider endpoints and timing knobs. Session tokens never do.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::util::{is_http_url, normalize_text_option};

pub const DEFAULT_DEBOUNCE_MS: u64 = 450;
pub const DEFAULT_REMINDER_INTERVAL_SECS: u64 = 20;
pub const DEFAULT_QUOTE_TIMEOUT_SECS: u64 = 7;
pub const DEFAULT_QUOTABLE_URL: &str = "https://api.quotable.io/random";
pub const DEFAULT_ZENQUOTES_URL: &str = "https://zenquotes.io/api/random";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    #[serde(default)]
    pub supabase_url: Option<String>,
    #[serde(default)]
    pub supabase_anon_key: Option<String>,
    #[serde(default = "default_quotable_url")]
    pub quotable_url: String,
    #[serde(default = "default_zenquotes_url")]
    pub zenquotes_url: String,
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    #[serde(default = "default_reminder_interval_secs")]
    pub reminder_interval_secs: u64,
    #[serde(default = "default_quote_timeout_secs")]
    pub quote_timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            supabase_url: None,
            supabase_anon_key: None,
            quotable_url: default_quotable_url(),
            zenquotes_url: default_zenquotes_url(),
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            reminder_interval_secs: DEFAULT_REMINDER_INTERVAL_SECS,
            quote_timeout_secs: DEFAULT_QUOTE_TIMEOUT_SECS,
        }
    }
}

impl ClientConfig {
    pub fn from_json(payload: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(payload)?;
        config.normalized()
    }

    /// Trim values, drop blanks and check URL schemes.
    pub fn normalized(mut self) -> Result<Self> {
        self.supabase_url = normalize_text_option(self.supabase_url)
            .map(|url| url.trim_end_matches('/').to_string());
        self.supabase_anon_key = normalize_text_option(self.supabase_anon_key);
        if let Some(url) = &self.supabase_url {
            require_http_url(url, "supabase_url")?;
        }
        self.quotable_url = self.quotable_url.trim().to_string();
        self.zenquotes_url = self.zenquotes_url.trim().to_string();
        require_http_url(&self.quotable_url, "quotable_url")?;
        require_http_url(&self.zenquotes_url, "zenquotes_url")?;
        if self.reminder_interval_secs == 0 {
            return Err(Error::InvalidInput(
                "reminder_interval_secs must be greater than zero".to_string(),
            ));
        }
        Ok(self)
    }

    /// Supabase project URL and anon key when both are set.
    pub fn supabase(&self) -> Option<(&str, &str)> {
        Some((
            self.supabase_url.as_deref()?,
            self.supabase_anon_key.as_deref()?,
        ))
    }

    pub const fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub const fn reminder_interval(&self) -> Duration {
        Duration::from_secs(self.reminder_interval_secs)
    }

    pub const fn quote_timeout(&self) -> Duration {
        Duration::from_secs(self.quote_timeout_secs)
    }
}

fn require_http_url(value: &str, field: &str) -> Result<()> {
    if is_http_url(value) {
        Ok(())
    } else {
        Err(Error::InvalidInput(format!(
            "config field '{field}' must include http:// or https://"
        )))
    }
}

fn default_quotable_url() -> String {
    DEFAULT_QUOTABLE_URL.to_string()
}

fn default_zenquotes_url() -> String {
    DEFAULT_ZENQUOTES_URL.to_string()
}

const fn default_debounce_ms() -> u64 {
    DEFAULT_DEBOUNCE_MS
}

const fn default_reminder_interval_secs() -> u64 {
    DEFAULT_REMINDER_INTERVAL_SECS
}

const fn default_quote_timeout_secs() -> u64 {
    DEFAULT_QUOTE_TIMEOUT_SECS
}
