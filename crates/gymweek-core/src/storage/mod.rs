//! Local store: JSON blobs for settings, workouts and the pending profile.
//!
//! Reads never fail on corrupt data: a blob that does not parse is treated as
//! absent and logged. Only I/O failures of the underlying store propagate.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::db::KeyValueStore;
use crate::error::Result;
use crate::models::{PendingProfile, Settings, WorkoutMap};

pub const KEY_SETTINGS: &str = "gym.settings.v1";
pub const KEY_WORKOUTS: &str = "gym.workouts.v1";
pub const KEY_PENDING_PROFILE: &str = "gym.pendingProfile.v1";

/// Typed access to the on-device blobs.
#[derive(Clone, Debug)]
pub struct LocalStore<K> {
    kv: K,
}

impl<K: KeyValueStore> LocalStore<K> {
    pub const fn new(kv: K) -> Self {
        Self { kv }
    }

    pub const fn kv(&self) -> &K {
        &self.kv
    }

    pub async fn load(&self) -> Result<Option<Settings>> {
        self.read_json(KEY_SETTINGS).await
    }

    pub async fn save(&self, settings: &Settings) -> Result<()> {
        self.write_json(KEY_SETTINGS, settings).await
    }

    pub async fn clear_settings(&self) -> Result<()> {
        self.kv.delete(KEY_SETTINGS).await
    }

    pub async fn load_workouts(&self) -> Result<WorkoutMap> {
        Ok(self.read_json(KEY_WORKOUTS).await?.unwrap_or_default())
    }

    pub async fn save_workouts(&self, workouts: &WorkoutMap) -> Result<()> {
        self.write_json(KEY_WORKOUTS, workouts).await
    }

    /// Delete settings and workouts.
    pub async fn reset_all(&self) -> Result<()> {
        self.kv.delete(KEY_SETTINGS).await?;
        self.kv.delete(KEY_WORKOUTS).await?;
        tracing::debug!("Cleared local settings and workouts");
        Ok(())
    }

    pub async fn load_pending_profile(&self) -> Result<Option<PendingProfile>> {
        self.read_json(KEY_PENDING_PROFILE).await
    }

    pub async fn save_pending_profile(&self, profile: &PendingProfile) -> Result<()> {
        self.write_json(KEY_PENDING_PROFILE, profile).await
    }

    pub async fn clear_pending_profile(&self) -> Result<()> {
        self.kv.delete(KEY_PENDING_PROFILE).await
    }

    async fn read_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let Some(raw) = self.kv.get(key).await? else {
            return Ok(None);
        };
        if raw.trim().is_empty() {
            return Ok(None);
        }
        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(error) => {
                tracing::warn!("Ignoring unreadable local blob '{}': {}", key, error);
                Ok(None)
            }
        }
    }

    async fn write_json<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let raw = serde_json::to_string(value)?;
        self.kv.set(key, &raw).await
    }
}
