//! Remote store adapter over the per-user cloud tables.
//!
//! Every operation resolves the user id from the current session first and
//! fails with [`Error::Unauthenticated`] when nobody is signed in. Failures are
//! returned to the caller as-is; nothing here retries.

use std::future::Future;
use std::sync::{Arc, PoisonError, RwLock};

use crate::auth::{AuthSession, AuthUser};
use crate::error::{Error, Result};
use crate::models::{PendingProfile, Settings, WorkoutMap};

mod memory;
mod supabase;

pub use memory::{MemoryRemoteStore, RemoteCall};
pub use supabase::SupabaseRemoteStore;

/// Cloud CRUD used by the reconciler, the debouncer and the session gate.
pub trait RemoteStore: Send + Sync {
    /// Single-row lookup; `None` when the user has no settings row.
    fn load_settings(&self) -> impl Future<Output = Result<Option<Settings>>> + Send;

    /// Upsert keyed by user id.
    fn save_settings(&self, settings: &Settings) -> impl Future<Output = Result<()>> + Send;

    /// All day rows for the user reduced to a map.
    fn load_workouts(&self) -> impl Future<Output = Result<WorkoutMap>> + Send;

    /// Upsert one `(user, day)` row.
    fn save_workout_day(
        &self,
        day_index: u8,
        text: &str,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Upsert all seven day rows; absent days are written as empty text.
    fn save_workouts(&self, workouts: &WorkoutMap) -> impl Future<Output = Result<()>> + Send;

    /// Upsert the profile row for `user`.
    fn upsert_profile(
        &self,
        user: &AuthUser,
        profile: &PendingProfile,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Profile first name for the greeting, if any.
    fn load_first_name(&self) -> impl Future<Output = Result<Option<String>>> + Send;
}

/// Shared handle to the signed-in session.
///
/// The session gate writes it on auth transitions; remote adapters read it per
/// request so a sign-out takes effect immediately.
#[derive(Clone, Debug, Default)]
pub struct CurrentSession {
    inner: Arc<RwLock<Option<AuthSession>>>,
}

impl CurrentSession {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, session: AuthSession) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = Some(session);
    }

    pub fn clear(&self) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    #[must_use]
    pub fn get(&self) -> Option<AuthSession> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The signed-in session, or `Unauthenticated`.
    pub fn require(&self) -> Result<AuthSession> {
        self.get()
            .filter(|session| !session.user.id.trim().is_empty())
            .ok_or(Error::Unauthenticated)
    }
}
