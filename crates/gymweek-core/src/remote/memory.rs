//! In-memory [`RemoteStore`] with a call log, for tests and offline demos.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use super::{CurrentSession, RemoteStore};
use crate::auth::{AuthSession, AuthUser};
use crate::error::{Error, Result};
use crate::models::{PendingProfile, Settings, WorkoutMap};

/// A write (or read) that reached the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteCall {
    LoadSettings,
    SaveSettings(Settings),
    LoadWorkouts,
    SaveWorkoutDay { day_index: u8, text: String },
    SaveWorkouts(WorkoutMap),
    UpsertProfile { user_id: String, email: String },
    LoadFirstName,
}

#[derive(Debug, Default)]
struct Tables {
    settings: HashMap<String, Settings>,
    workouts: HashMap<String, WorkoutMap>,
    profiles: HashMap<String, PendingProfile>,
    calls: Vec<RemoteCall>,
    failure: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct MemoryRemoteStore {
    tables: Arc<Mutex<Tables>>,
    session: CurrentSession,
}

impl MemoryRemoteStore {
    pub fn new(session: CurrentSession) -> Self {
        Self {
            tables: Arc::default(),
            session,
        }
    }

    /// Store whose session is already signed in as `user_id`.
    pub fn signed_in(user_id: &str, email: &str) -> Self {
        let session = CurrentSession::new();
        session.set(AuthSession {
            access_token: format!("access-{user_id}"),
            refresh_token: format!("refresh-{user_id}"),
            expires_at: i64::MAX,
            user: AuthUser {
                id: user_id.to_string(),
                email: Some(email.to_string()),
            },
        });
        Self::new(session)
    }

    pub const fn session(&self) -> &CurrentSession {
        &self.session
    }

    /// Make every following call fail with `message` until cleared.
    pub fn fail_with(&self, message: Option<&str>) {
        self.lock().failure = message.map(str::to_string);
    }

    pub fn calls(&self) -> Vec<RemoteCall> {
        self.lock().calls.clone()
    }

    /// Only the calls that write.
    pub fn writes(&self) -> Vec<RemoteCall> {
        self.calls()
            .into_iter()
            .filter(|call| {
                !matches!(
                    call,
                    RemoteCall::LoadSettings | RemoteCall::LoadWorkouts | RemoteCall::LoadFirstName
                )
            })
            .collect()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    pub fn settings_for(&self, user_id: &str) -> Option<Settings> {
        self.lock().settings.get(user_id).cloned()
    }

    pub fn workouts_for(&self, user_id: &str) -> WorkoutMap {
        self.lock().workouts.get(user_id).cloned().unwrap_or_default()
    }

    pub fn profile_for(&self, user_id: &str) -> Option<PendingProfile> {
        self.lock().profiles.get(user_id).cloned()
    }

    /// Seed rows directly, bypassing the call log.
    pub fn seed(&self, user_id: &str, settings: Option<Settings>, workouts: WorkoutMap) {
        let mut tables = self.lock();
        if let Some(settings) = settings {
            tables.settings.insert(user_id.to_string(), settings);
        }
        tables.workouts.insert(user_id.to_string(), workouts);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Resolve the user, record the call and apply `f` unless failing.
    fn call<T>(&self, call: RemoteCall, f: impl FnOnce(&mut Tables, &AuthUser) -> T) -> Result<T> {
        let session = self.session.require()?;
        let mut tables = self.lock();
        if let Some(message) = tables.failure.clone() {
            return Err(Error::Remote(message));
        }
        tables.calls.push(call);
        Ok(f(&mut tables, &session.user))
    }
}

impl RemoteStore for MemoryRemoteStore {
    async fn load_settings(&self) -> Result<Option<Settings>> {
        self.call(RemoteCall::LoadSettings, |tables, user| {
            tables.settings.get(&user.id).cloned()
        })
    }

    async fn save_settings(&self, settings: &Settings) -> Result<()> {
        self.call(RemoteCall::SaveSettings(settings.clone()), |tables, user| {
            tables.settings.insert(user.id.clone(), settings.clone());
        })
    }

    async fn load_workouts(&self) -> Result<WorkoutMap> {
        self.call(RemoteCall::LoadWorkouts, |tables, user| {
            tables.workouts.get(&user.id).cloned().unwrap_or_default()
        })
    }

    async fn save_workout_day(&self, day_index: u8, text: &str) -> Result<()> {
        crate::models::validate_day_index(day_index)?;
        let call = RemoteCall::SaveWorkoutDay {
            day_index,
            text: text.to_string(),
        };
        self.call(call, |tables, user| {
            tables
                .workouts
                .entry(user.id.clone())
                .or_default()
                .set(day_index, text);
        })
    }

    async fn save_workouts(&self, workouts: &WorkoutMap) -> Result<()> {
        self.call(RemoteCall::SaveWorkouts(workouts.clone()), |tables, user| {
            let week = workouts.full_week().into_iter().collect();
            tables.workouts.insert(user.id.clone(), week);
        })
    }

    async fn upsert_profile(&self, user: &AuthUser, profile: &PendingProfile) -> Result<()> {
        let call = RemoteCall::UpsertProfile {
            user_id: user.id.clone(),
            email: profile.email.clone(),
        };
        let target = user.id.clone();
        self.call(call, |tables, _| {
            tables.profiles.insert(target, profile.clone());
        })
    }

    async fn load_first_name(&self) -> Result<Option<String>> {
        self.call(RemoteCall::LoadFirstName, |tables, user| {
            tables
                .profiles
                .get(&user.id)
                .map(|profile| crate::util::capitalize_first(&profile.first_name))
        })
    }
}
