//! View-model core shared by front ends.

use std::sync::Arc;
use std::time::Duration;

use crate::db::KeyValueStore;
use crate::error::Result;
use crate::models::{validate_day_index, Settings, WorkoutMap};
use crate::remote::RemoteStore;
use crate::state::SyncState;
use crate::storage::LocalStore;
use crate::sync::{reconcile, ReconcileReport, WorkoutSaveDebouncer};

/// Local-first planner state with optional cloud backing.
///
/// Every mutation lands in the local store first. When a remote store is
/// attached, settings are pushed right away and workout text is debounced.
pub struct Tracker<K, R> {
    local: LocalStore<K>,
    remote: Option<Arc<R>>,
    debouncer: Option<WorkoutSaveDebouncer<R>>,
    settings: Option<Settings>,
    workouts: WorkoutMap,
    sync_state: SyncState,
    last_error: Option<String>,
}

impl<K, R> Tracker<K, R>
where
    K: KeyValueStore,
    R: RemoteStore + 'static,
{
    pub fn new(local: LocalStore<K>, remote: Option<Arc<R>>, debounce: Duration) -> Self {
        let debouncer = remote
            .as_ref()
            .map(|remote| WorkoutSaveDebouncer::new(Arc::clone(remote), debounce));
        Self {
            local,
            remote,
            debouncer,
            settings: None,
            workouts: WorkoutMap::new(),
            sync_state: SyncState::Offline,
            last_error: None,
        }
    }

    /// Local-only tracker; nothing ever leaves the device.
    pub fn offline(local: LocalStore<K>) -> Self {
        Self::new(local, None, Duration::ZERO)
    }

    pub const fn local(&self) -> &LocalStore<K> {
        &self.local
    }

    pub fn remote(&self) -> Option<&R> {
        self.remote.as_deref()
    }

    pub const fn settings(&self) -> Option<&Settings> {
        self.settings.as_ref()
    }

    pub const fn workouts(&self) -> &WorkoutMap {
        &self.workouts
    }

    /// Current badge state, including debounced write results.
    pub fn sync_state(&self) -> SyncState {
        match self.debouncer.as_ref().map(WorkoutSaveDebouncer::status) {
            Some(SyncState::Error) => SyncState::Error,
            _ => self.sync_state,
        }
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Fill the view from the device before any network call.
    pub async fn load_local(&mut self) -> Result<()> {
        self.settings = self.local.load().await?;
        self.workouts = self.local.load_workouts().await?;
        Ok(())
    }

    /// One-time cloud reconciliation for this session.
    pub async fn reconcile(&mut self) -> ReconcileReport {
        let Some(remote) = self.remote.clone() else {
            return ReconcileReport {
                state: SyncState::Offline,
                migrated: false,
                settings: self.settings.clone(),
                workouts: self.workouts.clone(),
                error: None,
            };
        };

        self.sync_state = SyncState::Syncing;
        let report = reconcile(&self.local, remote.as_ref()).await;
        self.sync_state = report.state;
        if report.state == SyncState::Synced {
            self.clear_debounced_error();
        }
        self.last_error.clone_from(&report.error);
        self.settings.clone_from(&report.settings);
        self.workouts = report.workouts.clone();
        report
    }

    /// Save the text locally now and schedule the cloud write.
    pub async fn update_workout_text(&mut self, day_index: u8, text: &str) -> Result<()> {
        validate_day_index(day_index)?;
        self.workouts.set(day_index, text);
        self.local.save_workouts(&self.workouts).await?;
        if let Some(debouncer) = &self.debouncer {
            debouncer.schedule(day_index, text);
        }
        Ok(())
    }

    /// Validate and store settings; a cloud failure keeps the local copy.
    pub async fn save_settings(&mut self, settings: Settings) -> Result<SyncState> {
        settings.validate()?;
        self.local.save(&settings).await?;
        self.settings = Some(settings.clone());

        if let Some(remote) = &self.remote {
            match remote.save_settings(&settings).await {
                Ok(()) => {
                    self.sync_state = SyncState::Synced;
                    self.last_error = None;
                    self.clear_debounced_error();
                }
                Err(error) => {
                    tracing::warn!("Settings saved locally only: {}", error);
                    self.sync_state = SyncState::Error;
                    self.last_error = Some(error.to_string());
                }
            }
        }
        Ok(self.sync_state)
    }

    /// Wipe settings and workouts from the device.
    pub async fn reset(&mut self) -> Result<()> {
        if let Some(debouncer) = &self.debouncer {
            debouncer.cancel();
        }
        self.local.reset_all().await?;
        self.settings = None;
        self.workouts = WorkoutMap::new();
        Ok(())
    }

    /// Push any pending workout edit immediately.
    pub async fn flush(&mut self) -> Result<usize> {
        let Some(debouncer) = &self.debouncer else {
            return Ok(0);
        };
        match debouncer.flush().await {
            Ok(count) => {
                if count > 0 {
                    self.sync_state = SyncState::Synced;
                }
                Ok(count)
            }
            Err(error) => {
                self.sync_state = SyncState::Error;
                self.last_error = Some(error.to_string());
                Err(error)
            }
        }
    }

    fn clear_debounced_error(&self) {
        if let Some(debouncer) = &self.debouncer {
            debouncer.clear_error();
        }
    }

    /// Profile first name for the greeting; `None` offline or on failure.
    pub async fn first_name(&self) -> Option<String> {
        let remote = self.remote.as_ref()?;
        match remote.load_first_name().await {
            Ok(name) => name,
            Err(error) => {
                tracing::debug!("Could not load profile name: {}", error);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryKeyValueStore;
    use crate::models::PendingProfile;
    use crate::remote::{MemoryRemoteStore, RemoteCall};
    use crate::auth::AuthUser;
    use pretty_assertions::assert_eq;

    type TestTracker = Tracker<MemoryKeyValueStore, MemoryRemoteStore>;

    fn online() -> (MemoryRemoteStore, TestTracker) {
        let remote = MemoryRemoteStore::signed_in("user-1", "a@x.com");
        let tracker = Tracker::new(
            LocalStore::new(MemoryKeyValueStore::new()),
            Some(Arc::new(remote.clone())),
            Duration::from_millis(450),
        );
        (remote, tracker)
    }

    #[tokio::test]
    async fn offline_tracker_keeps_everything_local() {
        let mut tracker: TestTracker = Tracker::offline(LocalStore::new(MemoryKeyValueStore::new()));
        tracker.save_settings(Settings::default()).await.unwrap();
        tracker.update_workout_text(1, "Bench").await.unwrap();

        let report = tracker.reconcile().await;
        assert_eq!(report.state, SyncState::Offline);
        assert_eq!(tracker.sync_state(), SyncState::Offline);
        assert_eq!(tracker.local().load_workouts().await.unwrap().get(1), "Bench");
        assert_eq!(tracker.flush().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn workout_edit_is_local_immediately_and_remote_on_flush() {
        let (remote, mut tracker) = online();
        tracker.update_workout_text(4, "Intervals").await.unwrap();

        assert_eq!(tracker.local().load_workouts().await.unwrap().get(4), "Intervals");
        assert!(remote.writes().is_empty());

        assert_eq!(tracker.flush().await.unwrap(), 1);
        assert_eq!(remote.workouts_for("user-1").get(4), "Intervals");
        assert_eq!(tracker.sync_state(), SyncState::Synced);
    }

    #[tokio::test]
    async fn settings_failure_keeps_local_copy() {
        let (remote, mut tracker) = online();
        remote.fail_with(Some("timeout"));

        let state = tracker.save_settings(Settings::default()).await.unwrap();
        assert_eq!(state, SyncState::Error);
        assert_eq!(tracker.local().load().await.unwrap(), Some(Settings::default()));
        assert!(tracker.last_error().unwrap().contains("timeout"));
    }

    #[tokio::test]
    async fn later_success_clears_failed_workout_write() {
        let (remote, mut tracker) = online();
        remote.fail_with(Some("offline"));
        tracker.update_workout_text(1, "Bench").await.unwrap();
        assert!(tracker.flush().await.is_err());
        assert_eq!(tracker.sync_state(), SyncState::Error);

        remote.fail_with(None);
        let state = tracker.save_settings(Settings::default()).await.unwrap();
        assert_eq!(state, SyncState::Synced);
        assert_eq!(tracker.sync_state(), SyncState::Synced);

        remote.fail_with(Some("offline"));
        tracker.update_workout_text(2, "Legs").await.unwrap();
        assert!(tracker.flush().await.is_err());
        remote.fail_with(None);
        tracker.reconcile().await;
        assert_eq!(tracker.sync_state(), SyncState::Synced);
    }

    #[tokio::test]
    async fn invalid_settings_are_rejected_before_saving() {
        let (remote, mut tracker) = online();
        let settings = Settings {
            selected_days: std::collections::BTreeSet::new(),
            ..Settings::default()
        };
        assert!(tracker.save_settings(settings).await.is_err());
        assert_eq!(tracker.local().load().await.unwrap(), None);
        assert!(remote.writes().is_empty());
    }

    #[tokio::test]
    async fn reconcile_updates_view() {
        let (remote, mut tracker) = online();
        let mut workouts = WorkoutMap::new();
        workouts.set(0, "Cloud day");
        remote.seed("user-1", Some(Settings::default()), workouts);

        tracker.load_local().await.unwrap();
        assert_eq!(tracker.settings(), None);

        tracker.reconcile().await;
        assert_eq!(tracker.settings(), Some(&Settings::default()));
        assert_eq!(tracker.workouts().get(0), "Cloud day");
        assert_eq!(tracker.sync_state(), SyncState::Synced);
    }

    #[tokio::test]
    async fn reset_clears_view_and_pending_edits() {
        let (remote, mut tracker) = online();
        tracker.save_settings(Settings::default()).await.unwrap();
        tracker.update_workout_text(2, "Legs").await.unwrap();
        remote.clear_calls();

        tracker.reset().await.unwrap();
        assert_eq!(tracker.settings(), None);
        assert!(!tracker.workouts().has_content());
        assert_eq!(tracker.flush().await.unwrap(), 0);
        assert_eq!(remote.writes(), Vec::<RemoteCall>::new());
    }

    #[tokio::test]
    async fn first_name_comes_from_profile() {
        let (remote, tracker) = online();
        assert_eq!(tracker.first_name().await, None);

        let user = AuthUser {
            id: "user-1".to_string(),
            email: Some("a@x.com".to_string()),
        };
        let profile = PendingProfile {
            email: "a@x.com".to_string(),
            first_name: "giulia".to_string(),
            last_name: "Rossi".to_string(),
            birth_date: "1994-03-12".to_string(),
            nationality: "Italian".to_string(),
            created_at: 0,
        };
        remote.upsert_profile(&user, &profile).await.unwrap();
        assert_eq!(tracker.first_name().await.as_deref(), Some("Giulia"));
    }
}
