//! Local/cloud reconciliation and debounced workout sync.
//!
//! Reconciliation runs once per app session, after the view has been filled
//! from the local store. When the cloud is empty and the device has data, the
//! local copy is migrated upward. Then the cloud copy always replaces the
//! local one. There is no merge: the whole remote dataset wins.

use crate::db::KeyValueStore;
use crate::error::Result;
use crate::models::{Settings, WorkoutMap};
use crate::remote::RemoteStore;
use crate::state::SyncState;
use crate::storage::LocalStore;

mod debounce;

pub use debounce::{WorkoutSaveDebouncer, DEFAULT_DEBOUNCE};

/// Result of one reconciliation pass, ready for the view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileReport {
    pub state: SyncState,
    /// Local data was pushed to an empty cloud
    pub migrated: bool,
    /// Settings the view should show now
    pub settings: Option<Settings>,
    /// Workouts the view should show now
    pub workouts: WorkoutMap,
    /// Failure message when sync is degraded
    pub error: Option<String>,
}

impl ReconcileReport {
    #[must_use]
    pub const fn is_degraded(&self) -> bool {
        self.error.is_some()
    }
}

/// Whether either side holds anything worth keeping.
pub fn has_data(settings: Option<&Settings>, workouts: &WorkoutMap) -> bool {
    settings.is_some() || workouts.has_content()
}

/// Run reconciliation, degrading to local data on any failure.
///
/// The local store is only written after every remote read succeeded, so a
/// failure leaves it exactly as it was.
pub async fn reconcile<K, R>(local: &LocalStore<K>, remote: &R) -> ReconcileReport
where
    K: KeyValueStore,
    R: RemoteStore,
{
    match try_reconcile(local, remote).await {
        Ok(report) => report,
        Err(error) => {
            tracing::warn!("Cloud sync degraded, using local data: {}", error);
            let settings = local.load().await.ok().flatten();
            let workouts = local.load_workouts().await.unwrap_or_default();
            ReconcileReport {
                state: SyncState::Error,
                migrated: false,
                settings,
                workouts,
                error: Some(error.to_string()),
            }
        }
    }
}

/// Reconciliation steps with errors propagated to the caller.
pub async fn try_reconcile<K, R>(local: &LocalStore<K>, remote: &R) -> Result<ReconcileReport>
where
    K: KeyValueStore,
    R: RemoteStore,
{
    let local_settings = local.load().await?;
    let local_workouts = local.load_workouts().await?;

    let migrated = migrate_local_to_cloud_if_empty(local_settings.as_ref(), &local_workouts, remote)
        .await?;

    let cloud_settings = remote.load_settings().await?;
    let cloud_workouts = remote.load_workouts().await?;

    if let Some(settings) = &cloud_settings {
        local.save(settings).await?;
    }
    if let Err(error) = local.save_workouts(&cloud_workouts).await {
        if cloud_settings.is_some() {
            restore_settings(local, local_settings.as_ref()).await;
        }
        return Err(error);
    }

    tracing::info!(
        "Cloud sync complete ({} workout days with content{})",
        cloud_workouts.filled_days(),
        if migrated { ", local data migrated" } else { "" }
    );

    Ok(ReconcileReport {
        state: SyncState::Synced,
        migrated,
        settings: cloud_settings.or(local_settings),
        workouts: cloud_workouts,
        error: None,
    })
}

/// Put the pre-sync settings back after a partial local write.
async fn restore_settings<K: KeyValueStore>(local: &LocalStore<K>, previous: Option<&Settings>) {
    let restored = match previous {
        Some(settings) => local.save(settings).await,
        None => local.clear_settings().await,
    };
    if let Err(error) = restored {
        tracing::error!("Could not restore local settings after failed sync: {}", error);
    }
}

/// Push local data upward when the cloud holds nothing yet.
///
/// Returns `true` when a migration happened.
pub async fn migrate_local_to_cloud_if_empty<R: RemoteStore>(
    local_settings: Option<&Settings>,
    local_workouts: &WorkoutMap,
    remote: &R,
) -> Result<bool> {
    let cloud_settings = remote.load_settings().await?;
    let cloud_workouts = remote.load_workouts().await?;

    let cloud_has_data = has_data(cloud_settings.as_ref(), &cloud_workouts);
    let local_has_data = has_data(local_settings, local_workouts);

    if cloud_has_data || !local_has_data {
        tracing::debug!(
            "Skipping upward migration (cloud_has_data={}, local_has_data={})",
            cloud_has_data,
            local_has_data
        );
        return Ok(false);
    }

    if let Some(settings) = local_settings {
        remote.save_settings(settings).await?;
    }
    remote.save_workouts(local_workouts).await?;
    tracing::info!("Migrated local plan to empty cloud account");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::db::MemoryKeyValueStore;
    use crate::remote::{MemoryRemoteStore, RemoteCall};
    use crate::storage::KEY_WORKOUTS;
    use pretty_assertions::assert_eq;

    const USER: &str = "user-1";

    fn local() -> LocalStore<MemoryKeyValueStore> {
        LocalStore::new(MemoryKeyValueStore::new())
    }

    fn sample_settings() -> Settings {
        Settings {
            workouts_per_week: 3,
            selected_days: BTreeSet::from([0, 2, 4]),
            workout_time: "18:00".to_string(),
            quote_time: "09:00".to_string(),
        }
    }

    #[tokio::test]
    async fn empty_cloud_receives_local_data_once() {
        let local = local();
        let remote = MemoryRemoteStore::signed_in(USER, "a@x.com");
        local.save(&sample_settings()).await.unwrap();
        let mut workouts = WorkoutMap::new();
        workouts.set(2, "Deadlift 5x5");
        local.save_workouts(&workouts).await.unwrap();

        let report = reconcile(&local, &remote).await;
        assert_eq!(report.state, SyncState::Synced);
        assert!(report.migrated);
        assert_eq!(remote.settings_for(USER), Some(sample_settings()));
        let cloud = remote.workouts_for(USER);
        assert_eq!(cloud.filled_days(), 1);
        assert_eq!(cloud.get(2), "Deadlift 5x5");

        remote.clear_calls();
        let second = reconcile(&local, &remote).await;
        assert!(!second.migrated);
        assert_eq!(remote.writes(), Vec::<RemoteCall>::new());
    }

    #[tokio::test]
    async fn populated_cloud_overwrites_local() {
        let local = local();
        let remote = MemoryRemoteStore::signed_in(USER, "a@x.com");
        let mut stale = WorkoutMap::new();
        stale.set(0, "old plan");
        local.save_workouts(&stale).await.unwrap();

        let cloud_settings = Settings {
            workout_time: "07:00".to_string(),
            ..sample_settings()
        };
        let mut cloud_workouts = WorkoutMap::new();
        cloud_workouts.set(1, "cloud plan");
        remote.seed(USER, Some(cloud_settings.clone()), cloud_workouts);

        let report = reconcile(&local, &remote).await;
        assert!(!report.migrated);
        assert_eq!(report.settings, Some(cloud_settings.clone()));
        assert_eq!(local.load().await.unwrap(), Some(cloud_settings));
        let refreshed = local.load_workouts().await.unwrap();
        assert_eq!(refreshed.get(0), "");
        assert_eq!(refreshed.get(1), "cloud plan");
        assert_eq!(remote.writes(), Vec::<RemoteCall>::new());
    }

    #[tokio::test]
    async fn blank_cloud_workouts_do_not_count_as_data() {
        let local = local();
        let remote = MemoryRemoteStore::signed_in(USER, "a@x.com");
        let mut blank = WorkoutMap::new();
        blank.set(3, "   ");
        remote.seed(USER, None, blank);
        let mut workouts = WorkoutMap::new();
        workouts.set(3, "Rows 3x10");
        local.save_workouts(&workouts).await.unwrap();

        let report = reconcile(&local, &remote).await;
        assert!(report.migrated);
        assert_eq!(remote.workouts_for(USER).get(3), "Rows 3x10");
    }

    #[tokio::test]
    async fn nothing_anywhere_skips_migration() {
        let local = local();
        let remote = MemoryRemoteStore::signed_in(USER, "a@x.com");

        let report = reconcile(&local, &remote).await;
        assert!(!report.migrated);
        assert_eq!(report.settings, None);
        assert_eq!(remote.writes(), Vec::<RemoteCall>::new());
    }

    #[tokio::test]
    async fn failure_leaves_local_untouched() {
        let local = local();
        let remote = MemoryRemoteStore::signed_in(USER, "a@x.com");
        local.save(&sample_settings()).await.unwrap();
        let mut workouts = WorkoutMap::new();
        workouts.set(5, "Yoga");
        local.save_workouts(&workouts).await.unwrap();
        remote.fail_with(Some("network down"));

        let report = reconcile(&local, &remote).await;
        assert_eq!(report.state, SyncState::Error);
        assert!(report.is_degraded());
        assert!(report.error.unwrap().contains("network down"));
        assert_eq!(report.settings, Some(sample_settings()));
        assert_eq!(local.load_workouts().await.unwrap(), workouts);
    }

    #[tokio::test]
    async fn signed_out_reconcile_is_degraded() {
        let local = local();
        let remote = MemoryRemoteStore::default();
        let report = reconcile(&local, &remote).await;
        assert_eq!(report.state, SyncState::Error);
        assert!(report.error.unwrap().contains("Not signed in"));
    }

    #[tokio::test]
    async fn failed_workout_write_restores_previous_settings() {
        let local = local();
        let remote = MemoryRemoteStore::signed_in(USER, "a@x.com");
        local.save(&sample_settings()).await.unwrap();

        let cloud_settings = Settings {
            workouts_per_week: 5,
            ..sample_settings()
        };
        let mut cloud_workouts = WorkoutMap::new();
        cloud_workouts.set(0, "cloud plan");
        remote.seed(USER, Some(cloud_settings), cloud_workouts);
        local.kv().fail_writes(Some(KEY_WORKOUTS));

        let report = reconcile(&local, &remote).await;
        assert_eq!(report.state, SyncState::Error);
        assert_eq!(report.settings, Some(sample_settings()));
        assert_eq!(local.load().await.unwrap(), Some(sample_settings()));
    }

    #[tokio::test]
    async fn failed_workout_write_removes_settings_that_were_absent() {
        let local = local();
        let remote = MemoryRemoteStore::signed_in(USER, "a@x.com");
        remote.seed(USER, Some(sample_settings()), WorkoutMap::new());
        local.kv().fail_writes(Some(KEY_WORKOUTS));

        let report = reconcile(&local, &remote).await;
        assert!(report.is_degraded());
        assert_eq!(local.load().await.unwrap(), None);
    }
}
