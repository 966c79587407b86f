//! Debounced per-day workout writes.
//!
//! Every edit bumps a generation token and restarts the quiet-period timer.
//! When the timer fires it only writes if its token is still current, so a
//! burst of keystrokes produces one upsert per edited day carrying the latest
//! text. Writes already in flight are never cancelled.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::error::Result;
use crate::remote::RemoteStore;
use crate::state::SyncState;

/// Quiet period before a workout edit is pushed.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(450);

#[derive(Debug, Default)]
struct Slot {
    token: u64,
    pending: BTreeMap<u8, String>,
    timer: Option<JoinHandle<()>>,
}

pub struct WorkoutSaveDebouncer<R> {
    remote: Arc<R>,
    delay: Duration,
    slot: Arc<Mutex<Slot>>,
    status: Arc<watch::Sender<SyncState>>,
}

impl<R> WorkoutSaveDebouncer<R>
where
    R: RemoteStore + 'static,
{
    pub fn new(remote: Arc<R>, delay: Duration) -> Self {
        let (status, _) = watch::channel(SyncState::Offline);
        Self {
            remote,
            delay,
            slot: Arc::default(),
            status: Arc::new(status),
        }
    }

    /// Badge updates produced by debounced writes.
    pub fn subscribe(&self) -> watch::Receiver<SyncState> {
        self.status.subscribe()
    }

    pub fn status(&self) -> SyncState {
        *self.status.borrow()
    }

    /// Replace a stale `Error` once a later cloud write went through.
    pub fn clear_error(&self) {
        self.status.send_if_modified(|state| {
            if *state == SyncState::Error {
                *state = SyncState::Synced;
                true
            } else {
                false
            }
        });
    }

    /// Days with an edit that has not reached the cloud yet.
    pub fn pending_days(&self) -> Vec<u8> {
        lock(&self.slot).pending.keys().copied().collect()
    }

    /// Record an edit and restart the quiet period.
    ///
    /// Must be called from within a tokio runtime.
    pub fn schedule(&self, day_index: u8, text: impl Into<String>) {
        let mut slot = lock(&self.slot);
        slot.token = slot.token.wrapping_add(1);
        slot.pending.insert(day_index, text.into());
        if let Some(previous) = slot.timer.take() {
            previous.abort();
        }

        let token = slot.token;
        let delay = self.delay;
        let remote = Arc::clone(&self.remote);
        let shared = Arc::clone(&self.slot);
        let status = Arc::clone(&self.status);
        slot.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let edits = {
                let mut slot = lock(&shared);
                if slot.token != token {
                    return;
                }
                slot.timer = None;
                std::mem::take(&mut slot.pending)
            };
            if let Err(error) = push(remote.as_ref(), &status, edits).await {
                tracing::warn!("Debounced workout save failed, keeping local copy: {}", error);
            }
        }));
    }

    /// Write pending edits now instead of waiting for the timer.
    ///
    /// Returns the number of days written.
    pub async fn flush(&self) -> Result<usize> {
        let edits = {
            let mut slot = lock(&self.slot);
            slot.token = slot.token.wrapping_add(1);
            if let Some(timer) = slot.timer.take() {
                timer.abort();
            }
            std::mem::take(&mut slot.pending)
        };
        let count = edits.len();
        push(self.remote.as_ref(), &self.status, edits).await?;
        Ok(count)
    }

    /// Drop pending edits without writing them.
    pub fn cancel(&self) {
        let mut slot = lock(&self.slot);
        slot.token = slot.token.wrapping_add(1);
        slot.pending.clear();
        if let Some(timer) = slot.timer.take() {
            timer.abort();
        }
    }
}

impl<R> Drop for WorkoutSaveDebouncer<R> {
    fn drop(&mut self) {
        if let Some(timer) = lock(&self.slot).timer.take() {
            timer.abort();
        }
    }
}

fn lock(slot: &Mutex<Slot>) -> MutexGuard<'_, Slot> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

async fn push<R: RemoteStore>(
    remote: &R,
    status: &watch::Sender<SyncState>,
    edits: BTreeMap<u8, String>,
) -> Result<()> {
    if edits.is_empty() {
        return Ok(());
    }
    status.send_replace(SyncState::Syncing);
    for (day_index, text) in edits {
        if let Err(error) = remote.save_workout_day(day_index, &text).await {
            status.send_replace(SyncState::Error);
            return Err(error);
        }
        tracing::debug!("Saved workout day {} to cloud", day_index);
    }
    status.send_replace(SyncState::Synced);
    Ok(())
}
