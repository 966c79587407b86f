//! Shared client state types.

use std::fmt;

/// Cloud sync badge state.
///
/// `Offline` and `Error` both mean the app is running on local data only.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SyncState {
    #[default]
    Offline,
    Syncing,
    Synced,
    Error,
}

impl SyncState {
    /// True when cloud data is not currently backing the view.
    #[must_use]
    pub const fn is_local_only(self) -> bool {
        matches!(self, Self::Offline | Self::Error)
    }
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Offline => "Sync: local",
            Self::Syncing => "Sync: in progress",
            Self::Synced => "Sync: cloud",
            Self::Error => "Sync: local (cloud unavailable)",
        };
        f.write_str(label)
    }
}
