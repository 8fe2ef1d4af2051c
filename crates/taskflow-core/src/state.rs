//! Process-wide sync status shared with the UI layer.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The engine's current belief about remote reachability.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    #[default]
    Offline,
    Syncing,
    Synced,
}

impl SyncStatus {
    /// Whether moving from `self` to `next` is a legal status change.
    ///
    /// Every state may fall back to `Offline`; `Synced` is only reachable
    /// through `Syncing`.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (_, Self::Offline)
                | (Self::Offline | Self::Synced | Self::Syncing, Self::Syncing)
                | (Self::Syncing | Self::Synced, Self::Synced)
        )
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Offline => "offline",
            Self::Syncing => "syncing",
            Self::Synced => "synced",
        }
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offline_cannot_jump_to_synced() {
        assert!(!SyncStatus::Offline.can_transition_to(SyncStatus::Synced));
        assert!(SyncStatus::Offline.can_transition_to(SyncStatus::Syncing));
    }

    #[test]
    fn every_state_can_go_offline() {
        for status in [SyncStatus::Offline, SyncStatus::Syncing, SyncStatus::Synced] {
            assert!(status.can_transition_to(SyncStatus::Offline));
        }
    }

    #[test]
    fn synced_restarts_through_syncing() {
        assert!(SyncStatus::Synced.can_transition_to(SyncStatus::Syncing));
        assert!(SyncStatus::Syncing.can_transition_to(SyncStatus::Synced));
    }

    #[test]
    fn serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&SyncStatus::Syncing).unwrap(),
            "\"syncing\""
        );
        assert_eq!(SyncStatus::Synced.to_string(), "synced");
    }
}
