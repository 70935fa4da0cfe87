//! The observable sync-status event shape.

/// Coarse engine state, reported on the status stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStatus {
    /// No sync in progress.
    Idle,
    /// A sync is draining the pending set.
    Syncing,
    /// The last sync ended in an unrecovered engine-level error.
    Error,
}

/// A single event on the sync engine's status stream.
///
/// `total` and `completed` are only meaningful while `status == Syncing`;
/// `error` is only set when `status == Error`.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncStatusEvent {
    /// Current coarse state.
    pub status: SyncStatus,
    /// Total operations being drained in the current sync.
    pub total: usize,
    /// Operations whose outcome has been applied so far.
    pub completed: usize,
    /// Set when `status == Error`.
    pub error: Option<String>,
}

impl SyncStatusEvent {
    /// Builds an `Idle` event.
    pub fn idle() -> Self {
        Self {
            status: SyncStatus::Idle,
            total: 0,
            completed: 0,
            error: None,
        }
    }

    /// Builds a `Syncing` progress event.
    pub fn syncing(total: usize, completed: usize) -> Self {
        Self {
            status: SyncStatus::Syncing,
            total,
            completed,
            error: None,
        }
    }

    /// Builds an `Error` event with the given message.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: SyncStatus::Error,
            total: 0,
            completed: 0,
            error: Some(message.into()),
        }
    }
}
