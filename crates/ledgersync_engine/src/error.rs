//! Error types for the sync engine.

use thiserror::Error;

/// Result type for engine-level operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors the engine itself can raise, distinct from the per-operation
/// outcomes carried on [`crate::SyncResult`].
///
/// No-adapter and resolver-error conditions (distilled spec §7) are NOT
/// represented here: both are per-operation outcomes the engine records
/// directly on the offending `Operation` (`status = Failed`,
/// `error_message` set) rather than propagating out of `sync()`, so they
/// never need an `EngineError` variant of their own. Likewise,
/// `Operation::to_map`/`from_map` return `serde_json::Result` directly
/// (`ledgersync_model`) rather than an `EngineError`, since they are called
/// by storage backends outside this crate, not by the engine's own control
/// flow.
#[derive(Error, Debug)]
pub enum EngineError {
    /// `sync()` was called while a previous call was still draining the
    /// log.
    #[error("a sync is already in progress")]
    AlreadySyncing,

    /// A storage contract call failed. Propagates out of `sync()`.
    #[error("storage error: {0}")]
    Storage(#[from] ledgersync_storage::StorageError),
}

impl EngineError {
    /// Returns true if re-attempting the surrounding `sync()` call could
    /// plausibly succeed without operator intervention.
    ///
    /// This classifies the engine-level error itself, not the per-operation
    /// retry policy: `AlreadySyncing`, for instance, means a sync is
    /// already draining the log right now, not that the next attempt is
    /// doomed, but re-issuing it immediately is still pointless.
    pub fn is_retryable(&self) -> bool {
        matches!(self, EngineError::Storage(_))
    }
}
