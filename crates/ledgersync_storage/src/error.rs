//! Error types for storage operations.

use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors a [`crate::StorageBackend`] implementation may report.
///
/// Absence (an unknown entity or operation id) is modeled with `Option`,
/// not an error variant; only genuine failures land here.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backing store rejected the operation (disk full, connection
    /// lost, serialization failure, etc).
    #[error("backend error: {0}")]
    Backend(String),

    /// `add_operation` was called with an `operation_id` already present.
    #[error("operation {0} already exists")]
    DuplicateOperation(String),

    /// `update_operation` was called with an `operation_id` not present.
    #[error("operation {0} not found")]
    OperationNotFound(String),

    /// `execute_transaction` rolled back; the closure's error is wrapped
    /// here.
    #[error("transaction rolled back: {0}")]
    TransactionFailed(String),
}
