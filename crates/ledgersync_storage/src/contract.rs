//! The storage contract consumed by the operation log and the sync engine.

use async_trait::async_trait;
use ledgersync_model::{Operation, Payload};

use crate::error::StorageResult;

/// One step of an atomic batch passed to [`StorageBackend::execute_transaction`].
///
/// The only caller within this crate is the reducer's squash path, which
/// needs to remove a group of superseded operations and insert their
/// replacement as a single atomic unit.
#[derive(Debug, Clone)]
pub enum TransactionOp {
    /// Insert a new operation. Fails the transaction if its id already
    /// exists.
    AddOperation(Operation),
    /// Replace an operation with the same `operation_id`.
    UpdateOperation(Operation),
    /// Remove operations by id; absent ids are not an error.
    RemoveOperations(Vec<String>),
    /// Overwrite-or-insert an entity snapshot.
    SaveEntity {
        /// Entity namespace.
        entity_type: String,
        /// Entity identifier.
        entity_id: String,
        /// New snapshot.
        data: Payload,
    },
    /// Remove an entity snapshot; absent is not an error.
    DeleteEntity {
        /// Entity namespace.
        entity_type: String,
        /// Entity identifier.
        entity_id: String,
    },
}

/// The storage contract the core consumes.
///
/// Implementations persist three logical namespaces: entities keyed by
/// `(entity_type, entity_id)`, operations keyed by `operation_id`, and
/// free-form string metadata. The only metadata key the core itself writes
/// is `last_sync_time`.
///
/// # Invariants
///
/// - `get_pending_operations` returns operations in non-decreasing
///   `timestamp` order; ties keep insertion order.
/// - `execute_transaction` either applies every step or none of them.
/// - All methods must tolerate concurrent calls: mutations are serialized
///   by the implementation so that the engine and concurrent facade writers
///   observe linearizable single-operation semantics.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Prepares the backend for use (opens files, runs migrations, etc).
    async fn initialize(&self) -> StorageResult<()>;

    /// Releases all resources held by the backend.
    async fn close(&self) -> StorageResult<()>;

    /// Overwrites or inserts an entity snapshot.
    async fn save_entity(
        &self,
        entity_type: &str,
        entity_id: &str,
        data: Payload,
    ) -> StorageResult<()>;

    /// Returns the entity snapshot, or `None` if unknown.
    async fn get_entity(&self, entity_type: &str, entity_id: &str) -> StorageResult<Option<Payload>>;

    /// Returns every entity snapshot for a namespace, in unspecified order.
    async fn get_all_entities(&self, entity_type: &str) -> StorageResult<Vec<Payload>>;

    /// Removes an entity snapshot. Idempotent.
    async fn delete_entity(&self, entity_type: &str, entity_id: &str) -> StorageResult<()>;

    /// Returns whether an entity snapshot exists.
    async fn entity_exists(&self, entity_type: &str, entity_id: &str) -> StorageResult<bool>;

    /// Inserts a new operation. Fails if `operation_id` already exists.
    async fn add_operation(&self, op: Operation) -> StorageResult<()>;

    /// Replaces the operation with the same `operation_id`. Fails if
    /// absent.
    async fn update_operation(&self, op: Operation) -> StorageResult<()>;

    /// Returns the operation with the given id, if present.
    async fn get_operation(&self, operation_id: &str) -> StorageResult<Option<Operation>>;

    /// Returns every operation for an entity, ordered by timestamp.
    async fn get_operations_for_entity(
        &self,
        entity_type: &str,
        entity_id: &str,
    ) -> StorageResult<Vec<Operation>>;

    /// Returns all pending operations, ordered by timestamp.
    ///
    /// A `Syncing` operation left behind by a crashed process is treated as
    /// `Pending` for the purposes of this query (see the crash-recovery
    /// rule in the crate's module documentation).
    async fn get_pending_operations(&self) -> StorageResult<Vec<Operation>>;

    /// Removes an operation by id. Idempotent.
    async fn delete_operation(&self, operation_id: &str) -> StorageResult<()>;

    /// Removes operations by id. Idempotent.
    async fn delete_operations(&self, operation_ids: &[String]) -> StorageResult<()>;

    /// Returns the number of pending operations.
    async fn get_pending_operations_count(&self) -> StorageResult<usize>;

    /// Sets a metadata value.
    async fn save_metadata(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Reads a metadata value, if present.
    async fn get_metadata(&self, key: &str) -> StorageResult<Option<String>>;

    /// Removes all metadata.
    async fn clear_metadata(&self) -> StorageResult<()>;

    /// Applies a batch of steps atomically: either every step lands, or
    /// (on any step's precondition failing) the whole batch is rolled back
    /// and `Ok(false)` is returned. Only a backend-level failure becomes
    /// `Err`.
    async fn execute_transaction(&self, steps: Vec<TransactionOp>) -> StorageResult<bool>;

    /// Erases entities, operations, and metadata.
    async fn clear_all(&self) -> StorageResult<()>;
}
