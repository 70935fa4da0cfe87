//! The operation log: a thin, contract-level wrapper around a
//! [`StorageBackend`] providing operation-level vocabulary to the engine.

use std::sync::Arc;

use ledgersync_model::Operation;

use crate::contract::{StorageBackend, TransactionOp};
use crate::error::StorageResult;

/// Centralizes operation-log vocabulary and transactional grouping over a
/// storage backend.
///
/// `OperationLog` itself is stateless: every call forwards to the
/// underlying [`StorageBackend`]. It exists so callers (the sync engine,
/// the facade) speak in terms of "append", "pending", "squash" rather than
/// reaching into storage's broader entity/metadata surface directly.
#[derive(Clone)]
pub struct OperationLog {
    storage: Arc<dyn StorageBackend>,
}

impl OperationLog {
    /// Wraps a storage backend with the operation-log vocabulary.
    pub fn new(storage: Arc<dyn StorageBackend>) -> Self {
        Self { storage }
    }

    /// Adds an operation. Fails if `operation_id` already present.
    pub async fn append(&self, op: Operation) -> StorageResult<()> {
        self.storage.add_operation(op).await
    }

    /// Returns pending operations in non-decreasing `timestamp` order.
    pub async fn pending(&self) -> StorageResult<Vec<Operation>> {
        self.storage.get_pending_operations().await
    }

    /// Returns the number of pending operations.
    pub async fn pending_count(&self) -> StorageResult<usize> {
        self.storage.get_pending_operations_count().await
    }

    /// Returns every operation for an entity, ordered by timestamp.
    pub async fn for_entity(&self, entity_type: &str, entity_id: &str) -> StorageResult<Vec<Operation>> {
        self.storage.get_operations_for_entity(entity_type, entity_id).await
    }

    /// Replaces the operation with the same `operation_id`. Fails if
    /// absent.
    pub async fn update(&self, op: Operation) -> StorageResult<()> {
        self.storage.update_operation(op).await
    }

    /// Removes an operation by id. Idempotent.
    pub async fn remove(&self, operation_id: &str) -> StorageResult<()> {
        self.storage.delete_operation(operation_id).await
    }

    /// Removes operations by id. Idempotent.
    pub async fn remove_many(&self, operation_ids: &[String]) -> StorageResult<()> {
        self.storage.delete_operations(operation_ids).await
    }

    /// Atomically removes `remove_set` and inserts `replacement`, via the
    /// storage contract's transactional batch.
    ///
    /// Returns `Ok(false)` if the batch rolled back (e.g. `replacement`'s
    /// id collides with a survivor outside `remove_set`); the log is left
    /// unchanged in that case.
    pub async fn squash(&self, remove_set: Vec<String>, replacement: Operation) -> StorageResult<bool> {
        self.storage
            .execute_transaction(vec![
                TransactionOp::RemoveOperations(remove_set),
                TransactionOp::AddOperation(replacement),
            ])
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryStorage;
    use ledgersync_model::{OpKind, OperationStatus};
    use serde_json::json;

    fn op(id: &str, ts: i64) -> Operation {
        Operation {
            operation_id: id.into(),
            entity_type: "product".into(),
            entity_id: "p1".into(),
            op_kind: OpKind::Create,
            payload: vec![("name".to_string(), json!("A"))].into_iter().collect(),
            timestamp: ts,
            status: OperationStatus::Pending,
            device_id: "d1".into(),
            retry_count: 0,
            error_message: None,
        }
    }

    fn log() -> OperationLog {
        OperationLog::new(Arc::new(InMemoryStorage::new()))
    }

    #[tokio::test]
    async fn append_then_pending_round_trip() {
        let log = log();
        log.append(op("op1", 1000)).await.unwrap();
        log.append(op("op2", 2000)).await.unwrap();

        assert_eq!(log.pending_count().await.unwrap(), 2);
        let pending = log.pending().await.unwrap();
        assert_eq!(pending[0].operation_id, "op1");
        assert_eq!(pending[1].operation_id, "op2");
    }

    #[tokio::test]
    async fn squash_is_atomic() {
        let log = log();
        log.append(op("op1", 1000)).await.unwrap();
        log.append(op("op2", 2000)).await.unwrap();

        let applied = log.squash(vec!["op1".into(), "op2".into()], op("op3", 2000)).await.unwrap();
        assert!(applied);
        assert_eq!(log.pending_count().await.unwrap(), 1);
        assert!(log.for_entity("product", "p1").await.unwrap()[0].operation_id == "op3");
    }

    #[tokio::test]
    async fn remove_many_is_idempotent() {
        let log = log();
        log.append(op("op1", 1000)).await.unwrap();
        log.remove_many(&["op1".to_string(), "missing".to_string()]).await.unwrap();
        log.remove_many(&["op1".to_string()]).await.unwrap();
        assert_eq!(log.pending_count().await.unwrap(), 0);
    }
}
