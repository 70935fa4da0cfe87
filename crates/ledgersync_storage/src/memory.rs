//! In-memory reference implementation of the storage contract.

use std::collections::HashMap;

use async_trait::async_trait;
use ledgersync_model::{Operation, OperationStatus, Payload};
use parking_lot::RwLock;

use crate::contract::{StorageBackend, TransactionOp};
use crate::error::{StorageError, StorageResult};

#[derive(Default)]
struct Inner {
    entities: HashMap<(String, String), Payload>,
    operations: HashMap<String, Operation>,
    metadata: HashMap<String, String>,
}

/// The substrate for testing: an in-memory implementation of
/// [`StorageBackend`] satisfying the contract verbatim.
///
/// `get_pending_operations` treats any operation left in `Syncing` state as
/// pending, so a crashed process's in-flight operations are recovered on
/// the next load without a separate startup migration.
#[derive(Default)]
pub struct InMemoryStorage {
    inner: RwLock<Inner>,
}

impl InMemoryStorage {
    /// Creates a new, empty in-memory backend.
    pub fn new() -> Self {
        Self::default()
    }

    fn key(entity_type: &str, entity_id: &str) -> (String, String) {
        (entity_type.to_string(), entity_id.to_string())
    }

    fn sorted_pending(inner: &Inner) -> Vec<Operation> {
        let mut ops: Vec<Operation> = inner
            .operations
            .values()
            .filter(|op| matches!(op.status, OperationStatus::Pending | OperationStatus::Syncing))
            .cloned()
            .collect();
        ops.sort_by_key(|op| op.timestamp);
        ops
    }
}

#[async_trait]
impl StorageBackend for InMemoryStorage {
    async fn initialize(&self) -> StorageResult<()> {
        Ok(())
    }

    async fn close(&self) -> StorageResult<()> {
        Ok(())
    }

    async fn save_entity(
        &self,
        entity_type: &str,
        entity_id: &str,
        data: Payload,
    ) -> StorageResult<()> {
        self.inner
            .write()
            .entities
            .insert(Self::key(entity_type, entity_id), data);
        Ok(())
    }

    async fn get_entity(&self, entity_type: &str, entity_id: &str) -> StorageResult<Option<Payload>> {
        Ok(self
            .inner
            .read()
            .entities
            .get(&Self::key(entity_type, entity_id))
            .cloned())
    }

    async fn get_all_entities(&self, entity_type: &str) -> StorageResult<Vec<Payload>> {
        Ok(self
            .inner
            .read()
            .entities
            .iter()
            .filter(|((t, _), _)| t == entity_type)
            .map(|(_, data)| data.clone())
            .collect())
    }

    async fn delete_entity(&self, entity_type: &str, entity_id: &str) -> StorageResult<()> {
        self.inner
            .write()
            .entities
            .remove(&Self::key(entity_type, entity_id));
        Ok(())
    }

    async fn entity_exists(&self, entity_type: &str, entity_id: &str) -> StorageResult<bool> {
        Ok(self
            .inner
            .read()
            .entities
            .contains_key(&Self::key(entity_type, entity_id)))
    }

    async fn add_operation(&self, op: Operation) -> StorageResult<()> {
        let mut inner = self.inner.write();
        if inner.operations.contains_key(&op.operation_id) {
            return Err(StorageError::DuplicateOperation(op.operation_id));
        }
        inner.operations.insert(op.operation_id.clone(), op);
        Ok(())
    }

    async fn update_operation(&self, op: Operation) -> StorageResult<()> {
        let mut inner = self.inner.write();
        if !inner.operations.contains_key(&op.operation_id) {
            return Err(StorageError::OperationNotFound(op.operation_id));
        }
        inner.operations.insert(op.operation_id.clone(), op);
        Ok(())
    }

    async fn get_operation(&self, operation_id: &str) -> StorageResult<Option<Operation>> {
        Ok(self.inner.read().operations.get(operation_id).cloned())
    }

    async fn get_operations_for_entity(
        &self,
        entity_type: &str,
        entity_id: &str,
    ) -> StorageResult<Vec<Operation>> {
        let inner = self.inner.read();
        let mut ops: Vec<Operation> = inner
            .operations
            .values()
            .filter(|op| op.entity_type == entity_type && op.entity_id == entity_id)
            .cloned()
            .collect();
        ops.sort_by_key(|op| op.timestamp);
        Ok(ops)
    }

    async fn get_pending_operations(&self) -> StorageResult<Vec<Operation>> {
        Ok(Self::sorted_pending(&self.inner.read()))
    }

    async fn delete_operation(&self, operation_id: &str) -> StorageResult<()> {
        self.inner.write().operations.remove(operation_id);
        Ok(())
    }

    async fn delete_operations(&self, operation_ids: &[String]) -> StorageResult<()> {
        let mut inner = self.inner.write();
        for id in operation_ids {
            inner.operations.remove(id);
        }
        Ok(())
    }

    async fn get_pending_operations_count(&self) -> StorageResult<usize> {
        Ok(Self::sorted_pending(&self.inner.read()).len())
    }

    async fn save_metadata(&self, key: &str, value: &str) -> StorageResult<()> {
        self.inner
            .write()
            .metadata
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn get_metadata(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.inner.read().metadata.get(key).cloned())
    }

    async fn clear_metadata(&self) -> StorageResult<()> {
        self.inner.write().metadata.clear();
        Ok(())
    }

    async fn execute_transaction(&self, steps: Vec<TransactionOp>) -> StorageResult<bool> {
        let mut inner = self.inner.write();

        // Validate every precondition against a staged copy before
        // mutating the real maps, so a failure rolls back cleanly.
        let mut staged_operations = inner.operations.clone();
        for step in &steps {
            match step {
                TransactionOp::AddOperation(op) => {
                    if staged_operations.contains_key(&op.operation_id) {
                        return Ok(false);
                    }
                    staged_operations.insert(op.operation_id.clone(), op.clone());
                }
                TransactionOp::UpdateOperation(op) => {
                    if !staged_operations.contains_key(&op.operation_id) {
                        return Ok(false);
                    }
                    staged_operations.insert(op.operation_id.clone(), op.clone());
                }
                TransactionOp::RemoveOperations(ids) => {
                    for id in ids {
                        staged_operations.remove(id);
                    }
                }
                TransactionOp::SaveEntity { .. } | TransactionOp::DeleteEntity { .. } => {}
            }
        }

        let mut staged_entities = inner.entities.clone();
        for step in &steps {
            match step {
                TransactionOp::SaveEntity {
                    entity_type,
                    entity_id,
                    data,
                } => {
                    staged_entities.insert(Self::key(entity_type, entity_id), data.clone());
                }
                TransactionOp::DeleteEntity {
                    entity_type,
                    entity_id,
                } => {
                    staged_entities.remove(&Self::key(entity_type, entity_id));
                }
                TransactionOp::AddOperation(_)
                | TransactionOp::UpdateOperation(_)
                | TransactionOp::RemoveOperations(_) => {}
            }
        }

        inner.operations = staged_operations;
        inner.entities = staged_entities;
        Ok(true)
    }

    async fn clear_all(&self) -> StorageResult<()> {
        let mut inner = self.inner.write();
        inner.entities.clear();
        inner.operations.clear();
        inner.metadata.clear();
        Ok(())
    }
}
