//! Thin application-facing entry point over the log and the engine.

use std::sync::Arc;

use ledgersync_model::{OpKind, Operation, Payload};
use ledgersync_storage::{OperationLog, StorageBackend};

use crate::engine::SyncEngine;
use crate::error::EngineResult;

fn now_millis() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

/// Generates a fresh globally-unique operation id.
///
/// Operation ids are opaque to the core; a UUIDv4 is the obvious portable
/// choice and is what every example adapter in this workspace expects as
/// an idempotency key.
fn new_operation_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// The application-facing entry point: logs operations (hybrid mode) or
/// owns entity storage outright (source-of-truth mode), and exposes
/// `sync()` from the underlying engine.
///
/// Every operation this facade logs gets a freshly generated
/// `operation_id`, the current wall-clock time as `timestamp`, the
/// configured `device_id`, and `status = Pending`.
pub struct Facade {
    storage: Arc<dyn StorageBackend>,
    log: OperationLog,
    engine: Arc<SyncEngine>,
    device_id: String,
}

impl Facade {
    /// Builds a facade over the given storage and engine.
    pub fn new(storage: Arc<dyn StorageBackend>, engine: Arc<SyncEngine>, device_id: impl Into<String>) -> Self {
        let log = OperationLog::new(storage.clone());
        Self {
            storage,
            log,
            engine,
            device_id: device_id.into(),
        }
    }

    /// Drains pending operations. Delegates directly to the engine.
    pub async fn sync(&self) -> EngineResult<()> {
        self.engine.sync().await
    }

    async fn append(&self, entity_type: &str, entity_id: &str, op_kind: OpKind, payload: Payload) -> EngineResult<Operation> {
        let op = Operation::new(
            new_operation_id(),
            entity_type,
            entity_id,
            op_kind,
            payload,
            now_millis(),
            self.device_id.clone(),
        );
        self.log.append(op.clone()).await?;
        Ok(op)
    }

    // --- Hybrid mode: the application owns entity storage. ---

    /// Logs a `Create` intent. The caller is expected to have already
    /// written the entity to its own storage.
    pub async fn log_create(&self, entity_type: &str, entity_id: &str, payload: Payload) -> EngineResult<Operation> {
        self.append(entity_type, entity_id, OpKind::Create, payload).await
    }

    /// Logs an `Update` intent.
    pub async fn log_update(&self, entity_type: &str, entity_id: &str, payload: Payload) -> EngineResult<Operation> {
        self.append(entity_type, entity_id, OpKind::Update, payload).await
    }

    /// Logs a `Delete` intent. `{}` is a valid payload.
    pub async fn log_delete(&self, entity_type: &str, entity_id: &str) -> EngineResult<Operation> {
        self.append(entity_type, entity_id, OpKind::Delete, Payload::new()).await
    }

    /// Logs a `Custom(name)` intent.
    pub async fn log_custom(
        &self,
        entity_type: &str,
        entity_id: &str,
        name: impl Into<String>,
        payload: Payload,
    ) -> EngineResult<Operation> {
        self.append(entity_type, entity_id, OpKind::Custom(name.into()), payload).await
    }

    // --- Source-of-truth mode: the facade owns entity storage too. ---

    /// Writes `data` to entity storage and logs the corresponding
    /// operation. `is_new` picks `Create` vs `Update` when given; otherwise
    /// the facade asks storage whether the entity already exists.
    pub async fn save(
        &self,
        entity_type: &str,
        entity_id: &str,
        data: Payload,
        is_new: Option<bool>,
    ) -> EngineResult<Operation> {
        let is_create = match is_new {
            Some(flag) => flag,
            None => !self.storage.entity_exists(entity_type, entity_id).await?,
        };

        self.storage.save_entity(entity_type, entity_id, data.clone()).await?;

        let op_kind = if is_create { OpKind::Create } else { OpKind::Update };
        self.append(entity_type, entity_id, op_kind, data).await
    }

    /// Deletes the entity from storage and logs a `Delete` operation.
    pub async fn delete(&self, entity_type: &str, entity_id: &str) -> EngineResult<Operation> {
        self.storage.delete_entity(entity_type, entity_id).await?;
        self.append(entity_type, entity_id, OpKind::Delete, Payload::new()).await
    }
}
