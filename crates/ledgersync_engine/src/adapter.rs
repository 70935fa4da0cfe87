//! The remote adapter contract: one implementation per `entity_type`.

use async_trait::async_trait;
use ledgersync_model::{Operation, Payload};

/// The outcome of dispatching one operation to a remote adapter.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncResult {
    /// The server accepted the operation.
    Success {
        /// Server-assigned identifier, if the server mints its own ids.
        server_id: Option<String>,
        /// Server-side logical timestamp for this write.
        server_timestamp: Option<i64>,
        /// Authoritative entity snapshot to overwrite local storage with.
        ///
        /// Treated opaquely: the engine does not merge this with prior
        /// local state, it overwrites. This is how server-managed fields
        /// (version counters, generated ids) flow back into the local
        /// record.
        resolved_payload: Option<Payload>,
    },
    /// The server rejected the operation.
    Failure {
        /// Human-readable failure reason.
        message: String,
        /// Whether retrying the same operation could succeed.
        retryable: bool,
    },
    /// The server detected a conflicting remote version.
    Conflict {
        /// The server's current snapshot of the entity.
        conflict_data: Payload,
    },
}

impl SyncResult {
    /// Builds a bare success with no server-assigned fields.
    pub fn success() -> Self {
        SyncResult::Success {
            server_id: None,
            server_timestamp: None,
            resolved_payload: None,
        }
    }

    /// Builds a success carrying an authoritative payload to write back to
    /// local storage.
    pub fn success_with_payload(resolved_payload: Payload) -> Self {
        SyncResult::Success {
            server_id: None,
            server_timestamp: None,
            resolved_payload: Some(resolved_payload),
        }
    }

    /// Builds a retryable failure.
    pub fn retryable_failure(message: impl Into<String>) -> Self {
        SyncResult::Failure {
            message: message.into(),
            retryable: true,
        }
    }

    /// Builds a terminal failure.
    pub fn fatal_failure(message: impl Into<String>) -> Self {
        SyncResult::Failure {
            message: message.into(),
            retryable: false,
        }
    }
}

/// One per `entity_type`: converts an operation into a server exchange and
/// reports the outcome.
///
/// Every method MUST be idempotent against `op.operation_id` — the engine
/// assumes that re-dispatching an already-processed operation (after a
/// crash between dispatch and recorded outcome) returns `Success` rather
/// than creating a duplicate on the server.
#[async_trait]
pub trait RemoteAdapter: Send + Sync {
    /// The `entity_type` this adapter handles; must match the registry key
    /// it is registered under.
    fn entity_type(&self) -> &str;

    /// Handles an `OpKind::Create` operation.
    async fn create(&self, op: &Operation) -> SyncResult;

    /// Handles an `OpKind::Update` operation.
    async fn update(&self, op: &Operation) -> SyncResult;

    /// Handles an `OpKind::Delete` operation.
    async fn delete(&self, op: &Operation) -> SyncResult;

    /// Handles an `OpKind::Custom(name)` operation.
    ///
    /// The default implementation fails for every custom name; adapters
    /// that support custom operations must override this.
    async fn custom(&self, op: &Operation) -> SyncResult {
        let name = op.op_kind.custom_name().unwrap_or("<unknown>");
        SyncResult::fatal_failure(format!("custom operation {name:?} unimplemented"))
    }

    /// Out-of-band fetch of the remote's current snapshot of an entity, for
    /// conflict resolution flows that want a fresh read rather than the
    /// `conflict_data` embedded in a `Conflict` result. Not used by the
    /// default engine path.
    async fn fetch_remote_state(&self, _entity_id: &str) -> Option<Payload> {
        None
    }

    /// Dispatches a batch of operations. The default loops serial calls to
    /// `create`/`update`/`delete`/`custom` based on each operation's kind;
    /// adapters that can batch on the wire should override this.
    async fn sync_batch(&self, ops: &[Operation]) -> Vec<SyncResult> {
        let mut results = Vec::with_capacity(ops.len());
        for op in ops {
            let result = match &op.op_kind {
                ledgersync_model::OpKind::Create => self.create(op).await,
                ledgersync_model::OpKind::Update => self.update(op).await,
                ledgersync_model::OpKind::Delete => self.delete(op).await,
                ledgersync_model::OpKind::Custom(_) => self.custom(op).await,
            };
            results.push(result);
        }
        results
    }
}
