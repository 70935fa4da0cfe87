//! The sync engine: drains pending operations against their adapters.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use ledgersync_model::{
    reduce_many, EntityState, OpKind, Operation, OperationStatus, Resolution, SyncStatusEvent,
};
use ledgersync_storage::{OperationLog, StorageBackend};
use parking_lot::RwLock;
use tokio::sync::broadcast;

use crate::adapter::{RemoteAdapter, SyncResult};
use crate::config::SyncConfig;
use crate::error::{EngineError, EngineResult};
use crate::resolver::ConflictResolver;

const LAST_SYNC_TIME_KEY: &str = "last_sync_time";
const STATUS_CHANNEL_CAPACITY: usize = 64;

fn now_millis() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

/// Whether a handled operation should be treated as resolved for this pass
/// (removed, requeued, or terminally failed-with-record) versus an
/// unrecovered failure that `stop_on_error` can act on.
enum Outcome {
    Recovered,
    NonRecovered,
}

/// Orchestrates pending-operation drainage: reduce, dispatch, apply
/// outcomes, emit progress.
///
/// At most one `sync()` call may be in flight at a time, enforced by a
/// compare-and-swap guard flag — the single-writer model the core
/// specifies. Concurrent logging of new operations (through a facade) is
/// fine while a sync runs; only overlapping `sync()` calls are rejected.
pub struct SyncEngine {
    storage: Arc<dyn StorageBackend>,
    log: OperationLog,
    adapters: RwLock<BTreeMap<String, Arc<dyn RemoteAdapter>>>,
    resolver: Option<Arc<dyn ConflictResolver>>,
    config: SyncConfig,
    is_syncing: AtomicBool,
    status_tx: broadcast::Sender<SyncStatusEvent>,
    last_status: RwLock<SyncStatusEvent>,
}

impl SyncEngine {
    /// Builds a new engine with no adapters registered and no resolver
    /// configured. Use [`SyncEngine::register_adapter`] and
    /// [`SyncEngine::with_resolver`] to wire it up.
    pub fn new(storage: Arc<dyn StorageBackend>, config: SyncConfig) -> Self {
        let (status_tx, _) = broadcast::channel(STATUS_CHANNEL_CAPACITY);
        let log = OperationLog::new(storage.clone());
        Self {
            storage,
            log,
            adapters: RwLock::new(BTreeMap::new()),
            resolver: None,
            config,
            is_syncing: AtomicBool::new(false),
            status_tx,
            last_status: RwLock::new(SyncStatusEvent::idle()),
        }
    }

    /// Sets the conflict resolver used for `Conflict` outcomes.
    pub fn with_resolver(mut self, resolver: Arc<dyn ConflictResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Registers (or replaces) the adapter for an entity type.
    pub fn register_adapter(&self, adapter: Arc<dyn RemoteAdapter>) {
        self.adapters
            .write()
            .insert(adapter.entity_type().to_string(), adapter);
    }

    /// Returns true while a `sync()` call is draining the log.
    pub fn is_syncing(&self) -> bool {
        self.is_syncing.load(Ordering::SeqCst)
    }

    /// Returns the most recently emitted status event.
    pub fn status(&self) -> SyncStatusEvent {
        self.last_status.read().clone()
    }

    /// Subscribes to the status stream. Events are only observed from the
    /// point of subscription onward; there is no replay of history.
    pub fn status_stream(&self) -> broadcast::Receiver<SyncStatusEvent> {
        self.status_tx.subscribe()
    }

    fn emit(&self, event: SyncStatusEvent) {
        *self.last_status.write() = event.clone();
        tracing::debug!(status = ?event.status, total = event.total, completed = event.completed, "status event");
        // Subscribers must not block the engine; a full channel drops the
        // oldest event rather than applying backpressure here.
        let _ = self.status_tx.send(event);
    }

    /// Drains pending operations against their adapters until none remain
    /// or `stop_on_error` aborts the pass.
    ///
    /// Returns `Err(EngineError::AlreadySyncing)` if a sync is already in
    /// progress; otherwise returns once the pass has reached `Idle` (or
    /// `Error`).
    pub async fn sync(&self) -> EngineResult<()> {
        if self
            .is_syncing
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(EngineError::AlreadySyncing);
        }

        let result = self.drain().await;
        self.is_syncing.store(false, Ordering::SeqCst);
        result
    }

    async fn drain(&self) -> EngineResult<()> {
        let pending = self.log.pending().await?;
        tracing::info!(count = pending.len(), "loaded pending operations");

        let survivors = if self.config.reduce_before_dispatch {
            self.reduce_pending(pending).await?
        } else {
            pending
        };

        let total = survivors.len();
        self.emit(SyncStatusEvent::syncing(total, 0));

        let mut completed = 0usize;
        for op in survivors {
            let outcome = self.sync_one(op).await;
            completed += 1;

            match outcome {
                Ok(Outcome::Recovered) => {
                    self.emit(SyncStatusEvent::syncing(total, completed));
                }
                Ok(Outcome::NonRecovered) => {
                    self.emit(SyncStatusEvent::syncing(total, completed));
                    if self.config.stop_on_error {
                        self.emit(SyncStatusEvent::error("Sync stopped due to error"));
                        return Ok(());
                    }
                }
                Err(err) => {
                    self.emit(SyncStatusEvent::error(err.to_string()));
                    return Err(err);
                }
            }
        }

        self.storage
            .save_metadata(LAST_SYNC_TIME_KEY, &now_millis().to_string())
            .await?;

        self.emit(SyncStatusEvent::idle());
        Ok(())
    }

    /// Groups pending operations by entity, reduces each group, and
    /// applies the result to the log: empty groups are removed outright;
    /// non-empty groups are squashed via an atomic transaction covering the
    /// removal and the first reduced operation, with any further survivors
    /// appended non-atomically (the transactional guarantee does not
    /// currently extend past the first replacement — see DESIGN.md).
    async fn reduce_pending(&self, pending: Vec<Operation>) -> EngineResult<Vec<Operation>> {
        let mut groups: BTreeMap<(String, String), Vec<Operation>> = BTreeMap::new();
        for op in pending {
            groups
                .entry((op.entity_type.clone(), op.entity_id.clone()))
                .or_default()
                .push(op);
        }

        let mut survivors = Vec::new();
        for (_, group) in groups {
            let original_ids: Vec<String> = group.iter().map(|op| op.operation_id.clone()).collect();
            let reduced = reduce_many(group);

            if reduced.is_empty() {
                self.log.remove_many(&original_ids).await?;
                continue;
            }

            let mut reduced = reduced.into_iter();
            let first = reduced.next().expect("non-empty checked above");
            let replaces_first_in_place = original_ids.len() == 1 && original_ids[0] == first.operation_id;

            if !replaces_first_in_place {
                let applied = self.log.squash(original_ids, first.clone()).await?;
                if !applied {
                    // The transaction rolled back (an id collision outside
                    // this group, most plausibly): the log still holds the
                    // unreduced originals untouched. Leave them pending
                    // rather than dispatching `first` as if it had been
                    // persisted; they'll be reduced and dispatched on a
                    // later sync() pass.
                    tracing::warn!(
                        entity_type = %first.entity_type,
                        entity_id = %first.entity_id,
                        "squash rolled back, skipping this entity's reduced survivor this pass"
                    );
                    continue;
                }
            } else {
                self.log.update(first.clone()).await?;
            }

            survivors.push(first);
            for extra in reduced {
                self.log.append(extra.clone()).await?;
                survivors.push(extra);
            }
        }

        survivors.sort_by_key(|op| op.timestamp);
        Ok(survivors)
    }

    /// Dispatches one operation to its adapter and applies the outcome.
    async fn sync_one(&self, mut op: Operation) -> EngineResult<Outcome> {
        let adapter = self.adapters.read().get(&op.entity_type).cloned();

        let Some(adapter) = adapter else {
            tracing::warn!(entity_type = %op.entity_type, "no adapter registered");
            op.status = OperationStatus::Failed;
            op.error_message = Some(format!("no adapter for entity type {:?}", op.entity_type));
            self.log.update(op).await?;
            return Ok(Outcome::NonRecovered);
        };

        op.status = OperationStatus::Syncing;
        self.log.update(op.clone()).await?;

        let result = match &op.op_kind {
            OpKind::Create => adapter.create(&op).await,
            OpKind::Update => adapter.update(&op).await,
            OpKind::Delete => adapter.delete(&op).await,
            OpKind::Custom(_) => adapter.custom(&op).await,
        };

        match result {
            SyncResult::Success {
                resolved_payload, ..
            } => {
                self.log.remove(&op.operation_id).await?;
                if let Some(payload) = resolved_payload {
                    self.storage
                        .save_entity(&op.entity_type, &op.entity_id, payload)
                        .await?;
                }
                tracing::debug!(operation_id = %op.operation_id, "sync_one succeeded");
                Ok(Outcome::Recovered)
            }
            SyncResult::Conflict { conflict_data } => self.resolve_conflict(op, conflict_data).await,
            SyncResult::Failure { message, retryable } => {
                self.handle_failure(op, message, retryable).await
            }
        }
    }

    async fn handle_failure(
        &self,
        mut op: Operation,
        message: String,
        retryable: bool,
    ) -> EngineResult<Outcome> {
        if retryable && op.retry_count < self.config.max_retries {
            tracing::warn!(operation_id = %op.operation_id, %message, "retryable failure, requeueing");
            op.status = OperationStatus::Pending;
            op.retry_count += 1;
            op.error_message = Some(message);
            self.log.update(op).await?;
            Ok(Outcome::Recovered)
        } else {
            tracing::warn!(operation_id = %op.operation_id, %message, "terminal failure");
            op.status = OperationStatus::Failed;
            op.error_message = Some(message);
            self.log.update(op).await?;
            Ok(Outcome::NonRecovered)
        }
    }

    async fn resolve_conflict(&self, mut op: Operation, conflict_data: ledgersync_model::Payload) -> EngineResult<Outcome> {
        let local_snapshot = self
            .storage
            .get_entity(&op.entity_type, &op.entity_id)
            .await?;

        let Some(local_snapshot) = local_snapshot else {
            // Local has forgotten the entity: the conflict is moot.
            self.log.remove(&op.operation_id).await?;
            return Ok(Outcome::Recovered);
        };

        let Some(resolver) = &self.resolver else {
            tracing::warn!(operation_id = %op.operation_id, "conflict without resolver configured");
            op.status = OperationStatus::Failed;
            op.error_message = Some("conflict without resolver".to_string());
            self.log.update(op).await?;
            return Ok(Outcome::NonRecovered);
        };

        let local_state = EntityState::new(local_snapshot, op.timestamp);
        let remote_state = EntityState::new(conflict_data, now_millis());
        let pending_for_entity = self.log.for_entity(&op.entity_type, &op.entity_id).await?;

        match resolver.resolve(&local_state, &remote_state, &pending_for_entity).await {
            Ok(Resolution::UseLocal) => {
                op.status = OperationStatus::Pending;
                op.retry_count += 1;
                self.log.update(op).await?;
                Ok(Outcome::Recovered)
            }
            Ok(Resolution::UseRemote(data)) => {
                self.storage
                    .save_entity(&op.entity_type, &op.entity_id, data)
                    .await?;
                self.log.remove(&op.operation_id).await?;
                Ok(Outcome::Recovered)
            }
            Ok(Resolution::Merge(data)) => {
                self.storage
                    .save_entity(&op.entity_type, &op.entity_id, data.clone())
                    .await?;
                op.payload = data;
                op.status = OperationStatus::Pending;
                self.log.update(op).await?;
                Ok(Outcome::Recovered)
            }
            Ok(Resolution::Manual) => {
                op.status = OperationStatus::Failed;
                op.error_message = Some("manual conflict resolution required".to_string());
                self.log.update(op).await?;
                Ok(Outcome::NonRecovered)
            }
            Err(message) => {
                tracing::warn!(operation_id = %op.operation_id, %message, "resolver failed");
                op.status = OperationStatus::Failed;
                op.error_message = Some(message);
                self.log.update(op).await?;
                Ok(Outcome::NonRecovered)
            }
        }
    }
}
