//! A programmable [`RemoteAdapter`] for exercising the sync engine without
//! a real transport.

use std::collections::VecDeque;

use async_trait::async_trait;
use ledgersync_engine::{RemoteAdapter, SyncResult};
use ledgersync_model::Operation;
use parking_lot::Mutex;

/// One call the engine made against a [`MockRemoteAdapter`], recorded for
/// test assertions.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    /// The operation the engine dispatched.
    pub operation: Operation,
    /// The result the mock returned for it.
    pub result: SyncResult,
}

/// A [`RemoteAdapter`] driven entirely by canned responses queued ahead of
/// time, one queue per op-kind (`create`/`update`/`delete`/`custom`).
///
/// When a queue is empty, the adapter falls back to a configurable default
/// (success with no resolved payload, unless [`MockRemoteAdapter::disconnected`]
/// is set, in which case every call returns a retryable failure regardless
/// of queued responses — modelling a transport that has lost its
/// connection, the way EntiDB's own `MockTransport` models a `connected`
/// flag).
pub struct MockRemoteAdapter {
    entity_type: String,
    connected: std::sync::atomic::AtomicBool,
    held: std::sync::atomic::AtomicBool,
    gate: tokio::sync::Notify,
    create_queue: Mutex<VecDeque<SyncResult>>,
    update_queue: Mutex<VecDeque<SyncResult>>,
    delete_queue: Mutex<VecDeque<SyncResult>>,
    custom_queue: Mutex<VecDeque<SyncResult>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockRemoteAdapter {
    /// Builds a connected adapter for `entity_type` with no queued
    /// responses; unqueued calls succeed with no resolved payload.
    pub fn new(entity_type: impl Into<String>) -> Self {
        Self {
            entity_type: entity_type.into(),
            connected: std::sync::atomic::AtomicBool::new(true),
            held: std::sync::atomic::AtomicBool::new(false),
            gate: tokio::sync::Notify::new(),
            create_queue: Mutex::new(VecDeque::new()),
            update_queue: Mutex::new(VecDeque::new()),
            delete_queue: Mutex::new(VecDeque::new()),
            custom_queue: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Queues a response for the next `create` call.
    pub fn queue_create(&self, result: SyncResult) {
        self.create_queue.lock().push_back(result);
    }

    /// Queues a response for the next `update` call.
    pub fn queue_update(&self, result: SyncResult) {
        self.update_queue.lock().push_back(result);
    }

    /// Queues a response for the next `delete` call.
    pub fn queue_delete(&self, result: SyncResult) {
        self.delete_queue.lock().push_back(result);
    }

    /// Queues a response for the next `custom` call.
    pub fn queue_custom(&self, result: SyncResult) {
        self.custom_queue.lock().push_back(result);
    }

    /// Queues the same response to be returned repeatedly for every
    /// `create` call, useful for "every attempt fails the same way" tests
    /// (distilled spec S5).
    pub fn always_create(&self, result: SyncResult, times: usize) {
        for _ in 0..times {
            self.queue_create(result.clone());
        }
    }

    /// Marks the adapter disconnected: every call returns a retryable
    /// failure regardless of queued responses, until reconnected.
    pub fn disconnect(&self) {
        self.connected.store(false, std::sync::atomic::Ordering::SeqCst);
    }

    /// Marks the adapter connected again.
    pub fn reconnect(&self) {
        self.connected.store(true, std::sync::atomic::Ordering::SeqCst);
    }

    /// Makes every subsequent call suspend until [`MockRemoteAdapter::release`]
    /// is called, for tests that need to observe the engine mid-dispatch
    /// (e.g. asserting `is_syncing()` from a concurrent `sync()` call).
    pub fn hold(&self) {
        self.held.store(true, std::sync::atomic::Ordering::SeqCst);
    }

    /// Releases every call currently suspended by [`MockRemoteAdapter::hold`]
    /// and stops holding future ones.
    pub fn release(&self) {
        self.held.store(false, std::sync::atomic::Ordering::SeqCst);
        self.gate.notify_waiters();
    }

    async fn wait_if_held(&self) {
        if self.held.load(std::sync::atomic::Ordering::SeqCst) {
            self.gate.notified().await;
        }
    }

    /// Returns every call recorded so far, in dispatch order.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    /// Returns the number of calls recorded so far.
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    fn record(&self, operation: &Operation, result: SyncResult) -> SyncResult {
        self.calls.lock().push(RecordedCall {
            operation: operation.clone(),
            result: result.clone(),
        });
        result
    }

    fn next_or_default(queue: &Mutex<VecDeque<SyncResult>>) -> SyncResult {
        queue.lock().pop_front().unwrap_or_else(SyncResult::success)
    }
}

#[async_trait]
impl RemoteAdapter for MockRemoteAdapter {
    fn entity_type(&self) -> &str {
        &self.entity_type
    }

    async fn create(&self, op: &Operation) -> SyncResult {
        self.wait_if_held().await;
        if !self.connected.load(std::sync::atomic::Ordering::SeqCst) {
            return self.record(op, SyncResult::retryable_failure("adapter disconnected"));
        }
        let result = Self::next_or_default(&self.create_queue);
        self.record(op, result)
    }

    async fn update(&self, op: &Operation) -> SyncResult {
        if !self.connected.load(std::sync::atomic::Ordering::SeqCst) {
            return self.record(op, SyncResult::retryable_failure("adapter disconnected"));
        }
        let result = Self::next_or_default(&self.update_queue);
        self.record(op, result)
    }

    async fn delete(&self, op: &Operation) -> SyncResult {
        if !self.connected.load(std::sync::atomic::Ordering::SeqCst) {
            return self.record(op, SyncResult::retryable_failure("adapter disconnected"));
        }
        let result = Self::next_or_default(&self.delete_queue);
        self.record(op, result)
    }

    async fn custom(&self, op: &Operation) -> SyncResult {
        if !self.connected.load(std::sync::atomic::Ordering::SeqCst) {
            return self.record(op, SyncResult::retryable_failure("adapter disconnected"));
        }
        let result = self
            .custom_queue
            .lock()
            .pop_front()
            .unwrap_or_else(|| SyncResult::fatal_failure("no canned response for custom op"));
        self.record(op, result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledgersync_model::{OpKind, OperationStatus};

    fn op(kind: OpKind) -> Operation {
        Operation {
            operation_id: "op1".into(),
            entity_type: "product".into(),
            entity_id: "p1".into(),
            op_kind: kind,
            payload: Default::default(),
            timestamp: 1000,
            status: OperationStatus::Pending,
            device_id: "d1".into(),
            retry_count: 0,
            error_message: None,
        }
    }

    #[tokio::test]
    async fn unqueued_calls_default_to_success() {
        let adapter = MockRemoteAdapter::new("product");
        let result = adapter.create(&op(OpKind::Create)).await;
        assert_eq!(result, SyncResult::success());
        assert_eq!(adapter.call_count(), 1);
    }

    #[tokio::test]
    async fn queued_responses_are_consumed_in_order() {
        let adapter = MockRemoteAdapter::new("product");
        adapter.queue_create(SyncResult::fatal_failure("first"));
        adapter.queue_create(SyncResult::success());

        let first = adapter.create(&op(OpKind::Create)).await;
        let second = adapter.create(&op(OpKind::Create)).await;

        assert_eq!(first, SyncResult::fatal_failure("first"));
        assert_eq!(second, SyncResult::success());
    }

    #[tokio::test]
    async fn disconnected_adapter_always_fails_retryably() {
        let adapter = MockRemoteAdapter::new("product");
        adapter.queue_create(SyncResult::success());
        adapter.disconnect();

        let result = adapter.create(&op(OpKind::Create)).await;
        assert_eq!(result, SyncResult::retryable_failure("adapter disconnected"));
    }
}
