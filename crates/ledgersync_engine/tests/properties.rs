//! Property-based invariants (distilled spec §8, properties 1-7).

use std::sync::{Arc, OnceLock};

use ledgersync_engine::SyncResult;
use ledgersync_model::{reduce_many, shallow_merge, OpKind, Operation, Payload};
use ledgersync_storage::StorageBackend;
use ledgersync_testkit::generators::operation_sequence_strategy;
use ledgersync_testkit::TestHarness;
use proptest::prelude::*;

fn runtime() -> &'static tokio::runtime::Runtime {
    static RUNTIME: OnceLock<tokio::runtime::Runtime> = OnceLock::new();
    RUNTIME.get_or_init(|| tokio::runtime::Runtime::new().unwrap())
}

fn has_custom(ops: &[Operation]) -> bool {
    ops.iter().any(|op| matches!(op.op_kind, OpKind::Custom(_)))
}

fn harness_with_adapters_for(ops: &[Operation]) -> (TestHarness, Vec<Arc<ledgersync_testkit::MockRemoteAdapter>>) {
    harness_with_adapters_for_builder(ops, TestHarness::builder("d1"))
}

fn harness_with_adapters_for_config(
    ops: &[Operation],
    config: ledgersync_engine::SyncConfig,
) -> (TestHarness, Vec<Arc<ledgersync_testkit::MockRemoteAdapter>>) {
    harness_with_adapters_for_builder(ops, TestHarness::builder("d1").with_config(config))
}

fn harness_with_adapters_for_builder(
    ops: &[Operation],
    mut builder: ledgersync_testkit::TestHarnessBuilder,
) -> (TestHarness, Vec<Arc<ledgersync_testkit::MockRemoteAdapter>>) {
    let mut handles = Vec::new();
    let mut seen = std::collections::BTreeSet::new();
    for op in ops {
        if seen.insert(op.entity_type.clone()) {
            let (next_builder, handle) = builder.with_mock_adapter(op.entity_type.clone());
            builder = next_builder;
            handles.push(handle);
        }
    }
    if seen.is_empty() {
        let (next_builder, handle) = builder.with_mock_adapter("product");
        builder = next_builder;
        handles.push(handle);
    }
    (builder.build(), handles)
}

proptest! {
    /// Property 1 — idempotency under retry: syncing twice with no new
    /// work between leaves the log empty after the first successful sync,
    /// and the second `sync()` call observes no further change.
    #[test]
    fn idempotent_under_retry(
        ops in operation_sequence_strategy(0, 8).prop_filter("no custom ops", |ops| !has_custom(ops))
    ) {
        let (harness, _adapters) = harness_with_adapters_for(&ops);
        runtime().block_on(async {
            for op in ops {
                harness.storage.add_operation(op).await.unwrap();
            }

            harness.engine.sync().await.unwrap();
            let after_first = harness.storage.get_pending_operations_count().await.unwrap();
            prop_assert_eq!(after_first, 0);

            harness.engine.sync().await.unwrap();
            let after_second = harness.storage.get_pending_operations_count().await.unwrap();
            prop_assert_eq!(after_second, 0);
            Ok(())
        })?;
    }

    /// Property 3 — order preservation: the engine dispatches operations
    /// to adapters in non-decreasing timestamp order of the operations
    /// they represent.
    #[test]
    fn dispatch_order_is_non_decreasing_by_timestamp(
        ops in operation_sequence_strategy(0, 10).prop_filter("no custom ops", |ops| !has_custom(ops))
    ) {
        let (harness, adapters) = harness_with_adapters_for(&ops);
        runtime().block_on(async {
            for op in ops {
                harness.storage.add_operation(op).await.unwrap();
            }
            harness.engine.sync().await.unwrap();

            // Dispatch order across different entities is unordered; the
            // invariant is per-adapter (equivalently, per entity type).
            for adapter in &adapters {
                let timestamps: Vec<i64> = adapter.calls().iter().map(|c| c.operation.timestamp).collect();
                let mut sorted = timestamps.clone();
                sorted.sort();
                prop_assert_eq!(timestamps, sorted);
            }
            Ok(())
        })?;
    }

    /// Property 5 — pending count monotonicity under failure: if every
    /// operation fails retryably and stays below `max_retries`, `sync()`
    /// does not decrease `pending_count()`.
    #[test]
    fn pending_count_does_not_decrease_under_retryable_failure(
        ops in operation_sequence_strategy(1, 6).prop_filter("no custom ops", |ops| !has_custom(ops))
    ) {
        // Reduction is disabled here: a cancelling same-entity pair (e.g.
        // `Create`/`Delete`) legitimately shrinks the log with no failure
        // involved, which would defeat this property. The monotonicity
        // claim is about retry behavior, not about reduction.
        let (harness, adapters) = harness_with_adapters_for_config(
            &ops,
            ledgersync_engine::SyncConfig::new("d1").with_reduce_before_dispatch(false),
        );
        let op_count = ops.len();
        runtime().block_on(async {
            for op in ops {
                harness.storage.add_operation(op).await.unwrap();
            }
            for adapter in &adapters {
                adapter.always_create(SyncResult::retryable_failure("down"), op_count + 1);
                for _ in 0..op_count {
                    adapter.queue_update(SyncResult::retryable_failure("down"));
                    adapter.queue_delete(SyncResult::retryable_failure("down"));
                }
            }

            let before = harness.storage.get_pending_operations_count().await.unwrap();
            harness.engine.sync().await.unwrap();
            let after = harness.storage.get_pending_operations_count().await.unwrap();
            prop_assert!(after >= before);
            Ok(())
        })?;
    }

    /// Property 6 — round-trip serialization: `from_map(to_map(op)) == op`
    /// (and payload/timestamp/kind survive unchanged, since `Operation`'s
    /// `PartialEq` is `operation_id`-only).
    #[test]
    fn operation_round_trips_through_map(op in ledgersync_testkit::generators::operation_strategy()) {
        let map = op.to_map().unwrap();
        let restored = Operation::from_map(map).unwrap();

        prop_assert_eq!(&op, &restored);
        prop_assert_eq!(&op.payload, &restored.payload);
        prop_assert_eq!(op.timestamp, restored.timestamp);
        prop_assert_eq!(&op.entity_type, &restored.entity_type);
        prop_assert_eq!(&op.entity_id, &restored.entity_id);
        prop_assert_eq!(&op.op_kind, &restored.op_kind);
    }

    /// Property 7 — cancellation-out reduction: reducing `[Create(e),
    /// Delete(e)]` yields the empty list for any payload/timestamp pair.
    #[test]
    fn create_then_delete_always_cancels(payload in ledgersync_testkit::generators::payload_strategy(), ts1 in 0i64..1000, gap in 1i64..1000) {
        let create = Operation::new("op1", "product", "p1", OpKind::Create, payload, ts1, "d1");
        let delete = Operation::new("op2", "product", "p1", OpKind::Delete, Payload::new(), ts1 + gap, "d1");

        prop_assert!(reduce_many(vec![create, delete]).is_empty());
    }
}

/// Property 2 — reduction preserves effect: applying the reduced sequence
/// against a bookkeeping projection yields the same final entity state as
/// applying the original sequence, modulo `Delete`-preceded-by-`Create`
/// cancellations that never reach the server.
///
/// The projection mirrors the reducer's own squash table (`Create` sets
/// the snapshot, `Update` shallow-merges onto it, `Delete` clears it) since
/// that table IS the spec's definition of "equivalent effect" for a
/// same-entity sequence — there is no independent oracle to check it
/// against.
fn project(ops: &[Operation]) -> Option<Payload> {
    let mut state: Option<Payload> = None;
    for op in ops {
        match &op.op_kind {
            OpKind::Create => state = Some(op.payload.clone()),
            OpKind::Update => {
                state = Some(shallow_merge(&state.unwrap_or_default(), &op.payload));
            }
            OpKind::Delete => state = None,
            OpKind::Custom(_) => {}
        }
    }
    state
}

fn single_entity_sequence_strategy(max_len: usize) -> impl Strategy<Value = Vec<Operation>> {
    use ledgersync_testkit::generators::payload_strategy;

    (
        payload_strategy(),
        prop::collection::vec(
            (prop_oneof![Just(OpKind::Update), Just(OpKind::Delete)], payload_strategy()),
            0..max_len,
        ),
    )
        .prop_map(|(create_payload, rest)| {
            let mut ops = vec![Operation::new("op-0", "product", "p1", OpKind::Create, create_payload, 1000, "d1")];
            for (i, (kind, payload)) in rest.into_iter().enumerate() {
                ops.push(Operation::new(
                    format!("op-{}", i + 1),
                    "product",
                    "p1",
                    kind,
                    payload,
                    2000 + i as i64 * 1000,
                    "d1",
                ));
            }
            ops
        })
}

proptest! {
    #[test]
    fn reduction_preserves_final_entity_state(ops in single_entity_sequence_strategy(8)) {
        let reduced = reduce_many(ops.clone());
        prop_assert_eq!(project(&ops), project(&reduced));
    }
}
