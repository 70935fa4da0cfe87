//! Property-based generators for operations and operation sequences.
//!
//! Strategies draw from a small, fixed entity/field universe so that
//! generated sequences exercise the reducer's same-entity squash rules
//! (distilled spec §4.2) with reasonable probability, rather than spreading
//! every operation across a different entity.

use ledgersync_model::{OpKind, Operation, OperationStatus, Payload};
use proptest::prelude::*;

/// Entity types used across the generators.
const ENTITY_TYPES: &[&str] = &["product", "note", "task"];

/// Entity ids used across the generators; kept small so sequences
/// frequently target the same entity.
const ENTITY_IDS: &[&str] = &["e1", "e2", "e3"];

/// Field names used when generating payloads.
const FIELD_NAMES: &[&str] = &["name", "price", "status", "notes"];

/// Strategy for a single entity type drawn from the fixed universe.
pub fn entity_type_strategy() -> impl Strategy<Value = String> {
    prop::sample::select(ENTITY_TYPES).prop_map(str::to_string)
}

/// Strategy for a single entity id drawn from the fixed universe.
pub fn entity_id_strategy() -> impl Strategy<Value = String> {
    prop::sample::select(ENTITY_IDS).prop_map(str::to_string)
}

/// Strategy for a scalar JSON value suitable for a payload field.
fn scalar_value_strategy() -> impl Strategy<Value = serde_json::Value> {
    prop_oneof![
        any::<bool>().prop_map(serde_json::Value::Bool),
        any::<i32>().prop_map(|n| serde_json::Value::from(n)),
        "[a-zA-Z]{1,8}".prop_map(serde_json::Value::String),
    ]
}

/// Strategy for a payload drawn from the fixed field universe, 0 to 3
/// fields at a time.
pub fn payload_strategy() -> impl Strategy<Value = Payload> {
    prop::collection::vec(
        (prop::sample::select(FIELD_NAMES), scalar_value_strategy()),
        0..=3,
    )
    .prop_map(|pairs| pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect())
}

/// Strategy for an [`OpKind`], weighted toward `Create`/`Update`/`Delete`
/// over `Custom` since the reducer treats `Custom` as a wall.
pub fn op_kind_strategy() -> impl Strategy<Value = OpKind> {
    prop_oneof![
        3 => Just(OpKind::Create),
        4 => Just(OpKind::Update),
        2 => Just(OpKind::Delete),
        1 => "[a-z]{3,8}".prop_map(OpKind::Custom),
    ]
}

/// Strategy for a single, freestanding `Pending` operation.
pub fn operation_strategy() -> impl Strategy<Value = Operation> {
    (
        any::<u64>(),
        entity_type_strategy(),
        entity_id_strategy(),
        op_kind_strategy(),
        payload_strategy(),
        0i64..1_000_000i64,
        "d[1-3]",
    )
        .prop_map(|(seq, entity_type, entity_id, op_kind, payload, timestamp, device_id)| {
            Operation {
                operation_id: format!("op-{seq}"),
                entity_type,
                entity_id,
                op_kind,
                payload,
                timestamp,
                status: OperationStatus::Pending,
                device_id,
                retry_count: 0,
                error_message: None,
            }
        })
}

/// Strategy for a bounded, timestamp-ordered sequence of operations over
/// the fixed entity universe, suitable for driving reducer and sync-engine
/// property tests (distilled spec §8).
///
/// Operation ids are assigned densely (`op-0`, `op-1`, ...) by sequence
/// position so that shrinking produces readable failures; timestamps are
/// strictly increasing in generation order, matching the log's ordering
/// invariant.
pub fn operation_sequence_strategy(min_len: usize, max_len: usize) -> impl Strategy<Value = Vec<Operation>> {
    prop::collection::vec(
        (entity_type_strategy(), entity_id_strategy(), op_kind_strategy(), payload_strategy(), "d[1-3]"),
        min_len..=max_len,
    )
    .prop_map(|rows| {
        rows.into_iter()
            .enumerate()
            .map(|(i, (entity_type, entity_id, op_kind, payload, device_id))| Operation {
                operation_id: format!("op-{i}"),
                entity_type,
                entity_id,
                op_kind,
                payload,
                timestamp: 1000 + i as i64 * 1000,
                status: OperationStatus::Pending,
                device_id,
                retry_count: 0,
                error_message: None,
            })
            .collect()
    })
}
