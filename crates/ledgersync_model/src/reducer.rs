//! Squashes consecutive operations on the same entity into a shorter,
//! equivalent sequence.

use crate::operation::{OpKind, Operation};

/// Shallow-merges `b` over `a`: every key in `b` overrides `a`'s value;
/// keys present only in `a` are preserved. Nested maps are not merged
/// recursively.
pub fn shallow_merge(a: &crate::operation::Payload, b: &crate::operation::Payload) -> crate::operation::Payload {
    let mut merged = a.clone();
    for (key, value) in b {
        merged.insert(key.clone(), value.clone());
    }
    merged
}

/// Folds an incoming operation `next` onto `current` (the operation
/// immediately preceding it for the same entity — in practice, whatever sits
/// on top of [`reduce_many`]'s stack), per the pairwise squash table:
///
/// | current | next | result |
/// |---|---|---|
/// | Create | Update | Create, payload = merge(current, next), ts = next.ts |
/// | Create | Delete | cancelled (`None`) |
/// | Update | Update | Update, payload = merge(current, next), ts = next.ts |
/// | Update | Delete | Delete (next's id/ts) |
/// | Custom | * / * | Custom | not reduced |
///
/// Returns `Cancelled` when the pair cancels out (`Create` immediately
/// undone by `Delete`); the caller drops both operations entirely.
fn squash_pair(current: Operation, next: Operation) -> ReducedStep {
    if current.entity_key() != next.entity_key() {
        return ReducedStep::NotReduced(current, next);
    }
    if !current.op_kind.reduces() || !next.op_kind.reduces() {
        return ReducedStep::NotReduced(current, next);
    }

    match (&current.op_kind, &next.op_kind) {
        (OpKind::Create, OpKind::Update) => {
            let mut merged = current;
            merged.payload = shallow_merge(&merged.payload, &next.payload);
            merged.timestamp = next.timestamp;
            ReducedStep::Reduced(merged)
        }
        (OpKind::Create, OpKind::Delete) => ReducedStep::Cancelled,
        (OpKind::Update, OpKind::Update) => {
            let mut merged = current;
            merged.payload = shallow_merge(&merged.payload, &next.payload);
            merged.timestamp = next.timestamp;
            ReducedStep::Reduced(merged)
        }
        (OpKind::Update, OpKind::Delete) => ReducedStep::Reduced(next),
        _ => ReducedStep::NotReduced(current, next),
    }
}

enum ReducedStep {
    /// The pair folded into a single operation.
    Reduced(Operation),
    /// The pair cancelled; neither operation survives.
    Cancelled,
    /// The pair does not reduce; both are returned unchanged.
    NotReduced(Operation, Operation),
}

/// Folds `ops` onto a stack, one operation at a time: each incoming
/// operation is repeatedly squashed against whatever currently sits on top
/// of the stack until the pair no longer reduces (`NotReduced`, both
/// pushed back) or cancels out (`Cancelled`, neither pushed).
///
/// `ops` is assumed already sorted by timestamp (as the log's `pending()`
/// guarantees). The reducer is pure: it does not mutate the log.
///
/// A sequence that reduces down to nothing (e.g. `[Create, Delete]`)
/// produces an empty vector — the caller is expected to remove the
/// corresponding operations from the log rather than dispatch anything.
///
/// Re-folding against the stack top (rather than only ever comparing
/// adjacent operations in their original order) is what makes this
/// idempotent: every adjacent pair left in the final stack was explicitly
/// tested as `NotReduced` at the moment the later one was pushed, and
/// `squash_pair` is a pure function of the two operations involved, so that
/// verdict cannot change on a second pass. Without it, a cancellation can
/// strand two still-reducible survivors either side of the cancelled pair —
/// e.g. `[Create, Create, Delete, Update]` on one entity: the first two
/// `Create`s don't reduce so the first is provisionally pushed, the second
/// `Create` cancels with the `Delete`, and the trailing `Update` must then
/// be re-tried against that first `Create` (merging into one `Create`)
/// rather than left standing next to it as two separate operations.
pub fn reduce_many(ops: Vec<Operation>) -> Vec<Operation> {
    let mut stack: Vec<Operation> = Vec::new();

    for op in ops {
        let mut current = op;
        loop {
            let Some(top) = stack.pop() else {
                stack.push(current);
                break;
            };

            match squash_pair(top, current) {
                ReducedStep::Reduced(merged) => {
                    current = merged;
                    // Keep folding: the new current may reduce further
                    // against whatever is now on top of the stack.
                }
                ReducedStep::Cancelled => {
                    // Both vanish; nothing to push. Move on to the next
                    // incoming operation.
                    break;
                }
                ReducedStep::NotReduced(prev, next) => {
                    stack.push(prev);
                    stack.push(next);
                    break;
                }
            }
        }
    }

    stack
}
