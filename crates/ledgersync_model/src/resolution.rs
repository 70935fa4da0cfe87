//! Conflict resolution types shared between the engine and resolver
//! implementations.

use crate::operation::Payload;

/// A snapshot of an entity paired with the logical instant it was observed
/// at. Used on both the local and remote side of a conflict.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityState {
    /// The entity snapshot.
    pub data: Payload,
    /// The logical instant this snapshot is valid as of.
    pub timestamp: i64,
}

impl EntityState {
    /// Builds a new entity state.
    pub fn new(data: Payload, timestamp: i64) -> Self {
        Self { data, timestamp }
    }
}

/// The local side of a conflict: the entity as currently stored, paired
/// with the timestamp of the operation that produced the conflict.
pub type LocalState = EntityState;

/// The remote side of a conflict: the entity as the server currently holds
/// it, paired with the server's timestamp (or the local observation time if
/// the server did not supply one).
pub type RemoteState = EntityState;

/// What a conflict resolver decides to do about a conflict.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Retry the pending operation; do not touch the stored entity.
    UseLocal,
    /// Overwrite the entity with the given data; drop the pending
    /// operation.
    UseRemote(Payload),
    /// Overwrite the entity with the given data, rewrite the pending
    /// operation's payload to match, and requeue it as `Pending`.
    Merge(Payload),
    /// Mark the operation `Failed`; a human must intervene.
    Manual,
}
