//! Conflict resolver contract and the two mandated implementations.

use async_trait::async_trait;
use ledgersync_model::{LocalState, Operation, RemoteState, Resolution};

/// Decides how to reconcile a local/remote conflict for one entity.
///
/// Resolvers are given every pending operation for the entity (not just
/// the one that triggered the conflict) so that field-level strategies can
/// reason about everything the device has queued to write.
#[async_trait]
pub trait ConflictResolver: Send + Sync {
    /// Resolves a conflict. May suspend for I/O in implementations that
    /// need it; the two mandated resolvers below are pure and infallible.
    ///
    /// `Err` marks the operation `Failed` with the returned message rather
    /// than attempting a resolution — the resolver-error category in the
    /// engine's error handling design.
    async fn resolve(
        &self,
        local: &LocalState,
        remote: &RemoteState,
        pending_for_entity: &[Operation],
    ) -> Result<Resolution, String>;
}

/// Prefers whichever side observed the later logical timestamp; ties
/// prefer local.
#[derive(Debug, Clone, Copy, Default)]
pub struct LastWriteWins;

#[async_trait]
impl ConflictResolver for LastWriteWins {
    async fn resolve(
        &self,
        local: &LocalState,
        remote: &RemoteState,
        _pending_for_entity: &[Operation],
    ) -> Result<Resolution, String> {
        if remote.timestamp > local.timestamp {
            Ok(Resolution::UseRemote(remote.data.clone()))
        } else {
            Ok(Resolution::UseLocal)
        }
    }
}

/// Merges disjoint field writes and escalates overlapping ones to manual
/// resolution.
///
/// The set of "written" fields is the union of keys across every
/// `Create`/`Update` payload among the pending operations for the entity
/// (the conflicting operation's own payload included, since it is part of
/// `pending_for_entity`). Starting from the remote snapshot:
///
/// - A written field absent from remote: take the local value.
/// - A written field present and equal on both sides: keep the remote
///   value (no-op).
/// - A written field present and unequal: a genuine conflict on that key.
///
/// Any conflicting field escalates the whole resolution to `Manual`;
/// otherwise the merged map is returned via `Merge`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldLevelMerge;

#[async_trait]
impl ConflictResolver for FieldLevelMerge {
    async fn resolve(
        &self,
        local: &LocalState,
        remote: &RemoteState,
        pending_for_entity: &[Operation],
    ) -> Result<Resolution, String> {
        use ledgersync_model::OpKind;

        let written_fields: std::collections::BTreeSet<&str> = pending_for_entity
            .iter()
            .filter(|op| matches!(op.op_kind, OpKind::Create | OpKind::Update))
            .flat_map(|op| op.payload.keys().map(|k| k.as_str()))
            .collect();

        let mut merged = remote.data.clone();
        for field in written_fields {
            match remote.data.get(field) {
                None => {
                    if let Some(local_value) = local.data.get(field) {
                        merged.insert(field.to_string(), local_value.clone());
                    }
                }
                Some(remote_value) => {
                    let local_value = local.data.get(field);
                    if local_value != Some(remote_value) {
                        return Ok(Resolution::Manual);
                    }
                    // Equal on both sides: remote value already in `merged`.
                }
            }
        }

        Ok(Resolution::Merge(merged))
    }
}
