//! Operation records.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A field-name-to-value mapping, opaque to the core beyond what resolvers
/// and the reducer need to inspect.
pub type Payload = Map<String, Value>;

/// The kind of intent an operation records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OpKind {
    /// The entity did not previously exist locally.
    Create,
    /// The entity existed and some fields changed.
    Update,
    /// The entity should no longer exist.
    Delete,
    /// An application-defined intent outside create/update/delete.
    ///
    /// The name must be non-empty; adapters key custom dispatch on it.
    Custom(String),
}

impl OpKind {
    /// Returns the custom name, if this is a `Custom` variant.
    pub fn custom_name(&self) -> Option<&str> {
        match self {
            OpKind::Custom(name) => Some(name.as_str()),
            _ => None,
        }
    }

    /// Returns true if this kind ever reduces with a neighboring operation.
    ///
    /// `Custom` operations never reduce, in either position.
    pub fn reduces(&self) -> bool {
        !matches!(self, OpKind::Custom(_))
    }
}

/// Where an operation currently sits in its sync lifecycle.
///
/// `Pending` -> `Syncing` -> { `Synced` (removed from the log) | `Pending`
/// (retryable failure) | `Failed` (terminal) }.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationStatus {
    /// Queued, not yet dispatched to an adapter.
    Pending,
    /// Dispatched; outcome not yet known. Transient — see crash recovery.
    Syncing,
    /// Terminal success. Reserved for audit-retention; the default engine
    /// path removes the operation from the log instead of reaching this
    /// state.
    Synced,
    /// Terminal failure. Retained with `error_message` set.
    Failed,
}

/// An immutable record of one intent against one entity.
///
/// Equality and hashing are defined by `operation_id` alone; two operations
/// with the same id are the same operation regardless of any other field
/// drift (the reducer rewrites payload/timestamp/status in place under a
/// stable id).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Operation {
    /// Globally unique identifier. Presented to the remote as an
    /// idempotency key.
    pub operation_id: String,
    /// Namespace the operation belongs to; keys adapter and resolver
    /// registries.
    pub entity_type: String,
    /// Identifier of the affected entity, unique within `entity_type`.
    pub entity_id: String,
    /// What kind of change this operation records.
    pub op_kind: OpKind,
    /// The domain payload. `{}` is valid for `Delete`.
    pub payload: Payload,
    /// Logical timestamp used for ordering; ties break on insertion order.
    pub timestamp: i64,
    /// Current lifecycle state.
    pub status: OperationStatus,
    /// Device that originated the operation; stable for the process
    /// lifetime.
    pub device_id: String,
    /// Number of retryable failures (or `UseLocal` resolutions) observed.
    pub retry_count: u32,
    /// Set on failure, or when a resolution requires manual action.
    pub error_message: Option<String>,
}

impl PartialEq for Operation {
    fn eq(&self, other: &Self) -> bool {
        self.operation_id == other.operation_id
    }
}

impl Eq for Operation {}

impl std::hash::Hash for Operation {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.operation_id.hash(state);
    }
}

impl Operation {
    /// Constructs a new `Pending` operation with the given identity.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        operation_id: impl Into<String>,
        entity_type: impl Into<String>,
        entity_id: impl Into<String>,
        op_kind: OpKind,
        payload: Payload,
        timestamp: i64,
        device_id: impl Into<String>,
    ) -> Self {
        Self {
            operation_id: operation_id.into(),
            entity_type: entity_type.into(),
            entity_id: entity_id.into(),
            op_kind,
            payload,
            timestamp,
            status: OperationStatus::Pending,
            device_id: device_id.into(),
            retry_count: 0,
            error_message: None,
        }
    }

    /// Returns the `(entity_type, entity_id)` pair that identifies which
    /// entity this operation targets.
    pub fn entity_key(&self) -> (&str, &str) {
        (&self.entity_type, &self.entity_id)
    }

    /// Serializes this operation to a JSON map representation.
    ///
    /// `from_map(to_map(op)) == op` for every operation (property 6).
    pub fn to_map(&self) -> serde_json::Result<Payload> {
        let value = serde_json::to_value(self)?;
        match value {
            Value::Object(map) => Ok(map),
            _ => unreachable!("Operation always serializes to a JSON object"),
        }
    }

    /// Deserializes an operation from a JSON map produced by [`to_map`].
    ///
    /// [`to_map`]: Operation::to_map
    pub fn from_map(map: Payload) -> serde_json::Result<Self> {
        serde_json::from_value(Value::Object(map))
    }
}
