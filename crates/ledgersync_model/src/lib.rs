//! # ledgersync_model
//!
//! Core data types for the offline-first sync engine: operations, the
//! reducer that squashes them, conflict-resolution types, and the
//! sync-status event shape.
//!
//! This is a pure-data crate with no I/O and no storage/transport opinions;
//! those live in `ledgersync_storage` and `ledgersync_engine`.
//!
//! ## Key invariants
//!
//! - Two operations with the same `operation_id` are the same operation.
//! - The reducer is pure and idempotent under repeated application.
//! - `from_map(to_map(op)) == op` for every operation.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod operation;
mod reducer;
mod resolution;
mod status;

pub use operation::{OpKind, Operation, OperationStatus, Payload};
pub use reducer::{reduce_many, shallow_merge};
pub use resolution::{EntityState, LocalState, RemoteState, Resolution};
pub use status::{SyncStatus, SyncStatusEvent};
