//! # ledgersync_storage
//!
//! The storage contract consumed by the sync engine, plus an in-memory
//! reference implementation.
//!
//! ## Design principles
//!
//! - The contract mandates three logical namespaces: entities, operations,
//!   and free-form metadata. On-disk layout is left to the implementation.
//! - `execute_transaction` is the only place a caller can batch mutations
//!   atomically; it backs the reducer's squash path.
//! - Absence (unknown entity or operation id) is `Option::None`, never an
//!   error.
//!
//! ## Crash recovery
//!
//! [`InMemoryStorage`] treats any operation left in `Syncing` status as
//! pending: `get_pending_operations` and `get_pending_operations_count`
//! both include it. This is the implementation's chosen answer to the
//! restart-visibility question the core leaves open — a persistent backend
//! following this contract should make the same choice, or normalize
//! `Syncing` to `Pending` on load, so that a process crash between dispatch
//! and outcome never strands an operation.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod contract;
mod error;
mod log;
mod memory;

pub use contract::{StorageBackend, TransactionOp};
pub use error::{StorageError, StorageResult};
pub use log::OperationLog;
pub use memory::InMemoryStorage;
