//! # ledgersync_engine
//!
//! The sync engine: drives pending operations through remote adapters,
//! applies retry and conflict-resolution policy, and reflects
//! server-returned canonical state back into local storage. Also the
//! facade applications construct to log operations or to use ledgersync as
//! their entity store directly.
//!
//! ## Control flow
//!
//! `Facade::log_create`/`log_update`/`log_delete`/`log_custom` (hybrid
//! mode) or `Facade::save`/`delete` (source-of-truth mode) append
//! operations. `Facade::sync` (equivalently `SyncEngine::sync`) loads
//! pending operations, optionally reduces them per entity, dispatches each
//! to its registered [`RemoteAdapter`], and applies the outcome — removal,
//! retry, conflict resolution, or terminal failure — while emitting
//! progress on the status stream.
//!
//! ## Concurrency
//!
//! `SyncEngine` enforces single-writer `sync()` semantics with a
//! compare-and-swap guard; concurrent calls observe
//! [`EngineError::AlreadySyncing`] rather than racing the drain.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod adapter;
mod config;
mod engine;
mod error;
mod facade;
mod resolver;

pub use adapter::{RemoteAdapter, SyncResult};
pub use config::SyncConfig;
pub use engine::SyncEngine;
pub use error::{EngineError, EngineResult};
pub use facade::Facade;
pub use resolver::{ConflictResolver, FieldLevelMerge, LastWriteWins};
