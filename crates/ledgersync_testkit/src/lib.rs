//! # ledgersync_testkit
//!
//! Test utilities for the sync engine core: `proptest` generators for
//! operations and operation sequences, a `TestHarness` builder wiring
//! storage/adapters/resolver into a working `SyncEngine`, and a
//! `MockRemoteAdapter` for scripting server responses without a real
//! transport.
//!
//! Downstream crates (and this workspace's own `ledgersync_engine` test
//! suite) depend on this crate only as a `dev-dependency`.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod generators;
mod fixtures;
mod mock_adapter;

pub use fixtures::{TestHarness, TestHarnessBuilder};
pub use mock_adapter::{MockRemoteAdapter, RecordedCall};
