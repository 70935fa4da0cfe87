//! Convenience builder wiring storage, adapters, and an optional resolver
//! into a ready-to-use [`SyncEngine`].

use std::sync::Arc;

use ledgersync_engine::{ConflictResolver, Facade, RemoteAdapter, SyncConfig, SyncEngine};
use ledgersync_storage::{InMemoryStorage, StorageBackend};

use crate::mock_adapter::MockRemoteAdapter;

/// A `SyncEngine` wired to an [`InMemoryStorage`] backend, with convenience
/// accessors for the storage handle and a `Facade` over the same engine.
///
/// Assembles the pieces an integration test usually needs in a few lines,
/// the way EntiDB's own test fixtures assemble a `TestDatabase`.
pub struct TestHarness {
    /// The in-memory storage backend backing `engine`.
    pub storage: Arc<InMemoryStorage>,
    /// The engine under test.
    pub engine: Arc<SyncEngine>,
    device_id: String,
}

impl TestHarness {
    /// Starts building a harness with the given device id and sync
    /// configuration.
    pub fn builder(device_id: impl Into<String>) -> TestHarnessBuilder {
        TestHarnessBuilder {
            device_id: device_id.into(),
            config: None,
            resolver: None,
            adapters: Vec::new(),
        }
    }

    /// Builds a `Facade` over this harness's storage and engine.
    pub fn facade(&self) -> Facade {
        Facade::new(
            self.storage.clone() as Arc<dyn StorageBackend>,
            self.engine.clone(),
            self.device_id.clone(),
        )
    }
}

/// Builder for [`TestHarness`].
pub struct TestHarnessBuilder {
    device_id: String,
    config: Option<SyncConfig>,
    resolver: Option<Arc<dyn ConflictResolver>>,
    adapters: Vec<Arc<dyn RemoteAdapter>>,
}

impl TestHarnessBuilder {
    /// Overrides the default `SyncConfig` (otherwise `SyncConfig::new(device_id)`).
    pub fn with_config(mut self, config: SyncConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Sets the conflict resolver.
    pub fn with_resolver(mut self, resolver: Arc<dyn ConflictResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Registers a pre-built adapter.
    pub fn with_adapter(mut self, adapter: Arc<dyn RemoteAdapter>) -> Self {
        self.adapters.push(adapter);
        self
    }

    /// Builds a fresh [`MockRemoteAdapter`] for `entity_type`, registers
    /// it, and returns a handle so the test can queue canned responses.
    pub fn with_mock_adapter(self, entity_type: impl Into<String>) -> (Self, Arc<MockRemoteAdapter>) {
        let adapter = Arc::new(MockRemoteAdapter::new(entity_type));
        let handle = adapter.clone();
        (self.with_adapter(adapter), handle)
    }

    /// Assembles the harness.
    pub fn build(self) -> TestHarness {
        let storage = Arc::new(InMemoryStorage::new());
        let config = self.config.unwrap_or_else(|| SyncConfig::new(self.device_id.clone()));

        let mut engine = SyncEngine::new(storage.clone() as Arc<dyn StorageBackend>, config);
        if let Some(resolver) = self.resolver {
            engine = engine.with_resolver(resolver);
        }
        let engine = Arc::new(engine);
        for adapter in self.adapters {
            engine.register_adapter(adapter);
        }

        TestHarness {
            storage,
            engine,
            device_id: self.device_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledgersync_model::Payload;

    #[tokio::test]
    async fn harness_wires_a_working_engine() {
        let (builder, adapter) = TestHarness::builder("d1").with_mock_adapter("product");
        let harness = builder.build();
        let facade = harness.facade();

        facade
            .log_create("product", "p1", Payload::new())
            .await
            .unwrap();

        harness.engine.sync().await.unwrap();

        assert_eq!(adapter.call_count(), 1);
        assert_eq!(harness.storage.get_pending_operations_count().await.unwrap(), 0);
    }
}
