//! Configuration for the sync engine.

/// Configuration for a [`crate::SyncEngine`].
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Stamped onto every operation logged through this device.
    pub device_id: String,
    /// Retry ceiling: an operation that fails retryably `max_retries` times
    /// is marked `Failed` on the next attempt.
    pub max_retries: u32,
    /// When true, `sync()` groups pending operations by entity and runs
    /// them through the reducer before dispatch.
    pub reduce_before_dispatch: bool,
    /// When true, a non-recovered failure from `sync_one` aborts the rest
    /// of the drain immediately instead of continuing to the next
    /// operation.
    pub stop_on_error: bool,
}

impl SyncConfig {
    /// Creates a configuration with the given device id and the documented
    /// defaults (`max_retries = 5`, reduction on, `stop_on_error` off).
    pub fn new(device_id: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            max_retries: 5,
            reduce_before_dispatch: true,
            stop_on_error: false,
        }
    }

    /// Sets the retry ceiling.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Enables or disables pre-dispatch reduction.
    pub fn with_reduce_before_dispatch(mut self, reduce: bool) -> Self {
        self.reduce_before_dispatch = reduce;
        self
    }

    /// Enables or disables stopping the drain on the first unrecovered
    /// failure.
    pub fn with_stop_on_error(mut self, stop: bool) -> Self {
        self.stop_on_error = stop;
        self
    }
}
