//! Configuration for the sync engine.

use snipvault_remote::MAX_RECORDS_PER_BATCH;
use std::time::Duration;

/// Tunables for full syncs and debounced uploads.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Records requested per page of the full-scan download.
    pub page_size: usize,
    /// Records per batch save/fetch call. Clamped to the remote's
    /// per-call limit.
    pub save_batch_limit: usize,
    /// Delay before a debounced edit is pushed remotely.
    pub debounce_delay: Duration,
}

impl SyncConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self {
            page_size: 100,
            save_batch_limit: MAX_RECORDS_PER_BATCH,
            debounce_delay: Duration::from_secs(2),
        }
    }

    /// Sets the download page size.
    #[must_use]
    pub fn with_page_size(mut self, size: usize) -> Self {
        self.page_size = size.max(1);
        self
    }

    /// Sets the batch save/fetch size, clamped to the remote limit.
    #[must_use]
    pub fn with_save_batch_limit(mut self, limit: usize) -> Self {
        self.save_batch_limit = limit.clamp(1, MAX_RECORDS_PER_BATCH);
        self
    }

    /// Sets the debounce delay for edit uploads.
    #[must_use]
    pub fn with_debounce_delay(mut self, delay: Duration) -> Self {
        self.debounce_delay = delay;
        self
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self::new()
    }
}
