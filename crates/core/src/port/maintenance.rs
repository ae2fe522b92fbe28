// Storage Maintenance port
use crate::error::Result;
use async_trait::async_trait;

/// Storage statistics for one queue
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StorageStats {
    pub pending_count: i64,
    pub played_count: i64,
}

/// Storage maintenance operations
#[async_trait]
pub trait Maintenance: Send + Sync {
    /// Delete played entries submitted before `before_millis`
    ///
    /// # Returns
    /// Number of rows deleted
    async fn purge_played_before(&self, queue: &str, before_millis: i64) -> Result<u64>;

    /// Get storage statistics
    async fn get_stats(&self, queue: &str) -> Result<StorageStats>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

    /// Records purge requests, stores nothing
    #[derive(Default)]
    pub struct NoopMaintenance {
        purges: AtomicU64,
        last_cutoff: AtomicI64,
    }

    impl NoopMaintenance {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn purge_calls(&self) -> u64 {
            self.purges.load(Ordering::SeqCst)
        }

        pub fn last_cutoff(&self) -> i64 {
            self.last_cutoff.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Maintenance for NoopMaintenance {
        async fn purge_played_before(&self, _queue: &str, before_millis: i64) -> Result<u64> {
            self.purges.fetch_add(1, Ordering::SeqCst);
            self.last_cutoff.store(before_millis, Ordering::SeqCst);
            Ok(0)
        }

        async fn get_stats(&self, _queue: &str) -> Result<StorageStats> {
            Ok(StorageStats::default())
        }
    }
}
