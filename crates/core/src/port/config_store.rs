// Queue Config Store Port (Interface)

use crate::domain::{QueueConfig, QueueConfigPatch, QueueRecord};
use crate::error::Result;
use async_trait::async_trait;

/// Durable per-queue configuration and open/closed flag
///
/// A queue that was never stored reads as `QueueRecord::new` (open, no limits).
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Load config and gate state
    async fn load(&self, queue: &str) -> Result<QueueRecord>;

    /// Load config only
    async fn get_config(&self, queue: &str) -> Result<QueueConfig> {
        Ok(self.load(queue).await?.config)
    }

    /// Apply a partial update, returning the resulting config
    async fn update_config(&self, queue: &str, patch: &QueueConfigPatch) -> Result<QueueConfig>;

    /// Persist the open/closed flag
    async fn set_open(&self, queue: &str, is_open: bool) -> Result<()>;

    /// Add or remove a participant from the blacklist
    async fn set_blacklisted(&self, queue: &str, participant: &str, blacklisted: bool)
        -> Result<()>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::sync::Arc;

    /// In-memory config store
    #[derive(Clone, Default)]
    pub struct InMemoryConfigStore {
        records: Arc<Mutex<HashMap<String, QueueRecord>>>,
    }

    impl InMemoryConfigStore {
        pub fn new() -> Self {
            Self::default()
        }

        /// Seed a queue with the given config (open)
        pub fn with_config(queue: &str, config: QueueConfig) -> Self {
            let store = Self::new();
            let mut record = QueueRecord::new(queue);
            record.config = config;
            store.records.lock().insert(queue.to_string(), record);
            store
        }

        /// Current stored open flag
        pub fn stored_open(&self, queue: &str) -> bool {
            self.records
                .lock()
                .get(queue)
                .map(|r| r.is_open)
                .unwrap_or(true)
        }
    }

    #[async_trait]
    impl ConfigStore for InMemoryConfigStore {
        async fn load(&self, queue: &str) -> Result<QueueRecord> {
            Ok(self
                .records
                .lock()
                .get(queue)
                .cloned()
                .unwrap_or_else(|| QueueRecord::new(queue)))
        }

        async fn update_config(
            &self,
            queue: &str,
            patch: &QueueConfigPatch,
        ) -> Result<QueueConfig> {
            let mut records = self.records.lock();
            let record = records
                .entry(queue.to_string())
                .or_insert_with(|| QueueRecord::new(queue));
            record.config.apply(patch);
            Ok(record.config.clone())
        }

        async fn set_open(&self, queue: &str, is_open: bool) -> Result<()> {
            let mut records = self.records.lock();
            records
                .entry(queue.to_string())
                .or_insert_with(|| QueueRecord::new(queue))
                .is_open = is_open;
            Ok(())
        }

        async fn set_blacklisted(
            &self,
            queue: &str,
            participant: &str,
            blacklisted: bool,
        ) -> Result<()> {
            let mut records = self.records.lock();
            let ids = &mut records
                .entry(queue.to_string())
                .or_insert_with(|| QueueRecord::new(queue))
                .config
                .blacklisted_ids;
            if blacklisted {
                ids.insert(participant.to_string());
            } else {
                ids.remove(participant);
            }
            Ok(())
        }
    }
}
