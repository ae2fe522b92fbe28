// Compaction Service
// Periodic history eviction in memory and purge of old played rows in storage

use super::queue::QueueService;
use super::shutdown::ShutdownToken;
use crate::error::Result;
use crate::port::Maintenance;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;
use tracing::{error, info};

/// Outcome of one compaction pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompactionReport {
    /// History entries evicted from memory
    pub evicted: usize,
    /// Played rows deleted from storage
    pub purged: u64,
}

/// Compaction scheduler
///
/// Eviction also runs inline before every recency-dependent read, so this
/// loop only bounds memory and storage for idle participants.
pub struct CompactionScheduler {
    service: Arc<QueueService>,
    maintenance: Arc<dyn Maintenance>,
    interval: Duration,
}

impl CompactionScheduler {
    /// Create a new compaction scheduler
    ///
    /// # Arguments
    /// * `service` - Queue whose participants are compacted
    /// * `maintenance` - Storage maintenance implementation
    /// * `interval` - Time between passes
    pub fn new(
        service: Arc<QueueService>,
        maintenance: Arc<dyn Maintenance>,
        interval: Duration,
    ) -> Self {
        Self {
            service,
            maintenance,
            interval,
        }
    }

    /// Run compaction until shutdown (background task)
    ///
    /// Should be spawned in tokio::spawn
    pub async fn run(self, mut shutdown: ShutdownToken) {
        info!(
            queue = %self.service.queue_id(),
            interval_secs = self.interval.as_secs(),
            "Compaction scheduler started"
        );

        let mut tick = interval(self.interval);
        // The first tick completes immediately
        tick.tick().await;

        loop {
            tokio::select! {
                _ = tick.tick() => {}
                _ = shutdown.wait() => {
                    info!(queue = %self.service.queue_id(), "Compaction scheduler stopped");
                    return;
                }
            }

            if let Err(e) = self.run_now().await {
                error!(error = ?e, "Scheduled compaction failed");
            }
        }
    }

    /// Run one pass immediately (for manual trigger)
    pub async fn run_now(&self) -> Result<CompactionReport> {
        let evicted = self.service.compact_all();

        let cutoff = self.service.history_cutoff();
        let purged = self
            .maintenance
            .purge_played_before(self.service.queue_id(), cutoff)
            .await?;

        info!(
            queue = %self.service.queue_id(),
            evicted = evicted,
            purged = purged,
            "Compaction completed"
        );

        Ok(CompactionReport { evicted, purged })
    }
}
