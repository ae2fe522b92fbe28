// Engine settings shared by the queue service and its background tasks

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Played entries older than this stop counting for cooldown and
/// "has played" (300 minutes)
pub const DEFAULT_HISTORY_RETENTION_MS: i64 = 300 * 60 * 1000;

/// How often the compaction scheduler runs (10 minutes)
pub const DEFAULT_COMPACTION_INTERVAL_SECS: u64 = 600;

/// Attempts for a submission that hit a duplicate-key conflict
pub const DEFAULT_DUPLICATE_RETRY_ATTEMPTS: u32 = 3;

/// Base backoff between duplicate-conflict retries
pub const DEFAULT_DUPLICATE_RETRY_BASE_DELAY_MS: u64 = 500;

/// Engine tuning knobs. Per-queue admission limits live in `QueueConfig`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub history_retention_ms: i64,
    pub compaction_interval_secs: u64,
    pub duplicate_retry_attempts: u32,
    pub duplicate_retry_base_delay_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            history_retention_ms: DEFAULT_HISTORY_RETENTION_MS,
            compaction_interval_secs: DEFAULT_COMPACTION_INTERVAL_SECS,
            duplicate_retry_attempts: DEFAULT_DUPLICATE_RETRY_ATTEMPTS,
            duplicate_retry_base_delay_ms: DEFAULT_DUPLICATE_RETRY_BASE_DELAY_MS,
        }
    }
}

impl Settings {
    pub fn compaction_interval(&self) -> Duration {
        Duration::from_secs(self.compaction_interval_secs.max(1))
    }
}
