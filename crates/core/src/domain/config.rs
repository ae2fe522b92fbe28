// Queue Configuration Domain Model

use super::entry::{ParticipantId, QueueId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Per-queue admission limits.
///
/// Every limit is optional: `None` (or `0`) means unlimited.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueConfig {
    pub entry_duration_max_seconds: Option<u64>,
    pub entry_duration_min_seconds: Option<u64>,
    pub cooldown_seconds: Option<u64>,
    pub submission_max_quantity: Option<u64>,

    /// Total pending playtime at which the queue closes itself
    pub queue_duration_seconds: Option<u64>,

    #[serde(default)]
    pub blacklisted_ids: BTreeSet<ParticipantId>,
}

/// Treat `0` as "no limit", matching how limits are cleared in the store
fn limit(value: Option<u64>) -> Option<u64> {
    value.filter(|&n| n > 0)
}

impl QueueConfig {
    pub fn max_entry_seconds(&self) -> Option<u64> {
        limit(self.entry_duration_max_seconds)
    }

    pub fn min_entry_seconds(&self) -> Option<u64> {
        limit(self.entry_duration_min_seconds)
    }

    pub fn cooldown_seconds(&self) -> Option<u64> {
        limit(self.cooldown_seconds)
    }

    pub fn max_submissions(&self) -> Option<u64> {
        limit(self.submission_max_quantity)
    }

    pub fn queue_cap_seconds(&self) -> Option<u64> {
        limit(self.queue_duration_seconds)
    }

    pub fn is_blacklisted(&self, participant: &str) -> bool {
        self.blacklisted_ids.contains(participant)
    }

    /// Apply a partial update. Fields left `None` in the patch are kept.
    pub fn apply(&mut self, patch: &QueueConfigPatch) {
        if let Some(v) = patch.entry_duration_max_seconds {
            self.entry_duration_max_seconds = v;
        }
        if let Some(v) = patch.entry_duration_min_seconds {
            self.entry_duration_min_seconds = v;
        }
        if let Some(v) = patch.cooldown_seconds {
            self.cooldown_seconds = v;
        }
        if let Some(v) = patch.submission_max_quantity {
            self.submission_max_quantity = v;
        }
        if let Some(v) = patch.queue_duration_seconds {
            self.queue_duration_seconds = v;
        }
    }
}

/// Partial config update
///
/// Outer `None` = keep the stored value, `Some(None)` = clear to unlimited.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueConfigPatch {
    pub entry_duration_max_seconds: Option<Option<u64>>,
    pub entry_duration_min_seconds: Option<Option<u64>>,
    pub cooldown_seconds: Option<Option<u64>>,
    pub submission_max_quantity: Option<Option<u64>>,
    pub queue_duration_seconds: Option<Option<u64>>,
}

/// Stored queue record: config plus the open/closed gate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueRecord {
    pub queue: QueueId,
    pub config: QueueConfig,
    pub is_open: bool,
}

impl QueueRecord {
    /// Queues start open with no limits
    pub fn new(queue: impl Into<String>) -> Self {
        Self {
            queue: queue.into(),
            config: QueueConfig::default(),
            is_open: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_limit_means_unlimited() {
        let config = QueueConfig {
            entry_duration_max_seconds: Some(0),
            submission_max_quantity: Some(0),
            queue_duration_seconds: Some(0),
            ..Default::default()
        };
        assert_eq!(config.max_entry_seconds(), None);
        assert_eq!(config.max_submissions(), None);
        assert_eq!(config.queue_cap_seconds(), None);
    }

    #[test]
    fn test_apply_patch_keeps_and_clears() {
        let mut config = QueueConfig {
            entry_duration_max_seconds: Some(600),
            cooldown_seconds: Some(30),
            ..Default::default()
        };

        config.apply(&QueueConfigPatch {
            cooldown_seconds: Some(None),
            submission_max_quantity: Some(Some(3)),
            ..Default::default()
        });

        assert_eq!(config.entry_duration_max_seconds, Some(600));
        assert_eq!(config.cooldown_seconds, None);
        assert_eq!(config.submission_max_quantity, Some(3));
    }
}
