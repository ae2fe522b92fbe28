// Entry History - already-played entries, bounded by age

use super::entry::Entry;
use std::collections::VecDeque;
use std::sync::Arc;

/// Played entries, newest first.
///
/// Kept ordered by submission time so eviction only ever trims the old end.
#[derive(Debug, Default, Clone)]
pub struct EntryHistory {
    entries: VecDeque<Arc<Entry>>,
}

impl EntryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a just-played entry at the front
    pub fn record_played(&mut self, entry: Arc<Entry>) {
        self.entries.push_front(entry);
    }

    /// Drop entries submitted before `now_millis - max_age_ms`
    ///
    /// Idempotent. Stops at the first entry still inside the window.
    ///
    /// # Returns
    /// Number of entries evicted
    pub fn evict_expired(&mut self, now_millis: i64, max_age_ms: i64) -> usize {
        let oldest_allowed = now_millis.saturating_sub(max_age_ms);
        let mut evicted = 0;
        while let Some(oldest) = self.entries.back() {
            if oldest.submitted_at >= oldest_allowed {
                break;
            }
            self.entries.pop_back();
            evicted += 1;
        }
        evicted
    }

    pub fn newest(&self) -> Option<&Arc<Entry>> {
        self.entries.front()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Newest first
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Entry>> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Playtime;

    fn played(at: i64) -> Arc<Entry> {
        Arc::new(Entry::new_test("alice", Playtime::seconds(60), at))
    }

    #[test]
    fn test_record_played_keeps_newest_first() {
        let mut history = EntryHistory::new();
        history.record_played(played(1_000));
        history.record_played(played(2_000));

        assert_eq!(history.newest().unwrap().submitted_at, 2_000);
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn test_evict_expired_trims_old_end_only() {
        let mut history = EntryHistory::new();
        for at in [1_000, 2_000, 3_000, 4_000] {
            history.record_played(played(at));
        }

        // window = [2_500, 5_000]
        let evicted = history.evict_expired(5_000, 2_500);
        assert_eq!(evicted, 2);
        let left: Vec<i64> = history.iter().map(|e| e.submitted_at).collect();
        assert_eq!(left, vec![4_000, 3_000]);

        // Idempotent
        assert_eq!(history.evict_expired(5_000, 2_500), 0);
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn test_evict_expired_can_empty_history() {
        let mut history = EntryHistory::new();
        history.record_played(played(0));
        history.evict_expired(10_000, 1_000);
        assert!(history.is_empty());
        assert!(history.newest().is_none());
    }
}
