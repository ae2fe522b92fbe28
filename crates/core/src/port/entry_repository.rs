// Entry Repository Port (Interface)

use crate::domain::{Entry, EntryId};
use crate::error::Result;
use async_trait::async_trait;

/// Repository interface for Entry persistence
///
/// Rows are keyed by (queue, owner, submitted_at). An insert that collides on
/// that key fails with `AppError::DuplicateSubmission`.
#[async_trait]
pub trait EntryRepository: Send + Sync {
    /// Insert a new pending entry
    async fn insert(&self, entry: &Entry) -> Result<()>;

    /// Delete a pending entry. Returns false if no pending entry has this id.
    async fn remove(&self, entry_id: &EntryId) -> Result<bool>;

    /// Mark a pending entry as played
    async fn mark_played(&self, entry_id: &EntryId, played_at: i64) -> Result<()>;

    /// All pending entries of a queue, in submission order
    async fn fetch_pending(&self, queue: &str) -> Result<Vec<Entry>>;

    /// Played entries submitted at or after `since_millis`, oldest first
    async fn fetch_played_since(&self, queue: &str, since_millis: i64) -> Result<Vec<Entry>>;

    /// Number of pending entries in a queue
    async fn count_pending(&self, queue: &str) -> Result<i64>;

    /// Delete every pending entry of a queue
    async fn clear_pending(&self, queue: &str) -> Result<u64>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use crate::error::AppError;
    use crate::port::transaction::{
        EntryRepositoryTransaction, Transaction, TransactionalEntryRepository,
    };
    use parking_lot::Mutex;
    use std::collections::BTreeSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Debug, Clone)]
    struct StoredEntry {
        entry: Entry,
        played_at: Option<i64>,
    }

    #[derive(Debug, Default)]
    struct StoreState {
        entries: Vec<StoredEntry>,
        queues: BTreeSet<String>,
    }

    impl StoreState {
        fn check_unique(&self, entry: &Entry) -> Result<()> {
            let clash = self.entries.iter().any(|s| {
                s.entry.queue == entry.queue
                    && s.entry.owner == entry.owner
                    && s.entry.submitted_at == entry.submitted_at
            });
            if clash {
                return Err(AppError::DuplicateSubmission {
                    participant_id: entry.owner.clone(),
                    submitted_at: entry.submitted_at,
                });
            }
            Ok(())
        }
    }

    /// In-memory entry store with failure injection
    #[derive(Clone, Default)]
    pub struct InMemoryEntryRepository {
        state: Arc<Mutex<StoreState>>,
        forced_failures: Arc<AtomicUsize>,
    }

    impl InMemoryEntryRepository {
        pub fn new() -> Self {
            Self::default()
        }

        /// Make the next `n` inserts fail with a persistence error
        pub fn fail_next_inserts(&self, n: usize) {
            self.forced_failures.store(n, Ordering::SeqCst);
        }

        /// Queues that have been ensured through a transaction
        pub fn known_queues(&self) -> Vec<String> {
            self.state.lock().queues.iter().cloned().collect()
        }

        pub fn stored_count(&self) -> usize {
            self.state.lock().entries.len()
        }

        fn take_forced_failure(&self) -> bool {
            self.forced_failures
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
        }
    }

    #[async_trait]
    impl EntryRepository for InMemoryEntryRepository {
        async fn insert(&self, entry: &Entry) -> Result<()> {
            if self.take_forced_failure() {
                return Err(AppError::Persistence("injected insert failure".to_string()));
            }
            let mut state = self.state.lock();
            state.check_unique(entry)?;
            state.entries.push(StoredEntry {
                entry: entry.clone(),
                played_at: None,
            });
            Ok(())
        }

        async fn remove(&self, entry_id: &EntryId) -> Result<bool> {
            let mut state = self.state.lock();
            let before = state.entries.len();
            state
                .entries
                .retain(|s| &s.entry.id != entry_id || s.played_at.is_some());
            Ok(state.entries.len() != before)
        }

        async fn mark_played(&self, entry_id: &EntryId, played_at: i64) -> Result<()> {
            let mut state = self.state.lock();
            match state.entries.iter_mut().find(|s| &s.entry.id == entry_id) {
                Some(stored) => {
                    stored.played_at = Some(played_at);
                    Ok(())
                }
                None => Err(AppError::NotFound(format!("Entry {} not found", entry_id))),
            }
        }

        async fn fetch_pending(&self, queue: &str) -> Result<Vec<Entry>> {
            let state = self.state.lock();
            let mut pending: Vec<Entry> = state
                .entries
                .iter()
                .filter(|s| s.entry.queue == queue && s.played_at.is_none())
                .map(|s| s.entry.clone())
                .collect();
            pending.sort_by_key(|e| e.submitted_at);
            Ok(pending)
        }

        async fn fetch_played_since(&self, queue: &str, since_millis: i64) -> Result<Vec<Entry>> {
            let state = self.state.lock();
            let mut played: Vec<Entry> = state
                .entries
                .iter()
                .filter(|s| {
                    s.entry.queue == queue
                        && s.played_at.is_some()
                        && s.entry.submitted_at >= since_millis
                })
                .map(|s| s.entry.clone())
                .collect();
            played.sort_by_key(|e| e.submitted_at);
            Ok(played)
        }

        async fn count_pending(&self, queue: &str) -> Result<i64> {
            Ok(self.fetch_pending(queue).await?.len() as i64)
        }

        async fn clear_pending(&self, queue: &str) -> Result<u64> {
            let mut state = self.state.lock();
            let before = state.entries.len();
            state
                .entries
                .retain(|s| !(s.entry.queue == queue && s.played_at.is_none()));
            Ok((before - state.entries.len()) as u64)
        }
    }

    /// Buffered writes, applied on commit
    pub struct InMemoryTransaction {
        repo: InMemoryEntryRepository,
        queues: Vec<String>,
        entries: Vec<Entry>,
    }

    #[async_trait]
    impl Transaction for InMemoryTransaction {
        async fn commit(self: Box<Self>) -> Result<()> {
            let InMemoryTransaction {
                repo,
                queues,
                entries,
            } = *self;
            let mut state = repo.state.lock();
            for entry in &entries {
                state.check_unique(entry)?;
            }
            state.queues.extend(queues);
            for entry in entries {
                state.entries.push(StoredEntry {
                    entry,
                    played_at: None,
                });
            }
            Ok(())
        }

        async fn rollback(self: Box<Self>) -> Result<()> {
            Ok(())
        }
    }

    #[async_trait]
    impl EntryRepositoryTransaction for InMemoryTransaction {
        async fn ensure_queue(&mut self, queue: &str) -> Result<()> {
            self.queues.push(queue.to_string());
            Ok(())
        }

        async fn insert(&mut self, entry: &Entry) -> Result<()> {
            if self.repo.take_forced_failure() {
                return Err(AppError::Persistence("injected insert failure".to_string()));
            }
            self.repo.state.lock().check_unique(entry)?;
            self.entries.push(entry.clone());
            Ok(())
        }
    }

    #[async_trait]
    impl TransactionalEntryRepository for InMemoryEntryRepository {
        async fn begin_transaction(&self) -> Result<Box<dyn EntryRepositoryTransaction>> {
            Ok(Box::new(InMemoryTransaction {
                repo: self.clone(),
                queues: Vec::new(),
                entries: Vec::new(),
            }))
        }
    }
}
