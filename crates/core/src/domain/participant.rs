// Participant Domain Model - one submitter's pending entries and history

use super::entry::{Entry, ParticipantId, Playtime};
use super::error::{DomainError, Result};
use super::history::EntryHistory;
use parking_lot::{Mutex, MutexGuard};
use std::collections::VecDeque;
use std::ops::Deref;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// One participant's pending entries (oldest first) and played history.
///
/// Invariant: an entry is in exactly one of `pending` / `history`.
#[derive(Debug, Default)]
pub struct ParticipantQueue {
    pending: VecDeque<Arc<Entry>>,
    history: EntryHistory,
}

impl ParticipantQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append to pending. Admission checks are the caller's job.
    pub fn submit(&mut self, entry: Arc<Entry>) -> Arc<Entry> {
        self.pending.push_back(Arc::clone(&entry));
        entry
    }

    /// Pop the oldest pending entry and move it to history.
    ///
    /// Expired history is evicted first.
    pub fn poll_one(&mut self, now_millis: i64, retention_ms: i64) -> Option<Arc<Entry>> {
        self.history.evict_expired(now_millis, retention_ms);
        let next = self.pending.pop_front()?;
        self.history.record_played(Arc::clone(&next));
        Some(next)
    }

    pub fn evict_expired(&mut self, now_millis: i64, retention_ms: i64) -> usize {
        self.history.evict_expired(now_millis, retention_ms)
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn count_pending(&self) -> usize {
        self.pending.len()
    }

    /// Newest pending entry, else newest played entry
    pub fn most_recent(&self) -> Option<&Arc<Entry>> {
        self.pending.back().or_else(|| self.history.newest())
    }

    /// Time since the most recent submission, `None` if there is none
    pub fn millis_since_last_submission(&self, now_millis: i64) -> Option<i64> {
        self.most_recent()
            .map(|entry| now_millis.saturating_sub(entry.submitted_at))
    }

    /// Sum of pending playtime
    pub fn pending_playtime(&self) -> Playtime {
        let mut total = Playtime::ZERO;
        for entry in &self.pending {
            total += entry.duration;
        }
        total
    }

    /// Oldest first
    pub fn pending(&self) -> impl Iterator<Item = &Arc<Entry>> {
        self.pending.iter()
    }

    pub fn history(&self) -> &EntryHistory {
        &self.history
    }

    fn remove_pending(&mut self, entry_id: &str) -> Option<Arc<Entry>> {
        let index = self.pending.iter().position(|e| e.id == entry_id)?;
        self.pending.remove(index)
    }

    fn clear_pending(&mut self) -> Vec<Arc<Entry>> {
        self.pending.drain(..).collect()
    }

    fn record_played(&mut self, entry: Arc<Entry>) {
        self.history.record_played(entry);
    }
}

/// Participant handle shared between the registry and the scheduler.
///
/// The pending/history pair sits behind the participant's own lock. Whether
/// the participant has played before is mirrored into an atomic so the
/// scheduler can read it without taking this lock.
#[derive(Debug)]
pub struct Participant {
    id: ParticipantId,
    queue: Mutex<ParticipantQueue>,
    played: AtomicBool,
}

impl Participant {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            queue: Mutex::new(ParticipantQueue::new()),
            played: AtomicBool::new(false),
        }
    }

    pub fn id(&self) -> &ParticipantId {
        &self.id
    }

    /// Whether the history is non-empty
    pub fn has_played(&self) -> bool {
        self.played.load(Ordering::Acquire)
    }

    /// Acquire this participant's lock. Released when the guard drops.
    ///
    /// Lock order: a participant lock is always taken before the scheduler
    /// lock or the admission gate lock.
    pub fn lock(&self) -> ParticipantLock<'_> {
        ParticipantLock {
            owner: self,
            queue: self.queue.lock(),
        }
    }
}

/// Exclusive access to one participant's entries
pub struct ParticipantLock<'a> {
    owner: &'a Participant,
    queue: MutexGuard<'a, ParticipantQueue>,
}

impl ParticipantLock<'_> {
    pub fn participant(&self) -> &Participant {
        self.owner
    }

    /// Append an accepted entry to pending
    pub fn submit(&mut self, entry: Arc<Entry>) -> Result<Arc<Entry>> {
        self.ensure_owned(&entry)?;
        if self.queue.pending.iter().any(|e| e.id == entry.id) {
            return Err(DomainError::DuplicateEntry(entry.id.clone()));
        }
        Ok(self.queue.submit(entry))
    }

    pub fn poll_one(&mut self, now_millis: i64, retention_ms: i64) -> Option<Arc<Entry>> {
        let next = self.queue.poll_one(now_millis, retention_ms);
        self.sync();
        next
    }

    pub fn evict_expired(&mut self, now_millis: i64, retention_ms: i64) -> usize {
        let evicted = self.queue.evict_expired(now_millis, retention_ms);
        self.sync();
        evicted
    }

    pub fn remove_pending(&mut self, entry_id: &str) -> Option<Arc<Entry>> {
        self.queue.remove_pending(entry_id)
    }

    pub fn clear_pending(&mut self) -> Vec<Arc<Entry>> {
        self.queue.clear_pending()
    }

    /// Re-load an entry that was played before a restart.
    ///
    /// Must be called oldest first.
    pub fn restore_played(&mut self, entry: Arc<Entry>) -> Result<()> {
        self.ensure_owned(&entry)?;
        self.queue.record_played(entry);
        self.sync();
        Ok(())
    }

    fn ensure_owned(&self, entry: &Entry) -> Result<()> {
        if entry.owner != self.owner.id {
            return Err(DomainError::ForeignEntry {
                entry_id: entry.id.clone(),
                owner: entry.owner.clone(),
                participant: self.owner.id.clone(),
            });
        }
        Ok(())
    }

    fn sync(&self) {
        self.owner
            .played
            .store(!self.queue.history.is_empty(), Ordering::Release);
    }
}

impl Deref for ParticipantLock<'_> {
    type Target = ParticipantQueue;

    fn deref(&self) -> &Self::Target {
        &self.queue
    }
}
