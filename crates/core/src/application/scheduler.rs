//! Fair Scheduler - orders participants for turn-taking
//!
//! The sequence holds participant handles, never entries. A participant is in
//! the sequence at most once. Participants that have never played are kept
//! ahead of every participant that has, in arrival order; participants that
//! have played join at the tail. Polling takes the head.
//!
//! Re-inserting a participant after its entry was popped (it now has history)
//! sends it to the tail, which gives round-robin with newcomer priority.

use crate::domain::Participant;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::debug;

/// Opaque handle the scheduler orders
pub trait Turn {
    /// Identity used for the uniqueness check
    fn turn_key(&self) -> &str;

    /// Whether this participant has completed at least one playback
    fn has_played(&self) -> bool;
}

impl Turn for Arc<Participant> {
    fn turn_key(&self) -> &str {
        self.id()
    }

    fn has_played(&self) -> bool {
        Participant::has_played(self)
    }
}

/// Position a participant joins at.
///
/// Played participants go to the tail. Newcomers go right before the first
/// participant that has played, or to the tail if there is none.
pub fn insertion_index<T: Turn>(sequence: &VecDeque<T>, joining_has_played: bool) -> usize {
    if joining_has_played {
        return sequence.len();
    }
    sequence
        .iter()
        .position(|t| t.has_played())
        .unwrap_or(sequence.len())
}

/// Master ordering of participants
pub struct FairScheduler<T> {
    sequence: Mutex<VecDeque<T>>,
}

impl<T: Turn + Clone> FairScheduler<T> {
    pub fn new() -> Self {
        Self {
            sequence: Mutex::new(VecDeque::new()),
        }
    }

    /// Insert a participant at its fair position.
    ///
    /// No-op if it is already queued. The membership test and the insert
    /// happen under one lock.
    ///
    /// # Returns
    /// true if the participant was inserted
    pub fn add(&self, handle: T) -> bool {
        let mut sequence = self.sequence.lock();
        if sequence.iter().any(|t| t.turn_key() == handle.turn_key()) {
            return false;
        }
        let index = insertion_index(&sequence, handle.has_played());
        debug!(
            participant_id = %handle.turn_key(),
            position = index,
            queued = sequence.len(),
            "Participant joined rotation"
        );
        sequence.insert(index, handle);
        true
    }

    /// Move a queued participant to the position its current played flag
    /// calls for. No-op if it is not queued.
    ///
    /// Used when the flag changed while the participant sat in the sequence.
    pub fn reposition(&self, handle: T) -> bool {
        let mut sequence = self.sequence.lock();
        let Some(current) = sequence
            .iter()
            .position(|t| t.turn_key() == handle.turn_key())
        else {
            return false;
        };
        sequence.remove(current);
        let index = insertion_index(&sequence, handle.has_played());
        sequence.insert(index, handle);
        true
    }

    /// Remove and return the head
    pub fn poll(&self) -> Option<T> {
        self.sequence.lock().pop_front()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.lock().is_empty()
    }

    pub fn len(&self) -> usize {
        self.sequence.lock().len()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.sequence.lock().iter().any(|t| t.turn_key() == key)
    }

    /// Take a participant out of the rotation
    pub fn remove(&self, key: &str) -> Option<T> {
        let mut sequence = self.sequence.lock();
        let index = sequence.iter().position(|t| t.turn_key() == key)?;
        sequence.remove(index)
    }

    /// Drop every participant. Returns how many were queued.
    pub fn clear(&self) -> usize {
        let mut sequence = self.sequence.lock();
        let n = sequence.len();
        sequence.clear();
        n
    }

    /// Keys from head to tail
    pub fn keys(&self) -> Vec<String> {
        self.sequence
            .lock()
            .iter()
            .map(|t| t.turn_key().to_string())
            .collect()
    }

    /// Handles from head to tail
    pub fn snapshot(&self) -> Vec<T> {
        self.sequence.lock().iter().cloned().collect()
    }
}

impl<T: Turn + Clone> Default for FairScheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[derive(Clone)]
    struct Slot {
        key: String,
        played: Arc<AtomicBool>,
    }

    impl Slot {
        fn new(key: &str, played: bool) -> Self {
            Self {
                key: key.to_string(),
                played: Arc::new(AtomicBool::new(played)),
            }
        }
    }

    impl Turn for Slot {
        fn turn_key(&self) -> &str {
            &self.key
        }

        fn has_played(&self) -> bool {
            self.played.load(Ordering::SeqCst)
        }
    }

    fn assert_newcomers_first(scheduler: &FairScheduler<Slot>) {
        let flags: Vec<bool> = scheduler.snapshot().iter().map(|s| s.has_played()).collect();
        let first_played = flags.iter().position(|&p| p).unwrap_or(flags.len());
        assert!(
            flags[first_played..].iter().all(|&p| p),
            "newcomer found behind a played participant: {:?}",
            flags
        );
    }

    #[test]
    fn test_insertion_index_empty() {
        let sequence: VecDeque<Slot> = VecDeque::new();
        assert_eq!(insertion_index(&sequence, false), 0);
        assert_eq!(insertion_index(&sequence, true), 0);
    }

    #[test]
    fn test_insertion_index_before_first_played() {
        let sequence: VecDeque<Slot> = vec![
            Slot::new("a", false),
            Slot::new("b", false),
            Slot::new("c", true),
            Slot::new("d", false),
        ]
        .into();
        assert_eq!(insertion_index(&sequence, false), 2);
        assert_eq!(insertion_index(&sequence, true), 4);
    }

    #[test]
    fn test_add_is_unique() {
        let scheduler = FairScheduler::new();
        assert!(scheduler.add(Slot::new("a", false)));
        assert!(!scheduler.add(Slot::new("a", false)));
        assert!(!scheduler.add(Slot::new("a", true)));
        assert_eq!(scheduler.len(), 1);
    }

    #[test]
    fn test_newcomer_polled_before_played() {
        let scheduler = FairScheduler::new();
        scheduler.add(Slot::new("returning", true));
        scheduler.add(Slot::new("newcomer", false));

        assert_eq!(scheduler.poll().unwrap().key, "newcomer");
        assert_eq!(scheduler.poll().unwrap().key, "returning");
        assert!(scheduler.poll().is_none());
    }

    #[test]
    fn test_newcomers_keep_arrival_order() {
        let scheduler = FairScheduler::new();
        scheduler.add(Slot::new("x", true));
        scheduler.add(Slot::new("a", false));
        scheduler.add(Slot::new("b", false));
        scheduler.add(Slot::new("y", true));
        scheduler.add(Slot::new("c", false));

        assert_eq!(scheduler.keys(), vec!["a", "b", "c", "x", "y"]);
        assert_newcomers_first(&scheduler);
    }

    #[test]
    fn test_round_robin_rotation() {
        let scheduler = FairScheduler::new();
        let a = Slot::new("a", false);
        let b = Slot::new("b", false);
        let c = Slot::new("c", false);
        scheduler.add(a.clone());
        scheduler.add(b.clone());
        scheduler.add(c.clone());

        // Each one plays then rejoins, twice around
        let mut order = Vec::new();
        for _ in 0..6 {
            let next = scheduler.poll().unwrap();
            next.played.store(true, Ordering::SeqCst);
            order.push(next.key.clone());
            scheduler.add(next);
        }
        assert_eq!(order, vec!["a", "b", "c", "a", "b", "c"]);
    }

    #[test]
    fn test_late_joiner_cuts_ahead_of_rotated() {
        let scheduler = FairScheduler::new();
        scheduler.add(Slot::new("a", false));
        scheduler.add(Slot::new("b", false));

        let a = scheduler.poll().unwrap();
        a.played.store(true, Ordering::SeqCst);
        scheduler.add(a);

        scheduler.add(Slot::new("late", false));
        assert_eq!(scheduler.keys(), vec!["b", "late", "a"]);
    }

    #[test]
    fn test_invariants_hold_over_mixed_operations() {
        let scheduler: FairScheduler<Slot> = FairScheduler::new();
        let pool: Vec<Slot> = (0..12)
            .map(|i| Slot::new(&format!("p{}", i), i % 3 == 0))
            .collect();

        // Deterministic pseudo-random walk over add/poll
        let mut seed: u64 = 0x5eed;
        for _ in 0..500 {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            let pick = (seed >> 33) as usize % pool.len();
            if seed % 4 == 0 {
                if let Some(polled) = scheduler.poll() {
                    polled.played.store(true, Ordering::SeqCst);
                }
            } else {
                scheduler.add(pool[pick].clone());
            }

            let mut keys = scheduler.keys();
            let before = keys.len();
            keys.sort();
            keys.dedup();
            assert_eq!(keys.len(), before, "participant queued twice");
            assert_newcomers_first(&scheduler);
        }
    }

    #[test]
    fn test_concurrent_add_inserts_once() {
        let scheduler = Arc::new(FairScheduler::<Slot>::new());
        let slot = Slot::new("racer", false);

        let handles: Vec<_> = (0..32)
            .map(|_| {
                let scheduler = Arc::clone(&scheduler);
                let slot = slot.clone();
                std::thread::spawn(move || scheduler.add(slot))
            })
            .collect();

        let inserted = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|&inserted| inserted)
            .count();

        assert_eq!(inserted, 1);
        assert_eq!(scheduler.len(), 1);
    }

    #[test]
    fn test_reposition_follows_flag() {
        let scheduler = FairScheduler::new();
        let a = Slot::new("a", false);
        scheduler.add(a.clone());
        scheduler.add(Slot::new("b", false));
        scheduler.add(Slot::new("c", true));

        a.played.store(true, Ordering::SeqCst);
        assert!(scheduler.reposition(a));
        assert_eq!(scheduler.keys(), vec!["b", "c", "a"]);
        assert_newcomers_first(&scheduler);

        assert!(!scheduler.reposition(Slot::new("d", false)));
        assert_eq!(scheduler.len(), 3);
    }

    #[test]
    fn test_remove_and_clear() {
        let scheduler = FairScheduler::new();
        scheduler.add(Slot::new("a", false));
        scheduler.add(Slot::new("b", false));

        assert_eq!(scheduler.remove("a").unwrap().key, "a");
        assert!(scheduler.remove("a").is_none());
        assert!(!scheduler.contains("a"));
        assert_eq!(scheduler.clear(), 1);
        assert!(scheduler.is_empty());
    }
}
