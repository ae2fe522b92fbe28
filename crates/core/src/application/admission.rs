//! Admission Controller - accept/reject decisions and the open/closed gate
//!
//! Checks run in a fixed order and the first failure wins:
//! 1. queue open
//! 2. participant not blacklisted
//! 3. duration <= max (inclusive)
//! 4. duration >= min (inclusive)
//! 5. cooldown elapsed since the participant's most recent submission
//! 6. pending count below the quota
//!
//! The gate closes itself when an accepted entry brings the total pending
//! playtime to or past the configured cap. Only an explicit `open()` reopens it.

use crate::domain::{Entry, ParticipantQueue, Playtime, QueueConfig, RejectionReason};
use parking_lot::Mutex;
use tracing::{debug, info};

/// Run the admission checks against a participant's current state
pub fn evaluate(
    candidate: &Entry,
    participant: &ParticipantQueue,
    config: &QueueConfig,
    is_open: bool,
    now_millis: i64,
) -> Result<(), RejectionReason> {
    if !is_open {
        return Err(RejectionReason::QueueClosed);
    }

    if config.is_blacklisted(&candidate.owner) {
        return Err(RejectionReason::Blacklisted);
    }

    if let Some(max) = config.max_entry_seconds() {
        if candidate.duration > Playtime::Seconds(max) {
            return Err(RejectionReason::TooLong);
        }
    }

    if let Some(min) = config.min_entry_seconds() {
        if candidate.duration < Playtime::Seconds(min) {
            return Err(RejectionReason::TooShort);
        }
    }

    if let Some(cooldown) = config.cooldown_seconds() {
        if let Some(elapsed_ms) = participant.millis_since_last_submission(now_millis) {
            let cooldown_ms = i64::try_from(cooldown.saturating_mul(1000)).unwrap_or(i64::MAX);
            if elapsed_ms < cooldown_ms {
                debug!(
                    participant_id = %candidate.owner,
                    elapsed_ms = elapsed_ms,
                    cooldown_ms = cooldown_ms,
                    "Cooldown still active"
                );
                return Err(RejectionReason::CooldownActive);
            }
        }
    }

    if let Some(max) = config.max_submissions() {
        if participant.count_pending() as u64 >= max {
            return Err(RejectionReason::QuotaExceeded);
        }
    }

    Ok(())
}

/// Sum of pending playtime across all participants.
///
/// Unbounded entries are counted separately so that removing one gives back
/// a finite total.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AggregatePlaytime {
    finite_secs: u64,
    unbounded: usize,
}

impl AggregatePlaytime {
    pub fn add(&mut self, duration: Playtime) {
        match duration {
            Playtime::Seconds(s) => self.finite_secs = self.finite_secs.saturating_add(s),
            Playtime::Unbounded => self.unbounded += 1,
        }
    }

    pub fn remove(&mut self, duration: Playtime) {
        match duration {
            Playtime::Seconds(s) => self.finite_secs = self.finite_secs.saturating_sub(s),
            Playtime::Unbounded => self.unbounded = self.unbounded.saturating_sub(1),
        }
    }

    pub fn total(&self) -> Playtime {
        if self.unbounded > 0 {
            Playtime::Unbounded
        } else {
            Playtime::Seconds(self.finite_secs)
        }
    }

    /// Whether the total is at or over `cap_secs`
    pub fn reaches(&self, cap_secs: u64) -> bool {
        self.total() >= Playtime::Seconds(cap_secs)
    }
}

/// Gate state guarded by the controller's lock
#[derive(Debug, Clone, Copy)]
struct QueueGate {
    is_open: bool,
    pending: AggregatePlaytime,
}

/// Result of a successful admission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Admission {
    /// Gate state after this admission
    pub is_open: bool,
    /// This admission tripped the playtime cap
    pub closed_now: bool,
}

/// Owns the open/closed gate and the aggregate pending playtime.
///
/// Lock order: callers hold the participant lock first. The gate lock is
/// never held together with the scheduler lock.
pub struct AdmissionController {
    gate: Mutex<QueueGate>,
}

impl AdmissionController {
    /// Create a controller. Queues start open unless restored otherwise.
    pub fn new(is_open: bool) -> Self {
        Self {
            gate: Mutex::new(QueueGate {
                is_open,
                pending: AggregatePlaytime::default(),
            }),
        }
    }

    pub fn is_open(&self) -> bool {
        self.gate.lock().is_open
    }

    pub fn pending_playtime(&self) -> Playtime {
        self.gate.lock().pending.total()
    }

    /// Read-only pre-check, used before any I/O
    pub fn check(
        &self,
        candidate: &Entry,
        participant: &ParticipantQueue,
        config: &QueueConfig,
        now_millis: i64,
    ) -> Result<(), RejectionReason> {
        let is_open = self.gate.lock().is_open;
        evaluate(candidate, participant, config, is_open, now_millis)
    }

    /// Re-run the checks and, if they pass, reserve the entry's playtime.
    ///
    /// The caller must hold the participant's lock and append the entry to
    /// its pending list before releasing it. Closes the gate when the cap is
    /// reached.
    pub fn admit(
        &self,
        candidate: &Entry,
        participant: &ParticipantQueue,
        config: &QueueConfig,
        now_millis: i64,
    ) -> Result<Admission, RejectionReason> {
        let mut gate = self.gate.lock();
        evaluate(candidate, participant, config, gate.is_open, now_millis)?;

        gate.pending.add(candidate.duration);

        let closed_now = match config.queue_cap_seconds() {
            Some(cap) if gate.pending.reaches(cap) => {
                gate.is_open = false;
                info!(
                    queue = %candidate.queue,
                    cap_secs = cap,
                    pending = %gate.pending.total(),
                    "Queue playtime cap reached, closing queue"
                );
                true
            }
            _ => false,
        };

        Ok(Admission {
            is_open: gate.is_open,
            closed_now,
        })
    }

    /// Give back the playtime of an entry that left the pending set
    pub fn release(&self, duration: Playtime) {
        self.gate.lock().pending.remove(duration);
    }

    /// Returns true if the gate changed
    pub fn open(&self) -> bool {
        let mut gate = self.gate.lock();
        let changed = !gate.is_open;
        gate.is_open = true;
        changed
    }

    /// Returns true if the gate changed
    pub fn close(&self) -> bool {
        let mut gate = self.gate.lock();
        let changed = gate.is_open;
        gate.is_open = false;
        changed
    }

    /// Replace the gate state wholesale (restore, clear)
    pub fn reset(&self, is_open: bool, pending: AggregatePlaytime) {
        let mut gate = self.gate.lock();
        gate.is_open = is_open;
        gate.pending = pending;
    }
}
