// Entry Domain Model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::AddAssign;

/// Entry ID (UUID v4)
pub type EntryId = String;

/// Participant identifier (stable, externally assigned)
pub type ParticipantId = String;

/// Queue scope identifier
pub type QueueId = String;

/// How long an entry plays.
///
/// `Unbounded` stands for live or endless content and orders above every
/// finite value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Playtime {
    Seconds(u64),
    Unbounded,
}

impl Playtime {
    pub const ZERO: Playtime = Playtime::Seconds(0);

    pub fn seconds(secs: u64) -> Self {
        Playtime::Seconds(secs)
    }

    pub fn is_unbounded(&self) -> bool {
        matches!(self, Playtime::Unbounded)
    }

    /// Finite seconds, or `None` for unbounded content
    pub fn as_secs(&self) -> Option<u64> {
        match self {
            Playtime::Seconds(s) => Some(*s),
            Playtime::Unbounded => None,
        }
    }

    /// `f64` view, `+inf` for unbounded content
    pub fn as_secs_f64(&self) -> f64 {
        match self {
            Playtime::Seconds(s) => *s as f64,
            Playtime::Unbounded => f64::INFINITY,
        }
    }
}

impl Default for Playtime {
    fn default() -> Self {
        Playtime::ZERO
    }
}

impl AddAssign for Playtime {
    fn add_assign(&mut self, rhs: Self) {
        *self = match (*self, rhs) {
            (Playtime::Seconds(a), Playtime::Seconds(b)) => Playtime::Seconds(a.saturating_add(b)),
            _ => Playtime::Unbounded,
        };
    }
}

impl fmt::Display for Playtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Playtime::Seconds(s) => write!(f, "{}:{:02}", s / 60, s % 60),
            Playtime::Unbounded => write!(f, "live"),
        }
    }
}

/// Entry Entity
///
/// Immutable once created. Shared as `Arc<Entry>` and moved between a
/// participant's pending list and history, never copied or mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub id: EntryId,
    pub queue: QueueId,
    pub owner: ParticipantId,

    /// Opaque link or identifier the entry was submitted with
    pub source_ref: String,
    pub title: Option<String>,
    pub duration: Playtime,

    pub submitted_at: i64, // epoch ms
}

impl Entry {
    /// Create a new Entry
    ///
    /// # Arguments
    ///
    /// * `id` - Unique entry ID (injected, not generated)
    /// * `queue` - Queue scope the entry belongs to
    /// * `owner` - Submitting participant
    /// * `source_ref` - Submitted link or identifier
    /// * `duration` - Resolved playtime
    /// * `submitted_at` - Submission timestamp in epoch ms (injected, not system time)
    pub fn new(
        id: impl Into<String>,
        queue: impl Into<String>,
        owner: impl Into<String>,
        source_ref: impl Into<String>,
        duration: Playtime,
        submitted_at: i64,
    ) -> Self {
        Self {
            id: id.into(),
            queue: queue.into(),
            owner: owner.into(),
            source_ref: source_ref.into(),
            title: None,
            duration,
            submitted_at,
        }
    }

    pub fn with_title(mut self, title: Option<String>) -> Self {
        self.title = title;
        self
    }

    /// Create a test entry with a deterministic ID (for tests only)
    ///
    /// IDs are `entry-1`, `entry-2`, ... across the whole process.
    pub fn new_test(owner: impl Into<String>, duration: Playtime, submitted_at: i64) -> Self {
        use std::sync::atomic::{AtomicU64, Ordering};
        static TEST_COUNTER: AtomicU64 = AtomicU64::new(1);

        let counter = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
        Self::new(
            format!("entry-{}", counter),
            "test_queue",
            owner,
            format!("https://example.test/track/{}", counter),
            duration,
            submitted_at,
        )
    }
}
