// Admission Decision Model

use super::entry::Entry;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Why a submission was turned away.
///
/// Checks run in declaration order; only the first failure is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RejectionReason {
    QueueClosed,
    Blacklisted,
    TooLong,
    TooShort,
    CooldownActive,
    QuotaExceeded,
}

impl RejectionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectionReason::QueueClosed => "QUEUE_CLOSED",
            RejectionReason::Blacklisted => "BLACKLISTED",
            RejectionReason::TooLong => "TOO_LONG",
            RejectionReason::TooShort => "TOO_SHORT",
            RejectionReason::CooldownActive => "COOLDOWN_ACTIVE",
            RejectionReason::QuotaExceeded => "QUOTA_EXCEEDED",
        }
    }
}

impl std::fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one submission attempt
#[derive(Debug, Clone)]
pub enum Decision {
    Accepted {
        entry: Arc<Entry>,
        /// Gate state after this acceptance (false = this entry closed the queue)
        is_open: bool,
    },
    Rejected(RejectionReason),
}

impl Decision {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Decision::Accepted { .. })
    }

    pub fn rejection(&self) -> Option<RejectionReason> {
        match self {
            Decision::Rejected(reason) => Some(*reason),
            Decision::Accepted { .. } => None,
        }
    }

    pub fn entry(&self) -> Option<&Arc<Entry>> {
        match self {
            Decision::Accepted { entry, .. } => Some(entry),
            Decision::Rejected(_) => None,
        }
    }
}
