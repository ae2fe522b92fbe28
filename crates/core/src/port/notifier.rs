// Notifier Port - after-the-fact announcements of queue decisions

use crate::domain::{Entry, ParticipantId, QueueId, RejectionReason};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

/// Something the outside world may want to hear about
#[derive(Debug, Clone, PartialEq)]
pub enum QueueEvent {
    Accepted {
        queue: QueueId,
        entry: Arc<Entry>,
        is_open: bool,
    },
    Rejected {
        queue: QueueId,
        participant_id: ParticipantId,
        source_ref: String,
        reason: RejectionReason,
    },
    Opened {
        queue: QueueId,
    },
    Closed {
        queue: QueueId,
        /// true when closed by the playtime cap rather than an admin
        automatic: bool,
    },
}

/// Notification sink
///
/// Never consulted for decisions. Failures are logged by the caller and do
/// not undo anything.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, event: &QueueEvent) -> Result<()>;
}

/// Notifier that writes events to the tracing log
pub struct TracingNotifier;

#[async_trait]
impl Notifier for TracingNotifier {
    async fn notify(&self, event: &QueueEvent) -> Result<()> {
        match event {
            QueueEvent::Accepted {
                queue,
                entry,
                is_open,
            } => info!(
                queue = %queue,
                participant_id = %entry.owner,
                entry_id = %entry.id,
                source_ref = %entry.source_ref,
                duration = %entry.duration,
                is_open = is_open,
                "Submission added"
            ),
            QueueEvent::Rejected {
                queue,
                participant_id,
                source_ref,
                reason,
            } => info!(
                queue = %queue,
                participant_id = %participant_id,
                source_ref = %source_ref,
                reason = %reason,
                "Submission denied"
            ),
            QueueEvent::Opened { queue } => info!(queue = %queue, "Queue opened"),
            QueueEvent::Closed { queue, automatic } => {
                info!(queue = %queue, automatic = automatic, "Queue closed")
            }
        }
        Ok(())
    }
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use parking_lot::Mutex;

    /// Keeps every event it receives
    #[derive(Default)]
    pub struct RecordingNotifier {
        events: Mutex<Vec<QueueEvent>>,
    }

    impl RecordingNotifier {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn events(&self) -> Vec<QueueEvent> {
            self.events.lock().clone()
        }

        pub fn rejections(&self) -> Vec<RejectionReason> {
            self.events
                .lock()
                .iter()
                .filter_map(|e| match e {
                    QueueEvent::Rejected { reason, .. } => Some(*reason),
                    _ => None,
                })
                .collect()
        }

        pub fn count_closed(&self) -> usize {
            self.events
                .lock()
                .iter()
                .filter(|e| matches!(e, QueueEvent::Closed { .. }))
                .count()
        }
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn notify(&self, event: &QueueEvent) -> Result<()> {
            self.events.lock().push(event.clone());
            Ok(())
        }
    }
}
