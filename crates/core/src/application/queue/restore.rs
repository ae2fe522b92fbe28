// Restore Use Case - rebuild in-memory state after a restart

use super::QueueService;
use crate::application::admission::AggregatePlaytime;
use crate::error::{AppError, Result};
use std::sync::Arc;
use tracing::info;

/// What `restore` loaded
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestoreReport {
    pub participants: usize,
    pub pending: usize,
    pub played: usize,
    pub is_open: bool,
}

/// Load the gate, recent history and pending entries from the store.
///
/// History is limited to the retention window and replayed oldest first.
/// Pending entries are replayed in submission order through the scheduler's
/// normal `add`, so the rebuilt rotation follows the same fairness rule.
///
/// # Errors
/// - `InvariantViolation` if the service already holds participants
pub(super) async fn execute(service: &QueueService) -> Result<RestoreReport> {
    if !service.registry.is_empty() {
        return Err(AppError::InvariantViolation(
            "restore called on a queue that already holds participants".to_string(),
        ));
    }

    let record = service.ports.config.load(&service.queue).await?;
    let now = service.ports.clock.now_millis();
    let since = now.saturating_sub(service.settings.history_retention_ms);

    let played = service
        .ports
        .entries
        .fetch_played_since(&service.queue, since)
        .await?;
    let pending = service.ports.entries.fetch_pending(&service.queue).await?;

    let mut report = RestoreReport {
        played: played.len(),
        pending: pending.len(),
        is_open: record.is_open,
        ..Default::default()
    };

    for entry in played {
        let participant = service.registry.get_or_create(&entry.owner);
        participant.lock().restore_played(Arc::new(entry))?;
    }

    let mut aggregate = AggregatePlaytime::default();
    for entry in pending {
        let participant = service.registry.get_or_create(&entry.owner);
        aggregate.add(entry.duration);
        participant.lock().submit(Arc::new(entry))?;
        service.scheduler.add(participant);
    }

    service.admission.reset(record.is_open, aggregate);
    report.participants = service.registry.len();

    info!(
        queue = %service.queue,
        participants = report.participants,
        pending = report.pending,
        played = report.played,
        is_open = report.is_open,
        "Queue restored"
    );

    Ok(report)
}
