// Poll Use Case - next entry in fair order

use super::QueueService;
use crate::domain::Entry;
use crate::error::Result;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Take the head participant, pop its oldest entry into history and put the
/// participant back if it still has pending entries.
///
/// Participants found with nothing pending (their entries were removed
/// while they waited) are skipped.
pub(super) async fn execute(service: &QueueService) -> Result<Option<Arc<Entry>>> {
    let now = service.ports.clock.now_millis();
    let retention = service.settings.history_retention_ms;

    let played = loop {
        let Some(participant) = service.scheduler.poll() else {
            return Ok(None);
        };

        let mut lock = participant.lock();
        match lock.poll_one(now, retention) {
            Some(entry) => {
                if lock.has_pending() && !service.scheduler.add(Arc::clone(&participant)) {
                    // Re-queued by a concurrent submit before it had played
                    service.scheduler.reposition(Arc::clone(&participant));
                }
                break entry;
            }
            None => {
                debug!(
                    participant_id = %participant.id(),
                    "Skipping participant with nothing pending"
                );
            }
        }
    };

    service.admission.release(played.duration);

    info!(
        queue = %service.queue,
        participant_id = %played.owner,
        entry_id = %played.id,
        duration = %played.duration,
        "Entry up next"
    );

    if let Err(e) = service.ports.entries.mark_played(&played.id, now).await {
        error!(
            entry_id = %played.id,
            error = %e,
            "Failed to mark entry played in store"
        );
    }

    Ok(Some(played))
}
