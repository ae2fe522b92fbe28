// Administrative Use Cases - gate, config, blacklist, removals

use super::QueueService;
use crate::domain::{Entry, QueueConfig, QueueConfigPatch};
use crate::error::{AppError, Result};
use crate::port::QueueEvent;
use std::sync::Arc;
use tracing::{info, warn};

/// Reopen the queue. Returns false if it was already open.
pub(super) async fn open(service: &QueueService) -> Result<bool> {
    let changed = {
        let _turn = service.gate_writes.lock().await;
        service.ports.config.set_open(&service.queue, true).await?;
        service.admission.open()
    };
    if !changed {
        return Ok(false);
    }

    info!(queue = %service.queue, "Queue opened");
    service
        .notify(QueueEvent::Opened {
            queue: service.queue.clone(),
        })
        .await;
    Ok(true)
}

/// Close the queue. Returns false if it was already closed.
pub(super) async fn close(service: &QueueService) -> Result<bool> {
    let changed = {
        let _turn = service.gate_writes.lock().await;
        service.ports.config.set_open(&service.queue, false).await?;
        service.admission.close()
    };
    if !changed {
        return Ok(false);
    }

    info!(queue = %service.queue, "Queue closed");
    service
        .notify(QueueEvent::Closed {
            queue: service.queue.clone(),
            automatic: false,
        })
        .await;
    Ok(true)
}

/// Apply a partial config update. Takes effect on the next decision.
pub(super) async fn update_config(
    service: &QueueService,
    patch: QueueConfigPatch,
) -> Result<QueueConfig> {
    validate_patch(&patch)?;
    let config = service
        .ports
        .config
        .update_config(&service.queue, &patch)
        .await?;
    info!(queue = %service.queue, config = ?config, "Queue config updated");
    Ok(config)
}

/// A min above the max would turn every finite entry away
fn validate_patch(patch: &QueueConfigPatch) -> Result<()> {
    if let (Some(Some(min)), Some(Some(max))) = (
        patch.entry_duration_min_seconds,
        patch.entry_duration_max_seconds,
    ) {
        if min > 0 && max > 0 && min > max {
            return Err(AppError::Validation(format!(
                "Minimum entry duration {}s exceeds maximum {}s",
                min, max
            )));
        }
    }
    Ok(())
}

pub(super) async fn set_blacklisted(
    service: &QueueService,
    participant_id: &str,
    blacklisted: bool,
) -> Result<()> {
    service
        .ports
        .config
        .set_blacklisted(&service.queue, participant_id, blacklisted)
        .await?;
    info!(
        queue = %service.queue,
        participant_id = %participant_id,
        blacklisted = blacklisted,
        "Blacklist updated"
    );
    Ok(())
}

/// Delete a pending entry from the store, then from memory
pub(super) async fn remove_entry(
    service: &QueueService,
    entry_id: &str,
) -> Result<Option<Arc<Entry>>> {
    let entry_id = entry_id.to_string();
    if !service.ports.entries.remove(&entry_id).await? {
        return Ok(None);
    }

    let mut removed = None;
    for participant in service.registry.all() {
        let mut lock = participant.lock();
        if let Some(entry) = lock.remove_pending(&entry_id) {
            if !lock.has_pending() {
                service.scheduler.remove(participant.id());
            }
            removed = Some(entry);
            break;
        }
    }

    match &removed {
        Some(entry) => {
            service.admission.release(entry.duration);
            info!(
                queue = %service.queue,
                participant_id = %entry.owner,
                entry_id = %entry.id,
                "Entry removed"
            );
        }
        None => warn!(
            queue = %service.queue,
            entry_id = %entry_id,
            "Entry removed from store but was not pending in memory"
        ),
    }

    Ok(removed)
}

/// Drop every pending entry. The gate is left as it is.
pub(super) async fn clear(service: &QueueService) -> Result<u64> {
    let deleted = service.ports.entries.clear_pending(&service.queue).await?;

    let mut cleared = 0usize;
    for participant in service.registry.all() {
        let mut lock = participant.lock();
        let entries = lock.clear_pending();
        if entries.is_empty() {
            continue;
        }
        for entry in &entries {
            service.admission.release(entry.duration);
        }
        service.scheduler.remove(participant.id());
        cleared += entries.len();
    }

    info!(
        queue = %service.queue,
        deleted = deleted,
        cleared = cleared,
        "Queue cleared"
    );
    Ok(deleted)
}
