// Submit Use Case

use super::QueueService;
use crate::application::admission::Admission;
use crate::domain::{Decision, Entry, Participant, QueueConfig, RejectionReason};
use crate::error::{AppError, Result};
use crate::port::{EntryRepositoryTransaction, QueueEvent};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Maximum length of a participant id
const MAX_PARTICIPANT_ID_LEN: usize = 128;

/// Maximum length of a submitted source reference
const MAX_SOURCE_REF_LEN: usize = 2048;

/// Submission request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionRequest {
    pub participant_id: String,
    pub source_ref: String,
}

impl SubmissionRequest {
    pub fn new(participant_id: impl Into<String>, source_ref: impl Into<String>) -> Self {
        Self {
            participant_id: participant_id.into(),
            source_ref: source_ref.into(),
        }
    }
}

/// Reject malformed requests before any lookup
pub(super) fn validate_request(req: &SubmissionRequest) -> Result<()> {
    if req.participant_id.trim().is_empty() {
        return Err(AppError::Validation(
            "Participant id cannot be empty".to_string(),
        ));
    }
    if req.participant_id.len() > MAX_PARTICIPANT_ID_LEN {
        return Err(AppError::Validation(format!(
            "Participant id too long (max {} chars)",
            MAX_PARTICIPANT_ID_LEN
        )));
    }
    if req.source_ref.trim().is_empty() {
        return Err(AppError::Validation(
            "Source reference cannot be empty".to_string(),
        ));
    }
    if req.source_ref.len() > MAX_SOURCE_REF_LEN {
        return Err(AppError::Validation(format!(
            "Source reference too long (max {} chars)",
            MAX_SOURCE_REF_LEN
        )));
    }
    Ok(())
}

/// Execute the submit use case
///
/// 1. Resolve metadata. Dropping the future up to here leaves no trace.
/// 2. Pre-check against a snapshot of the participant and the gate.
/// 3. Persist in a transaction.
/// 4. Commit in memory, re-checking under the participant lock. If the
///    re-check fails the stored row is removed again.
/// 5. Announce, after every lock is released. `Accepted` goes out before
///    the `Closed` it may have caused.
pub(super) async fn execute(service: &QueueService, req: SubmissionRequest) -> Result<Decision> {
    validate_request(&req)?;

    let media = service.ports.resolver.resolve(&req.source_ref).await?;
    let config = service.ports.config.get_config(&service.queue).await?;

    let now = service.ports.clock.now_millis();
    let participant = service.registry.get_or_create(&req.participant_id);
    let entry = Entry::new(
        service.ports.ids.generate_id(),
        service.queue.clone(),
        req.participant_id.clone(),
        req.source_ref.clone(),
        media.duration,
        now,
    )
    .with_title(media.title);

    let precheck = {
        let mut lock = participant.lock();
        service.compact_locked(&participant, &mut lock, now);
        service.admission.check(&entry, &lock, &config, now)
    };
    if let Err(reason) = precheck {
        return Ok(reject(service, &entry, reason).await);
    }

    persist(service, &entry).await?;

    let entry = Arc::new(entry);
    let admission = match commit(service, &participant, Arc::clone(&entry), &config, now) {
        Ok(Ok(admission)) => admission,
        Ok(Err(reason)) => {
            compensate(service, &entry).await;
            return Ok(reject(service, &entry, reason).await);
        }
        Err(e) => {
            compensate(service, &entry).await;
            return Err(e);
        }
    };

    info!(
        queue = %service.queue,
        participant_id = %entry.owner,
        entry_id = %entry.id,
        duration = %entry.duration,
        is_open = admission.is_open,
        "Entry accepted"
    );

    service
        .notify(QueueEvent::Accepted {
            queue: service.queue.clone(),
            entry: Arc::clone(&entry),
            is_open: admission.is_open,
        })
        .await;

    if admission.closed_now {
        match service.persist_gate().await {
            Ok(true) => {
                debug!(queue = %service.queue, "Queue reopened before the close was stored")
            }
            Ok(false) => {}
            Err(e) => {
                warn!(queue = %service.queue, error = %e, "Failed to persist automatic close")
            }
        }
        service
            .notify(QueueEvent::Closed {
                queue: service.queue.clone(),
                automatic: true,
            })
            .await;
    }

    Ok(Decision::Accepted {
        entry,
        is_open: admission.is_open,
    })
}

/// Write the entry in one transaction
async fn persist(service: &QueueService, entry: &Entry) -> Result<()> {
    let mut tx = service.ports.transactions.begin_transaction().await?;

    if let Err(e) = write(tx.as_mut(), entry).await {
        if let Err(rollback_err) = tx.rollback().await {
            warn!(error = %rollback_err, "Rollback failed");
        }
        return Err(e);
    }

    tx.commit().await
}

async fn write(tx: &mut dyn EntryRepositoryTransaction, entry: &Entry) -> Result<()> {
    tx.ensure_queue(&entry.queue).await?;
    tx.insert(entry).await
}

/// Admit under the participant lock and publish to the scheduler.
///
/// Runs without awaiting: once the gate reserved the duration, the entry
/// lands in pending and the participant in the scheduler, or nothing does.
fn commit(
    service: &QueueService,
    participant: &Arc<Participant>,
    entry: Arc<Entry>,
    config: &QueueConfig,
    now: i64,
) -> Result<std::result::Result<Admission, RejectionReason>> {
    let mut lock = participant.lock();
    service.compact_locked(participant, &mut lock, now);

    let admission = match service.admission.admit(&entry, &lock, config, now) {
        Ok(admission) => admission,
        Err(reason) => {
            debug!(
                participant_id = %entry.owner,
                reason = %reason,
                "Re-check failed after persisting"
            );
            return Ok(Err(reason));
        }
    };

    let duration = entry.duration;
    if let Err(e) = lock.submit(entry) {
        service.admission.release(duration);
        error!(error = %e, "Accepted entry could not be queued");
        return Err(AppError::InvariantViolation(e.to_string()));
    }

    service.scheduler.add(Arc::clone(participant));
    Ok(Ok(admission))
}

/// Undo the persisted row for an entry that did not make it into memory
async fn compensate(service: &QueueService, entry: &Entry) {
    match service.ports.entries.remove(&entry.id).await {
        Ok(_) => {}
        Err(e) => error!(
            entry_id = %entry.id,
            error = %e,
            "Failed to remove orphaned entry from store"
        ),
    }
}

async fn reject(service: &QueueService, entry: &Entry, reason: RejectionReason) -> Decision {
    info!(
        queue = %service.queue,
        participant_id = %entry.owner,
        source_ref = %entry.source_ref,
        reason = %reason,
        "Entry rejected"
    );
    service
        .notify(QueueEvent::Rejected {
            queue: service.queue.clone(),
            participant_id: entry.owner.clone(),
            source_ref: entry.source_ref.clone(),
            reason,
        })
        .await;
    Decision::Rejected(reason)
}
