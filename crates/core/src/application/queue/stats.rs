// Read models - queue summary and per-participant stats

use super::QueueService;
use crate::domain::{ParticipantId, Playtime, QueueId};
use crate::error::Result;
use serde::Serialize;

/// Queue-wide view
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueueSummary {
    pub queue: QueueId,
    pub is_open: bool,
    pub pending_count: usize,
    pub pending_playtime: Playtime,
    pub participants_waiting: usize,
}

/// One participant's standing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParticipantStats {
    pub participant_id: ParticipantId,
    pub blacklisted: bool,
    pub pending_count: usize,
    /// Configured quota, `None` if unlimited
    pub max_submissions: Option<u64>,
    /// Mean playtime of pending entries, `None` if nothing is pending
    pub average_pending_playtime: Option<Playtime>,
    /// Time left before the next submission passes the cooldown check
    pub cooldown_remaining_ms: i64,
}

pub(super) fn summary(service: &QueueService) -> QueueSummary {
    let pending_count = service
        .registry
        .all()
        .iter()
        .map(|p| p.lock().count_pending())
        .sum::<usize>();

    QueueSummary {
        queue: service.queue.clone(),
        is_open: service.admission.is_open(),
        pending_count,
        pending_playtime: service.admission.pending_playtime(),
        participants_waiting: service.scheduler.len(),
    }
}

pub(super) async fn participant_stats(
    service: &QueueService,
    participant_id: &str,
) -> Result<ParticipantStats> {
    let config = service.ports.config.get_config(&service.queue).await?;
    let now = service.ports.clock.now_millis();

    let mut stats = ParticipantStats {
        participant_id: participant_id.to_string(),
        blacklisted: config.is_blacklisted(participant_id),
        pending_count: 0,
        max_submissions: config.max_submissions(),
        average_pending_playtime: None,
        cooldown_remaining_ms: 0,
    };

    let Some(participant) = service.registry.get(participant_id) else {
        return Ok(stats);
    };

    let mut lock = participant.lock();
    service.compact_locked(&participant, &mut lock, now);

    stats.pending_count = lock.count_pending();
    stats.average_pending_playtime = match (lock.pending_playtime(), stats.pending_count) {
        (_, 0) => None,
        (Playtime::Seconds(total), n) => Some(Playtime::Seconds(total / n as u64)),
        (Playtime::Unbounded, _) => Some(Playtime::Unbounded),
    };

    if let (Some(cooldown), Some(elapsed)) = (
        config.cooldown_seconds(),
        lock.millis_since_last_submission(now),
    ) {
        let cooldown_ms = i64::try_from(cooldown.saturating_mul(1000)).unwrap_or(i64::MAX);
        stats.cooldown_remaining_ms = cooldown_ms.saturating_sub(elapsed).max(0);
    }

    Ok(stats)
}
