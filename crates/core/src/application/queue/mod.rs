// Queue Service - use cases for one queue scope

mod admin;
mod poll;
mod restore;
mod stats;
pub mod submit;


pub use restore::RestoreReport;
pub use stats::{ParticipantStats, QueueSummary};
pub use submit::SubmissionRequest;

use super::admission::AdmissionController;
use super::registry::ParticipantRegistry;
use super::scheduler::FairScheduler;
use super::settings::Settings;
use crate::domain::{
    Decision, Entry, Participant, ParticipantId, ParticipantLock, QueueConfig, QueueConfigPatch,
    QueueId,
};
use crate::error::Result;
use crate::port::{
    ConfigStore, EntryRepository, IdProvider, MetadataResolver, Notifier, QueueEvent,
    TimeProvider, TransactionalEntryRepository,
};
use std::sync::Arc;
use tracing::warn;

/// External collaborators a queue service talks to
#[derive(Clone)]
pub struct QueuePorts {
    pub entries: Arc<dyn EntryRepository>,
    pub transactions: Arc<dyn TransactionalEntryRepository>,
    pub config: Arc<dyn ConfigStore>,
    pub resolver: Arc<dyn MetadataResolver>,
    pub notifier: Arc<dyn Notifier>,
    pub clock: Arc<dyn TimeProvider>,
    pub ids: Arc<dyn IdProvider>,
}

/// Fair queue for one scope: in-memory participants, scheduler and gate,
/// backed by the persistence and config ports.
///
/// Lock order: participant lock first, then either the scheduler lock or
/// the gate lock. No lock is held across an `.await`, except `gate_writes`,
/// which only orders writes of the gate to the config store.
pub struct QueueService {
    queue: QueueId,
    ports: QueuePorts,
    settings: Settings,
    registry: ParticipantRegistry,
    scheduler: FairScheduler<Arc<Participant>>,
    admission: AdmissionController,
    gate_writes: tokio::sync::Mutex<()>,
}

impl QueueService {
    /// Create an empty, open queue. Call `restore` to load persisted state.
    pub fn new(queue: impl Into<String>, ports: QueuePorts, settings: Settings) -> Self {
        Self {
            queue: queue.into(),
            ports,
            settings,
            registry: ParticipantRegistry::new(),
            scheduler: FairScheduler::new(),
            admission: AdmissionController::new(true),
            gate_writes: tokio::sync::Mutex::new(()),
        }
    }

    pub fn queue_id(&self) -> &str {
        &self.queue
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn is_open(&self) -> bool {
        self.admission.is_open()
    }

    /// Attempt to add an entry. Rejections come back as `Decision::Rejected`.
    ///
    /// # Errors
    /// - `Resolution` if the source could not be resolved
    /// - `DuplicateSubmission` if the store already holds this submission
    /// - `Persistence` if the store failed
    pub async fn submit(&self, req: SubmissionRequest) -> Result<Decision> {
        submit::execute(self, req).await
    }

    /// Pop the next entry in fair order
    pub async fn poll_next(&self) -> Result<Option<Arc<Entry>>> {
        poll::execute(self).await
    }

    /// Rebuild in-memory state from persistence
    pub async fn restore(&self) -> Result<RestoreReport> {
        restore::execute(self).await
    }

    pub async fn open(&self) -> Result<bool> {
        admin::open(self).await
    }

    pub async fn close(&self) -> Result<bool> {
        admin::close(self).await
    }

    pub async fn update_config(&self, patch: QueueConfigPatch) -> Result<QueueConfig> {
        admin::update_config(self, patch).await
    }

    pub async fn blacklist(&self, participant_id: &str) -> Result<()> {
        admin::set_blacklisted(self, participant_id, true).await
    }

    pub async fn whitelist(&self, participant_id: &str) -> Result<()> {
        admin::set_blacklisted(self, participant_id, false).await
    }

    /// Drop one pending entry. Returns it if it was still pending.
    pub async fn remove_entry(&self, entry_id: &str) -> Result<Option<Arc<Entry>>> {
        admin::remove_entry(self, entry_id).await
    }

    /// Drop every pending entry. Returns how many were removed from the store.
    pub async fn clear(&self) -> Result<u64> {
        admin::clear(self).await
    }

    pub fn summary(&self) -> QueueSummary {
        stats::summary(self)
    }

    pub async fn participant_stats(&self, participant_id: &str) -> Result<ParticipantStats> {
        stats::participant_stats(self, participant_id).await
    }

    /// Participant ids in the order they will be served
    pub fn upcoming(&self) -> Vec<ParticipantId> {
        self.scheduler.keys()
    }

    /// Submissions before this instant no longer count as history
    pub fn history_cutoff(&self) -> i64 {
        self.ports
            .clock
            .now_millis()
            .saturating_sub(self.settings.history_retention_ms)
    }

    /// Evict expired history for every participant.
    ///
    /// # Returns
    /// Number of history entries evicted
    pub fn compact_all(&self) -> usize {
        let now = self.ports.clock.now_millis();
        self.registry
            .all()
            .iter()
            .map(|participant| {
                let mut lock = participant.lock();
                self.compact_locked(participant, &mut lock, now)
            })
            .sum()
    }

    /// Evict expired history under the participant's lock.
    ///
    /// A queued participant whose history just emptied counts as a newcomer
    /// again and moves up accordingly.
    fn compact_locked(
        &self,
        participant: &Arc<Participant>,
        lock: &mut ParticipantLock<'_>,
        now_millis: i64,
    ) -> usize {
        let was_played = participant.has_played();
        let evicted = lock.evict_expired(now_millis, self.settings.history_retention_ms);
        if was_played && !participant.has_played() {
            self.scheduler.reposition(Arc::clone(participant));
        }
        evicted
    }

    /// Write the current in-memory gate to the config store.
    ///
    /// Gate writes are serialized and each one writes the state read after
    /// taking the turn, so the stored flag ends up matching memory.
    async fn persist_gate(&self) -> Result<bool> {
        let _turn = self.gate_writes.lock().await;
        let is_open = self.admission.is_open();
        self.ports.config.set_open(&self.queue, is_open).await?;
        Ok(is_open)
    }

    /// Deliver an event. Failures are logged and otherwise ignored.
    async fn notify(&self, event: QueueEvent) {
        if let Err(e) = self.ports.notifier.notify(&event).await {
            warn!(queue = %self.queue, error = %e, event = ?event, "Notifier failed");
        }
    }
}
