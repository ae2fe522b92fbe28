//! Randomized fairness run
//!
//! Participants `0`, `1111`, `2222`, ... each submit a few links, then the
//! queue is drained. After a few plays participant `9999` joins late and
//! should be served ahead of everyone who has already played.

use crate::settings::SimulationSettings;
use fairqueue_core::application::{QueueService, RetryPolicy, SubmissionRequest};
use fairqueue_core::domain::{Decision, Entry};
use fairqueue_core::error::Result;
use rand::rngs::StdRng;
use rand::Rng;
use std::sync::Arc;
use tracing::{info, warn};

const LATE_JOINER: &str = "9999";
const PARTICIPANT_ID_STEP: u32 = 1111;

#[derive(Debug, Default)]
pub struct SimulationReport {
    pub accepted: usize,
    pub rejected: usize,
    pub failed: usize,
    pub played: Vec<Arc<Entry>>,
}

pub struct Simulation<'a> {
    service: &'a QueueService,
    retry: RetryPolicy,
    settings: SimulationSettings,
    rng: StdRng,
    next_track: u64,
    report: SimulationReport,
}

impl<'a> Simulation<'a> {
    pub fn new(
        service: &'a QueueService,
        retry: RetryPolicy,
        settings: SimulationSettings,
        rng: StdRng,
    ) -> Self {
        Self {
            service,
            retry,
            settings,
            rng,
            next_track: 0,
            report: SimulationReport::default(),
        }
    }

    /// Submit for every participant, then drain the queue
    pub async fn run(mut self) -> Result<SimulationReport> {
        let participants = self.pick(
            self.settings.min_participants,
            self.settings.max_participants,
        );
        info!(participants = participants, "Submitting initial requests");

        for n in 0..participants {
            let participant_id = (n * PARTICIPANT_ID_STEP).to_string();
            self.submit_batch(&participant_id).await;
        }

        info!(
            upcoming = ?self.service.upcoming(),
            summary = ?self.service.summary(),
            "Queue filled"
        );

        let mut late_joined = false;
        while let Some(entry) = self.service.poll_next().await? {
            self.report.played.push(Arc::clone(&entry));
            info!(
                position = self.report.played.len(),
                participant_id = %entry.owner,
                entry_id = %entry.id,
                title = entry.title.as_deref().unwrap_or("-"),
                duration = %entry.duration,
                "Now playing"
            );

            if !late_joined && self.report.played.len() >= self.settings.late_joiner_after {
                late_joined = true;
                info!(participant_id = LATE_JOINER, "Late joiner submitting");
                self.submit_batch(LATE_JOINER).await;
                info!(upcoming = ?self.service.upcoming(), "Queue after late join");
            }
        }

        Ok(self.report)
    }

    fn pick(&mut self, min: u32, max: u32) -> u32 {
        self.rng.gen_range(min..=max.max(min))
    }

    async fn submit_batch(&mut self, participant_id: &str) {
        let count = self.pick(
            self.settings.min_submissions,
            self.settings.max_submissions,
        );
        for _ in 0..count {
            let source_ref = format!(
                "https://media.example/music/{}/{}",
                participant_id, self.next_track
            );
            self.next_track += 1;
            self.submit(participant_id, &source_ref).await;
        }
    }

    /// Same-millisecond submissions by one participant collide in the store
    /// and go through the retry policy
    async fn submit(&mut self, participant_id: &str, source_ref: &str) {
        let service = self.service;
        let outcome = self
            .retry
            .run(|| service.submit(SubmissionRequest::new(participant_id, source_ref)))
            .await;

        match outcome {
            Ok(Decision::Accepted { .. }) => self.report.accepted += 1,
            Ok(Decision::Rejected(reason)) => {
                self.report.rejected += 1;
                info!(
                    participant_id = %participant_id,
                    source_ref = %source_ref,
                    reason = %reason,
                    "Submission turned away"
                );
            }
            Err(e) => {
                self.report.failed += 1;
                warn!(
                    participant_id = %participant_id,
                    source_ref = %source_ref,
                    error = %e,
                    "Submission failed"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::RandomResolver;
    use fairqueue_core::application::{QueuePorts, Settings};
    use fairqueue_core::port::id_provider::UuidProvider;
    use fairqueue_core::port::time_provider::SystemTimeProvider;
    use fairqueue_core::port::TracingNotifier;
    use fairqueue_infra_sqlite::{
        create_pool, run_migrations, SqliteConfigStore, SqliteEntryRepository,
    };
    use rand::SeedableRng;

    #[tokio::test]
    async fn test_late_joiner_is_served_before_repeat_players() {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        run_migrations(&pool).await.unwrap();
        let repo = Arc::new(SqliteEntryRepository::new(pool.clone()));
        let ports = QueuePorts {
            entries: repo.clone(),
            transactions: repo,
            config: Arc::new(SqliteConfigStore::new(pool)),
            resolver: Arc::new(RandomResolver::new(StdRng::seed_from_u64(3), 90..=210)),
            notifier: Arc::new(TracingNotifier),
            clock: Arc::new(SystemTimeProvider),
            ids: Arc::new(UuidProvider),
        };
        let service = QueueService::new("sim", ports, Settings::default());

        let settings = SimulationSettings {
            min_participants: 4,
            max_participants: 4,
            min_submissions: 3,
            max_submissions: 3,
            ..Default::default()
        };
        let retry = RetryPolicy::new(5, 1);
        let report = Simulation::new(&service, retry, settings, StdRng::seed_from_u64(3))
            .run()
            .await
            .unwrap();

        assert_eq!(report.accepted, 15);
        assert_eq!(report.played.len(), 15);
        assert_eq!(report.failed, 0);

        // First round serves every initial participant once, in join order
        let first_round: Vec<&str> = report.played[..4]
            .iter()
            .map(|e| e.owner.as_str())
            .collect();
        assert_eq!(first_round, vec!["0", "1111", "2222", "3333"]);

        // The late joiner arrives after five plays and goes next
        assert_eq!(report.played[5].owner, LATE_JOINER);
    }
}
