//! Shared wiring: a queue service over an in-memory SQLite database with a
//! manual clock and a table-driven resolver.

#![allow(dead_code)]

use fairqueue_core::application::{QueuePorts, QueueService, Settings, SubmissionRequest};
use fairqueue_core::domain::{Decision, Playtime};
use fairqueue_core::port::id_provider::mocks::SequentialIdProvider;
use fairqueue_core::port::metadata_resolver::mocks::StaticResolver;
use fairqueue_core::port::notifier::mocks::RecordingNotifier;
use fairqueue_core::port::time_provider::mocks::ManualClock;
use fairqueue_infra_sqlite::{
    create_pool, run_migrations, SqliteConfigStore, SqliteEntryRepository, SqliteMaintenance,
};
use sqlx::SqlitePool;
use std::sync::Arc;

pub const QUEUE: &str = "guild-1";
pub const START: i64 = 1_700_000_000_000;

pub struct TestEnv {
    pub pool: SqlitePool,
    pub clock: Arc<ManualClock>,
    pub resolver: StaticResolver,
    pub notifier: Arc<RecordingNotifier>,
    pub config: Arc<SqliteConfigStore>,
    pub entries: Arc<SqliteEntryRepository>,
    pub ids: Arc<SequentialIdProvider>,
}

impl TestEnv {
    pub async fn new() -> Self {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        run_migrations(&pool).await.unwrap();

        Self {
            clock: Arc::new(ManualClock::new(START)),
            resolver: StaticResolver::with_default(Playtime::seconds(100)),
            notifier: Arc::new(RecordingNotifier::new()),
            config: Arc::new(SqliteConfigStore::new(pool.clone())),
            entries: Arc::new(SqliteEntryRepository::new(pool.clone())),
            ids: Arc::new(SequentialIdProvider::new("entry")),
            pool,
        }
    }

    /// A fresh service over the same database, as after a restart
    pub fn service(&self) -> Arc<QueueService> {
        self.service_with(Settings::default())
    }

    pub fn service_with(&self, settings: Settings) -> Arc<QueueService> {
        let ports = QueuePorts {
            entries: self.entries.clone(),
            transactions: self.entries.clone(),
            config: self.config.clone(),
            resolver: Arc::new(self.resolver.clone()),
            notifier: self.notifier.clone(),
            clock: self.clock.clone(),
            ids: self.ids.clone(),
        };
        Arc::new(QueueService::new(QUEUE, ports, settings))
    }

    pub fn maintenance(&self) -> Arc<SqliteMaintenance> {
        Arc::new(SqliteMaintenance::new(self.pool.clone()))
    }
}

/// Submit after moving the clock forward so every row gets its own instant
pub async fn submit(env: &TestEnv, service: &QueueService, who: &str, link: &str) -> Decision {
    env.clock.advance_millis(1);
    service
        .submit(SubmissionRequest::new(who, link))
        .await
        .unwrap()
}

/// Drain the queue, returning owners in play order
pub async fn drain(service: &QueueService) -> Vec<String> {
    let mut order = Vec::new();
    while let Some(entry) = service.poll_next().await.unwrap() {
        order.push(entry.owner.clone());
    }
    order
}
