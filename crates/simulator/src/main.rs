//! FairQueue Simulator - Main Entry Point
//! Wires the SQLite adapters into a queue service and runs a randomized
//! fairness simulation against it.

mod resolver;
mod settings;
mod simulation;

use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use fairqueue_core::application::{
    shutdown_channel, CompactionScheduler, QueuePorts, QueueService, RetryPolicy,
};
use fairqueue_core::port::id_provider::UuidProvider;
use fairqueue_core::port::time_provider::SystemTimeProvider;
use fairqueue_core::port::{ConfigStore, TracingNotifier};
use fairqueue_infra_sqlite::{
    create_pool, run_migrations, SqliteConfigStore, SqliteEntryRepository, SqliteMaintenance,
};

use crate::resolver::RandomResolver;
use crate::settings::SimSettings;
use crate::simulation::Simulation;

const VERSION: &str = env!("CARGO_PKG_VERSION");

fn init_tracing(log_format: &str) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("fairqueue=info"))
        .context("Failed to create env filter")?;

    match log_format {
        "json" => {
            // Production: JSON structured logging
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json())
                .init();
        }
        _ => {
            // Development: Pretty formatting with colors
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().pretty())
                .init();
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Load configuration, then logging
    let settings = SimSettings::load().context("Failed to load settings")?;
    init_tracing(&settings.log_format)?;

    info!("FairQueue simulator v{} starting...", VERSION);

    // 2. Initialize database
    let (db_url, db_dir) = settings.resolve_database();
    if let Some(dir) = db_dir {
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    }
    info!(db_url = %db_url, "Initializing database...");

    let pool = create_pool(&db_url)
        .await
        .map_err(|e| anyhow::anyhow!("DB pool creation failed: {}", e))?;
    run_migrations(&pool)
        .await
        .map_err(|e| anyhow::anyhow!("Migration failed: {}", e))?;

    let config_store = Arc::new(SqliteConfigStore::new(pool.clone()));
    if !settings.limits.is_empty() {
        let config = config_store
            .update_config(&settings.queue_id, &settings.limits.to_patch())
            .await?;
        info!(queue = %settings.queue_id, config = ?config, "Seeded queue limits");
    }

    // 3. Setup dependencies (DI wiring)
    let mut rng = match settings.simulation.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let resolver = RandomResolver::new(
        StdRng::from_rng(&mut rng)?,
        settings.simulation.min_duration_secs..=settings.simulation.max_duration_secs,
    );

    let entries = Arc::new(SqliteEntryRepository::new(pool.clone()));
    let ports = QueuePorts {
        entries: entries.clone(),
        transactions: entries,
        config: config_store,
        resolver: Arc::new(resolver),
        notifier: Arc::new(TracingNotifier),
        clock: Arc::new(SystemTimeProvider),
        ids: Arc::new(UuidProvider),
    };
    let service = Arc::new(QueueService::new(
        settings.queue_id.clone(),
        ports,
        settings.engine.clone(),
    ));

    // 4. Rebuild state left by a previous run
    let report = service
        .restore()
        .await
        .map_err(|e| anyhow::anyhow!("Restore failed: {}", e))?;
    info!(
        participants = report.participants,
        pending = report.pending,
        played = report.played,
        is_open = report.is_open,
        "Queue restored"
    );

    // 5. Start compaction scheduler
    let (shutdown_tx, shutdown_rx) = shutdown_channel();
    let compaction = CompactionScheduler::new(
        Arc::clone(&service),
        Arc::new(SqliteMaintenance::new(pool.clone())),
        settings.engine.compaction_interval(),
    );
    let compaction_handle = tokio::spawn(compaction.run(shutdown_rx));

    // 6. Run the simulation (Ctrl+C aborts)
    let simulation = Simulation::new(
        &service,
        RetryPolicy::from_settings(&settings.engine),
        settings.simulation.clone(),
        rng,
    );
    tokio::select! {
        outcome = simulation.run() => match outcome {
            Ok(report) => {
                let order: Vec<&str> = report.played.iter().map(|e| e.owner.as_str()).collect();
                info!(
                    accepted = report.accepted,
                    rejected = report.rejected,
                    failed = report.failed,
                    order = ?order,
                    "Simulation finished"
                );
            }
            Err(e) => error!(error = ?e, "Simulation failed"),
        },
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received. Exiting gracefully...");
        }
    }

    // 7. Graceful shutdown
    shutdown_tx.shutdown();
    let _ = tokio::time::timeout(Duration::from_secs(5), compaction_handle).await;
    pool.close().await;

    info!("Shutdown complete.");

    Ok(())
}
