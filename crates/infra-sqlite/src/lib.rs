// FairQueue Infrastructure - SQLite Adapter
// Implements: EntryRepository, TransactionalEntryRepository, ConfigStore, Maintenance

mod config_store;
mod connection;
mod entry_repository;
mod error;
mod maintenance_impl;
mod migration;
mod transaction;

pub use config_store::SqliteConfigStore;
pub use connection::create_pool;
pub use entry_repository::SqliteEntryRepository;
pub use maintenance_impl::SqliteMaintenance;
pub use migration::run_migrations;
pub use transaction::SqliteEntryTransaction;

// Note: sqlx::Error conversion is handled by helper functions in `error`
// due to Rust's orphan rules (cannot implement From<sqlx::Error> for AppError here)
