// Port Layer - Interfaces for external dependencies

pub mod config_store;
pub mod entry_repository;
pub mod id_provider; // For deterministic testing
pub mod maintenance;
pub mod metadata_resolver;
pub mod notifier;
pub mod time_provider;
pub mod transaction;

// Re-exports
pub use config_store::ConfigStore;
pub use entry_repository::EntryRepository;
pub use id_provider::IdProvider;
pub use maintenance::{Maintenance, StorageStats};
pub use metadata_resolver::{MetadataResolver, ResolutionError, ResolvedMedia};
pub use notifier::{Notifier, QueueEvent, TracingNotifier};
pub use time_provider::TimeProvider;
pub use transaction::{EntryRepositoryTransaction, Transaction, TransactionalEntryRepository};
