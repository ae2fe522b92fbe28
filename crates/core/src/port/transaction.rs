// Transaction port for atomic operations

use crate::error::Result;
use async_trait::async_trait;

/// Transaction trait for atomic multi-step operations
///
/// Dropping a transaction without committing discards its writes.
#[async_trait]
pub trait Transaction: Send {
    /// Commit the transaction
    async fn commit(self: Box<Self>) -> Result<()>;

    /// Rollback the transaction
    async fn rollback(self: Box<Self>) -> Result<()>;
}

/// Transactional EntryRepository operations
#[async_trait]
pub trait TransactionalEntryRepository: Send + Sync {
    /// Begin a new transaction
    async fn begin_transaction(&self) -> Result<Box<dyn EntryRepositoryTransaction>>;
}

/// EntryRepository operations within a transaction
#[async_trait]
pub trait EntryRepositoryTransaction: Transaction {
    /// Make sure the queue row (and its default config) exists
    async fn ensure_queue(&mut self, queue: &str) -> Result<()>;

    /// Insert entry (within transaction)
    async fn insert(&mut self, entry: &crate::domain::Entry) -> Result<()>;
}
