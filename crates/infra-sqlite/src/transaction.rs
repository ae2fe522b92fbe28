// SQLite Transaction Implementation

use crate::entry_repository::insert_entry;
use crate::error::map_sqlx_error;
use async_trait::async_trait;
use fairqueue_core::domain::Entry;
use fairqueue_core::error::Result;
use fairqueue_core::port::{EntryRepositoryTransaction, Transaction};
use sqlx::{Sqlite, Transaction as SqlxTransaction};

pub struct SqliteEntryTransaction<'a> {
    tx: SqlxTransaction<'a, Sqlite>,
}

impl<'a> SqliteEntryTransaction<'a> {
    pub fn new(tx: SqlxTransaction<'a, Sqlite>) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl Transaction for SqliteEntryTransaction<'_> {
    async fn commit(self: Box<Self>) -> Result<()> {
        self.tx.commit().await.map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        self.tx.rollback().await.map_err(map_sqlx_error)?;
        Ok(())
    }
}

#[async_trait]
impl EntryRepositoryTransaction for SqliteEntryTransaction<'_> {
    async fn ensure_queue(&mut self, queue: &str) -> Result<()> {
        sqlx::query("INSERT OR IGNORE INTO queue_configs (queue_id) VALUES (?)")
            .bind(queue)
            .execute(&mut *self.tx)
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn insert(&mut self, entry: &Entry) -> Result<()> {
        insert_entry(&mut *self.tx, entry).await
    }
}
