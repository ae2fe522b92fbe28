// SQLite EntryRepository Implementation

use crate::error::{map_insert_error, map_sqlx_error};
use crate::SqliteEntryTransaction;
use async_trait::async_trait;
use fairqueue_core::domain::{Entry, EntryId, Playtime};
use fairqueue_core::error::{AppError, Result};
use fairqueue_core::port::{
    EntryRepository, EntryRepositoryTransaction, TransactionalEntryRepository,
};
use sqlx::{SqliteConnection, SqlitePool};

pub struct SqliteEntryRepository {
    pool: SqlitePool,
}

impl SqliteEntryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

/// Duration column: NULL for unbounded content
fn duration_column(duration: Playtime) -> Option<i64> {
    duration
        .as_secs()
        .map(|secs| i64::try_from(secs).unwrap_or(i64::MAX))
}

/// Shared by the pooled and the transactional insert
pub(crate) async fn insert_entry(conn: &mut SqliteConnection, entry: &Entry) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO entries (
            id, queue_id, owner_id, source_ref, title,
            duration_seconds, submitted_at, played_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, NULL)
        "#,
    )
    .bind(&entry.id)
    .bind(&entry.queue)
    .bind(&entry.owner)
    .bind(&entry.source_ref)
    .bind(&entry.title)
    .bind(duration_column(entry.duration))
    .bind(entry.submitted_at)
    .execute(conn)
    .await
    .map_err(|e| map_insert_error(e, entry))?;

    Ok(())
}

#[async_trait]
impl EntryRepository for SqliteEntryRepository {
    async fn insert(&self, entry: &Entry) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;
        sqlx::query("INSERT OR IGNORE INTO queue_configs (queue_id) VALUES (?)")
            .bind(&entry.queue)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;
        insert_entry(&mut tx, entry).await?;
        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn remove(&self, entry_id: &EntryId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM entries WHERE id = ? AND played_at IS NULL")
            .bind(entry_id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn mark_played(&self, entry_id: &EntryId, played_at: i64) -> Result<()> {
        let result = sqlx::query("UPDATE entries SET played_at = ? WHERE id = ?")
            .bind(played_at)
            .bind(entry_id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Entry {} not found", entry_id)));
        }
        Ok(())
    }

    async fn fetch_pending(&self, queue: &str) -> Result<Vec<Entry>> {
        let rows = sqlx::query_as::<_, EntryRow>(
            r#"
            SELECT id, queue_id, owner_id, source_ref, title, duration_seconds, submitted_at
            FROM entries
            WHERE queue_id = ? AND played_at IS NULL
            ORDER BY submitted_at ASC, rowid ASC
            "#,
        )
        .bind(queue)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(EntryRow::into_entry).collect())
    }

    async fn fetch_played_since(&self, queue: &str, since_millis: i64) -> Result<Vec<Entry>> {
        let rows = sqlx::query_as::<_, EntryRow>(
            r#"
            SELECT id, queue_id, owner_id, source_ref, title, duration_seconds, submitted_at
            FROM entries
            WHERE queue_id = ? AND played_at IS NOT NULL AND submitted_at >= ?
            ORDER BY submitted_at ASC, rowid ASC
            "#,
        )
        .bind(queue)
        .bind(since_millis)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(EntryRow::into_entry).collect())
    }

    async fn count_pending(&self, queue: &str) -> Result<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM entries WHERE queue_id = ? AND played_at IS NULL")
            .bind(queue)
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)
    }

    async fn clear_pending(&self, queue: &str) -> Result<u64> {
        let result = sqlx::query("DELETE FROM entries WHERE queue_id = ? AND played_at IS NULL")
            .bind(queue)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected())
    }
}

#[async_trait]
impl TransactionalEntryRepository for SqliteEntryRepository {
    async fn begin_transaction(&self) -> Result<Box<dyn EntryRepositoryTransaction>> {
        let tx = self.pool.begin().await.map_err(map_sqlx_error)?;
        Ok(Box::new(SqliteEntryTransaction::new(tx)))
    }
}

/// SQLite row representation
#[derive(Debug, sqlx::FromRow)]
struct EntryRow {
    id: String,
    queue_id: String,
    owner_id: String,
    source_ref: String,
    title: Option<String>,
    duration_seconds: Option<i64>,
    submitted_at: i64,
}

impl EntryRow {
    fn into_entry(self) -> Entry {
        let duration = match self.duration_seconds {
            Some(secs) => Playtime::Seconds(u64::try_from(secs).unwrap_or(0)),
            None => Playtime::Unbounded,
        };

        Entry::new(
            self.id,
            self.queue_id,
            self.owner_id,
            self.source_ref,
            duration,
            self.submitted_at,
        )
        .with_title(self.title)
    }
}
