// SQLite Maintenance Implementation
use crate::error::map_sqlx_error;
use async_trait::async_trait;
use fairqueue_core::error::Result;
use fairqueue_core::port::{Maintenance, StorageStats};
use sqlx::SqlitePool;
use tracing::info;

/// SQLite maintenance implementation
pub struct SqliteMaintenance {
    pool: SqlitePool,
}

impl SqliteMaintenance {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Maintenance for SqliteMaintenance {
    async fn purge_played_before(&self, queue: &str, before_millis: i64) -> Result<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM entries
            WHERE queue_id = ?
            AND played_at IS NOT NULL
            AND submitted_at < ?
            "#,
        )
        .bind(queue)
        .bind(before_millis)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        let deleted = result.rows_affected();
        if deleted > 0 {
            info!(queue = %queue, deleted = deleted, "Purged played entries");
        }

        Ok(deleted)
    }

    async fn get_stats(&self, queue: &str) -> Result<StorageStats> {
        let (pending_count, played_count): (i64, i64) = sqlx::query_as(
            r#"
            SELECT
                COALESCE(SUM(CASE WHEN played_at IS NULL THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN played_at IS NOT NULL THEN 1 ELSE 0 END), 0)
            FROM entries
            WHERE queue_id = ?
            "#,
        )
        .bind(queue)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(StorageStats {
            pending_count,
            played_count,
        })
    }
}
