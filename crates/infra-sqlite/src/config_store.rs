// SQLite ConfigStore Implementation

use crate::error::map_sqlx_error;
use async_trait::async_trait;
use fairqueue_core::domain::{QueueConfig, QueueConfigPatch, QueueRecord};
use fairqueue_core::error::Result;
use fairqueue_core::port::ConfigStore;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

pub struct SqliteConfigStore {
    pool: SqlitePool,
}

impl SqliteConfigStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn to_column(value: Option<u64>) -> Option<i64> {
    value.map(|n| i64::try_from(n).unwrap_or(i64::MAX))
}

fn from_column(value: Option<i64>) -> Option<u64> {
    value.and_then(|n| u64::try_from(n).ok())
}

#[derive(Debug, sqlx::FromRow)]
struct QueueConfigRow {
    is_open: bool,
    entry_duration_max_seconds: Option<i64>,
    entry_duration_min_seconds: Option<i64>,
    cooldown_seconds: Option<i64>,
    submission_max_quantity: Option<i64>,
    queue_duration_seconds: Option<i64>,
}

impl QueueConfigRow {
    fn into_config(self) -> QueueConfig {
        QueueConfig {
            entry_duration_max_seconds: from_column(self.entry_duration_max_seconds),
            entry_duration_min_seconds: from_column(self.entry_duration_min_seconds),
            cooldown_seconds: from_column(self.cooldown_seconds),
            submission_max_quantity: from_column(self.submission_max_quantity),
            queue_duration_seconds: from_column(self.queue_duration_seconds),
            blacklisted_ids: Default::default(),
        }
    }
}

async fn ensure_queue(conn: &mut SqliteConnection, queue: &str) -> Result<()> {
    sqlx::query("INSERT OR IGNORE INTO queue_configs (queue_id) VALUES (?)")
        .bind(queue)
        .execute(conn)
        .await
        .map_err(map_sqlx_error)?;
    Ok(())
}

async fn load_record(conn: &mut SqliteConnection, queue: &str) -> Result<QueueRecord> {
    let row = sqlx::query_as::<_, QueueConfigRow>(
        r#"
        SELECT is_open, entry_duration_max_seconds, entry_duration_min_seconds,
               cooldown_seconds, submission_max_quantity, queue_duration_seconds
        FROM queue_configs
        WHERE queue_id = ?
        "#,
    )
    .bind(queue)
    .fetch_optional(&mut *conn)
    .await
    .map_err(map_sqlx_error)?;

    let Some(row) = row else {
        return Ok(QueueRecord::new(queue));
    };

    let blacklisted: Vec<String> = sqlx::query_scalar(
        "SELECT participant_id FROM queue_blacklist WHERE queue_id = ? ORDER BY participant_id",
    )
    .bind(queue)
    .fetch_all(&mut *conn)
    .await
    .map_err(map_sqlx_error)?;

    let is_open = row.is_open;
    let mut config = row.into_config();
    config.blacklisted_ids = blacklisted.into_iter().collect();

    Ok(QueueRecord {
        queue: queue.to_string(),
        config,
        is_open,
    })
}

#[async_trait]
impl ConfigStore for SqliteConfigStore {
    async fn load(&self, queue: &str) -> Result<QueueRecord> {
        let mut conn = self.pool.acquire().await.map_err(map_sqlx_error)?;
        load_record(&mut conn, queue).await
    }

    async fn update_config(&self, queue: &str, patch: &QueueConfigPatch) -> Result<QueueConfig> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        ensure_queue(&mut tx, queue).await?;
        let mut record = load_record(&mut tx, queue).await?;
        record.config.apply(patch);
        let config = record.config;

        sqlx::query(
            r#"
            UPDATE queue_configs
            SET entry_duration_max_seconds = ?,
                entry_duration_min_seconds = ?,
                cooldown_seconds = ?,
                submission_max_quantity = ?,
                queue_duration_seconds = ?
            WHERE queue_id = ?
            "#,
        )
        .bind(to_column(config.entry_duration_max_seconds))
        .bind(to_column(config.entry_duration_min_seconds))
        .bind(to_column(config.cooldown_seconds))
        .bind(to_column(config.submission_max_quantity))
        .bind(to_column(config.queue_duration_seconds))
        .bind(queue)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        tx.commit().await.map_err(map_sqlx_error)?;

        debug!(queue = %queue, "Queue config stored");
        Ok(config)
    }

    async fn set_open(&self, queue: &str, is_open: bool) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO queue_configs (queue_id, is_open) VALUES (?, ?)
            ON CONFLICT(queue_id) DO UPDATE SET is_open = excluded.is_open
            "#,
        )
        .bind(queue)
        .bind(is_open)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn set_blacklisted(
        &self,
        queue: &str,
        participant: &str,
        blacklisted: bool,
    ) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;
        ensure_queue(&mut tx, queue).await?;

        let sql = if blacklisted {
            "INSERT OR IGNORE INTO queue_blacklist (queue_id, participant_id) VALUES (?, ?)"
        } else {
            "DELETE FROM queue_blacklist WHERE queue_id = ? AND participant_id = ?"
        };
        sqlx::query(sql)
            .bind(queue)
            .bind(participant)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{create_pool, run_migrations};

    async fn store() -> SqliteConfigStore {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        run_migrations(&pool).await.unwrap();
        SqliteConfigStore::new(pool)
    }

    #[tokio::test]
    async fn test_unknown_queue_loads_open_and_unlimited() {
        let store = store().await;
        let record = store.load("guild-1").await.unwrap();
        assert_eq!(record, QueueRecord::new("guild-1"));
    }

    #[tokio::test]
    async fn test_update_config_applies_patch() {
        let store = store().await;

        let config = store
            .update_config(
                "guild-1",
                &QueueConfigPatch {
                    entry_duration_max_seconds: Some(Some(600)),
                    cooldown_seconds: Some(Some(30)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(config.max_entry_seconds(), Some(600));
        assert_eq!(config.cooldown_seconds(), Some(30));

        // Clear one limit, keep the other
        let config = store
            .update_config(
                "guild-1",
                &QueueConfigPatch {
                    cooldown_seconds: Some(None),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(config.max_entry_seconds(), Some(600));
        assert_eq!(config.cooldown_seconds(), None);

        assert_eq!(store.get_config("guild-1").await.unwrap(), config);
    }

    #[tokio::test]
    async fn test_set_open_persists_gate() {
        let store = store().await;
        store.set_open("guild-1", false).await.unwrap();
        assert!(!store.load("guild-1").await.unwrap().is_open);

        store.set_open("guild-1", true).await.unwrap();
        assert!(store.load("guild-1").await.unwrap().is_open);
    }

    #[tokio::test]
    async fn test_blacklist_add_and_remove() {
        let store = store().await;
        store.set_blacklisted("guild-1", "mallory", true).await.unwrap();
        store.set_blacklisted("guild-1", "mallory", true).await.unwrap();
        store.set_blacklisted("guild-2", "trent", true).await.unwrap();

        let config = store.get_config("guild-1").await.unwrap();
        assert!(config.is_blacklisted("mallory"));
        assert!(!config.is_blacklisted("trent"));
        assert_eq!(config.blacklisted_ids.len(), 1);

        store.set_blacklisted("guild-1", "mallory", false).await.unwrap();
        assert!(!store
            .get_config("guild-1")
            .await
            .unwrap()
            .is_blacklisted("mallory"));
    }
}
