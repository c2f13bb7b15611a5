//! SQLite storage layer for Airpulse.
//!
//! Storage is a flat key/value area: each named slot holds one serialized
//! value that is always replaced whole. Callers own the format of their
//! slot; this layer only reads and writes text.

use sqlx::Row;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct Storage {
    pool: SqlitePool,
}

impl Storage {
    /// Create a new storage instance and initialize the schema.
    ///
    /// # Arguments
    ///
    /// * `database_url` - SQLite connection string (e.g., "sqlite:airpulse.db" or "sqlite::memory:")
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;

        let storage = Self { pool };
        storage.initialize_schema().await?;

        Ok(storage)
    }

    /// Create the slot table if it doesn't exist.
    async fn initialize_schema(&self) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS local_storage (
                key TEXT PRIMARY KEY NOT NULL,
                value TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Read the raw value stored under `key`.
    ///
    /// # Returns
    ///
    /// The stored text, or None if the slot has never been written.
    pub async fn get_slot(&self, key: &str) -> anyhow::Result<Option<String>> {
        let row = sqlx::query(
            r#"
            SELECT value FROM local_storage WHERE key = ?
            "#,
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.get("value")))
    }

    /// Replace the value stored under `key`.
    pub async fn put_slot(&self, key: &str, value: &str) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO local_storage (key, value)
            VALUES (?, ?)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::assert_ok;

    #[tokio::test]
    async fn test_missing_slot() {
        let storage = Storage::new("sqlite::memory:").await.unwrap();

        let value = storage.get_slot("nothing-here").await.unwrap();
        assert!(value.is_none());
    }

    #[tokio::test]
    async fn test_put_replaces_whole_value() {
        let storage = Storage::new("sqlite::memory:").await.unwrap();

        assert_ok!(storage.put_slot("k", "first").await);
        assert_ok!(storage.put_slot("k", "second").await);

        let value = storage.get_slot("k").await.unwrap();
        assert_eq!(value.as_deref(), Some("second"));
    }
}
