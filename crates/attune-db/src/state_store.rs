//! `SQLite`-backed state store.
//!
//! Holds the single most-recent life-system snapshot in a one-row table.
//! `save` is an upsert inside the call, so it is durable before it returns;
//! the control loop treats it as its commit point.

use async_trait::async_trait;
use attune_core::{StateStore, StoreError};
use attune_types::LifeSystemState;
use sqlx::SqlitePool;

use crate::error::DbError;

/// `SQLite` adapter implementing [`StateStore`].
#[derive(Debug, Clone)]
pub struct SqliteStateStore {
    pool: SqlitePool,
}

impl SqliteStateStore {
    /// Create a store over an existing pool. [`Self::init_schema`] must
    /// have run against the database.
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create the single-row `life_system_state` table if missing.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Sqlite`] if the DDL fails.
    pub async fn init_schema(pool: &SqlitePool) -> Result<(), DbError> {
        sqlx::query(
            r"CREATE TABLE IF NOT EXISTS life_system_state (
                  id INTEGER PRIMARY KEY CHECK (id = 1),
                  snapshot TEXT NOT NULL
              )",
        )
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Load the stored snapshot, if any.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the query fails or the row cannot be decoded.
    pub async fn fetch(&self) -> Result<Option<LifeSystemState>, DbError> {
        let row = sqlx::query_as::<_, (String,)>(
            r"SELECT snapshot FROM life_system_state WHERE id = 1",
        )
        .fetch_optional(&self.pool)
        .await?;

        row.map(|(snapshot,)| serde_json::from_str(&snapshot).map_err(DbError::from))
            .transpose()
    }

    /// Upsert the snapshot into the single row.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if serialization or the write fails.
    pub async fn store(&self, state: &LifeSystemState) -> Result<(), DbError> {
        let snapshot = serde_json::to_string(state)?;
        sqlx::query(
            r"INSERT INTO life_system_state (id, snapshot) VALUES (1, ?1)
              ON CONFLICT (id) DO UPDATE SET snapshot = excluded.snapshot",
        )
        .bind(snapshot)
        .execute(&self.pool)
        .await?;

        tracing::debug!(updated_at = %state.updated_at, "State snapshot stored");
        Ok(())
    }
}

#[async_trait]
impl StateStore for SqliteStateStore {
    async fn load(&self) -> Result<Option<LifeSystemState>, StoreError> {
        self.fetch().await.map_err(StoreError::from)
    }

    async fn save(&self, state: &LifeSystemState) -> Result<(), StoreError> {
        self.store(state).await.map_err(StoreError::from)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use attune_types::LoadLevel;
    use chrono::{TimeZone, Utc};
    use sqlx::sqlite::SqlitePoolOptions;

    use super::*;

    async fn memory_store() -> SqliteStateStore {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        SqliteStateStore::init_schema(&pool).await.unwrap();
        SqliteStateStore::new(pool)
    }

    #[tokio::test]
    async fn empty_store_loads_none() {
        let store = memory_store().await;
        assert_eq!(store.fetch().await.unwrap(), None);
    }

    #[tokio::test]
    async fn snapshot_round_trips() {
        let store = memory_store().await;
        let at = Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap();
        let state = LifeSystemState::baseline(at);

        store.store(&state).await.unwrap();
        assert_eq!(store.fetch().await.unwrap(), Some(state));
    }

    #[tokio::test]
    async fn save_supersedes_the_previous_snapshot() {
        let store = memory_store().await;
        let at = Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap();

        let first = LifeSystemState::baseline(at);
        store.store(&first).await.unwrap();

        let mut second = LifeSystemState::baseline(at + chrono::Duration::minutes(5));
        second.load_level = LoadLevel::High;
        store.store(&second).await.unwrap();

        assert_eq!(store.fetch().await.unwrap(), Some(second));
    }
}
