//! `SQLite`-backed event log.
//!
//! Events are the source of truth for the control loop's history. The table
//! is append-only: the host app writes rows as the user works, the loop
//! reads them by timestamp cursor, and nothing updates or deletes them.
//!
//! Timestamps are stored as UTC microseconds (`INTEGER`) so cursor
//! comparisons are plain integer comparisons; the event kind is stored as
//! its JSON form, which is what lets rows written by newer app versions
//! deserialize into `Unrecognized` instead of failing a whole batch.

use async_trait::async_trait;
use attune_core::{EventSource, StoreError};
use attune_types::{Event, EventKind};
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::error::DbError;

/// `SQLite` adapter implementing [`EventSource`].
#[derive(Debug, Clone)]
pub struct SqliteEventLog {
    pool: SqlitePool,
}

impl SqliteEventLog {
    /// Create a log over an existing pool. [`Self::init_schema`] must have
    /// run against the database.
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create the `events` table and its cursor index if missing.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Sqlite`] if the DDL fails.
    pub async fn init_schema(pool: &SqlitePool) -> Result<(), DbError> {
        sqlx::query(
            r"CREATE TABLE IF NOT EXISTS events (
                  id INTEGER PRIMARY KEY AUTOINCREMENT,
                  at_us INTEGER NOT NULL,
                  kind TEXT NOT NULL
              )",
        )
        .execute(pool)
        .await?;
        sqlx::query(r"CREATE INDEX IF NOT EXISTS idx_events_at_us ON events(at_us)")
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Append one event.
    ///
    /// This is the host app's write path; the control loop itself never
    /// calls it.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if serialization or the insert fails.
    pub async fn append(&self, event: &Event) -> Result<(), DbError> {
        let kind_json = serde_json::to_string(&event.kind)?;
        sqlx::query(r"INSERT INTO events (at_us, kind) VALUES (?1, ?2)")
            .bind(event.at.timestamp_micros())
            .bind(kind_json)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Append a batch of events inside one transaction.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if serialization or any insert fails; the
    /// transaction rolls back and no row of the batch is kept.
    pub async fn append_batch(&self, events: &[Event]) -> Result<(), DbError> {
        if events.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;
        for event in events {
            let kind_json = serde_json::to_string(&event.kind)?;
            sqlx::query(r"INSERT INTO events (at_us, kind) VALUES (?1, ?2)")
                .bind(event.at.timestamp_micros())
                .bind(kind_json)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;

        tracing::debug!(count = events.len(), "Inserted events");
        Ok(())
    }

    /// Fetch all events at or after `since`, ascending by timestamp (insert
    /// order as the tie-break).
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the query fails or a row cannot be decoded.
    pub async fn fetch_since(&self, since: DateTime<Utc>) -> Result<Vec<Event>, DbError> {
        let rows = sqlx::query_as::<_, (i64, String)>(
            r"SELECT at_us, kind FROM events
              WHERE at_us >= ?1
              ORDER BY at_us, id",
        )
        .bind(since.timestamp_micros())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|(at_us, kind_json)| {
                let at = DateTime::from_timestamp_micros(at_us)
                    .ok_or(DbError::InvalidTimestamp(at_us))?;
                let kind: EventKind = serde_json::from_str(&kind_json)?;
                Ok(Event::new(at, kind))
            })
            .collect()
    }
}

#[async_trait]
impl EventSource for SqliteEventLog {
    async fn events_since(&self, since: DateTime<Utc>) -> Result<Vec<Event>, StoreError> {
        self.fetch_since(since).await.map_err(StoreError::from)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;
    use sqlx::sqlite::SqlitePoolOptions;

    use super::*;

    async fn memory_pool() -> SqlitePool {
        // A single connection keeps every query on the same in-memory
        // database.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        SqliteEventLog::init_schema(&pool).await.unwrap();
        pool
    }

    fn at(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 9, minute, 0).unwrap()
    }

    #[tokio::test]
    async fn appended_events_come_back_in_order() {
        let log = SqliteEventLog::new(memory_pool().await);

        log.append(&Event::new(at(20), EventKind::FocusResumed))
            .await
            .unwrap();
        log.append(&Event::new(at(5), EventKind::StateUpdated))
            .await
            .unwrap();

        let events = log.fetch_since(at(0)).await.unwrap();
        let times: Vec<_> = events.iter().map(|e| e.at).collect();
        assert_eq!(times, vec![at(5), at(20)]);
    }

    #[tokio::test]
    async fn cursor_filters_older_events() {
        let log = SqliteEventLog::new(memory_pool().await);

        log.append_batch(&[
            Event::new(at(0), EventKind::FocusResumed),
            Event::new(at(10), EventKind::StateUpdated),
            Event::new(at(20), EventKind::FocusResumed),
        ])
        .await
        .unwrap();

        let events = log.fetch_since(at(10)).await.unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events.first().map(|e| e.at), Some(at(10)));
    }

    #[tokio::test]
    async fn payload_variants_round_trip() {
        let log = SqliteEventLog::new(memory_pool().await);
        let event = Event::new(
            at(3),
            EventKind::ActivityOngoingTick { minutes_active: 60 },
        );

        log.append(&event).await.unwrap();
        let events = log.fetch_since(at(0)).await.unwrap();
        assert_eq!(events, vec![event]);
    }

    #[tokio::test]
    async fn unknown_kind_rows_decode_as_unrecognized() {
        let pool = memory_pool().await;
        let log = SqliteEventLog::new(pool.clone());

        // Simulate a row written by a newer app version.
        sqlx::query(r"INSERT INTO events (at_us, kind) VALUES (?1, ?2)")
            .bind(at(1).timestamp_micros())
            .bind(r#"{"kind":"hologram_calibrated"}"#)
            .execute(&pool)
            .await
            .unwrap();

        let events = log.fetch_since(at(0)).await.unwrap();
        assert_eq!(
            events.first().map(|e| e.kind.clone()),
            Some(EventKind::Unrecognized)
        );
    }
}
