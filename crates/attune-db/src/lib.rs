//! Data layer for the Attune control loop (`SQLite`).
//!
//! One small database holds both sides of the loop's boundary: the
//! append-only activity event log the host app writes, and the single-row
//! state snapshot the loop commits once per tick. Both adapters implement
//! the port traits from `attune-core`, so the driver never sees `sqlx`.
//!
//! ```text
//! host app  -- append -->  events (append-only)  -- cursor fetch -->  tick
//! tick      -- upsert  -->  life_system_state    -- load         -->  next tick
//! ```
//!
//! # Modules
//!
//! - [`event_log`] -- Append and cursor-fetch over the `events` table
//! - [`state_store`] -- Load/upsert of the single state snapshot row
//! - [`error`] -- Shared error types

pub mod error;
pub mod event_log;
pub mod state_store;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;

// Re-export primary types for convenience.
pub use error::DbError;
pub use event_log::SqliteEventLog;
pub use state_store::SqliteStateStore;

/// Open (creating if missing) the database at `url` and ensure the schema
/// for both adapters exists.
///
/// # Errors
///
/// Returns [`DbError::Sqlite`] if the connection or the DDL fails.
pub async fn connect(url: &str) -> Result<SqlitePool, DbError> {
    let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
    let pool = SqlitePoolOptions::new().connect_with(options).await?;

    SqliteEventLog::init_schema(&pool).await?;
    SqliteStateStore::init_schema(&pool).await?;

    tracing::info!(url, "SQLite store ready");
    Ok(pool)
}
