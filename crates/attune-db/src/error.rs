//! Error types for the data layer.
//!
//! All errors are propagated via [`DbError`], which wraps the underlying
//! [`sqlx`] and [`serde_json`] errors. At the port boundary they are
//! flattened into [`attune_core::StoreError`] so the control loop stays
//! ignorant of the backing technology.

use attune_core::StoreError;

/// Errors that can occur in the data layer.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// A `SQLite` operation failed.
    #[error("SQLite error: {0}")]
    Sqlite(#[from] sqlx::Error),

    /// A serialization or deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A stored timestamp was outside the representable range.
    #[error("Invalid stored timestamp: {0}")]
    InvalidTimestamp(i64),
}

impl From<DbError> for StoreError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Sqlite(source) => Self::Backend {
                message: source.to_string(),
            },
            DbError::Serialization(source) => Self::Decode {
                message: source.to_string(),
            },
            DbError::InvalidTimestamp(us) => Self::Decode {
                message: format!("invalid stored timestamp: {us}"),
            },
        }
    }
}
