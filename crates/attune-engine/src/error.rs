//! Error types for the engine binary.

use attune_core::ConfigError;
use attune_db::DbError;

/// Errors that can occur during engine startup.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration could not be loaded.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: ConfigError,
    },

    /// The database could not be opened.
    #[error("database error: {source}")]
    Db {
        /// The underlying database error.
        #[from]
        source: DbError,
    },
}
