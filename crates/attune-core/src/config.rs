//! Configuration loading and typed config structures.
//!
//! The canonical configuration lives in `attune-config.yaml` at the project
//! root. This module defines strongly-typed structs that mirror the YAML
//! structure and provides a loader that reads the file. Every field has a
//! default, so a partial file (or none at all) yields a working config.

use std::path::Path;

use serde::Deserialize;

use crate::inference::InferenceThresholds;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level configuration for the Attune engine.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AttuneConfig {
    /// Control-loop pacing and bounds.
    #[serde(default)]
    pub engine: LoopSettings,

    /// State inference thresholds.
    #[serde(default)]
    pub inference: InferenceThresholds,

    /// Event log and state store backing.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AttuneConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values:
    /// - `ATTUNE_DATABASE_URL` overrides `database.url`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Self = serde_yml::from_str(&contents)?;
        config.database.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yml::from_str(yaml)?;
        config.database.apply_env_overrides();
        Ok(config)
    }
}

/// Control-loop pacing and bounds.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoopSettings {
    /// Real-time milliseconds between ticks.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Stop after this many successful ticks; 0 means run until shutdown.
    #[serde(default)]
    pub max_ticks: u64,

    /// Stop after this many consecutive failed ticks.
    #[serde(default = "default_max_consecutive_failures")]
    pub max_consecutive_failures: u32,
}

const fn default_tick_interval_ms() -> u64 {
    60_000
}

const fn default_max_consecutive_failures() -> u32 {
    5
}

impl Default for LoopSettings {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            max_ticks: 0,
            max_consecutive_failures: default_max_consecutive_failures(),
        }
    }
}

/// Which store backing the engine uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreMode {
    /// In-memory stores; state does not survive a restart.
    Memory,
    /// `SQLite` stores via `attune-db`.
    Sqlite,
}

/// Event log and state store backing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DatabaseConfig {
    /// Store backing to use.
    #[serde(default = "default_store_mode")]
    pub mode: StoreMode,

    /// `SQLite` connection URL, used when `mode` is `sqlite`.
    #[serde(default = "default_database_url")]
    pub url: String,
}

const fn default_store_mode() -> StoreMode {
    StoreMode::Sqlite
}

fn default_database_url() -> String {
    String::from("sqlite://attune.db")
}

impl DatabaseConfig {
    /// Apply environment-variable overrides.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("ATTUNE_DATABASE_URL") {
            if !url.is_empty() {
                self.url = url;
            }
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            mode: default_store_mode(),
            url: default_database_url(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Default `tracing` filter directive, overridden by `RUST_LOG`.
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

fn default_log_filter() -> String {
    String::from("info")
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn empty_yaml_yields_defaults() {
        let config = AttuneConfig::parse("{}").unwrap();
        assert_eq!(config.engine.tick_interval_ms, 60_000);
        assert_eq!(config.engine.max_ticks, 0);
        assert_eq!(config.database.mode, StoreMode::Sqlite);
        assert_eq!(config.logging.filter, "info");
    }

    #[test]
    fn partial_sections_keep_defaults_for_the_rest() {
        let yaml = r"
engine:
  tick_interval_ms: 5000
inference:
  stuck_deferrals: 4
";
        let config = AttuneConfig::parse(yaml).unwrap();
        assert_eq!(config.engine.tick_interval_ms, 5000);
        assert_eq!(config.engine.max_consecutive_failures, 5);
        assert_eq!(config.inference.stuck_deferrals, 4);
        assert_eq!(
            config.inference.entropy_high_score,
            InferenceThresholds::default().entropy_high_score
        );
    }

    #[test]
    fn store_mode_parses_snake_case() {
        let config = AttuneConfig::parse("database:\n  mode: memory\n").unwrap();
        assert_eq!(config.database.mode, StoreMode::Memory);
    }

    #[test]
    fn invalid_yaml_is_an_error() {
        assert!(AttuneConfig::parse("engine: [not, a, map]").is_err());
    }
}
