//! Engine binary for the Attune adaptive control loop.
//!
//! This is the main entry point that wires together the stores, the state
//! inferencer, the ordered policy set, and the ordered actuator set, then
//! drives the tick loop until shutdown or a configured bound.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `attune-config.yaml` (defaults if absent)
//! 2. Initialize structured logging (tracing)
//! 3. Open the configured stores (`SQLite` or in-memory)
//! 4. Build the actuation handles and the ordered actuator set
//! 5. Build the ordered policy set
//! 6. Install the Ctrl-C shutdown signal
//! 7. Run the control loop
//! 8. Log the result and the actuation surfaces

mod error;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use attune_core::{
    ActuationHandles, AttuneConfig, ControlLoop, EventSource, MemoryEventLog, MemoryStateStore,
    StateStore, StoreMode, default_actuators, default_policies, log_loop_end, run_loop,
};
use attune_db::{SqliteEventLog, SqliteStateStore};
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;

/// Default configuration file, next to the working directory.
const DEFAULT_CONFIG_PATH: &str = "attune-config.yaml";

/// Application entry point for the Attune engine.
///
/// # Errors
///
/// Returns an error if configuration or store initialization fails. A
/// failing loop run is reported through the loop result, not an error exit.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Load configuration.
    let config_path = std::env::var("ATTUNE_CONFIG")
        .map_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);
    let config_found = config_path.exists();
    let config = load_config(&config_path)?;

    // 2. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.logging.filter.clone())),
        )
        .with_target(true)
        .init();

    info!("attune-engine starting");
    if !config_found {
        info!(path = %config_path.display(), "Config file absent, using defaults");
    }
    info!(
        tick_interval_ms = config.engine.tick_interval_ms,
        max_ticks = config.engine.max_ticks,
        store_mode = ?config.database.mode,
        "Configuration loaded"
    );

    // 3. Open the stores.
    let (events, states) = open_stores(&config)
        .await
        .context("opening stores failed")?;

    // 4. Actuation handles and the ordered actuator set.
    let handles = ActuationHandles::new();
    let actuators = default_actuators(&handles);

    // 5. The ordered policy set.
    let policies = default_policies();
    info!(
        policies = policies.len(),
        actuators = actuators.len(),
        "Policy and actuator sets constructed"
    );

    // 6. Shutdown signal.
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Ctrl-C received, requesting shutdown");
            let _ = shutdown_tx.send(true);
        }
    });

    // 7. Run the control loop.
    let mut driver = ControlLoop::new(
        events,
        states,
        policies,
        actuators,
        config.inference.clone(),
    );
    let result = run_loop(&mut driver, &config.engine, shutdown_rx).await;

    // 8. Log the result and the actuation surfaces.
    log_loop_end(&result);
    info!(
        ui_mode = ?handles.ui_mode.current(),
        recommendations = handles.recommendations.len(),
        pending_work = handles.work_queue.len(),
        defaults = handles.defaults.snapshot().len(),
        "Actuation surfaces at shutdown"
    );

    Ok(())
}

/// Load configuration, falling back to defaults when the file is absent.
fn load_config(path: &std::path::Path) -> Result<AttuneConfig, EngineError> {
    if path.exists() {
        Ok(AttuneConfig::from_file(path)?)
    } else {
        let mut config = AttuneConfig::default();
        config.database.apply_env_overrides();
        Ok(config)
    }
}

/// Open the configured event source and state store.
async fn open_stores(
    config: &AttuneConfig,
) -> Result<(Arc<dyn EventSource>, Arc<dyn StateStore>), EngineError> {
    match config.database.mode {
        StoreMode::Sqlite => {
            let pool = attune_db::connect(&config.database.url).await?;
            Ok((
                Arc::new(SqliteEventLog::new(pool.clone())),
                Arc::new(SqliteStateStore::new(pool)),
            ))
        }
        StoreMode::Memory => {
            warn!("Using in-memory stores; state will not survive a restart");
            Ok((
                Arc::new(MemoryEventLog::new()),
                Arc::new(MemoryStateStore::new()),
            ))
        }
    }
}
