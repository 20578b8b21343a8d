//! Bounded control-loop runner.
//!
//! Wraps the single-tick [`ControlLoop::tick`] in an interval loop with the
//! operational controls the engine needs:
//!
//! - **Bounded run**: stop after `max_ticks` successful ticks (0 = unbounded)
//! - **Shutdown**: a watch channel the engine flips on SIGINT
//! - **Failure ceiling**: stop after N consecutive failed ticks instead of
//!   hammering a broken store forever
//!
//! A failed tick never mutates state (see [`ControlLoop::tick`]), so the
//! next interval retries with the same cursor; any successful tick resets
//! the consecutive-failure counter.

use tokio::sync::watch;
use tracing::{info, warn};

use crate::config::LoopSettings;
use crate::tick::{ControlLoop, TickSummary};

/// Why the loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopEndReason {
    /// The configured number of successful ticks completed.
    MaxTicksReached,
    /// Shutdown was requested (or the shutdown channel closed, which the
    /// runner treats the same way: the engine is going away).
    ShutdownRequested,
    /// Too many consecutive ticks failed.
    FailureCeilingReached,
}

/// Result of a bounded loop run.
#[derive(Debug)]
pub struct LoopResult {
    /// Why the loop stopped.
    pub end_reason: LoopEndReason,
    /// Successful ticks (no-op ticks included).
    pub ticks_run: u64,
    /// Failed ticks over the whole run.
    pub failed_ticks: u64,
    /// The last successful tick's summary, if any.
    pub last_summary: Option<TickSummary>,
}

/// Drive the control loop on a fixed interval until a bound is hit.
pub async fn run_loop(
    driver: &mut ControlLoop,
    settings: &LoopSettings,
    mut shutdown: watch::Receiver<bool>,
) -> LoopResult {
    let mut ticks_run: u64 = 0;
    let mut failed_ticks: u64 = 0;
    let mut consecutive_failures: u32 = 0;
    let mut last_summary: Option<TickSummary> = None;

    info!(
        tick_interval_ms = settings.tick_interval_ms,
        max_ticks = settings.max_ticks,
        max_consecutive_failures = settings.max_consecutive_failures,
        "Control loop starting"
    );

    loop {
        if *shutdown.borrow() {
            info!("Shutdown requested");
            return LoopResult {
                end_reason: LoopEndReason::ShutdownRequested,
                ticks_run,
                failed_ticks,
                last_summary,
            };
        }

        match driver.tick().await {
            Ok(summary) => {
                consecutive_failures = 0;
                ticks_run = ticks_run.saturating_add(1);
                last_summary = Some(summary);
            }
            Err(err) => {
                failed_ticks = failed_ticks.saturating_add(1);
                consecutive_failures = consecutive_failures.saturating_add(1);
                warn!(
                    %err,
                    consecutive_failures,
                    "Tick failed, will retry with the same cursor"
                );
                if consecutive_failures >= settings.max_consecutive_failures {
                    warn!(
                        ceiling = settings.max_consecutive_failures,
                        "Consecutive failure ceiling reached"
                    );
                    return LoopResult {
                        end_reason: LoopEndReason::FailureCeilingReached,
                        ticks_run,
                        failed_ticks,
                        last_summary,
                    };
                }
            }
        }

        if settings.max_ticks > 0 && ticks_run >= settings.max_ticks {
            info!(ticks_run, "Tick limit reached");
            return LoopResult {
                end_reason: LoopEndReason::MaxTicksReached,
                ticks_run,
                failed_ticks,
                last_summary,
            };
        }

        let interval = tokio::time::Duration::from_millis(settings.tick_interval_ms);
        tokio::select! {
            () = tokio::time::sleep(interval) => {}
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    info!("Shutdown requested during interval");
                    return LoopResult {
                        end_reason: LoopEndReason::ShutdownRequested,
                        ticks_run,
                        failed_ticks,
                        last_summary,
                    };
                }
            }
        }
    }
}

/// Log the end of a loop run.
pub fn log_loop_end(result: &LoopResult) {
    info!(
        reason = ?result.end_reason,
        ticks_run = result.ticks_run,
        failed_ticks = result.failed_ticks,
        "Control loop ended"
    );

    if let Some(ref summary) = result.last_summary {
        info!(
            outcome = ?summary.outcome,
            events = summary.events_seen,
            decisions = summary.decisions.len(),
            "Final tick summary"
        );
    } else {
        warn!("Control loop ended with no completed ticks");
    }
}
