//! The control-loop driver: one tick from cursor computation through
//! actuator dispatch.
//!
//! Data flows one direction per tick: events -> state -> decisions -> side
//! effects. The driver is the only writer of the state store, and it writes
//! exactly once per tick, after a successful inference and before any
//! policy runs. Persist-before-evaluate is deliberate: a crash between the
//! save and the dispatch loses that tick's decisions but never replays its
//! events -- at-most-once delivery for decisions, exactly-once for state
//! transitions.
//!
//! `tick` takes `&mut self`, so one [`ControlLoop`] cannot run two
//! overlapping ticks; that borrow is the IDLE -> RUNNING -> IDLE state
//! machine. Hosts that can trigger ticks concurrently against the same
//! backing store still need an external single-flight guard.

use std::sync::Arc;

use attune_types::{Decision, LifeSystemState};
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::actuator::Actuator;
use crate::inference::{self, InferenceThresholds};
use crate::policy::Policy;
use crate::store::{EventSource, StateStore, StoreError};

/// Errors that fail a whole tick.
///
/// Only fetch/store problems abort a tick; policy and actuator failures are
/// contained inside it (counted on the [`TickSummary`], logged, skipped).
#[derive(Debug, thiserror::Error)]
pub enum TickError {
    /// The event source or state store failed.
    #[error("store error: {source}")]
    Store {
        /// The underlying store error.
        #[from]
        source: StoreError,
    },
}

/// How a tick ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The event batch was empty: no state change, no decisions. A valid,
    /// frequent outcome, not an error.
    NoOp,
    /// A new snapshot was inferred and persisted, and decisions (possibly
    /// zero) were dispatched.
    Completed,
}

/// Summary of a single tick's execution.
#[derive(Debug, Clone)]
pub struct TickSummary {
    /// How the tick ended.
    pub outcome: TickOutcome,
    /// The cursor the event fetch used.
    pub cursor: DateTime<Utc>,
    /// Number of events in the fetched batch.
    pub events_seen: usize,
    /// The snapshot persisted this tick. `None` on a no-op tick.
    pub state: Option<LifeSystemState>,
    /// Every decision produced, in fixed policy order.
    pub decisions: Vec<Decision>,
    /// Policies whose evaluation failed and was skipped.
    pub policy_failures: u32,
    /// Actuator calls that failed and were ignored.
    pub actuator_failures: u32,
}

/// The control-loop driver.
///
/// Owns the two store ports and the fixed, ordered policy and actuator
/// lists. Construct it once at startup with [`ControlLoop::new`] and drive
/// it with [`ControlLoop::tick`].
pub struct ControlLoop {
    events: Arc<dyn EventSource>,
    states: Arc<dyn StateStore>,
    policies: Vec<Box<dyn Policy>>,
    actuators: Vec<Box<dyn Actuator>>,
    thresholds: InferenceThresholds,
}

impl ControlLoop {
    /// Create a driver over the given stores, policies, and actuators.
    ///
    /// The order of `policies` and `actuators` is the evaluation and
    /// dispatch order for every tick of this driver.
    #[must_use]
    pub fn new(
        events: Arc<dyn EventSource>,
        states: Arc<dyn StateStore>,
        policies: Vec<Box<dyn Policy>>,
        actuators: Vec<Box<dyn Actuator>>,
        thresholds: InferenceThresholds,
    ) -> Self {
        Self {
            events,
            states,
            policies,
            actuators,
            thresholds,
        }
    }

    /// Execute one tick.
    ///
    /// 1. Load the previous snapshot; the cursor is its `updated_at`, or
    ///    the epoch on cold start.
    /// 2. Fetch events at or after the cursor, ascending.
    /// 3. Empty batch: no-op tick, nothing written.
    /// 4. Infer the next snapshot (pure).
    /// 5. Persist it unconditionally -- the commit point; the cursor
    ///    advances even when no dimension changed.
    /// 6. Evaluate every policy in fixed order, isolating failures.
    /// 7. Dispatch every decision to every actuator in fixed order,
    ///    isolating failures per call.
    ///
    /// # Errors
    ///
    /// Returns [`TickError`] only for fetch/store failures; nothing has
    /// been persisted in that case and the next tick retries with the same
    /// cursor.
    pub async fn tick(&mut self) -> Result<TickSummary, TickError> {
        let now = Utc::now();

        // --- Cursor ---
        let previous = self.states.load().await?;
        let cursor = previous.map_or(DateTime::UNIX_EPOCH, |s| s.updated_at);

        // --- Fetch ---
        let batch = self.events.events_since(cursor).await?;
        debug!(%cursor, events = batch.len(), "Tick started");

        if batch.is_empty() {
            debug!(%cursor, "No new events, no-op tick");
            return Ok(TickSummary {
                outcome: TickOutcome::NoOp,
                cursor,
                events_seen: 0,
                state: None,
                decisions: Vec::new(),
                policy_failures: 0,
                actuator_failures: 0,
            });
        }

        // --- Infer ---
        let state = inference::infer(previous.as_ref(), &batch, &self.thresholds, now);

        // --- Persist (commit point) ---
        self.states.save(&state).await?;
        info!(
            load = ?state.load_level,
            mode = ?state.execution_mode,
            stability = ?state.stability,
            entropy = ?state.entropy,
            events = batch.len(),
            "State snapshot persisted"
        );

        // --- Evaluate ---
        let (decisions, policy_failures) = self.evaluate_policies(&state);

        // --- Dispatch ---
        let actuator_failures = self.dispatch(&decisions);

        Ok(TickSummary {
            outcome: TickOutcome::Completed,
            cursor,
            events_seen: batch.len(),
            state: Some(state),
            decisions,
            policy_failures,
            actuator_failures,
        })
    }

    /// Evaluate every policy in order, isolating per-policy failures so one
    /// faulty policy cannot suppress decisions from the others.
    fn evaluate_policies(&self, state: &LifeSystemState) -> (Vec<Decision>, u32) {
        let mut decisions = Vec::new();
        let mut failures: u32 = 0;

        for policy in &self.policies {
            match policy.evaluate(state) {
                Ok(mut produced) => {
                    if !produced.is_empty() {
                        debug!(policy = policy.name(), count = produced.len(), "Policy fired");
                    }
                    decisions.append(&mut produced);
                }
                Err(err) => {
                    failures = failures.saturating_add(1);
                    warn!(policy = policy.name(), %err, "Policy failed, skipping");
                }
            }
        }

        (decisions, failures)
    }

    /// Dispatch each decision to every actuator in order, isolating
    /// failures per call.
    fn dispatch(&self, decisions: &[Decision]) -> u32 {
        let mut failures: u32 = 0;

        for decision in decisions {
            for actuator in &self.actuators {
                if let Err(err) = actuator.apply(decision) {
                    failures = failures.saturating_add(1);
                    warn!(
                        actuator = actuator.name(),
                        decision = ?decision,
                        %err,
                        "Actuator failed, continuing"
                    );
                }
            }
        }

        failures
    }
}
