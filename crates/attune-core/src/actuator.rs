//! Actuator trait and the built-in actuator set.
//!
//! An actuator turns a [`Decision`] into an observable side effect. Each
//! actuator pattern-matches on the decision variants it understands and is
//! a no-op for all others, which is how unrelated decision types safely fan
//! out to every actuator without a routing table. Failures are isolated per
//! actuator per decision by the driver: logged, never fatal.
//!
//! The built-in actuators write into small shared handles
//! ([`UiModeHandle`], [`RecommendationSurface`], [`DefaultsMap`],
//! [`WorkQueue`]) that the host app reads on its own schedule. The handles
//! are internally synchronized so actuator instances can be reused across
//! ticks.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, RwLock};

use attune_types::{Decision, Recommendation, ScheduledWork, UiMode};
use chrono::{DateTime, Duration, Utc};
use tracing::debug;

/// Errors an actuator can surface while applying a decision.
#[derive(Debug, thiserror::Error)]
pub enum ActuatorError {
    /// The shared state behind the actuator could not be accessed.
    #[error("actuator state unavailable: {message}")]
    Unavailable {
        /// Description of the failure.
        message: String,
    },

    /// The backing system rejected the request.
    #[error("actuation rejected: {message}")]
    Rejected {
        /// Description of the rejection.
        message: String,
    },
}

/// A side-effecting handler for decisions.
pub trait Actuator: Send + Sync {
    /// Stable name of the actuator, used in logs.
    fn name(&self) -> &'static str;

    /// Apply one decision.
    ///
    /// Must be a no-op (and return `Ok`) for decision variants this
    /// actuator does not handle.
    ///
    /// # Errors
    ///
    /// Returns [`ActuatorError`] if the side effect fails; the driver logs
    /// and continues with the remaining actuators and decisions.
    fn apply(&self, decision: &Decision) -> Result<(), ActuatorError>;
}

fn poisoned(what: &str) -> ActuatorError {
    ActuatorError::Unavailable {
        message: format!("{what} lock poisoned"),
    }
}

// ---------------------------------------------------------------------------
// UI adaptation
// ---------------------------------------------------------------------------

/// Shared slot holding the currently requested UI mode.
///
/// Downstream theme/feature-flag systems read this; the control loop only
/// writes it. Cloning shares the slot.
#[derive(Debug, Clone)]
pub struct UiModeHandle {
    mode: Arc<RwLock<UiMode>>,
}

impl Default for UiModeHandle {
    fn default() -> Self {
        Self {
            mode: Arc::new(RwLock::new(UiMode::Normal)),
        }
    }
}

impl UiModeHandle {
    /// Create a handle starting in [`UiMode::Normal`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The currently requested mode.
    #[must_use]
    pub fn current(&self) -> UiMode {
        self.mode.read().map(|m| *m).unwrap_or(UiMode::Normal)
    }
}

/// Records requested UI modes into a [`UiModeHandle`].
#[derive(Debug, Clone)]
pub struct UiAdaptationActuator {
    handle: UiModeHandle,
}

impl UiAdaptationActuator {
    /// Create an actuator writing into `handle`.
    #[must_use]
    pub const fn new(handle: UiModeHandle) -> Self {
        Self { handle }
    }
}

impl Actuator for UiAdaptationActuator {
    fn name(&self) -> &'static str {
        "ui_adaptation"
    }

    fn apply(&self, decision: &Decision) -> Result<(), ActuatorError> {
        let Decision::AdaptUi { mode } = decision else {
            return Ok(());
        };
        let mut slot = self
            .handle
            .mode
            .write()
            .map_err(|_| poisoned("ui mode"))?;
        *slot = *mode;
        debug!(mode = ?mode, "UI mode recorded");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Recommendations
// ---------------------------------------------------------------------------

/// Shared surface of prioritized recommendations, deduplicated by id.
///
/// Re-surfacing an id keeps the highest priority seen and refreshes the
/// timestamp. Cloning shares the surface.
#[derive(Debug, Clone, Default)]
pub struct RecommendationSurface {
    entries: Arc<Mutex<BTreeMap<String, Recommendation>>>,
}

impl RecommendationSurface {
    /// Create an empty surface.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All current recommendations, highest priority first (id as the
    /// tie-break so the order is total).
    #[must_use]
    pub fn prioritized(&self) -> Vec<Recommendation> {
        let Ok(entries) = self.entries.lock() else {
            return Vec::new();
        };
        let mut recs: Vec<Recommendation> = entries.values().cloned().collect();
        recs.sort_by(|a, b| b.priority.cmp(&a.priority).then_with(|| a.id.cmp(&b.id)));
        recs
    }

    /// Remove and return a recommendation once the host app has shown it.
    #[must_use]
    pub fn take(&self, id: &str) -> Option<Recommendation> {
        self.entries.lock().ok().and_then(|mut e| e.remove(id))
    }

    /// Number of distinct recommendations on the surface.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    /// Whether the surface is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Stores prioritized recommendations on a [`RecommendationSurface`].
#[derive(Debug, Clone)]
pub struct RecommendationActuator {
    surface: RecommendationSurface,
}

impl RecommendationActuator {
    /// Create an actuator writing onto `surface`.
    #[must_use]
    pub const fn new(surface: RecommendationSurface) -> Self {
        Self { surface }
    }
}

impl Actuator for RecommendationActuator {
    fn name(&self) -> &'static str {
        "recommendation"
    }

    fn apply(&self, decision: &Decision) -> Result<(), ActuatorError> {
        let Decision::ShowRecommendation { id, priority } = decision else {
            return Ok(());
        };
        let mut entries = self
            .surface
            .entries
            .lock()
            .map_err(|_| poisoned("recommendation surface"))?;
        let now = Utc::now();
        entries
            .entry(id.clone())
            .and_modify(|existing| {
                existing.priority = existing.priority.max(*priority);
                existing.surfaced_at = now;
            })
            .or_insert_with(|| Recommendation {
                id: id.clone(),
                priority: *priority,
                surfaced_at: now,
            });
        debug!(id = %id, priority, "Recommendation surfaced");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

/// Shared key-value map of mutable host-app defaults.
///
/// Cloning shares the map.
#[derive(Debug, Clone, Default)]
pub struct DefaultsMap {
    values: Arc<Mutex<BTreeMap<String, String>>>,
}

impl DefaultsMap {
    /// Create an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Read one default.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<String> {
        self.values.lock().ok().and_then(|v| v.get(key).cloned())
    }

    /// A copy of the full map, for assertions and host-app sync.
    #[must_use]
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.values.lock().map(|v| v.clone()).unwrap_or_default()
    }
}

/// Writes default-value mutations into a [`DefaultsMap`].
#[derive(Debug, Clone)]
pub struct DefaultsActuator {
    defaults: DefaultsMap,
}

impl DefaultsActuator {
    /// Create an actuator writing into `defaults`.
    #[must_use]
    pub const fn new(defaults: DefaultsMap) -> Self {
        Self { defaults }
    }
}

impl Actuator for DefaultsActuator {
    fn name(&self) -> &'static str {
        "defaults"
    }

    fn apply(&self, decision: &Decision) -> Result<(), ActuatorError> {
        let Decision::ModifyDefault { key, value } = decision else {
            return Ok(());
        };
        let mut values = self
            .defaults
            .values
            .lock()
            .map_err(|_| poisoned("defaults map"))?;
        values.insert(key.clone(), value.clone());
        debug!(key = %key, value = %value, "Default mutated");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Deferred work
// ---------------------------------------------------------------------------

/// Shared queue of uniquely-named deferred work.
///
/// Enqueueing a worker that is already pending keeps the existing entry,
/// so re-delivering the same decision cannot create duplicate work. The
/// host scheduler calls [`WorkQueue::drain_due`] on its own cadence.
/// Cloning shares the queue.
#[derive(Debug, Clone, Default)]
pub struct WorkQueue {
    pending: Arc<Mutex<BTreeMap<String, ScheduledWork>>>,
}

impl WorkQueue {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue `worker` to run after `delay`, keeping an existing pending
    /// entry with the same name. Returns whether a new entry was created.
    pub fn enqueue_keep_existing(
        &self,
        worker: &str,
        delay: Duration,
        now: DateTime<Utc>,
    ) -> Result<bool, ActuatorError> {
        let mut pending = self
            .pending
            .lock()
            .map_err(|_| poisoned("work queue"))?;
        if pending.contains_key(worker) {
            return Ok(false);
        }
        pending.insert(
            worker.to_owned(),
            ScheduledWork {
                worker: worker.to_owned(),
                due_at: now + delay,
                requested_at: now,
            },
        );
        Ok(true)
    }

    /// Remove and return every entry due at or before `now`, soonest first.
    #[must_use]
    pub fn drain_due(&self, now: DateTime<Utc>) -> Vec<ScheduledWork> {
        let Ok(mut pending) = self.pending.lock() else {
            return Vec::new();
        };
        let due_names: Vec<String> = pending
            .iter()
            .filter(|(_, w)| w.due_at <= now)
            .map(|(name, _)| name.clone())
            .collect();
        let mut due: Vec<ScheduledWork> = due_names
            .iter()
            .filter_map(|name| pending.remove(name))
            .collect();
        due.sort_by_key(|w| w.due_at);
        due
    }

    /// The pending entry for `worker`, if any.
    #[must_use]
    pub fn pending_for(&self, worker: &str) -> Option<ScheduledWork> {
        self.pending.lock().ok().and_then(|p| p.get(worker).cloned())
    }

    /// Number of pending entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.lock().map(|p| p.len()).unwrap_or(0)
    }

    /// Whether the queue is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Enqueues deferred work into a [`WorkQueue`].
#[derive(Debug, Clone)]
pub struct WorkerScheduleActuator {
    queue: WorkQueue,
}

impl WorkerScheduleActuator {
    /// Create an actuator enqueueing into `queue`.
    #[must_use]
    pub const fn new(queue: WorkQueue) -> Self {
        Self { queue }
    }
}

impl Actuator for WorkerScheduleActuator {
    fn name(&self) -> &'static str {
        "worker_schedule"
    }

    fn apply(&self, decision: &Decision) -> Result<(), ActuatorError> {
        let Decision::ScheduleWorker {
            worker,
            delay_minutes,
        } = decision
        else {
            return Ok(());
        };
        let delay = Duration::minutes(i64::from(*delay_minutes));
        let created = self
            .queue
            .enqueue_keep_existing(worker, delay, Utc::now())?;
        if created {
            debug!(worker = %worker, delay_minutes, "Deferred work enqueued");
        } else {
            debug!(worker = %worker, "Deferred work already pending, kept existing");
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Wiring
// ---------------------------------------------------------------------------

/// The shared handles the built-in actuators write into.
///
/// The engine creates one of these at startup, hands clones to the host
/// app's read paths, and builds the actuator set from it.
#[derive(Debug, Clone, Default)]
pub struct ActuationHandles {
    /// Slot for the requested UI mode.
    pub ui_mode: UiModeHandle,
    /// Surface of prioritized recommendations.
    pub recommendations: RecommendationSurface,
    /// Mutable host-app defaults.
    pub defaults: DefaultsMap,
    /// Queue of deferred work.
    pub work_queue: WorkQueue,
}

impl ActuationHandles {
    /// Create a fresh set of handles.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// The built-in actuator set in its fixed dispatch order, wired to `handles`.
#[must_use]
pub fn default_actuators(handles: &ActuationHandles) -> Vec<Box<dyn Actuator>> {
    vec![
        Box::new(UiAdaptationActuator::new(handles.ui_mode.clone())),
        Box::new(RecommendationActuator::new(handles.recommendations.clone())),
        Box::new(DefaultsActuator::new(handles.defaults.clone())),
        Box::new(WorkerScheduleActuator::new(handles.work_queue.clone())),
    ]
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn schedule_cleanup() -> Decision {
        Decision::ScheduleWorker {
            worker: String::from("CleanupWorker"),
            delay_minutes: 30,
        }
    }

    #[test]
    fn every_actuator_ignores_foreign_decisions() {
        let handles = ActuationHandles::new();
        let actuators = default_actuators(&handles);

        // Each decision is foreign to three of the four actuators; applying
        // all decisions through all actuators must leave exactly one trace
        // per decision and no errors.
        let decisions = vec![
            Decision::AdaptUi {
                mode: UiMode::Focus,
            },
            Decision::ShowRecommendation {
                id: String::from("stabilize"),
                priority: 10,
            },
            Decision::ModifyDefault {
                key: String::from("planner_mode"),
                value: String::from("cleanup"),
            },
            schedule_cleanup(),
        ];

        for decision in &decisions {
            for actuator in &actuators {
                actuator.apply(decision).unwrap();
            }
        }

        assert_eq!(handles.ui_mode.current(), UiMode::Focus);
        assert_eq!(handles.recommendations.len(), 1);
        assert_eq!(handles.defaults.snapshot().len(), 1);
        assert_eq!(handles.work_queue.len(), 1);
    }

    #[test]
    fn ui_actuator_records_the_requested_mode() {
        let handle = UiModeHandle::new();
        let actuator = UiAdaptationActuator::new(handle.clone());
        assert_eq!(handle.current(), UiMode::Normal);

        actuator
            .apply(&Decision::AdaptUi {
                mode: UiMode::ReducedComplexity,
            })
            .unwrap();
        assert_eq!(handle.current(), UiMode::ReducedComplexity);
    }

    #[test]
    fn recommendations_dedup_by_id_keeping_highest_priority() {
        let surface = RecommendationSurface::new();
        let actuator = RecommendationActuator::new(surface.clone());

        for priority in [5, 9, 7] {
            actuator
                .apply(&Decision::ShowRecommendation {
                    id: String::from("stabilize"),
                    priority,
                })
                .unwrap();
        }

        let recs = surface.prioritized();
        assert_eq!(recs.len(), 1);
        assert_eq!(recs.first().map(|r| r.priority), Some(9));
    }

    #[test]
    fn recommendations_order_by_priority_then_id() {
        let surface = RecommendationSurface::new();
        let actuator = RecommendationActuator::new(surface.clone());

        for (id, priority) in [("beta", 5), ("alpha", 5), ("urgent", 10)] {
            actuator
                .apply(&Decision::ShowRecommendation {
                    id: String::from(id),
                    priority,
                })
                .unwrap();
        }

        let ids: Vec<String> = surface.prioritized().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["urgent", "alpha", "beta"]);
    }

    #[test]
    fn scheduling_twice_keeps_the_existing_entry() {
        let queue = WorkQueue::new();
        let actuator = WorkerScheduleActuator::new(queue.clone());

        actuator.apply(&schedule_cleanup()).unwrap();
        let first = queue.pending_for("CleanupWorker").unwrap();

        actuator.apply(&schedule_cleanup()).unwrap();
        let second = queue.pending_for("CleanupWorker").unwrap();

        assert_eq!(queue.len(), 1);
        assert_eq!(first, second);
    }

    #[test]
    fn scheduled_work_is_due_after_the_requested_delay() {
        let queue = WorkQueue::new();
        let actuator = WorkerScheduleActuator::new(queue.clone());
        actuator.apply(&schedule_cleanup()).unwrap();

        let work = queue.pending_for("CleanupWorker").unwrap();
        assert_eq!(work.due_at - work.requested_at, Duration::minutes(30));
    }

    #[test]
    fn drain_due_returns_only_ripe_work_in_due_order() {
        let queue = WorkQueue::new();
        let t0 = Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap();

        assert!(queue
            .enqueue_keep_existing("CleanupWorker", Duration::minutes(30), t0)
            .unwrap());
        assert!(queue
            .enqueue_keep_existing("ProjectReviewWorker", Duration::minutes(10), t0)
            .unwrap());

        let due = queue.drain_due(t0 + Duration::minutes(15));
        let names: Vec<String> = due.into_iter().map(|w| w.worker).collect();
        assert_eq!(names, vec!["ProjectReviewWorker"]);
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn defaults_actuator_overwrites_on_rewrite() {
        let defaults = DefaultsMap::new();
        let actuator = DefaultsActuator::new(defaults.clone());

        for value in ["cleanup", "planning"] {
            actuator
                .apply(&Decision::ModifyDefault {
                    key: String::from("planner_mode"),
                    value: String::from(value),
                })
                .unwrap();
        }

        assert_eq!(defaults.get("planner_mode").as_deref(), Some("planning"));
    }
}
