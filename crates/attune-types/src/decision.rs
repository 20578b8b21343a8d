//! The decision sum type and the value objects actuators turn decisions into.
//!
//! Decisions are intended side effects, not yet executed. They are produced
//! by policies and consumed by actuators within a single tick; the control
//! loop never persists them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::UiMode;

/// An intended side effect produced by a policy.
///
/// Each variant is understood by exactly one of the built-in actuators;
/// every other actuator ignores it. Decisions are transient and regenerated
/// from the current state every tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum Decision {
    /// Surface a prioritized recommendation to the user.
    ShowRecommendation {
        /// Stable identifier of the recommendation (e.g. `"stabilize"`).
        id: String,
        /// Priority, higher is more urgent.
        priority: u8,
    },
    /// Ask the UI layer to switch adaptation mode.
    AdaptUi {
        /// The requested mode.
        mode: UiMode,
    },
    /// Mutate a default value the host app reads (e.g. the planner mode).
    ModifyDefault {
        /// The defaults key to write.
        key: String,
        /// The new value.
        value: String,
    },
    /// Enqueue a uniquely-named unit of deferred background work.
    ScheduleWorker {
        /// Name of the worker, also its idempotency key.
        worker: String,
        /// Minutes from now the work becomes due.
        delay_minutes: u32,
    },
}

/// A recommendation stored on the recommendation surface.
///
/// The surface deduplicates by [`Recommendation::id`] and keeps the highest
/// priority seen for that id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    /// Stable identifier of the recommendation.
    pub id: String,
    /// Priority, higher is more urgent.
    pub priority: u8,
    /// When the recommendation was last surfaced.
    pub surfaced_at: DateTime<Utc>,
}

/// A unit of deferred background work sitting in the work queue.
///
/// Uniquely keyed by [`ScheduledWork::worker`]; enqueueing the same worker
/// while one is pending keeps the existing entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledWork {
    /// Name of the worker to run.
    pub worker: String,
    /// When the work becomes due.
    pub due_at: DateTime<Utc>,
    /// When the work was enqueued.
    pub requested_at: DateTime<Utc>,
}
