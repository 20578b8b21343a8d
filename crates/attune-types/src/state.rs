//! The life-system state snapshot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::{Entropy, ExecutionMode, LoadLevel, Stability};

/// A snapshot of the inferred life-system state.
///
/// Four independent categorical dimensions plus the timestamp of the tick
/// that produced the snapshot. Every dimension always holds exactly one
/// value; there is no unknown state. The snapshot is single-writer: only the
/// tick driver persists it, once per tick, after a successful inference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifeSystemState {
    /// How loaded the user currently is.
    pub load_level: LoadLevel,
    /// How the user is executing against their plan.
    pub execution_mode: ExecutionMode,
    /// How stable the working context is.
    pub stability: Stability,
    /// How much unresolved clutter has accumulated.
    pub entropy: Entropy,
    /// Timestamp of the tick that produced this snapshot. Doubles as the
    /// event-fetch cursor for the next tick.
    pub updated_at: DateTime<Utc>,
}

impl LifeSystemState {
    /// The fixed cold-start baseline: `Normal / Focused / Stable / Low`.
    ///
    /// Used as the fold starting point on the very first tick, before any
    /// event-derived adjustments.
    #[must_use]
    pub const fn baseline(updated_at: DateTime<Utc>) -> Self {
        Self {
            load_level: LoadLevel::Normal,
            execution_mode: ExecutionMode::Focused,
            stability: Stability::Stable,
            entropy: Entropy::Low,
            updated_at,
        }
    }

    /// Whether the four dimensions match `other`, ignoring `updated_at`.
    #[must_use]
    pub fn same_dimensions(&self, other: &Self) -> bool {
        self.load_level == other.load_level
            && self.execution_mode == other.execution_mode
            && self.stability == other.stability
            && self.entropy == other.entropy
    }
}
