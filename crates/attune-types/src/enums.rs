//! Categorical state dimensions for the life-system snapshot.
//!
//! Each dimension is a small ordered enum. Ordering matters: the inferencer
//! resolves conflicting signals with a worst-case-wins rule, which is
//! implemented as a plain `max` over the derived `Ord`.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Load level
// ---------------------------------------------------------------------------

/// How loaded the user's system currently is.
///
/// Ordered from least to most loaded so `Ord` comparisons express severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadLevel {
    /// Little or no sustained activity.
    Low,
    /// An ordinary working rhythm.
    Normal,
    /// Sustained heavy activity; simplification is warranted.
    High,
    /// Overload; the system should actively push back.
    Critical,
}

impl LoadLevel {
    /// The next level up, saturating at [`LoadLevel::Critical`].
    #[must_use]
    pub const fn step_up(self) -> Self {
        match self {
            Self::Low => Self::Normal,
            Self::Normal => Self::High,
            Self::High | Self::Critical => Self::Critical,
        }
    }

    /// The next level down, saturating at [`LoadLevel::Low`].
    #[must_use]
    pub const fn step_down(self) -> Self {
        match self {
            Self::Low | Self::Normal => Self::Low,
            Self::High => Self::Normal,
            Self::Critical => Self::High,
        }
    }

    /// Step up `levels` times, saturating at [`LoadLevel::Critical`].
    #[must_use]
    pub fn escalate(self, levels: u8) -> Self {
        (0..levels).fold(self, |level, _| level.step_up())
    }
}

// ---------------------------------------------------------------------------
// Execution mode
// ---------------------------------------------------------------------------

/// How the user is executing against their plan.
///
/// Ordered by severity: `Focused` < `Scattered` < `Stuck`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    /// Work is progressing on a small number of threads.
    Focused,
    /// Attention is split across many contexts without progress.
    Scattered,
    /// Tasks are being deferred rather than completed.
    Stuck,
}

// ---------------------------------------------------------------------------
// Stability
// ---------------------------------------------------------------------------

/// How stable the user's working context is across the observed window.
///
/// Ordered by severity: `Stable` < `Unstable` < `Fragmented`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stability {
    /// The user stays within a consistent set of projects.
    Stable,
    /// Noticeable project churn.
    Unstable,
    /// Constant hopping between projects; no context survives.
    Fragmented,
}

// ---------------------------------------------------------------------------
// Entropy
// ---------------------------------------------------------------------------

/// How much unresolved clutter (open loops) the system has accumulated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Entropy {
    /// Loops are being closed as fast as they open.
    Low,
    /// Clutter is accumulating.
    Medium,
    /// Clutter dominates; cleanup is overdue.
    High,
}

// ---------------------------------------------------------------------------
// UI mode
// ---------------------------------------------------------------------------

/// The UI adaptation mode a decision can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UiMode {
    /// The full default interface.
    Normal,
    /// Secondary chrome hidden to reduce cognitive load.
    ReducedComplexity,
    /// Single-task view for deep focus.
    Focus,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn load_level_ordering_matches_severity() {
        assert!(LoadLevel::Low < LoadLevel::Normal);
        assert!(LoadLevel::Normal < LoadLevel::High);
        assert!(LoadLevel::High < LoadLevel::Critical);
    }

    #[test]
    fn load_level_escalation_saturates() {
        assert_eq!(LoadLevel::Normal.escalate(1), LoadLevel::High);
        assert_eq!(LoadLevel::Normal.escalate(3), LoadLevel::Critical);
        assert_eq!(LoadLevel::Critical.escalate(1), LoadLevel::Critical);
        assert_eq!(LoadLevel::Normal.escalate(0), LoadLevel::Normal);
    }

    #[test]
    fn load_level_step_down_saturates() {
        assert_eq!(LoadLevel::Critical.step_down(), LoadLevel::High);
        assert_eq!(LoadLevel::Low.step_down(), LoadLevel::Low);
    }

    #[test]
    fn execution_mode_worst_case_is_max() {
        assert_eq!(
            ExecutionMode::Scattered.max(ExecutionMode::Stuck),
            ExecutionMode::Stuck
        );
        assert_eq!(
            ExecutionMode::Focused.max(ExecutionMode::Scattered),
            ExecutionMode::Scattered
        );
    }

    #[test]
    fn enums_serialize_as_snake_case() {
        let json = serde_json::to_string(&UiMode::ReducedComplexity).unwrap();
        assert_eq!(json, "\"reduced_complexity\"");
        let json = serde_json::to_string(&LoadLevel::Critical).unwrap();
        assert_eq!(json, "\"critical\"");
    }
}
