//! Policy trait and the built-in policy set.
//!
//! A policy is a pure rule over the current [`LifeSystemState`]: it owns a
//! narrow trigger condition on one or two dimensions and emits zero or more
//! [`Decision`]s when the condition holds. Policies never read events or
//! other policies' output; the driver's decision list is the concatenation
//! of each policy's isolated result in the fixed order of
//! [`default_policies`].
//!
//! The set is constructed statically and ordered explicitly. An unordered
//! injected collection would make the decision order (and therefore the
//! actuation order) nondeterministic across runs.

use attune_types::{Decision, Entropy, ExecutionMode, LifeSystemState, LoadLevel, Stability, UiMode};

/// Errors a policy can surface during evaluation.
///
/// The driver isolates these per policy: a failing policy is logged and
/// skipped, never allowed to suppress decisions from the others.
#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
    /// The policy could not evaluate the given state.
    #[error("policy evaluation failed: {message}")]
    Evaluation {
        /// Description of the failure.
        message: String,
    },
}

/// A pure rule mapping system state to zero or more decisions.
pub trait Policy: Send + Sync {
    /// Stable name of the policy, used in logs.
    fn name(&self) -> &'static str;

    /// Evaluate the rule against the current state.
    ///
    /// Returns an empty list when the trigger condition does not hold.
    /// Must not panic for any state value.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError`] if evaluation fails; the driver logs and
    /// skips this policy for the tick.
    fn evaluate(&self, state: &LifeSystemState) -> Result<Vec<Decision>, PolicyError>;
}

/// Reacts to high or critical load by simplifying the UI and recommending
/// stabilization.
#[derive(Debug, Clone, Copy, Default)]
pub struct OverloadPolicy;

impl Policy for OverloadPolicy {
    fn name(&self) -> &'static str {
        "overload"
    }

    fn evaluate(&self, state: &LifeSystemState) -> Result<Vec<Decision>, PolicyError> {
        if state.load_level < LoadLevel::High {
            return Ok(Vec::new());
        }
        Ok(vec![
            Decision::AdaptUi {
                mode: UiMode::ReducedComplexity,
            },
            Decision::ShowRecommendation {
                id: String::from("stabilize"),
                priority: 10,
            },
        ])
    }
}

/// Reacts to stuck execution with a focus UI and a micro-intervention
/// recommendation.
#[derive(Debug, Clone, Copy, Default)]
pub struct StuckExecutionPolicy;

impl Policy for StuckExecutionPolicy {
    fn name(&self) -> &'static str {
        "stuck_execution"
    }

    fn evaluate(&self, state: &LifeSystemState) -> Result<Vec<Decision>, PolicyError> {
        if state.execution_mode != ExecutionMode::Stuck {
            return Ok(Vec::new());
        }
        Ok(vec![
            Decision::AdaptUi { mode: UiMode::Focus },
            Decision::ShowRecommendation {
                id: String::from("micro_intervention"),
                priority: 9,
            },
        ])
    }
}

/// Reacts to high entropy by flipping the planner into cleanup mode and
/// scheduling the deferred cleanup worker.
#[derive(Debug, Clone, Copy, Default)]
pub struct EntropyPolicy;

/// Delay before the cleanup worker runs, in minutes.
const CLEANUP_WORKER_DELAY_MINUTES: u32 = 30;

impl Policy for EntropyPolicy {
    fn name(&self) -> &'static str {
        "entropy"
    }

    fn evaluate(&self, state: &LifeSystemState) -> Result<Vec<Decision>, PolicyError> {
        if state.entropy != Entropy::High {
            return Ok(Vec::new());
        }
        Ok(vec![
            Decision::ModifyDefault {
                key: String::from("planner_mode"),
                value: String::from("cleanup"),
            },
            Decision::ScheduleWorker {
                worker: String::from("CleanupWorker"),
                delay_minutes: CLEANUP_WORKER_DELAY_MINUTES,
            },
        ])
    }
}

/// Reacts to a fragmented working context by recommending consolidation and
/// scheduling a deferred project review.
#[derive(Debug, Clone, Copy, Default)]
pub struct FragmentationPolicy;

/// Delay before the project review worker runs, in minutes.
const PROJECT_REVIEW_DELAY_MINUTES: u32 = 60;

impl Policy for FragmentationPolicy {
    fn name(&self) -> &'static str {
        "fragmentation"
    }

    fn evaluate(&self, state: &LifeSystemState) -> Result<Vec<Decision>, PolicyError> {
        if state.stability != Stability::Fragmented {
            return Ok(Vec::new());
        }
        Ok(vec![
            Decision::ShowRecommendation {
                id: String::from("consolidate_projects"),
                priority: 8,
            },
            Decision::ScheduleWorker {
                worker: String::from("ProjectReviewWorker"),
                delay_minutes: PROJECT_REVIEW_DELAY_MINUTES,
            },
        ])
    }
}

/// The built-in policy set in its fixed evaluation order.
#[must_use]
pub fn default_policies() -> Vec<Box<dyn Policy>> {
    vec![
        Box::new(OverloadPolicy),
        Box::new(StuckExecutionPolicy),
        Box::new(EntropyPolicy),
        Box::new(FragmentationPolicy),
    ]
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn baseline() -> LifeSystemState {
        let at = Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap();
        LifeSystemState::baseline(at)
    }

    #[test]
    fn overload_is_silent_below_high() {
        let state = baseline();
        assert!(OverloadPolicy.evaluate(&state).unwrap().is_empty());

        let mut low = state;
        low.load_level = LoadLevel::Low;
        assert!(OverloadPolicy.evaluate(&low).unwrap().is_empty());
    }

    #[test]
    fn overload_emits_simplification_then_stabilize() {
        let mut state = baseline();
        state.load_level = LoadLevel::Critical;

        let decisions = OverloadPolicy.evaluate(&state).unwrap();
        assert_eq!(
            decisions,
            vec![
                Decision::AdaptUi {
                    mode: UiMode::ReducedComplexity,
                },
                Decision::ShowRecommendation {
                    id: String::from("stabilize"),
                    priority: 10,
                },
            ]
        );
    }

    #[test]
    fn overload_also_fires_at_high() {
        let mut state = baseline();
        state.load_level = LoadLevel::High;
        assert_eq!(OverloadPolicy.evaluate(&state).unwrap().len(), 2);
    }

    #[test]
    fn stuck_emits_focus_then_micro_intervention() {
        let mut state = baseline();
        state.execution_mode = ExecutionMode::Stuck;

        let decisions = StuckExecutionPolicy.evaluate(&state).unwrap();
        assert_eq!(
            decisions,
            vec![
                Decision::AdaptUi { mode: UiMode::Focus },
                Decision::ShowRecommendation {
                    id: String::from("micro_intervention"),
                    priority: 9,
                },
            ]
        );
    }

    #[test]
    fn stuck_is_silent_for_scattered() {
        let mut state = baseline();
        state.execution_mode = ExecutionMode::Scattered;
        assert!(StuckExecutionPolicy.evaluate(&state).unwrap().is_empty());
    }

    #[test]
    fn entropy_emits_cleanup_default_then_worker() {
        let mut state = baseline();
        state.entropy = Entropy::High;

        let decisions = EntropyPolicy.evaluate(&state).unwrap();
        assert_eq!(
            decisions,
            vec![
                Decision::ModifyDefault {
                    key: String::from("planner_mode"),
                    value: String::from("cleanup"),
                },
                Decision::ScheduleWorker {
                    worker: String::from("CleanupWorker"),
                    delay_minutes: 30,
                },
            ]
        );
    }

    #[test]
    fn fragmentation_fires_only_when_fragmented() {
        let mut state = baseline();
        assert!(FragmentationPolicy.evaluate(&state).unwrap().is_empty());

        state.stability = Stability::Fragmented;
        let decisions = FragmentationPolicy.evaluate(&state).unwrap();
        assert_eq!(decisions.len(), 2);
    }

    #[test]
    fn policies_are_independent() {
        // A state that triggers all four policies at once.
        let mut state = baseline();
        state.load_level = LoadLevel::Critical;
        state.execution_mode = ExecutionMode::Stuck;
        state.entropy = Entropy::High;
        state.stability = Stability::Fragmented;

        let combined: Vec<Decision> = default_policies()
            .iter()
            .flat_map(|p| p.evaluate(&state).unwrap_or_default())
            .collect();

        let mut isolated = Vec::new();
        for policy in default_policies() {
            isolated.extend(policy.evaluate(&state).unwrap());
        }

        assert_eq!(combined, isolated);
        assert_eq!(combined.len(), 8);
    }

    #[test]
    fn policy_order_is_stable() {
        let names: Vec<&str> = default_policies().iter().map(|p| p.name()).collect();
        assert_eq!(
            names,
            vec!["overload", "stuck_execution", "entropy", "fragmentation"]
        );
    }
}
