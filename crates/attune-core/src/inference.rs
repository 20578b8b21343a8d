//! Pure state inference: fold the previous snapshot and a batch of new
//! events into the next [`LifeSystemState`].
//!
//! The fold runs in two steps. Events are first accumulated into a
//! signal summary (counts and maxima only, so the fold is commutative and
//! a batch that arrives out of timestamp order produces the same summary).
//! Each dimension is then derived independently from the summary.
//!
//! Conflict tie-break: **worst-case-wins per dimension**. When several
//! signals in one batch support different values for the same dimension,
//! the most severe supported value is taken. A dimension with no supporting
//! signal carries the previous snapshot's value (the fixed baseline on cold
//! start). The one recovery path on the load dimension is also
//! deterministic: a long idle stretch steps load down exactly one level,
//! and only when the batch carries no escalation signal.
//!
//! Escalation thresholds are tunables on [`InferenceThresholds`], not
//! hidden constants; the defaults documented on each field are a policy
//! choice, not observed behavior of any particular user.

use attune_types::{
    Entropy, Event, EventKind, ExecutionMode, LifeSystemState, LoadLevel, Stability,
};
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;

/// Tunable thresholds for the state inference fold.
///
/// Loaded from the `inference` section of `attune-config.yaml`; every field
/// has a default so a partial (or absent) section works.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InferenceThresholds {
    /// Continuous active minutes that raise load one level.
    #[serde(default = "default_sustained_one_level")]
    pub sustained_minutes_one_level: u32,

    /// Continuous active minutes that raise load two levels.
    #[serde(default = "default_sustained_two_levels")]
    pub sustained_minutes_two_levels: u32,

    /// Continuous active minutes that raise load three levels.
    #[serde(default = "default_sustained_three_levels")]
    pub sustained_minutes_three_levels: u32,

    /// Backlog growth (creations minus completions) that adds one load level.
    #[serde(default = "default_backlog_growth")]
    pub backlog_growth_one_level: u32,

    /// Idle minutes that step load down one level when nothing escalates.
    #[serde(default = "default_idle_recovery")]
    pub idle_recovery_minutes: u32,

    /// Deferral count (with zero completions) that flags `Stuck`.
    #[serde(default = "default_stuck_deferrals")]
    pub stuck_deferrals: u32,

    /// Context switches (with zero completions) that flag `Scattered`.
    #[serde(default = "default_scattered_switches")]
    pub scattered_context_switches: u32,

    /// Project activations that flag `Unstable`.
    #[serde(default = "default_unstable_switches")]
    pub unstable_project_switches: u32,

    /// Project activations that flag `Fragmented`.
    #[serde(default = "default_fragmented_switches")]
    pub fragmented_project_switches: u32,

    /// Open-loop score at which entropy becomes `Medium`.
    #[serde(default = "default_entropy_medium")]
    pub entropy_medium_score: u32,

    /// Open-loop score at which entropy becomes `High`.
    #[serde(default = "default_entropy_high")]
    pub entropy_high_score: u32,
}

const fn default_sustained_one_level() -> u32 {
    45
}
const fn default_sustained_two_levels() -> u32 {
    150
}
const fn default_sustained_three_levels() -> u32 {
    300
}
const fn default_backlog_growth() -> u32 {
    6
}
const fn default_idle_recovery() -> u32 {
    30
}
const fn default_stuck_deferrals() -> u32 {
    3
}
const fn default_scattered_switches() -> u32 {
    6
}
const fn default_unstable_switches() -> u32 {
    4
}
const fn default_fragmented_switches() -> u32 {
    8
}
const fn default_entropy_medium() -> u32 {
    5
}
const fn default_entropy_high() -> u32 {
    10
}

impl Default for InferenceThresholds {
    fn default() -> Self {
        Self {
            sustained_minutes_one_level: default_sustained_one_level(),
            sustained_minutes_two_levels: default_sustained_two_levels(),
            sustained_minutes_three_levels: default_sustained_three_levels(),
            backlog_growth_one_level: default_backlog_growth(),
            idle_recovery_minutes: default_idle_recovery(),
            stuck_deferrals: default_stuck_deferrals(),
            scattered_context_switches: default_scattered_switches(),
            unstable_project_switches: default_unstable_switches(),
            fragmented_project_switches: default_fragmented_switches(),
            entropy_medium_score: default_entropy_medium(),
            entropy_high_score: default_entropy_high(),
        }
    }
}

/// Commutative summary of one event batch.
#[derive(Debug, Default, Clone, Copy)]
struct Signals {
    /// Longest continuous activity stretch seen, in minutes.
    sustained_minutes: u32,
    /// Longest idle stretch seen, in minutes.
    idle_minutes: u32,
    /// Tasks created.
    creations: u32,
    /// Tasks completed.
    completions: u32,
    /// Tasks deferred.
    deferrals: u32,
    /// Screens visited.
    screen_visits: u32,
    /// Projects activated.
    project_switches: u32,
    /// Notes edited.
    note_edits: u32,
    /// Whether an explicit focus-resume was observed.
    focus_resumed: bool,
    /// Latest event timestamp in the batch.
    latest_at: Option<DateTime<Utc>>,
}

impl Signals {
    /// Accumulate one batch into a summary.
    ///
    /// Marker and unrecognized variants contribute nothing; this is what
    /// makes the fold total over any event content.
    fn accumulate(events: &[Event]) -> Self {
        let mut signals = Self::default();
        for event in events {
            signals.latest_at = Some(signals.latest_at.map_or(event.at, |t| t.max(event.at)));
            match &event.kind {
                EventKind::ActivityOngoingTick { minutes_active } => {
                    signals.sustained_minutes = signals.sustained_minutes.max(*minutes_active);
                }
                EventKind::ActivityFinished {
                    duration_minutes, ..
                } => {
                    signals.sustained_minutes = signals.sustained_minutes.max(*duration_minutes);
                }
                EventKind::IdleDetected { idle_minutes } => {
                    signals.idle_minutes = signals.idle_minutes.max(*idle_minutes);
                }
                EventKind::TaskCreated { .. } => {
                    signals.creations = signals.creations.saturating_add(1);
                }
                EventKind::TaskCompleted { .. } => {
                    signals.completions = signals.completions.saturating_add(1);
                }
                EventKind::TaskDeferred { .. } => {
                    signals.deferrals = signals.deferrals.saturating_add(1);
                }
                EventKind::ScreenVisited { .. } => {
                    signals.screen_visits = signals.screen_visits.saturating_add(1);
                }
                EventKind::ProjectActivated { .. } => {
                    signals.project_switches = signals.project_switches.saturating_add(1);
                }
                EventKind::NoteUpdated { .. } => {
                    signals.note_edits = signals.note_edits.saturating_add(1);
                }
                EventKind::FocusResumed => signals.focus_resumed = true,
                EventKind::ActivityStarted { .. }
                | EventKind::StateUpdated
                | EventKind::Unrecognized => {}
            }
        }
        signals
    }

    /// Screen visits plus project activations.
    const fn context_switches(&self) -> u32 {
        self.screen_visits.saturating_add(self.project_switches)
    }

    /// Creations plus twice the deferrals plus note edits.
    const fn open_loop_score(&self) -> u32 {
        self.creations
            .saturating_add(self.deferrals.saturating_mul(2))
            .saturating_add(self.note_edits)
    }
}

/// Fold the previous snapshot and a batch of new events into the next one.
///
/// Pure and deterministic: no I/O, no clock reads, same inputs give the
/// same snapshot. `previous` is absent only on the very first tick, in
/// which case the fold starts from [`LifeSystemState::baseline`]. Unknown
/// or malformed event content never fails the fold.
///
/// The returned `updated_at` is `now` or one millisecond past the latest
/// folded event, whichever is later, so the next tick's at-or-after cursor
/// fetch cannot replay events this tick already consumed.
#[must_use]
pub fn infer(
    previous: Option<&LifeSystemState>,
    events: &[Event],
    thresholds: &InferenceThresholds,
    now: DateTime<Utc>,
) -> LifeSystemState {
    let carried = previous.copied().unwrap_or_else(|| LifeSystemState::baseline(now));
    let signals = Signals::accumulate(events);

    let updated_at = signals
        .latest_at
        .map_or(now, |latest| now.max(latest + Duration::milliseconds(1)));

    LifeSystemState {
        load_level: derive_load(&carried, &signals, thresholds),
        execution_mode: derive_execution_mode(&carried, &signals, thresholds),
        stability: derive_stability(&carried, &signals, thresholds),
        entropy: derive_entropy(&carried, &signals, thresholds),
        updated_at,
    }
}

/// Load escalates relative to the carried level: sustained activity and
/// backlog growth push it up, a long idle stretch lets it recover one level.
fn derive_load(
    carried: &LifeSystemState,
    signals: &Signals,
    thresholds: &InferenceThresholds,
) -> LoadLevel {
    let mut levels_up: u8 = if signals.sustained_minutes >= thresholds.sustained_minutes_three_levels
    {
        3
    } else if signals.sustained_minutes >= thresholds.sustained_minutes_two_levels {
        2
    } else if signals.sustained_minutes >= thresholds.sustained_minutes_one_level {
        1
    } else {
        0
    };

    let backlog_growth = signals.creations.saturating_sub(signals.completions);
    if backlog_growth >= thresholds.backlog_growth_one_level {
        levels_up = levels_up.saturating_add(1);
    }

    if levels_up > 0 {
        carried.load_level.escalate(levels_up)
    } else if signals.idle_minutes >= thresholds.idle_recovery_minutes {
        carried.load_level.step_down()
    } else {
        carried.load_level
    }
}

/// Worst-case-wins over the execution-mode candidates the batch supports;
/// carried value when the batch supports none.
fn derive_execution_mode(
    carried: &LifeSystemState,
    signals: &Signals,
    thresholds: &InferenceThresholds,
) -> ExecutionMode {
    let mut candidate: Option<ExecutionMode> = None;

    if signals.completions > 0 || signals.focus_resumed {
        candidate = Some(ExecutionMode::Focused);
    }
    if signals.completions == 0 && signals.context_switches() >= thresholds.scattered_context_switches
    {
        candidate = Some(candidate.map_or(ExecutionMode::Scattered, |c| {
            c.max(ExecutionMode::Scattered)
        }));
    }
    if signals.completions == 0 && signals.deferrals >= thresholds.stuck_deferrals {
        candidate = Some(candidate.map_or(ExecutionMode::Stuck, |c| c.max(ExecutionMode::Stuck)));
    }

    candidate.unwrap_or(carried.execution_mode)
}

/// Project churn drives stability; a completing, low-churn batch restores
/// `Stable`; a silent batch carries.
fn derive_stability(
    carried: &LifeSystemState,
    signals: &Signals,
    thresholds: &InferenceThresholds,
) -> Stability {
    if signals.project_switches >= thresholds.fragmented_project_switches {
        Stability::Fragmented
    } else if signals.project_switches >= thresholds.unstable_project_switches {
        Stability::Unstable
    } else if signals.completions > 0 && signals.project_switches <= 1 {
        Stability::Stable
    } else {
        carried.stability
    }
}

/// The open-loop score drives entropy; a batch closing more loops than it
/// opens restores `Low`; a silent batch carries.
fn derive_entropy(
    carried: &LifeSystemState,
    signals: &Signals,
    thresholds: &InferenceThresholds,
) -> Entropy {
    let score = signals.open_loop_score();
    if score >= thresholds.entropy_high_score {
        Entropy::High
    } else if score >= thresholds.entropy_medium_score {
        Entropy::Medium
    } else if signals.completions > signals.creations {
        Entropy::Low
    } else {
        carried.entropy
    }
}
