//! The append-only activity event log entry.
//!
//! Events are written by the host app as the user works (activity tracking,
//! task CRUD, screen navigation) and read by the control loop strictly by
//! timestamp cursor. The loop never mutates or deletes them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One entry in the activity event log.
///
/// Immutable once written. Ordered by [`Event::at`]; the control loop fetches
/// only entries at or after its cursor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// When the event occurred.
    pub at: DateTime<Utc>,
    /// What happened.
    pub kind: EventKind,
}

impl Event {
    /// Create an event at the given timestamp.
    #[must_use]
    pub const fn new(at: DateTime<Utc>, kind: EventKind) -> Self {
        Self { at, kind }
    }
}

/// The closed set of activity event variants.
///
/// The tag is serialized as a `kind` field so rows written by newer app
/// versions with variants this build does not know about deserialize into
/// [`EventKind::Unrecognized`] instead of failing the whole batch. The
/// inferencer treats `Unrecognized` (and the marker variants) as carrying
/// no signal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventKind {
    /// The user started a tracked activity.
    ActivityStarted {
        /// Identifier of the activity record in the host app.
        activity_id: String,
    },
    /// A tracked activity finished.
    ActivityFinished {
        /// Identifier of the activity record in the host app.
        activity_id: String,
        /// Total minutes the activity ran.
        duration_minutes: u32,
    },
    /// Periodic heartbeat while an activity is still running.
    ActivityOngoingTick {
        /// Continuous minutes of activity so far.
        minutes_active: u32,
    },
    /// The user navigated to a screen.
    ScreenVisited {
        /// Route name of the visited screen.
        screen: String,
    },
    /// A task was created.
    TaskCreated {
        /// Identifier of the task in the host app.
        task_id: String,
    },
    /// A task was completed.
    TaskCompleted {
        /// Identifier of the task in the host app.
        task_id: String,
    },
    /// A task was pushed to a later day instead of being done.
    TaskDeferred {
        /// Identifier of the task in the host app.
        task_id: String,
    },
    /// No interaction was observed for a stretch of time.
    IdleDetected {
        /// Length of the idle stretch in minutes.
        idle_minutes: u32,
    },
    /// The user switched to a different project context.
    ProjectActivated {
        /// Identifier of the activated project.
        project_id: String,
    },
    /// A note document was edited.
    NoteUpdated {
        /// Identifier of the note document.
        note_id: String,
    },
    /// The user returned to a previously interrupted focus session.
    FocusResumed,
    /// Marker the host app writes after consuming a new state snapshot.
    StateUpdated,
    /// Catch-all for event kinds this build does not know about.
    #[serde(other)]
    Unrecognized,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn event_kind_round_trips() {
        let kind = EventKind::ActivityOngoingTick { minutes_active: 60 };
        let json = serde_json::to_string(&kind).unwrap();
        assert_eq!(json, r#"{"kind":"activity_ongoing_tick","minutes_active":60}"#);
        let back: EventKind = serde_json::from_str(&json).unwrap();
        assert_eq!(back, kind);
    }

    #[test]
    fn unknown_kind_deserializes_to_unrecognized() {
        let json = r#"{"kind":"hologram_calibrated","wavelength":7}"#;
        let kind: EventKind = serde_json::from_str(json).unwrap();
        assert_eq!(kind, EventKind::Unrecognized);
    }

    #[test]
    fn unit_variants_round_trip() {
        for kind in [EventKind::FocusResumed, EventKind::StateUpdated] {
            let json = serde_json::to_string(&kind).unwrap();
            let back: EventKind = serde_json::from_str(&json).unwrap();
            assert_eq!(back, kind);
        }
    }
}
