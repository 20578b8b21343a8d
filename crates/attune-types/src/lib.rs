//! Shared type definitions for the Attune adaptive control loop.
//!
//! This crate is the single source of truth for the data model that flows
//! through one control-loop tick: activity events in, a life-system state
//! snapshot out, decisions fanned out to actuators.
//!
//! # Modules
//!
//! - [`enums`] -- Categorical state dimensions and the UI adaptation mode
//! - [`event`] -- The append-only activity event log entry
//! - [`state`] -- The [`LifeSystemState`] snapshot
//! - [`decision`] -- The [`Decision`] sum type and the value objects
//!   actuators turn decisions into

pub mod decision;
pub mod enums;
pub mod event;
pub mod state;

// Re-export all public types at crate root for convenience.
pub use decision::{Decision, Recommendation, ScheduledWork};
pub use enums::{Entropy, ExecutionMode, LoadLevel, Stability, UiMode};
pub use event::{Event, EventKind};
pub use state::LifeSystemState;
