//! The Attune adaptive control loop.
//!
//! One tick watches the host app's activity event log, infers a coarse
//! life-system state, evaluates an ordered set of independent policies
//! against that state, and fans the resulting decisions out to an ordered
//! set of actuators.
//!
//! # Modules
//!
//! - [`config`] -- Configuration loading from `attune-config.yaml` into
//!   strongly-typed structs.
//! - [`inference`] -- The pure state inference fold and its thresholds.
//! - [`policy`] -- [`Policy`] trait and the built-in policy set.
//! - [`actuator`] -- [`Actuator`] trait, the built-in actuator set, and the
//!   shared handles they write into.
//! - [`store`] -- [`EventSource`]/[`StateStore`] port traits with in-memory
//!   reference implementations.
//! - [`tick`] -- The [`ControlLoop`] driver: one tick from cursor to
//!   dispatch.
//! - [`runner`] -- Bounded interval loop around the driver.
//!
//! [`Policy`]: policy::Policy
//! [`Actuator`]: actuator::Actuator
//! [`EventSource`]: store::EventSource
//! [`StateStore`]: store::StateStore
//! [`ControlLoop`]: tick::ControlLoop

pub mod actuator;
pub mod config;
pub mod inference;
pub mod policy;
pub mod runner;
pub mod store;
pub mod tick;

// Re-export the wiring surface for the engine binary.
pub use actuator::{ActuationHandles, Actuator, ActuatorError, default_actuators};
pub use config::{AttuneConfig, ConfigError, LoopSettings, StoreMode};
pub use inference::{InferenceThresholds, infer};
pub use policy::{Policy, PolicyError, default_policies};
pub use runner::{LoopEndReason, LoopResult, log_loop_end, run_loop};
pub use store::{EventSource, MemoryEventLog, MemoryStateStore, StateStore, StoreError};
pub use tick::{ControlLoop, TickError, TickOutcome, TickSummary};
