//! Orchestrator
//!
//! Drives every event through its time-gated phases and performs the bulk
//! list moves that go with them. Each event's moves and phase write are
//! committed together through [`crate::store::Store::apply_transition`];
//! a failed commit leaves the event untouched for the next sweep.

mod errors;
mod sweep;

pub use errors::{OrchestratorError, OrchestratorResult};
pub use sweep::{
    Orchestrator, SweepReport, TransitionFailure, TransitionKind, TransitionPlan,
    TransitionRecord,
};
