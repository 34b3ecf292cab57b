//! rollcall - admission and waitlist ordering for capacity-limited recurring events
//!
//! The engine decides, for a member and a moment in time, whether they may
//! join an event's roster, must wait, or are rejected, and drives each event
//! through its time-gated lifecycle phases.

pub mod cli;
pub mod eligibility;
pub mod lifecycle;
pub mod model;
pub mod observability;
pub mod orchestrator;
pub mod queue;
pub mod signup;
pub mod store;
