//! Per-member signup, removal and list views.

mod errors;
mod service;

pub use errors::{SignupError, SignupResult};
pub use service::{ListCounts, RemovalOutcome, RosterView, SignupOutcome, SignupService};
