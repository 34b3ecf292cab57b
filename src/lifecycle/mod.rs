//! Event lifecycle
//!
//! - `EventPhase`: the closed set of lifecycle phases
//! - `resolve_phase`: pure time → phase mapping
//! - `migrate_stored_phase`: read-boundary handling of legacy tags

mod legacy;
mod phase;
mod resolver;

pub use legacy::{migrate_stored_phase, PhaseMigration};
pub use phase::{EventPhase, UnknownPhaseTag};
pub use resolver::{resolve_phase, EventWindows};
