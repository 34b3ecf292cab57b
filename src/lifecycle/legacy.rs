//! Legacy phase tag migration
//!
//! Older records carry tags outside the closed phase set: case variants of
//! the cancellation tag and deprecated catch-all tags whose real phase has
//! to be derived from time. This is the only place those tags are
//! understood; everything past the read boundary sees [`EventPhase`].

use chrono::{DateTime, Utc};

use crate::model::EventTypeConfig;

use super::phase::EventPhase;
use super::resolver::resolve_phase;

/// Outcome of reading a stored phase tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseMigration {
    /// Phase to use from here on
    pub phase: EventPhase,
    /// True when the stored tag was not canonical and must be rewritten
    pub migrated: bool,
}

/// Convert a stored phase tag into an [`EventPhase`].
///
/// Canonical tags pass through unchanged. `Cancelled`/`cancelled` map to
/// `CANCELLED`. Any other tag (`SCHEDULED`, `PENDING`, ...) is treated as
/// the deprecated catch-all and recomputed from the event's windows.
pub fn migrate_stored_phase(
    tag: &str,
    config: &EventTypeConfig,
    event_date: DateTime<Utc>,
    now: DateTime<Utc>,
) -> PhaseMigration {
    if let Ok(phase) = tag.parse::<EventPhase>() {
        return PhaseMigration {
            phase,
            migrated: false,
        };
    }

    let phase = if tag.eq_ignore_ascii_case("cancelled") {
        EventPhase::Cancelled
    } else {
        resolve_phase(config, event_date, now)
    };

    PhaseMigration {
        phase,
        migrated: true,
    }
}
