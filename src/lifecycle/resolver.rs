//! Phase resolution
//!
//! Maps an event's timing configuration and the current time to the phase
//! the event should be in. Pure and total: the first matching boundary wins
//! and a tie on a boundary resolves to the later phase.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::model::EventTypeConfig;

use super::phase::EventPhase;

/// Absolute window boundaries for one event instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventWindows {
    pub roster_open: DateTime<Utc>,
    pub reserve_open: DateTime<Utc>,
    pub initial_scheduling: DateTime<Utc>,
    pub final_scheduling: DateTime<Utc>,
    pub event_date: DateTime<Utc>,
}

impl EventWindows {
    /// Compute boundaries by subtracting each offset from the start time.
    pub fn compute(config: &EventTypeConfig, event_date: DateTime<Utc>) -> Self {
        let before = |minutes: u32| event_date - Duration::minutes(i64::from(minutes));

        Self {
            roster_open: before(config.roster_open_minutes),
            reserve_open: before(config.reserve_open_minutes),
            initial_scheduling: before(config.initial_scheduling_minutes),
            final_scheduling: before(config.final_scheduling_minutes),
            event_date,
        }
    }

    /// Phase for `now` within these windows.
    pub fn phase_at(&self, now: DateTime<Utc>) -> EventPhase {
        if now < self.roster_open {
            EventPhase::NotYetOpen
        } else if now < self.reserve_open {
            EventPhase::OpenForRoster
        } else if now < self.initial_scheduling {
            EventPhase::OpenForReserves
        } else if now < self.final_scheduling {
            EventPhase::PreliminaryOrdering
        } else if now < self.event_date {
            EventPhase::FinalOrdering
        } else {
            EventPhase::Finished
        }
    }
}

/// Resolve the automatic phase for an event starting at `event_date`.
///
/// Never returns [`EventPhase::Cancelled`]; callers holding a cancelled
/// event must short-circuit before calling this.
pub fn resolve_phase(
    config: &EventTypeConfig,
    event_date: DateTime<Utc>,
    now: DateTime<Utc>,
) -> EventPhase {
    EventWindows::compute(config, event_date).phase_at(now)
}
