//! Event lifecycle phases
//!
//! Phases are a closed set. Six of them are derived from time by the
//! resolver; `Cancelled` is an administrative override that the resolver
//! never produces.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Lifecycle phase of one event instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventPhase {
    /// No signups accepted yet
    NotYetOpen,
    /// Roster (tier 1) members may sign up
    OpenForRoster,
    /// Reserves join the holding pool
    OpenForReserves,
    /// Holding pool has been shuffled into a fixed order
    PreliminaryOrdering,
    /// Holding pool has been promoted; everyone joins the roster or waitlist directly
    FinalOrdering,
    /// Event has started
    Finished,
    /// Administratively cancelled
    Cancelled,
}

impl EventPhase {
    /// All phases the resolver can produce, in lifecycle order.
    pub const AUTOMATIC: [EventPhase; 6] = [
        EventPhase::NotYetOpen,
        EventPhase::OpenForRoster,
        EventPhase::OpenForReserves,
        EventPhase::PreliminaryOrdering,
        EventPhase::FinalOrdering,
        EventPhase::Finished,
    ];

    /// Canonical stored tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotYetOpen => "NOT_YET_OPEN",
            Self::OpenForRoster => "OPEN_FOR_ROSTER",
            Self::OpenForReserves => "OPEN_FOR_RESERVES",
            Self::PreliminaryOrdering => "PRELIMINARY_ORDERING",
            Self::FinalOrdering => "FINAL_ORDERING",
            Self::Finished => "FINISHED",
            Self::Cancelled => "CANCELLED",
        }
    }

    /// Terminal phases are never revisited by the sweep.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished | Self::Cancelled)
    }
}

impl fmt::Display for EventPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error returned when a tag is not one of the seven canonical phases.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown phase tag: {0}")]
pub struct UnknownPhaseTag(pub String);

impl FromStr for EventPhase {
    type Err = UnknownPhaseTag;

    /// Parses canonical tags only. Legacy tags go through
    /// [`crate::lifecycle::migrate_stored_phase`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NOT_YET_OPEN" => Ok(Self::NotYetOpen),
            "OPEN_FOR_ROSTER" => Ok(Self::OpenForRoster),
            "OPEN_FOR_RESERVES" => Ok(Self::OpenForReserves),
            "PRELIMINARY_ORDERING" => Ok(Self::PreliminaryOrdering),
            "FINAL_ORDERING" => Ok(Self::FinalOrdering),
            "FINISHED" => Ok(Self::Finished),
            "CANCELLED" => Ok(Self::Cancelled),
            other => Err(UnknownPhaseTag(other.to_string())),
        }
    }
}
