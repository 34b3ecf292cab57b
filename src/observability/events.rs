//! Observable engine events
//!
//! Events are explicit and typed; the logger only ever sees their tags.

use std::fmt;

use super::logger::Severity;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Configuration
    /// CLI configuration loaded
    ConfigLoaded,
    /// Snapshot loaded from disk
    StateLoaded,
    /// Stored phase tag rewritten at the read boundary
    LegacyPhaseMigrated,

    // Sweep
    SweepStart,
    SweepComplete,
    /// Phase change committed for one event
    PhaseTransition,
    /// Atomic commit failed; phase left unchanged for the next sweep
    TransitionCommitFailed,
    /// Holding pool shuffled and renumbered
    HoldingRandomized,
    /// Holding pool promoted into roster/overflow
    HoldingPromoted,

    // Signup path
    SignupAccepted,
    SignupRejected,
    SignupRemoved,
    /// Head of the waitlist moved into a freed roster seat
    WaitlistPromoted,
}

impl Event {
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::StateLoaded => "STATE_LOADED",
            Event::LegacyPhaseMigrated => "LEGACY_PHASE_MIGRATED",
            Event::SweepStart => "SWEEP_BEGIN",
            Event::SweepComplete => "SWEEP_COMPLETE",
            Event::PhaseTransition => "PHASE_TRANSITION",
            Event::TransitionCommitFailed => "TRANSITION_COMMIT_FAILED",
            Event::HoldingRandomized => "HOLDING_RANDOMIZED",
            Event::HoldingPromoted => "HOLDING_PROMOTED",
            Event::SignupAccepted => "SIGNUP_ACCEPTED",
            Event::SignupRejected => "SIGNUP_REJECTED",
            Event::SignupRemoved => "SIGNUP_REMOVED",
            Event::WaitlistPromoted => "WAITLIST_PROMOTED",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Event::TransitionCommitFailed => Severity::Warn,
            _ => Severity::Info,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
