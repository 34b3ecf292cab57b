//! Eligibility evaluation
//!
//! Two steps: resolve the member's tier from their groups (roster group,
//! then first priority, then second priority; first match wins), then gate
//! on the event's already-resolved phase.
//!
//! | Phase                          | Tier 1 | Tier 2/3            |
//! |--------------------------------|--------|---------------------|
//! | CANCELLED / FINISHED           | denied | denied              |
//! | NOT_YET_OPEN                   | denied | denied              |
//! | OPEN_FOR_ROSTER                | ROSTER | roster members only |
//! | OPEN_FOR_RESERVES / PRELIMINARY| ROSTER | HOLDING             |
//! | FINAL_ORDERING                 | ROSTER | ROSTER              |
//!
//! ROSTER here means "may attempt the capacity-checked roster"; overflow
//! to the waitlist happens downstream.

use serde::{Deserialize, Serialize};

use crate::lifecycle::EventPhase;
use crate::model::{EventTypeConfig, GroupId, ListType};

use super::tier::Tier;

/// Why a signup attempt was denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DenialReason {
    /// Member holds none of the event's groups
    NoValidMembership,
    EventCancelled,
    EventFinished,
    NotYetOpen,
    /// Only tier 1 may sign up while the roster window is open
    RosterMembersOnly,
}

impl DenialReason {
    /// Human-readable reason, surfaced verbatim to the member.
    pub fn description(&self) -> &'static str {
        match self {
            Self::NoValidMembership => "no valid membership",
            Self::EventCancelled => "event is cancelled",
            Self::EventFinished => "event has finished",
            Self::NotYetOpen => "not yet open for signups",
            Self::RosterMembersOnly => "roster members only",
        }
    }
}

/// Result of evaluating one signup attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Eligibility {
    pub allowed: bool,
    /// Absent only when no membership matched
    pub tier: Option<Tier>,
    pub target_list: Option<ListType>,
    pub reason: Option<DenialReason>,
}

impl Eligibility {
    fn granted(tier: Tier, target_list: ListType) -> Self {
        Self {
            allowed: true,
            tier: Some(tier),
            target_list: Some(target_list),
            reason: None,
        }
    }

    fn denied(tier: Option<Tier>, reason: DenialReason) -> Self {
        Self {
            allowed: false,
            tier,
            target_list: None,
            reason: Some(reason),
        }
    }
}

/// Resolve the member's tier for this event.
///
/// `memberships` is the member's resolved group list; order is irrelevant,
/// the event's own group priority decides.
pub fn resolve_tier(config: &EventTypeConfig, memberships: &[GroupId]) -> Option<Tier> {
    let holds = |group: Option<GroupId>| group.map_or(false, |g| memberships.contains(&g));

    if holds(config.roster_group) {
        Some(Tier::Roster)
    } else if holds(config.first_priority_group) {
        Some(Tier::FirstPriority)
    } else if holds(config.second_priority_group) {
        Some(Tier::SecondPriority)
    } else {
        None
    }
}

/// Decide admission and target list for a member in `phase`.
pub fn evaluate(
    config: &EventTypeConfig,
    phase: EventPhase,
    memberships: &[GroupId],
) -> Eligibility {
    let Some(tier) = resolve_tier(config, memberships) else {
        return Eligibility::denied(None, DenialReason::NoValidMembership);
    };

    match (phase, tier) {
        (EventPhase::Cancelled, _) => Eligibility::denied(Some(tier), DenialReason::EventCancelled),
        (EventPhase::Finished, _) => Eligibility::denied(Some(tier), DenialReason::EventFinished),
        (EventPhase::NotYetOpen, _) => Eligibility::denied(Some(tier), DenialReason::NotYetOpen),
        (_, Tier::Roster) => Eligibility::granted(tier, ListType::Roster),
        (EventPhase::OpenForRoster, _) => {
            Eligibility::denied(Some(tier), DenialReason::RosterMembersOnly)
        }
        (EventPhase::OpenForReserves | EventPhase::PreliminaryOrdering, _) => {
            Eligibility::granted(tier, ListType::Holding)
        }
        (EventPhase::FinalOrdering, _) => Eligibility::granted(tier, ListType::Roster),
    }
}
