//! Admission Flow Tests
//!
//! End-to-end runs of the signup service and the phase sweep against the
//! in-memory store:
//! - Tier-gated admission and capacity overflow
//! - Holding pool randomization and promotion
//! - Removal with compaction and waitlist promotion
//! - Sequence contiguity after every operation

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use uuid::Uuid;

use rollcall::eligibility::{DenialReason, Tier};
use rollcall::lifecycle::EventPhase;
use rollcall::model::{Event, EventTypeConfig, ListType, SignupRecord};
use rollcall::orchestrator::{Orchestrator, TransitionKind};
use rollcall::signup::{SignupError, SignupService};
use rollcall::store::{MemoryStore, SignupOrder, Store};

// =============================================================================
// Fixture
// =============================================================================

struct Fixture {
    store: Arc<MemoryStore>,
    service: SignupService<MemoryStore>,
    event: Event,
    roster_group: Uuid,
    first_group: Uuid,
    second_group: Uuid,
}

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 5, 6, 18, 0, 0).unwrap()
}

/// Inside the reserve window (opens 12h before start)
fn reserves_time() -> DateTime<Utc> {
    start() - Duration::hours(10)
}

/// Inside the preliminary window (opens 7h before start)
fn preliminary_time() -> DateTime<Utc> {
    start() - Duration::hours(6)
}

/// Inside the final window (opens 3h before start)
fn final_time() -> DateTime<Utc> {
    start() - Duration::hours(2)
}

fn fixture(max_signups: u32, phase: EventPhase) -> Fixture {
    let roster_group = Uuid::new_v4();
    let first_group = Uuid::new_v4();
    let second_group = Uuid::new_v4();

    let mut config = EventTypeConfig::with_defaults("Tuesday Session");
    config.max_signups = max_signups;
    config.roster_group = Some(roster_group);
    config.first_priority_group = Some(first_group);
    config.second_priority_group = Some(second_group);

    let mut event = Event::new(config, start());
    event.phase = phase;

    let store = Arc::new(MemoryStore::new());
    store.insert_event(event.clone()).unwrap();
    let service = SignupService::new(Arc::clone(&store));

    Fixture {
        store,
        service,
        event,
        roster_group,
        first_group,
        second_group,
    }
}

impl Fixture {
    fn group(&self, tier: Tier) -> Uuid {
        match tier {
            Tier::Roster => self.roster_group,
            Tier::FirstPriority => self.first_group,
            Tier::SecondPriority => self.second_group,
        }
    }

    fn sign(&self, tier: Tier, at: DateTime<Utc>) -> SignupRecord {
        self.service
            .signup(self.event.id, Uuid::new_v4(), &[self.group(tier)], at)
            .unwrap()
            .record
    }

    fn list(&self, list_type: ListType) -> Vec<SignupRecord> {
        self.store
            .list_signups(self.event.id, list_type, SignupOrder::Sequence)
            .unwrap()
    }

    fn ids(&self, list_type: ListType) -> Vec<Uuid> {
        self.list(list_type).into_iter().map(|r| r.id).collect()
    }

    fn phase(&self) -> EventPhase {
        self.store.get_event(self.event.id).unwrap().phase
    }

    fn assert_contiguous(&self) {
        for list_type in ListType::ALL {
            let sequences: Vec<u32> = self
                .list(list_type)
                .iter()
                .map(|r| r.sequence_number)
                .collect();
            let expected: Vec<u32> = (1..=sequences.len() as u32).collect();
            assert_eq!(sequences, expected, "{} is not 1..n", list_type);
        }
    }
}

// =============================================================================
// Tier-gated admission
// =============================================================================

/// A first-priority member cannot join while only roster members may.
#[test]
fn test_priority_member_rejected_in_roster_window() {
    let f = fixture(2, EventPhase::OpenForRoster);

    let err = f
        .service
        .signup(f.event.id, Uuid::new_v4(), &[f.second_group], reserves_time())
        .unwrap_err();

    assert!(matches!(
        err,
        SignupError::EligibilityDenied {
            reason: DenialReason::RosterMembersOnly
        }
    ));
    assert_eq!(err.to_string(), "roster members only");
    assert!(f.list(ListType::Holding).is_empty());
}

/// A roster member arriving at a full roster lands at the head of overflow.
#[test]
fn test_roster_member_overflows_when_full() {
    let f = fixture(2, EventPhase::OpenForRoster);
    f.sign(Tier::Roster, reserves_time());
    f.sign(Tier::Roster, reserves_time());

    let outcome = f
        .service
        .signup(f.event.id, Uuid::new_v4(), &[f.roster_group], reserves_time())
        .unwrap();

    assert_eq!(outcome.requested_list, ListType::Roster);
    assert!(outcome.is_waitlisted());
    assert_eq!(outcome.record.sequence_number, 1);
    f.assert_contiguous();
}

/// Members with no recognised group are refused in every phase.
#[test]
fn test_no_membership_rejected() {
    let f = fixture(2, EventPhase::FinalOrdering);

    let err = f
        .service
        .signup(f.event.id, Uuid::new_v4(), &[Uuid::new_v4()], final_time())
        .unwrap_err();

    assert_eq!(err.to_string(), "no valid membership");
}

// =============================================================================
// Holding pool lifecycle
// =============================================================================

/// Tier-2 members precede tier-3 after the shuffle, and the final
/// transition fills the roster in that order.
#[test]
fn test_holding_randomized_then_promoted() {
    let f = fixture(2, EventPhase::OpenForReserves);
    let a = f.sign(Tier::FirstPriority, reserves_time());
    let b = f.sign(Tier::SecondPriority, reserves_time());
    let c = f.sign(Tier::FirstPriority, reserves_time());

    let mut orchestrator =
        Orchestrator::with_rng(Arc::clone(&f.store), StdRng::seed_from_u64(11));

    let report = orchestrator.sweep(preliminary_time()).unwrap();
    assert_eq!(report.transitions.len(), 1);
    assert_eq!(report.transitions[0].kind, TransitionKind::HoldingRandomized);
    assert_eq!(f.phase(), EventPhase::PreliminaryOrdering);

    let holding = f.ids(ListType::Holding);
    assert_eq!(holding.len(), 3);
    assert_eq!(holding[2], b.id);
    assert!(holding[..2].contains(&a.id));
    assert!(holding[..2].contains(&c.id));
    f.assert_contiguous();

    let report = orchestrator.sweep(final_time()).unwrap();
    assert_eq!(report.transitions[0].kind, TransitionKind::HoldingPromoted);
    assert_eq!(f.phase(), EventPhase::FinalOrdering);

    assert_eq!(f.ids(ListType::Roster), holding[..2].to_vec());
    assert_eq!(f.ids(ListType::Overflow), vec![b.id]);
    assert!(f.list(ListType::Holding).is_empty());
    f.assert_contiguous();
}

/// The order consumed at FINAL is exactly the order fixed at PRELIMINARY.
#[test]
fn test_final_consumes_preliminary_order() {
    let f = fixture(4, EventPhase::OpenForReserves);
    for i in 0..9 {
        let tier = if i % 3 == 0 {
            Tier::SecondPriority
        } else {
            Tier::FirstPriority
        };
        f.sign(tier, reserves_time() + Duration::minutes(i));
    }

    let mut orchestrator = Orchestrator::seeded(Arc::clone(&f.store), Some(99));
    orchestrator.sweep(preliminary_time()).unwrap();
    let fixed = f.ids(ListType::Holding);

    orchestrator.sweep(final_time()).unwrap();
    let mut consumed = f.ids(ListType::Roster);
    consumed.extend(f.ids(ListType::Overflow));

    assert_eq!(consumed, fixed);
}

/// Members already on the roster keep their seats; promotion fills only
/// the remaining capacity.
#[test]
fn test_promotion_respects_capacity() {
    let f = fixture(3, EventPhase::OpenForReserves);
    let early = f.sign(Tier::Roster, reserves_time());
    for _ in 0..6 {
        f.sign(Tier::FirstPriority, reserves_time());
    }

    let mut orchestrator = Orchestrator::seeded(Arc::clone(&f.store), Some(5));
    orchestrator.sweep(preliminary_time()).unwrap();
    orchestrator.sweep(final_time()).unwrap();

    let roster = f.list(ListType::Roster);
    assert_eq!(roster.len(), 3);
    assert_eq!(roster[0].id, early.id);
    assert_eq!(f.list(ListType::Overflow).len(), 4);
    f.assert_contiguous();
}

/// Late tier-2 signups during PRELIMINARY join the back of the fixed order.
#[test]
fn test_preliminary_signup_appends_to_holding() {
    let f = fixture(5, EventPhase::OpenForReserves);
    f.sign(Tier::SecondPriority, reserves_time());
    f.sign(Tier::FirstPriority, reserves_time());

    let mut orchestrator = Orchestrator::seeded(Arc::clone(&f.store), Some(1));
    orchestrator.sweep(preliminary_time()).unwrap();

    let late = f.sign(Tier::FirstPriority, preliminary_time());
    assert_eq!(late.list_type, ListType::Holding);
    assert_eq!(late.sequence_number, 3);
    f.assert_contiguous();

    orchestrator.sweep(final_time()).unwrap();
    assert_eq!(f.ids(ListType::Roster)[2], late.id);
}

/// Running the sweep twice at the same instant changes nothing the second time.
#[test]
fn test_sweep_idempotent() {
    let f = fixture(2, EventPhase::OpenForReserves);
    for _ in 0..4 {
        f.sign(Tier::FirstPriority, reserves_time());
    }

    let mut orchestrator = Orchestrator::seeded(Arc::clone(&f.store), Some(3));
    let first = orchestrator.sweep(preliminary_time()).unwrap();
    let holding = f.list(ListType::Holding);

    let second = orchestrator.sweep(preliminary_time()).unwrap();

    assert_eq!(first.transitions.len(), 1);
    assert!(second.transitions.is_empty());
    assert_eq!(f.list(ListType::Holding), holding);
}

/// An event swept for the first time after its final window opened still
/// promotes its holding pool, in arrival order.
#[test]
fn test_late_first_sweep_uses_arrival_order() {
    let f = fixture(1, EventPhase::OpenForReserves);
    let first = f.sign(Tier::SecondPriority, reserves_time());
    let second = f.sign(Tier::FirstPriority, reserves_time() + Duration::minutes(5));

    let mut orchestrator = Orchestrator::seeded(Arc::clone(&f.store), Some(8));
    orchestrator.sweep(final_time()).unwrap();

    assert_eq!(f.ids(ListType::Roster), vec![first.id]);
    assert_eq!(f.ids(ListType::Overflow), vec![second.id]);
}

/// Finished events are no longer evaluated.
#[test]
fn test_finished_event_left_alone() {
    let f = fixture(2, EventPhase::FinalOrdering);
    let mut orchestrator = Orchestrator::seeded(Arc::clone(&f.store), Some(1));

    orchestrator.sweep(start() + Duration::hours(1)).unwrap();
    assert_eq!(f.phase(), EventPhase::Finished);

    let report = orchestrator.sweep(start() + Duration::hours(2)).unwrap();
    assert_eq!(report.evaluated, 0);
}

// =============================================================================
// Removal
// =============================================================================

/// Removing a roster member promotes the head of overflow and compacts
/// both lists.
#[test]
fn test_removal_promotes_overflow_head() {
    let f = fixture(2, EventPhase::OpenForRoster);
    let u1 = f.sign(Tier::Roster, reserves_time());
    let u2 = f.sign(Tier::Roster, reserves_time());
    let u3 = f.sign(Tier::Roster, reserves_time());
    let u4 = f.sign(Tier::Roster, reserves_time());
    assert_eq!(u3.list_type, ListType::Overflow);

    let outcome = f.service.remove(f.event.id, u1.user_id).unwrap();

    assert_eq!(outcome.removed.map(|r| r.id), Some(u1.id));
    assert_eq!(outcome.promoted.as_ref().map(|r| r.id), Some(u3.id));
    assert_eq!(f.ids(ListType::Roster), vec![u2.id, u3.id]);

    let overflow = f.list(ListType::Overflow);
    assert_eq!(overflow.len(), 1);
    assert_eq!(overflow[0].id, u4.id);
    assert_eq!(overflow[0].sequence_number, 1);
    f.assert_contiguous();
}

/// Removing from overflow never promotes anyone.
#[test]
fn test_overflow_removal_compacts_only() {
    let f = fixture(1, EventPhase::OpenForRoster);
    let seated = f.sign(Tier::Roster, reserves_time());
    let w1 = f.sign(Tier::Roster, reserves_time());
    let w2 = f.sign(Tier::Roster, reserves_time());

    let outcome = f.service.remove(f.event.id, w1.user_id).unwrap();

    assert!(outcome.promoted.is_none());
    assert_eq!(f.ids(ListType::Roster), vec![seated.id]);
    assert_eq!(f.ids(ListType::Overflow), vec![w2.id]);
    f.assert_contiguous();
}

/// Removing someone who is not signed up is a no-op.
#[test]
fn test_remove_absent_member() {
    let f = fixture(2, EventPhase::OpenForRoster);
    let outcome = f.service.remove(f.event.id, Uuid::new_v4()).unwrap();
    assert!(outcome.removed.is_none());
    assert!(outcome.promoted.is_none());
}

/// Contiguity holds across a mixed run of signups and removals.
#[test]
fn test_contiguity_under_churn() {
    let f = fixture(3, EventPhase::OpenForRoster);
    let mut members = Vec::new();
    for i in 0..8 {
        members.push(f.sign(Tier::Roster, reserves_time() + Duration::minutes(i)));
    }

    for idx in [0, 4, 2, 7] {
        f.service.remove(f.event.id, members[idx].user_id).unwrap();
        f.assert_contiguous();
    }

    let view = f.service.roster_view(f.event.id).unwrap();
    assert_eq!(view.counts.roster, 3);
    assert_eq!(view.counts.overflow, 1);
    assert_eq!(view.roster.len(), 3);
}

/// Repeat signups are rejected and leave the lists untouched.
#[test]
fn test_duplicate_signup_rejected() {
    let f = fixture(2, EventPhase::OpenForRoster);
    let user = Uuid::new_v4();
    f.service
        .signup(f.event.id, user, &[f.roster_group], reserves_time())
        .unwrap();

    let err = f
        .service
        .signup(f.event.id, user, &[f.roster_group], reserves_time())
        .unwrap_err();

    assert_eq!(err.code(), "DUPLICATE_SIGNUP");
    assert_eq!(f.list(ListType::Roster).len(), 1);
}
