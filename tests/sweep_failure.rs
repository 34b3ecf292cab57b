//! Sweep Failure Tests
//!
//! A commit that fails for one event must:
//! - Leave that event's phase and lists exactly as they were
//! - Be reported, not propagated
//! - Not stop the sweep from advancing other events
//! - Be retried by the next sweep

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, TimeZone, Utc};
use uuid::Uuid;

use rollcall::eligibility::Tier;
use rollcall::lifecycle::EventPhase;
use rollcall::model::{Event, EventTypeConfig, ListMove, ListType, SignupRecord};
use rollcall::orchestrator::Orchestrator;
use rollcall::store::{MemoryStore, SignupOrder, Store, StoreError, StoreResult};

/// Memory store whose transition commits fail for selected events.
#[derive(Debug, Default)]
struct FailingStore {
    inner: MemoryStore,
    failing: Mutex<HashSet<Uuid>>,
    fail_listing: AtomicBool,
}

impl FailingStore {
    fn fail_commits_for(&self, event_id: Uuid) {
        self.failing.lock().unwrap().insert(event_id);
    }

    fn heal(&self) {
        self.failing.lock().unwrap().clear();
    }
}

impl Store for FailingStore {
    fn get_event(&self, event_id: Uuid) -> StoreResult<Event> {
        self.inner.get_event(event_id)
    }

    fn list_events(&self) -> StoreResult<Vec<Event>> {
        if self.fail_listing.load(Ordering::SeqCst) {
            return Err(StoreError::Io("state unreadable".into()));
        }
        self.inner.list_events()
    }

    fn list_signups(
        &self,
        event_id: Uuid,
        list_type: ListType,
        order: SignupOrder,
    ) -> StoreResult<Vec<SignupRecord>> {
        self.inner.list_signups(event_id, list_type, order)
    }

    fn count_signups(&self, event_id: Uuid, list_type: ListType) -> StoreResult<u32> {
        self.inner.count_signups(event_id, list_type)
    }

    fn find_signup(&self, event_id: Uuid, user_id: Uuid) -> StoreResult<Option<SignupRecord>> {
        self.inner.find_signup(event_id, user_id)
    }

    fn insert_signup(&self, record: SignupRecord) -> StoreResult<SignupRecord> {
        self.inner.insert_signup(record)
    }

    fn place_signup(
        &self,
        record: SignupRecord,
        seen_phase: EventPhase,
    ) -> StoreResult<SignupRecord> {
        self.inner.place_signup(record, seen_phase)
    }

    fn delete_signup_with_moves(
        &self,
        event_id: Uuid,
        user_id: Uuid,
        seen_revision: u64,
        moves: &[ListMove],
    ) -> StoreResult<bool> {
        self.inner
            .delete_signup_with_moves(event_id, user_id, seen_revision, moves)
    }

    fn apply_transition(
        &self,
        event_id: Uuid,
        seen_revision: u64,
        moves: &[ListMove],
        new_phase: EventPhase,
    ) -> StoreResult<()> {
        if self.failing.lock().unwrap().contains(&event_id) {
            return Err(StoreError::CommitFailed("injected".into()));
        }
        self.inner
            .apply_transition(event_id, seen_revision, moves, new_phase)
    }
}

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 5, 6, 18, 0, 0).unwrap()
}

fn reserve_event(store: &FailingStore, holding: u32) -> Event {
    let mut event = Event::new(EventTypeConfig::with_defaults("Reserve Night"), start());
    event.phase = EventPhase::OpenForReserves;
    store.inner.insert_event(event.clone()).unwrap();

    for seq in 1..=holding {
        let record = SignupRecord::new(
            event.id,
            Uuid::new_v4(),
            ListType::Holding,
            seq,
            Tier::FirstPriority,
            start() - Duration::hours(11),
        );
        store.insert_signup(record).unwrap();
    }
    event
}

#[test]
fn test_failed_commit_leaves_event_untouched() {
    let store = Arc::new(FailingStore::default());
    let broken = reserve_event(&store, 4);
    let healthy = reserve_event(&store, 2);
    store.fail_commits_for(broken.id);

    let before = store
        .list_signups(broken.id, ListType::Holding, SignupOrder::Sequence)
        .unwrap();

    let mut orchestrator = Orchestrator::seeded(Arc::clone(&store), Some(21));
    let report = orchestrator.sweep(start() - Duration::hours(6)).unwrap();

    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].event_id, broken.id);
    assert_eq!(report.failures[0].target, EventPhase::PreliminaryOrdering);
    assert!(report.failures[0].retryable);
    assert!(!report.is_clean());

    assert_eq!(report.transitions.len(), 1);
    assert_eq!(report.transitions[0].event_id, healthy.id);

    assert_eq!(
        store.get_event(broken.id).unwrap().phase,
        EventPhase::OpenForReserves
    );
    assert_eq!(
        store
            .list_signups(broken.id, ListType::Holding, SignupOrder::Sequence)
            .unwrap(),
        before
    );
    assert_eq!(orchestrator.metrics().snapshot().transition_failures, 1);
}

#[test]
fn test_failed_commit_retried_next_sweep() {
    let store = Arc::new(FailingStore::default());
    let event = reserve_event(&store, 3);
    store.fail_commits_for(event.id);

    let now = start() - Duration::hours(2);
    let mut orchestrator = Orchestrator::seeded(Arc::clone(&store), Some(4));
    let first = orchestrator.sweep(now).unwrap();
    assert_eq!(first.failures.len(), 1);

    store.heal();
    let second = orchestrator.sweep(now).unwrap();

    assert!(second.is_clean());
    assert_eq!(second.transitions.len(), 1);
    assert_eq!(store.get_event(event.id).unwrap().phase, EventPhase::FinalOrdering);
    assert_eq!(store.count_signups(event.id, ListType::Roster).unwrap(), 3);
    assert_eq!(store.count_signups(event.id, ListType::Holding).unwrap(), 0);
}

#[test]
fn test_unreadable_event_list_aborts_sweep() {
    let store = Arc::new(FailingStore::default());
    store.fail_listing.store(true, Ordering::SeqCst);

    let mut orchestrator = Orchestrator::seeded(store, Some(1));
    assert!(orchestrator.sweep(start()).is_err());
}
