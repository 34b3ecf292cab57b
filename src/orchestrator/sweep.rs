//! Phase sweep
//!
//! One invocation walks every non-terminal event:
//! 1. Resolve the target phase from time (manual events keep their phase)
//! 2. Skip when the target equals the stored phase
//! 3. Entering PRELIMINARY_ORDERING: shuffle and renumber HOLDING
//! 4. Entering FINAL_ORDERING: promote HOLDING into ROSTER/OVERFLOW in
//!    its fixed order
//! 5. Commit the moves and the phase write as one atomic batch
//!
//! Each plan carries the event revision it was read at. If a signup or
//! removal lands between planning and commit, the store rejects the batch
//! and the event is re-read and re-planned, a bounded number of times.
//!
//! Plans are built from stored state only, so a failed commit is retried
//! by the next sweep without any in-memory bookkeeping. The shuffle is the
//! one step that is not reproducible across retries.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use uuid::Uuid;

use crate::lifecycle::{resolve_phase, EventPhase};
use crate::model::{Event, ListMove, ListType};
use crate::observability::{
    log_event_at, log_event_with_fields, Event as LogEvent, MetricsRegistry, Severity,
};
use crate::queue::{fixed_queue, randomize_moves, FixedOrder, PromotionAssigner};
use crate::store::{SignupOrder, Store};

use super::errors::{OrchestratorError, OrchestratorResult};

/// Commits rejected as stale are re-planned this many times in total.
const COMMIT_ATTEMPTS: usize = 3;

/// What a transition does to the holding pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionKind {
    /// Phase write only
    PhaseOnly,
    /// HOLDING shuffled and renumbered in place
    HoldingRandomized,
    /// HOLDING promoted into ROSTER/OVERFLOW
    HoldingPromoted,
}

/// A computed, not yet committed, phase change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionPlan {
    pub event_id: Uuid,
    /// Event revision the moves were computed against
    pub revision: u64,
    pub from: EventPhase,
    pub to: EventPhase,
    pub kind: TransitionKind,
    pub moves: Vec<ListMove>,
}

/// A committed phase change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransitionRecord {
    pub event_id: Uuid,
    pub from: EventPhase,
    pub to: EventPhase,
    pub kind: TransitionKind,
    pub moves: usize,
}

/// An event whose transition will be retried by the next sweep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransitionFailure {
    pub event_id: Uuid,
    pub from: EventPhase,
    pub target: EventPhase,
    pub error: String,
    /// Whether the next sweep can be expected to succeed
    pub retryable: bool,
}

/// Summary of one sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    /// Non-terminal events examined
    pub evaluated: usize,
    /// Events left alone because their phase is pinned
    pub manual: usize,
    pub transitions: Vec<TransitionRecord>,
    pub failures: Vec<TransitionFailure>,
}

impl SweepReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Periodic phase driver.
///
/// The random source is injected; seed it for reproducible shuffles.
#[derive(Debug)]
pub struct Orchestrator<S: Store, R: Rng = StdRng> {
    store: Arc<S>,
    rng: R,
    metrics: Arc<MetricsRegistry>,
}

impl<S: Store> Orchestrator<S, StdRng> {
    /// Orchestrator with an entropy-seeded generator.
    pub fn new(store: Arc<S>) -> Self {
        Self::with_rng(store, StdRng::from_entropy())
    }

    /// Orchestrator with a fixed seed, or entropy when `seed` is `None`.
    pub fn seeded(store: Arc<S>, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::with_rng(store, rng)
    }
}

impl<S: Store, R: Rng> Orchestrator<S, R> {
    pub fn with_rng(store: Arc<S>, rng: R) -> Self {
        Self {
            store,
            rng,
            metrics: Arc::new(MetricsRegistry::new()),
        }
    }

    /// Share a metrics registry with other components.
    pub fn with_metrics(mut self, metrics: Arc<MetricsRegistry>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn metrics(&self) -> &MetricsRegistry {
        &self.metrics
    }

    /// Run one sweep over all events as of `now`.
    ///
    /// Per-event failures are collected in the report; only a failure to
    /// list events aborts the sweep.
    pub fn sweep(&mut self, now: DateTime<Utc>) -> OrchestratorResult<SweepReport> {
        let now_str = now.to_rfc3339();
        log_event_with_fields(LogEvent::SweepStart, &[("now", now_str.as_str())]);
        self.metrics.increment_sweeps();

        let mut report = SweepReport::default();

        for event in self.store.list_events()? {
            if event.phase.is_terminal() {
                continue;
            }
            report.evaluated += 1;

            if event.is_manual() {
                report.manual += 1;
                continue;
            }

            let target = resolve_phase(&event.config, event.event_date, now);
            match self.advance(&event, target) {
                Ok(Some(record)) => report.transitions.push(record),
                Ok(None) => {}
                Err(err) => {
                    self.metrics.increment_transition_failures();
                    let retryable = err.is_retryable();
                    let severity = if retryable {
                        Severity::Warn
                    } else {
                        Severity::Error
                    };
                    let event_str = event.id.to_string();
                    let error = err.to_string();
                    log_event_at(
                        LogEvent::TransitionCommitFailed,
                        severity,
                        &[
                            ("error", error.as_str()),
                            ("event_id", event_str.as_str()),
                            ("from", event.phase.as_str()),
                            ("target", target.as_str()),
                        ],
                    );
                    report.failures.push(TransitionFailure {
                        event_id: event.id,
                        from: event.phase,
                        target,
                        error,
                        retryable,
                    });
                }
            }
        }

        let transitions = report.transitions.len().to_string();
        let failures = report.failures.len().to_string();
        let evaluated = report.evaluated.to_string();
        log_event_with_fields(
            LogEvent::SweepComplete,
            &[
                ("evaluated", evaluated.as_str()),
                ("failures", failures.as_str()),
                ("transitions", transitions.as_str()),
            ],
        );

        Ok(report)
    }

    /// Plan and commit one event's move to `target`.
    ///
    /// A stale commit re-reads the event and plans again. If another
    /// writer already moved it to `target`, pinned it, or ended it, there
    /// is nothing left to do.
    fn advance(
        &mut self,
        event: &Event,
        target: EventPhase,
    ) -> OrchestratorResult<Option<TransitionRecord>> {
        let mut current = event.clone();
        let mut attempt = 1;

        let plan = loop {
            let Some(plan) = self.plan_transition(&current, target)? else {
                return Ok(None);
            };

            match self
                .store
                .apply_transition(plan.event_id, plan.revision, &plan.moves, plan.to)
            {
                Ok(()) => break plan,
                Err(source) if source.is_conflict() && attempt < COMMIT_ATTEMPTS => {
                    attempt += 1;
                    current = self.store.get_event(event.id)?;
                    if current.is_manual() || current.phase.is_terminal() {
                        return Ok(None);
                    }
                }
                Err(source) => {
                    return Err(OrchestratorError::TransitionCommitFailure {
                        event_id: plan.event_id,
                        target: plan.to,
                        source,
                    })
                }
            }
        };

        self.metrics.increment_transitions();
        self.log_committed(&plan);

        Ok(Some(TransitionRecord {
            event_id: plan.event_id,
            from: plan.from,
            to: plan.to,
            kind: plan.kind,
            moves: plan.moves.len(),
        }))
    }

    /// Compute the moves for taking `event` from its stored phase to `target`.
    ///
    /// Returns `None` when there is nothing to do. Reads stored state only.
    pub fn plan_transition(
        &mut self,
        event: &Event,
        target: EventPhase,
    ) -> OrchestratorResult<Option<TransitionPlan>> {
        let current = event.phase;
        if target == current {
            return Ok(None);
        }

        let (kind, moves) = match target {
            EventPhase::PreliminaryOrdering => {
                let holding =
                    self.store
                        .list_signups(event.id, ListType::Holding, SignupOrder::Sequence)?;
                (
                    TransitionKind::HoldingRandomized,
                    randomize_moves(&holding, &mut self.rng),
                )
            }
            EventPhase::FinalOrdering => {
                let order = if current == EventPhase::PreliminaryOrdering {
                    FixedOrder::Sequence
                } else {
                    FixedOrder::Arrival
                };
                let holding =
                    self.store
                        .list_signups(event.id, ListType::Holding, SignupOrder::Sequence)?;
                let queue = fixed_queue(&holding, order);

                let roster = self.store.count_signups(event.id, ListType::Roster)?;
                let overflow = self.store.count_signups(event.id, ListType::Overflow)?;
                let mut assigner =
                    PromotionAssigner::new(roster, event.config.max_signups, overflow);

                (TransitionKind::HoldingPromoted, assigner.assign_queue(&queue))
            }
            _ => (TransitionKind::PhaseOnly, Vec::new()),
        };

        Ok(Some(TransitionPlan {
            event_id: event.id,
            revision: event.revision,
            from: current,
            to: target,
            kind,
            moves,
        }))
    }

    fn log_committed(&self, plan: &TransitionPlan) {
        let event_str = plan.event_id.to_string();
        let moves = plan.moves.len().to_string();

        match plan.kind {
            TransitionKind::HoldingRandomized => log_event_with_fields(
                LogEvent::HoldingRandomized,
                &[("event_id", event_str.as_str()), ("members", moves.as_str())],
            ),
            TransitionKind::HoldingPromoted => log_event_with_fields(
                LogEvent::HoldingPromoted,
                &[("event_id", event_str.as_str()), ("members", moves.as_str())],
            ),
            TransitionKind::PhaseOnly => {}
        }

        log_event_with_fields(
            LogEvent::PhaseTransition,
            &[
                ("event_id", event_str.as_str()),
                ("from", plan.from.as_str()),
                ("moves", moves.as_str()),
                ("to", plan.to.as_str()),
            ],
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eligibility::Tier;
    use crate::model::{Determinant, EventTypeConfig, SignupRecord};
    use crate::store::MemoryStore;
    use chrono::{Duration, TimeZone};

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 6, 18, 0, 0).unwrap()
    }

    fn setup(phase: EventPhase) -> (Arc<MemoryStore>, Event) {
        let store = Arc::new(MemoryStore::new());
        let mut event = Event::new(EventTypeConfig::with_defaults("Evening Match"), start());
        event.phase = phase;
        store.insert_event(event.clone()).unwrap();
        (store, event)
    }

    #[test]
    fn test_phase_only_transition() {
        let (store, event) = setup(EventPhase::NotYetOpen);
        let mut orchestrator = Orchestrator::seeded(Arc::clone(&store), Some(1));

        // Default roster window opens three days before start
        let report = orchestrator.sweep(start() - Duration::days(2)).unwrap();

        assert_eq!(report.transitions.len(), 1);
        assert_eq!(report.transitions[0].kind, TransitionKind::PhaseOnly);
        assert_eq!(store.get_event(event.id).unwrap().phase, EventPhase::OpenForRoster);
    }

    #[test]
    fn test_manual_event_not_moved() {
        let store = Arc::new(MemoryStore::new());
        let mut event = Event::new(EventTypeConfig::with_defaults("Pinned"), start());
        event.determinant = Determinant::Manual;
        store.insert_event(event.clone()).unwrap();

        let mut orchestrator = Orchestrator::seeded(Arc::clone(&store), Some(1));
        let report = orchestrator.sweep(start() + Duration::days(1)).unwrap();

        assert_eq!(report.manual, 1);
        assert!(report.transitions.is_empty());
        assert_eq!(store.get_event(event.id).unwrap().phase, EventPhase::NotYetOpen);
    }

    #[test]
    fn test_terminal_events_skipped() {
        let (store, _) = setup(EventPhase::Cancelled);
        let mut orchestrator = Orchestrator::seeded(store, Some(1));
        let report = orchestrator.sweep(start() - Duration::days(1)).unwrap();
        assert_eq!(report.evaluated, 0);
    }

    #[test]
    fn test_skipped_preliminary_falls_back_to_arrival_order() {
        let (store, event) = setup(EventPhase::OpenForReserves);
        let early = SignupRecord::new(
            event.id,
            Uuid::new_v4(),
            ListType::Holding,
            2,
            Tier::SecondPriority,
            start() - Duration::hours(10),
        );
        let late = SignupRecord::new(
            event.id,
            Uuid::new_v4(),
            ListType::Holding,
            1,
            Tier::FirstPriority,
            start() - Duration::hours(9),
        );
        store.insert_signup(late.clone()).unwrap();
        store.insert_signup(early.clone()).unwrap();

        let plan = Orchestrator::seeded(Arc::clone(&store), Some(1))
            .plan_transition(&event, EventPhase::FinalOrdering)
            .unwrap()
            .unwrap();

        assert_eq!(plan.kind, TransitionKind::HoldingPromoted);
        assert_eq!(plan.moves[0], ListMove::new(early.id, ListType::Roster, 1));
        assert_eq!(plan.moves[1], ListMove::new(late.id, ListType::Roster, 2));
    }

    #[test]
    fn test_no_plan_when_phase_matches() {
        let (store, event) = setup(EventPhase::OpenForRoster);
        let plan = Orchestrator::seeded(store, Some(1))
            .plan_transition(&event, EventPhase::OpenForRoster)
            .unwrap();
        assert!(plan.is_none());
    }

    #[test]
    fn test_plan_records_revision_read() {
        let (store, event) = setup(EventPhase::OpenForReserves);
        let held = SignupRecord::new(
            event.id,
            Uuid::new_v4(),
            ListType::Holding,
            1,
            Tier::FirstPriority,
            start() - Duration::hours(9),
        );
        store.insert_signup(held).unwrap();
        let current = store.get_event(event.id).unwrap();

        let plan = Orchestrator::seeded(Arc::clone(&store), Some(1))
            .plan_transition(&current, EventPhase::FinalOrdering)
            .unwrap()
            .unwrap();

        assert_eq!(plan.revision, 1);
        assert_eq!(plan.moves.len(), 1);
    }
}
