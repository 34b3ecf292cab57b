//! Single-member signup and removal
//!
//! Signup gates on the event's *stored* phase (the sweep owns phase
//! changes), then applies the same capacity rule as bulk promotion.
//!
//! Removal deletes the record and renumbers the list it left so every
//! list stays `1..=n`. Freeing a roster seat moves the head of the
//! waitlist up; holding members never take that seat, they move only at
//! the FINAL_ORDERING transition.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::eligibility::{evaluate, DenialReason, Tier};
use crate::lifecycle::EventPhase;
use crate::model::{resequence, Event, GroupId, ListMove, ListType, SignupRecord};
use crate::observability::{log_event_with_fields, Event as LogEvent, MetricsRegistry};
use crate::queue::PromotionAssigner;
use crate::store::{SignupOrder, Store};

use super::errors::{SignupError, SignupResult};

/// Accepted signup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignupOutcome {
    /// List the member was eligible for before the capacity check
    pub requested_list: ListType,
    /// The stored record; `list_type` is where the member actually landed
    pub record: SignupRecord,
}

impl SignupOutcome {
    pub fn is_waitlisted(&self) -> bool {
        self.record.list_type == ListType::Overflow
    }
}

/// Result of a removal request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemovalOutcome {
    /// The deleted record, if the member was signed up
    pub removed: Option<SignupRecord>,
    /// Waitlist member moved into the freed roster seat
    pub promoted: Option<SignupRecord>,
}

/// Sizes of the three lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ListCounts {
    pub roster: u32,
    pub overflow: u32,
    pub holding: u32,
}

/// Every list of one event, in display order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RosterView {
    pub event_id: Uuid,
    pub phase: EventPhase,
    pub max_signups: u32,
    pub roster: Vec<SignupRecord>,
    pub overflow: Vec<SignupRecord>,
    pub holding: Vec<SignupRecord>,
    pub counts: ListCounts,
}

/// A batch planned against an event that changed before it committed is
/// re-planned this many times in total before the conflict is returned.
const BATCH_ATTEMPTS: usize = 3;

/// Moves that renumber `ordered` to `1..=n`, skipping records already in place.
fn compaction_moves(ordered: &[SignupRecord], list_type: ListType) -> Vec<ListMove> {
    ordered
        .iter()
        .zip(resequence(ordered, list_type))
        .filter(|(record, mv)| {
            record.list_type != mv.list_type || record.sequence_number != mv.sequence_number
        })
        .map(|(_, mv)| mv)
        .collect()
}

/// Per-request signup entry points.
#[derive(Debug)]
pub struct SignupService<S: Store> {
    store: Arc<S>,
    metrics: Arc<MetricsRegistry>,
}

impl<S: Store> SignupService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self::with_metrics(store, Arc::new(MetricsRegistry::new()))
    }

    pub fn with_metrics(store: Arc<S>, metrics: Arc<MetricsRegistry>) -> Self {
        Self { store, metrics }
    }

    pub fn metrics(&self) -> &MetricsRegistry {
        &self.metrics
    }

    /// Sign `user_id` up for `event_id`.
    ///
    /// `memberships` is the member's resolved group list. Duplicate
    /// attempts are rejected; the store's uniqueness constraint closes the
    /// race between concurrent attempts. If the event changes phase before
    /// the record lands, eligibility is judged again under the new phase.
    pub fn signup(
        &self,
        event_id: Uuid,
        user_id: Uuid,
        memberships: &[GroupId],
        now: DateTime<Utc>,
    ) -> SignupResult<SignupOutcome> {
        let mut attempt = 1;
        let (record, tier, requested_list) = loop {
            let event = self.store.get_event(event_id)?;

            if self.store.find_signup(event_id, user_id)?.is_some() {
                return Err(self.reject(
                    event_id,
                    user_id,
                    SignupError::DuplicateSignup { event_id, user_id },
                ));
            }

            let eligibility = evaluate(&event.config, event.phase, memberships);
            let (tier, requested_list) = match (eligibility.tier, eligibility.target_list) {
                (Some(tier), Some(list)) if eligibility.allowed => (tier, list),
                _ => {
                    let reason = eligibility
                        .reason
                        .unwrap_or(DenialReason::NoValidMembership);
                    return Err(self.reject(
                        event_id,
                        user_id,
                        SignupError::EligibilityDenied { reason },
                    ));
                }
            };

            // Placement is decided inside the store's write batch
            let requested = SignupRecord::new(event_id, user_id, requested_list, 0, tier, now);
            match self.store.place_signup(requested, event.phase) {
                Ok(record) => break (record, tier, requested_list),
                Err(e) if e.is_conflict() && attempt < BATCH_ATTEMPTS => attempt += 1,
                Err(e) => return Err(self.reject(event_id, user_id, e.into())),
            }
        };

        self.metrics.increment_signups_accepted();
        self.log_accepted(&record, tier);

        Ok(SignupOutcome {
            requested_list,
            record,
        })
    }

    /// Remove `user_id` from `event_id`, renumbering and promoting as needed.
    ///
    /// Removing a member who is not signed up is not an error.
    pub fn remove(&self, event_id: Uuid, user_id: Uuid) -> SignupResult<RemovalOutcome> {
        let not_signed_up = RemovalOutcome {
            removed: None,
            promoted: None,
        };

        let mut attempt = 1;
        let (existing, promoted) = loop {
            let event = self.store.get_event(event_id)?;
            let Some(existing) = self.store.find_signup(event_id, user_id)? else {
                return Ok(not_signed_up);
            };
            let (moves, promoted) = self.plan_removal(&event, &existing)?;

            match self
                .store
                .delete_signup_with_moves(event_id, user_id, event.revision, &moves)
            {
                Ok(true) => break (existing, promoted),
                // Deleted concurrently; nothing left to do
                Ok(false) => return Ok(not_signed_up),
                Err(e) if e.is_conflict() && attempt < BATCH_ATTEMPTS => attempt += 1,
                Err(e) => return Err(e.into()),
            }
        };

        self.metrics.increment_removals();
        let event_str = event_id.to_string();
        let user_str = user_id.to_string();
        log_event_with_fields(
            LogEvent::SignupRemoved,
            &[
                ("event_id", event_str.as_str()),
                ("list", existing.list_type.as_str()),
                ("user_id", user_str.as_str()),
            ],
        );

        if let Some(ref moved) = promoted {
            self.metrics.increment_waitlist_promotions();
            let promoted_user = moved.user_id.to_string();
            let seq = moved.sequence_number.to_string();
            log_event_with_fields(
                LogEvent::WaitlistPromoted,
                &[
                    ("event_id", event_str.as_str()),
                    ("sequence", seq.as_str()),
                    ("user_id", promoted_user.as_str()),
                ],
            );
        }

        Ok(RemovalOutcome {
            removed: Some(existing),
            promoted,
        })
    }

    /// Compaction moves for the list `existing` leaves, plus the waitlist
    /// promotion a freed roster seat allows.
    fn plan_removal(
        &self,
        event: &Event,
        existing: &SignupRecord,
    ) -> SignupResult<(Vec<ListMove>, Option<SignupRecord>)> {
        let remaining: Vec<SignupRecord> = self
            .store
            .list_signups(event.id, existing.list_type, SignupOrder::Sequence)?
            .into_iter()
            .filter(|r| r.id != existing.id)
            .collect();

        let mut moves = compaction_moves(&remaining, existing.list_type);
        let mut promoted = None;

        if existing.list_type == ListType::Roster {
            let overflow =
                self.store
                    .list_signups(event.id, ListType::Overflow, SignupOrder::Sequence)?;
            let roster_count = u32::try_from(remaining.len()).unwrap_or(u32::MAX);
            let mut assigner =
                PromotionAssigner::new(roster_count, event.config.max_signups, 0);

            if let Some((head, rest)) = overflow.split_first() {
                if assigner.has_roster_seat() {
                    let mv = assigner.assign(head.id);
                    moves.push(mv);
                    moves.extend(compaction_moves(rest, ListType::Overflow));

                    let mut moved = head.clone();
                    moved.list_type = mv.list_type;
                    moved.sequence_number = mv.sequence_number;
                    promoted = Some(moved);
                }
            }
        }

        Ok((moves, promoted))
    }

    /// All three lists of an event in display order, with their sizes.
    pub fn roster_view(&self, event_id: Uuid) -> SignupResult<RosterView> {
        let event = self.store.get_event(event_id)?;
        let list = |list_type| {
            self.store
                .list_signups(event_id, list_type, SignupOrder::Sequence)
        };

        let roster = list(ListType::Roster)?;
        let overflow = list(ListType::Overflow)?;
        let holding = list(ListType::Holding)?;
        let count = |v: &Vec<SignupRecord>| u32::try_from(v.len()).unwrap_or(u32::MAX);

        Ok(RosterView {
            event_id,
            phase: event.phase,
            max_signups: event.config.max_signups,
            counts: ListCounts {
                roster: count(&roster),
                overflow: count(&overflow),
                holding: count(&holding),
            },
            roster,
            overflow,
            holding,
        })
    }

    fn reject(&self, event_id: Uuid, user_id: Uuid, err: SignupError) -> SignupError {
        if err.is_rejection() {
            self.metrics.increment_signups_rejected();
            let event_str = event_id.to_string();
            let user_str = user_id.to_string();
            let reason = err.to_string();
            log_event_with_fields(
                LogEvent::SignupRejected,
                &[
                    ("code", err.code()),
                    ("event_id", event_str.as_str()),
                    ("reason", reason.as_str()),
                    ("user_id", user_str.as_str()),
                ],
            );
        }
        err
    }

    fn log_accepted(&self, record: &SignupRecord, tier: Tier) {
        let event_str = record.event_id.to_string();
        let user_str = record.user_id.to_string();
        let seq = record.sequence_number.to_string();
        let tier = tier.to_string();
        log_event_with_fields(
            LogEvent::SignupAccepted,
            &[
                ("event_id", event_str.as_str()),
                ("list", record.list_type.as_str()),
                ("sequence", seq.as_str()),
                ("tier", tier.as_str()),
                ("user_id", user_str.as_str()),
            ],
        );
    }
}
