//! In-memory table state shared by the store implementations.
//!
//! Every mutating batch validates all of its inputs before touching any
//! record, so a batch either applies completely or not at all.

use std::collections::{BTreeMap, BTreeSet};

use uuid::Uuid;

use crate::lifecycle::EventPhase;
use crate::model::{resequence, Event, ListMove, ListType, SignupRecord};
use crate::queue::PromotionAssigner;

use super::errors::{StoreError, StoreResult};
use super::SignupOrder;

#[derive(Debug, Clone, Default)]
pub(crate) struct StoreState {
    pub(crate) events: BTreeMap<Uuid, Event>,
    pub(crate) signups: BTreeMap<Uuid, SignupRecord>,
}

impl StoreState {
    pub(crate) fn event(&self, event_id: Uuid) -> StoreResult<&Event> {
        self.events
            .get(&event_id)
            .ok_or(StoreError::EventNotFound(event_id))
    }

    pub(crate) fn list_events(&self) -> Vec<Event> {
        let mut events: Vec<Event> = self.events.values().cloned().collect();
        events.sort_by(|a, b| a.event_date.cmp(&b.event_date).then(a.id.cmp(&b.id)));
        events
    }

    pub(crate) fn list_signups(
        &self,
        event_id: Uuid,
        list_type: ListType,
        order: SignupOrder,
    ) -> Vec<SignupRecord> {
        let mut records: Vec<SignupRecord> = self
            .signups
            .values()
            .filter(|r| r.event_id == event_id && r.list_type == list_type)
            .cloned()
            .collect();

        match order {
            SignupOrder::Sequence => records.sort_by(|a, b| {
                a.sequence_number
                    .cmp(&b.sequence_number)
                    .then(a.created_at.cmp(&b.created_at))
            }),
            SignupOrder::CreatedAt => records.sort_by(|a, b| {
                a.created_at
                    .cmp(&b.created_at)
                    .then(a.sequence_number.cmp(&b.sequence_number))
            }),
        }

        records
    }

    pub(crate) fn count_signups(&self, event_id: Uuid, list_type: ListType) -> u32 {
        let count = self
            .signups
            .values()
            .filter(|r| r.event_id == event_id && r.list_type == list_type)
            .count();
        u32::try_from(count).unwrap_or(u32::MAX)
    }

    pub(crate) fn find_signup(&self, event_id: Uuid, user_id: Uuid) -> Option<SignupRecord> {
        self.signups
            .values()
            .find(|r| r.event_id == event_id && r.user_id == user_id)
            .cloned()
    }

    pub(crate) fn insert_event(&mut self, event: Event) {
        self.events.insert(event.id, event);
    }

    fn check_new_signup(&self, record: &SignupRecord) -> StoreResult<()> {
        self.event(record.event_id)?;

        if self.find_signup(record.event_id, record.user_id).is_some() {
            return Err(StoreError::DuplicateSignup {
                event_id: record.event_id,
                user_id: record.user_id,
            });
        }
        Ok(())
    }

    /// Insert a record at its given position, which must be the tail of
    /// its list.
    pub(crate) fn insert_signup(&mut self, record: SignupRecord) -> StoreResult<SignupRecord> {
        self.check_new_signup(&record)?;

        let tail = self.count_signups(record.event_id, record.list_type);
        if record.sequence_number != tail.saturating_add(1) {
            return Err(StoreError::LayoutConflict {
                event_id: record.event_id,
                list_type: record.list_type,
            });
        }

        self.signups.insert(record.id, record.clone());
        self.bump_revision(record.event_id);
        Ok(record)
    }

    /// Insert a record, choosing its list and position from the counts
    /// seen inside this batch.
    ///
    /// `record.list_type` is the requested list. HOLDING entries append to
    /// HOLDING; ROSTER requests take a seat while fewer than the event's
    /// `max_signups` are seated and otherwise append to OVERFLOW. Fails
    /// with `PhaseChanged` unless the event is still in `seen_phase`.
    pub(crate) fn place_signup(
        &mut self,
        mut record: SignupRecord,
        seen_phase: EventPhase,
    ) -> StoreResult<SignupRecord> {
        self.check_new_signup(&record)?;

        let event_id = record.event_id;
        let event = self.event(event_id)?;
        if event.phase != seen_phase {
            return Err(StoreError::PhaseChanged {
                event_id,
                expected: seen_phase,
                found: event.phase,
            });
        }
        let max_signups = event.config.max_signups;

        let placement = match record.list_type {
            ListType::Holding => ListMove::new(
                record.id,
                ListType::Holding,
                self.count_signups(event_id, ListType::Holding).saturating_add(1),
            ),
            ListType::Roster | ListType::Overflow => PromotionAssigner::new(
                self.count_signups(event_id, ListType::Roster),
                max_signups,
                self.count_signups(event_id, ListType::Overflow),
            )
            .assign(record.id),
        };

        record.list_type = placement.list_type;
        record.sequence_number = placement.sequence_number;
        self.signups.insert(record.id, record.clone());
        self.bump_revision(event_id);
        Ok(record)
    }

    fn check_revision(&self, event_id: Uuid, expected: u64) -> StoreResult<()> {
        let found = self.event(event_id)?.revision;
        if found != expected {
            return Err(StoreError::StaleRevision {
                event_id,
                expected,
                found,
            });
        }
        Ok(())
    }

    fn bump_revision(&mut self, event_id: Uuid) {
        if let Some(event) = self.events.get_mut(&event_id) {
            event.revision = event.revision.wrapping_add(1);
        }
    }

    fn validate_moves(&self, event_id: Uuid, moves: &[ListMove]) -> StoreResult<()> {
        self.event(event_id)?;

        for mv in moves {
            match self.signups.get(&mv.signup_id) {
                Some(record) if record.event_id == event_id => {}
                _ => {
                    return Err(StoreError::SignupNotFound {
                        event_id,
                        signup_id: mv.signup_id,
                    })
                }
            }
        }

        Ok(())
    }

    /// Check that every list the batch touches ends up numbered `1..=n`.
    ///
    /// A batch planned from lists that changed before it committed fails
    /// here instead of leaving duplicate or stranded positions.
    fn validate_layout(
        &self,
        event_id: Uuid,
        moves: &[ListMove],
        removed: Option<Uuid>,
    ) -> StoreResult<()> {
        let mut projected: BTreeMap<Uuid, (ListType, u32)> = self
            .signups
            .values()
            .filter(|r| r.event_id == event_id)
            .map(|r| (r.id, (r.list_type, r.sequence_number)))
            .collect();

        let mut touched: BTreeSet<ListType> = BTreeSet::new();
        if let Some(id) = removed {
            if let Some((list_type, _)) = projected.remove(&id) {
                touched.insert(list_type);
            }
        }
        for mv in moves {
            if let Some(slot) = projected.get_mut(&mv.signup_id) {
                touched.insert(slot.0);
                touched.insert(mv.list_type);
                *slot = (mv.list_type, mv.sequence_number);
            }
        }

        for list_type in touched {
            let mut sequences: Vec<u32> = projected
                .values()
                .filter(|(lt, _)| *lt == list_type)
                .map(|(_, seq)| *seq)
                .collect();
            sequences.sort_unstable();

            let contiguous = sequences
                .iter()
                .enumerate()
                .all(|(idx, seq)| u32::try_from(idx + 1).map_or(false, |n| n == *seq));
            if !contiguous {
                return Err(StoreError::LayoutConflict {
                    event_id,
                    list_type,
                });
            }
        }

        Ok(())
    }

    fn write_moves(&mut self, moves: &[ListMove]) {
        for mv in moves {
            if let Some(record) = self.signups.get_mut(&mv.signup_id) {
                record.list_type = mv.list_type;
                record.sequence_number = mv.sequence_number;
            }
        }
    }

    /// Delete the (event, user) record and apply `moves` as one batch.
    ///
    /// Returns `false`, changing nothing, when no such record exists.
    pub(crate) fn delete_signup_with_moves(
        &mut self,
        event_id: Uuid,
        user_id: Uuid,
        seen_revision: u64,
        moves: &[ListMove],
    ) -> StoreResult<bool> {
        self.check_revision(event_id, seen_revision)?;
        let Some(existing) = self.find_signup(event_id, user_id) else {
            return Ok(false);
        };

        if moves.iter().any(|mv| mv.signup_id == existing.id) {
            return Err(StoreError::CommitFailed(format!(
                "move targets signup {} which is being deleted",
                existing.id
            )));
        }
        self.validate_moves(event_id, moves)?;
        self.validate_layout(event_id, moves, Some(existing.id))?;

        self.signups.remove(&existing.id);
        self.write_moves(moves);
        self.bump_revision(event_id);
        Ok(true)
    }

    pub(crate) fn apply_transition(
        &mut self,
        event_id: Uuid,
        seen_revision: u64,
        moves: &[ListMove],
        new_phase: EventPhase,
    ) -> StoreResult<()> {
        self.check_revision(event_id, seen_revision)?;
        self.validate_moves(event_id, moves)?;
        self.validate_layout(event_id, moves, None)?;

        self.write_moves(moves);
        if let Some(event) = self.events.get_mut(&event_id) {
            event.phase = new_phase;
        }
        self.bump_revision(event_id);
        Ok(())
    }

    /// Renumber every (event, list) partition to `1..=n`, keeping order.
    ///
    /// Older snapshots may hold gaps left by waitlist promotion. Returns the
    /// number of records whose position changed.
    pub(crate) fn compact_lists(&mut self) -> usize {
        let event_ids: Vec<Uuid> = self.events.keys().copied().collect();
        let mut renumbered = 0;

        for event_id in event_ids {
            for list_type in ListType::ALL {
                let ordered = self.list_signups(event_id, list_type, SignupOrder::Sequence);
                for mv in resequence(&ordered, list_type) {
                    if let Some(record) = self.signups.get_mut(&mv.signup_id) {
                        if record.sequence_number != mv.sequence_number {
                            record.sequence_number = mv.sequence_number;
                            renumbered += 1;
                        }
                    }
                }
            }
        }

        renumbered
    }
}
