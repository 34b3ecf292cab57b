//! Process-local store

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use uuid::Uuid;

use crate::lifecycle::EventPhase;
use crate::model::{Event, ListMove, ListType, SignupRecord};

use super::errors::{StoreError, StoreResult};
use super::state::StoreState;
use super::{SignupOrder, Store};

/// Store backed by in-memory tables.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<StoreState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an event (event generation lives outside the engine).
    pub fn insert_event(&self, event: Event) -> StoreResult<()> {
        self.write()?.insert_event(event);
        Ok(())
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, StoreState>> {
        self.state
            .read()
            .map_err(|_| StoreError::Internal("Lock poisoned".into()))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, StoreState>> {
        self.state
            .write()
            .map_err(|_| StoreError::Internal("Lock poisoned".into()))
    }
}

impl Store for MemoryStore {
    fn get_event(&self, event_id: Uuid) -> StoreResult<Event> {
        self.read()?.event(event_id).cloned()
    }

    fn list_events(&self) -> StoreResult<Vec<Event>> {
        Ok(self.read()?.list_events())
    }

    fn list_signups(
        &self,
        event_id: Uuid,
        list_type: ListType,
        order: SignupOrder,
    ) -> StoreResult<Vec<SignupRecord>> {
        Ok(self.read()?.list_signups(event_id, list_type, order))
    }

    fn count_signups(&self, event_id: Uuid, list_type: ListType) -> StoreResult<u32> {
        Ok(self.read()?.count_signups(event_id, list_type))
    }

    fn find_signup(&self, event_id: Uuid, user_id: Uuid) -> StoreResult<Option<SignupRecord>> {
        Ok(self.read()?.find_signup(event_id, user_id))
    }

    fn insert_signup(&self, record: SignupRecord) -> StoreResult<SignupRecord> {
        self.write()?.insert_signup(record)
    }

    fn place_signup(
        &self,
        record: SignupRecord,
        seen_phase: EventPhase,
    ) -> StoreResult<SignupRecord> {
        self.write()?.place_signup(record, seen_phase)
    }

    fn delete_signup_with_moves(
        &self,
        event_id: Uuid,
        user_id: Uuid,
        seen_revision: u64,
        moves: &[ListMove],
    ) -> StoreResult<bool> {
        self.write()?
            .delete_signup_with_moves(event_id, user_id, seen_revision, moves)
    }

    fn apply_transition(
        &self,
        event_id: Uuid,
        seen_revision: u64,
        moves: &[ListMove],
        new_phase: EventPhase,
    ) -> StoreResult<()> {
        self.write()?
            .apply_transition(event_id, seen_revision, moves, new_phase)
    }
}
