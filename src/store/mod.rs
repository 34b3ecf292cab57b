//! Storage collaborator
//!
//! The engine reads and writes events and signups only through [`Store`].
//! These rules are the store's job, not the caller's:
//! - (event, user) is unique; a second insert fails with `DuplicateSignup`
//! - a new signup's list and position are chosen inside the write batch
//! - every change to an event or its lists bumps [`Event::revision`]
//! - batches (`apply_transition`, `delete_signup_with_moves`) are
//!   all-or-nothing and carry the revision they were planned against;
//!   they fail with `StaleRevision` if it moved, and with `LayoutConflict`
//!   if they would leave a list numbered other than `1..=n`
//!
//! Conflicts ([`StoreError::is_conflict`]) mean the caller should re-read
//! and plan again.
//!
//! Implementations:
//! - [`MemoryStore`]: process-local tables behind a lock
//! - [`FileStore`]: the same tables persisted as a JSON snapshot, each
//!   batch committed with a temp-file rename

mod errors;
mod file;
mod memory;
mod state;

pub use errors::{StoreError, StoreResult};
pub use file::{FileStore, StoreSnapshot, StoredEvent};
pub use memory::MemoryStore;

use uuid::Uuid;

use crate::lifecycle::EventPhase;
use crate::model::{Event, ListMove, ListType, SignupRecord};

/// Sort key for [`Store::list_signups`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignupOrder {
    /// Sequence number, then arrival
    Sequence,
    /// Arrival, then sequence number
    CreatedAt,
}

/// Storage contract consumed by the signup service and the orchestrator.
pub trait Store: Send + Sync + std::fmt::Debug {
    /// Fetch one event with its embedded config.
    fn get_event(&self, event_id: Uuid) -> StoreResult<Event>;

    /// All events, ordered by start time.
    fn list_events(&self) -> StoreResult<Vec<Event>>;

    fn list_signups(
        &self,
        event_id: Uuid,
        list_type: ListType,
        order: SignupOrder,
    ) -> StoreResult<Vec<SignupRecord>>;

    fn count_signups(&self, event_id: Uuid, list_type: ListType) -> StoreResult<u32>;

    /// The member's record on this event, on any list.
    fn find_signup(&self, event_id: Uuid, user_id: Uuid) -> StoreResult<Option<SignupRecord>>;

    /// Insert a record at the tail of its list.
    ///
    /// Fails with `DuplicateSignup` if (event, user) exists and with
    /// `LayoutConflict` if `sequence_number` is not the next position.
    fn insert_signup(&self, record: SignupRecord) -> StoreResult<SignupRecord>;

    /// Insert a new signup whose placement is decided atomically.
    ///
    /// `record.list_type` is the requested list and its sequence number is
    /// ignored. ROSTER requests overflow once the event's `max_signups`
    /// are seated. Fails with `PhaseChanged` unless the event is still in
    /// `seen_phase`. Returns the record as stored.
    fn place_signup(
        &self,
        record: SignupRecord,
        seen_phase: EventPhase,
    ) -> StoreResult<SignupRecord>;

    /// Delete the (event, user) record and apply `moves` atomically.
    ///
    /// Returns `false`, with nothing applied, if the record does not exist.
    fn delete_signup_with_moves(
        &self,
        event_id: Uuid,
        user_id: Uuid,
        seen_revision: u64,
        moves: &[ListMove],
    ) -> StoreResult<bool>;

    /// Apply `moves` and write `new_phase` atomically.
    fn apply_transition(
        &self,
        event_id: Uuid,
        seen_revision: u64,
        moves: &[ListMove],
        new_phase: EventPhase,
    ) -> StoreResult<()>;
}
