//! # Store Errors

use thiserror::Error;
use uuid::Uuid;

use crate::lifecycle::EventPhase;
use crate::model::ListType;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Store errors
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("Event not found: {0}")]
    EventNotFound(Uuid),

    /// Uniqueness of (event, user) is enforced here, not by callers
    #[error("User {user_id} already signed up for event {event_id}")]
    DuplicateSignup { event_id: Uuid, user_id: Uuid },

    #[error("Signup {signup_id} not found on event {event_id}")]
    SignupNotFound { event_id: Uuid, signup_id: Uuid },

    /// The batch was planned against lists that have since changed
    #[error("List {list_type} of event {event_id} would not be numbered 1..n")]
    LayoutConflict { event_id: Uuid, list_type: ListType },

    /// The event or its lists changed after the batch was planned
    #[error("Event {event_id} is at revision {found}, batch was planned at {expected}")]
    StaleRevision {
        event_id: Uuid,
        expected: u64,
        found: u64,
    },

    /// The signup was judged eligible under a phase the event has left
    #[error("Event {event_id} moved from {expected} to {found}")]
    PhaseChanged {
        event_id: Uuid,
        expected: EventPhase,
        found: EventPhase,
    },

    #[error("Commit failed: {0}")]
    CommitFailed(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl StoreError {
    /// Whether the same batch may succeed on a later attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            StoreError::LayoutConflict { .. }
                | StoreError::StaleRevision { .. }
                | StoreError::PhaseChanged { .. }
                | StoreError::CommitFailed(_)
                | StoreError::Io(_)
                | StoreError::Internal(_)
        )
    }

    /// Whether re-reading the lists and planning again can succeed now.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            StoreError::LayoutConflict { .. }
                | StoreError::StaleRevision { .. }
                | StoreError::PhaseChanged { .. }
        )
    }
}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        StoreError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}
