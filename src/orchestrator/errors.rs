//! # Orchestrator Errors

use thiserror::Error;
use uuid::Uuid;

use crate::lifecycle::EventPhase;
use crate::store::StoreError;

/// Result type for orchestrator operations
pub type OrchestratorResult<T> = Result<T, OrchestratorError>;

#[derive(Debug, Clone, Error)]
pub enum OrchestratorError {
    /// The atomic commit for one event failed; its phase is unchanged and
    /// the next sweep recomputes the same target from stored state.
    #[error("Transition of event {event_id} to {target} failed: {source}")]
    TransitionCommitFailure {
        event_id: Uuid,
        target: EventPhase,
        #[source]
        source: StoreError,
    },

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl OrchestratorError {
    /// Whether a later sweep may succeed where this one failed.
    pub fn is_retryable(&self) -> bool {
        match self {
            OrchestratorError::TransitionCommitFailure { source, .. } => source.is_retryable(),
            OrchestratorError::Store(e) => e.is_retryable(),
        }
    }
}
