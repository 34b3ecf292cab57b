//! # Signup Errors

use thiserror::Error;
use uuid::Uuid;

use crate::eligibility::DenialReason;
use crate::store::StoreError;

/// Result type for signup operations
pub type SignupResult<T> = Result<T, SignupError>;

/// Signup and removal errors
///
/// Overflowing to the waitlist is not an error; it is a normal outcome.
#[derive(Debug, Clone, Error)]
pub enum SignupError {
    #[error("Event not found: {0}")]
    NotFound(Uuid),

    #[error("already signed up")]
    DuplicateSignup { event_id: Uuid, user_id: Uuid },

    /// Display is the reason text, surfaced verbatim
    #[error("{}", .reason.description())]
    EligibilityDenied { reason: DenialReason },

    #[error("Store error: {0}")]
    Store(StoreError),
}

impl SignupError {
    /// Stable code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            SignupError::NotFound(_) => "NOT_FOUND",
            SignupError::DuplicateSignup { .. } => "DUPLICATE_SIGNUP",
            SignupError::EligibilityDenied { .. } => "ELIGIBILITY_DENIED",
            SignupError::Store(_) => "STORE_ERROR",
        }
    }

    /// Rejections are answers to the member, not failures of the engine.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            SignupError::DuplicateSignup { .. } | SignupError::EligibilityDenied { .. }
        )
    }
}

impl From<StoreError> for SignupError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::EventNotFound(id) => SignupError::NotFound(id),
            StoreError::DuplicateSignup { event_id, user_id } => {
                SignupError::DuplicateSignup { event_id, user_id }
            }
            other => SignupError::Store(other),
        }
    }
}
