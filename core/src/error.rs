//! Error types for enrollment operations.

use crate::types::{CourseId, PromotionId, RequestStatus};
use thiserror::Error;

/// Result type alias for enrollment operations.
pub type Result<T> = std::result::Result<T, EnrollmentError>;

/// Error taxonomy for the reservation engine.
///
/// Every public operation either commits in full or aborts with one of
/// these; nothing is partially committed. `Conflict` and `QuotaExhausted`
/// are not safely auto-retryable — the chosen resource may now be
/// exhausted, so resolution is pushed to the caller.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EnrollmentError {
    // ═══════════════════════════════════════════════════════════
    // Caller errors
    // ═══════════════════════════════════════════════════════════

    /// Malformed or missing input; never touches the transaction.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Unknown course, request, or promotion id.
    #[error("{what} {id} not found")]
    NotFound {
        /// Resource kind ("course", "request", "promotion")
        what: &'static str,
        /// The id that was looked up
        id: String,
    },

    /// A decision was applied to a request that is not in an open status.
    #[error("Cannot transition request from {from} to {to}")]
    InvalidTransition {
        /// Current status of the request
        from: RequestStatus,
        /// Status the caller tried to move it to
        to: RequestStatus,
    },

    // ═══════════════════════════════════════════════════════════
    // Capacity errors
    // ═══════════════════════════════════════════════════════════

    /// The course has no seats left or is not accepting requests.
    #[error("No seats available on course {course_id}")]
    NoSeats {
        /// The exhausted course
        course_id: CourseId,
    },

    /// A guarded decrement affected zero rows — lost a capacity race.
    #[error("Seat conflict: {0}")]
    Conflict(String),

    /// The promotion's usage quota is consumed.
    #[error("Quota exhausted for promotion {promotion_id}")]
    QuotaExhausted {
        /// The exhausted promotion
        promotion_id: PromotionId,
    },

    // ═══════════════════════════════════════════════════════════
    // Infrastructure errors
    // ═══════════════════════════════════════════════════════════

    /// Unexpected datastore failure; the transaction is rolled back.
    #[error("Database error: {0}")]
    Database(String),
}

impl EnrollmentError {
    /// Shorthand for a not-found error with a displayable id.
    #[must_use]
    pub fn not_found(what: &'static str, id: impl std::fmt::Display) -> Self {
        Self::NotFound {
            what,
            id: id.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_transition_message_names_both_statuses() {
        let err = EnrollmentError::InvalidTransition {
            from: RequestStatus::Approved,
            to: RequestStatus::Rejected,
        };
        assert_eq!(
            err.to_string(),
            "Cannot transition request from approved to rejected"
        );
    }

    #[test]
    fn not_found_carries_resource_kind() {
        let id = CourseId::new();
        let err = EnrollmentError::not_found("course", id);
        assert_eq!(err.to_string(), format!("course {id} not found"));
    }
}
