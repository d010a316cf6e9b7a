//! Error types for web handlers.
//!
//! Bridges the domain error taxonomy to HTTP responses via Axum's
//! `IntoResponse` trait.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use enroll_core::EnrollmentError;
use serde::Serialize;
use std::fmt;

/// Application error type for web handlers.
///
/// Wraps domain errors and provides HTTP-friendly error responses with a
/// stable machine-readable code alongside the human-readable message.
#[derive(Debug)]
pub struct AppError {
    /// HTTP status code
    status: StatusCode,
    /// Error message (user-facing)
    message: String,
    /// Error code (for client error handling)
    code: &'static str,
}

impl AppError {
    /// Create a new application error.
    #[must_use]
    pub const fn new(status: StatusCode, message: String, code: &'static str) -> Self {
        Self {
            status,
            message,
            code,
        }
    }

    /// Create a 400 Bad Request error.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message.into(), "BAD_REQUEST")
    }

    /// Create a 404 Not Found error.
    #[must_use]
    pub fn not_found(resource: impl fmt::Display, id: impl fmt::Display) -> Self {
        Self::new(
            StatusCode::NOT_FOUND,
            format!("{resource} with id {id} not found"),
            "NOT_FOUND",
        )
    }

    /// Create a 409 Conflict error.
    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message.into(), "CONFLICT")
    }

    /// Create a 500 Internal Server Error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            message.into(),
            "INTERNAL_SERVER_ERROR",
        )
    }

    /// The HTTP status this error maps to.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for AppError {}

/// Error response body (JSON).
#[derive(Debug, Serialize)]
struct ErrorResponse {
    /// Error code (for client error handling).
    code: &'static str,
    /// Human-readable error message.
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log internal errors
        if self.status.is_server_error() {
            tracing::error!(
                status = %self.status,
                code = %self.code,
                message = %self.message,
                "Internal server error"
            );
        }

        let body = ErrorResponse {
            code: self.code,
            message: self.message,
        };

        (self.status, Json(body)).into_response()
    }
}

/// Map the domain taxonomy onto the HTTP contract.
///
/// Validation and invalid transitions are caller errors (400), unknown ids
/// are 404, lost capacity races and exhausted quotas are 409, and datastore
/// failures are 500 with the detail kept out of the response body.
impl From<EnrollmentError> for AppError {
    fn from(err: EnrollmentError) -> Self {
        match err {
            EnrollmentError::Validation(message) => {
                Self::new(StatusCode::BAD_REQUEST, message, "VALIDATION_ERROR")
            }
            EnrollmentError::NotFound { what, id } => Self::not_found(what, id),
            EnrollmentError::InvalidTransition { .. } => {
                Self::new(StatusCode::BAD_REQUEST, err.to_string(), "INVALID_TRANSITION")
            }
            EnrollmentError::NoSeats { .. } => {
                Self::new(StatusCode::CONFLICT, err.to_string(), "NO_SEATS")
            }
            EnrollmentError::Conflict(message) => {
                Self::new(StatusCode::CONFLICT, message, "CONFLICT")
            }
            EnrollmentError::QuotaExhausted { .. } => {
                Self::new(StatusCode::CONFLICT, err.to_string(), "QUOTA_EXHAUSTED")
            }
            EnrollmentError::Database(detail) => {
                tracing::error!(error = %detail, "datastore failure");
                Self::internal("An internal error occurred")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use enroll_core::{CourseId, RequestStatus};

    #[test]
    fn test_error_display() {
        let err = AppError::bad_request("Invalid input");
        assert_eq!(err.to_string(), "[BAD_REQUEST] Invalid input");
    }

    #[test]
    fn test_not_found() {
        let err = AppError::not_found("course", "123");
        assert_eq!(err.to_string(), "[NOT_FOUND] course with id 123 not found");
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn domain_errors_map_to_contract_statuses() {
        let no_seats: AppError = EnrollmentError::NoSeats {
            course_id: CourseId::new(),
        }
        .into();
        assert_eq!(no_seats.status(), StatusCode::CONFLICT);

        let invalid: AppError = EnrollmentError::InvalidTransition {
            from: RequestStatus::Approved,
            to: RequestStatus::Rejected,
        }
        .into();
        assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);

        let not_found: AppError = EnrollmentError::not_found("request", "abc").into();
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);

        let internal: AppError = EnrollmentError::Database("boom".to_string()).into();
        assert_eq!(internal.status(), StatusCode::INTERNAL_SERVER_ERROR);
        // Datastore detail never leaks to the client.
        assert!(!internal.to_string().contains("boom"));
    }
}
