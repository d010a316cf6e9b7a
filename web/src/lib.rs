//! Axum HTTP layer for the enrollment seat reservation service.
//!
//! Thin imperative shell over `enroll-store`:
//!
//! 1. **HTTP request** arrives at an Axum handler
//! 2. **Extract** ids and payloads (JSON, path parameters)
//! 3. **Call** the store operation — one database transaction per call
//! 4. **Broadcast** the returned seat-change events, strictly after commit
//! 5. **Map** the result (or [`enroll_core::EnrollmentError`]) to an HTTP
//!    response
//!
//! The handlers hold no business logic: seat accounting lives entirely in
//! the store crate, and the error taxonomy maps one-to-one onto status
//! codes in [`error::AppError`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod state;

// Re-export key types for convenience
pub use config::Config;
pub use error::AppError;
pub use middleware::{CORRELATION_ID_HEADER, correlation_id_layer};
pub use routes::build_router;
pub use state::AppState;

/// Result type alias for web handlers.
pub type WebResult<T> = Result<T, AppError>;
