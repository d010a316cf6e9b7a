//! # Enroll Core
//!
//! Domain types for the enrollment seat-reservation platform.
//!
//! This crate defines the vocabulary shared by the storage engine and the
//! HTTP layer:
//!
//! - **Identifiers**: newtype wrappers over UUIDs for courses, promotions,
//!   requests, and enrollments
//! - **Statuses**: course, request, and enrollment lifecycles, including the
//!   request transition table the decision engine enforces
//! - **Errors**: the [`EnrollmentError`] taxonomy every operation maps into
//! - **Seat-change events**: the [`SeatChange`] notification published after
//!   every committed seat mutation, and the [`SeatChangeBroadcaster`] trait
//!   the publishing side is written against
//!
//! The crate is deliberately free of persistence concerns: nothing here
//! knows about SQL or transactions. The storage engine (`enroll-store`)
//! owns those.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

// Re-export commonly used types
pub use broadcast::{BroadcastChannel, SeatChangeBroadcaster};
pub use error::{EnrollmentError, Result};
pub use types::{
    Applicant, CourseId, CourseStatus, Decision, EnrollmentId, EnrollmentStatus, PromotionId,
    RequestId, RequestStatus, SeatAction, SeatCategory, SeatChange, SeatChangeCause,
};

pub mod broadcast;
pub mod error;
pub mod types;
