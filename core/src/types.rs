//! Domain types for the enrollment platform.
//!
//! Value objects and status enums shared by the storage engine and the HTTP
//! layer. The request transition table lives here, on [`RequestStatus`], so
//! both the decision engine and its tests speak the same rules.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ============================================================================
// Identifiers
// ============================================================================

/// Unique identifier for a course offering
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CourseId(Uuid);

impl CourseId {
    /// Creates a new random `CourseId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a `CourseId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for CourseId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CourseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a promotion
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PromotionId(Uuid);

impl PromotionId {
    /// Creates a new random `PromotionId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a `PromotionId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for PromotionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PromotionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for an enrollment request
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Creates a new random `RequestId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a `RequestId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a confirmed enrollment
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EnrollmentId(Uuid);

impl EnrollmentId {
    /// Creates a new random `EnrollmentId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create an `EnrollmentId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for EnrollmentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EnrollmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Statuses
// ============================================================================

/// Lifecycle status of a course offering.
///
/// Only `Active` courses accept new enrollment requests. The lifecycle jobs
/// that move courses between the other states live outside this system.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CourseStatus {
    /// Accepting requests
    Active,
    /// Announced but not yet open
    Planned,
    /// Cancelled before completion
    Cancelled,
    /// Completed
    Finished,
}

impl CourseStatus {
    /// Database/text representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Planned => "planned",
            Self::Cancelled => "cancelled",
            Self::Finished => "finished",
        }
    }

    /// Parse from the database/text representation.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(Self::Active),
            "planned" => Some(Self::Planned),
            "cancelled" => Some(Self::Cancelled),
            "finished" => Some(Self::Finished),
            _ => None,
        }
    }
}

impl fmt::Display for CourseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle status of an enrollment request.
///
/// `Pending` and `Observations` both hold a seat reservation; they share one
/// deduction bucket in the seat ledger so moving between them never releases
/// a seat, not even transiently. `Approved` and `Rejected` are terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    /// Awaiting moderator review
    Pending,
    /// Sent back to the applicant with observations; still holds its seat
    Observations,
    /// Approved; the reservation became an enrollment
    Approved,
    /// Rejected; the reservation was released
    Rejected,
}

impl RequestStatus {
    /// Database/text representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Observations => "observations",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    /// Parse from the database/text representation.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "observations" => Some(Self::Observations),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }

    /// Whether this request still holds seat reservations and can be acted on.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        matches!(self, Self::Pending | Self::Observations)
    }

    /// Whether the decision engine may move a request from `self` to `next`.
    ///
    /// Open requests may be approved, rejected, or (re-)sent to
    /// observations. Terminal statuses admit no transition.
    #[must_use]
    pub const fn can_transition_to(&self, next: Self) -> bool {
        self.is_open()
            && matches!(
                next,
                Self::Approved | Self::Rejected | Self::Observations
            )
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status of a confirmed enrollment. Only `Active` enrollments count against
/// a course's capacity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnrollmentStatus {
    /// Student occupies a seat
    Active,
    /// Temporarily suspended; seat released
    Suspended,
    /// Course completed
    Finished,
}

impl EnrollmentStatus {
    /// Database/text representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Suspended => "suspended",
            Self::Finished => "finished",
        }
    }

    /// Parse from the database/text representation.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(Self::Active),
            "suspended" => Some(Self::Suspended),
            "finished" => Some(Self::Finished),
            _ => None,
        }
    }
}

impl fmt::Display for EnrollmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Decisions
// ============================================================================

/// Outcome a moderator may apply to an open request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    /// Approve the request; its reservations become enrollments
    Approved,
    /// Reject the request; its reservations are released
    Rejected,
    /// Return to the applicant with observations; reservations are kept
    Observations,
}

impl Decision {
    /// The request status this decision moves a request into.
    #[must_use]
    pub const fn target_status(&self) -> RequestStatus {
        match self {
            Self::Approved => RequestStatus::Approved,
            Self::Rejected => RequestStatus::Rejected,
            Self::Observations => RequestStatus::Observations,
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.target_status().as_str())
    }
}

// ============================================================================
// Applicants
// ============================================================================

/// Applicant identity attached to a request.
///
/// Opaque to the reservation engine; validation is an external concern.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Applicant {
    /// Display name
    pub name: String,
    /// Contact email, also used as the student reference on enrollments
    pub email: String,
}

// ============================================================================
// Seat-change events
// ============================================================================

/// Which reservation lane of a course a seat change belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeatCategory {
    /// The request's target course
    Primary,
    /// The promotional course bundled through a promotion
    Promotional,
}

/// Direction of a seat change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeatAction {
    /// A seat was claimed
    Reserve,
    /// A seat was given back
    Release,
}

/// The operation that caused a seat change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeatChangeCause {
    /// A new enrollment request reserved the seat
    RequestCreated,
    /// A rejection released the seat
    RequestRejected,
    /// An approval converted the reservation into an enrollment
    RequestApproved,
    /// A promotion swap moved the reservation
    PromotionReassigned,
}

/// Notification published after every committed seat change.
///
/// Fire-and-forget, at-least-once, no ordering guarantee across courses.
/// Consumers should treat it as a cache-invalidation hint and re-fetch
/// authoritative counts rather than accumulate the stream.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatChange {
    /// Course whose availability changed
    pub course_id: CourseId,
    /// Primary or promotional lane
    pub category: SeatCategory,
    /// Reserve or release
    pub action: SeatAction,
    /// The operation that caused the change
    pub cause: SeatChangeCause,
    /// When the change was recorded (inside the committing transaction)
    pub occurred_at: DateTime<Utc>,
}

impl SeatChange {
    /// Build a seat change stamped with the current time.
    #[must_use]
    pub fn now(
        course_id: CourseId,
        category: SeatCategory,
        action: SeatAction,
        cause: SeatChangeCause,
    ) -> Self {
        Self {
            course_id,
            category,
            action,
            cause,
            occurred_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_statuses_hold_seats() {
        assert!(RequestStatus::Pending.is_open());
        assert!(RequestStatus::Observations.is_open());
        assert!(!RequestStatus::Approved.is_open());
        assert!(!RequestStatus::Rejected.is_open());
    }

    #[test]
    fn transition_table_matches_lifecycle() {
        for from in [RequestStatus::Pending, RequestStatus::Observations] {
            assert!(from.can_transition_to(RequestStatus::Approved));
            assert!(from.can_transition_to(RequestStatus::Rejected));
            assert!(from.can_transition_to(RequestStatus::Observations));
            // The engine never moves a request back to pending.
            assert!(!from.can_transition_to(RequestStatus::Pending));
        }
        for terminal in [RequestStatus::Approved, RequestStatus::Rejected] {
            for next in [
                RequestStatus::Pending,
                RequestStatus::Observations,
                RequestStatus::Approved,
                RequestStatus::Rejected,
            ] {
                assert!(!terminal.can_transition_to(next));
            }
        }
    }

    #[test]
    fn status_text_round_trips() {
        for status in [
            RequestStatus::Pending,
            RequestStatus::Observations,
            RequestStatus::Approved,
            RequestStatus::Rejected,
        ] {
            assert_eq!(RequestStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(RequestStatus::parse("nonsense"), None);
        assert_eq!(CourseStatus::parse("active"), Some(CourseStatus::Active));
        assert_eq!(
            EnrollmentStatus::parse("suspended"),
            Some(EnrollmentStatus::Suspended)
        );
    }

    #[test]
    fn decision_maps_to_status() {
        assert_eq!(Decision::Approved.target_status(), RequestStatus::Approved);
        assert_eq!(Decision::Rejected.target_status(), RequestStatus::Rejected);
        assert_eq!(
            Decision::Observations.target_status(),
            RequestStatus::Observations
        );
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn any_status() -> impl Strategy<Value = RequestStatus> {
            prop::sample::select(vec![
                RequestStatus::Pending,
                RequestStatus::Observations,
                RequestStatus::Approved,
                RequestStatus::Rejected,
            ])
        }

        proptest! {
            /// Terminal statuses never transition, and nothing returns to
            /// pending, whatever the pair.
            #[test]
            fn transitions_start_open_and_never_reopen(
                from in any_status(),
                to in any_status(),
            ) {
                if from.can_transition_to(to) {
                    prop_assert!(from.is_open());
                    prop_assert_ne!(to, RequestStatus::Pending);
                }
            }

            /// The stored text form always parses back to the same status.
            #[test]
            fn status_text_is_stable(status in any_status()) {
                prop_assert_eq!(RequestStatus::parse(status.as_str()), Some(status));
            }
        }
    }
}
