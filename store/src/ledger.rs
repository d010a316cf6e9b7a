//! The seat ledger.
//!
//! Single source of truth for course availability. `seats_available` is a
//! derived cache; every operation that changes one of the counted sets calls
//! [`reconcile_seats`] for the affected course inside the same transaction,
//! so the stored value is recomputed from first principles rather than
//! trusted to incremental `+1`/`-1` arithmetic.
//!
//! The formula, for a course C:
//!
//! ```text
//! seats_available(C) = capacity_max(C)
//!   - count(open requests targeting C)
//!   - count(open requests whose promotion's course = C and target != C)
//!   - count(active enrollments in C)
//! ```
//!
//! clamped at zero, where "open" means pending or observations.

use enroll_core::{CourseId, EnrollmentError, Result};
use sqlx::PgConnection;

/// Recompute and persist a course's available seat count.
///
/// Counts the three deduction terms with fresh queries against the caller's
/// transaction snapshot, writes `max(capacity_max - deductions, 0)`, and
/// returns the new value. Idempotent: a second call without intervening
/// writes yields the same value.
///
/// This function is the only writer of `seats_available` whose result is
/// meant to survive; the guarded decrements in intake and reassignment are
/// race-breakers whose arithmetic is always overwritten here before commit.
///
/// # Errors
///
/// [`EnrollmentError::NotFound`] if the course does not exist,
/// [`EnrollmentError::Database`] on datastore failure.
#[tracing::instrument(skip(conn), fields(course_id = %course_id))]
pub async fn reconcile_seats(conn: &mut PgConnection, course_id: CourseId) -> Result<i32> {
    let capacity: (i32,) = sqlx::query_as("SELECT capacity_max FROM courses WHERE id = $1")
        .bind(course_id.as_uuid())
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| EnrollmentError::Database(format!("Failed to read capacity: {e}")))?
        .ok_or_else(|| EnrollmentError::not_found("course", course_id))?;

    let (direct,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM enrollment_requests
         WHERE course_id = $1 AND status IN ('pending', 'observations')",
    )
    .bind(course_id.as_uuid())
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| EnrollmentError::Database(format!("Failed to count open requests: {e}")))?;

    let (promotional,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM enrollment_requests r
         JOIN promotions p ON p.id = r.promotion_id
         WHERE p.course_id = $1
           AND r.course_id <> $1
           AND r.status IN ('pending', 'observations')",
    )
    .bind(course_id.as_uuid())
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| EnrollmentError::Database(format!("Failed to count promotional holds: {e}")))?;

    let (enrolled,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM enrollments
         WHERE course_id = $1 AND status = 'active'",
    )
    .bind(course_id.as_uuid())
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| EnrollmentError::Database(format!("Failed to count active enrollments: {e}")))?;

    let deductions = direct + promotional + enrolled;
    let new_available = i32::try_from((i64::from(capacity.0) - deductions).max(0))
        .map_err(|e| EnrollmentError::Database(format!("Seat count out of range: {e}")))?;

    sqlx::query("UPDATE courses SET seats_available = $2, updated_at = now() WHERE id = $1")
        .bind(course_id.as_uuid())
        .bind(new_available)
        .execute(&mut *conn)
        .await
        .map_err(|e| EnrollmentError::Database(format!("Failed to write availability: {e}")))?;

    tracing::debug!(
        capacity = capacity.0,
        direct,
        promotional,
        enrolled,
        new_available,
        "seats reconciled"
    );

    Ok(new_available)
}
