//! Shared promotion validation and seat acquisition.
//!
//! Request intake and promotion reassignment reserve a promotional seat the
//! same way: validate eligibility, then win (or lose) the guarded decrement
//! on the promotional course. Both call [`acquire_promotion_seat`] inside
//! their own transaction.

use enroll_core::{CourseId, EnrollmentError, PromotionId, Result};
use sqlx::PgConnection;
use uuid::Uuid;

/// A promotional seat held inside the caller's transaction.
pub(crate) struct PromotionHold {
    /// The promotional course whose seat was decremented.
    pub course_id: CourseId,
}

/// Validate a promotion and conditionally take one seat on its course.
///
/// Eligibility checks: promotion is active, its course is active with seats
/// remaining, and the usage quota (when configured) has headroom. Any
/// failure aborts the caller's transaction; a lost decrement race surfaces
/// as [`EnrollmentError::Conflict`].
pub(crate) async fn acquire_promotion_seat(
    conn: &mut PgConnection,
    promotion_id: PromotionId,
) -> Result<PromotionHold> {
    let row: Option<(bool, Option<i32>, i32, Uuid, String, i32)> = sqlx::query_as(
        "SELECT p.active, p.quota_configured, p.quota_used,
                p.course_id, c.status, c.seats_available
         FROM promotions p
         JOIN courses c ON c.id = p.course_id
         WHERE p.id = $1",
    )
    .bind(promotion_id.as_uuid())
    .fetch_optional(&mut *conn)
    .await
    .map_err(|e| EnrollmentError::Database(format!("Failed to load promotion: {e}")))?;

    let (active, quota_configured, quota_used, course_uuid, course_status, seats_available) =
        row.ok_or_else(|| EnrollmentError::not_found("promotion", promotion_id))?;
    let course_id = CourseId::from_uuid(course_uuid);

    if !active {
        return Err(EnrollmentError::Validation(format!(
            "Promotion {promotion_id} is not active"
        )));
    }
    if course_status != "active" {
        return Err(EnrollmentError::Validation(format!(
            "Promotional course {course_id} is not active"
        )));
    }
    if seats_available <= 0 {
        return Err(EnrollmentError::NoSeats { course_id });
    }
    if let Some(quota) = quota_configured {
        if quota_used >= quota {
            return Err(EnrollmentError::QuotaExhausted { promotion_id });
        }
    }

    // The race-breaker: the affected-row count is the concurrency witness.
    let result = sqlx::query(
        "UPDATE courses
         SET seats_available = seats_available - 1, updated_at = now()
         WHERE id = $1 AND status = 'active' AND seats_available > 0",
    )
    .bind(course_id.as_uuid())
    .execute(&mut *conn)
    .await
    .map_err(|e| EnrollmentError::Database(format!("Failed to reserve promotional seat: {e}")))?;

    if result.rows_affected() == 0 {
        return Err(EnrollmentError::Conflict(format!(
            "Promotional course {course_id} filled while the request was being processed"
        )));
    }

    Ok(PromotionHold { course_id })
}
