//! Request intake.
//!
//! Creates an enrollment request, reserving one seat on the target course
//! and, when a promotion is attached, a second seat on the promotional
//! course — all or nothing, in one transaction.

use crate::promotion_guard::acquire_promotion_seat;
use crate::{EnrollmentStore, ledger};
use enroll_core::{
    Applicant, CourseId, EnrollmentError, PromotionId, RequestId, Result, SeatAction,
    SeatCategory, SeatChange, SeatChangeCause,
};

/// Input for [`EnrollmentStore::create_request`].
#[derive(Debug, Clone)]
pub struct NewRequest {
    /// Course the applicant wants to enroll in.
    pub course_id: CourseId,
    /// Optional promotion to bundle with the enrollment.
    pub promotion_id: Option<PromotionId>,
    /// Applicant identity.
    pub applicant: Applicant,
}

/// Result of a successful intake.
#[derive(Debug, Clone)]
pub struct CreatedRequest {
    /// The new request's id.
    pub request_id: RequestId,
    /// Target course.
    pub course_id: CourseId,
    /// Authoritative availability of the target course after reconciliation.
    pub seats_remaining: i32,
    /// Seat-change events to broadcast after commit.
    pub seat_changes: Vec<SeatChange>,
}

impl EnrollmentStore {
    /// Create an enrollment request, reserving its seat(s).
    ///
    /// Either a fully-formed request exists with both its reservations
    /// consistently accounted for, or nothing persists. The guarded
    /// decrements are the concurrency guard; the final reconciliation is a
    /// drift correction, not a substitute for them.
    ///
    /// # Errors
    ///
    /// - [`EnrollmentError::Validation`] for malformed applicant data or an
    ///   ineligible promotion
    /// - [`EnrollmentError::NotFound`] for unknown course/promotion ids
    /// - [`EnrollmentError::NoSeats`] when the course is full or not active
    /// - [`EnrollmentError::Conflict`] when a guarded decrement lost a race
    /// - [`EnrollmentError::Database`] on datastore failure (rolled back)
    #[tracing::instrument(skip(self, new_request), fields(course_id = %new_request.course_id))]
    pub async fn create_request(&self, new_request: NewRequest) -> Result<CreatedRequest> {
        validate_applicant(&new_request.applicant)?;

        let mut tx = self
            .pool()
            .begin()
            .await
            .map_err(|e| EnrollmentError::Database(format!("Failed to begin transaction: {e}")))?;

        // Step 1: re-read the target course under this transaction.
        let course: Option<(String, i32)> =
            sqlx::query_as("SELECT status, seats_available FROM courses WHERE id = $1")
                .bind(new_request.course_id.as_uuid())
                .fetch_optional(&mut *tx)
                .await
                .map_err(|e| EnrollmentError::Database(format!("Failed to load course: {e}")))?;

        let (status, seats_available) =
            course.ok_or_else(|| EnrollmentError::not_found("course", new_request.course_id))?;
        if status != "active" || seats_available <= 0 {
            metrics::counter!("enrollment.intake.no_seats").increment(1);
            return Err(EnrollmentError::NoSeats {
                course_id: new_request.course_id,
            });
        }

        // Step 2: guarded decrement on the target course. The read above can
        // go stale the moment it returns; the affected-row count here is the
        // actual race witness.
        let claimed = sqlx::query(
            "UPDATE courses
             SET seats_available = seats_available - 1, updated_at = now()
             WHERE id = $1 AND status = 'active' AND seats_available > 0",
        )
        .bind(new_request.course_id.as_uuid())
        .execute(&mut *tx)
        .await
        .map_err(|e| EnrollmentError::Database(format!("Failed to reserve seat: {e}")))?;

        if claimed.rows_affected() == 0 {
            metrics::counter!("enrollment.intake.conflict").increment(1);
            return Err(EnrollmentError::Conflict(format!(
                "Course {} filled while the request was being processed",
                new_request.course_id
            )));
        }

        // Step 3: insert the request row.
        let request_id = RequestId::new();
        sqlx::query(
            "INSERT INTO enrollment_requests
                 (id, course_id, promotion_id, status, applicant_name, applicant_email)
             VALUES ($1, $2, $3, 'pending', $4, $5)",
        )
        .bind(request_id.as_uuid())
        .bind(new_request.course_id.as_uuid())
        .bind(new_request.promotion_id.as_ref().map(PromotionId::as_uuid))
        .bind(&new_request.applicant.name)
        .bind(&new_request.applicant.email)
        .execute(&mut *tx)
        .await
        .map_err(|e| EnrollmentError::Database(format!("Failed to insert request: {e}")))?;

        let mut seat_changes = vec![SeatChange::now(
            new_request.course_id,
            SeatCategory::Primary,
            SeatAction::Reserve,
            SeatChangeCause::RequestCreated,
        )];

        // Step 4: reserve the promotional seat, if a promotion is attached.
        // Any failure rolls the whole transaction back, request row included.
        let promo_course = match new_request.promotion_id {
            Some(promotion_id) => {
                let hold = acquire_promotion_seat(&mut tx, promotion_id).await?;
                seat_changes.push(SeatChange::now(
                    hold.course_id,
                    SeatCategory::Promotional,
                    SeatAction::Reserve,
                    SeatChangeCause::RequestCreated,
                ));
                Some(hold.course_id)
            }
            None => None,
        };

        // Step 5: reconcile every course this transaction touched.
        let seats_remaining = ledger::reconcile_seats(&mut tx, new_request.course_id).await?;
        if let Some(course_id) = promo_course {
            if course_id != new_request.course_id {
                ledger::reconcile_seats(&mut tx, course_id).await?;
            }
        }

        tx.commit()
            .await
            .map_err(|e| EnrollmentError::Database(format!("Failed to commit: {e}")))?;

        metrics::counter!("enrollment.intake.created").increment(1);
        tracing::info!(
            request_id = %request_id,
            seats_remaining,
            with_promotion = promo_course.is_some(),
            "enrollment request created"
        );

        Ok(CreatedRequest {
            request_id,
            course_id: new_request.course_id,
            seats_remaining,
            seat_changes,
        })
    }
}

/// Reject obviously malformed applicant data before touching the database.
fn validate_applicant(applicant: &Applicant) -> Result<()> {
    if applicant.name.trim().is_empty() {
        return Err(EnrollmentError::Validation(
            "Applicant name must not be empty".to_string(),
        ));
    }
    if applicant.email.trim().is_empty() || !applicant.email.contains('@') {
        return Err(EnrollmentError::Validation(format!(
            "Invalid applicant email: {}",
            applicant.email
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn applicant_validation_catches_empty_fields() {
        let ok = Applicant {
            name: "Ada Lovelace".to_string(),
            email: "ada@example.org".to_string(),
        };
        assert!(validate_applicant(&ok).is_ok());

        let no_name = Applicant {
            name: "  ".to_string(),
            email: "ada@example.org".to_string(),
        };
        assert!(matches!(
            validate_applicant(&no_name),
            Err(EnrollmentError::Validation(_))
        ));

        let bad_email = Applicant {
            name: "Ada".to_string(),
            email: "not-an-email".to_string(),
        };
        assert!(matches!(
            validate_applicant(&bad_email),
            Err(EnrollmentError::Validation(_))
        ));
    }
}
