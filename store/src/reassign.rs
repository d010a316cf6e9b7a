//! Promotion reassignment.
//!
//! Swaps the promotion attached to a still-open request, atomically
//! acquiring the new promotional seat before releasing the old one. A
//! failed acquisition (no capacity on the new promotion) therefore never
//! leaves the request without any promotional reservation.

use crate::promotion_guard::acquire_promotion_seat;
use crate::{EnrollmentStore, ledger, parse_request_status};
use enroll_core::{
    CourseId, EnrollmentError, PromotionId, RequestId, Result, SeatAction, SeatCategory,
    SeatChange, SeatChangeCause,
};
use uuid::Uuid;

/// Result of a committed promotion swap.
#[derive(Debug, Clone)]
pub struct ReassignmentOutcome {
    /// The request whose promotion changed.
    pub request_id: RequestId,
    /// The promotion now attached.
    pub new_promotion_id: PromotionId,
    /// The promotion previously attached, if any.
    pub old_promotion_id: Option<PromotionId>,
    /// Seat-change events to broadcast after commit.
    pub seat_changes: Vec<SeatChange>,
}

impl EnrollmentStore {
    /// Swap the promotion on an open request.
    ///
    /// One transaction: validate the new promotion exactly as intake does,
    /// win the guarded decrement on its course, repoint the request, release
    /// the old promotional seat, and reconcile both courses.
    ///
    /// # Errors
    ///
    /// - [`EnrollmentError::NotFound`] for unknown request/promotion ids
    /// - [`EnrollmentError::Validation`] when the request is not open or the
    ///   new promotion equals the current one or is ineligible
    /// - [`EnrollmentError::Conflict`] when the guarded decrement on the new
    ///   promotional course lost a race
    /// - [`EnrollmentError::Database`] on datastore failure (rolled back)
    #[tracing::instrument(skip(self), fields(request_id = %request_id, new_promotion_id = %new_promotion_id))]
    pub async fn reassign_promotion(
        &self,
        request_id: RequestId,
        new_promotion_id: PromotionId,
    ) -> Result<ReassignmentOutcome> {
        let mut tx = self
            .pool()
            .begin()
            .await
            .map_err(|e| EnrollmentError::Database(format!("Failed to begin transaction: {e}")))?;

        let row: Option<(Uuid, Option<Uuid>, String)> = sqlx::query_as(
            "SELECT course_id, promotion_id, status
             FROM enrollment_requests
             WHERE id = $1
             FOR UPDATE",
        )
        .bind(request_id.as_uuid())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| EnrollmentError::Database(format!("Failed to load request: {e}")))?;

        let (_, old_promotion_uuid, status_text) =
            row.ok_or_else(|| EnrollmentError::not_found("request", request_id))?;
        let old_promotion_id = old_promotion_uuid.map(PromotionId::from_uuid);

        let status = parse_request_status(&status_text)?;
        if !status.is_open() {
            return Err(EnrollmentError::Validation(format!(
                "Request {request_id} is {status}; promotions can only be changed on open requests"
            )));
        }
        if old_promotion_id == Some(new_promotion_id) {
            return Err(EnrollmentError::Validation(format!(
                "Request {request_id} already uses promotion {new_promotion_id}"
            )));
        }

        // Acquire the new reservation first; only a confirmed hold justifies
        // giving the old one back.
        let hold = acquire_promotion_seat(&mut tx, new_promotion_id).await?;

        sqlx::query(
            "UPDATE enrollment_requests
             SET promotion_id = $2, updated_at = now()
             WHERE id = $1",
        )
        .bind(request_id.as_uuid())
        .bind(new_promotion_id.as_uuid())
        .execute(&mut *tx)
        .await
        .map_err(|e| EnrollmentError::Database(format!("Failed to update request: {e}")))?;

        let mut seat_changes = vec![SeatChange::now(
            hold.course_id,
            SeatCategory::Promotional,
            SeatAction::Reserve,
            SeatChangeCause::PromotionReassigned,
        )];

        // Release the old promotional seat. The increment is provisional;
        // the reconcile below re-derives the authoritative value.
        let old_course = match old_promotion_id {
            Some(old_id) => {
                let row: (Uuid,) =
                    sqlx::query_as("SELECT course_id FROM promotions WHERE id = $1")
                        .bind(old_id.as_uuid())
                        .fetch_optional(&mut *tx)
                        .await
                        .map_err(|e| {
                            EnrollmentError::Database(format!("Failed to load promotion: {e}"))
                        })?
                        .ok_or_else(|| EnrollmentError::not_found("promotion", old_id))?;
                let old_course = CourseId::from_uuid(row.0);

                sqlx::query(
                    "UPDATE courses
                     SET seats_available = LEAST(seats_available + 1, capacity_max),
                         updated_at = now()
                     WHERE id = $1",
                )
                .bind(old_course.as_uuid())
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    EnrollmentError::Database(format!("Failed to release promotional seat: {e}"))
                })?;

                seat_changes.push(SeatChange::now(
                    old_course,
                    SeatCategory::Promotional,
                    SeatAction::Release,
                    SeatChangeCause::PromotionReassigned,
                ));
                Some(old_course)
            }
            None => None,
        };

        ledger::reconcile_seats(&mut tx, hold.course_id).await?;
        if let Some(old_course) = old_course {
            if old_course != hold.course_id {
                ledger::reconcile_seats(&mut tx, old_course).await?;
            }
        }

        tx.commit()
            .await
            .map_err(|e| EnrollmentError::Database(format!("Failed to commit: {e}")))?;

        metrics::counter!("enrollment.reassignments").increment(1);
        tracing::info!(old_promotion = ?old_promotion_id, "promotion reassigned");

        Ok(ReassignmentOutcome {
            request_id,
            new_promotion_id,
            old_promotion_id,
            seat_changes,
        })
    }
}
