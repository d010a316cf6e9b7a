//! The decision engine.
//!
//! Moves a request between `pending`/`observations`/`approved`/`rejected`,
//! releasing or consuming its reservations. The request row is locked for
//! the duration of the transaction, so a concurrent second decision observes
//! the terminal status and fails with `InvalidTransition` instead of
//! producing a second side effect (a double seat credit or a double quota
//! increment).

use crate::{EnrollmentStore, ledger, parse_request_status};
use enroll_core::{
    CourseId, Decision, EnrollmentError, EnrollmentId, PromotionId, RequestId, RequestStatus,
    Result, SeatAction, SeatCategory, SeatChange, SeatChangeCause,
};
use sqlx::PgConnection;
use uuid::Uuid;

/// Result of a committed decision.
#[derive(Debug, Clone)]
pub struct DecisionOutcome {
    /// The decided request.
    pub request_id: RequestId,
    /// Status the request now holds.
    pub status: RequestStatus,
    /// Primary enrollment created on approval.
    pub enrollment_id: Option<EnrollmentId>,
    /// Secondary enrollment created when an approved request carried a
    /// promotion.
    pub promotional_enrollment_id: Option<EnrollmentId>,
    /// Seat-change events to broadcast after commit.
    pub seat_changes: Vec<SeatChange>,
}

impl EnrollmentStore {
    /// Apply a moderator decision to an open request.
    ///
    /// - `rejected` releases the request's reservations: the status change
    ///   removes it from the counted set and reconciliation reflects that.
    /// - `observations` changes the status column only. Open statuses share
    ///   one deduction bucket, so the seat is never released, not even for
    ///   an instant.
    /// - `approved` converts the reservation into an active enrollment and,
    ///   when a promotion is attached, consumes one quota unit and creates
    ///   the secondary enrollment on the promotional course.
    ///
    /// # Errors
    ///
    /// - [`EnrollmentError::NotFound`] for an unknown request id
    /// - [`EnrollmentError::InvalidTransition`] when the request is not open
    /// - [`EnrollmentError::QuotaExhausted`] when approval cannot consume
    ///   promotion quota
    /// - [`EnrollmentError::Database`] on datastore failure (rolled back)
    #[tracing::instrument(skip(self, notes), fields(request_id = %request_id, decision = %decision))]
    pub async fn decide(
        &self,
        request_id: RequestId,
        decision: Decision,
        notes: Option<String>,
    ) -> Result<DecisionOutcome> {
        let mut tx = self
            .pool()
            .begin()
            .await
            .map_err(|e| EnrollmentError::Database(format!("Failed to begin transaction: {e}")))?;

        // Lock the request row: concurrent decisions on the same request
        // serialize here, and the loser sees the committed terminal status.
        let row: Option<(Uuid, Option<Uuid>, String, String)> = sqlx::query_as(
            "SELECT course_id, promotion_id, status, applicant_email
             FROM enrollment_requests
             WHERE id = $1
             FOR UPDATE",
        )
        .bind(request_id.as_uuid())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| EnrollmentError::Database(format!("Failed to load request: {e}")))?;

        let (course_uuid, promotion_uuid, status_text, applicant_email) =
            row.ok_or_else(|| EnrollmentError::not_found("request", request_id))?;
        let course_id = CourseId::from_uuid(course_uuid);
        let promotion_id = promotion_uuid.map(PromotionId::from_uuid);

        let current = parse_request_status(&status_text)?;
        let target = decision.target_status();
        if !current.can_transition_to(target) {
            return Err(EnrollmentError::InvalidTransition {
                from: current,
                to: target,
            });
        }

        sqlx::query(
            "UPDATE enrollment_requests
             SET status = $2, notes = COALESCE($3, notes), updated_at = now()
             WHERE id = $1",
        )
        .bind(request_id.as_uuid())
        .bind(target.as_str())
        .bind(notes)
        .execute(&mut *tx)
        .await
        .map_err(|e| EnrollmentError::Database(format!("Failed to update request: {e}")))?;

        let mut outcome = DecisionOutcome {
            request_id,
            status: target,
            enrollment_id: None,
            promotional_enrollment_id: None,
            seat_changes: Vec::new(),
        };

        match decision {
            // Status column change only. The seat stays counted; releasing
            // and re-reserving would open a window where a concurrent
            // request could steal it.
            Decision::Observations => {}

            Decision::Rejected => {
                ledger::reconcile_seats(&mut tx, course_id).await?;
                outcome.seat_changes.push(SeatChange::now(
                    course_id,
                    SeatCategory::Primary,
                    SeatAction::Release,
                    SeatChangeCause::RequestRejected,
                ));

                if let Some(promotion_id) = promotion_id {
                    let promo_course = promotion_course(&mut tx, promotion_id).await?;
                    if promo_course != course_id {
                        ledger::reconcile_seats(&mut tx, promo_course).await?;
                    }
                    outcome.seat_changes.push(SeatChange::now(
                        promo_course,
                        SeatCategory::Promotional,
                        SeatAction::Release,
                        SeatChangeCause::RequestRejected,
                    ));
                }
            }

            Decision::Approved => {
                let enrollment_id = EnrollmentId::new();
                insert_enrollment(&mut tx, enrollment_id, course_id, request_id, &applicant_email)
                    .await?;
                outcome.enrollment_id = Some(enrollment_id);

                // Net seat effect is zero (open request out, active
                // enrollment in) but the category changed, so the value is
                // re-derived rather than assumed. A changed value means
                // drift was corrected and is worth a broadcast.
                if let Some(corrected) =
                    reconcile_reporting_drift(&mut tx, course_id, SeatCategory::Primary).await?
                {
                    outcome.seat_changes.push(corrected);
                }

                if let Some(promotion_id) = promotion_id {
                    let (promo_course, secondary_enrollment) = approve_promotion(
                        &mut tx,
                        promotion_id,
                        request_id,
                        &applicant_email,
                    )
                    .await?;
                    outcome.promotional_enrollment_id = Some(secondary_enrollment);

                    if let Some(corrected) =
                        reconcile_reporting_drift(&mut tx, promo_course, SeatCategory::Promotional)
                            .await?
                    {
                        outcome.seat_changes.push(corrected);
                    }
                }
            }
        }

        tx.commit()
            .await
            .map_err(|e| EnrollmentError::Database(format!("Failed to commit: {e}")))?;

        metrics::counter!("enrollment.decisions", "outcome" => target.as_str()).increment(1);
        tracing::info!(status = %target, "decision committed");

        Ok(outcome)
    }
}

/// Look up the course a promotion is linked to.
async fn promotion_course(conn: &mut PgConnection, promotion_id: PromotionId) -> Result<CourseId> {
    let row: (Uuid,) = sqlx::query_as("SELECT course_id FROM promotions WHERE id = $1")
        .bind(promotion_id.as_uuid())
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| EnrollmentError::Database(format!("Failed to load promotion: {e}")))?
        .ok_or_else(|| EnrollmentError::not_found("promotion", promotion_id))?;
    Ok(CourseId::from_uuid(row.0))
}

/// Insert an active enrollment row.
async fn insert_enrollment(
    conn: &mut PgConnection,
    enrollment_id: EnrollmentId,
    course_id: CourseId,
    request_id: RequestId,
    applicant_email: &str,
) -> Result<()> {
    sqlx::query(
        "INSERT INTO enrollments (id, course_id, request_id, applicant_email, status)
         VALUES ($1, $2, $3, $4, 'active')",
    )
    .bind(enrollment_id.as_uuid())
    .bind(course_id.as_uuid())
    .bind(request_id.as_uuid())
    .bind(applicant_email)
    .execute(&mut *conn)
    .await
    .map_err(|e| EnrollmentError::Database(format!("Failed to insert enrollment: {e}")))?;
    Ok(())
}

/// Consume one quota unit and create the secondary request/enrollment pair
/// on the promotional course.
///
/// The quota increment is conditional; zero affected rows means the quota
/// was consumed by another approval since this request reserved its seat,
/// and the whole decision rolls back before a second increment can occur.
async fn approve_promotion(
    conn: &mut PgConnection,
    promotion_id: PromotionId,
    origin_request: RequestId,
    applicant_email: &str,
) -> Result<(CourseId, EnrollmentId)> {
    let consumed: Option<(Uuid,)> = sqlx::query_as(
        "UPDATE promotions
         SET quota_used = quota_used + 1
         WHERE id = $1
           AND (quota_configured IS NULL OR quota_used < quota_configured)
         RETURNING course_id",
    )
    .bind(promotion_id.as_uuid())
    .fetch_optional(&mut *conn)
    .await
    .map_err(|e| EnrollmentError::Database(format!("Failed to consume quota: {e}")))?;

    let (course_uuid,) = consumed.ok_or(EnrollmentError::QuotaExhausted { promotion_id })?;
    let promo_course = CourseId::from_uuid(course_uuid);

    // Pre-approved, zero-cost secondary request for the promotional course.
    let secondary_request = RequestId::new();
    sqlx::query(
        "INSERT INTO enrollment_requests
             (id, course_id, promotion_id, status, applicant_name, applicant_email, notes)
         SELECT $1, $2, NULL, 'approved', applicant_name, applicant_email, $4
         FROM enrollment_requests WHERE id = $3",
    )
    .bind(secondary_request.as_uuid())
    .bind(promo_course.as_uuid())
    .bind(origin_request.as_uuid())
    .bind(format!("Promotional enrollment granted via request {origin_request}"))
    .execute(&mut *conn)
    .await
    .map_err(|e| EnrollmentError::Database(format!("Failed to insert secondary request: {e}")))?;

    let secondary_enrollment = EnrollmentId::new();
    insert_enrollment(
        conn,
        secondary_enrollment,
        promo_course,
        secondary_request,
        applicant_email,
    )
    .await?;

    Ok((promo_course, secondary_enrollment))
}

/// Reconcile a course and report a seat change only if the stored value
/// actually moved (drift correction surfaced by the recomputation).
async fn reconcile_reporting_drift(
    conn: &mut PgConnection,
    course_id: CourseId,
    category: SeatCategory,
) -> Result<Option<SeatChange>> {
    let (before,): (i32,) = sqlx::query_as("SELECT seats_available FROM courses WHERE id = $1")
        .bind(course_id.as_uuid())
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| EnrollmentError::Database(format!("Failed to read availability: {e}")))?
        .ok_or_else(|| EnrollmentError::not_found("course", course_id))?;

    let after = ledger::reconcile_seats(&mut *conn, course_id).await?;
    if after == before {
        return Ok(None);
    }

    let action = if after < before {
        SeatAction::Reserve
    } else {
        SeatAction::Release
    };
    Ok(Some(SeatChange::now(
        course_id,
        category,
        action,
        SeatChangeCause::RequestApproved,
    )))
}
