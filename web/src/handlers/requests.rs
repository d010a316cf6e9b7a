//! Enrollment request endpoints.
//!
//! - `POST /api/requests` - create a request, reserving its seat(s)
//! - `GET /api/requests/:id` - read a request
//! - `PUT /api/requests/:id/decision` - apply a moderator decision
//! - `PUT /api/requests/:id/promotion` - swap the attached promotion
//!
//! Handlers publish the seat-change events a store operation returns only
//! after that operation committed.

use crate::error::AppError;
use crate::state::AppState;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use enroll_core::{Applicant, CourseId, Decision, PromotionId, RequestId};
use enroll_store::{NewRequest, RequestDetail};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Request/response types
// ============================================================================

/// Body of `POST /api/requests`.
#[derive(Debug, Deserialize)]
pub struct CreateRequestBody {
    /// Target course id.
    pub course_id: Uuid,
    /// Optional promotion to bundle.
    pub promotion_id: Option<Uuid>,
    /// Applicant identity.
    pub applicant: ApplicantBody,
}

/// Applicant fields as submitted.
#[derive(Debug, Deserialize)]
pub struct ApplicantBody {
    /// Display name.
    pub name: String,
    /// Contact email.
    pub email: String,
}

/// Response of `POST /api/requests`.
#[derive(Debug, Serialize)]
pub struct CreateRequestResponse {
    /// The new request's id.
    pub request_id: RequestId,
    /// Target course.
    pub course_id: CourseId,
    /// Authoritative availability after the reservation.
    pub seats_remaining: i32,
}

/// Body of `PUT /api/requests/:id/decision`.
#[derive(Debug, Deserialize)]
pub struct DecisionBody {
    /// The decision to apply.
    pub decision: Decision,
    /// Optional moderator notes.
    pub notes: Option<String>,
}

/// Body of `PUT /api/requests/:id/promotion`.
#[derive(Debug, Deserialize)]
pub struct ReassignBody {
    /// The promotion to attach instead of the current one.
    pub new_promotion_id: Uuid,
}

/// Acknowledgement body for decision and reassignment endpoints.
#[derive(Debug, Serialize)]
pub struct AckResponse {
    /// Always true on success.
    pub ok: bool,
}

// ============================================================================
// Handlers
// ============================================================================

/// Create an enrollment request.
///
/// Returns `201` with the authoritative remaining seat count, `409` when
/// the course (or promotional course) has no capacity left, `404` for
/// unknown ids, `400` for malformed input.
///
/// # Errors
///
/// See [`AppError`] for the status mapping.
pub async fn create_request(
    State(state): State<AppState>,
    Json(body): Json<CreateRequestBody>,
) -> Result<(StatusCode, Json<CreateRequestResponse>), AppError> {
    let created = state
        .store
        .create_request(NewRequest {
            course_id: CourseId::from_uuid(body.course_id),
            promotion_id: body.promotion_id.map(PromotionId::from_uuid),
            applicant: Applicant {
                name: body.applicant.name,
                email: body.applicant.email,
            },
        })
        .await?;

    state.publish_seat_changes(created.seat_changes).await;

    Ok((
        StatusCode::CREATED,
        Json(CreateRequestResponse {
            request_id: created.request_id,
            course_id: created.course_id,
            seats_remaining: created.seats_remaining,
        }),
    ))
}

/// Read a request as stored.
///
/// # Errors
///
/// `404` for an unknown request id.
pub async fn get_request(
    Path(request_id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<Json<RequestDetail>, AppError> {
    let detail = state
        .store
        .get_request(RequestId::from_uuid(request_id))
        .await?;
    Ok(Json(detail))
}

/// Apply a moderator decision to a request.
///
/// # Errors
///
/// `404` for an unknown request, `400` for a transition out of a terminal
/// status, `409` when approval cannot consume promotion quota.
pub async fn decide_request(
    Path(request_id): Path<Uuid>,
    State(state): State<AppState>,
    Json(body): Json<DecisionBody>,
) -> Result<Json<AckResponse>, AppError> {
    let outcome = state
        .store
        .decide(RequestId::from_uuid(request_id), body.decision, body.notes)
        .await?;

    state.publish_seat_changes(outcome.seat_changes).await;

    Ok(Json(AckResponse { ok: true }))
}

/// Swap the promotion attached to an open request.
///
/// # Errors
///
/// `409` when the new promotional course has no seats, `400` when the
/// request is closed or already uses the promotion, `404` for unknown ids.
pub async fn reassign_promotion(
    Path(request_id): Path<Uuid>,
    State(state): State<AppState>,
    Json(body): Json<ReassignBody>,
) -> Result<Json<AckResponse>, AppError> {
    let outcome = state
        .store
        .reassign_promotion(
            RequestId::from_uuid(request_id),
            PromotionId::from_uuid(body.new_promotion_id),
        )
        .await?;

    state.publish_seat_changes(outcome.seat_changes).await;

    Ok(Json(AckResponse { ok: true }))
}
