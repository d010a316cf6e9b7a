//! Course and promotion administration endpoints.
//!
//! - `POST /api/courses` - create a course with all seats available
//! - `GET /api/courses/:id/availability` - authoritative availability read
//! - `POST /api/promotions` - create a promotion linked to a course
//! - `GET /api/promotions/:id` - promotion configuration and quota usage

use crate::error::AppError;
use crate::state::AppState;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use enroll_core::{CourseId, CourseStatus, PromotionId};
use enroll_store::{CourseAvailability, NewCourse, NewPromotion, PromotionDetail};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Body of `POST /api/courses`.
#[derive(Debug, Deserialize)]
pub struct CreateCourseBody {
    /// Display name.
    pub name: String,
    /// Maximum seats.
    pub capacity_max: i32,
    /// Initial status; defaults to active.
    #[serde(default = "default_course_status")]
    pub status: CourseStatus,
}

const fn default_course_status() -> CourseStatus {
    CourseStatus::Active
}

/// Response of `POST /api/courses`.
#[derive(Debug, Serialize)]
pub struct CreateCourseResponse {
    /// The new course's id.
    pub course_id: CourseId,
}

/// Body of `POST /api/promotions`.
#[derive(Debug, Deserialize)]
pub struct CreatePromotionBody {
    /// Display name.
    pub name: String,
    /// The promotional course this promotion grants a seat on.
    pub course_id: Uuid,
    /// Whether the promotion is selectable; defaults to true.
    #[serde(default = "default_active")]
    pub active: bool,
    /// Optional usage cap.
    pub quota_configured: Option<i32>,
}

const fn default_active() -> bool {
    true
}

/// Response of `POST /api/promotions`.
#[derive(Debug, Serialize)]
pub struct CreatePromotionResponse {
    /// The new promotion's id.
    pub promotion_id: PromotionId,
}

/// Create a course.
///
/// # Errors
///
/// `400` for a non-positive capacity or empty name.
pub async fn create_course(
    State(state): State<AppState>,
    Json(body): Json<CreateCourseBody>,
) -> Result<(StatusCode, Json<CreateCourseResponse>), AppError> {
    let course_id = state
        .store
        .create_course(NewCourse {
            name: body.name,
            capacity_max: body.capacity_max,
            status: body.status,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(CreateCourseResponse { course_id })))
}

/// Create a promotion.
///
/// # Errors
///
/// `404` for an unknown course, `400` for a non-positive quota.
pub async fn create_promotion(
    State(state): State<AppState>,
    Json(body): Json<CreatePromotionBody>,
) -> Result<(StatusCode, Json<CreatePromotionResponse>), AppError> {
    let promotion_id = state
        .store
        .create_promotion(NewPromotion {
            name: body.name,
            course_id: CourseId::from_uuid(body.course_id),
            active: body.active,
            quota_configured: body.quota_configured,
        })
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(CreatePromotionResponse { promotion_id }),
    ))
}

/// Read a course's availability snapshot.
///
/// The value is authoritative immediately after a reconciliation and
/// eventually consistent between commits; dashboards re-fetch it on every
/// seat-change hint.
///
/// # Errors
///
/// `404` for an unknown course id.
pub async fn get_availability(
    Path(course_id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<Json<CourseAvailability>, AppError> {
    let availability = state
        .store
        .course_availability(CourseId::from_uuid(course_id))
        .await?;
    Ok(Json(availability))
}

/// Read a promotion's configuration and quota consumption.
///
/// # Errors
///
/// `404` for an unknown promotion id.
pub async fn get_promotion(
    Path(promotion_id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<Json<PromotionDetail>, AppError> {
    let detail = state
        .store
        .promotion_detail(PromotionId::from_uuid(promotion_id))
        .await?;
    Ok(Json(detail))
}
