//! Catalog operations: course and promotion administration, availability
//! reads, and request lookups.
//!
//! These are the thin edges around the reservation engine — the pieces the
//! HTTP surface and operational tooling need to set a system up and observe
//! it. None of them mutate seat accounting except course creation, which
//! initializes `seats_available` to the full capacity.

use crate::{EnrollmentStore, parse_request_status};
use chrono::{DateTime, Utc};
use enroll_core::{
    Applicant, CourseId, CourseStatus, EnrollmentError, PromotionId, RequestId, RequestStatus,
    Result,
};
use serde::Serialize;
use uuid::Uuid;

/// Input for [`EnrollmentStore::create_course`].
#[derive(Debug, Clone)]
pub struct NewCourse {
    /// Display name.
    pub name: String,
    /// Maximum seats; immutable once created.
    pub capacity_max: i32,
    /// Initial lifecycle status.
    pub status: CourseStatus,
}

/// Input for [`EnrollmentStore::create_promotion`].
#[derive(Debug, Clone)]
pub struct NewPromotion {
    /// Display name.
    pub name: String,
    /// The promotional course this promotion grants a seat on.
    pub course_id: CourseId,
    /// Whether the promotion is selectable.
    pub active: bool,
    /// Optional usage cap; `None` means unlimited.
    pub quota_configured: Option<i32>,
}

/// Authoritative availability snapshot of a course.
#[derive(Debug, Clone, Serialize)]
pub struct CourseAvailability {
    /// Course id.
    pub course_id: CourseId,
    /// Display name.
    pub name: String,
    /// Maximum seats.
    pub capacity_max: i32,
    /// Seats currently available. Authoritative immediately after a
    /// reconciliation; eventually consistent between commits.
    pub seats_available: i32,
    /// Lifecycle status.
    pub status: CourseStatus,
}

/// Promotion configuration and consumption.
#[derive(Debug, Clone, Serialize)]
pub struct PromotionDetail {
    /// Promotion id.
    pub promotion_id: PromotionId,
    /// Display name.
    pub name: String,
    /// The promotional course.
    pub course_id: CourseId,
    /// Whether the promotion is selectable.
    pub active: bool,
    /// Optional usage cap.
    pub quota_configured: Option<i32>,
    /// Approvals that have consumed quota so far.
    pub quota_used: i32,
}

/// A request as stored.
#[derive(Debug, Clone, Serialize)]
pub struct RequestDetail {
    /// Request id.
    pub request_id: RequestId,
    /// Target course.
    pub course_id: CourseId,
    /// Attached promotion, if any.
    pub promotion_id: Option<PromotionId>,
    /// Current status.
    pub status: RequestStatus,
    /// Applicant identity.
    pub applicant: Applicant,
    /// Moderator notes, if any.
    pub notes: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl EnrollmentStore {
    /// Create a course with all seats available.
    ///
    /// # Errors
    ///
    /// [`EnrollmentError::Validation`] for a non-positive capacity or empty
    /// name, [`EnrollmentError::Database`] on datastore failure.
    #[tracing::instrument(skip(self, course), fields(name = %course.name))]
    pub async fn create_course(&self, course: NewCourse) -> Result<CourseId> {
        if course.capacity_max <= 0 {
            return Err(EnrollmentError::Validation(format!(
                "Course capacity must be positive, got {}",
                course.capacity_max
            )));
        }
        if course.name.trim().is_empty() {
            return Err(EnrollmentError::Validation(
                "Course name must not be empty".to_string(),
            ));
        }

        let course_id = CourseId::new();
        sqlx::query(
            "INSERT INTO courses (id, name, capacity_max, seats_available, status)
             VALUES ($1, $2, $3, $3, $4)",
        )
        .bind(course_id.as_uuid())
        .bind(&course.name)
        .bind(course.capacity_max)
        .bind(course.status.as_str())
        .execute(self.pool())
        .await
        .map_err(|e| EnrollmentError::Database(format!("Failed to insert course: {e}")))?;

        Ok(course_id)
    }

    /// Create a promotion linked to an existing course.
    ///
    /// # Errors
    ///
    /// [`EnrollmentError::NotFound`] if the course does not exist,
    /// [`EnrollmentError::Validation`] for a non-positive quota,
    /// [`EnrollmentError::Database`] on datastore failure.
    #[tracing::instrument(skip(self, promotion), fields(name = %promotion.name))]
    pub async fn create_promotion(&self, promotion: NewPromotion) -> Result<PromotionId> {
        if let Some(quota) = promotion.quota_configured {
            if quota <= 0 {
                return Err(EnrollmentError::Validation(format!(
                    "Promotion quota must be positive, got {quota}"
                )));
            }
        }

        let promotion_id = PromotionId::new();
        let result = sqlx::query(
            "INSERT INTO promotions (id, name, course_id, active, quota_configured)
             SELECT $1, $2, id, $4, $5 FROM courses WHERE id = $3",
        )
        .bind(promotion_id.as_uuid())
        .bind(&promotion.name)
        .bind(promotion.course_id.as_uuid())
        .bind(promotion.active)
        .bind(promotion.quota_configured)
        .execute(self.pool())
        .await
        .map_err(|e| EnrollmentError::Database(format!("Failed to insert promotion: {e}")))?;

        if result.rows_affected() == 0 {
            return Err(EnrollmentError::not_found("course", promotion.course_id));
        }
        Ok(promotion_id)
    }

    /// Read a course's availability snapshot.
    ///
    /// # Errors
    ///
    /// [`EnrollmentError::NotFound`] for an unknown course,
    /// [`EnrollmentError::Database`] on datastore failure.
    pub async fn course_availability(&self, course_id: CourseId) -> Result<CourseAvailability> {
        let row: Option<(String, i32, i32, String)> = sqlx::query_as(
            "SELECT name, capacity_max, seats_available, status FROM courses WHERE id = $1",
        )
        .bind(course_id.as_uuid())
        .fetch_optional(self.pool())
        .await
        .map_err(|e| EnrollmentError::Database(format!("Failed to load course: {e}")))?;

        let (name, capacity_max, seats_available, status_text) =
            row.ok_or_else(|| EnrollmentError::not_found("course", course_id))?;
        let status = CourseStatus::parse(&status_text).ok_or_else(|| {
            EnrollmentError::Database(format!("Unknown course status in row: {status_text}"))
        })?;

        Ok(CourseAvailability {
            course_id,
            name,
            capacity_max,
            seats_available,
            status,
        })
    }

    /// Read a promotion's configuration and quota consumption.
    ///
    /// # Errors
    ///
    /// [`EnrollmentError::NotFound`] for an unknown promotion,
    /// [`EnrollmentError::Database`] on datastore failure.
    pub async fn promotion_detail(&self, promotion_id: PromotionId) -> Result<PromotionDetail> {
        let row: Option<(String, Uuid, bool, Option<i32>, i32)> = sqlx::query_as(
            "SELECT name, course_id, active, quota_configured, quota_used
             FROM promotions WHERE id = $1",
        )
        .bind(promotion_id.as_uuid())
        .fetch_optional(self.pool())
        .await
        .map_err(|e| EnrollmentError::Database(format!("Failed to load promotion: {e}")))?;

        let (name, course_uuid, active, quota_configured, quota_used) =
            row.ok_or_else(|| EnrollmentError::not_found("promotion", promotion_id))?;

        Ok(PromotionDetail {
            promotion_id,
            name,
            course_id: CourseId::from_uuid(course_uuid),
            active,
            quota_configured,
            quota_used,
        })
    }

    /// Read a request as stored.
    ///
    /// # Errors
    ///
    /// [`EnrollmentError::NotFound`] for an unknown request,
    /// [`EnrollmentError::Database`] on datastore failure.
    pub async fn get_request(&self, request_id: RequestId) -> Result<RequestDetail> {
        let row: Option<(
            Uuid,
            Option<Uuid>,
            String,
            String,
            String,
            Option<String>,
            DateTime<Utc>,
        )> = sqlx::query_as(
            "SELECT course_id, promotion_id, status, applicant_name, applicant_email,
                    notes, created_at
             FROM enrollment_requests WHERE id = $1",
        )
        .bind(request_id.as_uuid())
        .fetch_optional(self.pool())
        .await
        .map_err(|e| EnrollmentError::Database(format!("Failed to load request: {e}")))?;

        let (course_uuid, promotion_uuid, status_text, name, email, notes, created_at) =
            row.ok_or_else(|| EnrollmentError::not_found("request", request_id))?;

        Ok(RequestDetail {
            request_id,
            course_id: CourseId::from_uuid(course_uuid),
            promotion_id: promotion_uuid.map(PromotionId::from_uuid),
            status: parse_request_status(&status_text)?,
            applicant: Applicant { name, email },
            notes,
            created_at,
        })
    }
}
