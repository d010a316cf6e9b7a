//! Router configuration for the enrollment service.
//!
//! Builds the complete Axum router with all endpoints.

use crate::handlers::health::{health_check, readiness_check};
use crate::handlers::{courses, requests};
use crate::middleware::correlation_id_layer;
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post, put},
};

/// Build the complete Axum router.
///
/// Configures all routes:
/// - Health checks
/// - Request intake, decisions, and promotion reassignment
/// - Catalog administration and availability queries
///
/// # Arguments
///
/// - `state`: Application state to share with handlers
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        // Enrollment requests
        .route("/requests", post(requests::create_request))
        .route("/requests/:id", get(requests::get_request))
        .route("/requests/:id/decision", put(requests::decide_request))
        .route("/requests/:id/promotion", put(requests::reassign_promotion))
        // Catalog
        .route("/courses", post(courses::create_course))
        .route("/courses/:id/availability", get(courses::get_availability))
        .route("/promotions", post(courses::create_promotion))
        .route("/promotions/:id", get(courses::get_promotion));

    Router::new()
        // Health checks
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        // API routes under /api prefix
        .nest("/api", api_routes)
        .layer(correlation_id_layer())
        .with_state(state)
}
