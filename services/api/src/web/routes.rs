//! services/api/src/web/routes.rs
//!
//! Assembles the application router: every route requires a learner identity,
//! and CORS is restricted to the configured frontend origin.

use std::sync::Arc;

use axum::{
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;

use crate::error::ApiError;
use crate::web::middleware::require_learner;
use crate::web::rest::{
    course_progress_handler, enroll_handler, learner_stats_handler, list_achievements_handler,
    list_enrollments_handler, list_quiz_attempts_handler, submit_quiz_handler,
    update_lesson_progress_handler,
};
use crate::web::state::AppState;

/// Builds the API router over the shared state.
pub fn api_router(app_state: Arc<AppState>) -> Result<Router, ApiError> {
    let origin = app_state
        .config
        .frontend_origin
        .parse::<HeaderValue>()
        .map_err(|e| ApiError::Internal(format!("Invalid FRONTEND_ORIGIN: {}", e)))?;

    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]);

    let protected_routes = Router::new()
        .route("/courses/{course_id}/enroll", post(enroll_handler))
        .route("/courses/{course_id}/progress", get(course_progress_handler))
        .route("/enrollments", get(list_enrollments_handler))
        .route(
            "/lessons/{lesson_id}/progress",
            post(update_lesson_progress_handler),
        )
        .route(
            "/quizzes/{quiz_id}/attempts",
            post(submit_quiz_handler).get(list_quiz_attempts_handler),
        )
        .route("/achievements", get(list_achievements_handler))
        .route("/stats", get(learner_stats_handler))
        .layer(axum_middleware::from_fn(require_learner));

    Ok(Router::new()
        .merge(protected_routes)
        .layer(cors)
        .with_state(app_state))
}
