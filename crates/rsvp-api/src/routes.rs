//! API routes.

use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::extract::MAX_UPLOAD_BYTES;
use crate::handlers::{delete_job, download_video, generate_video, get_job_status, health_check};
use crate::state::AppState;

/// Create the API router.
pub fn create_router(state: AppState) -> Router {
    // Multipart framing overhead on top of the file cap.
    let body_limit = MAX_UPLOAD_BYTES + 64 * 1024;

    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/generate", post(generate_video))
        .route("/api/status/:job_id", get(get_job_status))
        .route("/api/download/:job_id", get(download_video))
        .route("/api/job/:job_id", delete(delete_job))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
