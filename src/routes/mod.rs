use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::StatusCode,
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::middleware::{make_span_with_request_id, request_id_middleware};

pub mod alternates;
pub mod analyze;
pub mod clicks;
pub mod recommendations;
pub mod state;
pub mod uploads;

pub use state::AppState;

/// Room above the image limit so oversize photos reach validation and get a JSON error
const UPLOAD_BODY_SLACK: usize = 1024 * 1024;

/// Creates the application router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    let media_dir = state.config.media_dir.clone();
    let upload_limit = state.pipeline.image_max_bytes() + UPLOAD_BODY_SLACK;

    Router::new()
        .route("/health", get(health_check))
        .route("/r/:rec_id/:slot", get(clicks::redirect))
        .nest("/api/v1", api_routes(upload_limit))
        .nest_service("/media", ServeDir::new(media_dir))
        .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// API routes under /api/v1
fn api_routes(upload_limit: usize) -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/uploads",
            post(uploads::create_upload).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/analyze", post(analyze::analyze))
        .route("/recommendations/:id", get(recommendations::get_recommendation))
        .route("/alternate", post(alternates::swap_alternate))
        .route("/clicks", post(clicks::record_click))
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}
