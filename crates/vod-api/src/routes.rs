//! API routes.

use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::handlers::{delete_video, health, list_videos, root, stats, upload_video};
use crate::state::AppState;

/// Create the API router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/stats", get(stats))
        .route("/upload", post(upload_video))
        .route("/videos", get(list_videos))
        .route("/videos/:filename", delete(delete_video))
        // Processed artifacts are downloadable directly.
        .nest_service("/processed", ServeDir::new(&state.config.output_dir))
        .layer(DefaultBodyLimit::max(state.config.max_body_size))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
