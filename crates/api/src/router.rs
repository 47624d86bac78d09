use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Routes:
/// - `GET /health` -- collaborator reachability
/// - `POST /extract` -- events for a text body
/// - `POST /extract/file` -- events for a file on disk, written to the output dir
/// - `GET /stats` -- metrics and cache counters
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/extract", post(handlers::extract_document))
        .route("/extract/file", post(handlers::extract_file))
        .route("/stats", get(handlers::get_stats))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
