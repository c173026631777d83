//! API routes and handlers.

mod health;
mod process;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Create the main API router.
pub fn create_router(state: AppState) -> Router {
    let api_routes = Router::new().route("/health", get(health::health_check));

    Router::new()
        // Multimodal dispatch endpoint; uploads can be tens of megabytes
        .route("/process", post(process::process))
        .layer(DefaultBodyLimit::max(64 * 1024 * 1024))
        .nest("/api/v1", api_routes)
        // Static landing page with the upload form
        .fallback_service(
            ServeDir::new("static").fallback(ServeFile::new("static/index.html")),
        )
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
