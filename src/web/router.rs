//! Router configuration for the HTTP API.

use axum::{routing::get, Json, Router};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::app::AppState;

use super::handlers::{aggregated_feed, list_feeds, search};

/// Create the main router.
pub fn create_router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        .route("/feeds", get(list_feeds))
        .route("/search", get(search));

    Router::new()
        .route("/feed.xml", get(aggregated_feed))
        .route("/health", get(health_check))
        .nest("/api", api_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(create_cors_layer()),
        )
        .with_state(state)
}

/// CORS layer for the read-only API: any origin, no credentials.
fn create_cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_methods([axum::http::Method::GET])
        .allow_headers(Any)
        .allow_origin(Any)
}

/// Health check handler.
async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
