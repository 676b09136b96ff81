//! HTTP router construction.

use std::sync::Arc;

use axum::http::HeaderValue;
use axum::routing::{get, patch, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tracing::warn;

use crate::api;
use crate::state::AppState;

/// CORS for the dashboard origin, permissive for `*` or an unparseable value.
pub fn cors_layer(origin: &str) -> CorsLayer {
    if origin == "*" {
        return CorsLayer::permissive();
    }
    match origin.parse::<HeaderValue>() {
        Ok(value) => CorsLayer::new()
            .allow_origin(value)
            .allow_methods(Any)
            .allow_headers(Any),
        Err(e) => {
            warn!(origin, error = %e, "Invalid CORS_ORIGIN, allowing any origin");
            CorsLayer::permissive()
        }
    }
}

/// Build the complete application router with all routes and middleware.
pub fn build_router(state: Arc<AppState>, cors_origin: &str) -> Router {
    Router::new()
        .route("/health", get(api::health))
        .route("/api/scrape", post(api::scrape))
        .route(
            "/api/applications",
            get(api::applications_list).post(api::applications_create),
        )
        .route(
            "/api/applications/{id}",
            get(api::applications_get).delete(api::applications_delete),
        )
        .route(
            "/api/applications/{id}/status",
            patch(api::applications_update_status),
        )
        .route(
            "/api/applications/{id}/documents",
            patch(api::applications_update_documents),
        )
        .layer(cors_layer(cors_origin))
        .with_state(state)
}
