//! HTTP route handlers.

pub mod records;
pub mod seeds;
pub mod stats;
pub mod timeline;

use std::sync::Arc;

use axum::http::StatusCode;
use axum::{Json, Router};
use citeline_core::Error;
use serde_json::Value;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::state::AppState;

/// Build the main Axum router with all routes.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .nest("/api", api_routes())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .merge(seeds::routes())
        .merge(records::routes())
        .merge(timeline::routes())
        .merge(stats::routes())
}

/// Map a core error to a status code and `{"error": ...}` body.
pub(crate) fn error_response(err: &Error) -> (StatusCode, Json<Value>) {
    let status = match err {
        Error::MalformedIdentifier(_) | Error::UnresolvedDate(_) => StatusCode::BAD_REQUEST,
        Error::NotFound(_) => StatusCode::NOT_FOUND,
        Error::InvalidState(_) | Error::BatchInFlight => StatusCode::CONFLICT,
        Error::Resolution(_) | Error::Http(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        warn!("Request failed: {}", err);
    }
    (status, Json(serde_json::json!({ "error": err.to_string() })))
}
