//! Stats and server info routes.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};

use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/stats", get(get_stats))
        .route("/server-info", get(get_server_info))
}

/// GET /api/stats: record counts by state and membership.
async fn get_stats(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let counts = state.session.counts();
    Json(serde_json::json!({
        "total": counts.total,
        "resolved": counts.resolved,
        "failed": counts.failed,
        "pending": counts.pending,
        "userSelected": counts.user_selected,
        "discovered": counts.discovered,
        "resolver": state.session.resolver_name(),
        "resolving": state.session.is_resolving(),
    }))
}

/// GET /api/server-info: version and effective configuration.
async fn get_server_info(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "name": "citeline",
        "version": env!("CARGO_PKG_VERSION"),
        "port": state.config.port,
        "traversalDepth": state.config.traversal_depth,
        "pruneOrphansOnRemove": state.config.prune_orphans_on_remove,
        "layout": state.config.layout,
    }))
}
