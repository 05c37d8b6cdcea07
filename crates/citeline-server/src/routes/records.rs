//! Record and citation graph snapshots.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use citeline_core::Error;

use super::error_response;
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/records", get(list_records))
        .route("/records/{*doi}", get(get_record))
        .route("/graph", get(get_graph))
}

/// GET /api/records: every record in discovery order.
async fn list_records(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let records = state.session.records();
    Json(serde_json::json!({
        "records": records,
        "counts": state.session.counts(),
    }))
}

/// GET /api/records/{*doi}: one record and the records citing it.
async fn get_record(
    State(state): State<Arc<AppState>>,
    Path(doi): Path<String>,
) -> impl IntoResponse {
    let cited_by = match state.session.cited_by(&doi) {
        Ok(ids) => ids,
        Err(e) => return error_response(&e),
    };
    match state.session.record(&doi) {
        Some(record) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "record": record,
                "date": record.date_display(),
                "citedBy": cited_by,
            })),
        ),
        None => error_response(&Error::NotFound(doi)),
    }
}

/// GET /api/graph: in-graph citation edges.
async fn get_graph(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let edges = state.session.edges();
    Json(serde_json::json!({
        "nodes": state.session.records().len(),
        "edges": edges,
        "hasCycle": state.session.has_citation_cycle(),
    }))
}
