//! Seed input routes: add, remove and refresh user-selected identifiers.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use citeline_runtime::SyncReport;
use serde::Deserialize;
use tracing::info;

use super::error_response;
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/seeds", get(list_seeds).post(add_seed))
        .route("/seeds/{*doi}", delete(remove_seed))
        .route("/refresh", post(refresh))
}

#[derive(Deserialize)]
struct DoiBody {
    doi: String,
}

/// GET /api/seeds: user-selected records in any resolution state.
async fn list_seeds(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let seeds = state.session.seeds();
    Json(serde_json::json!({
        "seeds": seeds,
        "total": seeds.len(),
    }))
}

/// Reason the seed was evicted during `report`, if it was.
fn eviction_reason(report: &SyncReport, doi: &str) -> Option<String> {
    report.batches.iter().find_map(|batch| {
        batch
            .failed
            .iter()
            .find(|f| f.identifier.as_str() == doi && batch.evicted.contains(&f.identifier))
            .map(|f| f.reason.clone())
    })
}

/// POST /api/seeds: add a seed and resolve until the graph settles.
async fn add_seed(
    State(state): State<Arc<AppState>>,
    Json(body): Json<DoiBody>,
) -> impl IntoResponse {
    let added = match state.session.add_seed(&body.doi) {
        Ok(record) => record,
        Err(e) => return error_response(&e),
    };
    let doi = added.identifier.to_string();

    let report = match state.session.sync().await {
        Ok(report) => report,
        Err(e) => return error_response(&e),
    };

    match state.session.record(&doi) {
        Some(seed) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "seed": seed,
                "sync": report,
            })),
        ),
        None => {
            let reason = eviction_reason(&report, &doi)
                .unwrap_or_else(|| format!("{} was removed before it resolved", doi));
            info!("Seed {} rejected: {}", doi, reason);
            (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(serde_json::json!({
                    "error": reason,
                    "identifier": doi,
                    "sync": report,
                })),
            )
        }
    }
}

/// DELETE /api/seeds/{*doi}: drop a seed; discovered records stay.
async fn remove_seed(
    State(state): State<Arc<AppState>>,
    Path(doi): Path<String>,
) -> impl IntoResponse {
    match state.session.remove_seed(&doi) {
        Ok(record) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "removed": record,
                "counts": state.session.counts(),
            })),
        ),
        Err(e) => error_response(&e),
    }
}

/// POST /api/refresh: re-resolve one record, retrying it if it failed.
async fn refresh(
    State(state): State<Arc<AppState>>,
    Json(body): Json<DoiBody>,
) -> impl IntoResponse {
    if let Err(e) = state.session.refresh(&body.doi) {
        return error_response(&e);
    }
    match state.session.sync().await {
        Ok(report) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "record": state.session.record(&body.doi),
                "sync": report,
            })),
        ),
        Err(e) => error_response(&e),
    }
}
