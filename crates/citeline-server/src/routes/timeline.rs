//! Timeline layout route.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use citeline_core::LayoutConfig;
use serde::Deserialize;

use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/timeline", get(get_timeline))
}

/// Optional canvas overrides; omitted values fall back to configuration.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CanvasQuery {
    width: Option<f64>,
    height: Option<f64>,
    node_size: Option<f64>,
}

impl CanvasQuery {
    fn apply(&self, base: LayoutConfig) -> Result<LayoutConfig, String> {
        let layout = LayoutConfig {
            width: self.width.unwrap_or(base.width),
            height: self.height.unwrap_or(base.height),
            node_size: self.node_size.unwrap_or(base.node_size),
        };
        for (name, value) in [
            ("width", layout.width),
            ("height", layout.height),
            ("nodeSize", layout.node_size),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(format!("{} must be a positive number", name));
            }
        }
        Ok(layout)
    }
}

/// GET /api/timeline?width=&height=&nodeSize=: positioned nodes and year ticks.
async fn get_timeline(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CanvasQuery>,
) -> impl IntoResponse {
    match query.apply(state.session.layout()) {
        Ok(layout) => {
            let timeline = state.session.timeline_with(&layout);
            (StatusCode::OK, Json(serde_json::json!(timeline)))
        }
        Err(msg) => (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": msg })),
        ),
    }
}
