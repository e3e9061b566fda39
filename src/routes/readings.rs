//! Raw reading panels: CSV snapshot, live latest reading and push history.

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use tracing::debug;

use crate::format::format_optional;
use crate::state::Panel;
use crate::{DashboardState, Reading};

// ---

pub fn router() -> Router<Arc<DashboardState>> {
    // ---
    Router::new()
        .route("/api/readings", get(snapshot))
        .route("/api/live", get(live))
        .route("/api/history", get(history))
}

/// Latest reading plus its rendered timestamp.
#[derive(Serialize)]
struct LiveResponse {
    #[serde(flatten)]
    panel: Panel<Option<Reading>>,
    timestamp_label: Option<String>,
}

async fn snapshot(State(state): State<Arc<DashboardState>>) -> Json<Panel<Vec<Reading>>> {
    // ---
    let panel = state.snapshot();
    debug!("GET /api/readings - {} readings", panel.data.len());
    Json(panel)
}

async fn live(State(state): State<Arc<DashboardState>>) -> Json<LiveResponse> {
    // ---
    let panel = state.latest();
    let ceiling = state.config().clock_ceiling_ms;
    let timestamp_label = panel
        .data
        .as_ref()
        .map(|r| format_optional(r.timestamp, ceiling));

    debug!("GET /api/live - {:?}", timestamp_label);
    Json(LiveResponse {
        panel,
        timestamp_label,
    })
}

async fn history(State(state): State<Arc<DashboardState>>) -> Json<Panel<Vec<Reading>>> {
    // ---
    let panel = state.history();
    debug!("GET /api/history - {} readings", panel.data.len());
    Json(panel)
}
