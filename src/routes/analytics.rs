//! Analytics view: risk, trend summary, charts and the model prediction.

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use tracing::info;

use crate::models::PredictionResult;
use crate::state::{AnalyticsView, Panel};
use crate::DashboardState;

// ---

pub fn router() -> Router<Arc<DashboardState>> {
    // ---
    Router::new()
        .route("/api/analytics", get(analytics))
        .route("/api/prediction", get(prediction))
}

async fn analytics(State(state): State<Arc<DashboardState>>) -> Json<AnalyticsView> {
    // ---
    let view = state.analytics();
    info!(
        "GET /api/analytics - status={:?} readings={} risk={:?}",
        view.status, view.reading_count, view.risk.level
    );
    Json(view)
}

async fn prediction(
    State(state): State<Arc<DashboardState>>,
) -> Json<Panel<Option<PredictionResult>>> {
    Json(state.prediction())
}
