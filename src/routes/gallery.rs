//! Detected-waste gallery: recent photos and capture counts.

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};

use crate::gallery::GallerySummary;
use crate::state::Panel;
use crate::DashboardState;

// ---

pub fn router() -> Router<Arc<DashboardState>> {
    Router::new().route("/api/gallery", get(gallery))
}

async fn gallery(State(state): State<Arc<DashboardState>>) -> Json<Panel<GallerySummary>> {
    // ---
    let panel = state.gallery();
    tracing::debug!("GET /api/gallery - {} photos in history", panel.data.total);
    Json(panel)
}
