//! Report download.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::Utc;
use serde::Serialize;
use tracing::{error, info};

use crate::DashboardState;

// ---

pub fn router() -> Router<Arc<DashboardState>> {
    Router::new().route("/api/export", get(handler))
}

#[derive(Serialize)]
struct ExportFailure {
    error: &'static str,
}

async fn handler(State(state): State<Arc<DashboardState>>) -> impl IntoResponse {
    // ---
    match state.export_report() {
        Ok(bytes) => {
            let filename = format!(
                "attachment; filename=\"aura-report-{}.zip\"",
                Utc::now().format("%Y%m%d-%H%M%S")
            );
            info!("GET /api/export - {} bytes", bytes.len());
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, "application/zip".to_string()),
                    (header::CONTENT_DISPOSITION, filename),
                ],
                bytes,
            )
                .into_response()
        }
        Err(e) => {
            error!("Failed to generate report: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ExportFailure {
                    error: "Failed to generate report",
                }),
            )
                .into_response()
        }
    }
}
