use std::sync::Arc;

use axum::Router;

use crate::DashboardState;

mod analytics;
mod export;
mod gallery;
mod health;
mod readings;

// ---

pub fn router(state: Arc<DashboardState>) -> Router {
    // ---
    Router::new()
        .merge(readings::router())
        .merge(analytics::router())
        .merge(gallery::router())
        .merge(export::router())
        .merge(health::router())
        .with_state(state)
}
