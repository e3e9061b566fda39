//! Liveness probe.
//!
//! Answers without touching any upstream, so a missing artifact or a dead
//! push feed never fails it.

use axum::{routing::get, Json, Router};
use serde::Serialize;

#[derive(Serialize)]
struct Liveness {
    status: &'static str,
    service: &'static str,
}

async fn liveness() -> Json<Liveness> {
    Json(Liveness {
        status: "ok",
        service: env!("CARGO_PKG_NAME"),
    })
}

/// `/health`, generic over state so the gateway can merge it anywhere.
pub fn router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new().route("/health", get(liveness))
}
