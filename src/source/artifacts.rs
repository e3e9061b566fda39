//! Static JSON artifacts published next to the dashboard.

use reqwest::StatusCode;
use serde::de::DeserializeOwned;

use super::SourceError;
use crate::models::{PhotoRecord, PredictionResult};

// ---

/// Join a relative artifact path under the deployment base URL.
pub fn artifact_url(base: &str, relative: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        relative.trim_start_matches('/')
    )
}

/// Fetch the latest champion-model prediction. `None` when not published.
pub async fn fetch_prediction(
    client: &reqwest::Client,
    url: &str,
) -> Result<Option<PredictionResult>, SourceError> {
    // ---
    let prediction = fetch_json::<PredictionResult>(client, url).await?;
    if let Some(p) = &prediction {
        tracing::info!(
            "Prediction loaded: model={} prediction={} accuracy={:.2}",
            p.model_used,
            p.prediction,
            p.model_accuracy
        );
    }
    Ok(prediction)
}

/// Fetch a photo index. Empty when not published.
pub async fn fetch_photos(
    client: &reqwest::Client,
    url: &str,
) -> Result<Vec<PhotoRecord>, SourceError> {
    // ---
    let photos = fetch_json::<Vec<PhotoRecord>>(client, url)
        .await?
        .unwrap_or_default();
    tracing::info!("Loaded {} photo records from {}", photos.len(), url);
    Ok(photos)
}

async fn fetch_json<T: DeserializeOwned>(
    client: &reqwest::Client,
    url: &str,
) -> Result<Option<T>, SourceError> {
    // ---
    tracing::debug!("Fetching artifact from: {}", url);

    let response = client.get(url).send().await?;
    if response.status() == StatusCode::NOT_FOUND {
        tracing::info!("Artifact not published yet at {}", url);
        return Ok(None);
    }

    let body = response.error_for_status()?.text().await?;
    Ok(Some(serde_json::from_str(&body)?))
}
