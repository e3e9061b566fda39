//! Reading Source Adapter gateway.
//!
//! Every upstream (CSV snapshot, real-time push store, prediction and photo
//! artifacts) is normalized here into ordered [`Reading`](crate::Reading)
//! sequences or typed artifacts. Sibling modules are private; this gateway
//! exports the operations the rest of the crate uses (EMBP).
//!
//! "Not yet available" upstreams (HTTP 404) are not errors: they come back as
//! empty data. Everything else that goes wrong is a [`SourceError`].

mod artifacts;
mod keyed;
mod live;
mod poller;
mod snapshot;

pub use artifacts::{artifact_url, fetch_photos, fetch_prediction};
pub use keyed::{reading_from_record, readings_from_mapping};
pub use live::{
    apply_event, EventStreamParser, LiveConfig, RealtimeClient, ServerEvent, Subscription,
};
pub use poller::{spawn_poller, PollHandle};
pub use snapshot::{fetch_snapshot, parse_readings_csv};

/// Relative path of the periodically regenerated readings snapshot.
pub const SNAPSHOT_PATH: &str = "sensor_data.csv";
/// Relative path of the champion model's latest prediction.
pub const PREDICTION_PATH: &str = "latest_flood_risk.json";
/// Relative path of the recent detected-waste photo index.
pub const PHOTOS_PATH: &str = "detected_waste_photos/photos.json";
/// Relative path of the full detected-waste photo history.
pub const PHOTO_HISTORY_PATH: &str = "detected_waste_photos/waste_history.json";

// ---

/// Failure to load an upstream source.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// The HTTP request failed or returned a non-success status other than 404.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The body arrived but could not be decoded.
    #[error("Parse error: {0}")]
    Parse(String),

    /// CSV decoding failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The push store ended or revoked the subscription.
    #[error("Subscription closed: {0}")]
    Subscription(String),
}

impl From<serde_json::Error> for SourceError {
    fn from(e: serde_json::Error) -> Self {
        SourceError::Parse(e.to_string())
    }
}
