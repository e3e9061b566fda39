//! Backend for the AURA river-monitoring dashboard.
//!
//! Ingests the artifacts the sensor pipeline publishes (CSV snapshot, real-time
//! push store, flood prediction, photo index), derives a flood-risk
//! classification, trend summary and chart series from them, and serves the
//! result as JSON.
//!
//! Module layout follows the Explicit Module Boundary Pattern (EMBP): each
//! gateway module (`engine`, `source`, `routes`) re-exports what its siblings
//! provide, and the crate root re-exports the types the binary and routes need.

pub mod chart;
pub mod config;
pub mod engine;
pub mod export;
pub mod format;
pub mod gallery;
pub mod models;
pub mod routes;
pub mod source;
pub mod state;

pub use config::Config;
pub use models::{Metric, PhotoRecord, PredictionResult, Reading, RiskAssessment, RiskLevel};
pub use state::{Dashboard, DashboardState};
