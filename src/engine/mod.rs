//! Trend/Risk Engine gateway.
//!
//! Pure functions over an ordered reading sequence, following the Explicit
//! Module Boundary Pattern (EMBP): siblings hold the algorithms, this module
//! re-exports what the rest of the crate needs.

mod cache;
mod risk;
mod trend;

pub use cache::{Insight, InsightCache};
pub use risk::assess_risk;
pub use trend::{summarize, trend_label, Implication, MetricTrend, TrendLabel, TrendSummary};

// ---

/// Deployment calibration for risk scoring, trend implications and chart
/// reference lines.
///
/// Defaults match the river station the dashboard was built for; every
/// field can be overridden from the environment (see `config`).
#[derive(Debug, Clone, PartialEq)]
pub struct Thresholds {
    // ---
    /// Water level (cm) above which the safe band is left.
    pub water_safe_cm: f64,
    /// Water level (cm) at which a warning is raised.
    pub water_warning_cm: f64,
    /// Water level (cm) considered dangerous.
    pub water_danger_cm: f64,

    pub rain_light_mm: f64,
    pub rain_moderate_mm: f64,
    pub rain_heavy_mm: f64,

    /// Humidity (%) strictly above which the risk score is bumped.
    pub humidity_high_pct: f64,
    /// Humidity (%) below which readings are flagged as anomalous.
    pub humidity_low_pct: f64,

    pub temperature_low_c: f64,
    pub temperature_high_c: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        // ---
        Self {
            water_safe_cm: 50.0,
            water_warning_cm: 100.0,
            water_danger_cm: 150.0,
            rain_light_mm: 5.0,
            rain_moderate_mm: 20.0,
            rain_heavy_mm: 50.0,
            humidity_high_pct: 80.0,
            humidity_low_pct: 10.0,
            temperature_low_c: 10.0,
            temperature_high_c: 35.0,
        }
    }
}
