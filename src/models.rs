//! Data models for the AURA dashboard.
//!
//! Readings keep every metric optional: a sensor that did not report a value
//! is absent, which is not the same thing as reporting zero.

use serde::{Deserialize, Serialize};

// ---

/// One timestamped sample of river sensor values.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reading {
    // ---
    /// Push-store key, or `csv-<timestamp>` for snapshot rows.
    pub id: Option<String>,
    /// Epoch milliseconds or device-relative milliseconds. `None` when the
    /// source timestamp could not be parsed.
    pub timestamp: Option<i64>,
    /// Water level in centimetres.
    pub water_level: Option<f64>,
    /// Rainfall in millimetres.
    pub rainfall: Option<f64>,
    /// Relative humidity in percent.
    pub humidity: Option<f64>,
    /// Air temperature in degrees Celsius.
    pub temperature: Option<f64>,
}

impl Reading {
    // ---
    /// Value of the given metric, if the sensor reported it.
    pub fn metric(&self, metric: Metric) -> Option<f64> {
        // ---
        match metric {
            Metric::WaterLevel => self.water_level,
            Metric::Rainfall => self.rainfall,
            Metric::Humidity => self.humidity,
            Metric::Temperature => self.temperature,
        }
    }

    /// Identity used to decide whether derived insights must be recomputed.
    pub fn identity(&self) -> (Option<&str>, Option<i64>) {
        (self.id.as_deref(), self.timestamp)
    }

    /// True when no metric carries a value.
    pub fn is_blank(&self) -> bool {
        Metric::ALL.iter().all(|m| self.metric(*m).is_none())
    }
}

/// Sort readings non-decreasing by timestamp. Invalid timestamps sort first;
/// the sort is stable so equal keys keep their source order.
pub fn sort_readings(readings: &mut [Reading]) {
    readings.sort_by_key(|r| r.timestamp);
}

/// Tracked sensor metrics, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Metric {
    WaterLevel,
    Rainfall,
    Humidity,
    Temperature,
}

impl Metric {
    // ---
    pub const ALL: [Metric; 4] = [
        Metric::WaterLevel,
        Metric::Rainfall,
        Metric::Humidity,
        Metric::Temperature,
    ];

    pub fn label(self) -> &'static str {
        // ---
        match self {
            Metric::WaterLevel => "water level",
            Metric::Rainfall => "rainfall",
            Metric::Humidity => "humidity",
            Metric::Temperature => "temperature",
        }
    }

    pub fn unit(self) -> &'static str {
        // ---
        match self {
            Metric::WaterLevel => " cm",
            Metric::Rainfall => " mm",
            Metric::Humidity => "%",
            Metric::Temperature => "°C",
        }
    }

    /// Render a value with this metric's unit, e.g. `120.0 cm` or `28.5°C`.
    pub fn display(self, value: f64) -> String {
        format!("{value:.1}{}", self.unit())
    }
}

/// Discrete flood-risk classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    Unknown,
    Low,
    Moderate,
    High,
    Critical,
}

/// Derived flood-risk classification plus rationale message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskAssessment {
    // ---
    pub level: RiskLevel,
    pub message: String,
    pub score: u32,
}

/// Model inputs echoed back in the prediction artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionInput {
    // ---
    pub rainfall: f64,
    pub humidity: f64,
    pub temperature: f64,
    pub water_level: f64,
}

/// Output of the externally selected champion model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    // ---
    pub timestamp: String,
    /// `1` means flood predicted.
    pub prediction: u8,
    pub probability: Option<f64>,
    pub model_used: String,
    pub model_accuracy: f64,
    pub input_data: PredictionInput,
}

impl PredictionResult {
    // ---
    pub fn is_flood(&self) -> bool {
        self.prediction == 1
    }

    /// Flood probability as a whole percentage, when the model reports one.
    pub fn probability_percent(&self) -> Option<u32> {
        self.probability
            .filter(|p| p.is_finite())
            .map(|p| (p.clamp(0.0, 1.0) * 100.0).round() as u32)
    }
}

/// Entry of the detected-waste photo index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhotoRecord {
    // ---
    pub id: String,
    pub url: String,
    /// Capture date, `YYYY-MM-DD`.
    pub date: String,
    /// Capture time, `HH:MM:SS`.
    pub time: String,
    #[serde(default)]
    pub original_name: Option<String>,
}
