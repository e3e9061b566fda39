//! Export Adapter: the downloadable dashboard report.
//!
//! The report is a zip workbook with two CSV sheets: `readings.csv` holds
//! the charted readings and `summary.csv` the current risk and prediction
//! snapshot.

use std::io::{Cursor, Write};

use chrono::{DateTime, Utc};

use crate::format::format_optional;
use crate::models::{PredictionResult, Reading, RiskAssessment};

// ---

pub const READINGS_SHEET: &str = "readings.csv";
pub const SUMMARY_SHEET: &str = "summary.csv";

/// Failure while building the report.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Sheet buffer error: {0}")]
    Buffer(String),
}

/// Build the report workbook.
pub fn build_workbook(
    readings: &[Reading],
    risk: &RiskAssessment,
    prediction: Option<&PredictionResult>,
    generated_at: DateTime<Utc>,
    clock_ceiling_ms: i64,
) -> Result<Vec<u8>, ExportError> {
    // ---
    let readings_sheet = readings_csv(readings, clock_ceiling_ms)?;
    let summary_sheet = summary_csv(risk, prediction, generated_at)?;

    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = zip::write::SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated);

    zip.start_file(READINGS_SHEET, options)?;
    zip.write_all(&readings_sheet)?;
    zip.start_file(SUMMARY_SHEET, options)?;
    zip.write_all(&summary_sheet)?;

    let bytes = zip.finish()?.into_inner();
    tracing::info!(
        "Built report with {} readings ({} bytes)",
        readings.len(),
        bytes.len()
    );
    Ok(bytes)
}

fn readings_csv(readings: &[Reading], clock_ceiling_ms: i64) -> Result<Vec<u8>, ExportError> {
    // ---
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record([
        "Timestamp",
        "Time",
        "Water Level (cm)",
        "Rainfall (mm)",
        "Humidity (%)",
        "Temperature (°C)",
    ])?;

    for r in readings {
        writer.write_record([
            r.timestamp.map(|ts| ts.to_string()).unwrap_or_default(),
            format_optional(r.timestamp, clock_ceiling_ms),
            cell(r.water_level),
            cell(r.rainfall),
            cell(r.humidity),
            cell(r.temperature),
        ])?;
    }

    into_bytes(writer)
}

fn summary_csv(
    risk: &RiskAssessment,
    prediction: Option<&PredictionResult>,
    generated_at: DateTime<Utc>,
) -> Result<Vec<u8>, ExportError> {
    // ---
    let mut rows: Vec<(&str, String)> = vec![
        ("Generated At", generated_at.to_rfc3339()),
        ("Risk Level", format!("{:?}", risk.level)),
        ("Risk Score", risk.score.to_string()),
        ("Risk Message", risk.message.clone()),
    ];

    match prediction {
        Some(p) => rows.extend([
            ("Prediction Time", p.timestamp.clone()),
            (
                "Prediction",
                if p.is_flood() { "Flood" } else { "No Flood" }.to_string(),
            ),
            (
                "Flood Probability (%)",
                p.probability_percent()
                    .map(|pct| pct.to_string())
                    .unwrap_or_default(),
            ),
            ("Model", p.model_used.clone()),
            ("Model Accuracy", format!("{:.4}", p.model_accuracy)),
        ]),
        None => rows.push(("Prediction", "Unavailable".to_string())),
    }

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["Field", "Value"])?;
    for (field, value) in rows {
        writer.write_record([field, value.as_str()])?;
    }

    into_bytes(writer)
}

/// Absent values stay empty cells.
fn cell(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn into_bytes(writer: csv::Writer<Vec<u8>>) -> Result<Vec<u8>, ExportError> {
    writer
        .into_inner()
        .map_err(|e| ExportError::Buffer(e.to_string()))
}
