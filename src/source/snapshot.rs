//! CSV snapshot parsing and fetching.
//!
//! The sensor pipeline appends one row per run to `sensor_data.csv` with a
//! header row naming the columns. Column order is not fixed, so values are
//! mapped by header name.

use chrono::{FixedOffset, NaiveDateTime, TimeZone};
use reqwest::StatusCode;

use super::SourceError;
use crate::models::{sort_readings, Reading};

// ---

const TIMESTAMP_COLUMN: &str = "timestamp";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Parse snapshot text into readings sorted by timestamp.
///
/// Rows whose field count differs from the header are dropped. Unparseable
/// metric values become absent; an unparseable timestamp becomes `None`.
/// `offset` is the timezone the snapshot writer used for its timestamps.
pub fn parse_readings_csv(text: &str, offset: &FixedOffset) -> Vec<Reading> {
    // ---
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.trim().as_bytes());

    let headers: Vec<String> = match reader.headers() {
        Ok(h) => h.iter().map(str::to_owned).collect(),
        Err(e) => {
            tracing::debug!("Snapshot has no readable header row: {}", e);
            return Vec::new();
        }
    };

    let mut readings = Vec::new();
    for (line, result) in reader.records().enumerate() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                tracing::debug!("Dropping unreadable snapshot row {}: {}", line + 2, e);
                continue;
            }
        };

        if record.len() != headers.len() {
            tracing::debug!(
                "Dropping snapshot row {}: {} fields, header has {}",
                line + 2,
                record.len(),
                headers.len()
            );
            continue;
        }

        let mut reading = Reading::default();
        for (header, value) in headers.iter().zip(record.iter()) {
            match header.as_str() {
                TIMESTAMP_COLUMN => reading.timestamp = parse_timestamp(value, offset),
                "waterLevel" | "water_level" => reading.water_level = parse_metric(value),
                "rainfall" => reading.rainfall = parse_metric(value),
                "humidity" => reading.humidity = parse_metric(value),
                "temperature" => reading.temperature = parse_metric(value),
                _ => {}
            }
        }
        reading.id = Some(match reading.timestamp {
            Some(ts) => format!("csv-{ts}"),
            None => "csv-NaN".to_string(),
        });
        readings.push(reading);
    }

    sort_readings(&mut readings);
    readings
}

/// Fetch and parse the snapshot. A missing file (404) yields no readings.
pub async fn fetch_snapshot(
    client: &reqwest::Client,
    url: &str,
    offset: &FixedOffset,
) -> Result<Vec<Reading>, SourceError> {
    // ---
    tracing::debug!("Fetching snapshot from: {}", url);

    let response = client.get(url).send().await?;
    if response.status() == StatusCode::NOT_FOUND {
        tracing::info!("Snapshot not published yet at {}", url);
        return Ok(Vec::new());
    }

    let text = response.error_for_status()?.text().await?;
    let readings = parse_readings_csv(&text, offset);

    tracing::info!("Parsed {} readings from snapshot", readings.len());
    Ok(readings)
}

fn parse_metric(value: &str) -> Option<f64> {
    value.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn parse_timestamp(value: &str, offset: &FixedOffset) -> Option<i64> {
    // ---
    let naive = NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT).ok()?;
    offset
        .from_local_datetime(&naive)
        .single()
        .map(|dt| dt.timestamp_millis())
}
