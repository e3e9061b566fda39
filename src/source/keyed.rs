//! Normalization of keyed push-store records into readings.
//!
//! The real-time store holds `key -> record` mappings with no ordering
//! guarantee; records may omit any metric, and older firmware omits the
//! timestamp entirely.

use serde_json::Value;

use crate::models::{sort_readings, Reading};

// ---

/// Convert a single push-store record. `null` or a non-object yields `None`.
///
/// A missing or non-numeric `timestamp` defaults to `now_ms`.
pub fn reading_from_record(value: &Value, now_ms: i64) -> Option<Reading> {
    // ---
    let record = value.as_object()?;
    let metric = |names: &[&str]| {
        names
            .iter()
            .find_map(|n| record.get(*n).and_then(number))
    };

    Some(Reading {
        id: None,
        timestamp: Some(
            record
                .get("timestamp")
                .and_then(number)
                .map_or(now_ms, |ts| ts as i64),
        ),
        water_level: metric(&["waterLevel", "water_level"]),
        rainfall: metric(&["rainfall"]),
        humidity: metric(&["humidity"]),
        temperature: metric(&["temperature"]),
    })
}

/// Convert a keyed mapping into readings sorted by timestamp, keeping the
/// most recent `limit` entries. Keys become reading ids.
pub fn readings_from_mapping(value: &Value, limit: usize, now_ms: i64) -> Vec<Reading> {
    // ---
    let Some(map) = value.as_object() else {
        return Vec::new();
    };

    let mut readings: Vec<Reading> = map
        .iter()
        .filter_map(|(key, record)| {
            reading_from_record(record, now_ms).map(|mut r| {
                r.id = Some(key.clone());
                r
            })
        })
        .collect();

    sort_readings(&mut readings);
    let start = readings.len().saturating_sub(limit);
    readings.split_off(start)
}

/// Numeric JSON value, also accepting numeric strings. Non-finite values are
/// treated as absent.
fn number(value: &Value) -> Option<f64> {
    // ---
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|v| v.is_finite())
}
