//! Timestamp rendering for readings.
//!
//! Sensor devices report either epoch milliseconds or milliseconds since the
//! device last booted. There is no flag telling them apart, so values below
//! [`DEVICE_CLOCK_CEILING_MS`] are treated as device-relative. A device would
//! need roughly 31 years of uptime to cross the ceiling, which is unlikely but
//! not impossible; the heuristic is kept as-is.

use chrono::{Local, TimeZone};

/// Timestamps below this value are device-relative milliseconds.
pub const DEVICE_CLOCK_CEILING_MS: i64 = 1_000_000_000_000;

/// Format used for epoch timestamps, rendered in the host's local timezone.
const LOCAL_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Render a timestamp using the default device-clock ceiling.
pub fn format_timestamp(ts: i64) -> String {
    format_timestamp_with(ts, DEVICE_CLOCK_CEILING_MS)
}

/// Render a timestamp as `"<N>s since device boot"` when below `ceiling`,
/// otherwise as a local calendar date-time.
pub fn format_timestamp_with(ts: i64, ceiling: i64) -> String {
    // ---
    if ts < ceiling {
        let seconds = (ts as f64 / 1000.0).round() as i64;
        return format!("{seconds}s since device boot");
    }

    match Local.timestamp_millis_opt(ts).single() {
        Some(dt) => dt.format(LOCAL_DATETIME_FORMAT).to_string(),
        None => ts.to_string(),
    }
}

/// Render an optional timestamp; invalid timestamps render as `Invalid Date`.
pub fn format_optional(ts: Option<i64>, ceiling: i64) -> String {
    ts.map_or_else(
        || "Invalid Date".to_string(),
        |ts| format_timestamp_with(ts, ceiling),
    )
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    #[test]
    fn test_device_relative_rounds_to_seconds() {
        // ---
        assert_eq!(format_timestamp(999), "1s since device boot");
        assert_eq!(format_timestamp(0), "0s since device boot");
        assert_eq!(format_timestamp(61_400), "61s since device boot");
    }

    #[test]
    fn test_epoch_renders_calendar_datetime() {
        // ---
        let rendered = format_timestamp(1_700_000_000_000);

        assert!(!rendered.contains("since device boot"));
        // 2023-11-14 or 2023-11-15 depending on the host timezone
        assert!(rendered.starts_with("2023-11-1"), "got {rendered}");
    }

    #[test]
    fn test_ceiling_boundary() {
        // ---
        assert!(format_timestamp(DEVICE_CLOCK_CEILING_MS - 1).contains("since device boot"));
        assert!(!format_timestamp(DEVICE_CLOCK_CEILING_MS).contains("since device boot"));
    }

    #[test]
    fn test_custom_ceiling() {
        // ---
        assert_eq!(format_timestamp_with(5_000, 10_000), "5s since device boot");
        assert!(!format_timestamp_with(20_000, 10_000).contains("since device boot"));
    }

    #[test]
    fn test_invalid_timestamp() {
        // ---
        assert_eq!(format_optional(None, DEVICE_CLOCK_CEILING_MS), "Invalid Date");
    }
}
