//! Chart projection: per-metric time series with fixed reference lines.

use serde::Serialize;

use crate::engine::Thresholds;
use crate::format::format_optional;
use crate::models::{Metric, Reading};

// ---

/// Label of the synthetic point used when only a latest reading is known.
pub const NOW_LABEL: &str = "Now";

/// One plotted sample. `value` is `None` for a gap.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    // ---
    pub label: String,
    pub timestamp: Option<i64>,
    pub value: Option<f64>,
}

/// Horizontal threshold line drawn for context.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReferenceLine {
    // ---
    pub label: &'static str,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    // ---
    pub metric: Metric,
    pub points: Vec<ChartPoint>,
    pub reference_lines: Vec<ReferenceLine>,
}

/// Project readings into one series per metric.
///
/// With an empty sequence, a known `latest` reading becomes a single point
/// labelled [`NOW_LABEL`] so the chart is never blank once data exists.
pub fn project(
    readings: &[Reading],
    latest: Option<&Reading>,
    thresholds: &Thresholds,
    clock_ceiling_ms: i64,
) -> Vec<ChartSeries> {
    // ---
    let labelled: Vec<(String, &Reading)> = if readings.is_empty() {
        latest
            .map(|r| vec![(NOW_LABEL.to_string(), r)])
            .unwrap_or_default()
    } else {
        readings
            .iter()
            .map(|r| (format_optional(r.timestamp, clock_ceiling_ms), r))
            .collect()
    };

    Metric::ALL
        .iter()
        .map(|&metric| ChartSeries {
            metric,
            points: labelled
                .iter()
                .map(|(label, r)| ChartPoint {
                    label: label.clone(),
                    timestamp: r.timestamp,
                    value: r.metric(metric).filter(|v| v.is_finite()),
                })
                .collect(),
            reference_lines: reference_lines(metric, thresholds),
        })
        .collect()
}

fn reference_lines(metric: Metric, t: &Thresholds) -> Vec<ReferenceLine> {
    // ---
    let line = |label, value| ReferenceLine { label, value };
    match metric {
        Metric::WaterLevel => vec![
            line("Safe", t.water_safe_cm),
            line("Warning", t.water_warning_cm),
            line("Danger", t.water_danger_cm),
        ],
        Metric::Rainfall => vec![
            line("Light", t.rain_light_mm),
            line("Moderate", t.rain_moderate_mm),
            line("Heavy", t.rain_heavy_mm),
        ],
        Metric::Humidity => vec![line("High", t.humidity_high_pct)],
        Metric::Temperature => vec![
            line("Low", t.temperature_low_c),
            line("High", t.temperature_high_c),
        ],
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::format::DEVICE_CLOCK_CEILING_MS;

    fn series_for(series: &[ChartSeries], metric: Metric) -> &ChartSeries {
        series.iter().find(|s| s.metric == metric).unwrap()
    }

    #[test]
    fn test_one_series_per_metric_in_order() {
        // ---
        let readings = vec![Reading {
            timestamp: Some(5_000),
            water_level: Some(10.0),
            ..Default::default()
        }];
        let series = project(&readings, None, &Thresholds::default(), DEVICE_CLOCK_CEILING_MS);
        let metrics: Vec<Metric> = series.iter().map(|s| s.metric).collect();

        assert_eq!(metrics, Metric::ALL.to_vec());
        assert_eq!(series[0].points[0].label, "5s since device boot");
    }

    #[test]
    fn test_absent_values_are_gaps_not_zero() {
        // ---
        let readings = vec![
            Reading {
                timestamp: Some(1_000),
                water_level: Some(40.0),
                temperature: Some(26.0),
                ..Default::default()
            },
            Reading {
                timestamp: Some(2_000),
                water_level: Some(41.0),
                temperature: None,
                ..Default::default()
            },
        ];
        let series = project(&readings, None, &Thresholds::default(), DEVICE_CLOCK_CEILING_MS);
        let temperature = series_for(&series, Metric::Temperature);

        assert_eq!(temperature.points[0].value, Some(26.0));
        assert_eq!(temperature.points[1].value, None);
        assert!(series_for(&series, Metric::Rainfall)
            .points
            .iter()
            .all(|p| p.value.is_none()));
    }

    #[test]
    fn test_empty_history_falls_back_to_now_point() {
        // ---
        let latest = Reading {
            timestamp: Some(1_700_000_000_000),
            water_level: Some(88.0),
            rainfall: Some(3.5),
            humidity: Some(71.0),
            temperature: Some(29.0),
            ..Default::default()
        };
        let series = project(&[], Some(&latest), &Thresholds::default(), DEVICE_CLOCK_CEILING_MS);

        for s in &series {
            assert_eq!(s.points.len(), 1);
            assert_eq!(s.points[0].label, NOW_LABEL);
            assert_eq!(s.points[0].timestamp, Some(1_700_000_000_000));
        }
        assert_eq!(series_for(&series, Metric::WaterLevel).points[0].value, Some(88.0));
        assert_eq!(series_for(&series, Metric::Temperature).points[0].value, Some(29.0));
    }

    #[test]
    fn test_empty_history_without_latest_is_empty() {
        // ---
        let series = project(&[], None, &Thresholds::default(), DEVICE_CLOCK_CEILING_MS);

        assert_eq!(series.len(), 4);
        assert!(series.iter().all(|s| s.points.is_empty()));
    }

    #[test]
    fn test_reference_lines_follow_thresholds() {
        // ---
        let t = Thresholds {
            water_danger_cm: 175.0,
            ..Thresholds::default()
        };
        let series = project(&[], None, &t, DEVICE_CLOCK_CEILING_MS);
        let water: Vec<f64> = series_for(&series, Metric::WaterLevel)
            .reference_lines
            .iter()
            .map(|l| l.value)
            .collect();

        assert_eq!(water, vec![50.0, 100.0, 175.0]);
        assert_eq!(series_for(&series, Metric::Humidity).reference_lines[0].value, 80.0);
    }
}
