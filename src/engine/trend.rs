//! Natural-language trend summaries over the recent reading window.

use serde::Serialize;

use super::Thresholds;
use crate::models::{Metric, Reading};

// ---

/// Number of most recent samples considered per metric.
pub const TREND_WINDOW: usize = 12;

/// Direction and strength of a metric's movement across the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendLabel {
    Stable,
    SlightlyChanged,
    SlightlyRising,
    SlightlyFalling,
    Rising,
    Falling,
    RisingSharply,
    FallingSharply,
}

impl TrendLabel {
    // ---
    pub fn as_str(self) -> &'static str {
        // ---
        match self {
            TrendLabel::Stable => "stable",
            TrendLabel::SlightlyChanged => "slightly changed",
            TrendLabel::SlightlyRising => "slightly rising",
            TrendLabel::SlightlyFalling => "slightly falling",
            TrendLabel::Rising => "rising",
            TrendLabel::Falling => "falling",
            TrendLabel::RisingSharply => "rising sharply",
            TrendLabel::FallingSharply => "falling sharply",
        }
    }

    pub fn is_rising(self) -> bool {
        matches!(
            self,
            TrendLabel::SlightlyRising | TrendLabel::Rising | TrendLabel::RisingSharply
        )
    }
}

/// Which implication sentence fired. Exactly one per summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Implication {
    DangerWater,
    ElevatedFloodRisk,
    RunoffRisk,
    Anomalous,
    NoConcern,
}

impl Implication {
    // ---
    fn sentence(self) -> &'static str {
        // ---
        match self {
            Implication::DangerWater => {
                "The water level has reached the danger threshold, so flooding may be imminent and caution is required immediately."
            }
            Implication::ElevatedFloodRisk => {
                "Rising water combined with sustained rainfall points to an elevated risk of flooding."
            }
            Implication::RunoffRisk => {
                "Heavy rainfall on its own may cause surface runoff and a delayed rise in the river."
            }
            Implication::Anomalous => {
                "Humidity or temperature readings are outside their usual range and deserve attention."
            }
            Implication::NoConcern => "Current readings do not indicate any immediate concern.",
        }
    }

    fn recommendation(self) -> &'static str {
        // ---
        match self {
            Implication::DangerWater => {
                "Take urgent action: move to higher ground and follow local emergency guidance."
            }
            Implication::ElevatedFloodRisk => {
                "Stay vigilant and check the dashboard frequently for further changes."
            }
            Implication::RunoffRisk => {
                "Prepare for runoff by clearing drains and securing low-lying property."
            }
            Implication::Anomalous | Implication::NoConcern => {
                "No action is needed right now, but keep watching for changes."
            }
        }
    }
}

/// Trend of one metric across the recent window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricTrend {
    // ---
    pub metric: Metric,
    pub label: TrendLabel,
    pub first: f64,
    pub last: f64,
    pub average: f64,
    pub samples: usize,
}

/// Paragraph describing the latest readings, their trends, what they imply
/// and what to do about it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendSummary {
    // ---
    pub text: String,
    pub implication: Implication,
    pub recommendation: String,
    pub trends: Vec<MetricTrend>,
}

/// Classify a series by the delta between its first and last sample,
/// normalized by `max(1, |first|)`.
pub fn trend_label(series: &[f64]) -> TrendLabel {
    // ---
    let (Some(first), Some(last)) = (series.first(), series.last()) else {
        return TrendLabel::Stable;
    };

    let delta = last - first;
    let normalized = delta / first.abs().max(1.0);
    let magnitude = normalized.abs();
    let rising = delta > 0.0;

    if magnitude == 0.0 {
        TrendLabel::Stable
    } else if magnitude < 0.01 {
        TrendLabel::SlightlyChanged
    } else if magnitude < 0.05 {
        if rising {
            TrendLabel::SlightlyRising
        } else {
            TrendLabel::SlightlyFalling
        }
    } else if magnitude < 0.15 {
        if rising {
            TrendLabel::Rising
        } else {
            TrendLabel::Falling
        }
    } else if rising {
        TrendLabel::RisingSharply
    } else {
        TrendLabel::FallingSharply
    }
}

/// Build the trend summary for an ordered reading sequence.
///
/// Returns `None` when there are no readings.
pub fn summarize(readings: &[Reading], thresholds: &Thresholds) -> Option<TrendSummary> {
    // ---
    let latest = readings.last()?;

    let trends: Vec<MetricTrend> = Metric::ALL
        .iter()
        .filter_map(|m| metric_trend(readings, *m))
        .collect();

    let implication = choose_implication(latest, &trends, thresholds);

    let mut sentences = vec![snapshot_sentence(latest)];
    sentences.extend(trends.iter().map(trend_sentence));
    sentences.push(implication.sentence().to_string());
    sentences.push(implication.recommendation().to_string());

    Some(TrendSummary {
        text: sentences.join(" "),
        implication,
        recommendation: implication.recommendation().to_string(),
        trends,
    })
}

/// Present, finite samples of one metric, limited to the last
/// [`TREND_WINDOW`].
fn window(readings: &[Reading], metric: Metric) -> Vec<f64> {
    // ---
    let values: Vec<f64> = readings
        .iter()
        .filter_map(|r| r.metric(metric))
        .filter(|v| v.is_finite())
        .collect();
    let start = values.len().saturating_sub(TREND_WINDOW);
    values[start..].to_vec()
}

fn metric_trend(readings: &[Reading], metric: Metric) -> Option<MetricTrend> {
    // ---
    let series = window(readings, metric);
    let first = *series.first()?;
    let last = *series.last()?;
    let average = series.iter().sum::<f64>() / series.len() as f64;

    Some(MetricTrend {
        metric,
        label: trend_label(&series),
        first,
        last,
        average,
        samples: series.len(),
    })
}

fn choose_implication(latest: &Reading, trends: &[MetricTrend], t: &Thresholds) -> Implication {
    // ---
    let find = |metric: Metric| trends.iter().find(|tr| tr.metric == metric);
    let avg_rain = find(Metric::Rainfall).map(|tr| tr.average);

    if latest.water_level.is_some_and(|cm| cm >= t.water_danger_cm) {
        return Implication::DangerWater;
    }

    let water_rising = find(Metric::WaterLevel).is_some_and(|tr| tr.label.is_rising());
    if water_rising && avg_rain.is_some_and(|mm| mm >= t.rain_moderate_mm) {
        return Implication::ElevatedFloodRisk;
    }

    if avg_rain.is_some_and(|mm| mm >= t.rain_heavy_mm) {
        return Implication::RunoffRisk;
    }

    let humidity_odd = latest
        .humidity
        .is_some_and(|pct| pct > t.humidity_high_pct || pct < t.humidity_low_pct);
    let temperature_odd = latest
        .temperature
        .is_some_and(|c| c > t.temperature_high_c || c < t.temperature_low_c);
    if humidity_odd || temperature_odd {
        return Implication::Anomalous;
    }

    Implication::NoConcern
}

fn snapshot_sentence(latest: &Reading) -> String {
    // ---
    let parts: Vec<String> = Metric::ALL
        .iter()
        .filter_map(|m| latest.metric(*m).map(|v| format!("{} {}", m.label(), m.display(v))))
        .collect();

    if parts.is_empty() {
        "The latest reading carries no sensor values.".to_string()
    } else {
        format!("Latest reading: {}.", parts.join(", "))
    }
}

fn trend_sentence(trend: &MetricTrend) -> String {
    // ---
    let name = capitalize(trend.metric.label());
    let movement = match trend.label {
        TrendLabel::Stable => "is stable".to_string(),
        TrendLabel::SlightlyChanged => "has changed slightly".to_string(),
        other => format!("is {}", other.as_str()),
    };
    let plural = if trend.samples == 1 { "" } else { "s" };

    format!(
        "{name} {movement} ({} to {} over {} reading{plural}).",
        trend.metric.display(trend.first),
        trend.metric.display(trend.last),
        trend.samples,
    )
}

fn capitalize(s: &str) -> String {
    // ---
    let mut chars = s.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
