//! Flood-risk scoring of the latest reading.

use super::Thresholds;
use crate::models::{Reading, RiskAssessment, RiskLevel};

// ---

const WATER_DANGER_POINTS: u32 = 50;
const WATER_WARNING_POINTS: u32 = 30;
const WATER_SAFE_CROSSED_POINTS: u32 = 10;

const RAIN_HEAVY_POINTS: u32 = 40;
const RAIN_MODERATE_POINTS: u32 = 25;
const RAIN_LIGHT_POINTS: u32 = 10;

const HUMIDITY_HIGH_POINTS: u32 = 5;

const CRITICAL_SCORE: u32 = 70;
const HIGH_SCORE: u32 = 50;
const MODERATE_SCORE: u32 = 30;

/// Score the latest reading and classify it.
///
/// Absent metrics contribute nothing. With no reading at all the level is
/// [`RiskLevel::Unknown`].
pub fn assess_risk(latest: Option<&Reading>, thresholds: &Thresholds) -> RiskAssessment {
    // ---
    let Some(reading) = latest else {
        return RiskAssessment {
            level: RiskLevel::Unknown,
            message: "Waiting for live sensor readings...".to_string(),
            score: 0,
        };
    };

    let score = water_points(reading.water_level, thresholds)
        + rain_points(reading.rainfall, thresholds)
        + humidity_points(reading.humidity, thresholds);

    let (level, message) = if score >= CRITICAL_SCORE {
        (RiskLevel::Critical, "Immediate action recommended")
    } else if score >= HIGH_SCORE {
        (RiskLevel::High, "Prepare for potential flooding")
    } else if score >= MODERATE_SCORE {
        (RiskLevel::Moderate, "Stay alert and monitor updates")
    } else {
        (RiskLevel::Low, "Conditions are stable")
    };

    RiskAssessment {
        level,
        message: message.to_string(),
        score,
    }
}

fn water_points(level: Option<f64>, t: &Thresholds) -> u32 {
    // ---
    match level {
        Some(cm) if cm >= t.water_danger_cm => WATER_DANGER_POINTS,
        Some(cm) if cm >= t.water_warning_cm => WATER_WARNING_POINTS,
        Some(cm) if cm >= t.water_safe_cm => WATER_SAFE_CROSSED_POINTS,
        _ => 0,
    }
}

fn rain_points(rainfall: Option<f64>, t: &Thresholds) -> u32 {
    // ---
    match rainfall {
        Some(mm) if mm >= t.rain_heavy_mm => RAIN_HEAVY_POINTS,
        Some(mm) if mm >= t.rain_moderate_mm => RAIN_MODERATE_POINTS,
        Some(mm) if mm >= t.rain_light_mm => RAIN_LIGHT_POINTS,
        _ => 0,
    }
}

fn humidity_points(humidity: Option<f64>, t: &Thresholds) -> u32 {
    match humidity {
        Some(pct) if pct > t.humidity_high_pct => HUMIDITY_HIGH_POINTS,
        _ => 0,
    }
}
