//! Configuration loader for the `aura-dashboard` service.
//!
//! This module centralizes all runtime configuration values and their defaults,
//! loading from environment variables (with optional `.env` file support
//! provided by the caller). By consolidating configuration logic here, we
//! avoid scattering `env::var` calls throughout the codebase.
//!
use std::env;
use std::time::Duration;

use anyhow::{anyhow, Result};
use chrono::{FixedOffset, Offset, Utc};

use crate::engine::Thresholds;
use crate::format::DEVICE_CLOCK_CEILING_MS;
use crate::source::LiveConfig;

/// Parse an optional variable of type `$ty` with a default value.
macro_rules! parse_env {
    ($lookup:expr, $var_name:expr, $ty:ty, $default:expr) => {
        ($lookup)($var_name)
            .map(|v| v.trim().parse::<$ty>())
            .transpose()
            .map_err(|e| anyhow!("Invalid {}: {}", $var_name, e))?
            .unwrap_or($default)
    };
}

/// Parse a required string variable.
macro_rules! require_env {
    ($lookup:expr, $var_name:expr) => {
        ($lookup)($var_name)
            .ok_or_else(|| anyhow!("{} must be set in .env or environment", $var_name))?
    };
}

/// Default interval between snapshot polls.
pub const DEFAULT_POLL_SECS: u64 = 60;
/// Default cap on push-store history entries.
pub const DEFAULT_HISTORY_LIMIT: usize = 48;
/// Kuala Lumpur, where the snapshot writer stamps its rows.
pub const DEFAULT_UTC_OFFSET_MINUTES: i32 = 8 * 60;

/// Strongly typed application configuration.
///
/// All fields are immutable after loading, ensuring a consistent configuration
/// snapshot for the lifetime of the application.
#[derive(Debug, Clone)]
pub struct Config {
    // ---
    /// Deployment base URL under which the static artifacts are served.
    pub base_url: String,

    /// Port for the HTTP server.
    pub listen_port: u16,

    /// Interval between snapshot polls.
    pub poll_interval: Duration,

    /// Timezone the snapshot writer uses for its timestamps.
    pub snapshot_offset: FixedOffset,

    /// Push-store connection, if a live feed is configured.
    pub live: Option<LiveConfig>,

    /// Push-store path of the latest reading.
    pub live_path: String,

    /// Push-store path of the reading history.
    pub history_path: String,

    /// Maximum number of history entries kept.
    pub history_limit: usize,

    /// Timestamps below this are device-relative.
    pub clock_ceiling_ms: i64,

    /// Risk, trend and chart calibration.
    pub thresholds: Thresholds,
}

/// Load configuration from environment variables with defaults.
///
/// Required:
/// - `AURA_BASE_URL` – base URL of the published artifacts
///
/// Optional:
/// - `LISTEN_PORT` – HTTP port (default: 8080)
/// - `SNAPSHOT_POLL_SECS` – snapshot poll interval (default: 60)
/// - `SNAPSHOT_UTC_OFFSET_MINUTES` – snapshot timestamp offset (default: 480)
/// - `FIREBASE_DATABASE_URL` – push store URL; live feed disabled when unset
/// - `FIREBASE_AUTH` – push store auth token
/// - `LIVE_PATH` / `HISTORY_PATH` / `HISTORY_LIMIT` – push store paths and cap
/// - `DEVICE_CLOCK_CEILING_MS` – device-relative timestamp ceiling
/// - `WATER_SAFE_CM`, `WATER_WARNING_CM`, `WATER_DANGER_CM`,
///   `RAIN_LIGHT_MM`, `RAIN_MODERATE_MM`, `RAIN_HEAVY_MM`,
///   `HUMIDITY_HIGH_PCT`, `HUMIDITY_LOW_PCT`,
///   `TEMPERATURE_LOW_C`, `TEMPERATURE_HIGH_C` – threshold overrides
///
/// Returns an error if any required variable is missing or invalid.
pub fn load_from_env() -> Result<Config> {
    load_from(|name| env::var(name).ok())
}

/// Build the configuration from `lookup`, which maps a variable name to its
/// value. [`load_from_env`] passes the process environment.
pub fn load_from<F>(lookup: F) -> Result<Config>
where
    F: Fn(&str) -> Option<String>,
{
    // ---
    let base_url = require_env!(lookup, "AURA_BASE_URL");
    let listen_port = parse_env!(lookup, "LISTEN_PORT", u16, 8080);
    let poll_secs = parse_env!(lookup, "SNAPSHOT_POLL_SECS", u64, DEFAULT_POLL_SECS);
    let offset_minutes =
        parse_env!(lookup, "SNAPSHOT_UTC_OFFSET_MINUTES", i32, DEFAULT_UTC_OFFSET_MINUTES);
    let snapshot_offset = FixedOffset::east_opt(offset_minutes * 60)
        .ok_or_else(|| anyhow!("Invalid SNAPSHOT_UTC_OFFSET_MINUTES: {}", offset_minutes))?;

    if poll_secs == 0 {
        return Err(anyhow!("Invalid SNAPSHOT_POLL_SECS: must be at least 1"));
    }

    let live = lookup("FIREBASE_DATABASE_URL")
        .filter(|url| !url.trim().is_empty())
        .map(|database_url| LiveConfig {
            database_url,
            auth: lookup("FIREBASE_AUTH").filter(|a| !a.is_empty()),
        });

    let d = Thresholds::default();
    let thresholds = Thresholds {
        water_safe_cm: parse_env!(lookup, "WATER_SAFE_CM", f64, d.water_safe_cm),
        water_warning_cm: parse_env!(lookup, "WATER_WARNING_CM", f64, d.water_warning_cm),
        water_danger_cm: parse_env!(lookup, "WATER_DANGER_CM", f64, d.water_danger_cm),
        rain_light_mm: parse_env!(lookup, "RAIN_LIGHT_MM", f64, d.rain_light_mm),
        rain_moderate_mm: parse_env!(lookup, "RAIN_MODERATE_MM", f64, d.rain_moderate_mm),
        rain_heavy_mm: parse_env!(lookup, "RAIN_HEAVY_MM", f64, d.rain_heavy_mm),
        humidity_high_pct: parse_env!(lookup, "HUMIDITY_HIGH_PCT", f64, d.humidity_high_pct),
        humidity_low_pct: parse_env!(lookup, "HUMIDITY_LOW_PCT", f64, d.humidity_low_pct),
        temperature_low_c: parse_env!(lookup, "TEMPERATURE_LOW_C", f64, d.temperature_low_c),
        temperature_high_c: parse_env!(lookup, "TEMPERATURE_HIGH_C", f64, d.temperature_high_c),
    };
    validate_thresholds(&thresholds)?;

    Ok(Config {
        base_url,
        listen_port,
        poll_interval: Duration::from_secs(poll_secs),
        snapshot_offset,
        live,
        live_path: lookup("LIVE_PATH").unwrap_or_else(|| "sensors/latest".to_string()),
        history_path: lookup("HISTORY_PATH").unwrap_or_else(|| "sensors/history".to_string()),
        history_limit: parse_env!(lookup, "HISTORY_LIMIT", usize, DEFAULT_HISTORY_LIMIT),
        clock_ceiling_ms: parse_env!(
            lookup,
            "DEVICE_CLOCK_CEILING_MS",
            i64,
            DEVICE_CLOCK_CEILING_MS
        ),
        thresholds,
    })
}

/// Bands must be ordered or the scoring ladder collapses.
fn validate_thresholds(t: &Thresholds) -> Result<()> {
    // ---
    if !(t.water_safe_cm <= t.water_warning_cm && t.water_warning_cm <= t.water_danger_cm) {
        return Err(anyhow!(
            "Water thresholds must satisfy safe <= warning <= danger (got {}, {}, {})",
            t.water_safe_cm,
            t.water_warning_cm,
            t.water_danger_cm
        ));
    }
    if !(t.rain_light_mm <= t.rain_moderate_mm && t.rain_moderate_mm <= t.rain_heavy_mm) {
        return Err(anyhow!(
            "Rain thresholds must satisfy light <= moderate <= heavy (got {}, {}, {})",
            t.rain_light_mm,
            t.rain_moderate_mm,
            t.rain_heavy_mm
        ));
    }
    Ok(())
}

impl Config {
    /// Configuration with every optional value at its default.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        // ---
        Self {
            base_url: base_url.into(),
            listen_port: 8080,
            poll_interval: Duration::from_secs(DEFAULT_POLL_SECS),
            snapshot_offset: FixedOffset::east_opt(DEFAULT_UTC_OFFSET_MINUTES * 60)
                .unwrap_or_else(|| Utc.fix()),
            live: None,
            live_path: "sensors/latest".to_string(),
            history_path: "sensors/history".to_string(),
            history_limit: DEFAULT_HISTORY_LIMIT,
            clock_ceiling_ms: DEVICE_CLOCK_CEILING_MS,
            thresholds: Thresholds::default(),
        }
    }

    /// Log the loaded configuration for debugging purposes.
    ///
    /// Masks the push-store auth token while showing all other values that
    /// were loaded.
    pub fn log_config(&self) {
        // ---
        let (live_url, auth) = match &self.live {
            Some(live) => (
                live.database_url.as_str(),
                if live.auth.is_some() { "****" } else { "(none)" },
            ),
            None => ("(disabled)", "(none)"),
        };
        let t = &self.thresholds;

        tracing::info!("Configuration loaded:");
        tracing::info!("  AURA_BASE_URL         : {}", self.base_url);
        tracing::info!("  LISTEN_PORT           : {}", self.listen_port);
        tracing::info!("  SNAPSHOT_POLL_SECS    : {}", self.poll_interval.as_secs());
        tracing::info!("  SNAPSHOT_UTC_OFFSET   : {}", self.snapshot_offset);
        tracing::info!("  FIREBASE_DATABASE_URL : {}", live_url);
        tracing::info!("  FIREBASE_AUTH         : {}", auth);
        tracing::info!("  LIVE_PATH             : {}", self.live_path);
        tracing::info!("  HISTORY_PATH          : {}", self.history_path);
        tracing::info!("  HISTORY_LIMIT         : {}", self.history_limit);
        tracing::info!("  DEVICE_CLOCK_CEILING  : {}", self.clock_ceiling_ms);
        tracing::info!(
            "  WATER (cm)            : safe {} / warning {} / danger {}",
            t.water_safe_cm,
            t.water_warning_cm,
            t.water_danger_cm
        );
        tracing::info!(
            "  RAIN (mm)             : light {} / moderate {} / heavy {}",
            t.rain_light_mm,
            t.rain_moderate_mm,
            t.rain_heavy_mm
        );
        tracing::info!(
            "  HUMIDITY (%)          : low {} / high {}",
            t.humidity_low_pct,
            t.humidity_high_pct
        );
        tracing::info!(
            "  TEMPERATURE (°C)      : low {} / high {}",
            t.temperature_low_c,
            t.temperature_high_c
        );
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        // ---
        let cfg = Config::with_base_url("http://localhost/aura");

        assert_eq!(cfg.poll_interval, Duration::from_secs(60));
        assert_eq!(cfg.history_limit, 48);
        assert_eq!(cfg.snapshot_offset.local_minus_utc(), 8 * 3600);
        assert_eq!(cfg.clock_ceiling_ms, 1_000_000_000_000);
        assert_eq!(cfg.thresholds, Thresholds::default());
        assert!(cfg.live.is_none());
    }

    fn load(vars: &[(&str, &str)]) -> Result<Config> {
        // ---
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        load_from(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_base_url_is_required() {
        // ---
        let err = tokio_test::assert_err!(load(&[]));
        assert!(err.to_string().contains("AURA_BASE_URL"));
    }

    #[test]
    fn test_overrides_from_lookup() {
        // ---
        let cfg = tokio_test::assert_ok!(load(&[
            ("AURA_BASE_URL", "http://localhost/aura"),
            ("SNAPSHOT_POLL_SECS", " 15 "),
            ("SNAPSHOT_UTC_OFFSET_MINUTES", "0"),
            ("DEVICE_CLOCK_CEILING_MS", "5000"),
            ("WATER_DANGER_CM", "180"),
            ("HUMIDITY_HIGH_PCT", "90"),
            ("FIREBASE_DATABASE_URL", "https://aura.example.org"),
            ("FIREBASE_AUTH", "secret"),
            ("HISTORY_LIMIT", "10"),
        ]));

        assert_eq!(cfg.poll_interval, Duration::from_secs(15));
        assert_eq!(cfg.snapshot_offset.local_minus_utc(), 0);
        assert_eq!(cfg.clock_ceiling_ms, 5000);
        assert_eq!(cfg.thresholds.water_danger_cm, 180.0);
        assert_eq!(cfg.thresholds.humidity_high_pct, 90.0);
        assert_eq!(cfg.thresholds.water_warning_cm, 100.0);
        assert_eq!(cfg.history_limit, 10);
        assert_eq!(cfg.live_path, "sensors/latest");

        let live = cfg.live.unwrap();
        assert_eq!(live.database_url, "https://aura.example.org");
        assert_eq!(live.auth.as_deref(), Some("secret"));
    }

    #[test]
    fn test_blank_database_url_disables_live_feed() {
        // ---
        let cfg = tokio_test::assert_ok!(load(&[
            ("AURA_BASE_URL", "http://localhost/aura"),
            ("FIREBASE_DATABASE_URL", "  "),
        ]));
        assert!(cfg.live.is_none());
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        // ---
        let base = ("AURA_BASE_URL", "http://localhost/aura");

        let err = tokio_test::assert_err!(load(&[base, ("SNAPSHOT_POLL_SECS", "0")]));
        assert!(err.to_string().contains("SNAPSHOT_POLL_SECS"));

        let err = tokio_test::assert_err!(load(&[base, ("LISTEN_PORT", "eighty")]));
        assert!(err.to_string().contains("LISTEN_PORT"));

        let err = tokio_test::assert_err!(load(&[base, ("WATER_SAFE_CM", "120")]));
        assert!(err.to_string().contains("Water thresholds"));

        tokio_test::assert_err!(load(&[base, ("RAIN_HEAVY_MM", "1")]));
        tokio_test::assert_err!(load(&[base, ("SNAPSHOT_UTC_OFFSET_MINUTES", "99999")]));
    }

    #[test]
    fn test_threshold_ordering_is_validated() {
        // ---
        let bad = Thresholds {
            water_warning_cm: 200.0,
            ..Thresholds::default()
        };

        tokio_test::assert_err!(validate_thresholds(&bad));
        tokio_test::assert_ok!(validate_thresholds(&Thresholds::default()));
    }
}
