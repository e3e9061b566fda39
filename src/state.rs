//! Dashboard panel state and source lifecycle.
//!
//! Each upstream owns one panel slice. A source only ever writes its own
//! slice, so a failing source degrades its panel and nothing else. Writes are
//! last-write-wins.
//!
//! [`Dashboard`] starts the sources and owns every background task; dropping
//! it (or calling [`Dashboard::shutdown`]) stops polling, cancels live
//! subscriptions and closes the real-time client.

use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;
use serde::Serialize;
use tokio::task::JoinHandle;

use crate::chart::{self, ChartSeries};
use crate::engine::{Insight, InsightCache, TrendSummary};
use crate::export::{self, ExportError};
use crate::format::format_optional;
use crate::gallery::{self, GallerySummary};
use crate::models::{PhotoRecord, PredictionResult, Reading, RiskAssessment};
use crate::source::{
    self, artifact_url, fetch_photos, fetch_prediction, fetch_snapshot, reading_from_record,
    readings_from_mapping, spawn_poller, PollHandle, RealtimeClient, SourceError, Subscription,
};
use crate::Config;

/// Number of photos shown in the gallery's recent strip.
const RECENT_PHOTOS: usize = 6;

// ---

/// One panel's data with its loading and error flags.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Panel<T> {
    // ---
    pub data: T,
    pub loading: bool,
    pub error: Option<String>,
}

impl<T: Default> Default for Panel<T> {
    fn default() -> Self {
        Self {
            data: T::default(),
            loading: true,
            error: None,
        }
    }
}

impl<T> Panel<T> {
    // ---
    fn resolve(&mut self, data: T) {
        self.data = data;
        self.loading = false;
        self.error = None;
    }

    /// Keep the last good data; surface the error next to it.
    fn fail(&mut self, error: String) {
        self.loading = false;
        self.error = Some(error);
    }
}

/// Recent photo index plus full history, loaded together.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PhotoIndex {
    // ---
    pub photos: Vec<PhotoRecord>,
    pub history: Vec<PhotoRecord>,
}

/// Overall state of the analytics view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalyticsStatus {
    /// A reading source has not answered yet.
    Loading,
    /// Sources answered but there is no data yet.
    Waiting,
    Ready,
    /// Every source answered, there is no data, and at least one failed.
    Error,
}

/// Everything the analytics view renders.
#[derive(Debug, Clone, Serialize)]
pub struct AnalyticsView {
    // ---
    pub status: AnalyticsStatus,
    pub errors: Vec<String>,
    pub reading_count: usize,
    pub latest: Option<Reading>,
    pub latest_label: Option<String>,
    pub risk: RiskAssessment,
    pub summary: Option<TrendSummary>,
    pub charts: Vec<ChartSeries>,
    pub prediction: Panel<Option<PredictionResult>>,
}

/// Shared state behind the HTTP routes.
#[derive(Debug)]
pub struct DashboardState {
    // ---
    config: Config,
    snapshot: RwLock<Panel<Vec<Reading>>>,
    latest: RwLock<Panel<Option<Reading>>>,
    history: RwLock<Panel<Vec<Reading>>>,
    prediction: RwLock<Panel<Option<PredictionResult>>>,
    photos: RwLock<Panel<PhotoIndex>>,
    insights: Mutex<InsightCache>,
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

fn flags<T>(lock: &RwLock<Panel<T>>) -> (bool, Option<String>) {
    let panel = read(lock);
    (panel.loading, panel.error.clone())
}

fn update<T>(lock: &RwLock<Panel<T>>, panel: &str, result: Result<T, SourceError>) {
    // ---
    let mut guard = write(lock);
    match result {
        Ok(data) => guard.resolve(data),
        Err(e) => {
            tracing::error!(panel, "Failed to load: {}", e);
            guard.fail(format!("Failed to load {panel}: {e}"));
        }
    }
}

impl DashboardState {
    // ---
    pub fn new(config: Config) -> Self {
        // ---
        let live_enabled = config.live.is_some();
        let state = Self {
            config,
            snapshot: RwLock::default(),
            latest: RwLock::default(),
            history: RwLock::default(),
            prediction: RwLock::default(),
            photos: RwLock::default(),
            insights: Mutex::new(InsightCache::new()),
        };

        if !live_enabled {
            // Nothing will ever arrive on these panels.
            write(&state.latest).resolve(None);
            write(&state.history).resolve(Vec::new());
        }
        state
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn set_snapshot(&self, result: Result<Vec<Reading>, SourceError>) {
        update(&self.snapshot, "snapshot", result);
    }

    pub fn set_latest(&self, result: Result<Option<Reading>, SourceError>) {
        update(&self.latest, "live readings", result);
    }

    pub fn set_history(&self, result: Result<Vec<Reading>, SourceError>) {
        update(&self.history, "historical readings", result);
    }

    pub fn set_prediction(&self, result: Result<Option<PredictionResult>, SourceError>) {
        update(&self.prediction, "prediction", result);
    }

    pub fn set_photos(&self, result: Result<PhotoIndex, SourceError>) {
        update(&self.photos, "photos", result);
    }

    pub fn snapshot(&self) -> Panel<Vec<Reading>> {
        read(&self.snapshot).clone()
    }

    pub fn latest(&self) -> Panel<Option<Reading>> {
        read(&self.latest).clone()
    }

    pub fn history(&self) -> Panel<Vec<Reading>> {
        read(&self.history).clone()
    }

    pub fn prediction(&self) -> Panel<Option<PredictionResult>> {
        read(&self.prediction).clone()
    }

    pub fn photos(&self) -> Panel<PhotoIndex> {
        read(&self.photos).clone()
    }

    /// The reading sequence the analytics view works on: the CSV snapshot
    /// when it has rows, otherwise the push-store history.
    pub fn readings(&self) -> Vec<Reading> {
        // ---
        let snapshot = read(&self.snapshot);
        if !snapshot.data.is_empty() {
            return snapshot.data.clone();
        }
        read(&self.history).data.clone()
    }

    /// The newest known reading: the live feed's, unless it is missing or
    /// carries no values, then the last of `readings`.
    pub fn latest_reading(&self, readings: &[Reading]) -> Option<Reading> {
        // ---
        read(&self.latest)
            .data
            .clone()
            .filter(|r| !r.is_blank())
            .or_else(|| readings.last().cloned())
    }

    /// Risk and trend summary, recomputed only when the latest reading changes.
    pub fn insight(&self, readings: &[Reading], latest: Option<&Reading>) -> Insight {
        // ---
        self.insights
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get_or_compute(readings, latest, &self.config.thresholds)
    }

    pub fn analytics(&self) -> AnalyticsView {
        // ---
        let readings = self.readings();
        let latest = self.latest_reading(&readings);
        let insight = self.insight(&readings, latest.as_ref());
        let charts = chart::project(
            &readings,
            latest.as_ref(),
            &self.config.thresholds,
            self.config.clock_ceiling_ms,
        );

        let panels = [
            flags(&self.snapshot),
            flags(&self.history),
            flags(&self.latest),
        ];
        let errors: Vec<String> = panels.iter().filter_map(|(_, e)| e.clone()).collect();
        let any_loading = panels.iter().any(|(loading, _)| *loading);
        let has_data = !readings.is_empty() || latest.is_some();

        let status = if has_data {
            AnalyticsStatus::Ready
        } else if any_loading {
            AnalyticsStatus::Loading
        } else if !errors.is_empty() {
            AnalyticsStatus::Error
        } else {
            AnalyticsStatus::Waiting
        };

        AnalyticsView {
            status,
            errors,
            reading_count: readings.len(),
            latest_label: latest
                .as_ref()
                .map(|r| format_optional(r.timestamp, self.config.clock_ceiling_ms)),
            latest,
            risk: insight.risk,
            summary: insight.summary,
            charts,
            prediction: self.prediction(),
        }
    }

    pub fn gallery(&self) -> Panel<GallerySummary> {
        // ---
        let panel = self.photos();
        Panel {
            data: gallery::summarize(&panel.data.photos, &panel.data.history, RECENT_PHOTOS),
            loading: panel.loading,
            error: panel.error,
        }
    }

    /// Build the downloadable report from the current view.
    pub fn export_report(&self) -> Result<Vec<u8>, ExportError> {
        // ---
        let readings = self.readings();
        let latest = self.latest_reading(&readings);
        let insight = self.insight(&readings, latest.as_ref());
        let prediction = self.prediction().data;

        export::build_workbook(
            &readings,
            &insight.risk,
            prediction.as_ref(),
            Utc::now(),
            self.config.clock_ceiling_ms,
        )
    }
}

fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Running dashboard: shared state plus every background source task.
#[derive(Debug)]
pub struct Dashboard {
    // ---
    state: Arc<DashboardState>,
    poller: Option<PollHandle>,
    live: Option<RealtimeClient>,
    subscriptions: Vec<Subscription>,
    one_shots: Vec<JoinHandle<()>>,
}

impl Dashboard {
    // ---
    /// Start every configured source. Must be called within a Tokio runtime.
    pub fn start(config: Config) -> Result<Self, SourceError> {
        // ---
        let state = Arc::new(DashboardState::new(config));
        let config = state.config().clone();
        let http = reqwest::Client::builder().build()?;

        let poller = {
            let state = state.clone();
            let http = http.clone();
            let url = artifact_url(&config.base_url, source::SNAPSHOT_PATH);
            let offset = config.snapshot_offset;
            spawn_poller("snapshot", config.poll_interval, move || {
                let state = state.clone();
                let http = http.clone();
                let url = url.clone();
                async move {
                    state.set_snapshot(fetch_snapshot(&http, &url, &offset).await);
                }
            })
        };

        let prediction_task = {
            let state = state.clone();
            let http = http.clone();
            let url = artifact_url(&config.base_url, source::PREDICTION_PATH);
            tokio::spawn(async move {
                state.set_prediction(fetch_prediction(&http, &url).await);
            })
        };

        let photos_task = {
            let state = state.clone();
            let photos_url = artifact_url(&config.base_url, source::PHOTOS_PATH);
            let history_url = artifact_url(&config.base_url, source::PHOTO_HISTORY_PATH);
            tokio::spawn(async move {
                let (photos, history) = tokio::join!(
                    fetch_photos(&http, &photos_url),
                    fetch_photos(&http, &history_url)
                );
                state.set_photos(photos.and_then(|photos| {
                    history.map(|history| PhotoIndex { photos, history })
                }));
            })
        };

        let mut dashboard = Self {
            state,
            poller: Some(poller),
            live: None,
            subscriptions: Vec::new(),
            one_shots: vec![prediction_task, photos_task],
        };

        if let Some(live_config) = config.live.clone() {
            dashboard.start_live(RealtimeClient::open(live_config)?, &config);
        }

        tracing::info!("Dashboard sources started");
        Ok(dashboard)
    }

    fn start_live(&mut self, client: RealtimeClient, config: &Config) {
        // ---
        let latest_state = self.state.clone();
        let latest = client.subscribe(&config.live_path, &[], move |result| {
            latest_state.set_latest(result.map(|value| reading_from_record(&value, now_ms())));
        });

        let limit = config.history_limit;
        let history_state = self.state.clone();
        let history = client.subscribe(
            &config.history_path,
            &[
                ("orderBy", "\"timestamp\"".to_string()),
                ("limitToLast", limit.to_string()),
            ],
            move |result| {
                let history = result.map(|value| readings_from_mapping(&value, limit, now_ms()));
                history_state.set_history(history);
            },
        );

        self.subscriptions = vec![latest, history];
        self.live = Some(client);
    }

    pub fn state(&self) -> Arc<DashboardState> {
        self.state.clone()
    }

    /// Stop every source. Equivalent to dropping the dashboard.
    pub fn shutdown(self) {
        drop(self);
    }
}

impl Drop for Dashboard {
    fn drop(&mut self) {
        // ---
        self.poller.take();
        self.subscriptions.clear();
        if let Some(client) = self.live.take() {
            client.close();
        }
        for task in self.one_shots.drain(..) {
            task.abort();
        }
        tracing::info!("Dashboard sources stopped");
    }
}
