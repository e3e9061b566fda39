//! Memoization of derived insights, keyed by the latest reading's identity.

use serde::Serialize;

use super::{assess_risk, summarize, Thresholds, TrendSummary};
use crate::models::{Reading, RiskAssessment};

// ---

/// Risk assessment and trend summary derived from one reading snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Insight {
    // ---
    pub risk: RiskAssessment,
    pub summary: Option<TrendSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct InsightKey {
    /// Identity of the reading scored for risk.
    latest: (Option<String>, Option<i64>),
    /// Identity of the sequence's last reading, which the summary describes.
    last: (Option<String>, Option<i64>),
    len: usize,
}

fn identity(reading: Option<&Reading>) -> (Option<String>, Option<i64>) {
    reading.map_or((None, None), |r| {
        let (id, timestamp) = r.identity();
        (id.map(str::to_owned), timestamp)
    })
}

/// Recomputes the [`Insight`] only when the latest reading changes.
#[derive(Debug, Default)]
pub struct InsightCache {
    // ---
    entry: Option<(InsightKey, Insight)>,
    computations: u64,
}

impl InsightCache {
    // ---
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the insight for `readings`, with `latest` scored for risk.
    ///
    /// `latest` is usually `readings.last()`, but the live feed may know a
    /// newer reading than the history does.
    pub fn get_or_compute(
        &mut self,
        readings: &[Reading],
        latest: Option<&Reading>,
        thresholds: &Thresholds,
    ) -> Insight {
        // ---
        let key = InsightKey {
            latest: identity(latest),
            last: identity(readings.last()),
            len: readings.len(),
        };

        if let Some((cached_key, insight)) = &self.entry {
            if *cached_key == key {
                return insight.clone();
            }
        }

        tracing::debug!(
            latest = ?key.latest,
            last = ?key.last,
            "Recomputing insight over {} readings",
            key.len
        );

        let insight = Insight {
            risk: assess_risk(latest, thresholds),
            summary: summarize(readings, thresholds),
        };
        self.computations += 1;
        self.entry = Some((key, insight.clone()));
        insight
    }

    /// Number of times an insight was actually computed.
    pub fn computations(&self) -> u64 {
        self.computations
    }
}
