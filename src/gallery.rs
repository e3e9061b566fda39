//! Aggregation over the detected-waste photo index.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::models::PhotoRecord;

// ---

/// Gallery payload: newest photos plus history counts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GallerySummary {
    // ---
    pub recent: Vec<PhotoRecord>,
    pub daily_counts: BTreeMap<String, usize>,
    pub hourly_counts: [usize; 24],
    pub total: usize,
}

/// Build the gallery payload from the recent index and the full history.
pub fn summarize(
    photos: &[PhotoRecord],
    history: &[PhotoRecord],
    recent_limit: usize,
) -> GallerySummary {
    // ---
    GallerySummary {
        recent: recent(photos, recent_limit),
        daily_counts: daily_counts(history),
        hourly_counts: hourly_counts(history),
        total: history.len(),
    }
}

/// Photo count per calendar date.
pub fn daily_counts(photos: &[PhotoRecord]) -> BTreeMap<String, usize> {
    // ---
    let mut counts = BTreeMap::new();
    for photo in photos.iter().filter(|p| !p.date.is_empty()) {
        *counts.entry(photo.date.clone()).or_insert(0) += 1;
    }
    counts
}

/// Photo count per hour-of-day bucket. Photos without a parseable hour are
/// skipped.
pub fn hourly_counts(photos: &[PhotoRecord]) -> [usize; 24] {
    // ---
    let mut buckets = [0usize; 24];
    for photo in photos {
        let hour = photo
            .time
            .split(':')
            .next()
            .and_then(|h| h.trim().parse::<usize>().ok())
            .filter(|h| *h < 24);
        match hour {
            Some(h) => buckets[h] += 1,
            None => tracing::debug!("Skipping photo {} with time {:?}", photo.id, photo.time),
        }
    }
    buckets
}

/// The `n` newest photos by date and time.
pub fn recent(photos: &[PhotoRecord], n: usize) -> Vec<PhotoRecord> {
    // ---
    let mut sorted = photos.to_vec();
    sorted.sort_by(|a, b| (&b.date, &b.time).cmp(&(&a.date, &a.time)));
    sorted.truncate(n);
    sorted
}
