//! Chart-ready metric history built from a fetched batch of samples.

use chrono::{DateTime, Local, NaiveDateTime, TimeZone};

use crate::types::{Sample, Timestamp};

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
];

// Epoch values above this are taken as milliseconds
const EPOCH_MILLIS_CUTOFF: i64 = 100_000_000_000;

/// Best-effort parse of a sample timestamp into local time.
pub fn parse_timestamp(ts: &Timestamp) -> Option<DateTime<Local>> {
    let raw = ts.as_str().trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Local));
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            // Naive values are wall-clock times, same as a browser would read them
            return Local.from_local_datetime(&naive).earliest();
        }
    }
    if let Ok(n) = raw.parse::<i64>() {
        let dt = if n.abs() >= EPOCH_MILLIS_CUTOFF {
            DateTime::from_timestamp_millis(n)
        } else {
            DateTime::from_timestamp(n, 0)
        };
        return dt.map(|d| d.with_timezone(&Local));
    }
    if let Ok(f) = raw.parse::<f64>() {
        if f.is_finite() {
            return DateTime::from_timestamp_millis((f * 1000.0) as i64)
                .map(|d| d.with_timezone(&Local));
        }
    }
    None
}

/// `HH:MM:SS` in local time, or the raw text when it cannot be parsed.
pub fn time_label(ts: &Timestamp) -> String {
    match parse_timestamp(ts) {
        Some(dt) => dt.format("%H:%M:%S").to_string(),
        None => ts.as_str().to_string(),
    }
}

/// The most recent sample of a batch. Uses parsed timestamps when every one
/// parses (first wins on ties); otherwise trusts the newest-first contract.
pub fn latest_sample(samples: &[Sample]) -> Option<&Sample> {
    match parse_all(samples) {
        Some(parsed) => parsed
            .iter()
            .enumerate()
            // max_by_key keeps the last max; reverse so the first one wins
            .rev()
            .max_by_key(|(_, dt)| **dt)
            .map(|(i, _)| &samples[i]),
        None => samples.first(),
    }
}

fn parse_all(samples: &[Sample]) -> Option<Vec<DateTime<Local>>> {
    samples.iter().map(|s| parse_timestamp(&s.timestamp)).collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct SeriesPoint {
    pub time: String,
    pub timestamp: Timestamp,
    pub cpu: f64,
    pub memory: f64,
    pub disk: f64,
}

/// Samples in chronological (oldest-first) order with display labels.
/// Rebuilt wholesale on every successful poll.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricSeries {
    points: Vec<SeriesPoint>,
}

impl MetricSeries {
    pub fn from_samples(samples: &[Sample]) -> Self {
        let mut ordered: Vec<&Sample> = samples.iter().collect();
        match parse_all(samples) {
            Some(parsed) => {
                let mut keyed: Vec<(DateTime<Local>, &Sample)> =
                    parsed.into_iter().zip(ordered).collect();
                // stable: equal instants keep their source order, reversed
                // below so newest-first input still reads oldest-first
                keyed.reverse();
                keyed.sort_by_key(|(dt, _)| *dt);
                ordered = keyed.into_iter().map(|(_, s)| s).collect();
            }
            None => ordered.reverse(),
        }
        let points = ordered
            .into_iter()
            .map(|s| SeriesPoint {
                time: time_label(&s.timestamp),
                timestamp: s.timestamp.clone(),
                cpu: s.cpu,
                memory: s.memory,
                disk: s.disk,
            })
            .collect();
        Self { points }
    }

    pub fn points(&self) -> &[SeriesPoint] {
        &self.points
    }

    pub fn latest(&self) -> Option<&SeriesPoint> {
        self.points.last()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// `(index, value)` pairs for one channel, ready for a chart dataset.
    pub fn channel(&self, pick: impl Fn(&SeriesPoint) -> f64) -> Vec<(f64, f64)> {
        self.points
            .iter()
            .enumerate()
            .map(|(i, p)| (i as f64, pick(p)))
            .collect()
    }
}
