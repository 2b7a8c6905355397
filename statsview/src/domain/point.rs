//! Backend observations and their normalization to a single `f64`

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};

/// Raw value of one observation, as typed by the backend
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointValue {
    Double(f64),
    Int64(i64),
    /// Distribution summary. Only count and mean are needed to estimate the sum.
    Distribution { count: i64, mean: f64 },
}

impl PointValue {
    /// Scalars pass through; a distribution is summarized as `count * mean`.
    pub fn as_f64(&self) -> f64 {
        match *self {
            PointValue::Double(v) => v,
            PointValue::Int64(v) => v as f64,
            PointValue::Distribution { count, mean } => count as f64 * mean,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub timestamp: DateTime<Utc>,
    pub value: PointValue,
}

impl Point {
    pub fn new(timestamp: DateTime<Utc>, value: PointValue) -> Self {
        Self { timestamp, value }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimeSeries {
    pub metric: String,
    pub labels: BTreeMap<String, String>,
    pub points: Vec<Point>,
}

impl TimeSeries {
    pub fn latest(&self) -> Option<&Point> {
        self.points.iter().max_by_key(|p| p.timestamp)
    }
}

/// Closed time window `[start, end]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeInterval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeInterval {
    /// Window of `lookback` ending at `end`
    pub fn ending_at(end: DateTime<Utc>, lookback: Duration) -> Self {
        Self {
            start: end - lookback,
            end,
        }
    }
}

/// Most recent point of the most recent series.
///
/// The most recent series is the one whose newest point is newest, so this is
/// the newest point across every series. Older points are discarded.
pub fn latest_point(series: &[TimeSeries]) -> Option<&Point> {
    series
        .iter()
        .filter_map(TimeSeries::latest)
        .max_by_key(|p| p.timestamp)
}
