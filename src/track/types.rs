use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::track::clock::utc_from_millis;

/// Metric kinds reported by the activity API.
///
/// Unknown wire names are kept verbatim in [`MetricKind::Other`] so lookups
/// for them still work.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MetricKind {
    Latitude,
    Longitude,
    Elevation,
    HeartRate,
    Speed,
    Distance,
    Calories,
    Other(String),
}

impl MetricKind {
    pub fn as_str(&self) -> &str {
        match self {
            MetricKind::Latitude => "latitude",
            MetricKind::Longitude => "longitude",
            MetricKind::Elevation => "elevation",
            MetricKind::HeartRate => "heart_rate",
            MetricKind::Speed => "speed",
            MetricKind::Distance => "distance",
            MetricKind::Calories => "calories",
            MetricKind::Other(name) => name,
        }
    }
}

impl From<&str> for MetricKind {
    fn from(name: &str) -> Self {
        match name {
            "latitude" => MetricKind::Latitude,
            "longitude" => MetricKind::Longitude,
            "elevation" => MetricKind::Elevation,
            "heart_rate" => MetricKind::HeartRate,
            "speed" => MetricKind::Speed,
            "distance" => MetricKind::Distance,
            "calories" => MetricKind::Calories,
            other => MetricKind::Other(other.to_string()),
        }
    }
}

impl From<String> for MetricKind {
    fn from(name: String) -> Self {
        MetricKind::from(name.as_str())
    }
}

impl From<MetricKind> for String {
    fn from(kind: MetricKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One scalar reading valid from `start_millis` until `end_millis`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSample {
    #[serde(rename = "start_epoch_ms")]
    pub start_millis: i64,
    #[serde(rename = "end_epoch_ms")]
    pub end_millis: i64,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricStream {
    #[serde(rename = "type")]
    pub kind: MetricKind,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub values: Vec<MetricSample>,
}

/// Precomputed per-metric aggregate supplied alongside the raw streams.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryStat {
    pub metric: MetricKind,
    pub value: f64,
}

/// Decoded activity record. Synthesizers only ever borrow it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub id: String,
    #[serde(rename = "type")]
    pub activity_type: String,
    #[serde(rename = "start_epoch_ms")]
    pub start_epoch_millis: i64,
    #[serde(rename = "active_duration_ms", default)]
    pub duration_millis: Option<i64>,
    #[serde(default)]
    pub metric_types: Vec<String>,
    #[serde(default)]
    pub metrics: Vec<MetricStream>,
    #[serde(default)]
    pub summaries: Vec<SummaryStat>,
}

impl Activity {
    /// Activity start as a UTC instant.
    pub fn start(&self) -> Result<DateTime<Utc>, TrackError> {
        utc_from_millis(self.start_epoch_millis).ok_or_else(|| TrackError::MalformedSample {
            activity_id: self.id.clone(),
            metric: MetricKind::Other("start_epoch_ms".into()),
            index: 0,
            reason: format!("start {} is not a valid timestamp", self.start_epoch_millis),
        })
    }
}

/// Knobs for the performance synthesizer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SynthesisOptions {
    /// Let the earliest-starting heart-rate sample claim a track point as well.
    /// Off by default, which leaves that sample unassigned.
    pub claim_every_heart_rate_sample: bool,
}

/// One GPX track point.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionPoint {
    pub latitude: String,
    pub longitude: String,
    pub start_millis: i64,
    pub time: String,
    pub elevation: Option<String>,
    pub heart_rate: Option<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PositionTrack {
    pub activity_id: String,
    pub points: Vec<PositionPoint>,
}

/// One TCX track point.
#[derive(Debug, Clone, PartialEq)]
pub struct PerformancePoint {
    /// Start of the driving speed sample, truncated to whole seconds.
    pub epoch_millis: i64,
    pub time: String,
    pub speed_mps: f32,
    pub cumulative_distance_m: Option<f32>,
    pub heart_rate: Option<u32>,
}

/// Lap aggregate of a TCX activity.
#[derive(Debug, Clone, PartialEq)]
pub struct Lap {
    pub start_time: String,
    pub total_time_seconds: Option<f32>,
    pub distance_meters: Option<f32>,
    pub maximum_speed_mps: Option<f32>,
    pub average_speed_mps: Option<f32>,
    pub calories: Option<u32>,
    pub average_heart_rate: Option<u32>,
    pub maximum_heart_rate: Option<u32>,
    pub points: Vec<PerformancePoint>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceTrack {
    pub activity_id: String,
    pub lap: Lap,
}

/// Where a missing metric was expected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricSource {
    Stream,
    Summary,
}

impl fmt::Display for MetricSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricSource::Stream => f.write_str("stream"),
            MetricSource::Summary => f.write_str("summary"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TrackError {
    MissingMetric {
        activity_id: String,
        metric: MetricKind,
        source: MetricSource,
    },
    MalformedSample {
        activity_id: String,
        metric: MetricKind,
        index: usize,
        reason: String,
    },
}

impl fmt::Display for TrackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackError::MissingMetric {
                activity_id,
                metric,
                source,
            } => write!(f, "Activity {activity_id} has no `{metric}` {source}"),
            TrackError::MalformedSample {
                activity_id,
                metric,
                index,
                reason,
            } => write!(
                f,
                "Activity {activity_id} has a malformed `{metric}` sample at index {index}: {reason}"
            ),
        }
    }
}

impl std::error::Error for TrackError {}
