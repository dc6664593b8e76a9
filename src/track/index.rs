use std::collections::HashMap;

use crate::track::types::{MetricKind, MetricSource, MetricStream, SummaryStat, TrackError};

/// First stream of the requested kind, if any.
pub fn find_metric<'a>(
    metrics: &'a [MetricStream],
    kind: &MetricKind,
) -> Option<&'a MetricStream> {
    metrics.iter().find(|stream| &stream.kind == kind)
}

/// First summary record for the requested metric, if any.
pub fn find_summary<'a>(
    summaries: &'a [SummaryStat],
    kind: &MetricKind,
) -> Option<&'a SummaryStat> {
    summaries.iter().find(|summary| &summary.metric == kind)
}

/// Borrowed lookup of an activity's streams by kind.
///
/// When several streams share a kind the first one wins, matching
/// [`find_metric`].
#[derive(Debug, Default)]
pub struct MetricIndex<'a> {
    streams: HashMap<MetricKind, &'a MetricStream>,
}

impl<'a> MetricIndex<'a> {
    pub fn new(metrics: &'a [MetricStream]) -> Self {
        let mut streams = HashMap::with_capacity(metrics.len());
        for stream in metrics {
            streams.entry(stream.kind.clone()).or_insert(stream);
        }
        Self { streams }
    }

    pub fn get(&self, kind: &MetricKind) -> Option<&'a MetricStream> {
        self.streams.get(kind).copied()
    }

    pub fn contains(&self, kind: &MetricKind) -> bool {
        self.streams.contains_key(kind)
    }

    /// Like [`MetricIndex::get`] but reports an absent stream as
    /// [`TrackError::MissingMetric`].
    pub fn require(
        &self,
        kind: MetricKind,
        activity_id: &str,
    ) -> Result<&'a MetricStream, TrackError> {
        self.get(&kind).ok_or_else(|| TrackError::MissingMetric {
            activity_id: activity_id.to_string(),
            metric: kind,
            source: MetricSource::Stream,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::track::types::MetricSample;

    fn stream(kind: MetricKind, unit: &str, value: f64) -> MetricStream {
        MetricStream {
            kind,
            unit: unit.to_string(),
            values: vec![MetricSample {
                start_millis: 0,
                end_millis: 1_000,
                value,
            }],
        }
    }

    #[test]
    fn first_matching_stream_wins() {
        let metrics = vec![
            stream(MetricKind::Speed, "KMH", 1.0),
            stream(MetricKind::HeartRate, "BPM", 140.0),
            stream(MetricKind::Speed, "KMH", 2.0),
        ];

        let index = MetricIndex::new(&metrics);
        assert_eq!(index.get(&MetricKind::Speed).unwrap().values[0].value, 1.0);
        assert_eq!(
            find_metric(&metrics, &MetricKind::Speed).unwrap().values[0].value,
            1.0
        );
        assert!(index.contains(&MetricKind::HeartRate));
        assert!(!index.contains(&MetricKind::Elevation));
    }

    #[test]
    fn require_reports_missing_stream() {
        let index = MetricIndex::new(&[]);
        let error = index.require(MetricKind::Speed, "a1").unwrap_err();
        assert_eq!(
            error,
            TrackError::MissingMetric {
                activity_id: "a1".into(),
                metric: MetricKind::Speed,
                source: MetricSource::Stream,
            }
        );
    }

    #[test]
    fn summaries_are_found_by_metric() {
        let summaries = vec![
            SummaryStat {
                metric: MetricKind::Distance,
                value: 5.2,
            },
            SummaryStat {
                metric: MetricKind::Calories,
                value: 410.0,
            },
        ];
        assert_eq!(
            find_summary(&summaries, &MetricKind::Calories).map(|s| s.value),
            Some(410.0)
        );
        assert!(find_summary(&summaries, &MetricKind::HeartRate).is_none());
    }
}
