use crate::track::clock::{iso8601_seconds, truncate_to_second, utc_from_millis};
use crate::track::index::{MetricIndex, find_summary};
use crate::track::types::{
    Activity, Lap, MetricKind, MetricSample, MetricSource, PerformancePoint, PerformanceTrack,
    SynthesisOptions, TrackError,
};

/// Speed streams and speed summaries are reported in km/h.
pub const KMH_TO_MPS: f32 = 0.277778;

/// Build the TCX lap: speed-driven points, cumulative distance, claimed heart
/// rates and lap statistics.
pub fn synthesize_performance_track(
    activity: &Activity,
    options: &SynthesisOptions,
) -> Result<PerformanceTrack, TrackError> {
    let index = MetricIndex::new(&activity.metrics);
    let speeds = index.require(MetricKind::Speed, &activity.id)?;
    let heart_rates = index
        .get(&MetricKind::HeartRate)
        .map(|stream| stream.values.as_slice())
        .unwrap_or_default();

    let mut points = speed_points(activity, &speeds.values)?;

    if let Some(distances) = index.get(&MetricKind::Distance) {
        overlay_cumulative_distance(&mut points, &distances.values);
    }
    claim_heart_rates(&mut points, heart_rates, options);

    let start = activity.start()?;

    let summary = |kind: MetricKind| require_summary(activity, kind);
    let distance_km = summary(MetricKind::Distance)?;
    let calories = summary(MetricKind::Calories)?;
    let average_speed_kmh = summary(MetricKind::Speed)?;
    let average_heart_rate = if heart_rates.is_empty() {
        None
    } else {
        Some(summary(MetricKind::HeartRate)? as u32)
    };

    let lap = Lap {
        start_time: iso8601_seconds(&start),
        total_time_seconds: activity
            .duration_millis
            .map(|millis| millis as f32 / 1000.0),
        distance_meters: Some((distance_km * 1000.0) as f32),
        maximum_speed_mps: maximum(&speeds.values).map(|max| max as f32 * KMH_TO_MPS),
        average_speed_mps: Some(average_speed_kmh as f32 * KMH_TO_MPS),
        calories: Some(calories as u32),
        average_heart_rate,
        maximum_heart_rate: maximum(heart_rates).map(|max| max as u32),
        points,
    };

    Ok(PerformanceTrack {
        activity_id: activity.id.clone(),
        lap,
    })
}

fn speed_points(
    activity: &Activity,
    speeds: &[MetricSample],
) -> Result<Vec<PerformancePoint>, TrackError> {
    let mut ordered: Vec<(usize, &MetricSample)> = speeds.iter().enumerate().collect();
    ordered.sort_by_key(|(_, sample)| sample.start_millis);

    ordered
        .into_iter()
        .map(|(i, sample)| {
            let epoch_millis = truncate_to_second(sample.start_millis);
            let instant =
                utc_from_millis(epoch_millis).ok_or_else(|| TrackError::MalformedSample {
                    activity_id: activity.id.clone(),
                    metric: MetricKind::Speed,
                    index: i,
                    reason: format!("start {} is not a valid timestamp", sample.start_millis),
                })?;
            Ok(PerformancePoint {
                epoch_millis,
                time: iso8601_seconds(&instant),
                speed_mps: sample.value as f32 * KMH_TO_MPS,
                cumulative_distance_m: None,
                heart_rate: None,
            })
        })
        .collect()
}

/// Distance samples carry per-interval kilometres aligned to the points by
/// position. Points past the end of the stream hold the last total.
fn overlay_cumulative_distance(points: &mut [PerformancePoint], distances: &[MetricSample]) {
    let mut total: Option<f32> = None;
    for (i, point) in points.iter_mut().enumerate() {
        if let Some(sample) = distances.get(i) {
            let delta = (sample.value * 1000.0) as f32;
            total = Some(total.unwrap_or(0.0) + delta);
        }
        point.cumulative_distance_m = total;
    }
}

/// Each sample, latest first, claims the earliest still unclaimed point at or
/// after its start. A sample with no such point is dropped.
fn claim_heart_rates(
    points: &mut [PerformancePoint],
    heart_rates: &[MetricSample],
    options: &SynthesisOptions,
) {
    let mut latest_first: Vec<&MetricSample> = heart_rates.iter().collect();
    latest_first.sort_by(|a, b| b.start_millis.cmp(&a.start_millis));
    if !options.claim_every_heart_rate_sample {
        latest_first.pop();
    }

    for sample in latest_first {
        if let Some(point) = points.iter_mut().find(|point| {
            point.heart_rate.is_none() && point.epoch_millis >= sample.start_millis
        }) {
            point.heart_rate = Some(sample.value as u32);
        }
    }
}

fn maximum(samples: &[MetricSample]) -> Option<f64> {
    samples.iter().map(|sample| sample.value).reduce(f64::max)
}

fn require_summary(activity: &Activity, kind: MetricKind) -> Result<f64, TrackError> {
    find_summary(&activity.summaries, &kind)
        .map(|summary| summary.value)
        .ok_or_else(|| TrackError::MissingMetric {
            activity_id: activity.id.clone(),
            metric: kind,
            source: MetricSource::Summary,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(start_millis: i64, value: f64) -> MetricSample {
        MetricSample {
            start_millis,
            end_millis: start_millis + 1_000,
            value,
        }
    }

    fn point(epoch_millis: i64) -> PerformancePoint {
        PerformancePoint {
            epoch_millis,
            time: String::new(),
            speed_mps: 0.0,
            cumulative_distance_m: None,
            heart_rate: None,
        }
    }

    #[test]
    fn distance_holds_last_total_past_stream_end() {
        let mut points = vec![point(0), point(1_000), point(2_000)];
        overlay_cumulative_distance(&mut points, &[sample(0, 0.25), sample(1_000, 0.5)]);

        let totals: Vec<_> = points.iter().map(|p| p.cumulative_distance_m).collect();
        assert_eq!(totals, vec![Some(250.0), Some(750.0), Some(750.0)]);
    }

    #[test]
    fn empty_distance_stream_leaves_totals_unset() {
        let mut points = vec![point(0)];
        overlay_cumulative_distance(&mut points, &[]);
        assert_eq!(points[0].cumulative_distance_m, None);
    }

    #[test]
    fn sample_sharing_a_first_point_moves_to_the_next_free_one() {
        let mut points = vec![point(0), point(2_000), point(4_000)];
        let heart_rates = [sample(0, 100.0), sample(500, 110.0), sample(1_500, 120.0)];

        claim_heart_rates(&mut points, &heart_rates, &SynthesisOptions::default());

        let claimed: Vec<_> = points.iter().map(|p| p.heart_rate).collect();
        assert_eq!(claimed, vec![None, Some(120), Some(110)]);
    }

    #[test]
    fn claims_never_land_before_the_sample_start() {
        let mut points = vec![point(0), point(1_000), point(2_000)];
        let heart_rates = [sample(1_000, 140.0), sample(1_200, 150.0), sample(1_500, 160.0)];
        let options = SynthesisOptions {
            claim_every_heart_rate_sample: true,
        };

        claim_heart_rates(&mut points, &heart_rates, &options);

        // 1_500 takes 2_000, 1_200 finds nothing free, 1_000 takes its own point.
        let claimed: Vec<_> = points.iter().map(|p| p.heart_rate).collect();
        assert_eq!(claimed, vec![None, Some(140), Some(160)]);
    }

    #[test]
    fn earliest_sample_claims_when_enabled() {
        let mut points = vec![point(0), point(2_000)];
        let heart_rates = [sample(2_000, 150.0), sample(0, 90.0)];
        let options = SynthesisOptions {
            claim_every_heart_rate_sample: true,
        };

        claim_heart_rates(&mut points, &heart_rates, &options);

        assert_eq!(points[0].heart_rate, Some(90));
        assert_eq!(points[1].heart_rate, Some(150));
    }

    #[test]
    fn samples_after_the_last_point_claim_nothing() {
        let mut points = vec![point(0)];
        let heart_rates = [sample(0, 90.0), sample(5_000, 150.0)];
        let options = SynthesisOptions {
            claim_every_heart_rate_sample: true,
        };

        claim_heart_rates(&mut points, &heart_rates, &options);
        assert_eq!(points[0].heart_rate, Some(90));
    }

    #[test]
    fn maximum_of_empty_stream_is_none() {
        assert_eq!(maximum(&[]), None);
        assert_eq!(maximum(&[sample(0, 3.0), sample(1, 9.0), sample(2, 4.0)]), Some(9.0));
    }
}
