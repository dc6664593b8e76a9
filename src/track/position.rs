use crate::track::clock::{iso8601_fractional, utc_from_millis};
use crate::track::index::MetricIndex;
use crate::track::types::{
    Activity, MetricKind, MetricSample, MetricStream, PositionPoint, PositionTrack, TrackError,
};

/// Cursor over an auxiliary stream that hands out the most recent sample
/// started at or before a requested instant.
///
/// Queries must arrive in non-decreasing time order; the cursor never moves
/// backwards and stops on the last sample.
struct StepHold<'a> {
    samples: Vec<&'a MetricSample>,
    cursor: usize,
}

impl<'a> StepHold<'a> {
    /// `None` when the stream has no samples to hold.
    fn new(stream: &'a MetricStream) -> Option<Self> {
        if stream.values.is_empty() {
            return None;
        }
        let mut samples: Vec<&MetricSample> = stream.values.iter().collect();
        samples.sort_by_key(|sample| sample.start_millis);
        Some(Self { samples, cursor: 0 })
    }

    fn value_at(&mut self, millis: i64) -> f64 {
        while self.cursor + 1 < self.samples.len()
            && self.samples[self.cursor + 1].start_millis <= millis
        {
            self.cursor += 1;
        }
        self.samples[self.cursor].value
    }
}

/// Build the GPX point sequence from latitude/longitude and overlay elevation
/// and heart rate by step-hold association.
pub fn synthesize_position_track(activity: &Activity) -> Result<PositionTrack, TrackError> {
    let index = MetricIndex::new(&activity.metrics);
    let latitudes = index.require(MetricKind::Latitude, &activity.id)?;
    let longitudes = index.require(MetricKind::Longitude, &activity.id)?;

    let mut points = Vec::with_capacity(latitudes.values.len());
    for (i, latitude) in latitudes.values.iter().enumerate() {
        let longitude = longitudes
            .values
            .get(i)
            .ok_or_else(|| TrackError::MalformedSample {
                activity_id: activity.id.clone(),
                metric: MetricKind::Longitude,
                index: i,
                reason: format!(
                    "longitude stream has {} samples but latitude has {}",
                    longitudes.values.len(),
                    latitudes.values.len()
                ),
            })?;
        let instant =
            utc_from_millis(latitude.start_millis).ok_or_else(|| TrackError::MalformedSample {
                activity_id: activity.id.clone(),
                metric: MetricKind::Latitude,
                index: i,
                reason: format!("start {} is not a valid timestamp", latitude.start_millis),
            })?;

        points.push(PositionPoint {
            latitude: latitude.value.to_string(),
            longitude: longitude.value.to_string(),
            start_millis: latitude.start_millis,
            time: iso8601_fractional(&instant),
            elevation: None,
            heart_rate: None,
        });
    }

    if let Some(mut elevations) = index.get(&MetricKind::Elevation).and_then(StepHold::new) {
        for point in &mut points {
            point.elevation = Some(elevations.value_at(point.start_millis).to_string());
        }
    }

    if let Some(mut heart_rates) = index.get(&MetricKind::HeartRate).and_then(StepHold::new) {
        for point in &mut points {
            point.heart_rate = Some(heart_rates.value_at(point.start_millis) as u32);
        }
    }

    Ok(PositionTrack {
        activity_id: activity.id.clone(),
        points,
    })
}
