use crate::encode::{ActivityMetadata, EncodeError, XSI_NAMESPACE, XmlDocument};
use crate::track::PerformanceTrack;
use crate::track::clock::iso8601_seconds;

pub const TCX_NAMESPACE: &str = "http://www.garmin.com/xmlschemas/TrainingCenterDatabase/v2";
pub const ACTIVITY_EXTENSION_NAMESPACE: &str =
    "http://www.garmin.com/xmlschemas/ActivityExtension/v2";
const USER_PROFILE_NAMESPACE: &str = "http://www.garmin.com/xmlschemas/UserProfile/v2";
const PROFILE_EXTENSION_NAMESPACE: &str = "http://www.garmin.com/xmlschemas/ProfileExtension/v1";
const ACTIVITY_GOALS_NAMESPACE: &str = "http://www.garmin.com/xmlschemas/ActivityGoals/v1";
const SCHEMA_LOCATION: &str = "http://www.garmin.com/xmlschemas/TrainingCenterDatabase/v2 \
    http://www.garmin.com/xmlschemas/TrainingCenterDatabasev2.xsd";

/// Render a performance track as a single-lap TCX v2 activity.
///
/// `TotalTimeSeconds`, `DistanceMeters` and `Calories` are mandatory lap
/// children in the schema; if any is unset the whole encode fails instead of
/// writing a zero.
pub fn encode_tcx(
    track: &PerformanceTrack,
    metadata: &ActivityMetadata,
) -> Result<Vec<u8>, EncodeError> {
    let lap = &track.lap;
    let missing = |field: &'static str| EncodeError::MissingField {
        activity_id: track.activity_id.clone(),
        field,
    };
    let total_time_seconds = lap
        .total_time_seconds
        .ok_or_else(|| missing("TotalTimeSeconds"))?;
    let distance_meters = lap.distance_meters.ok_or_else(|| missing("DistanceMeters"))?;
    let calories = lap.calories.ok_or_else(|| missing("Calories"))?;

    let mut document = XmlDocument::new()?;
    document.open(
        "TrainingCenterDatabase",
        &[
            ("xsi:schemaLocation", SCHEMA_LOCATION),
            ("xmlns", TCX_NAMESPACE),
            ("xmlns:n5", ACTIVITY_GOALS_NAMESPACE),
            ("xmlns:n4", PROFILE_EXTENSION_NAMESPACE),
            ("xmlns:n3", ACTIVITY_EXTENSION_NAMESPACE),
            ("xmlns:n2", USER_PROFILE_NAMESPACE),
            ("xmlns:xsi", XSI_NAMESPACE),
        ],
    )?;

    document.open("Activities", &[])?;
    document.open("Activity", &[("Sport", metadata.sport.as_tcx())])?;
    document.leaf("Id", &iso8601_seconds(&metadata.start))?;

    document.open("Lap", &[("StartTime", lap.start_time.as_str())])?;
    document.leaf("TotalTimeSeconds", &total_time_seconds.to_string())?;
    document.leaf("DistanceMeters", &distance_meters.to_string())?;
    if let Some(maximum_speed) = lap.maximum_speed_mps {
        document.leaf("MaximumSpeed", &maximum_speed.to_string())?;
    }
    document.leaf("Calories", &calories.to_string())?;
    if let Some(average) = lap.average_heart_rate {
        document.value_leaf("AverageHeartRateBpm", &average.to_string())?;
    }
    if let Some(maximum) = lap.maximum_heart_rate {
        document.value_leaf("MaximumHeartRateBpm", &maximum.to_string())?;
    }
    document.leaf("Intensity", "Active")?;
    document.leaf("TriggerMethod", "Manual")?;

    document.open("Track", &[])?;
    for point in &lap.points {
        document.open("Trackpoint", &[])?;
        document.leaf("Time", &point.time)?;
        if let Some(distance) = point.cumulative_distance_m {
            document.leaf("DistanceMeters", &distance.to_string())?;
        }
        if let Some(heart_rate) = point.heart_rate {
            document.value_leaf("HeartRateBpm", &heart_rate.to_string())?;
        }
        document.open("Extensions", &[])?;
        document.open("TPX", &[("xmlns", ACTIVITY_EXTENSION_NAMESPACE)])?;
        document.leaf("Speed", &point.speed_mps.to_string())?;
        document.close("TPX")?;
        document.close("Extensions")?;
        document.close("Trackpoint")?;
    }
    document.close("Track")?;

    if let Some(average_speed) = lap.average_speed_mps {
        document.open("Extensions", &[])?;
        document.open("LX", &[("xmlns", ACTIVITY_EXTENSION_NAMESPACE)])?;
        document.leaf("AvgSpeed", &average_speed.to_string())?;
        document.close("LX")?;
        document.close("Extensions")?;
    }
    document.close("Lap")?;
    document.close("Activity")?;
    document.close("Activities")?;

    write_author(&mut document, metadata)?;
    document.close("TrainingCenterDatabase")?;

    Ok(document.finish())
}

fn write_author(
    document: &mut XmlDocument,
    metadata: &ActivityMetadata,
) -> Result<(), EncodeError> {
    let application = &metadata.application;
    document.open("Author", &[("xsi:type", "Application_t")])?;
    document.leaf("Name", &application.author_name)?;
    document.open("Build", &[])?;
    document.open("Version", &[])?;
    document.leaf("VersionMajor", &application.version_major.to_string())?;
    document.leaf("VersionMinor", &application.version_minor.to_string())?;
    document.leaf("BuildMajor", &application.build_major.to_string())?;
    document.leaf("BuildMinor", &application.build_minor.to_string())?;
    document.close("Version")?;
    document.close("Build")?;
    document.leaf("LangID", &application.lang_id)?;
    document.leaf("PartNumber", &application.part_number)?;
    document.close("Author")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::{ApplicationInfo, Sport};
    use crate::track::{Lap, PerformancePoint};
    use chrono::{TimeZone, Utc};

    fn metadata() -> ActivityMetadata {
        ActivityMetadata {
            activity_id: "tcx-1".into(),
            start: Utc.with_ymd_and_hms(2020, 9, 13, 12, 26, 40).unwrap(),
            sport: Sport::Running,
            application: ApplicationInfo::default(),
        }
    }

    fn track() -> PerformanceTrack {
        PerformanceTrack {
            activity_id: "tcx-1".into(),
            lap: Lap {
                start_time: "2020-09-13T12:26:40Z".into(),
                total_time_seconds: Some(1800.0),
                distance_meters: Some(5000.0),
                maximum_speed_mps: Some(4.5),
                average_speed_mps: Some(2.75),
                calories: Some(380),
                average_heart_rate: Some(150),
                maximum_heart_rate: None,
                points: vec![
                    PerformancePoint {
                        epoch_millis: 1_600_000_000_000,
                        time: "2020-09-13T12:26:40Z".into(),
                        speed_mps: 2.5,
                        cumulative_distance_m: Some(12.5),
                        heart_rate: Some(131),
                    },
                    PerformancePoint {
                        epoch_millis: 1_600_000_001_000,
                        time: "2020-09-13T12:26:41Z".into(),
                        speed_mps: 2.75,
                        cumulative_distance_m: None,
                        heart_rate: None,
                    },
                ],
            },
        }
    }

    #[test]
    fn lap_and_points_are_written() {
        let xml = String::from_utf8(encode_tcx(&track(), &metadata()).unwrap()).unwrap();

        assert!(xml.contains("<Activity Sport=\"Running\">"));
        assert!(xml.contains("<Id>2020-09-13T12:26:40Z</Id>"));
        assert!(xml.contains("<Lap StartTime=\"2020-09-13T12:26:40Z\">"));
        assert!(xml.contains("<DistanceMeters>5000</DistanceMeters>"));
        assert!(xml.contains("<Calories>380</Calories>"));
        assert!(xml.contains("<AvgSpeed>2.75</AvgSpeed>"));
        assert!(xml.contains("<HeartRateBpm>"));
        assert!(xml.contains("<Speed>2.5</Speed>"));
        assert_eq!(xml.matches("<Trackpoint>").count(), 2);
        assert!(!xml.contains("MaximumHeartRateBpm"));
        assert!(xml.contains("<Author xsi:type=\"Application_t\">"));
    }

    #[test]
    fn unset_calories_fail_instead_of_writing_zero() {
        let mut track = track();
        track.lap.calories = None;

        let error = encode_tcx(&track, &metadata()).unwrap_err();
        assert_eq!(
            error,
            EncodeError::MissingField {
                activity_id: "tcx-1".into(),
                field: "Calories",
            }
        );
    }

    #[test]
    fn unset_total_time_fails_instead_of_writing_zero() {
        let mut track = track();
        track.lap.total_time_seconds = None;

        let error = encode_tcx(&track, &metadata()).unwrap_err();
        assert_eq!(
            error,
            EncodeError::MissingField {
                activity_id: "tcx-1".into(),
                field: "TotalTimeSeconds",
            }
        );
    }

    #[test]
    fn namespace_prefixes_follow_training_center_layout() {
        let xml = String::from_utf8(encode_tcx(&track(), &metadata()).unwrap()).unwrap();

        assert!(xml.contains("xmlns:n2=\"http://www.garmin.com/xmlschemas/UserProfile/v2\""));
        assert!(xml.contains("xmlns:n3=\"http://www.garmin.com/xmlschemas/ActivityExtension/v2\""));
        assert!(xml.contains("xmlns:n5=\"http://www.garmin.com/xmlschemas/ActivityGoals/v1\""));
        assert!(!xml.contains("xmlns:ns"));
    }

    #[test]
    fn encoding_is_deterministic() {
        let first = encode_tcx(&track(), &metadata()).unwrap();
        let second = encode_tcx(&track(), &metadata()).unwrap();
        assert_eq!(first, second);
    }
}
