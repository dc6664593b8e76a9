use crate::encode::{ActivityMetadata, EncodeError, Sport, XSI_NAMESPACE, XmlDocument};
use crate::track::clock::iso8601_fractional;
use crate::track::PositionTrack;

pub const GPX_NAMESPACE: &str = "http://www.topografix.com/GPX/1/1";
pub const TRACK_POINT_EXTENSION_NAMESPACE: &str =
    "http://www.garmin.com/xmlschemas/TrackPointExtension/v1";
pub const GPX_EXTENSIONS_NAMESPACE: &str = "http://www.garmin.com/xmlschemas/GpxExtensions/v3";
const SCHEMA_LOCATION: &str = "http://www.topografix.com/GPX/1/1 \
    http://www.topografix.com/GPX/1/1/gpx.xsd \
    http://www.garmin.com/xmlschemas/GpxExtensions/v3 \
    http://www.garmin.com/xmlschemas/GpxExtensionsv3.xsd \
    http://www.garmin.com/xmlschemas/TrackPointExtension/v1 \
    http://www.garmin.com/xmlschemas/TrackPointExtensionv1.xsd";

/// Track `<type>` codes understood by Strava's GPX importer.
fn track_type(sport: Sport) -> Option<&'static str> {
    match sport {
        Sport::Running => Some("9"),
        Sport::Biking => Some("1"),
        Sport::Other => None,
    }
}

/// Render a position track as a GPX 1.1 document with heart rate in the
/// Garmin TrackPointExtension namespace.
pub fn encode_gpx(
    track: &PositionTrack,
    metadata: &ActivityMetadata,
) -> Result<Vec<u8>, EncodeError> {
    let application = &metadata.application;
    let mut document = XmlDocument::new()?;

    document.open(
        "gpx",
        &[
            ("creator", application.creator.as_str()),
            ("xmlns:xsi", XSI_NAMESPACE),
            ("xsi:schemaLocation", SCHEMA_LOCATION),
            ("version", "1.1"),
            ("xmlns", GPX_NAMESPACE),
            ("xmlns:gpxtpx", TRACK_POINT_EXTENSION_NAMESPACE),
            ("xmlns:gpxx", GPX_EXTENSIONS_NAMESPACE),
        ],
    )?;

    document.open("metadata", &[])?;
    document.leaf("time", &iso8601_fractional(&metadata.start))?;
    document.close("metadata")?;

    document.open("trk", &[])?;
    let name = format!(
        "{} {} - {}",
        metadata.start.format("%A"),
        metadata.sport.noun(),
        application.creator
    );
    document.leaf("name", &name)?;
    if let Some(code) = track_type(metadata.sport) {
        document.leaf("type", code)?;
    }

    document.open("trkseg", &[])?;
    for point in &track.points {
        document.open(
            "trkpt",
            &[
                ("lat", point.latitude.as_str()),
                ("lon", point.longitude.as_str()),
            ],
        )?;
        if let Some(elevation) = &point.elevation {
            document.leaf("ele", elevation)?;
        }
        document.leaf("time", &point.time)?;
        if let Some(heart_rate) = point.heart_rate {
            document.open("extensions", &[])?;
            document.open("gpxtpx:TrackPointExtension", &[])?;
            document.leaf("gpxtpx:hr", &heart_rate.to_string())?;
            document.close("gpxtpx:TrackPointExtension")?;
            document.close("extensions")?;
        }
        document.close("trkpt")?;
    }
    document.close("trkseg")?;
    document.close("trk")?;
    document.close("gpx")?;

    Ok(document.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::ApplicationInfo;
    use crate::track::PositionPoint;
    use chrono::{TimeZone, Utc};

    fn metadata() -> ActivityMetadata {
        ActivityMetadata {
            activity_id: "gpx-1".into(),
            start: Utc.with_ymd_and_hms(2020, 9, 13, 12, 26, 40).unwrap(),
            sport: Sport::Running,
            application: ApplicationInfo::default(),
        }
    }

    fn point(elevation: Option<&str>, heart_rate: Option<u32>) -> PositionPoint {
        PositionPoint {
            latitude: "48.8566".into(),
            longitude: "2.3522".into(),
            start_millis: 1_600_000_000_000,
            time: "2020-09-13T12:26:40Z".into(),
            elevation: elevation.map(str::to_string),
            heart_rate,
        }
    }

    #[test]
    fn header_and_track_name_are_written() {
        let track = PositionTrack {
            activity_id: "gpx-1".into(),
            points: vec![point(Some("35.2"), Some(142))],
        };

        let xml = String::from_utf8(encode_gpx(&track, &metadata()).unwrap()).unwrap();

        assert!(xml.contains("version=\"1.1\""));
        assert!(xml.contains("xmlns=\"http://www.topografix.com/GPX/1/1\""));
        assert!(xml.contains("<name>Sunday run - runsync</name>"));
        assert!(xml.contains("<type>9</type>"));
        assert!(xml.contains("<trkpt lat=\"48.8566\" lon=\"2.3522\">"));
        assert!(xml.contains("<ele>35.2</ele>"));
        assert!(xml.contains("<gpxtpx:hr>142</gpxtpx:hr>"));
    }

    #[test]
    fn elevation_precedes_time() {
        let track = PositionTrack {
            activity_id: "gpx-1".into(),
            points: vec![point(Some("10"), None)],
        };
        let xml = String::from_utf8(encode_gpx(&track, &metadata()).unwrap()).unwrap();

        let ele = xml.find("<ele>").unwrap();
        let time = xml.rfind("<time>").unwrap();
        assert!(ele < time);
    }

    #[test]
    fn unset_optional_fields_are_omitted() {
        let track = PositionTrack {
            activity_id: "gpx-1".into(),
            points: vec![point(None, None)],
        };
        let xml = String::from_utf8(encode_gpx(&track, &metadata()).unwrap()).unwrap();

        assert!(!xml.contains("<ele>"));
        assert!(!xml.contains("<extensions>"));
    }
}
