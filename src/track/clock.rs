use chrono::{DateTime, SecondsFormat, Utc};

/// Interpret epoch milliseconds as a UTC instant.
pub fn utc_from_millis(millis: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis)
}

/// RFC 3339 in UTC with as many sub-second digits (0, 3, 6 or 9) as the
/// instant needs, e.g. `2020-09-13T12:26:40.500Z`.
pub fn iso8601_fractional(instant: &DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// RFC 3339 in UTC at whole-second precision, e.g. `2020-09-13T12:26:40Z`.
pub fn iso8601_seconds(instant: &DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Drop the sub-second part of an epoch-millisecond timestamp.
pub fn truncate_to_second(millis: i64) -> i64 {
    millis.div_euclid(1000) * 1000
}
