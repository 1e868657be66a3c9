//! Timestamp parsing for the formats tools actually emit.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %I:%M:%S %p",
];

/// Parse a tool timestamp. Values without an offset are taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Some(dt.with_timezone(&Utc));
    }
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_rfc3339_with_offset() {
        let ts = parse_timestamp("2026-03-01T10:00:00-05:00").unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2026, 3, 1, 15, 0, 0).unwrap());
    }

    #[test]
    fn test_naive_is_utc() {
        let ts = parse_timestamp("2026-03-01T10:00:00").unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2026, 3, 1, 10, 0, 0).unwrap());
        let ts = parse_timestamp("2026-03-01 10:00:00.250").unwrap();
        assert_eq!(ts.timestamp_subsec_millis(), 250);
    }

    #[test]
    fn test_us_format() {
        let ts = parse_timestamp("03/01/2026 02:30:00 PM").unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2026, 3, 1, 14, 30, 0).unwrap());
    }

    #[test]
    fn test_date_only() {
        let ts = parse_timestamp("2026-03-01").unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_garbage() {
        assert!(parse_timestamp("").is_none());
        assert!(parse_timestamp("yesterday").is_none());
    }
}
