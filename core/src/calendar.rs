//! Calendar bucketing — week/month starts and relative periods.
//!
//! Weeks start on Monday. Relative periods floor toward negative
//! infinity, so an event one hour before signup is period -1.

use crate::types::Timestamp;
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};

const SECONDS_PER_DAY: i64 = 86_400;

/// Longer than chrono's whole date range; spans past it clamp to the minimum.
const MAX_SPAN_DAYS: u64 = 1_000_000 * 366;

/// Monday of the calendar week containing `ts`.
pub fn week_start(ts: Timestamp) -> NaiveDate {
    let date = ts.date();
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

/// First day of the calendar month containing `ts`.
pub fn month_start(ts: Timestamp) -> NaiveDate {
    let date = ts.date();
    date.with_day(1).unwrap_or(date)
}

/// Whole days from `from` to `to`, floored.
pub fn days_between(from: Timestamp, to: Timestamp) -> i64 {
    (to - from).num_seconds().div_euclid(SECONDS_PER_DAY)
}

/// Whole 7-day periods from `from` to `to`, floored.
pub fn weeks_between(from: Timestamp, to: Timestamp) -> i64 {
    days_between(from, to).div_euclid(7)
}

/// `ts` minus `days`, clamped to the earliest representable instant.
pub fn days_before(ts: Timestamp, days: u64) -> Timestamp {
    let days = days.min(MAX_SPAN_DAYS) as i64;
    ts.checked_sub_signed(Duration::days(days))
        .unwrap_or(NaiveDateTime::MIN)
}

/// Parse the timestamp shapes produced by SQL stores and spreadsheet
/// exports. Date-only values land on midnight.
pub fn parse_timestamp(raw: &str) -> Option<Timestamp> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    const FORMATS: [&str; 4] = [
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
    ];
    FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Canonical text form written to stores and delimited files.
pub fn format_timestamp(ts: Timestamp) -> String {
    ts.format("%Y-%m-%d %H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> Timestamp {
        parse_timestamp(s).unwrap()
    }

    #[test]
    fn week_starts_on_monday() {
        // 2025-01-01 is a Wednesday.
        assert_eq!(week_start(ts("2025-01-01")), NaiveDate::from_ymd_opt(2024, 12, 30).unwrap());
        assert_eq!(week_start(ts("2025-01-05 23:59:59")), NaiveDate::from_ymd_opt(2024, 12, 30).unwrap());
        assert_eq!(week_start(ts("2025-01-06")), NaiveDate::from_ymd_opt(2025, 1, 6).unwrap());
    }

    #[test]
    fn month_start_is_first_day() {
        assert_eq!(month_start(ts("2025-02-17 10:00:00")), NaiveDate::from_ymd_opt(2025, 2, 1).unwrap());
    }

    #[test]
    fn periods_floor_toward_negative_infinity() {
        assert_eq!(weeks_between(ts("2025-01-01"), ts("2025-01-07 23:00:00")), 0);
        assert_eq!(weeks_between(ts("2025-01-01"), ts("2025-01-08")), 1);
        assert_eq!(weeks_between(ts("2025-01-02"), ts("2025-01-01 23:00:00")), -1);
        assert_eq!(days_between(ts("2025-01-02"), ts("2025-01-01 23:00:00")), -1);
    }

    #[test]
    fn days_before_clamps_huge_spans() {
        assert_eq!(days_before(ts("2025-01-31"), 30), ts("2025-01-01"));
        assert_eq!(days_before(ts("2025-01-31"), u64::MAX), NaiveDateTime::MIN);
        assert_eq!(days_before(ts("2025-01-31"), u32::MAX as u64 * 7), NaiveDateTime::MIN);
    }

    #[test]
    fn parses_common_shapes() {
        assert!(parse_timestamp("2025-03-04").is_some());
        assert!(parse_timestamp("2025-03-04 05:06:07").is_some());
        assert!(parse_timestamp("2025-03-04T05:06:07.250").is_some());
        assert!(parse_timestamp("2025-03-04 05:06").is_some());
        assert!(parse_timestamp("").is_none());
        assert!(parse_timestamp("not a date").is_none());
        assert_eq!(format_timestamp(ts("2025-03-04")), "2025-03-04 00:00:00");
    }
}
