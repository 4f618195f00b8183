//! Timezone handling utilities.
//!
//! This module provides functions for parsing timezone names, reading UTC
//! offsets, and placing wall-clock times on the timeline with explicit
//! handling of DST gaps and overlaps.

use chrono::offset::LocalResult;
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Offset, TimeZone, Utc};
use chrono_tz::Tz;

use crate::error::{Result, ScheduleError};
use crate::models::TimeOfDay;

/// How far back to look for the offset in force before a DST gap.
const GAP_LOOKBACK_HOURS: i64 = 24;

/// Parse an IANA timezone name into a [`chrono_tz::Tz`].
///
/// # Examples
///
/// ```
/// use classtime_core::tz::parse_tz;
///
/// let tz = parse_tz("Asia/Dubai").unwrap();
/// assert_eq!(tz.to_string(), "Asia/Dubai");
/// assert!(parse_tz("Mars/Olympus").is_err());
/// ```
pub fn parse_tz(name: &str) -> Result<Tz> {
    name.trim()
        .parse::<Tz>()
        .map_err(|_| ScheduleError::InvalidTimezone(name.to_string()))
}

/// UTC offset in minutes in force at `instant`.
pub fn offset_minutes(instant: DateTime<Utc>, tz: Tz) -> i32 {
    tz.offset_from_utc_datetime(&instant.naive_utc())
        .fix()
        .local_minus_utc()
        / 60
}

/// Place a wall-clock time in `tz` on the timeline.
///
/// Ambiguous times (fall back) resolve to the earlier instant. Nonexistent
/// times (spring forward) shift forward by the size of the gap, so 02:30 on
/// a one-hour gap becomes 03:30 local.
pub fn resolve_local(local: NaiveDateTime, tz: Tz) -> Option<DateTime<Utc>> {
    match tz.from_local_datetime(&local) {
        LocalResult::Single(dt) => Some(dt.with_timezone(&Utc)),
        LocalResult::Ambiguous(first, _) => Some(first.with_timezone(&Utc)),
        LocalResult::None => {
            let before = local - Duration::hours(GAP_LOOKBACK_HOURS);
            let offset = tz.from_local_datetime(&before).earliest()?.offset().fix();
            let utc = local - Duration::seconds(i64::from(offset.local_minus_utc()));
            Some(utc.and_utc())
        }
    }
}

/// Like [`resolve_local`], but reports unresolvable input as an error.
pub fn local_to_utc(local: NaiveDateTime, tz: Tz) -> Result<DateTime<Utc>> {
    resolve_local(local, tz).ok_or_else(|| {
        ScheduleError::ParseError(format!(
            "Local time {} cannot be resolved in {}",
            local.format("%Y-%m-%dT%H:%M:%S"),
            tz
        ))
    })
}

/// Combine a date and time of day in `tz` into an instant.
pub fn at_local_time(date: NaiveDate, time: TimeOfDay, tz: Tz) -> Result<DateTime<Utc>> {
    local_to_utc(date.and_time(time.to_naive()), tz)
}

/// Format a datetime as RFC3339 with timezone offset.
///
/// e.g. `2026-03-29T00:00:00+01:00`
pub fn format_rfc3339<T: TimeZone>(dt: &DateTime<T>) -> String
where
    T::Offset: std::fmt::Display,
{
    dt.format("%Y-%m-%dT%H:%M:%S%:z").to_string()
}

/// Format a UTC datetime as RFC3339 with Z suffix.
pub fn format_rfc3339_utc(dt: &DateTime<Utc>) -> String {
    dt.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_time;

    fn new_york() -> Tz {
        parse_tz("America/New_York").unwrap()
    }

    fn naive(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test]
    fn parse_invalid_timezone() {
        let result = parse_tz("Invalid/Timezone");
        assert_eq!(
            result,
            Err(ScheduleError::InvalidTimezone("Invalid/Timezone".to_string()))
        );
    }

    #[test]
    fn offsets_follow_dst() {
        let winter = Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).single().unwrap();
        let summer = Utc.with_ymd_and_hms(2024, 7, 15, 12, 0, 0).single().unwrap();
        assert_eq!(offset_minutes(winter, new_york()), -300);
        assert_eq!(offset_minutes(summer, new_york()), -240);
        assert_eq!(offset_minutes(summer, parse_tz("Asia/Dubai").unwrap()), 240);
    }

    #[test]
    fn resolve_normal_time() {
        let utc = resolve_local(naive(2024, 1, 15, 18, 0), new_york()).unwrap();
        assert_eq!(format_rfc3339_utc(&utc), "2024-01-15T23:00:00Z");
    }

    #[test]
    fn resolve_nonexistent_time_shifts_forward() {
        // 2024-03-10 02:00 -> 03:00 in New York
        let utc = resolve_local(naive(2024, 3, 10, 2, 30), new_york()).unwrap();
        assert_eq!(format_rfc3339_utc(&utc), "2024-03-10T07:30:00Z");
        assert_eq!(
            format_rfc3339(&utc.with_timezone(&new_york())),
            "2024-03-10T03:30:00-04:00"
        );
    }

    #[test]
    fn resolve_ambiguous_time_takes_first() {
        // 2024-11-03 01:30 happens twice in New York
        let utc = resolve_local(naive(2024, 11, 3, 1, 30), new_york()).unwrap();
        assert_eq!(format_rfc3339_utc(&utc), "2024-11-03T05:30:00Z");
    }

    #[test]
    fn at_local_time_combines_date_and_time() {
        let date = NaiveDate::from_ymd_opt(2024, 7, 1).unwrap();
        let utc = at_local_time(date, parse_time("08:00").unwrap(), parse_tz("Asia/Dubai").unwrap())
            .unwrap();
        assert_eq!(format_rfc3339_utc(&utc), "2024-07-01T04:00:00Z");
    }
}
