//! Input parsing for wall-clock times and civil timestamps.
//!
//! This module provides:
//! - `HH:MM` time-of-day parsing and formatting, including the `24:00`
//!   end-of-day sentinel
//! - strict civil datetime parsing (no offset, resolved later in a timezone)
//! - a lenient parser used only on the degraded conversion path

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

use crate::error::{Result, ScheduleError};
use crate::models::TimeOfDay;

/// Minutes in a civil day; the range value of the `24:00` sentinel.
pub const MINUTES_PER_DAY: u32 = 24 * 60;

/// Civil datetime layouts accepted without degradation.
const CIVIL_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Layouts the degraded path additionally tries, in order.
const LENIENT_FORMATS: [&str; 4] = [
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%Y/%m/%d %H:%M",
    "%d.%m.%Y %H:%M",
];

/// Split an `HH:MM` string into hour and minute, allowing `24:00`.
///
/// Both fields must be exactly two digits so every accepted string formats
/// back to itself.
fn parse_clock(input: &str) -> Result<(u32, u32)> {
    let invalid = || ScheduleError::InvalidTime(format!("'{}'. Expected HH:MM", input));

    let (hour, minute) = input.trim().split_once(':').ok_or_else(invalid)?;
    let two_digits = |s: &str| s.len() == 2 && s.bytes().all(|b| b.is_ascii_digit());

    if !two_digits(hour) || !two_digits(minute) {
        return Err(invalid());
    }

    let hour: u32 = hour.parse().map_err(|_| invalid())?;
    let minute: u32 = minute.parse().map_err(|_| invalid())?;

    match (hour, minute) {
        (24, 0) => Ok((24, 0)),
        (h, m) if h < 24 && m < 60 => Ok((h, m)),
        _ => Err(ScheduleError::InvalidTime(format!(
            "'{}'. Hour must be 0-23 and minute 0-59",
            input
        ))),
    }
}

/// Parse an `HH:MM` string into a [`TimeOfDay`].
///
/// This is for positions that start something (a window start, a slot time),
/// so the `24:00` sentinel is rejected here; only [`parse_end_minutes`]
/// accepts it.
///
/// # Examples
///
/// ```
/// use classtime_core::parse::parse_time;
///
/// let t = parse_time("16:30").unwrap();
/// assert_eq!((t.hour, t.minute), (16, 30));
/// assert!(parse_time("25:00").is_err());
/// assert!(parse_time("24:00").is_err());
/// ```
pub fn parse_time(input: &str) -> Result<TimeOfDay> {
    match parse_clock(input)? {
        (24, _) => Err(ScheduleError::InvalidTime(format!(
            "'{}'. 24:00 is only valid as an end time",
            input
        ))),
        (hour, minute) => Ok(TimeOfDay::new(hour as u8, minute as u8)),
    }
}

/// Format a [`TimeOfDay`] as zero-padded `HH:MM`.
pub fn format_time(time: TimeOfDay) -> String {
    format!("{:02}:{:02}", time.hour, time.minute)
}

/// Parse an `HH:MM` range end into minutes since midnight.
///
/// Unlike [`parse_time`], `"24:00"` yields 1440 so a window can run to the
/// end of the day.
pub fn parse_end_minutes(input: &str) -> Result<u32> {
    let (hour, minute) = parse_clock(input)?;
    Ok(hour * 60 + minute)
}

/// Parse a civil datetime without offset (e.g. `2026-03-29T02:30:00`).
pub fn parse_civil(input: &str) -> Result<NaiveDateTime> {
    let trimmed = input.trim();

    for fmt in &CIVIL_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Ok(dt);
        }
    }

    Err(ScheduleError::ParseError(format!(
        "Invalid civil time '{}'. Expected YYYY-MM-DDTHH:MM[:SS]",
        input
    )))
}

/// Result of a lenient parse on the degraded path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LenientTime {
    /// Input carried its own offset or was an epoch value.
    Instant(DateTime<Utc>),
    /// Input had no offset; the caller decides how to place it.
    Civil(NaiveDateTime),
}

/// Parse anything that looks like a timestamp, trying in order:
/// RFC3339, RFC2822, epoch milliseconds or seconds, loose civil layouts, and
/// a bare date (midnight).
pub fn parse_lenient(input: &str) -> Result<LenientTime> {
    let trimmed = input.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(LenientTime::Instant(dt.with_timezone(&Utc)));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(trimmed) {
        return Ok(LenientTime::Instant(dt.with_timezone(&Utc)));
    }

    if let Ok(num) = trimmed.parse::<i64>() {
        // Heuristic: anything above 10^10 is milliseconds
        let parsed = if num > 10_000_000_000 {
            Utc.timestamp_millis_opt(num).single()
        } else {
            Utc.timestamp_opt(num, 0).single()
        };
        return parsed.map(LenientTime::Instant).ok_or_else(|| {
            ScheduleError::ParseError(format!("Epoch value out of range: {}", num))
        });
    }

    if let Ok(civil) = parse_civil(trimmed) {
        return Ok(LenientTime::Civil(civil));
    }
    for fmt in &LENIENT_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Ok(LenientTime::Civil(dt));
        }
    }
    if let Some(midnight) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
    {
        return Ok(LenientTime::Civil(midnight));
    }

    Err(ScheduleError::ParseError(format!(
        "Could not interpret '{}' as a time",
        input
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn parse_and_format_round_trip() {
        for s in ["00:00", "09:05", "12:30", "16:30", "23:59"] {
            assert_eq!(format_time(parse_time(s).unwrap()), s);
        }
    }

    #[test]
    fn every_minute_of_the_day_round_trips() {
        for minutes in 0..MINUTES_PER_DAY {
            let s = format!("{:02}:{:02}", minutes / 60, minutes % 60);
            let parsed = parse_time(&s).unwrap();
            assert_eq!(parsed.minutes(), minutes);
            assert_eq!(format_time(parsed), s);
        }
    }

    #[test]
    fn sentinel_only_ends_a_range() {
        assert!(matches!(
            parse_time("24:00"),
            Err(ScheduleError::InvalidTime(_))
        ));
        assert_eq!(parse_end_minutes("24:00").unwrap(), 1440);
        assert_eq!(parse_end_minutes("17:00").unwrap(), 1020);
    }

    #[test]
    fn single_digit_hour_is_rejected() {
        for s in ["9:15", "0:00", " 7:30"] {
            assert!(
                matches!(parse_time(s), Err(ScheduleError::InvalidTime(_))),
                "expected rejection for {s:?}"
            );
        }
        assert!(parse_end_minutes("9:15").is_err());
    }

    #[test]
    fn invalid_times_are_rejected() {
        for s in [
            "", "24:01", "25:00", "12:60", "ab:cd", "12", "12:5", "-1:00", "12:00:00", "+1:00",
            "123:00",
        ] {
            assert!(
                matches!(parse_time(s), Err(ScheduleError::InvalidTime(_))),
                "expected rejection for {s:?}"
            );
        }
    }

    #[test]
    fn parse_civil_formats() {
        let dt = parse_civil("2026-03-29T02:30:00").unwrap();
        assert_eq!((dt.hour(), dt.minute()), (2, 30));
        let dt = parse_civil("2026-03-29 18:00").unwrap();
        assert_eq!(dt.day(), 29);
        assert!(parse_civil("tomorrow").is_err());
    }

    #[test]
    fn lenient_accepts_offsets_and_epochs() {
        let parsed = parse_lenient("2026-03-29T00:15:00+01:00").unwrap();
        let expected = Utc.with_ymd_and_hms(2026, 3, 28, 23, 15, 0).single().unwrap();
        assert_eq!(parsed, LenientTime::Instant(expected));

        let parsed = parse_lenient("1793362500000").unwrap();
        let expected = Utc.timestamp_millis_opt(1793362500000).single().unwrap();
        assert_eq!(parsed, LenientTime::Instant(expected));

        let parsed = parse_lenient("1793362500").unwrap();
        let expected = Utc.timestamp_opt(1793362500, 0).single().unwrap();
        assert_eq!(parsed, LenientTime::Instant(expected));
    }

    #[test]
    fn lenient_accepts_loose_civil_layouts() {
        assert!(matches!(
            parse_lenient("03/29/2026 18:00").unwrap(),
            LenientTime::Civil(_)
        ));
        match parse_lenient("2026-03-29").unwrap() {
            LenientTime::Civil(dt) => assert_eq!(dt.hour(), 0),
            other => panic!("expected civil, got {other:?}"),
        }
        assert!(parse_lenient("not a date").is_err());
    }
}
