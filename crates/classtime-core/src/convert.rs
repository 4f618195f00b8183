//! Civil time conversion between IANA timezones.
//!
//! A [`Converter`] turns either an absolute instant or a wall-clock string
//! into an instant and re-expresses it in a target zone. Malformed input or
//! unknown zone names never abort a conversion: the result is produced on a
//! best-effort basis and flagged `degraded`. Input that cannot be read as a
//! time at all falls back to the clock's current instant with `parsed` unset.

use chrono::{DateTime, Datelike, Utc};
use chrono_tz::{OffsetComponents, Tz};
use serde::Serialize;
use tracing::warn;

use crate::clock::Clock;
use crate::error::Result;
use crate::models::{DayOfWeek, serialize_tz};
use crate::parse::{LenientTime, parse_civil, parse_lenient};
use crate::tz::{format_rfc3339, offset_minutes, parse_tz, resolve_local};

/// What to convert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CivilInput<'a> {
    /// Already unambiguous.
    Instant(DateTime<Utc>),
    /// Wall-clock string without offset, read in the source timezone.
    Civil(&'a str),
}

/// An instant as seen on the wall clock of one timezone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalDisplay {
    #[serde(serialize_with = "serialize_tz")]
    pub timezone: Tz,
    /// RFC3339 with the zone's offset.
    pub local: String,
    /// `YYYY-MM-DD HH:MM`
    pub wall_clock: String,
    pub day_of_week: DayOfWeek,
    pub utc_offset_minutes: i32,
    pub dst_active: bool,
}

/// Re-express `instant` in `tz`.
pub fn display_in(instant: DateTime<Utc>, tz: Tz) -> LocalDisplay {
    let local = instant.with_timezone(&tz);
    LocalDisplay {
        timezone: tz,
        local: format_rfc3339(&local),
        wall_clock: local.format("%Y-%m-%d %H:%M").to_string(),
        day_of_week: DayOfWeek::from_weekday(local.weekday()),
        utc_offset_minutes: offset_minutes(instant, tz),
        dst_active: !local.offset().dst_offset().is_zero(),
    }
}

/// Result of [`Converter::convert`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversion {
    pub instant: DateTime<Utc>,
    pub target: LocalDisplay,
    /// Set when the input or a zone name had to be guessed.
    pub degraded: bool,
    /// False when the input could not be read as a time at all; `instant`
    /// is then the current time.
    pub parsed: bool,
}

/// Converts instants and civil times between timezones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Converter {
    default_timezone: Tz,
}

impl Converter {
    /// `default_timezone` stands in for zone names that fail to parse.
    pub fn new(default_timezone: Tz) -> Self {
        Self { default_timezone }
    }

    pub fn default_timezone(&self) -> Tz {
        self.default_timezone
    }

    /// Convert `input` from `from_timezone` to `to_timezone`.
    ///
    /// Civil input is resolved in `from_timezone`, never assumed to be UTC.
    /// Nothing here fails: unknown zones use the default zone and unreadable
    /// input uses `clock`'s current instant, both flagged `degraded`.
    ///
    /// # Examples
    ///
    /// ```
    /// use classtime_core::clock::SystemClock;
    /// use classtime_core::convert::{CivilInput, Converter};
    ///
    /// let converter = Converter::new(chrono_tz::UTC);
    /// let result = converter.convert(
    ///     CivilInput::Civil("2024-01-15T18:00"),
    ///     "America/New_York",
    ///     "Asia/Dubai",
    ///     &SystemClock,
    /// );
    /// assert_eq!(result.target.wall_clock, "2024-01-16 03:00");
    /// assert!(!result.degraded);
    /// assert!(result.parsed);
    /// ```
    pub fn convert(
        &self,
        input: CivilInput<'_>,
        from_timezone: &str,
        to_timezone: &str,
        clock: &dyn Clock,
    ) -> Conversion {
        let mut degraded = false;
        let from_tz = self.zone_or_default(from_timezone, &mut degraded);
        let to_tz = self.zone_or_default(to_timezone, &mut degraded);

        let (instant, parsed) = match input {
            CivilInput::Instant(instant) => (instant, true),
            CivilInput::Civil(text) => match self.resolve_civil(text, from_tz, &mut degraded) {
                Ok(instant) => (instant, true),
                Err(err) => {
                    let now = clock.now();
                    warn!(%err, fallback = %now, "Unreadable time, using the current instant");
                    degraded = true;
                    (now, false)
                }
            },
        };

        Conversion {
            instant,
            target: display_in(instant, to_tz),
            degraded,
            parsed,
        }
    }

    /// Parse a zone name, falling back to the default zone. The flag is set
    /// when the fallback was used.
    pub fn resolve_zone(&self, name: &str) -> (Tz, bool) {
        match parse_tz(name) {
            Ok(tz) => (tz, false),
            Err(err) => {
                warn!(%err, fallback = %self.default_timezone, "Unknown timezone, using default");
                (self.default_timezone, true)
            }
        }
    }

    fn zone_or_default(&self, name: &str, degraded: &mut bool) -> Tz {
        let (tz, fell_back) = self.resolve_zone(name);
        *degraded |= fell_back;
        tz
    }

    fn resolve_civil(&self, text: &str, tz: Tz, degraded: &mut bool) -> Result<DateTime<Utc>> {
        if let Some(instant) = parse_civil(text).ok().and_then(|n| resolve_local(n, tz)) {
            return Ok(instant);
        }

        *degraded = true;
        warn!(input = text, timezone = %tz, "Civil time is not strict ISO, parsing leniently");
        match parse_lenient(text)? {
            LenientTime::Instant(instant) => Ok(instant),
            LenientTime::Civil(naive) => {
                Ok(resolve_local(naive, tz).unwrap_or_else(|| naive.and_utc()))
            }
        }
    }
}

impl Default for Converter {
    fn default() -> Self {
        Self::new(chrono_tz::UTC)
    }
}

/// The three timezones a class is shown in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PartyTimezones {
    #[serde(serialize_with = "serialize_tz")]
    pub teacher: Tz,
    #[serde(serialize_with = "serialize_tz")]
    pub guardian: Tz,
    #[serde(serialize_with = "serialize_tz")]
    pub admin: Tz,
}

/// One instant on each party's wall clock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PartyView {
    pub teacher: LocalDisplay,
    pub guardian: LocalDisplay,
    pub admin: LocalDisplay,
}

impl PartyTimezones {
    /// Each view is computed from the instant directly, never from another
    /// party's wall clock.
    pub fn view(&self, instant: DateTime<Utc>) -> PartyView {
        PartyView {
            teacher: display_in(instant, self.teacher),
            guardian: display_in(instant, self.guardian),
            admin: display_in(instant, self.admin),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use chrono::TimeZone;

    fn converter() -> Converter {
        Converter::new("Europe/London".parse().unwrap())
    }

    fn clock() -> FixedClock {
        FixedClock(Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).single().unwrap())
    }

    #[test]
    fn instant_input_is_reexpressed() {
        let instant = Utc.with_ymd_and_hms(2026, 3, 15, 14, 0, 0).single().unwrap();
        let result = converter().convert(
            CivilInput::Instant(instant),
            "UTC",
            "America/New_York",
            &clock(),
        );
        assert_eq!(result.instant, instant);
        assert_eq!(result.target.local, "2026-03-15T10:00:00-04:00");
        assert_eq!(result.target.utc_offset_minutes, -240);
        assert!(result.target.dst_active);
        assert!(!result.degraded);
    }

    #[test]
    fn civil_input_uses_source_zone() {
        let result = converter().convert(
            CivilInput::Civil("2024-01-15T18:00"),
            "America/New_York",
            "UTC",
            &clock(),
        );
        assert_eq!(result.target.wall_clock, "2024-01-15 23:00");
        assert_eq!(result.target.day_of_week, DayOfWeek::MONDAY);
    }

    #[test]
    fn round_trip_in_standard_time() {
        let c = converter();
        let start = Utc.with_ymd_and_hms(2024, 1, 10, 9, 30, 0).single().unwrap();
        for (a, b) in [
            ("America/New_York", "Asia/Dubai"),
            ("Asia/Dubai", "Europe/Berlin"),
            ("Australia/Adelaide", "America/Los_Angeles"),
        ] {
            let there = c.convert(CivilInput::Instant(start), a, b, &clock());
            let back = c.convert(CivilInput::Instant(there.instant), b, a, &clock());
            assert_eq!(back.instant, start);
        }
    }

    #[test]
    fn wall_clock_round_trip_breaks_inside_dst_gap() {
        // 02:30 does not exist in New York on 2024-03-10; the wall clock we
        // get back is 03:30, not the one we asked for.
        let c = converter();
        let there = c.convert(
            CivilInput::Civil("2024-03-10T02:30"),
            "America/New_York",
            "Asia/Dubai",
            &clock(),
        );
        let back = c.convert(
            CivilInput::Instant(there.instant),
            "Asia/Dubai",
            "America/New_York",
            &clock(),
        );
        assert_eq!(back.target.wall_clock, "2024-03-10 03:30");
    }

    #[test]
    fn unknown_zone_degrades_to_default() {
        let result = converter().convert(
            CivilInput::Civil("2024-01-15T18:00"),
            "Nowhere/City",
            "UTC",
            &clock(),
        );
        assert!(result.degraded);
        // Read as Europe/London, which is UTC+0 in January
        assert_eq!(result.target.wall_clock, "2024-01-15 18:00");
    }

    #[test]
    fn loose_format_degrades() {
        let result = converter().convert(
            CivilInput::Civil("01/15/2024 18:00"),
            "America/New_York",
            "UTC",
            &clock(),
        );
        assert!(result.degraded);
        assert_eq!(result.target.wall_clock, "2024-01-15 23:00");
    }

    #[test]
    fn unreadable_input_falls_back_to_now() {
        let result = converter().convert(
            CivilInput::Civil("next tuesday"),
            "UTC",
            "Asia/Dubai",
            &clock(),
        );
        assert!(result.degraded);
        assert!(!result.parsed);
        assert_eq!(result.instant, clock().now());
        assert_eq!(result.target.wall_clock, "2024-06-01 16:00");
        assert_eq!(result.target.timezone.name(), "Asia/Dubai");
    }

    #[test]
    fn party_views_are_independent() {
        let parties = PartyTimezones {
            teacher: "Asia/Dubai".parse().unwrap(),
            guardian: "America/New_York".parse().unwrap(),
            admin: "Europe/Berlin".parse().unwrap(),
        };
        let instant = Utc.with_ymd_and_hms(2024, 1, 15, 23, 0, 0).single().unwrap();
        let view = parties.view(instant);
        assert_eq!(view.guardian.wall_clock, "2024-01-15 18:00");
        assert_eq!(view.teacher.wall_clock, "2024-01-16 03:00");
        assert_eq!(view.admin.wall_clock, "2024-01-16 00:00");
        assert_eq!(view.teacher.day_of_week, DayOfWeek::TUESDAY);
        assert!(!view.teacher.dst_active);
    }
}
