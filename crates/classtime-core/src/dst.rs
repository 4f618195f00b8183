//! DST transition detection.
//!
//! Transitions are found by sampling the UTC offset on the 1st and 15th of
//! every month and bisecting any interval whose endpoints disagree. The
//! boundary is located to the hour, which is all a "clocks change in N days"
//! warning needs.
//!
//! An interval holding two transitions that cancel out (e.g. a suspension of
//! DST for a few days) is not detected.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Timelike, Utc};
use chrono_tz::Tz;
use serde::Serialize;

use crate::clock::Clock;
use crate::models::{ClassOccurrence, DstTransition, RecurrenceSlot, TransitionKind, serialize_tz};
use crate::tz::offset_minutes;

/// Sample days within each month.
const SAMPLE_DAYS: [u32; 2] = [1, 15];

/// Find all UTC offset changes in `tz` during `year`, sorted by instant.
///
/// Zones without DST return an empty list.
///
/// # Examples
///
/// ```
/// use classtime_core::dst::find_transitions;
///
/// let tz = "America/New_York".parse().unwrap();
/// let transitions = find_transitions(tz, 2024);
/// assert_eq!(transitions.len(), 2);
/// assert_eq!(transitions[0].offset_before_minutes, -300);
/// assert_eq!(transitions[0].offset_after_minutes, -240);
/// ```
pub fn find_transitions(tz: Tz, year: i32) -> Vec<DstTransition> {
    let samples = sample_points(year);

    samples
        .windows(2)
        .filter_map(|pair| {
            let (lo, hi) = (pair[0], pair[1]);
            let before = offset_minutes(lo, tz);
            let after = offset_minutes(hi, tz);
            (before != after).then(|| {
                let instant = bisect(lo, hi, tz, before);
                let offset_after = offset_minutes(instant, tz);
                DstTransition {
                    instant,
                    kind: if offset_after > before {
                        TransitionKind::SpringForward
                    } else {
                        TransitionKind::FallBack
                    },
                    offset_before_minutes: before,
                    offset_after_minutes: offset_after,
                }
            })
        })
        .collect()
}

/// Midnight UTC on the 1st and 15th of every month, plus 1 January of the
/// following year.
fn sample_points(year: i32) -> Vec<DateTime<Utc>> {
    (1..=12)
        .flat_map(|month| SAMPLE_DAYS.iter().map(move |&day| (year, month, day)))
        .chain(std::iter::once((year + 1, 1, 1)))
        .filter_map(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d))
        .filter_map(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .collect()
}

/// Narrow `[lo, hi]` in whole hours until `hi` is the first hour whose
/// offset differs from `before`.
fn bisect(lo: DateTime<Utc>, hi: DateTime<Utc>, tz: Tz, before: i32) -> DateTime<Utc> {
    let mut lo_hours = 0i64;
    let mut hi_hours = (hi - lo).num_hours();

    while hi_hours - lo_hours > 1 {
        let mid = lo_hours + (hi_hours - lo_hours) / 2;
        if offset_minutes(lo + Duration::hours(mid), tz) == before {
            lo_hours = mid;
        } else {
            hi_hours = mid;
        }
    }

    lo + Duration::hours(hi_hours)
}

/// First transition strictly after `now`, looking into the following year
/// when none remain in the current one.
pub fn next_transition(tz: Tz, now: DateTime<Utc>) -> Option<DstTransition> {
    [now.year(), now.year() + 1]
        .into_iter()
        .flat_map(|year| find_transitions(tz, year))
        .find(|t| t.instant > now)
}

/// DST overview of one timezone for the year containing "now".
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DstSummary {
    #[serde(serialize_with = "serialize_tz")]
    pub timezone: Tz,
    pub year: i32,
    pub has_dst: bool,
    pub transitions: Vec<DstTransition>,
    pub next_transition: Option<DstTransition>,
    /// Whole days until `next_transition`.
    pub days_until_next: Option<i64>,
}

pub fn summarize(tz: Tz, year: i32, clock: &dyn Clock) -> DstSummary {
    let now = clock.now();
    let transitions = find_transitions(tz, year);
    let next = next_transition(tz, now);

    DstSummary {
        timezone: tz,
        year,
        has_dst: !transitions.is_empty(),
        transitions,
        next_transition: next,
        days_until_next: next.map(|t| (t.instant - now).num_days()),
    }
}

/// An occurrence whose wall-clock time moved for one viewer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DriftWarning {
    pub start_instant: DateTime<Utc>,
    #[serde(serialize_with = "serialize_tz")]
    pub viewer_timezone: Tz,
    /// `HH:MM` the viewer saw for the previous occurrence.
    pub previous_local_time: String,
    /// `HH:MM` the viewer sees from this occurrence on.
    pub new_local_time: String,
}

/// Flag where a viewer's wall-clock time for a recurring class changes.
///
/// Occurrences are compared per source slot, in order. A class pinned to
/// 18:00 New York is seen at 03:00 Dubai in winter and 02:00 in summer; the
/// first occurrence after the change gets a warning.
pub fn drift_warnings(occurrences: &[ClassOccurrence], viewer: Tz) -> Vec<DriftWarning> {
    let mut last_seen: Vec<(Option<&RecurrenceSlot>, u32)> = Vec::new();
    let mut warnings = Vec::new();

    for occurrence in occurrences {
        let local = occurrence.start_instant.with_timezone(&viewer);
        let minutes = local.hour() * 60 + local.minute();
        let key = occurrence.source_slot.as_ref();

        match last_seen.iter_mut().find(|(slot, _)| *slot == key) {
            Some((_, previous)) => {
                if *previous != minutes {
                    warnings.push(DriftWarning {
                        start_instant: occurrence.start_instant,
                        viewer_timezone: viewer,
                        previous_local_time: clock_label(*previous),
                        new_local_time: clock_label(minutes),
                    });
                    *previous = minutes;
                }
            }
            None => last_seen.push((key, minutes)),
        }
    }

    warnings
}

fn clock_label(minutes: u32) -> String {
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::models::DayOfWeek;
    use crate::parse::parse_time;
    use crate::tz::{format_rfc3339_utc, parse_tz};
    use chrono::TimeZone;

    #[test]
    fn new_york_2024() {
        let transitions = find_transitions(parse_tz("America/New_York").unwrap(), 2024);
        assert_eq!(transitions.len(), 2);

        let spring = &transitions[0];
        assert_eq!(spring.kind, TransitionKind::SpringForward);
        assert_eq!(spring.instant.month(), 3);
        assert_eq!(format_rfc3339_utc(&spring.instant), "2024-03-10T07:00:00Z");
        assert_eq!(
            (spring.offset_before_minutes, spring.offset_after_minutes),
            (-300, -240)
        );

        let fall = &transitions[1];
        assert_eq!(fall.kind, TransitionKind::FallBack);
        assert_eq!(fall.instant.month(), 11);
        assert_eq!(format_rfc3339_utc(&fall.instant), "2024-11-03T06:00:00Z");
        assert_eq!(
            (fall.offset_before_minutes, fall.offset_after_minutes),
            (-240, -300)
        );
    }

    #[test]
    fn southern_hemisphere_order() {
        // Sydney falls back in April and springs forward in October
        let transitions = find_transitions(parse_tz("Australia/Sydney").unwrap(), 2024);
        let kinds: Vec<_> = transitions.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            [TransitionKind::FallBack, TransitionKind::SpringForward]
        );
        assert!(transitions.windows(2).all(|w| w[0].instant < w[1].instant));
    }

    #[test]
    fn zones_without_dst_are_empty() {
        assert!(find_transitions(parse_tz("Africa/Cairo").unwrap(), 2020).is_empty());
        assert!(find_transitions(parse_tz("Asia/Dubai").unwrap(), 2024).is_empty());
        assert!(find_transitions(parse_tz("UTC").unwrap(), 2024).is_empty());
    }

    #[test]
    fn next_transition_is_strictly_after_now() {
        let tz = parse_tz("America/New_York").unwrap();
        let at_spring = Utc.with_ymd_and_hms(2024, 3, 10, 7, 0, 0).single().unwrap();
        let next = next_transition(tz, at_spring).unwrap();
        assert_eq!(format_rfc3339_utc(&next.instant), "2024-11-03T06:00:00Z");
    }

    #[test]
    fn next_transition_rolls_into_next_year() {
        let tz = parse_tz("America/New_York").unwrap();
        let december = Utc.with_ymd_and_hms(2024, 12, 1, 0, 0, 0).single().unwrap();
        let next = next_transition(tz, december).unwrap();
        assert_eq!(next.instant.year(), 2025);
        assert_eq!(next.kind, TransitionKind::SpringForward);
    }

    #[test]
    fn summary_counts_days() {
        let clock = FixedClock(Utc.with_ymd_and_hms(2024, 3, 1, 7, 0, 0).single().unwrap());
        let summary = summarize(parse_tz("America/New_York").unwrap(), 2024, &clock);
        assert!(summary.has_dst);
        assert_eq!(summary.days_until_next, Some(9));

        let summary = summarize(parse_tz("Asia/Dubai").unwrap(), 2024, &clock);
        assert!(!summary.has_dst);
        assert_eq!(summary.next_transition, None);
        assert_eq!(summary.days_until_next, None);
    }

    #[test]
    fn drift_is_flagged_once_per_change() {
        let ny = parse_tz("America/New_York").unwrap();
        let dubai = parse_tz("Asia/Dubai").unwrap();
        let slot =
            RecurrenceSlot::new(DayOfWeek::MONDAY, parse_time("18:00").unwrap(), 60, ny).unwrap();

        // Mondays 18:00 New York: 2024-03-04 (EST) and 2024-03-11, 2024-03-18 (EDT)
        let occurrences: Vec<_> = [(3, 4, 23), (3, 11, 22), (3, 18, 22)]
            .into_iter()
            .map(|(m, d, h)| ClassOccurrence {
                start_instant: Utc.with_ymd_and_hms(2024, m, d, h, 0, 0).single().unwrap(),
                duration_minutes: 60,
                source_slot: Some(slot.clone()),
            })
            .collect();

        let warnings = drift_warnings(&occurrences, dubai);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].previous_local_time, "03:00");
        assert_eq!(warnings[0].new_local_time, "02:00");
        assert_eq!(warnings[0].start_instant, occurrences[1].start_instant);

        // The class's own zone never drifts
        assert!(drift_warnings(&occurrences, ny).is_empty());
    }
}
