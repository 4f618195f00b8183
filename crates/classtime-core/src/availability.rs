//! Availability matching.
//!
//! A requested class is placed on the teacher's week (weekday and minutes
//! since midnight in the teacher's timezone) and accepted only when a single
//! availability window contains it completely. Starting inside a window but
//! running past its end is a conflict, not a partial match.

use chrono::{DateTime, Datelike, Timelike, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use tracing::debug;

use crate::models::{
    AvailabilityProfile, Booking, ClassOccurrence, ConflictReport, DayOfWeek, RecurrenceSlot,
    WeeklyAvailability, WindowRange,
};
use crate::parse::MINUTES_PER_DAY;
use crate::recurrence::first_occurrence;

/// Where a class falls on one timezone's week.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekPlacement {
    pub day_of_week: DayOfWeek,
    pub start_minutes: u32,
    /// May exceed 1440 when the class runs past midnight.
    pub end_minutes: u32,
}

impl WeekPlacement {
    /// Place a class that starts at `start` on the wall clock of `tz`.
    pub fn of_instant(start: DateTime<Utc>, duration_minutes: u32, tz: Tz) -> Self {
        let local = start.with_timezone(&tz);
        let start_minutes = local.hour() * 60 + local.minute();
        Self {
            day_of_week: DayOfWeek::from_weekday(local.weekday()),
            start_minutes,
            end_minutes: start_minutes + duration_minutes,
        }
    }

    fn of_slot(slot: &RecurrenceSlot) -> Self {
        let start_minutes = slot.start_time.minutes();
        Self {
            day_of_week: slot.day_of_week,
            start_minutes,
            end_minutes: start_minutes + slot.duration_minutes,
        }
    }
}

/// Check a weekly slot against a teacher's availability.
///
/// When the slot and the profile share a timezone the slot's own weekday
/// and time are used. Otherwise the slot's first occurrence at or after
/// `reference` is converted into the profile's timezone, which may move it
/// to another weekday.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use classtime_core::availability::check;
/// use classtime_core::models::{AvailabilityProfile, DayOfWeek, RecurrenceSlot, WeeklyAvailability};
/// use classtime_core::parse::parse_time;
///
/// let tz = "Europe/Berlin".parse().unwrap();
/// let profile = AvailabilityProfile::Weekly(
///     WeeklyAvailability::new(tz).with_window(DayOfWeek::MONDAY, "09:00", "17:00"),
/// );
/// let slot = RecurrenceSlot::new(DayOfWeek::MONDAY, parse_time("16:30").unwrap(), 60, tz).unwrap();
/// let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).single().unwrap();
///
/// assert!(!check(&slot, &profile, now).is_ok());
/// ```
pub fn check(
    slot: &RecurrenceSlot,
    profile: &AvailabilityProfile,
    reference: DateTime<Utc>,
) -> ConflictReport {
    let weekly = match profile {
        AvailabilityProfile::Default => return ConflictReport::Ok,
        AvailabilityProfile::Weekly(weekly) => weekly,
    };

    let placement = if slot.timezone == weekly.timezone() {
        WeekPlacement::of_slot(slot)
    } else {
        match first_occurrence(slot, reference) {
            Ok(occurrence) => WeekPlacement::of_instant(
                occurrence.start_instant,
                slot.duration_minutes,
                weekly.timezone(),
            ),
            Err(err) => {
                return ConflictReport::InvalidTime {
                    detail: err.to_string(),
                };
            }
        }
    };

    let report = check_placement(placement, weekly);
    debug!(
        day = %slot.day_of_week,
        start = %slot.start_time,
        teacher_day = %placement.day_of_week,
        teacher_start = placement.start_minutes,
        ok = report.is_ok(),
        "Checked slot against availability"
    );
    report
}

/// Check one concrete occurrence, e.g. a one-off class.
pub fn check_occurrence(
    occurrence: &ClassOccurrence,
    profile: &AvailabilityProfile,
) -> ConflictReport {
    match profile {
        AvailabilityProfile::Default => ConflictReport::Ok,
        AvailabilityProfile::Weekly(weekly) => check_placement(
            WeekPlacement::of_instant(
                occurrence.start_instant,
                occurrence.duration_minutes,
                weekly.timezone(),
            ),
            weekly,
        ),
    }
}

/// Check every occurrence of a stream and return the first one that does
/// not fit, with its report.
///
/// A slot's occurrences keep their wall-clock time in the slot's zone, so
/// when the teacher's zone shifts its offset on a different date the same
/// slot can land on another time of the teacher's week. Placements already
/// seen are not checked again.
pub fn first_uncovered<'a>(
    occurrences: &'a [ClassOccurrence],
    profile: &AvailabilityProfile,
) -> Option<(&'a ClassOccurrence, ConflictReport)> {
    let AvailabilityProfile::Weekly(weekly) = profile else {
        return None;
    };

    let mut seen: Vec<WeekPlacement> = Vec::new();
    for occurrence in occurrences {
        let placement = WeekPlacement::of_instant(
            occurrence.start_instant,
            occurrence.duration_minutes,
            weekly.timezone(),
        );
        if seen.contains(&placement) {
            continue;
        }
        seen.push(placement);

        let report = check_placement(placement, weekly);
        if !report.is_ok() {
            debug!(
                start = %occurrence.start_instant,
                teacher_day = %placement.day_of_week,
                teacher_start = placement.start_minutes,
                "Occurrence falls outside availability"
            );
            return Some((occurrence, report));
        }
    }
    None
}

/// Containment test against the windows of one weekday.
pub fn check_placement(placement: WeekPlacement, weekly: &WeeklyAvailability) -> ConflictReport {
    let windows = weekly.windows_for(placement.day_of_week);
    if windows.is_empty() {
        return ConflictReport::NoWindowsForDay {
            day_of_week: placement.day_of_week,
        };
    }

    let mut bounds = Vec::with_capacity(windows.len());
    for window in windows {
        match window.bounds() {
            Ok(b) => bounds.push(b),
            Err(err) => {
                return ConflictReport::InvalidTime {
                    detail: err.to_string(),
                };
            }
        }
    }

    let contained = bounds
        .iter()
        .any(|&(start, end)| start <= placement.start_minutes && end >= placement.end_minutes);

    if contained {
        ConflictReport::Ok
    } else {
        ConflictReport::NotFullyCovered {
            day_of_week: placement.day_of_week,
            requested_start: minutes_label(placement.start_minutes),
            requested_end: minutes_label(placement.end_minutes),
            covering_windows: windows.iter().map(WindowRange::from).collect(),
        }
    }
}

/// `HH:MM`, with `24:00` for midnight at the end of the day and a `+1d`
/// marker past it.
fn minutes_label(minutes: u32) -> String {
    if minutes > MINUTES_PER_DAY {
        let rest = minutes - MINUTES_PER_DAY;
        format!("{:02}:{:02} (+1d)", rest / 60, rest % 60)
    } else {
        format!("{:02}:{:02}", minutes / 60, minutes % 60)
    }
}

/// A requested occurrence that collides with an existing booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingConflict {
    pub occurrence: ClassOccurrence,
    pub booking: Booking,
    pub overlap_minutes: i64,
}

/// Find every occurrence/booking pair whose intervals overlap.
///
/// Back-to-back classes (one ends as the other starts) do not collide.
pub fn find_booking_conflicts(
    occurrences: &[ClassOccurrence],
    bookings: &[Booking],
) -> Vec<BookingConflict> {
    let mut conflicts = Vec::new();

    for occurrence in occurrences {
        let (start, end) = (occurrence.start_instant, occurrence.end_instant());
        for booking in bookings.iter().filter(|b| b.overlaps(start, end)) {
            let overlap = end.min(booking.end_instant()) - start.max(booking.start_instant);
            conflicts.push(BookingConflict {
                occurrence: occurrence.clone(),
                booking: booking.clone(),
                overlap_minutes: overlap.num_minutes(),
            });
        }
    }

    conflicts
}
