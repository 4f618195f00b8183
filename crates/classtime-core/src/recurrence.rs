//! Weekly recurrence expansion.
//!
//! Each [`RecurrenceSlot`] produces its own stream: the first matching
//! weekday on or after the anchor, then every 7 calendar days in the slot's
//! timezone. Stepping by calendar days keeps the wall-clock time fixed in
//! that zone across DST changes, so the absolute gap between two
//! occurrences is 7 days plus or minus the offset change.

use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, Utc};
use tracing::debug;

use crate::error::Result;
use crate::models::{ClassOccurrence, GenerationPeriod, RecurrencePattern, RecurrenceSlot};
use crate::tz::at_local_time;

/// Last instant at which an occurrence may start.
pub fn horizon(anchor_now: DateTime<Utc>, period: GenerationPeriod) -> DateTime<Utc> {
    anchor_now
        .checked_add_months(Months::new(period.months()))
        .unwrap_or_else(|| anchor_now + Duration::days(31 * i64::from(period.months())))
}

/// The slot's weekday, on or after `anchor`, in the slot's timezone.
fn first_date(slot: &RecurrenceSlot, anchor: DateTime<Utc>) -> NaiveDate {
    let anchor_date = anchor.with_timezone(&slot.timezone).date_naive();
    let today = anchor_date.weekday().num_days_from_sunday() as i64;
    let target = slot.day_of_week.index() as i64;
    anchor_date + Duration::days((target - today).rem_euclid(7))
}

/// First occurrence of `slot` starting at or after `anchor`.
pub fn first_occurrence(slot: &RecurrenceSlot, anchor: DateTime<Utc>) -> Result<ClassOccurrence> {
    let mut date = first_date(slot, anchor);
    let mut start = at_local_time(date, slot.start_time, slot.timezone)?;
    if start < anchor {
        date += Duration::weeks(1);
        start = at_local_time(date, slot.start_time, slot.timezone)?;
    }

    Ok(ClassOccurrence {
        start_instant: start,
        duration_minutes: slot.duration_minutes,
        source_slot: Some(slot.clone()),
    })
}

/// Expand one slot from `anchor` up to and including `until`.
pub fn expand_slot(
    slot: &RecurrenceSlot,
    anchor: DateTime<Utc>,
    until: DateTime<Utc>,
) -> Result<Vec<ClassOccurrence>> {
    let first = first_occurrence(slot, anchor)?;
    let mut date = first.start_instant.with_timezone(&slot.timezone).date_naive();
    let mut occurrences = Vec::new();
    let mut start = first.start_instant;

    while start <= until {
        occurrences.push(ClassOccurrence {
            start_instant: start,
            duration_minutes: slot.duration_minutes,
            source_slot: Some(slot.clone()),
        });
        date += Duration::weeks(1);
        start = at_local_time(date, slot.start_time, slot.timezone)?;
    }

    Ok(occurrences)
}

/// One occurrence stream per slot, in pattern order.
pub fn expand_by_slot(
    pattern: &RecurrencePattern,
    anchor_now: DateTime<Utc>,
) -> Result<Vec<Vec<ClassOccurrence>>> {
    let until = horizon(anchor_now, pattern.generation_period());
    pattern
        .slots()
        .iter()
        .map(|slot| expand_slot(slot, anchor_now, until))
        .collect()
}

/// Expand a pattern into all occurrences, merged and sorted by start.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use classtime_core::models::{DayOfWeek, GenerationPeriod, RecurrencePattern, RecurrenceSlot};
/// use classtime_core::parse::parse_time;
/// use classtime_core::recurrence::expand;
///
/// let slot = RecurrenceSlot::new(
///     DayOfWeek::MONDAY,
///     parse_time("18:00").unwrap(),
///     60,
///     "America/New_York".parse().unwrap(),
/// )
/// .unwrap();
/// let pattern = RecurrencePattern::new(vec![slot], GenerationPeriod::OneMonth).unwrap();
/// let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).single().unwrap();
///
/// let occurrences = expand(&pattern, now).unwrap();
/// assert_eq!(occurrences.len(), 5);
/// ```
pub fn expand(pattern: &RecurrencePattern, anchor_now: DateTime<Utc>) -> Result<Vec<ClassOccurrence>> {
    let mut occurrences: Vec<ClassOccurrence> = expand_by_slot(pattern, anchor_now)?
        .into_iter()
        .flatten()
        .collect();
    occurrences.sort_by_key(|o| o.start_instant);

    debug!(
        slots = pattern.slots().len(),
        occurrences = occurrences.len(),
        months = pattern.generation_period().months(),
        "Expanded recurrence pattern"
    );

    Ok(occurrences)
}
