//! Alternative slot ranking.
//!
//! For a rejected occurrence, candidates are generated weekly at the start
//! of each availability window, for a bounded number of weeks, never before
//! `now + guard period`. Candidates that collide with existing bookings are
//! dropped and the rest are ranked by distance from the original request.

use chrono::{DateTime, Datelike, Days, Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use tracing::{debug, warn};

use crate::availability::check_occurrence;
use crate::clock::Clock;
use crate::config::EngineConfig;
use crate::models::{
    AlternativeSlotSuggestion, AvailabilityProfile, AvailabilityWindow, Booking, ClassOccurrence,
    TimeOfDay, WeeklyAvailability,
};
use crate::tz::{at_local_time, resolve_local};

/// Propose up to `config.suggestion_limit` replacements for `rejected`.
///
/// Every suggestion starts at or after `now + config.guard_period` and
/// overlaps none of `bookings`. Suggestions are `verified` when they were
/// checked against availability; a profile without usable windows yields
/// unverified same-time-next-days fallbacks instead.
pub fn suggest(
    rejected: &ClassOccurrence,
    profile: &AvailabilityProfile,
    bookings: &[Booking],
    config: &EngineConfig,
    clock: &dyn Clock,
) -> Vec<AlternativeSlotSuggestion> {
    let Some(earliest) = clock.now().checked_add_signed(config.guard_period) else {
        warn!(guard = %config.guard_period, "Guard period is out of range, no alternatives");
        return Vec::new();
    };
    let horizon_days = config.weeks_per_window.saturating_mul(7);

    let candidates = match profile {
        AvailabilityProfile::Default => {
            let days = horizon_days;
            daily_candidates(rejected, earliest, days, home_zone(rejected, config), true)
        }
        AvailabilityProfile::Weekly(weekly) => {
            let windows = usable_windows(weekly, rejected.duration_minutes);
            if windows.is_empty() {
                warn!(
                    timezone = %weekly.timezone(),
                    "No usable availability windows, offering unverified fallback slots"
                );
                let days = u32::try_from(config.suggestion_limit)
                    .unwrap_or(u32::MAX)
                    .saturating_add(horizon_days);
                daily_candidates(rejected, earliest, days, home_zone(rejected, config), false)
            } else {
                window_candidates(rejected, profile, weekly, &windows, earliest, config)
            }
        }
    };

    let suggestions = rank(rejected, candidates, bookings, config.suggestion_limit);
    debug!(
        requested = %rejected.start_instant,
        suggestions = suggestions.len(),
        "Ranked alternative slots"
    );
    suggestions
}

/// Timezone whose civil days the fallback steps through.
fn home_zone(rejected: &ClassOccurrence, config: &EngineConfig) -> Tz {
    rejected
        .source_slot
        .as_ref()
        .map(|slot| slot.timezone)
        .unwrap_or(config.default_timezone)
}

/// Windows that parse and are long enough for the class, with their
/// start time.
fn usable_windows(
    weekly: &WeeklyAvailability,
    duration_minutes: u32,
) -> Vec<(&AvailabilityWindow, TimeOfDay)> {
    weekly
        .all_windows()
        .filter_map(|window| match window.bounds() {
            Ok((start, end)) if end - start >= duration_minutes => {
                TimeOfDay::from_minutes(start).map(|t| (window, t))
            }
            Ok(_) => None,
            Err(err) => {
                warn!(%err, day = %window.day_of_week, "Skipping malformed availability window");
                None
            }
        })
        .collect()
}

/// First date on or after `from` falling on `weekday` (0 = Sunday).
fn next_weekday(from: NaiveDate, weekday: usize) -> NaiveDate {
    let today = from.weekday().num_days_from_sunday() as i64;
    from + Duration::days((weekday as i64 - today).rem_euclid(7))
}

fn window_candidates(
    rejected: &ClassOccurrence,
    profile: &AvailabilityProfile,
    weekly: &WeeklyAvailability,
    windows: &[(&AvailabilityWindow, TimeOfDay)],
    earliest: DateTime<Utc>,
    config: &EngineConfig,
) -> Vec<AlternativeSlotSuggestion> {
    let tz = weekly.timezone();
    let from = earliest.with_timezone(&tz).date_naive();
    let mut candidates = Vec::new();

    for &(window, start_time) in windows {
        let mut date = next_weekday(from, window.day_of_week.index());
        let mut produced = 0;

        while produced < config.weeks_per_window {
            let Ok(start) = at_local_time(date, start_time, tz) else {
                break;
            };
            let Some(next) = date.checked_add_days(Days::new(7)) else {
                break;
            };
            date = next;
            if start < earliest {
                continue;
            }
            produced += 1;

            let candidate = ClassOccurrence::one_off(start, rejected.duration_minutes);
            // A start shifted by a DST gap can fall out of its window.
            if check_occurrence(&candidate, profile).is_ok() {
                candidates.push(suggestion(rejected, start, true));
            }
        }
    }

    candidates
}

/// Same wall-clock time as `rejected` on each following civil day.
fn daily_candidates(
    rejected: &ClassOccurrence,
    earliest: DateTime<Utc>,
    days: u32,
    tz: Tz,
    verified: bool,
) -> Vec<AlternativeSlotSuggestion> {
    let local = rejected.start_instant.with_timezone(&tz);
    let time = local.time();

    (1..=u64::from(days))
        .map_while(|offset| local.date_naive().checked_add_days(Days::new(offset)))
        .filter_map(|date| resolve_local(date.and_time(time), tz))
        .filter(|start| *start >= earliest)
        .map(|start| suggestion(rejected, start, verified))
        .collect()
}

fn suggestion(
    rejected: &ClassOccurrence,
    start: DateTime<Utc>,
    verified: bool,
) -> AlternativeSlotSuggestion {
    AlternativeSlotSuggestion {
        start_instant: start,
        duration_minutes: rejected.duration_minutes,
        distance_from_request_minutes: (start - rejected.start_instant).num_minutes().abs(),
        verified,
    }
}

/// Drop booked candidates, order by distance then start, deduplicate and
/// truncate.
fn rank(
    rejected: &ClassOccurrence,
    mut candidates: Vec<AlternativeSlotSuggestion>,
    bookings: &[Booking],
    limit: usize,
) -> Vec<AlternativeSlotSuggestion> {
    let duration = Duration::minutes(i64::from(rejected.duration_minutes));
    candidates.retain(|c| {
        let end = c.start_instant + duration;
        !bookings.iter().any(|b| b.overlaps(c.start_instant, end))
    });
    candidates.sort_by_key(|c| (c.distance_from_request_minutes, c.start_instant));
    candidates.dedup_by_key(|c| c.start_instant);
    candidates.truncate(limit);
    candidates
}
