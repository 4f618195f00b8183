//! One scheduling attempt, end to end.
//!
//! ```text
//! Requested --validate--> Validated | RejectedInvalid (Err)
//! Validated --check-----> Matched | ConflictDetected
//! ConflictDetected -----> AlternativesOffered (possibly empty)
//! ```
//!
//! `Matched` is advisory: the snapshot of availability and bookings may be
//! stale, and the backend makes the final decision at submission time. This
//! engine never commits a class.

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::availability::{
    BookingConflict, check, check_occurrence, find_booking_conflicts, first_uncovered,
};
use crate::clock::Clock;
use crate::config::EngineConfig;
use crate::convert::{CivilInput, Converter, PartyTimezones, PartyView};
use crate::dst::{DriftWarning, drift_warnings};
use crate::error::{Result, ScheduleError};
use crate::models::{
    AlternativeSlotSuggestion, AvailabilityProfile, Booking, ClassOccurrence, ConflictReport,
    RecurrenceSlot, validate_class_duration,
};
use crate::recurrence::{expand_by_slot, first_occurrence};
use crate::suggest::suggest;
use crate::wire::{AvailabilityProfileInput, RecurrencePatternInput};

/// A single class outside any recurrence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OneOffInput {
    /// RFC3339, or a civil time read in `timezone`.
    pub start: String,
    pub duration: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
}

/// Timezone names of the three parties; missing ones are inferred.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartyTimezonesInput {
    #[serde(default)]
    pub teacher: Option<String>,
    #[serde(default)]
    pub guardian: Option<String>,
    #[serde(default)]
    pub admin: Option<String>,
}

/// Everything a class form submits for pre-validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<RecurrencePatternInput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub one_off: Option<OneOffInput>,
    pub availability: AvailabilityProfileInput,
    #[serde(default)]
    pub existing_bookings: Vec<Booking>,
    #[serde(default)]
    pub parties: PartyTimezonesInput,
}

/// Why a conflict was raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictType {
    ExistingClass,
    NoAvailability,
}

/// Conflict specifics, by cause.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ConflictDetails {
    #[serde(rename_all = "camelCase")]
    Availability {
        slot: Option<RecurrenceSlot>,
        requested: ClassOccurrence,
        report: ConflictReport,
    },
    #[serde(rename_all = "camelCase")]
    Booking { collisions: Vec<BookingConflict> },
}

/// The conflict shape the display code consumes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictPayload {
    pub reason: String,
    pub conflict_type: ConflictType,
    pub conflict_details: ConflictDetails,
    pub alternatives: Vec<AlternativeSlotSuggestion>,
}

/// An accepted occurrence with its three wall-clock renderings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledOccurrence {
    #[serde(flatten)]
    pub occurrence: ClassOccurrence,
    pub views: PartyView,
}

/// Terminal state of an attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum SchedulingOutcome {
    #[serde(rename_all = "camelCase")]
    Matched {
        parties: PartyTimezones,
        occurrences: Vec<ScheduledOccurrence>,
        drift_warnings: Vec<DriftWarning>,
        /// A timezone or time had to be guessed along the way.
        degraded: bool,
    },
    #[serde(rename_all = "camelCase")]
    AlternativesOffered {
        parties: PartyTimezones,
        conflicts: Vec<ConflictPayload>,
        degraded: bool,
    },
}

impl SchedulingOutcome {
    pub fn is_matched(&self) -> bool {
        matches!(self, SchedulingOutcome::Matched { .. })
    }

    pub fn conflicts(&self) -> &[ConflictPayload] {
        match self {
            SchedulingOutcome::Matched { .. } => &[],
            SchedulingOutcome::AlternativesOffered { conflicts, .. } => conflicts,
        }
    }
}

/// The validated request, before any checking.
struct Validated {
    streams: Vec<(Option<RecurrenceSlot>, Vec<ClassOccurrence>)>,
    profile: AvailabilityProfile,
    parties: PartyTimezones,
    degraded: bool,
}

/// Run one scheduling attempt.
///
/// Structurally invalid input is returned as `Err`; conflicts are part of
/// the `Ok` outcome.
pub fn evaluate(
    request: &ScheduleRequest,
    config: &EngineConfig,
    clock: &dyn Clock,
) -> Result<SchedulingOutcome> {
    let validated = validate(request, config, clock)?;
    let now = clock.now();
    let bookings = &request.existing_bookings;

    let mut conflicts = Vec::new();
    for (slot, occurrences) in &validated.streams {
        let Some(first) = occurrences.first() else {
            continue;
        };

        let (requested, report) = match slot {
            Some(slot) => match check(slot, &validated.profile, now) {
                ConflictReport::Ok => first_uncovered(occurrences, &validated.profile)
                    .unwrap_or((first, ConflictReport::Ok)),
                report => (first, report),
            },
            None => (first, check_occurrence(first, &validated.profile)),
        };
        if !report.is_ok() {
            conflicts.push(ConflictPayload {
                reason: report.reason(),
                conflict_type: ConflictType::NoAvailability,
                alternatives: suggest(requested, &validated.profile, bookings, config, clock),
                conflict_details: ConflictDetails::Availability {
                    slot: slot.clone(),
                    requested: requested.clone(),
                    report,
                },
            });
            continue;
        }

        let collisions = find_booking_conflicts(occurrences, bookings);
        if let Some(earliest) = collisions.first() {
            conflicts.push(ConflictPayload {
                reason: booking_reason(earliest, collisions.len(), &validated.parties),
                conflict_type: ConflictType::ExistingClass,
                alternatives: suggest(
                    &earliest.occurrence,
                    &validated.profile,
                    bookings,
                    config,
                    clock,
                ),
                conflict_details: ConflictDetails::Booking { collisions },
            });
        }
    }

    let Validated {
        streams,
        parties,
        degraded,
        ..
    } = validated;

    if !conflicts.is_empty() {
        info!(conflicts = conflicts.len(), "Scheduling attempt has conflicts");
        return Ok(SchedulingOutcome::AlternativesOffered {
            parties,
            conflicts,
            degraded,
        });
    }

    let mut occurrences: Vec<ClassOccurrence> =
        streams.into_iter().flat_map(|(_, occ)| occ).collect();
    occurrences.sort_by_key(|o| o.start_instant);

    let mut warnings = Vec::new();
    for viewer in distinct_zones(&parties) {
        warnings.extend(drift_warnings(&occurrences, viewer));
    }
    warnings.sort_by_key(|w| w.start_instant);

    debug!(
        occurrences = occurrences.len(),
        drift_warnings = warnings.len(),
        "Scheduling attempt matched"
    );

    Ok(SchedulingOutcome::Matched {
        parties,
        occurrences: occurrences
            .into_iter()
            .map(|occurrence| ScheduledOccurrence {
                views: parties.view(occurrence.start_instant),
                occurrence,
            })
            .collect(),
        drift_warnings: warnings,
        degraded,
    })
}

/// Requested -> Validated.
fn validate(
    request: &ScheduleRequest,
    config: &EngineConfig,
    clock: &dyn Clock,
) -> Result<Validated> {
    let converter = Converter::new(config.default_timezone);
    let now = clock.now();
    let mut degraded = false;

    let profile = request.availability.to_profile(config.default_timezone)?;

    let (streams, class_zone) = match (&request.pattern, &request.one_off) {
        (Some(pattern), None) => {
            let pattern = pattern.validate(config.default_timezone)?;
            let zone = pattern.slots()[0].timezone;
            let streams = pattern
                .slots()
                .iter()
                .cloned()
                .zip(expand_by_slot(&pattern, now)?)
                .map(|(slot, occurrences)| -> Result<_> {
                    // Slots whose horizon holds no occurrence still get checked
                    let occurrences = if occurrences.is_empty() {
                        vec![first_occurrence(&slot, now)?]
                    } else {
                        occurrences
                    };
                    Ok((Some(slot), occurrences))
                })
                .collect::<Result<Vec<_>>>()?;
            (streams, zone)
        }
        (None, Some(one_off)) => {
            let duration = validate_class_duration(one_off.duration)?;
            let zone_name = one_off
                .timezone
                .as_deref()
                .unwrap_or(config.default_timezone.name());
            let conversion =
                converter.convert(CivilInput::Civil(&one_off.start), zone_name, zone_name, clock);
            if !conversion.parsed {
                return Err(ScheduleError::ParseError(format!(
                    "Could not interpret one-off start '{}' as a time",
                    one_off.start
                )));
            }
            degraded |= conversion.degraded;
            let occurrence = ClassOccurrence::one_off(conversion.instant, duration);
            (vec![(None, vec![occurrence])], conversion.target.timezone)
        }
        _ => {
            return Err(ScheduleError::ParseError(
                "Request must contain exactly one of 'pattern' or 'oneOff'".to_string(),
            ));
        }
    };

    for booking in &request.existing_bookings {
        if booking.duration_minutes == 0 {
            return Err(ScheduleError::InvalidDuration(
                "existing booking with zero duration".to_string(),
            ));
        }
    }

    let teacher_default = match &profile {
        AvailabilityProfile::Weekly(weekly) => weekly.timezone(),
        AvailabilityProfile::Default => config.default_timezone,
    };
    let mut party = |name: &Option<String>, fallback: Tz| match name {
        Some(name) => {
            let (tz, fell_back) = converter.resolve_zone(name);
            degraded |= fell_back;
            tz
        }
        None => fallback,
    };
    let parties = PartyTimezones {
        teacher: party(&request.parties.teacher, teacher_default),
        guardian: party(&request.parties.guardian, class_zone),
        admin: party(&request.parties.admin, config.default_timezone),
    };

    Ok(Validated {
        streams,
        profile,
        parties,
        degraded,
    })
}

fn booking_reason(first: &BookingConflict, count: usize, parties: &PartyTimezones) -> String {
    let when = parties.view(first.occurrence.start_instant).teacher.wall_clock;
    let title = first
        .booking
        .title
        .as_deref()
        .map(|t| format!(" ({})", t))
        .unwrap_or_default();
    format!(
        "{} occurrence(s) overlap existing classes, first on {} teacher time{}",
        count,
        when,
        title
    )
}

/// Party zones without repeats, teacher first.
fn distinct_zones(parties: &PartyTimezones) -> Vec<Tz> {
    let mut zones = Vec::with_capacity(3);
    for tz in [parties.teacher, parties.guardian, parties.admin] {
        if !zones.contains(&tz) {
            zones.push(tz);
        }
    }
    zones
}
