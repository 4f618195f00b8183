//! Boundary shapes exchanged with the scheduling form and the persistence
//! layer, and their conversion into validated model types.
//!
//! Field names are camelCase to match the payloads the rest of the
//! application already produces.

use std::collections::BTreeMap;

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Result, ScheduleError};
use crate::models::{
    AvailabilityProfile, DayOfWeek, GenerationPeriod, RecurrencePattern, RecurrenceSlot,
    WeeklyAvailability, validate_class_duration,
};
use crate::parse::parse_time;
use crate::tz::parse_tz;

/// A day of week as sent by a form: a number or a numeric string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DayValue {
    Number(i64),
    Text(String),
}

impl DayValue {
    pub fn to_day(&self) -> Result<DayOfWeek> {
        match self {
            DayValue::Number(n) => DayOfWeek::new(*n),
            DayValue::Text(s) => s
                .trim()
                .parse::<i64>()
                .map_err(|_| ScheduleError::InvalidDayOfWeek(format!("'{}' is not numeric", s)))
                .and_then(DayOfWeek::new),
        }
    }
}

/// One entry of `recurrenceDetails`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurrenceDetailInput {
    pub day_of_week: DayValue,
    pub time: String,
    pub duration: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
}

/// Recurrence pattern as submitted by the class form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurrencePatternInput {
    pub recurrence_details: Vec<RecurrenceDetailInput>,
    pub generation_period_months: u32,
}

fn zone_or_default(name: Option<&str>, default_timezone: Tz) -> Result<Tz> {
    match name {
        Some(name) if !name.trim().is_empty() => parse_tz(name),
        _ => Ok(default_timezone),
    }
}

impl RecurrencePatternInput {
    /// Validate into a [`RecurrencePattern`].
    ///
    /// A pattern in which no entry has a usable day of week is
    /// [`ScheduleError::EmptyRecurrence`]; a single bad day among good ones
    /// is [`ScheduleError::InvalidDayOfWeek`]. Slots without a timezone use
    /// `default_timezone`.
    pub fn validate(&self, default_timezone: Tz) -> Result<RecurrencePattern> {
        let days: Vec<Result<DayOfWeek>> = self
            .recurrence_details
            .iter()
            .map(|d| d.day_of_week.to_day())
            .collect();
        if days.iter().all(|d| d.is_err()) {
            return Err(ScheduleError::EmptyRecurrence);
        }

        let period = GenerationPeriod::try_from(self.generation_period_months)?;

        let slots = self
            .recurrence_details
            .iter()
            .zip(days)
            .map(|(detail, day)| {
                let timezone = zone_or_default(detail.timezone.as_deref(), default_timezone)?;
                RecurrenceSlot::new(
                    day?,
                    parse_time(&detail.time)?,
                    validate_class_duration(detail.duration)?,
                    timezone,
                )
            })
            .collect::<Result<Vec<_>>>()?;

        RecurrencePattern::new(slots, period)
    }
}

/// One `{startTime, endTime}` entry of `slotsByDay`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowInput {
    pub start_time: String,
    pub end_time: String,
}

/// Availability profile as stored by the persistence layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityProfileInput {
    #[serde(default)]
    pub is_default_availability: bool,
    /// Keyed by `"0"` (Sunday) to `"6"` (Saturday).
    #[serde(default)]
    pub slots_by_day: BTreeMap<String, Vec<WindowInput>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
}

impl AvailabilityProfileInput {
    /// Convert into an [`AvailabilityProfile`].
    ///
    /// Day keys and the timezone are validated here. Window times are kept
    /// verbatim and judged when a slot is checked against them; windows an
    /// editor would have refused are logged.
    pub fn to_profile(&self, default_timezone: Tz) -> Result<AvailabilityProfile> {
        if self.is_default_availability {
            return Ok(AvailabilityProfile::Default);
        }

        let timezone = zone_or_default(self.timezone.as_deref(), default_timezone)?;
        let mut weekly = WeeklyAvailability::new(timezone);

        for (key, windows) in &self.slots_by_day {
            let day = DayValue::Text(key.clone()).to_day()?;
            for window in windows {
                weekly.add_window(day, &window.start_time, &window.end_time);
            }
        }

        for window in weekly.all_windows() {
            if let Err(err) = window.validate() {
                warn!(%err, day = %window.day_of_week, "Stored availability window is invalid");
            }
        }

        Ok(AvailabilityProfile::Weekly(weekly))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern_json(details: &str, months: u32) -> RecurrencePatternInput {
        serde_json::from_str(&format!(
            r#"{{"recurrenceDetails": {details}, "generationPeriodMonths": {months}}}"#
        ))
        .unwrap()
    }

    #[test]
    fn parses_form_payload() {
        let input = pattern_json(
            r#"[{"dayOfWeek": 1, "time": "18:00", "duration": 60, "timezone": "America/New_York"},
                {"dayOfWeek": "3", "time": "09:30", "duration": 45}]"#,
            3,
        );
        let pattern = input.validate("Europe/Berlin".parse().unwrap()).unwrap();
        assert_eq!(pattern.slots().len(), 2);
        assert_eq!(pattern.generation_period(), GenerationPeriod::ThreeMonths);
        assert_eq!(pattern.slots()[0].timezone.name(), "America/New_York");
        assert_eq!(pattern.slots()[1].day_of_week, DayOfWeek::WEDNESDAY);
        assert_eq!(pattern.slots()[1].timezone.name(), "Europe/Berlin");
    }

    #[test]
    fn no_valid_days_is_empty_recurrence() {
        let input = pattern_json(
            r#"[{"dayOfWeek": 9, "time": "18:00", "duration": 60},
                {"dayOfWeek": "mon", "time": "18:00", "duration": 60}]"#,
            1,
        );
        assert_eq!(
            input.validate(chrono_tz::UTC),
            Err(ScheduleError::EmptyRecurrence)
        );
        assert_eq!(
            pattern_json("[]", 1).validate(chrono_tz::UTC),
            Err(ScheduleError::EmptyRecurrence)
        );
    }

    #[test]
    fn one_bad_day_is_rejected() {
        let input = pattern_json(
            r#"[{"dayOfWeek": 1, "time": "18:00", "duration": 60},
                {"dayOfWeek": 7, "time": "18:00", "duration": 60}]"#,
            1,
        );
        assert!(matches!(
            input.validate(chrono_tz::UTC),
            Err(ScheduleError::InvalidDayOfWeek(_))
        ));
    }

    #[test]
    fn field_validation_errors() {
        let bad_time = pattern_json(r#"[{"dayOfWeek": 1, "time": "7pm", "duration": 60}]"#, 1);
        assert!(matches!(
            bad_time.validate(chrono_tz::UTC),
            Err(ScheduleError::InvalidTime(_))
        ));

        let negative = pattern_json(r#"[{"dayOfWeek": 1, "time": "18:00", "duration": -5}]"#, 1);
        assert!(matches!(
            negative.validate(chrono_tz::UTC),
            Err(ScheduleError::InvalidDuration(_))
        ));

        let too_long = pattern_json(r#"[{"dayOfWeek": 1, "time": "18:00", "duration": 240}]"#, 1);
        assert!(matches!(
            too_long.validate(chrono_tz::UTC),
            Err(ScheduleError::InvalidDuration(_))
        ));

        let period = pattern_json(r#"[{"dayOfWeek": 1, "time": "18:00", "duration": 60}]"#, 4);
        assert_eq!(
            period.validate(chrono_tz::UTC),
            Err(ScheduleError::InvalidGenerationPeriod(4))
        );

        let zone = pattern_json(
            r#"[{"dayOfWeek": 1, "time": "18:00", "duration": 60, "timezone": "Mars/Base"}]"#,
            1,
        );
        assert!(matches!(
            zone.validate(chrono_tz::UTC),
            Err(ScheduleError::InvalidTimezone(_))
        ));
    }

    #[test]
    fn profile_from_persistence_shape() {
        let input: AvailabilityProfileInput = serde_json::from_str(
            r#"{
                "isDefaultAvailability": false,
                "slotsByDay": {
                    "1": [{"startTime": "14:00", "endTime": "16:00"}, {"startTime": "08:00", "endTime": "12:00"}],
                    "5": [{"startTime": "10:00", "endTime": "24:00"}]
                },
                "timezone": "Asia/Dubai"
            }"#,
        )
        .unwrap();

        let AvailabilityProfile::Weekly(weekly) = input.to_profile(chrono_tz::UTC).unwrap() else {
            panic!("expected weekly profile");
        };
        assert_eq!(weekly.timezone().name(), "Asia/Dubai");
        let monday = weekly.windows_for(DayOfWeek::MONDAY);
        assert_eq!(monday.len(), 2);
        assert_eq!(monday[0].start_time, "08:00");
        assert_eq!(weekly.windows_for(DayOfWeek::FRIDAY)[0].end_minutes().unwrap(), 1440);
        assert!(weekly.windows_for(DayOfWeek::SUNDAY).is_empty());
    }

    #[test]
    fn default_flag_wins() {
        let input: AvailabilityProfileInput =
            serde_json::from_str(r#"{"isDefaultAvailability": true, "timezone": "Nowhere/X"}"#)
                .unwrap();
        assert!(input.to_profile(chrono_tz::UTC).unwrap().is_default());
    }

    #[test]
    fn bad_day_key_is_rejected() {
        let input: AvailabilityProfileInput = serde_json::from_str(
            r#"{"slotsByDay": {"monday": [{"startTime": "08:00", "endTime": "12:00"}]}}"#,
        )
        .unwrap();
        assert!(matches!(
            input.to_profile(chrono_tz::UTC),
            Err(ScheduleError::InvalidDayOfWeek(_))
        ));
    }
}
