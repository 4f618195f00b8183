//! Core data types for classtime.
//!
//! This module defines the primary types used throughout the library:
//! - [`TimeOfDay`] and [`DayOfWeek`] - wall-clock building blocks
//! - [`RecurrenceSlot`] and [`RecurrencePattern`] - a weekly class commitment
//! - [`ClassOccurrence`] and [`Booking`] - concrete intervals on the timeline
//! - [`AvailabilityWindow`] and [`AvailabilityProfile`] - when a teacher can teach
//! - [`ConflictReport`] and [`AlternativeSlotSuggestion`] - matcher and ranker output
//! - [`DstTransition`] - one UTC offset change in a timezone

use chrono::{DateTime, Duration, NaiveTime, Utc, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize, Serializer};

use crate::error::{Result, ScheduleError};
use crate::parse::{format_time, parse_end_minutes, parse_time};

/// Allowed class length in minutes.
pub const CLASS_DURATION_RANGE: std::ops::RangeInclusive<u32> = 15..=180;

/// Allowed availability window length in minutes.
pub const WINDOW_DURATION_RANGE: std::ops::RangeInclusive<u32> = 15..=720;

pub(crate) fn serialize_tz<S: Serializer>(
    tz: &Tz,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(tz.name())
}

/// A wall-clock time of day with minute precision.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct TimeOfDay {
    pub hour: u8,
    pub minute: u8,
}

impl TimeOfDay {
    /// Build a time of day. Callers outside this crate should go through
    /// [`parse_time`] or [`TimeOfDay::from_minutes`], which validate.
    pub(crate) const fn new(hour: u8, minute: u8) -> Self {
        Self { hour, minute }
    }

    /// Build from minutes since midnight; `None` past 23:59.
    pub fn from_minutes(minutes: u32) -> Option<Self> {
        (minutes < crate::parse::MINUTES_PER_DAY)
            .then(|| Self::new((minutes / 60) as u8, (minutes % 60) as u8))
    }

    /// Minutes since midnight.
    pub fn minutes(self) -> u32 {
        u32::from(self.hour) * 60 + u32::from(self.minute)
    }

    pub fn to_naive(self) -> NaiveTime {
        NaiveTime::from_hms_opt(u32::from(self.hour), u32::from(self.minute), 0)
            .unwrap_or(NaiveTime::MIN)
    }
}

impl std::fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", format_time(*self))
    }
}

impl std::str::FromStr for TimeOfDay {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self> {
        parse_time(s)
    }
}

/// Day of week, `0` = Sunday through `6` = Saturday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct DayOfWeek(u8);

impl DayOfWeek {
    pub const SUNDAY: Self = Self(0);
    pub const MONDAY: Self = Self(1);
    pub const TUESDAY: Self = Self(2);
    pub const WEDNESDAY: Self = Self(3);
    pub const THURSDAY: Self = Self(4);
    pub const FRIDAY: Self = Self(5);
    pub const SATURDAY: Self = Self(6);

    /// Validate a numeric day of week.
    pub fn new(day: i64) -> Result<Self> {
        if (0..=6).contains(&day) {
            Ok(Self(day as u8))
        } else {
            Err(ScheduleError::InvalidDayOfWeek(format!(
                "{}. Expected 0 (Sunday) to 6 (Saturday)",
                day
            )))
        }
    }

    pub fn from_weekday(weekday: Weekday) -> Self {
        Self(weekday.num_days_from_sunday() as u8)
    }

    pub fn to_weekday(self) -> Weekday {
        match self.0 {
            0 => Weekday::Sun,
            1 => Weekday::Mon,
            2 => Weekday::Tue,
            3 => Weekday::Wed,
            4 => Weekday::Thu,
            5 => Weekday::Fri,
            _ => Weekday::Sat,
        }
    }

    /// Index into a seven-element, Sunday-first array.
    pub fn index(self) -> usize {
        usize::from(self.0)
    }

    /// All days, Sunday first.
    pub fn all() -> impl Iterator<Item = DayOfWeek> {
        (0..7u8).map(DayOfWeek)
    }
}

impl std::fmt::Display for DayOfWeek {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self.0 {
            0 => "Sunday",
            1 => "Monday",
            2 => "Tuesday",
            3 => "Wednesday",
            4 => "Thursday",
            5 => "Friday",
            _ => "Saturday",
        };
        write!(f, "{}", name)
    }
}

/// One weekly class commitment at a fixed wall-clock time in its timezone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurrenceSlot {
    pub day_of_week: DayOfWeek,
    pub start_time: TimeOfDay,
    pub duration_minutes: u32,
    #[serde(serialize_with = "serialize_tz")]
    pub timezone: Tz,
}

impl RecurrenceSlot {
    /// Build a slot, rejecting durations outside [`CLASS_DURATION_RANGE`].
    pub fn new(
        day_of_week: DayOfWeek,
        start_time: TimeOfDay,
        duration_minutes: u32,
        timezone: Tz,
    ) -> Result<Self> {
        validate_class_duration(i64::from(duration_minutes))?;
        Ok(Self {
            day_of_week,
            start_time,
            duration_minutes,
            timezone,
        })
    }
}

pub(crate) fn validate_class_duration(minutes: i64) -> Result<u32> {
    if minutes <= 0 {
        return Err(ScheduleError::InvalidDuration(format!(
            "{} minutes. Duration must be positive",
            minutes
        )));
    }
    u32::try_from(minutes)
        .ok()
        .filter(|m| CLASS_DURATION_RANGE.contains(m))
        .ok_or_else(|| {
            ScheduleError::InvalidDuration(format!(
                "{} minutes. Classes must last {}-{} minutes",
                minutes,
                CLASS_DURATION_RANGE.start(),
                CLASS_DURATION_RANGE.end()
            ))
        })
}

/// How far ahead a recurrence pattern generates occurrences.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(into = "u32")]
pub enum GenerationPeriod {
    #[default]
    OneMonth,
    TwoMonths,
    ThreeMonths,
    SixMonths,
}

impl GenerationPeriod {
    pub fn months(self) -> u32 {
        match self {
            GenerationPeriod::OneMonth => 1,
            GenerationPeriod::TwoMonths => 2,
            GenerationPeriod::ThreeMonths => 3,
            GenerationPeriod::SixMonths => 6,
        }
    }
}

impl From<GenerationPeriod> for u32 {
    fn from(period: GenerationPeriod) -> Self {
        period.months()
    }
}

impl TryFrom<u32> for GenerationPeriod {
    type Error = ScheduleError;

    fn try_from(months: u32) -> Result<Self> {
        match months {
            1 => Ok(GenerationPeriod::OneMonth),
            2 => Ok(GenerationPeriod::TwoMonths),
            3 => Ok(GenerationPeriod::ThreeMonths),
            6 => Ok(GenerationPeriod::SixMonths),
            other => Err(ScheduleError::InvalidGenerationPeriod(other)),
        }
    }
}

/// A non-empty, ordered set of weekly slots sharing a generation horizon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurrencePattern {
    slots: Vec<RecurrenceSlot>,
    generation_period: GenerationPeriod,
}

impl RecurrencePattern {
    pub fn new(slots: Vec<RecurrenceSlot>, generation_period: GenerationPeriod) -> Result<Self> {
        if slots.is_empty() {
            return Err(ScheduleError::EmptyRecurrence);
        }
        Ok(Self {
            slots,
            generation_period,
        })
    }

    pub fn slots(&self) -> &[RecurrenceSlot] {
        &self.slots
    }

    pub fn generation_period(&self) -> GenerationPeriod {
        self.generation_period
    }
}

/// One concrete class instance.
///
/// Equality ignores `source_slot`: two occurrences are the same class time
/// when they start at the same instant and last as long.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassOccurrence {
    pub start_instant: DateTime<Utc>,
    pub duration_minutes: u32,
    pub source_slot: Option<RecurrenceSlot>,
}

impl ClassOccurrence {
    /// A class that does not come from a recurrence pattern.
    pub fn one_off(start_instant: DateTime<Utc>, duration_minutes: u32) -> Self {
        Self {
            start_instant,
            duration_minutes,
            source_slot: None,
        }
    }

    pub fn end_instant(&self) -> DateTime<Utc> {
        self.start_instant + Duration::minutes(i64::from(self.duration_minutes))
    }
}

impl PartialEq for ClassOccurrence {
    fn eq(&self, other: &Self) -> bool {
        self.start_instant == other.start_instant && self.duration_minutes == other.duration_minutes
    }
}

impl Eq for ClassOccurrence {}

/// A class already on the teacher's calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub start_instant: DateTime<Utc>,
    pub duration_minutes: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl Booking {
    pub fn end_instant(&self) -> DateTime<Utc> {
        self.start_instant + Duration::minutes(i64::from(self.duration_minutes))
    }

    /// Half-open overlap: touching intervals do not collide.
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.start_instant < end && start < self.end_instant()
    }
}

/// A declared interval on one weekday during which a teacher can be booked.
///
/// Times are kept as received from the persistence layer and parsed when
/// used, so one malformed window degrades one check instead of the profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityWindow {
    pub day_of_week: DayOfWeek,
    pub start_time: String,
    pub end_time: String,
    #[serde(serialize_with = "serialize_tz")]
    pub timezone: Tz,
}

impl AvailabilityWindow {
    pub fn new(
        day_of_week: DayOfWeek,
        start_time: impl Into<String>,
        end_time: impl Into<String>,
        timezone: Tz,
    ) -> Self {
        Self {
            day_of_week,
            start_time: start_time.into(),
            end_time: end_time.into(),
            timezone,
        }
    }

    pub fn start_minutes(&self) -> Result<u32> {
        parse_time(&self.start_time).map(TimeOfDay::minutes)
    }

    pub fn end_minutes(&self) -> Result<u32> {
        parse_end_minutes(&self.end_time)
    }

    /// Start and end in minutes since midnight, end after start.
    pub fn bounds(&self) -> Result<(u32, u32)> {
        let start = self.start_minutes()?;
        let end = self.end_minutes()?;
        if end <= start {
            return Err(ScheduleError::InvalidTime(format!(
                "window {}-{} ends before it starts",
                self.start_time, self.end_time
            )));
        }
        Ok((start, end))
    }

    /// Check a window as an availability editor would before saving it.
    pub fn validate(&self) -> Result<()> {
        let (start, end) = self.bounds()?;
        let length = end - start;
        if !WINDOW_DURATION_RANGE.contains(&length) {
            return Err(ScheduleError::InvalidDuration(format!(
                "{} minutes. Availability windows must last {}-{} minutes",
                length,
                WINDOW_DURATION_RANGE.start(),
                WINDOW_DURATION_RANGE.end()
            )));
        }
        Ok(())
    }
}

/// Availability windows for every weekday in one canonical timezone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeeklyAvailability {
    timezone: Tz,
    days: [Vec<AvailabilityWindow>; 7],
}

impl WeeklyAvailability {
    pub fn new(timezone: Tz) -> Self {
        Self {
            timezone,
            days: Default::default(),
        }
    }

    /// Add a window, keeping each day ordered by start time.
    pub fn add_window(&mut self, day: DayOfWeek, start_time: &str, end_time: &str) {
        let windows = &mut self.days[day.index()];
        windows.push(AvailabilityWindow::new(day, start_time, end_time, self.timezone));
        windows.sort_by_key(|w| w.start_minutes().unwrap_or(u32::MAX));
    }

    /// Builder-style [`WeeklyAvailability::add_window`].
    pub fn with_window(mut self, day: DayOfWeek, start_time: &str, end_time: &str) -> Self {
        self.add_window(day, start_time, end_time);
        self
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    pub fn windows_for(&self, day: DayOfWeek) -> &[AvailabilityWindow] {
        &self.days[day.index()]
    }

    /// Every window, Sunday first.
    pub fn all_windows(&self) -> impl Iterator<Item = &AvailabilityWindow> {
        self.days.iter().flatten()
    }
}

/// A teacher's availability: 24/7 or explicit weekly windows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AvailabilityProfile {
    /// Available every hour of every day.
    Default,
    Weekly(WeeklyAvailability),
}

impl AvailabilityProfile {
    pub fn is_default(&self) -> bool {
        matches!(self, AvailabilityProfile::Default)
    }
}

/// A window as shown back to the user, `HH:MM` strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowRange {
    pub start_time: String,
    pub end_time: String,
}

impl From<&AvailabilityWindow> for WindowRange {
    fn from(window: &AvailabilityWindow) -> Self {
        Self {
            start_time: window.start_time.clone(),
            end_time: window.end_time.clone(),
        }
    }
}

/// Outcome of checking one slot against an availability profile.
///
/// `Ok` iff some window on the weekday fully contains
/// `[start, start + duration)` in the teacher's timezone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum ConflictReport {
    Ok,
    #[serde(rename_all = "camelCase")]
    InvalidTime { detail: String },
    #[serde(rename_all = "camelCase")]
    NoWindowsForDay { day_of_week: DayOfWeek },
    #[serde(rename_all = "camelCase")]
    NotFullyCovered {
        day_of_week: DayOfWeek,
        requested_start: String,
        requested_end: String,
        covering_windows: Vec<WindowRange>,
    },
}

impl ConflictReport {
    pub fn is_ok(&self) -> bool {
        matches!(self, ConflictReport::Ok)
    }

    /// Human-readable explanation, shown alongside alternatives.
    pub fn reason(&self) -> String {
        match self {
            ConflictReport::Ok => "Teacher is available".to_string(),
            ConflictReport::InvalidTime { detail } => {
                format!("Availability could not be checked: {}", detail)
            }
            ConflictReport::NoWindowsForDay { day_of_week } => {
                format!("Teacher has no availability on {}", day_of_week)
            }
            ConflictReport::NotFullyCovered {
                day_of_week,
                requested_start,
                requested_end,
                covering_windows,
            } => {
                let windows = covering_windows
                    .iter()
                    .map(|w| format!("{}-{}", w.start_time, w.end_time))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!(
                    "Requested {} {}-{} is not fully inside the teacher's availability ({})",
                    day_of_week, requested_start, requested_end, windows
                )
            }
        }
    }
}

/// A proposed replacement for a rejected occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlternativeSlotSuggestion {
    pub start_instant: DateTime<Utc>,
    pub duration_minutes: u32,
    pub distance_from_request_minutes: i64,
    /// `false` for fallback suggestions not confirmed against availability.
    pub verified: bool,
}

/// Direction of a UTC offset change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TransitionKind {
    SpringForward,
    FallBack,
}

impl std::fmt::Display for TransitionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransitionKind::SpringForward => write!(f, "springForward"),
            TransitionKind::FallBack => write!(f, "fallBack"),
        }
    }
}

/// One UTC offset change, located to the hour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DstTransition {
    pub instant: DateTime<Utc>,
    pub kind: TransitionKind,
    pub offset_before_minutes: i32,
    pub offset_after_minutes: i32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn berlin() -> Tz {
        "Europe/Berlin".parse().unwrap()
    }

    #[test]
    fn day_of_week_bounds() {
        assert!(DayOfWeek::new(0).is_ok());
        assert!(DayOfWeek::new(6).is_ok());
        assert!(matches!(
            DayOfWeek::new(7),
            Err(ScheduleError::InvalidDayOfWeek(_))
        ));
        assert!(DayOfWeek::new(-1).is_err());
    }

    #[test]
    fn day_of_week_weekday_mapping() {
        for day in DayOfWeek::all() {
            assert_eq!(DayOfWeek::from_weekday(day.to_weekday()), day);
        }
        assert_eq!(DayOfWeek::SUNDAY.to_weekday(), Weekday::Sun);
        assert_eq!(format!("{}", DayOfWeek::MONDAY), "Monday");
    }

    #[test]
    fn slot_duration_limits() {
        let start = parse_time("10:00").unwrap();
        assert!(RecurrenceSlot::new(DayOfWeek::MONDAY, start, 15, berlin()).is_ok());
        assert!(RecurrenceSlot::new(DayOfWeek::MONDAY, start, 180, berlin()).is_ok());
        assert!(matches!(
            RecurrenceSlot::new(DayOfWeek::MONDAY, start, 181, berlin()),
            Err(ScheduleError::InvalidDuration(_))
        ));
        assert!(RecurrenceSlot::new(DayOfWeek::MONDAY, start, 0, berlin()).is_err());
    }

    #[test]
    fn generation_period_conversion() {
        assert_eq!(GenerationPeriod::try_from(6).unwrap().months(), 6);
        assert_eq!(
            GenerationPeriod::try_from(4),
            Err(ScheduleError::InvalidGenerationPeriod(4))
        );
    }

    #[test]
    fn empty_pattern_is_rejected() {
        assert_eq!(
            RecurrencePattern::new(Vec::new(), GenerationPeriod::OneMonth),
            Err(ScheduleError::EmptyRecurrence)
        );
    }

    #[test]
    fn occurrence_equality_ignores_source() {
        let start = Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).single().unwrap();
        let slot =
            RecurrenceSlot::new(DayOfWeek::MONDAY, parse_time("10:00").unwrap(), 60, berlin())
                .unwrap();
        let generated = ClassOccurrence {
            start_instant: start,
            duration_minutes: 60,
            source_slot: Some(slot),
        };
        assert_eq!(generated, ClassOccurrence::one_off(start, 60));
        assert_ne!(generated, ClassOccurrence::one_off(start, 45));
    }

    #[test]
    fn booking_overlap_is_half_open() {
        let start = Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).single().unwrap();
        let booking = Booking {
            start_instant: start,
            duration_minutes: 60,
            title: None,
        };
        let hour = Duration::hours(1);
        assert!(booking.overlaps(start + Duration::minutes(30), start + hour * 2));
        assert!(!booking.overlaps(start + hour, start + hour * 2));
        assert!(!booking.overlaps(start - hour, start));
    }

    #[test]
    fn window_validation() {
        let ok = AvailabilityWindow::new(DayOfWeek::MONDAY, "09:00", "17:00", berlin());
        assert!(ok.validate().is_ok());
        assert_eq!(ok.bounds().unwrap(), (540, 1020));

        let to_midnight = AvailabilityWindow::new(DayOfWeek::MONDAY, "20:00", "24:00", berlin());
        assert_eq!(to_midnight.bounds().unwrap(), (1200, 1440));

        let reversed = AvailabilityWindow::new(DayOfWeek::MONDAY, "17:00", "09:00", berlin());
        assert!(matches!(reversed.validate(), Err(ScheduleError::InvalidTime(_))));

        let short = AvailabilityWindow::new(DayOfWeek::MONDAY, "09:00", "09:10", berlin());
        assert!(matches!(short.validate(), Err(ScheduleError::InvalidDuration(_))));

        let long = AvailabilityWindow::new(DayOfWeek::MONDAY, "00:00", "24:00", berlin());
        assert!(matches!(long.validate(), Err(ScheduleError::InvalidDuration(_))));
    }

    #[test]
    fn weekly_windows_are_sorted() {
        let weekly = WeeklyAvailability::new(berlin())
            .with_window(DayOfWeek::MONDAY, "14:00", "16:00")
            .with_window(DayOfWeek::MONDAY, "08:00", "10:00");
        let starts: Vec<_> = weekly
            .windows_for(DayOfWeek::MONDAY)
            .iter()
            .map(|w| w.start_time.as_str())
            .collect();
        assert_eq!(starts, ["08:00", "14:00"]);
        assert!(weekly.windows_for(DayOfWeek::TUESDAY).is_empty());
        assert_eq!(weekly.all_windows().count(), 2);
    }

    #[test]
    fn conflict_report_serialization() {
        let report = ConflictReport::NoWindowsForDay {
            day_of_week: DayOfWeek::TUESDAY,
        };
        assert_eq!(
            serde_json::to_string(&report).unwrap(),
            r#"{"status":"noWindowsForDay","dayOfWeek":2}"#
        );
        assert_eq!(
            serde_json::to_string(&ConflictReport::Ok).unwrap(),
            r#"{"status":"ok"}"#
        );
        assert_eq!(report.reason(), "Teacher has no availability on Tuesday");
    }

    #[test]
    fn transition_kind_serialization() {
        assert_eq!(
            serde_json::to_string(&TransitionKind::SpringForward).unwrap(),
            "\"springForward\""
        );
        assert_eq!(format!("{}", TransitionKind::FallBack), "fallBack");
    }
}
