//! # classtime-core
//!
//! Recurring class scheduling across timezones.
//!
//! A class is pinned to a wall-clock time in one IANA timezone and repeats
//! weekly. Teachers publish weekly availability in their own zone. This
//! library expands the recurrence into concrete instants, checks each slot
//! against the availability windows, and ranks alternatives when a slot does
//! not fit.
//!
//! ## Features
//!
//! - **DST-stable recurrence**: occurrences keep their wall-clock time in the
//!   slot's zone; the UTC gap between them absorbs the offset change.
//! - **Cross-zone matching**: slots are placed in the teacher's zone before
//!   the containment test, so a Monday evening in New York is a Tuesday
//!   morning in Dubai.
//! - **Alternatives**: bounded, deduplicated suggestions, ranked by distance
//!   from the original request and never inside the guard period.
//! - **Explicit time**: everything that needs "now" takes a [`Clock`].
//!
//! ## Example
//!
//! ```rust
//! use classtime_core::prelude::*;
//! use chrono::{TimeZone, Utc};
//!
//! let tz = parse_tz("Europe/Berlin").unwrap();
//! let slot = RecurrenceSlot::new(DayOfWeek::MONDAY, parse_time("10:00").unwrap(), 60, tz).unwrap();
//! let pattern = RecurrencePattern::new(vec![slot.clone()], GenerationPeriod::OneMonth).unwrap();
//!
//! let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).single().unwrap();
//! let occurrences = expand(&pattern, now).unwrap();
//! assert_eq!(occurrences.len(), 5);
//!
//! let profile = AvailabilityProfile::Weekly(
//!     WeeklyAvailability::new(tz).with_window(DayOfWeek::MONDAY, "09:00", "12:00"),
//! );
//! assert!(check(&slot, &profile, now).is_ok());
//! ```

pub mod availability;
pub mod clock;
pub mod config;
pub mod convert;
pub mod dst;
pub mod error;
pub mod models;
pub mod parse;
pub mod recurrence;
pub mod schedule;
pub mod suggest;
pub mod tz;
pub mod wire;

// Re-export commonly used types at the crate root
pub use availability::{BookingConflict, check, check_occurrence, find_booking_conflicts};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::EngineConfig;
pub use convert::{
    CivilInput, Conversion, Converter, LocalDisplay, PartyTimezones, PartyView, display_in,
};
pub use dst::{
    DriftWarning, DstSummary, drift_warnings, find_transitions, next_transition,
    summarize as summarize_dst,
};
pub use error::{Result, ScheduleError};
pub use models::{
    AlternativeSlotSuggestion, AvailabilityProfile, AvailabilityWindow, Booking, ClassOccurrence,
    ConflictReport, DayOfWeek, DstTransition, GenerationPeriod, RecurrencePattern,
    RecurrenceSlot, TimeOfDay, TransitionKind, WeeklyAvailability,
};
pub use parse::{format_time, parse_end_minutes, parse_time};
pub use recurrence::{expand, expand_by_slot};
pub use schedule::{ConflictPayload, ConflictType, ScheduleRequest, SchedulingOutcome, evaluate};
pub use suggest::suggest;

/// Prelude module for convenient imports.
///
/// ```
/// use classtime_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::availability::{check, check_occurrence, find_booking_conflicts};
    pub use crate::clock::{Clock, FixedClock, SystemClock};
    pub use crate::config::EngineConfig;
    pub use crate::convert::{CivilInput, Converter, PartyTimezones, display_in};
    pub use crate::dst::{drift_warnings, find_transitions, summarize as summarize_dst};
    pub use crate::error::{Result, ScheduleError};
    pub use crate::models::*;
    pub use crate::parse::{format_time, parse_end_minutes, parse_time};
    pub use crate::recurrence::{expand, expand_by_slot};
    pub use crate::schedule::{ScheduleRequest, SchedulingOutcome, evaluate};
    pub use crate::suggest::suggest;
    pub use crate::tz::parse_tz;
}
