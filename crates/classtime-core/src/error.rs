//! Error types for classtime-core.
//!
//! Every variant here is a validation failure: the input is structurally
//! unusable and nothing can be computed from it. Scheduling conflicts are
//! not errors and are reported through [`crate::models::ConflictReport`].

use thiserror::Error;

/// The main error type for classtime operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    /// Invalid IANA timezone name provided.
    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    /// Malformed or out-of-range `HH:MM` time string.
    #[error("Invalid time: {0}")]
    InvalidTime(String),

    /// Day of week outside `0..=6` or not numeric.
    #[error("Invalid day of week: {0}")]
    InvalidDayOfWeek(String),

    /// Duration that is non-positive or outside the allowed range.
    #[error("Invalid duration: {0}")]
    InvalidDuration(String),

    /// A recurrence pattern without a single usable slot.
    #[error("Recurrence pattern has no valid days")]
    EmptyRecurrence,

    /// Generation period other than 1, 2, 3 or 6 months.
    #[error("Invalid generation period: {0} months. Expected 1, 2, 3 or 6")]
    InvalidGenerationPeriod(u32),

    /// Error parsing a timestamp or civil time that cannot be recovered.
    #[error("Parse error: {0}")]
    ParseError(String),
}

/// Result type alias for classtime operations.
pub type Result<T> = std::result::Result<T, ScheduleError>;
