//! Engine configuration.

use chrono::Duration;
use chrono_tz::Tz;

/// Minimum lead time before a suggested alternative may start.
pub const DEFAULT_GUARD_HOURS: i64 = 3;

/// Suggestions returned per rejected occurrence.
pub const DEFAULT_SUGGESTION_LIMIT: usize = 8;

/// Weekly candidates generated per availability window.
pub const DEFAULT_WEEKS_PER_WINDOW: u32 = 3;

/// Upper bounds accepted from user-supplied configuration.
pub const MAX_GUARD_HOURS: i64 = 24 * 366;
pub const MAX_SUGGESTION_LIMIT: usize = 100;
pub const MAX_WEEKS_PER_WINDOW: u32 = 52;

/// Tunables shared by every scheduling entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Used when a timezone name is missing or unknown.
    pub default_timezone: Tz,
    pub guard_period: Duration,
    pub suggestion_limit: usize,
    pub weeks_per_window: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_timezone: chrono_tz::UTC,
            guard_period: Duration::hours(DEFAULT_GUARD_HOURS),
            suggestion_limit: DEFAULT_SUGGESTION_LIMIT,
            weeks_per_window: DEFAULT_WEEKS_PER_WINDOW,
        }
    }
}
