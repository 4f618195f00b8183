use std::fs;
use std::io::{self, Read};

use anyhow::Context;
use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use classtime_core::config::{MAX_GUARD_HOURS, MAX_SUGGESTION_LIMIT, MAX_WEEKS_PER_WINDOW};
use classtime_core::{Clock, EngineConfig, FixedClock, SystemClock};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::cli::EngineArgs;
use crate::error::{CliError, CliResult};

pub fn parse_tz_or_input_error(name: &str) -> CliResult<Tz> {
    classtime_core::tz::parse_tz(name)
        .map_err(|e| CliError::input(format!("Invalid timezone '{}': {}", name, e)))
}

pub fn parse_rfc3339_to_utc(s: &str) -> CliResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| CliError::input(format!("Failed to parse RFC3339 '{}': {}", s, e)))
}

/// `--now` if given, the system clock otherwise.
pub fn clock_from(now: Option<&str>) -> CliResult<Box<dyn Clock>> {
    match now {
        Some(s) => Ok(Box::new(FixedClock(parse_rfc3339_to_utc(s)?))),
        None => Ok(Box::new(SystemClock)),
    }
}

pub fn engine_config(args: &EngineArgs) -> CliResult<EngineConfig> {
    let guard_period = Duration::try_hours(args.guard_hours)
        .filter(|_| (0..=MAX_GUARD_HOURS).contains(&args.guard_hours))
        .ok_or_else(|| {
            CliError::input(format!(
                "Invalid guard_hours '{}'. Expected 0-{}",
                args.guard_hours, MAX_GUARD_HOURS
            ))
        })?;
    if args.limit > MAX_SUGGESTION_LIMIT {
        return Err(CliError::input(format!(
            "Invalid limit '{}'. Expected 0-{}",
            args.limit, MAX_SUGGESTION_LIMIT
        )));
    }
    if !(1..=MAX_WEEKS_PER_WINDOW).contains(&args.weeks_per_window) {
        return Err(CliError::input(format!(
            "Invalid weeks_per_window '{}'. Expected 1-{}",
            args.weeks_per_window, MAX_WEEKS_PER_WINDOW
        )));
    }

    Ok(EngineConfig {
        default_timezone: parse_tz_or_input_error(&args.default_tz)?,
        guard_period,
        suggestion_limit: args.limit,
        weeks_per_window: args.weeks_per_window,
    })
}

/// A missing or unreadable file is the caller's mistake; a failing stdin is
/// not.
fn read_source(path: &str) -> CliResult<String> {
    if path == "-" {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read stdin")
            .map_err(|e| CliError::runtime(format!("{e:#}")))?;
        Ok(buf)
    } else {
        fs::read_to_string(path)
            .with_context(|| format!("Failed to read file: {path}"))
            .map_err(|e| CliError::input(format!("{e:#}")))
    }
}

/// Read and deserialize a JSON document from a file or stdin.
pub fn read_json<T: DeserializeOwned>(path: &str) -> CliResult<T> {
    let content = read_source(path)?;
    serde_json::from_str(&content)
        .map_err(|e| CliError::input(format!("Invalid JSON in '{}': {}", path, e)))
}

pub fn print_json<T: Serialize>(value: &T) -> CliResult<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| CliError::runtime(format!("Failed to serialize JSON: {}", e)))?;
    println!("{}", json);
    Ok(())
}

/// `+HH:MM` / `-HH:MM`.
pub fn format_offset(minutes: i32) -> String {
    let sign = if minutes < 0 { '-' } else { '+' };
    let abs = minutes.abs();
    format!("{}{:02}:{:02}", sign, abs / 60, abs % 60)
}
