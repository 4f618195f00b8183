use std::process::ExitCode;

use chrono_tz::Tz;
use classtime_core::tz::format_rfc3339_utc;
use classtime_core::wire::RecurrencePatternInput;
use classtime_core::{
    ClassOccurrence, DriftWarning, LocalDisplay, display_in, drift_warnings, expand,
};
use serde::Serialize;
use tracing::debug;

use crate::cli::ExpandArgs;
use crate::error::{CliResult, EXIT_SUCCESS, OutputFormat};
use crate::shared::{clock_from, engine_config, parse_tz_or_input_error, print_json, read_json};

pub fn run_expand(args: ExpandArgs, output_format: OutputFormat) -> CliResult<ExitCode> {
    let config = engine_config(&args.engine)?;
    let clock = clock_from(args.engine.now.as_deref())?;
    let viewer = args
        .viewer
        .as_deref()
        .map(parse_tz_or_input_error)
        .transpose()?;

    let input: RecurrencePatternInput = read_json(&args.input)?;
    let pattern = input.validate(config.default_timezone)?;
    let occurrences = expand(&pattern, clock.now())?;
    debug!(count = occurrences.len(), "Expanded recurrence pattern");

    let rows: Vec<OccurrenceRow> = occurrences
        .iter()
        .map(|o| OccurrenceRow::new(o, config.default_timezone, viewer))
        .collect();
    let warnings = viewer
        .map(|tz| drift_warnings(&occurrences, tz))
        .unwrap_or_default();

    match output_format {
        OutputFormat::Json => print_json(&ExpandOutput {
            occurrences: rows,
            drift_warnings: warnings,
        })?,
        OutputFormat::Text => {
            for row in &rows {
                let mut line = format!(
                    "{}  {} {} {} ({} min)",
                    row.start_utc,
                    row.local.day_of_week,
                    row.local.wall_clock,
                    row.local.timezone,
                    row.duration_minutes
                );
                if let Some(view) = &row.viewer {
                    line.push_str(&format!(
                        "  [{}: {} {}]",
                        view.timezone, view.day_of_week, view.wall_clock
                    ));
                }
                println!("{}", line);
            }
            for warning in &warnings {
                println!(
                    "Wall-clock change for {} at {}: {} -> {}",
                    warning.viewer_timezone,
                    format_rfc3339_utc(&warning.start_instant),
                    warning.previous_local_time,
                    warning.new_local_time
                );
            }
        }
    }

    Ok(ExitCode::from(EXIT_SUCCESS))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ExpandOutput {
    occurrences: Vec<OccurrenceRow>,
    drift_warnings: Vec<DriftWarning>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OccurrenceRow {
    start_utc: String,
    duration_minutes: u32,
    /// In the slot's own timezone.
    local: LocalDisplay,
    #[serde(skip_serializing_if = "Option::is_none")]
    viewer: Option<LocalDisplay>,
}

impl OccurrenceRow {
    fn new(occurrence: &ClassOccurrence, default_tz: Tz, viewer: Option<Tz>) -> Self {
        let home = occurrence
            .source_slot
            .as_ref()
            .map(|slot| slot.timezone)
            .unwrap_or(default_tz);

        Self {
            start_utc: format_rfc3339_utc(&occurrence.start_instant),
            duration_minutes: occurrence.duration_minutes,
            local: display_in(occurrence.start_instant, home),
            viewer: viewer.map(|tz| display_in(occurrence.start_instant, tz)),
        }
    }
}
