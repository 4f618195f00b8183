use std::process::ExitCode;

use classtime_core::schedule::ScheduledOccurrence;
use classtime_core::tz::format_rfc3339_utc;
use classtime_core::{ConflictPayload, ConflictType, ScheduleRequest, SchedulingOutcome, evaluate};

use crate::cli::CheckArgs;
use crate::error::{CliResult, EXIT_SUCCESS, OutputFormat};
use crate::shared::{clock_from, engine_config, print_json, read_json};

pub fn run_check(args: CheckArgs, output_format: OutputFormat) -> CliResult<ExitCode> {
    let config = engine_config(&args.engine)?;
    let clock = clock_from(args.engine.now.as_deref())?;
    let request: ScheduleRequest = read_json(&args.input)?;

    let outcome = evaluate(&request, &config, clock.as_ref())?;

    match output_format {
        OutputFormat::Json => print_json(&outcome)?,
        OutputFormat::Text => print_text(&outcome),
    }

    Ok(ExitCode::from(EXIT_SUCCESS))
}

fn print_text(outcome: &SchedulingOutcome) {
    match outcome {
        SchedulingOutcome::Matched {
            occurrences,
            drift_warnings,
            degraded,
            ..
        } => {
            println!("Matched: {} occurrence(s)", occurrences.len());
            for occurrence in occurrences {
                print_occurrence(occurrence);
            }
            for warning in drift_warnings {
                println!(
                    "Wall-clock change for {} at {}: {} -> {}",
                    warning.viewer_timezone,
                    format_rfc3339_utc(&warning.start_instant),
                    warning.previous_local_time,
                    warning.new_local_time
                );
            }
            print_degraded(*degraded);
        }
        SchedulingOutcome::AlternativesOffered {
            conflicts,
            degraded,
            ..
        } => {
            println!("Conflicts: {}", conflicts.len());
            for conflict in conflicts {
                print_conflict(conflict);
            }
            print_degraded(*degraded);
        }
    }
}

fn print_occurrence(occurrence: &ScheduledOccurrence) {
    let views = &occurrence.views;
    println!(
        "  {}  teacher {} | guardian {} | admin {}",
        format_rfc3339_utc(&occurrence.occurrence.start_instant),
        views.teacher.wall_clock,
        views.guardian.wall_clock,
        views.admin.wall_clock
    );
}

fn print_conflict(conflict: &ConflictPayload) {
    let kind = match conflict.conflict_type {
        ConflictType::ExistingClass => "existing_class",
        ConflictType::NoAvailability => "no_availability",
    };
    println!("- [{}] {}", kind, conflict.reason);

    if conflict.alternatives.is_empty() {
        println!("    no alternatives found");
    }
    for alt in &conflict.alternatives {
        println!(
            "    alternative: {} ({} min away{})",
            format_rfc3339_utc(&alt.start_instant),
            alt.distance_from_request_minutes,
            if alt.verified { "" } else { ", unverified" }
        );
    }
}

fn print_degraded(degraded: bool) {
    if degraded {
        println!("Note: some timezones or times were guessed; see warnings");
    }
}
