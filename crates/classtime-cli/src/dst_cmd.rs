use std::process::ExitCode;

use chrono::Datelike;
use classtime_core::tz::format_rfc3339_utc;
use classtime_core::{DstTransition, summarize_dst};

use crate::cli::DstArgs;
use crate::error::{CliResult, EXIT_SUCCESS, OutputFormat};
use crate::shared::{clock_from, format_offset, parse_tz_or_input_error, print_json};

pub fn run_dst(args: DstArgs, output_format: OutputFormat) -> CliResult<ExitCode> {
    let tz = parse_tz_or_input_error(&args.tz)?;
    let clock = clock_from(args.now.as_deref())?;
    let year = args.year.unwrap_or_else(|| clock.now().year());

    let summary = summarize_dst(tz, year, clock.as_ref());

    match output_format {
        OutputFormat::Json => print_json(&summary)?,
        OutputFormat::Text => {
            println!("Timezone: {}", summary.timezone);
            println!("Year: {}", summary.year);
            if summary.has_dst {
                println!("Transitions:");
                for transition in &summary.transitions {
                    println!("  {}", describe(transition));
                }
            } else {
                println!("No DST transitions");
            }
            match (&summary.next_transition, summary.days_until_next) {
                (Some(next), Some(days)) => {
                    println!("Next: {} (in {} days)", describe(next), days);
                }
                _ => println!("Next: none"),
            }
        }
    }

    Ok(ExitCode::from(EXIT_SUCCESS))
}

fn describe(transition: &DstTransition) -> String {
    format!(
        "{} {} {} -> {}",
        format_rfc3339_utc(&transition.instant),
        transition.kind,
        format_offset(transition.offset_before_minutes),
        format_offset(transition.offset_after_minutes)
    )
}
