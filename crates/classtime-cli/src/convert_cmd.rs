use std::process::ExitCode;

use chrono::{DateTime, Utc};
use classtime_core::tz::format_rfc3339_utc;
use classtime_core::{CivilInput, Converter};

use crate::cli::ConvertArgs;
use crate::error::{CliResult, EXIT_SUCCESS, OutputFormat};
use crate::shared::{clock_from, format_offset, parse_tz_or_input_error, print_json};

pub fn run_convert(args: ConvertArgs, output_format: OutputFormat) -> CliResult<ExitCode> {
    let converter = Converter::new(parse_tz_or_input_error(&args.default_tz)?);
    let clock = clock_from(args.now.as_deref())?;

    // Anything carrying its own offset is an instant; the rest is civil time.
    let input = match DateTime::parse_from_rfc3339(args.time.trim()) {
        Ok(dt) => CivilInput::Instant(dt.with_timezone(&Utc)),
        Err(_) => CivilInput::Civil(&args.time),
    };

    let conversion = converter.convert(input, &args.from, &args.to, clock.as_ref());

    match output_format {
        OutputFormat::Json => print_json(&conversion)?,
        OutputFormat::Text => {
            let target = &conversion.target;
            println!("{}", format_rfc3339_utc(&conversion.instant));
            println!(
                "{}: {} {} (UTC{}{})",
                target.timezone,
                target.day_of_week,
                target.wall_clock,
                format_offset(target.utc_offset_minutes),
                if target.dst_active { ", DST" } else { "" }
            );
            if !conversion.parsed {
                println!("Note: input could not be read as a time; showing the current time");
            } else if conversion.degraded {
                println!("Note: input was guessed; see warnings");
            }
        }
    }

    Ok(ExitCode::from(EXIT_SUCCESS))
}
