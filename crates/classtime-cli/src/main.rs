use std::process::ExitCode;

use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod check_cmd;
mod cli;
mod convert_cmd;
mod dst_cmd;
mod error;
mod expand_cmd;
mod shared;

use check_cmd::run_check;
use cli::{Cli, Commands};
use convert_cmd::run_convert;
use dst_cmd::run_dst;
use error::{CliResult, OutputFormat, output_format_hint, parse_output_format, render_error};
use expand_cmd::run_expand;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    debug!(command = ?cli.command, "Parsed CLI args");

    match cli.command {
        Commands::Expand(args) => {
            let format = args.output_format.clone();
            dispatch(&format, |output_format| run_expand(args, output_format))
        }
        Commands::Check(args) => {
            let format = args.output_format.clone();
            dispatch(&format, |output_format| run_check(args, output_format))
        }
        Commands::Dst(args) => {
            let format = args.output_format.clone();
            dispatch(&format, |output_format| run_dst(args, output_format))
        }
        Commands::Convert(args) => {
            let format = args.output_format.clone();
            dispatch(&format, |output_format| run_convert(args, output_format))
        }
    }
}

/// `RUST_LOG` wins over `--verbose`.
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn dispatch(format: &str, run: impl FnOnce(OutputFormat) -> CliResult<ExitCode>) -> ExitCode {
    let output_format = match parse_output_format(format) {
        Ok(format) => format,
        Err(err) => return render_error(&err, output_format_hint(format)),
    };

    match run(output_format) {
        Ok(code) => code,
        Err(err) => render_error(&err, output_format),
    }
}
