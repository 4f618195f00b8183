use clap::{Parser, Subcommand};
use classtime_core::config::{
    DEFAULT_GUARD_HOURS, DEFAULT_SUGGESTION_LIMIT, DEFAULT_WEEKS_PER_WINDOW,
};

/// Recurring class scheduling across timezones
#[derive(Parser, Debug)]
#[command(name = "classtime", version)]
#[command(about = "Recurring class scheduling across timezones")]
pub struct Cli {
    /// Enable verbose (debug) logging
    #[arg(long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Expand a recurrence pattern into concrete occurrences
    Expand(ExpandArgs),
    /// Evaluate a scheduling request against availability and bookings
    Check(CheckArgs),
    /// Show the DST transitions of a timezone
    Dst(DstArgs),
    /// Convert a time between timezones
    Convert(ConvertArgs),
}

/// Engine tunables shared by the commands that evaluate requests.
#[derive(clap::Args, Debug)]
pub struct EngineArgs {
    /// IANA timezone used when none is given
    #[arg(long, default_value = "UTC")]
    pub default_tz: String,

    /// Hours from now before which no alternative is offered
    #[arg(long, default_value_t = DEFAULT_GUARD_HOURS)]
    pub guard_hours: i64,

    /// Maximum alternatives per conflict
    #[arg(long, default_value_t = DEFAULT_SUGGESTION_LIMIT)]
    pub limit: usize,

    /// Weekly candidates generated per availability window
    #[arg(long, default_value_t = DEFAULT_WEEKS_PER_WINDOW)]
    pub weeks_per_window: u32,

    /// Fixed current time (RFC3339) instead of the system clock
    #[arg(long)]
    pub now: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct ExpandArgs {
    /// JSON recurrence pattern file (use - for stdin)
    #[arg(long, default_value = "-")]
    pub input: String,

    /// Also show each occurrence in this timezone and flag wall-clock drift
    #[arg(long)]
    pub viewer: Option<String>,

    #[command(flatten)]
    pub engine: EngineArgs,

    /// Output format: json, text
    #[arg(long, default_value = "text")]
    pub output_format: String,
}

#[derive(clap::Args, Debug)]
pub struct CheckArgs {
    /// JSON scheduling request file (use - for stdin)
    #[arg(long, default_value = "-")]
    pub input: String,

    #[command(flatten)]
    pub engine: EngineArgs,

    /// Output format: json, text
    #[arg(long, default_value = "json")]
    pub output_format: String,
}

#[derive(clap::Args, Debug)]
pub struct DstArgs {
    /// IANA timezone
    #[arg(short, long)]
    pub tz: String,

    /// Year to scan (defaults to the current year)
    #[arg(long)]
    pub year: Option<i32>,

    /// Fixed current time (RFC3339) instead of the system clock
    #[arg(long)]
    pub now: Option<String>,

    /// Output format: json, text
    #[arg(long, default_value = "text")]
    pub output_format: String,
}

#[derive(clap::Args, Debug)]
pub struct ConvertArgs {
    /// RFC3339 instant, or a civil time read in --from
    #[arg(long)]
    pub time: String,

    /// Source timezone
    #[arg(long, default_value = "UTC")]
    pub from: String,

    /// Target timezone
    #[arg(long)]
    pub to: String,

    /// Timezone used when --from or --to cannot be parsed
    #[arg(long, default_value = "UTC")]
    pub default_tz: String,

    /// Fixed current time (RFC3339), used when --time cannot be read
    #[arg(long)]
    pub now: Option<String>,

    /// Output format: json, text
    #[arg(long, default_value = "text")]
    pub output_format: String,
}
