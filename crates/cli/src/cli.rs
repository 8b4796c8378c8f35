//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Stereo Odometry - visual odometry and point-cloud mapping from a stereo rig
#[derive(Parser, Debug)]
#[command(
    name = "stereo-odometry",
    author,
    version,
    about = "Stereo visual odometry and mapping pipeline",
    long_about = "Captures rectified stereo frame pairs, estimates the vehicle's motion \n\
                  between consecutive pairs, accumulates a pose and a world-frame point \n\
                  cloud map, and runs until a stop signal, disconnect or cycle limit."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "STEREO_ODOMETRY_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "STEREO_ODOMETRY_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the odometry pipeline
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display configuration information
    Info(InfoArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(
        short,
        long,
        default_value = "odometry.toml",
        env = "STEREO_ODOMETRY_CONFIG"
    )]
    pub config: PathBuf,

    /// Override pipeline.max_cycles (0 = unlimited)
    #[arg(long, env = "STEREO_ODOMETRY_MAX_CYCLES")]
    pub max_cycles: Option<u64>,

    /// Request a stop after this many seconds (0 = no timeout)
    #[arg(long, default_value = "0", env = "STEREO_ODOMETRY_TIMEOUT")]
    pub timeout: u64,

    /// Override stop.sentinel_file: stop once this file exists
    #[arg(long, env = "STEREO_ODOMETRY_STOP_FILE")]
    pub stop_file: Option<PathBuf>,

    /// Replay a JSON-lines recording on the driving sensor instead of its configured rig
    #[arg(long)]
    pub replay: Option<PathBuf>,

    /// Replay speed multiplier
    #[arg(long, default_value = "1.0", requires = "replay")]
    pub replay_speed: f64,

    /// Restart the recording when exhausted
    #[arg(long, requires = "replay")]
    pub replay_loop: bool,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "STEREO_ODOMETRY_METRICS_PORT")]
    pub metrics_port: u16,

    /// Validate configuration and exit without running pipeline
    #[arg(long)]
    pub dry_run: bool,

    /// Print the final summary as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "odometry.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "odometry.toml")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Show detailed sensor information
    #[arg(long)]
    pub sensors: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => observability::LogFormat::Json,
            LogFormat::Pretty => observability::LogFormat::Pretty,
            LogFormat::Compact => observability::LogFormat::Compact,
        }
    }
}
