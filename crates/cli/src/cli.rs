//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Kinescan - scan acquisition and calibration engine for electromagnetic trackers
#[derive(Parser, Debug)]
#[command(
    name = "kinescan",
    author,
    version,
    about = "Multi-sensor scan acquisition and calibration engine",
    long_about = "Acquisition and calibration front end for an electromagnetic \n\
                  motion tracker.\n\n\
                  Drives finger-mounted sensors plus a reference sensor, captures \n\
                  anatomical reference points interactively, streams calibrated \n\
                  surface samples, and exports the result as CSV tables or PLY \n\
                  point clouds."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "KINESCAN_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "KINESCAN_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Calibrate, acquire a scan, and run the configured exports
    Run(RunArgs),

    /// Capture a reference-point set without scanning
    Calibrate(CalibrateArgs),

    /// Validate a scan profile without running
    Validate(ValidateArgs),

    /// Display scan profile information
    Info(InfoArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to scan profile (TOML or JSON)
    #[arg(short, long, default_value = "kinescan.toml", env = "KINESCAN_PROFILE")]
    pub config: PathBuf,

    /// Scan duration in seconds (0 = run until Ctrl+C)
    #[arg(long, default_value = "0", env = "KINESCAN_DURATION")]
    pub duration: u64,

    /// Override the number of calibration points from the profile
    #[arg(long)]
    pub points: Option<usize>,

    /// Load a previously captured reference set instead of calibrating
    #[arg(long, conflicts_with = "points")]
    pub references: Option<PathBuf>,

    /// Capture calibration points without waiting for operator confirmation
    #[arg(long)]
    pub auto_capture: bool,

    /// Print a live feed of raw samples to stdout
    #[arg(long)]
    pub live: bool,

    /// Validate the profile and exit without running
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the `calibrate` command
#[derive(Parser, Debug, Clone)]
pub struct CalibrateArgs {
    /// Path to scan profile (TOML or JSON)
    #[arg(short, long, default_value = "kinescan.toml", env = "KINESCAN_PROFILE")]
    pub config: PathBuf,

    /// Override the number of calibration points from the profile
    #[arg(long)]
    pub points: Option<usize>,

    /// Capture calibration points without waiting for operator confirmation
    #[arg(long)]
    pub auto_capture: bool,

    /// Write the captured reference set as JSON for later reuse
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to scan profile to validate
    #[arg(short, long, default_value = "kinescan.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to scan profile
    #[arg(short, long, default_value = "kinescan.toml")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Show export route details
    #[arg(long)]
    pub exports: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}
