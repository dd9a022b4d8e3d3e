//! CLI argument definitions for the stock-out analysis tool.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "stockout",
    version,
    about = "Stock-out detection and substitution attribution for pharmacy sales",
    long_about = "Detect stock-outs in weekly pharmacy sales, attribute the lost demand to \
                  substitutes or competitors, and build cross-market substitution \
                  coefficients.\n\n\
                  Reads Rd2_<CLIENT_ID>.csv market extracts and writes flat CSV outputs."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for debug, -vv for trace, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Analyse every market in a raw data folder and build cross-market coefficients.
    Run(RunArgs),

    /// Print preprocessing profiles of the market files.
    Profile(ProfileArgs),

    /// Print the effective analysis configuration as JSON.
    Config(ConfigArgs),
}

#[derive(Parser)]
pub struct RunArgs {
    /// Folder containing Rd2_<CLIENT_ID>.csv market files.
    #[arg(value_name = "RAW_DIR")]
    pub raw_dir: PathBuf,

    /// Output directory for generated files (default: <RAW_DIR>/output).
    #[arg(long = "output-dir", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Only analyse these markets (repeatable).
    #[arg(long = "market", value_name = "ID")]
    pub markets: Vec<i64>,

    /// JSON file overriding analysis thresholds.
    #[arg(long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Worker threads for market fan-out (default: one per core).
    #[arg(long = "threads", value_name = "N")]
    pub threads: Option<usize>,

    /// Analyse and report without writing output files.
    #[arg(long = "dry-run")]
    pub dry_run: bool,
}

#[derive(Parser)]
pub struct ProfileArgs {
    /// Folder containing Rd2_<CLIENT_ID>.csv market files.
    #[arg(value_name = "RAW_DIR")]
    pub raw_dir: PathBuf,
}

#[derive(Parser)]
pub struct ConfigArgs {
    /// JSON file overriding analysis thresholds.
    #[arg(long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
