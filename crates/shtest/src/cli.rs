//! CLI definitions.

use std::path::PathBuf;

use clap::Parser;
use shtest::{DEFAULT_SIMULATOR, DEFAULT_TIMEOUT_SECS};

#[derive(Parser)]
#[command(name = "shtest")]
#[command(about = "Run the SH-2E instruction conformance suite against msim")]
#[command(version)]
pub struct Cli {
    /// Suite root containing the per-test directories
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub root: PathBuf,

    /// Simulator executable, relative to the suite root
    #[arg(long, value_name = "PATH", default_value = DEFAULT_SIMULATOR)]
    pub simulator: PathBuf,

    /// Timeout per test in seconds
    #[arg(short, long, default_value_t = DEFAULT_TIMEOUT_SECS, value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: u64,

    /// Alternate catalog manifest (TOML) instead of the built-in one
    #[arg(long, value_name = "FILE")]
    pub manifest: Option<PathBuf>,

    /// Only run tests whose identifier contains this pattern
    #[arg(short, long)]
    pub filter: Option<String>,

    /// Print the catalog in execution order and exit
    #[arg(long)]
    pub list: bool,

    /// Keep produced output files even when they match
    #[arg(long)]
    pub keep_output: bool,

    /// Enable verbose output (debug logging)
    #[arg(short, long)]
    pub verbose: bool,

    /// Suppress the status table and summary (only show the failing test)
    #[arg(short, long, conflicts_with = "verbose")]
    pub silent: bool,
}

impl Cli {
    /// Default log directive for the chosen verbosity.
    pub const fn log_level(&self) -> &'static str {
        if self.verbose {
            "shtest=debug"
        } else if self.silent {
            "shtest=error"
        } else {
            "shtest=warn"
        }
    }
}
