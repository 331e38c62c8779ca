//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use std::path::PathBuf;

/// FairSweep - FAIRness evaluation sweeper for spreadsheet worklists
///
/// Polls a spreadsheet-backed worklist of dataset identifiers, submits
/// unprocessed rows to a FAIRness evaluation service and writes the
/// aggregated scorecard back, row by row.
///
/// Examples:
///   fairsweep --config fairsweep.toml
///   fairsweep --once --verbose
///   fairsweep --dry-run
///   fairsweep --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Path to configuration file
    ///
    /// If not specified, looks for fairsweep.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Run a single scan cycle and exit
    ///
    /// Without this flag the sweeper polls forever.
    #[arg(long)]
    pub once: bool,

    /// Dry run: scan the worklist and print eligible rows
    ///
    /// No evaluator calls are made and nothing is written back.
    #[arg(long)]
    pub dry_run: bool,

    /// Seconds between scan cycles
    ///
    /// Overrides the config file. Also the retry delay after a failed cycle.
    #[arg(long, value_name = "SECS", env = "FAIRSWEEP_INTERVAL")]
    pub interval: Option<u64>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default fairsweep.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(interval) = self.interval {
            if interval == 0 {
                return Err("Interval must be at least 1 second".to_string());
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
