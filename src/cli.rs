//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::catalog::{self, Indicator};
use clap::Parser;
use std::path::PathBuf;

/// PopDop - World Bank population dashboard in your terminal
///
/// Fetch demographic indicators for the world and a set of countries,
/// aggregate them into per-indicator series, and write a Markdown or
/// JSON dashboard report.
///
/// Examples:
///   popdop
///   popdop --range 20 --indicators population,life-expectancy
///   popdop --countries WLD,BRA,NGA --format json -o dashboard.json
///   popdop --year 2020 --compare density
///   popdop --dry-run
///   popdop --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Number of years back from the current year to fetch
    ///
    /// One of 5, 10, 20 or 100. Default: from config or 5.
    #[arg(short, long, value_name = "YEARS")]
    pub range: Option<u32>,

    /// Indicators to fetch (comma-separated names or codes)
    ///
    /// Example: --indicators population,density,SP.DYN.LE00.IN
    #[arg(short, long, value_name = "LIST", value_delimiter = ',')]
    pub indicators: Option<Vec<Indicator>>,

    /// Country codes to fetch (comma-separated, include WLD for world totals)
    #[arg(long, value_name = "CODES", value_delimiter = ',')]
    pub countries: Option<Vec<String>>,

    /// Year to show in the country table (default: most recent available)
    #[arg(short, long, value_name = "YEAR")]
    pub year: Option<String>,

    /// Indicator used for the stacked country comparison
    #[arg(long, value_name = "INDICATOR")]
    pub compare: Option<Indicator>,

    /// Statistics API root URL
    #[arg(long, value_name = "URL", env = "POPDOP_API_URL")]
    pub api_url: Option<String>,

    /// Request timeout in seconds (default: no timeout)
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Number of indicator requests in flight at once
    #[arg(long, value_name = "NUM")]
    pub concurrency: Option<usize>,

    /// Output file path for the report
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format (markdown, json)
    #[arg(long, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Path to configuration file
    ///
    /// If not specified, looks for .popdop.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Print the request URLs without fetching anything
    #[arg(long)]
    pub dry_run: bool,

    /// Generate a default .popdop.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.init_config {
            return Ok(());
        }

        if let Some(range) = self.range {
            if !catalog::is_valid_range(range) {
                return Err(format!(
                    "Range must be one of {:?} years",
                    catalog::YEAR_RANGES
                ));
            }
        }

        if let Some(ref url) = self.api_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("API URL must start with 'http://' or 'https://'".to_string());
            }
        }

        if let Some(ref countries) = self.countries {
            if countries.is_empty() || countries.iter().any(|c| c.trim().is_empty()) {
                return Err("Country codes must not be empty".to_string());
            }
        }

        if let Some(ref year) = self.year {
            if year.len() != 4 || !year.chars().all(|c| c.is_ascii_digit()) {
                return Err(format!("Year must be a four-digit number, got '{}'", year));
            }
        }

        if self.concurrency == Some(0) {
            return Err("Concurrency must be at least 1".to_string());
        }

        if self.timeout == Some(0) {
            return Err("Timeout must be at least 1 second".to_string());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self, config_verbose: bool) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose || config_verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
