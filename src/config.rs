//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.popdop.toml` files.

use crate::catalog::{self, Indicator, DEFAULT_COUNTRIES, WORLD_AGGREGATE_ID};
use crate::fetcher::{DEFAULT_API_URL, DEFAULT_PER_PAGE};
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default config file name, looked up in the current directory.
pub const CONFIG_FILE: &str = ".popdop.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Statistics API settings.
    #[serde(default)]
    pub api: ApiConfig,

    /// What to fetch.
    #[serde(default)]
    pub dashboard: DashboardConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Default output file path.
    #[serde(default = "default_output")]
    pub output: String,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
            verbose: false,
        }
    }
}

fn default_output() -> String {
    "popdop_report.md".to_string()
}

/// Statistics API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// API root URL.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Records requested per indicator call.
    #[serde(default = "default_per_page")]
    pub per_page: u32,

    /// Request timeout in seconds. Unset means no timeout.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u64>,

    /// Indicator requests allowed in flight at once.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            per_page: default_per_page(),
            timeout_seconds: None,
            concurrency: default_concurrency(),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_per_page() -> u32 {
    DEFAULT_PER_PAGE
}

fn default_concurrency() -> usize {
    1
}

/// Countries, indicators and range to fetch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Country codes to request (the world aggregate included).
    #[serde(default = "default_countries")]
    pub countries: Vec<String>,

    /// Country id the API uses for the world aggregate in responses.
    #[serde(default = "default_world_id")]
    pub world_aggregate_id: String,

    /// How many years back from the current year to fetch.
    #[serde(default = "default_range_years")]
    pub range_years: u32,

    /// Indicator codes to fetch.
    #[serde(default = "default_indicators")]
    pub indicators: Vec<String>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            countries: default_countries(),
            world_aggregate_id: default_world_id(),
            range_years: default_range_years(),
            indicators: default_indicators(),
        }
    }
}

fn default_countries() -> Vec<String> {
    DEFAULT_COUNTRIES.iter().map(|c| c.to_string()).collect()
}

fn default_world_id() -> String {
    WORLD_AGGREGATE_ID.to_string()
}

fn default_range_years() -> u32 {
    5
}

fn default_indicators() -> Vec<String> {
    Indicator::all_codes()
}

/// Report generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Year the country table is filtered to. Unset means the latest year.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_year: Option<String>,

    /// Indicator code used for the stacked country comparison.
    #[serde(default = "default_compare_indicator")]
    pub compare_indicator: String,

    /// Number of points in the world trend section.
    #[serde(default = "default_trend_points")]
    pub trend_points: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            selected_year: None,
            compare_indicator: default_compare_indicator(),
            trend_points: default_trend_points(),
        }
    }
}

fn default_compare_indicator() -> String {
    Indicator::TotalPopulation.code().to_string()
}

fn default_trend_points() -> usize {
    5
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        Self::load_from_dir(Path::new("."))
    }

    /// Try to load `.popdop.toml` from a directory.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(CONFIG_FILE);

        if config_path.exists() {
            Ok(Some(Self::load(&config_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// when they were given.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref output) = args.output {
            self.general.output = output.display().to_string();
        }
        if args.verbose {
            self.general.verbose = true;
        }

        if let Some(ref url) = args.api_url {
            self.api.base_url = url.clone();
        }
        if let Some(timeout) = args.timeout {
            self.api.timeout_seconds = Some(timeout);
        }
        if let Some(concurrency) = args.concurrency {
            self.api.concurrency = concurrency;
        }

        if let Some(range) = args.range {
            self.dashboard.range_years = range;
        }
        if let Some(ref countries) = args.countries {
            self.dashboard.countries = countries.iter().map(|c| c.to_uppercase()).collect();
        }
        if let Some(ref indicators) = args.indicators {
            self.dashboard.indicators = indicators.iter().map(|i| i.code().to_string()).collect();
        }

        if let Some(ref year) = args.year {
            self.report.selected_year = Some(year.clone());
        }
        if let Some(compare) = args.compare {
            self.report.compare_indicator = compare.code().to_string();
        }
    }

    /// Check values that serde defaults cannot guard.
    pub fn validate(&self) -> Result<()> {
        if !catalog::is_valid_range(self.dashboard.range_years) {
            bail!(
                "Range must be one of {:?} years, got {}",
                catalog::YEAR_RANGES,
                self.dashboard.range_years
            );
        }
        if self.dashboard.countries.is_empty() {
            bail!("At least one country code is required");
        }
        if self.dashboard.indicators.iter().any(|i| i.trim().is_empty()) {
            bail!("Indicator codes must not be empty");
        }
        if self.dashboard.indicators.is_empty() {
            bail!("At least one indicator is required");
        }
        if !self.api.base_url.starts_with("http://") && !self.api.base_url.starts_with("https://")
        {
            bail!("API URL must start with 'http://' or 'https://'");
        }
        if self.api.per_page == 0 {
            bail!("per_page must be at least 1");
        }
        if self.api.concurrency == 0 {
            bail!("Concurrency must be at least 1");
        }
        if self.api.timeout_seconds == Some(0) {
            bail!("timeout_seconds must be at least 1 (omit it for no timeout)");
        }
        Ok(())
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
