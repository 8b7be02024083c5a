//! Data models for the population dashboard.
//!
//! This module contains the observation records returned by the
//! statistics API, the aggregated series built from them, and the
//! report structures rendered at the end of a run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// An `{ id, value }` pair as used by the API for indicators and countries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodedName {
    /// Catalog identifier (indicator code or country id).
    pub id: String,
    /// Human-readable name.
    #[serde(default)]
    pub value: String,
}

impl CodedName {
    #[cfg(test)]
    pub fn new(id: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            value: value.into(),
        }
    }
}

/// One (indicator, country, year) data point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Indicator this value belongs to.
    pub indicator: CodedName,
    /// Country (or aggregate) this value belongs to.
    pub country: CodedName,
    /// ISO3 code of the country, empty for some aggregates.
    #[serde(default)]
    pub countryiso3code: String,
    /// Four-digit year as text.
    pub date: String,
    /// Reported value, `None` when no data was reported for the year.
    #[serde(default, deserialize_with = "lenient_value")]
    pub value: Option<f64>,
}

impl Observation {
    /// Build an observation without names.
    #[cfg(test)]
    pub fn new(indicator: &str, country: &str, date: &str, value: Option<f64>) -> Self {
        Self {
            indicator: CodedName::new(indicator, ""),
            country: CodedName::new(country, ""),
            countryiso3code: String::new(),
            date: date.to_string(),
            value,
        }
    }

    pub fn indicator_code(&self) -> &str {
        &self.indicator.id
    }

    pub fn country_code(&self) -> &str {
        &self.country.id
    }

    /// Numeric year, `None` when the date is not a number.
    pub fn year(&self) -> Option<i32> {
        self.date.trim().parse().ok()
    }
}

/// Accept numbers and numeric strings; anything else becomes `None`.
fn lenient_value<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

/// Indicator code -> world aggregate series (insertion ordered).
pub type WorldSeries = BTreeMap<String, Vec<Observation>>;

/// Country id -> indicator code -> series (insertion ordered).
pub type CountrySeries = BTreeMap<String, BTreeMap<String, Vec<Observation>>>;

/// Output of one aggregation pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AggregatedSeries {
    /// World aggregate series keyed by indicator code.
    pub world: WorldSeries,
    /// Per-country series keyed by country id, then indicator code.
    pub countries: CountrySeries,
}

impl AggregatedSeries {
    /// True when neither map holds anything ("no data").
    pub fn is_empty(&self) -> bool {
        self.world.is_empty() && self.countries.is_empty()
    }

    /// World series for an indicator, empty when missing.
    pub fn world_series(&self, indicator: &str) -> &[Observation] {
        self.world.get(indicator).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Country series for an indicator, empty when missing.
    pub fn country_series(&self, country: &str, indicator: &str) -> &[Observation] {
        self.countries
            .get(country)
            .and_then(|by_indicator| by_indicator.get(indicator))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Total number of retained observations.
    pub fn observation_count(&self) -> usize {
        let world: usize = self.world.values().map(Vec::len).sum();
        let countries: usize = self
            .countries
            .values()
            .flat_map(|by_indicator| by_indicator.values())
            .map(Vec::len)
            .sum();
        world + countries
    }
}

/// A headline figure shown at the top of the report.
#[derive(Debug, Clone, Serialize)]
pub struct HeadlineCard {
    pub title: String,
    /// Formatted value, `N/A` when unavailable.
    pub value: String,
    /// Year of the value, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
}

/// One point of the world trend section.
#[derive(Debug, Clone, Serialize)]
pub struct TrendPoint {
    pub year: String,
    pub value: f64,
}

/// One row of the per-year country table.
#[derive(Debug, Clone, Serialize)]
pub struct CountryRow {
    pub country: String,
    /// Indicator name -> formatted values for the selected year.
    pub cells: BTreeMap<String, String>,
}

/// One row of the stacked comparison (year -> value per country).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StackedRow {
    pub year: String,
    pub values: BTreeMap<String, f64>,
}

/// Metadata about the fetch that produced the report.
#[derive(Debug, Clone, Serialize)]
pub struct ReportMetadata {
    pub api_url: String,
    pub generated_at: DateTime<Utc>,
    pub start_year: i32,
    pub end_year: i32,
    pub countries: Vec<String>,
    pub indicators: Vec<String>,
    pub generation: u64,
    pub status: String,
    pub observations: usize,
    pub duration_seconds: f64,
}

/// The complete dashboard report.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardReport {
    pub metadata: ReportMetadata,
    pub headlines: Vec<HeadlineCard>,
    pub world_trend: Vec<TrendPoint>,
    /// Year the country table is filtered to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_year: Option<String>,
    pub available_years: Vec<String>,
    pub country_table: Vec<CountryRow>,
    /// Indicator name used for the stacked comparison.
    pub compare_indicator: String,
    pub stacked: Vec<StackedRow>,
    /// Error or no-data message, when the fetch did not succeed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}
