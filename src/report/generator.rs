//! Dashboard report generation.
//!
//! Builds a [`DashboardReport`] from a store snapshot and renders it as
//! Markdown or JSON.

use crate::analysis::{
    available_years, calendar_year_over_year_delta, latest_available, stacked_rows, trend_points,
    values_for_year, year_over_year_delta,
};
use crate::catalog::{label_for_code, Indicator};
use crate::config::Config;
use crate::fetcher::FetchRequest;
use crate::models::{
    CountryRow, DashboardReport, HeadlineCard, Observation, ReportMetadata, StackedRow, TrendPoint,
};
use crate::report::format::{format_change, format_number, format_value, NOT_AVAILABLE};
use crate::store::{DashboardSnapshot, FetchStatus, NO_DATA_MESSAGE};
use anyhow::Result;
use chrono::Utc;
use std::collections::BTreeSet;
use tracing::debug;

/// Assemble the report for one fetch generation.
pub fn build_report(
    snapshot: &DashboardSnapshot,
    request: &FetchRequest,
    config: &Config,
    duration_seconds: f64,
) -> DashboardReport {
    let series = &snapshot.series;
    let population = series.world_series(Indicator::TotalPopulation.code());

    let years = available_years(snapshot.countries());
    let selected_year = config
        .report
        .selected_year
        .clone()
        .or_else(|| most_recent_year(&years));

    let country_table = match selected_year {
        Some(ref year) => build_country_table(snapshot, &request.indicators, year),
        None => Vec::new(),
    };

    let message = match snapshot.error() {
        Some(e) => Some(e.to_string()),
        None if snapshot.status == FetchStatus::NoData => Some(NO_DATA_MESSAGE.to_string()),
        None => None,
    };

    DashboardReport {
        metadata: ReportMetadata {
            api_url: config.api.base_url.clone(),
            generated_at: Utc::now(),
            start_year: request.start_year,
            end_year: request.end_year,
            countries: request.countries.clone(),
            indicators: request.indicators.clone(),
            generation: snapshot.generation,
            status: snapshot.status.to_string(),
            observations: series.observation_count(),
            duration_seconds,
        },
        headlines: build_headlines(snapshot),
        world_trend: trend_points(population, config.report.trend_points)
            .into_iter()
            .map(|o| TrendPoint {
                year: o.date.clone(),
                value: o.value.unwrap_or(0.0) / 1e9,
            })
            .collect(),
        selected_year,
        available_years: years,
        country_table,
        compare_indicator: label_for_code(&config.report.compare_indicator),
        stacked: stacked_rows(snapshot.countries(), &config.report.compare_indicator),
        message,
    }
}

fn most_recent_year(years: &[String]) -> Option<String> {
    years
        .iter()
        .filter_map(|y| y.trim().parse::<i32>().ok().map(|n| (n, y)))
        .max_by_key(|(n, _)| *n)
        .map(|(_, y)| y.clone())
}

/// Headline cards computed from the world aggregate.
fn build_headlines(snapshot: &DashboardSnapshot) -> Vec<HeadlineCard> {
    let world = &snapshot.series;
    let latest_card = |title: &str, indicator: Indicator, suffix: &str| {
        let latest = latest_available(world.world_series(indicator.code()));
        HeadlineCard {
            title: title.to_string(),
            value: match latest {
                Some(o) => format!("{}{}", format_value(o.value, indicator.code()), suffix),
                None => NOT_AVAILABLE.to_string(),
            },
            year: latest.map(|o| o.date.clone()),
        }
    };

    let population = world.world_series(Indicator::TotalPopulation.code());
    let change = year_over_year_delta(population);
    if change != calendar_year_over_year_delta(population) {
        debug!("World population series is not newest-first; change uses insertion order");
    }

    vec![
        latest_card("World Population", Indicator::TotalPopulation, ""),
        latest_card("Average Density", Indicator::PopulationDensity, " people/km²"),
        latest_card("Life Expectancy at Birth", Indicator::LifeExpectancy, " yrs"),
        HeadlineCard {
            title: "Change in Last Year".to_string(),
            value: format_change(change),
            year: population.first().map(|o| o.date.clone()),
        },
    ]
}

/// One row per country with every requested indicator for `year`.
fn build_country_table(
    snapshot: &DashboardSnapshot,
    indicators: &[String],
    year: &str,
) -> Vec<CountryRow> {
    snapshot
        .countries()
        .keys()
        .map(|country| CountryRow {
            country: country.clone(),
            cells: indicators
                .iter()
                .map(|code| {
                    let series = snapshot.series.country_series(country, code);
                    (label_for_code(code), join_values(&values_for_year(series, year)))
                })
                .collect(),
        })
        .collect()
}

fn join_values(observations: &[&Observation]) -> String {
    if observations.is_empty() {
        return NOT_AVAILABLE.to_string();
    }
    observations
        .iter()
        .map(|o| format_number(o.value))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &DashboardReport) -> String {
    let mut output = String::new();

    output.push_str("# PopDop Dashboard Report\n\n");
    output.push_str(&generate_metadata_section(&report.metadata));

    if let Some(ref message) = report.message {
        output.push_str(&format!("> ⚠️ **{}**\n\n", message));
    }

    output.push_str(&generate_headline_section(&report.headlines));
    output.push_str(&generate_trend_section(&report.world_trend));
    output.push_str(&generate_country_section(report));
    output.push_str(&generate_stacked_section(&report.compare_indicator, &report.stacked));
    output.push_str(&generate_footer());

    output
}

fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Source:** {}\n", metadata.api_url));
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!(
        "- **Years:** {}-{}\n",
        metadata.start_year, metadata.end_year
    ));
    section.push_str(&format!(
        "- **Countries:** {}\n",
        metadata.countries.join(", ")
    ));
    section.push_str(&format!(
        "- **Indicators:** {}\n",
        metadata
            .indicators
            .iter()
            .map(|code| format!("{} (`{}`)", label_for_code(code), code))
            .collect::<Vec<_>>()
            .join(", ")
    ));
    section.push_str(&format!(
        "- **Status:** {} (generation {})\n",
        metadata.status, metadata.generation
    ));
    section.push_str(&format!("- **Observations:** {}\n", metadata.observations));
    section.push_str(&format!(
        "- **Fetch Duration:** {:.1}s\n",
        metadata.duration_seconds
    ));
    section.push('\n');

    section
}

fn generate_headline_section(headlines: &[HeadlineCard]) -> String {
    let mut section = String::new();

    section.push_str("## World Overview\n\n");
    section.push_str("| Metric | Value | Year |\n");
    section.push_str("|:---|---:|:---:|\n");
    for card in headlines {
        section.push_str(&format!(
            "| {} | {} | {} |\n",
            card.title,
            card.value,
            card.year.as_deref().unwrap_or(NOT_AVAILABLE)
        ));
    }
    section.push('\n');

    section
}

fn generate_trend_section(trend: &[TrendPoint]) -> String {
    let mut section = String::new();

    section.push_str("## World Population Trend\n\n");
    if trend.is_empty() {
        section.push_str("No world population data available.\n\n");
        return section;
    }

    section.push_str("| Year | Population (B) |\n");
    section.push_str("|:---:|---:|\n");
    for point in trend {
        section.push_str(&format!(
            "| {} | {} |\n",
            point.year,
            format_number(Some(point.value))
        ));
    }
    section.push('\n');

    section
}

fn generate_country_section(report: &DashboardReport) -> String {
    let mut section = String::new();

    let Some(ref year) = report.selected_year else {
        section.push_str("## Countries\n\nNo country data available.\n\n");
        return section;
    };

    section.push_str(&format!("## Countries in {}\n\n", year));
    if report.available_years.len() > 1 {
        section.push_str(&format!(
            "*Available years: {}*\n\n",
            report.available_years.join(", ")
        ));
    }

    if report.country_table.is_empty() {
        section.push_str("No country data available.\n\n");
        return section;
    }

    let labels: Vec<String> = report
        .metadata
        .indicators
        .iter()
        .map(|code| label_for_code(code))
        .collect();

    section.push_str("| Country |");
    for label in &labels {
        section.push_str(&format!(" {} |", label));
    }
    section.push('\n');
    section.push_str("|:---|");
    section.push_str(&"---:|".repeat(labels.len()));
    section.push('\n');

    for row in &report.country_table {
        section.push_str(&format!("| {} |", row.country));
        for label in &labels {
            let cell = row.cells.get(label).map(String::as_str).unwrap_or(NOT_AVAILABLE);
            section.push_str(&format!(" {} |", cell));
        }
        section.push('\n');
    }
    section.push('\n');

    section
}

fn generate_stacked_section(indicator: &str, rows: &[StackedRow]) -> String {
    let mut section = String::new();

    section.push_str(&format!("## {} by Country\n\n", indicator));
    if rows.is_empty() {
        section.push_str("No comparison data available.\n\n");
        return section;
    }

    let countries: BTreeSet<&String> = rows.iter().flat_map(|r| r.values.keys()).collect();

    section.push_str("| Year |");
    for country in &countries {
        section.push_str(&format!(" {} |", country));
    }
    section.push('\n');
    section.push_str("|:---:|");
    section.push_str(&"---:|".repeat(countries.len()));
    section.push('\n');

    for row in rows {
        section.push_str(&format!("| {} |", row.year));
        for country in &countries {
            section.push_str(&format!(" {} |", format_number(row.values.get(*country).copied())));
        }
        section.push('\n');
    }
    section.push('\n');

    section
}

fn generate_footer() -> String {
    "---\n\n*Data: World Bank Open Data. Report generated by PopDop.*\n".to_string()
}

/// Generate a JSON report.
pub fn generate_json_report(report: &DashboardReport) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::WORLD_AGGREGATE_ID;
    use crate::error::FetchError;
    use crate::store::DashboardStore;

    const POP: &str = "SP.POP.TOTL";
    const DENSITY: &str = "EN.POP.DNST";

    fn request() -> FetchRequest {
        FetchRequest::for_range(
            vec!["WLD".into(), "CHN".into(), "USA".into()],
            vec![POP.into(), DENSITY.into()],
            5,
            2024,
        )
    }

    fn ready_snapshot() -> DashboardSnapshot {
        let mut store = DashboardStore::new(WORLD_AGGREGATE_ID);
        let ticket = store.begin_fetch();
        store.complete(
            ticket,
            Ok(vec![
                Observation::new(POP, WORLD_AGGREGATE_ID, "2024", None),
                Observation::new(POP, WORLD_AGGREGATE_ID, "2023", Some(8_061_876_001.0)),
                Observation::new(POP, WORLD_AGGREGATE_ID, "2022", Some(7_989_981_520.0)),
                Observation::new(POP, "CHN", "2023", Some(1_410_710_000.0)),
                Observation::new(POP, "USA", "2023", Some(334_914_895.0)),
                Observation::new(POP, "USA", "2022", Some(333_271_411.0)),
                Observation::new(DENSITY, WORLD_AGGREGATE_ID, "2022", Some(61.2)),
                Observation::new(DENSITY, "CHN", "2022", Some(150.3)),
            ]),
        );
        store.snapshot().as_ref().clone()
    }

    #[test]
    fn test_build_report_headlines() {
        let report = build_report(&ready_snapshot(), &request(), &Config::default(), 1.0);

        let population = &report.headlines[0];
        assert_eq!(population.value, "8.06B");
        assert_eq!(population.year.as_deref(), Some("2023"));

        assert_eq!(report.headlines[1].value, "61 people/km²");
        assert_eq!(report.headlines[2].value, "N/A");
        // First two world entries are 2024 (absent) and 2023.
        assert_eq!(report.headlines[3].value, "N/A");
        assert!(report.message.is_none());
    }

    #[test]
    fn test_build_report_country_table_defaults_to_latest_year() {
        let report = build_report(&ready_snapshot(), &request(), &Config::default(), 1.0);

        assert_eq!(report.selected_year.as_deref(), Some("2023"));
        assert_eq!(report.country_table.len(), 2);

        let china = &report.country_table[0];
        assert_eq!(china.country, "CHN");
        assert_eq!(china.cells["Total Population"], "1,410,710,000");
        assert_eq!(china.cells["Population Density"], "N/A");
    }

    #[test]
    fn test_build_report_selected_year_override() {
        let mut config = Config::default();
        config.report.selected_year = Some("2022".to_string());

        let report = build_report(&ready_snapshot(), &request(), &config, 1.0);
        let china = &report.country_table[0];
        assert_eq!(china.cells["Population Density"], "150.3");
    }

    #[test]
    fn test_build_report_trend_and_stacked() {
        let report = build_report(&ready_snapshot(), &request(), &Config::default(), 1.0);

        let years: Vec<&str> = report.world_trend.iter().map(|p| p.year.as_str()).collect();
        assert_eq!(years, vec!["2022", "2023", "2024"]);
        assert_eq!(report.world_trend[2].value, 0.0);

        assert_eq!(report.compare_indicator, "Total Population");
        assert_eq!(report.stacked.len(), 2);
        assert_eq!(report.stacked[0].year, "2022");
    }

    #[test]
    fn test_failed_snapshot_report() {
        let mut store = DashboardStore::new(WORLD_AGGREGATE_ID);
        let ticket = store.begin_fetch();
        store.complete(
            ticket,
            Err(FetchError::Connect {
                url: "https://api.example".into(),
            }),
        );

        let report = build_report(&store.snapshot(), &request(), &Config::default(), 0.2);
        assert!(report.message.unwrap().contains("Cannot connect"));
        assert!(report.country_table.is_empty());
        assert!(report.selected_year.is_none());
        assert_eq!(report.headlines[0].value, "N/A");
    }

    #[test]
    fn test_generate_markdown_report() {
        let report = build_report(&ready_snapshot(), &request(), &Config::default(), 1.0);
        let markdown = generate_markdown_report(&report);

        assert!(markdown.contains("# PopDop Dashboard Report"));
        assert!(markdown.contains("## Metadata"));
        assert!(markdown.contains("## World Overview"));
        assert!(markdown.contains("## Countries in 2023"));
        assert!(markdown.contains("| CHN |"));
        assert!(markdown.contains("## Total Population by Country"));
    }

    #[test]
    fn test_generate_markdown_no_data() {
        let mut store = DashboardStore::new(WORLD_AGGREGATE_ID);
        let ticket = store.begin_fetch();
        store.complete(ticket, Ok(Vec::new()));

        let report = build_report(&store.snapshot(), &request(), &Config::default(), 0.1);
        let markdown = generate_markdown_report(&report);
        assert!(markdown.contains(NO_DATA_MESSAGE));
        assert!(markdown.contains("No world population data available."));
        assert!(markdown.contains("No country data available."));
    }

    #[test]
    fn test_generate_json_report() {
        let report = build_report(&ready_snapshot(), &request(), &Config::default(), 1.0);
        let json = generate_json_report(&report).unwrap();

        assert!(json.contains("\"metadata\""));
        assert!(json.contains("\"headlines\""));
        assert!(json.contains("\"country_table\""));
        assert!(!json.contains("\"message\""));
    }
}
