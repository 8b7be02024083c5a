//! Derived metrics computed from aggregated series.
//!
//! Two year-over-year helpers exist on purpose. `year_over_year_delta`
//! trusts the order the aggregator appended entries in (the API returns
//! the most recent year first), while `calendar_year_over_year_delta`
//! sorts by year before comparing. They agree on well-ordered input and
//! diverge otherwise; both are pinned by tests.

use crate::models::{CountrySeries, Observation, StackedRow};
use std::cmp::Reverse;
use std::collections::{BTreeMap, HashSet};

/// Most recent observation that carries a value.
///
/// Sorts by numeric year, newest first (unparsable years last), and returns
/// the first entry whose value is present.
pub fn latest_available(series: &[Observation]) -> Option<&Observation> {
    let mut sorted: Vec<&Observation> = series.iter().collect();
    sorted.sort_by_key(|o| Reverse(o.year()));
    sorted.into_iter().find(|o| o.value.is_some())
}

/// Difference between the first two entries in insertion order.
///
/// Returns `series[0] - series[1]`, or `None` with fewer than two entries
/// or when either value is absent.
pub fn year_over_year_delta(series: &[Observation]) -> Option<f64> {
    match series {
        [latest, previous, ..] => Some(latest.value? - previous.value?),
        _ => None,
    }
}

/// Difference between the two newest entries by numeric year.
pub fn calendar_year_over_year_delta(series: &[Observation]) -> Option<f64> {
    if series.len() < 2 {
        return None;
    }

    let mut sorted: Vec<&Observation> = series.iter().collect();
    sorted.sort_by_key(|o| Reverse(o.year()));
    Some(sorted[0].value? - sorted[1].value?)
}

/// Last `n` entries of the series, newest-appended first.
pub fn trend_points(series: &[Observation], n: usize) -> Vec<&Observation> {
    let start = series.len().saturating_sub(n);
    series[start..].iter().rev().collect()
}

/// Distinct years across every country series, in first-seen order.
pub fn available_years(countries: &CountrySeries) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut years = Vec::new();

    for observation in countries
        .values()
        .flat_map(|by_indicator| by_indicator.values())
        .flatten()
    {
        if seen.insert(observation.date.as_str()) {
            years.push(observation.date.clone());
        }
    }

    years
}

/// Entries of `series` reported for `year`.
pub fn values_for_year<'a>(series: &'a [Observation], year: &str) -> Vec<&'a Observation> {
    series.iter().filter(|o| o.date == year).collect()
}

/// Year-by-country table for one indicator, oldest year first.
///
/// Absent values are shown as zero so every row stacks cleanly.
pub fn stacked_rows(countries: &CountrySeries, indicator: &str) -> Vec<StackedRow> {
    let mut rows: Vec<StackedRow> = Vec::new();

    for (country, by_indicator) in countries {
        let Some(series) = by_indicator.get(indicator) else {
            continue;
        };

        for observation in series {
            let value = observation.value.unwrap_or(0.0);
            match rows.iter_mut().find(|row| row.year == observation.date) {
                Some(row) => {
                    row.values.insert(country.clone(), value);
                }
                None => rows.push(StackedRow {
                    year: observation.date.clone(),
                    values: BTreeMap::from([(country.clone(), value)]),
                }),
            }
        }
    }

    rows.sort_by_key(|row| row.year.trim().parse::<i32>().unwrap_or(i32::MAX));
    rows
}
