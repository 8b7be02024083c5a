//! Observation aggregation.
//!
//! Partitions a flat list of observations into world-level and
//! per-country series, keeping the first observation seen for each year.

use crate::models::{AggregatedSeries, Observation};
use tracing::debug;

/// Aggregate observations into world and country series.
///
/// Observations whose country id equals `world_id` go to the world map,
/// everything else to the country map. Within a series an observation is
/// dropped when one with the same `date` was already kept. Values are
/// carried through untouched, absent values included.
pub fn aggregate_observations(observations: &[Observation], world_id: &str) -> AggregatedSeries {
    let mut aggregated = AggregatedSeries::default();
    let mut discarded = 0usize;

    for observation in observations {
        let series = if observation.country_code() == world_id {
            aggregated
                .world
                .entry(observation.indicator_code().to_string())
                .or_default()
        } else {
            aggregated
                .countries
                .entry(observation.country_code().to_string())
                .or_default()
                .entry(observation.indicator_code().to_string())
                .or_default()
        };

        if !push_unique_year(series, observation) {
            discarded += 1;
        }
    }

    debug!(
        "Aggregated {} observations ({} duplicates dropped) into {} world and {} country series",
        observations.len(),
        discarded,
        aggregated.world.len(),
        aggregated.countries.len()
    );

    aggregated
}

/// Append `observation` unless `series` already holds its year.
fn push_unique_year(series: &mut Vec<Observation>, observation: &Observation) -> bool {
    let exists = series.iter().any(|existing| existing.date == observation.date);
    if !exists {
        series.push(observation.clone());
    }
    !exists
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::WORLD_AGGREGATE_ID;
    use std::collections::HashSet;

    const POP: &str = "SP.POP.TOTL";
    const DENSITY: &str = "EN.POP.DNST";

    fn obs(indicator: &str, country: &str, date: &str, value: Option<f64>) -> Observation {
        Observation::new(indicator, country, date, value)
    }

    #[test]
    fn test_empty_input_gives_empty_maps() {
        let aggregated = aggregate_observations(&[], WORLD_AGGREGATE_ID);
        assert!(aggregated.is_empty());
        assert!(aggregated.world.is_empty());
        assert!(aggregated.countries.is_empty());
    }

    #[test]
    fn test_first_seen_year_wins() {
        let input = vec![
            obs(POP, "CHN", "2020", Some(1.0)),
            obs(POP, "CHN", "2021", Some(2.0)),
            obs(POP, "CHN", "2020", Some(99.0)),
        ];

        let aggregated = aggregate_observations(&input, WORLD_AGGREGATE_ID);
        let series = aggregated.country_series("CHN", POP);

        assert_eq!(series.len(), 2);
        assert_eq!(series[0].date, "2020");
        assert_eq!(series[0].value, Some(1.0));
        assert_eq!(series[1].date, "2021");
    }

    #[test]
    fn test_dedup_is_per_group() {
        let input = vec![
            obs(POP, "CHN", "2020", Some(1.0)),
            obs(POP, "IND", "2020", Some(2.0)),
            obs(DENSITY, "CHN", "2020", Some(3.0)),
            obs(POP, WORLD_AGGREGATE_ID, "2020", Some(4.0)),
            obs(DENSITY, WORLD_AGGREGATE_ID, "2020", Some(5.0)),
        ];

        let aggregated = aggregate_observations(&input, WORLD_AGGREGATE_ID);
        assert_eq!(aggregated.observation_count(), 5);
    }

    #[test]
    fn test_no_duplicate_years_in_any_group() {
        let years = ["2019", "2020", "2021"];
        let mut input = Vec::new();
        for round in 0..3 {
            for country in ["CHN", "USA", WORLD_AGGREGATE_ID] {
                for year in years {
                    input.push(obs(POP, country, year, Some(round as f64)));
                }
            }
        }

        let aggregated = aggregate_observations(&input, WORLD_AGGREGATE_ID);
        let mut groups: Vec<&Vec<Observation>> = aggregated.world.values().collect();
        groups.extend(aggregated.countries.values().flat_map(|m| m.values()));

        for group in groups {
            let unique: HashSet<&str> = group.iter().map(|o| o.date.as_str()).collect();
            assert_eq!(unique.len(), group.len());
            assert!(group.iter().all(|o| o.value == Some(0.0)));
        }
    }

    #[test]
    fn test_world_and_countries_are_disjoint() {
        let input = vec![
            obs(POP, WORLD_AGGREGATE_ID, "2022", Some(8.0e9)),
            obs(POP, "USA", "2022", Some(3.3e8)),
            obs(POP, WORLD_AGGREGATE_ID, "2021", Some(7.9e9)),
            obs(POP, "PAK", "2022", Some(2.3e8)),
        ];

        let aggregated = aggregate_observations(&input, WORLD_AGGREGATE_ID);

        assert!(!aggregated.countries.contains_key(WORLD_AGGREGATE_ID));
        assert!(aggregated
            .world
            .values()
            .flatten()
            .all(|o| o.country_code() == WORLD_AGGREGATE_ID));
        assert!(aggregated
            .countries
            .values()
            .flat_map(|m| m.values())
            .flatten()
            .all(|o| o.country_code() != WORLD_AGGREGATE_ID));
        assert_eq!(aggregated.world_series(POP).len(), 2);
        assert_eq!(aggregated.countries.len(), 2);
    }

    #[test]
    fn test_insertion_order_is_kept() {
        let input = vec![
            obs(POP, WORLD_AGGREGATE_ID, "2021", Some(3.0)),
            obs(POP, WORLD_AGGREGATE_ID, "2023", Some(1.0)),
            obs(POP, WORLD_AGGREGATE_ID, "2022", Some(2.0)),
        ];

        let aggregated = aggregate_observations(&input, WORLD_AGGREGATE_ID);
        let dates: Vec<&str> = aggregated
            .world_series(POP)
            .iter()
            .map(|o| o.date.as_str())
            .collect();
        assert_eq!(dates, vec!["2021", "2023", "2022"]);
    }

    #[test]
    fn test_absent_values_are_not_coerced() {
        let input = vec![obs(POP, "IDN", "2023", None)];
        let aggregated = aggregate_observations(&input, WORLD_AGGREGATE_ID);
        assert_eq!(aggregated.country_series("IDN", POP)[0].value, None);
    }

    #[test]
    fn test_aggregation_is_idempotent() {
        let input = vec![
            obs(POP, WORLD_AGGREGATE_ID, "2022", Some(1.0)),
            obs(POP, "CHN", "2022", None),
            obs(POP, "CHN", "2022", Some(5.0)),
        ];

        let first = aggregate_observations(&input, WORLD_AGGREGATE_ID);
        let second = aggregate_observations(&input, WORLD_AGGREGATE_ID);
        assert_eq!(first, second);
    }

    #[test]
    fn test_custom_world_id() {
        let input = vec![obs(POP, "WLD", "2022", Some(1.0))];
        let aggregated = aggregate_observations(&input, "WLD");
        assert_eq!(aggregated.world_series(POP).len(), 1);
        assert!(aggregated.countries.is_empty());
    }
}
