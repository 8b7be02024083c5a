//! Aggregation and derived metrics.
//!
//! This module reshapes fetched observations into series and computes
//! the figures shown by the dashboard report.

pub mod aggregator;
pub mod metrics;

pub use aggregator::aggregate_observations;
pub use metrics::{
    available_years, calendar_year_over_year_delta, latest_available, stacked_rows, trend_points,
    values_for_year, year_over_year_delta,
};
