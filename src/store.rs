//! Dashboard state store.
//!
//! The store is the only writer of aggregated state. Every fetch gets a
//! generation number; results for anything but the newest generation are
//! dropped. Readers take immutable snapshots.

use crate::analysis::aggregate_observations;
use crate::error::FetchError;
use crate::models::{AggregatedSeries, CountrySeries, Observation, WorldSeries};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Lifecycle of the current fetch generation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FetchStatus {
    /// Nothing requested yet.
    #[default]
    Idle,
    /// A fetch is in flight.
    Loading,
    /// Data was fetched and aggregated.
    Ready,
    /// The fetch succeeded but returned no observations.
    NoData,
    /// The fetch failed with the given message.
    Failed(String),
}

impl fmt::Display for FetchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchStatus::Idle => write!(f, "idle"),
            FetchStatus::Loading => write!(f, "loading"),
            FetchStatus::Ready => write!(f, "ready"),
            FetchStatus::NoData => write!(f, "no data"),
            FetchStatus::Failed(_) => write!(f, "failed"),
        }
    }
}

/// Message shown when a fetch returns nothing.
pub const NO_DATA_MESSAGE: &str = "No data received";

/// Immutable view of the store at one point in time.
#[derive(Debug, Clone, Default)]
pub struct DashboardSnapshot {
    pub generation: u64,
    pub status: FetchStatus,
    pub series: AggregatedSeries,
}

impl DashboardSnapshot {
    #[allow(dead_code)] // Reader API; the CLI only inspects finished snapshots
    pub fn is_loading(&self) -> bool {
        self.status == FetchStatus::Loading
    }

    /// Failure message, if the last fetch failed.
    pub fn error(&self) -> Option<&str> {
        match &self.status {
            FetchStatus::Failed(message) => Some(message.as_str()),
            _ => None,
        }
    }

    #[allow(dead_code)] // Reader API
    pub fn world(&self) -> &WorldSeries {
        &self.series.world
    }

    pub fn countries(&self) -> &CountrySeries {
        &self.series.countries
    }
}

/// Handle identifying the fetch a result belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    generation: u64,
}

impl FetchTicket {
    #[allow(dead_code)] // Reader API
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Single-writer store for aggregated dashboard data.
pub struct DashboardStore {
    world_id: String,
    current: Arc<DashboardSnapshot>,
}

impl DashboardStore {
    /// Create an idle store that treats `world_id` as the world aggregate.
    pub fn new(world_id: impl Into<String>) -> Self {
        Self {
            world_id: world_id.into(),
            current: Arc::new(DashboardSnapshot::default()),
        }
    }

    /// Start a new fetch generation.
    ///
    /// Clears both maps and any error before a response arrives.
    pub fn begin_fetch(&mut self) -> FetchTicket {
        let generation = self.current.generation + 1;
        self.current = Arc::new(DashboardSnapshot {
            generation,
            status: FetchStatus::Loading,
            series: AggregatedSeries::default(),
        });
        debug!("Began fetch generation {}", generation);
        FetchTicket { generation }
    }

    /// Apply the outcome of a fetch.
    ///
    /// Returns `false` and leaves state untouched when `ticket` is stale.
    pub fn complete(
        &mut self,
        ticket: FetchTicket,
        result: Result<Vec<Observation>, FetchError>,
    ) -> bool {
        if ticket.generation != self.current.generation {
            warn!(
                "Discarding stale result for generation {} (current is {})",
                ticket.generation, self.current.generation
            );
            return false;
        }

        let (status, series) = match result {
            Ok(observations) => {
                let series = aggregate_observations(&observations, &self.world_id);
                if series.is_empty() {
                    info!("Fetch generation {} returned no data", ticket.generation);
                    (FetchStatus::NoData, series)
                } else {
                    info!(
                        "Fetch generation {} ready: {} world series, {} countries",
                        ticket.generation,
                        series.world.len(),
                        series.countries.len()
                    );
                    (FetchStatus::Ready, series)
                }
            }
            Err(e) => {
                warn!("Fetch generation {} failed: {}", ticket.generation, e);
                if let Some(url) = e.url() {
                    debug!("Failed request: {}", url);
                }
                (FetchStatus::Failed(e.to_string()), AggregatedSeries::default())
            }
        };

        self.current = Arc::new(DashboardSnapshot {
            generation: ticket.generation,
            status,
            series,
        });
        true
    }

    /// Current state for readers.
    pub fn snapshot(&self) -> Arc<DashboardSnapshot> {
        Arc::clone(&self.current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::WORLD_AGGREGATE_ID;

    fn observations() -> Vec<Observation> {
        vec![
            Observation::new("SP.POP.TOTL", WORLD_AGGREGATE_ID, "2023", Some(8.0e9)),
            Observation::new("SP.POP.TOTL", "CHN", "2023", Some(1.4e9)),
        ]
    }

    #[test]
    fn test_new_store_is_idle() {
        let store = DashboardStore::new(WORLD_AGGREGATE_ID);
        let snapshot = store.snapshot();
        assert_eq!(snapshot.status, FetchStatus::Idle);
        assert_eq!(snapshot.generation, 0);
        assert!(snapshot.series.is_empty());
    }

    #[test]
    fn test_begin_fetch_clears_state() {
        let mut store = DashboardStore::new(WORLD_AGGREGATE_ID);
        let ticket = store.begin_fetch();
        store.complete(ticket, Ok(observations()));
        assert!(!store.snapshot().series.is_empty());

        let next = store.begin_fetch();
        let snapshot = store.snapshot();
        assert_eq!(next.generation(), 2);
        assert!(snapshot.is_loading());
        assert!(snapshot.world().is_empty());
        assert!(snapshot.countries().is_empty());
        assert_eq!(snapshot.error(), None);
    }

    #[test]
    fn test_complete_ready() {
        let mut store = DashboardStore::new(WORLD_AGGREGATE_ID);
        let ticket = store.begin_fetch();
        assert!(store.complete(ticket, Ok(observations())));

        let snapshot = store.snapshot();
        assert_eq!(snapshot.status, FetchStatus::Ready);
        assert_eq!(snapshot.world().len(), 1);
        assert!(snapshot.countries().contains_key("CHN"));
    }

    #[test]
    fn test_empty_result_is_no_data_not_error() {
        let mut store = DashboardStore::new(WORLD_AGGREGATE_ID);
        let ticket = store.begin_fetch();
        store.complete(ticket, Ok(Vec::new()));

        let snapshot = store.snapshot();
        assert_eq!(snapshot.status, FetchStatus::NoData);
        assert_eq!(snapshot.error(), None);
        assert!(!snapshot.is_loading());
    }

    #[test]
    fn test_failure_wipes_data() {
        let mut store = DashboardStore::new(WORLD_AGGREGATE_ID);
        let ticket = store.begin_fetch();
        store.complete(
            ticket,
            Err(FetchError::Status {
                url: "https://api.example".to_string(),
                status: 503,
            }),
        );

        let snapshot = store.snapshot();
        assert!(snapshot.error().unwrap().contains("503"));
        assert!(snapshot.series.is_empty());
    }

    #[test]
    fn test_stale_result_is_discarded() {
        let mut store = DashboardStore::new(WORLD_AGGREGATE_ID);
        let old = store.begin_fetch();
        let new = store.begin_fetch();

        assert!(store.complete(new, Ok(Vec::new())));
        assert!(!store.complete(old, Ok(observations())));

        let snapshot = store.snapshot();
        assert_eq!(snapshot.generation, 2);
        assert_eq!(snapshot.status, FetchStatus::NoData);
    }

    #[test]
    fn test_snapshots_are_immutable() {
        let mut store = DashboardStore::new(WORLD_AGGREGATE_ID);
        let ticket = store.begin_fetch();
        store.complete(ticket, Ok(observations()));
        let before = store.snapshot();

        store.begin_fetch();
        assert_eq!(before.status, FetchStatus::Ready);
        assert!(!before.series.is_empty());
    }
}
