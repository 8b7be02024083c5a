//! Indicator fetching from the World Bank API.
//!
//! One request is issued per indicator, with every country joined into
//! the same query and the whole year range requested at once. Responses
//! are concatenated in indicator order. The first failed request aborts
//! the fetch and nothing partial is returned.

pub mod client;
pub mod page;

pub use client::{HttpTransport, Transport};

use crate::error::FetchError;
use crate::models::Observation;
use futures::stream::{self, StreamExt, TryStreamExt};
use tracing::{debug, info};

/// Default API root.
pub const DEFAULT_API_URL: &str = "https://api.worldbank.org/v2";

/// Records requested per call; only the first page is ever read.
pub const DEFAULT_PER_PAGE: u32 = 1000;

/// Parameters of one fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub countries: Vec<String>,
    pub indicators: Vec<String>,
    pub start_year: i32,
    pub end_year: i32,
}

impl FetchRequest {
    /// Request covering `[current_year - range_years, current_year]`.
    pub fn for_range(
        countries: Vec<String>,
        indicators: Vec<String>,
        range_years: u32,
        current_year: i32,
    ) -> Self {
        Self {
            countries,
            indicators,
            start_year: current_year - range_years as i32,
            end_year: current_year,
        }
    }
}

/// Fetches indicator pages through a [`Transport`].
pub struct Fetcher<T> {
    transport: T,
    base_url: String,
    per_page: u32,
    concurrency: usize,
}

impl<T: Transport> Fetcher<T> {
    pub fn new(transport: T, base_url: impl Into<String>) -> Self {
        Self {
            transport,
            base_url: base_url.into(),
            per_page: DEFAULT_PER_PAGE,
            concurrency: 1,
        }
    }

    pub fn with_per_page(mut self, per_page: u32) -> Self {
        self.per_page = per_page;
        self
    }

    /// Number of indicator requests allowed in flight at once.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// URL for a single indicator request.
    pub fn indicator_url(&self, request: &FetchRequest, indicator: &str) -> String {
        format!(
            "{}/country/{}/indicator/{}?date={}:{}&format=json&per_page={}",
            self.base_url.trim_end_matches('/'),
            request.countries.join(";"),
            indicator,
            request.start_year,
            request.end_year,
            self.per_page
        )
    }

    /// All URLs a fetch would hit, in indicator order.
    pub fn request_urls(&self, request: &FetchRequest) -> Vec<String> {
        request
            .indicators
            .iter()
            .map(|indicator| self.indicator_url(request, indicator))
            .collect()
    }

    /// Fetch every indicator and concatenate the observations.
    pub async fn fetch(&self, request: &FetchRequest) -> Result<Vec<Observation>, FetchError> {
        info!(
            "Fetching {} indicators for {} countries ({}-{})",
            request.indicators.len(),
            request.countries.len(),
            request.start_year,
            request.end_year
        );

        let transport = &self.transport;
        let pages: Vec<Vec<Observation>> = stream::iter(self.request_urls(request))
            .map(|url| async move {
                let body = transport.get_json(&url).await?;
                let observations = page::parse_page(&url, body)?;
                debug!("{} observations from {}", observations.len(), url);
                Ok::<_, FetchError>(observations)
            })
            .buffered(self.concurrency)
            .try_collect()
            .await?;

        let observations: Vec<Observation> = pages.into_iter().flatten().collect();
        info!("Fetched {} observations", observations.len());

        Ok(observations)
    }
}
