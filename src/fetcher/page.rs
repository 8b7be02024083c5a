//! Parsing of the API's `[metadata, data]` response envelope.

use crate::error::FetchError;
use crate::models::Observation;
use serde_json::Value;
use tracing::{debug, warn};

/// Extract observations from the first page of a response.
///
/// Only the first page is read, even when the metadata reports more.
/// An API error envelope or a `null` data element yields no observations.
pub fn parse_page(url: &str, body: Value) -> Result<Vec<Observation>, FetchError> {
    let Value::Array(mut parts) = body else {
        return Err(FetchError::Decode {
            url: url.to_string(),
            message: "expected a JSON array envelope".to_string(),
        });
    };

    if let Some(meta) = parts.first() {
        if let Some(message) = meta.get("message") {
            warn!("API reported an error for {}: {}", url, message);
            return Ok(Vec::new());
        }

        let pages = meta.get("pages").and_then(Value::as_u64).unwrap_or(1);
        if pages > 1 {
            let total = meta.get("total").and_then(Value::as_u64).unwrap_or(0);
            warn!(
                "Response for {} has {} pages ({} records); only the first page is used",
                url, pages, total
            );
        }
    }

    let records = match parts.get_mut(1).map(Value::take) {
        Some(Value::Array(records)) => records,
        Some(Value::Null) | None => {
            debug!("No data page in response for {}", url);
            return Ok(Vec::new());
        }
        Some(other) => {
            warn!("Unexpected data page type for {}: {}", url, other);
            return Ok(Vec::new());
        }
    };

    let mut observations = Vec::with_capacity(records.len());
    for record in records {
        match serde_json::from_value::<Observation>(record) {
            Ok(observation) => observations.push(observation),
            Err(e) => debug!("Skipping malformed record from {}: {}", url, e),
        }
    }

    Ok(observations)
}
