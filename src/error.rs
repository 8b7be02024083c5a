//! Error types for talking to the statistics API.

use thiserror::Error;

/// Failure of a single indicator request. Any of these aborts the whole fetch.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Failed to build HTTP client: {0}")]
    Client(String),

    #[error("Cannot connect to statistics API at {url}")]
    Connect { url: String },

    #[error("Request to {url} timed out after {seconds}s")]
    Timeout { url: String, seconds: u64 },

    #[error("Failed to send request to {url}: {message}")]
    Transport { url: String, message: String },

    #[error("Statistics API returned HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Failed to decode response from {url}: {message}")]
    Decode { url: String, message: String },
}

impl FetchError {
    /// URL of the request that failed, when there was one.
    pub fn url(&self) -> Option<&str> {
        match self {
            FetchError::Client(_) => None,
            FetchError::Connect { url }
            | FetchError::Timeout { url, .. }
            | FetchError::Transport { url, .. }
            | FetchError::Status { url, .. }
            | FetchError::Decode { url, .. } => Some(url),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_message() {
        let err = FetchError::Status {
            url: "https://api.example/x".to_string(),
            status: 502,
        };
        assert_eq!(
            err.to_string(),
            "Statistics API returned HTTP 502 for https://api.example/x"
        );
        assert_eq!(err.url(), Some("https://api.example/x"));
        assert_eq!(FetchError::Client("boom".into()).url(), None);
    }
}
