//! HTTP transport for the statistics API.

use crate::error::FetchError;
use serde_json::Value;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// Something that can GET a URL and hand back its JSON body.
pub trait Transport {
    fn get_json(&self, url: &str) -> impl Future<Output = Result<Value, FetchError>> + Send;
}

/// `reqwest`-backed transport.
pub struct HttpTransport {
    client: reqwest::Client,
    timeout_seconds: Option<u64>,
}

impl HttpTransport {
    /// Create a transport. No timeout is applied unless one is given.
    pub fn new(timeout_seconds: Option<u64>) -> Result<Self, FetchError> {
        let mut builder = reqwest::Client::builder()
            .user_agent(concat!("popdop/", env!("CARGO_PKG_VERSION")));

        if let Some(seconds) = timeout_seconds {
            builder = builder.timeout(Duration::from_secs(seconds));
        }

        let client = builder
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;

        Ok(Self {
            client,
            timeout_seconds,
        })
    }
}

impl Transport for HttpTransport {
    async fn get_json(&self, url: &str) -> Result<Value, FetchError> {
        debug!("GET {}", url);

        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout {
                    url: url.to_string(),
                    seconds: self.timeout_seconds.unwrap_or_default(),
                }
            } else if e.is_connect() {
                FetchError::Connect {
                    url: url.to_string(),
                }
            } else {
                FetchError::Transport {
                    url: url.to_string(),
                    message: e.to_string(),
                }
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.json::<Value>().await.map_err(|e| FetchError::Decode {
            url: url.to_string(),
            message: e.to_string(),
        })
    }
}
