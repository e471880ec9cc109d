//! HTTP retrieval with reqwest.

use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::header::{RANGE, USER_AGENT};
use tracing::info;

use crate::config::FetchConfig;
use crate::error::{EtlError, Result};

use super::{Body, FetchOutcome, Fetcher, RangeSource, download_resumable};

/// Downloads over HTTP(S), resuming with `Range` requests.
pub struct HttpFetcher {
    client: Client,
    config: FetchConfig,
}

impl HttpFetcher {
    /// Create a fetcher with default settings.
    pub fn new() -> Result<Self> {
        Self::with_config(FetchConfig::default())
    }

    /// Create a fetcher with custom settings.
    pub fn with_config(config: FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| EtlError::Config(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client, config })
    }
}

impl RangeSource for HttpFetcher {
    fn open(&self, url: &str, offset: u64) -> Result<Body> {
        let mut request = self
            .client
            .get(url)
            .header(USER_AGENT, concat!("owid-etl/", env!("CARGO_PKG_VERSION")));
        if offset > 0 {
            request = request.header(RANGE, format!("bytes={}-", offset));
        }

        let response = request.send().map_err(|e| EtlError::Http {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(EtlError::Http {
                url: url.to_string(),
                message: format!("server returned {}", status),
            });
        }

        Ok(Body {
            resumed: status == StatusCode::PARTIAL_CONTENT,
            reader: Box::new(response),
        })
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<FetchOutcome> {
        info!(url, "downloading");
        download_resumable(self, url, &self.config)
    }
}
