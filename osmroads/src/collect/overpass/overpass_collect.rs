use std::time::Duration;

use log::{info, warn};
use thiserror::Error;
use url::Url;

use super::elements::RawResponse;
use super::query::build_query;
use super::transport::{Sleeper, ThreadSleeper, Transport, TransportError};
use crate::collect::global_variables::{
    DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_DELAY, DEFAULT_TIMEOUT, OVERPASS_URL,
};
use crate::geo_core::RegionFilter;

/// Fatal outcome of a fetch
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("all {attempts} attempts failed, last error: {last}")]
    Exhausted {
        attempts: u32,
        #[source]
        last: TransportError,
    },
    #[error("invalid Overpass response: {0}")]
    InvalidResponse(#[source] serde_json::Error),
}

/// Endpoint and retry policy
#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub endpoint: String,
    /// Total attempts, including the first one; 0 behaves as 1
    pub max_attempts: u32,
    pub retry_delay: Duration,
    /// Per-attempt ceiling
    pub timeout: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        FetchConfig {
            endpoint: OVERPASS_URL.to_string(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_delay: DEFAULT_RETRY_DELAY,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl FetchConfig {
    /// Default policy against another interpreter endpoint
    pub fn with_endpoint(endpoint: &str) -> Result<Self, url::ParseError> {
        let url = Url::parse(endpoint)?;
        Ok(FetchConfig {
            endpoint: url.into(),
            ..FetchConfig::default()
        })
    }
}

/// Overpass data collection
///
/// Issues one query per attempt and retries transport failures with a fixed
/// delay. A response that arrives but does not carry an `elements` array is
/// not retried.
pub struct OverpassCollect {
    pub config: FetchConfig,
    transport: Box<dyn Transport>,
    sleeper: Box<dyn Sleeper>,
}

impl OverpassCollect {
    /// Collector using the blocking HTTP client and the default config
    #[cfg(feature = "http")]
    pub fn new() -> Result<Self, TransportError> {
        Self::with_config(FetchConfig::default())
    }

    #[cfg(feature = "http")]
    pub fn with_config(config: FetchConfig) -> Result<Self, TransportError> {
        let transport = super::transport::HttpTransport::new(config.timeout)?;
        Ok(Self::with_transport(config, transport, ThreadSleeper))
    }

    pub fn with_transport(
        config: FetchConfig,
        transport: impl Transport + 'static,
        sleeper: impl Sleeper + 'static,
    ) -> Self {
        OverpassCollect {
            config,
            transport: Box::new(transport),
            sleeper: Box::new(sleeper),
        }
    }

    /// Fetch every node, way and relation of `region`
    pub fn fetch(&self, region: &RegionFilter) -> Result<RawResponse, FetchError> {
        self.fetch_tagged(region, None)
    }

    /// Fetch the elements of `region` carrying `required_tag`, or all of them
    pub fn fetch_tagged(
        &self,
        region: &RegionFilter,
        required_tag: Option<&str>,
    ) -> Result<RawResponse, FetchError> {
        let query = build_query(region, required_tag, self.config.timeout);
        let body = self.post_with_retry(&query)?;

        let response = RawResponse::from_slice(&body).map_err(FetchError::InvalidResponse)?;
        if let Some(remark) = &response.remark {
            warn!("Overpass remark: {remark}");
        }
        info!(
            "Received {} elements ({} bytes) for {region}",
            response.elements.len(),
            body.len()
        );
        Ok(response)
    }

    fn post_with_retry(&self, query: &str) -> Result<Vec<u8>, FetchError> {
        let max_attempts = self.config.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            info!(
                "Querying {} (attempt {attempt}/{max_attempts})",
                self.config.endpoint
            );
            match self.transport.post_query(&self.config.endpoint, query) {
                Ok(body) => return Ok(body),
                Err(err) => {
                    warn!("Attempt {attempt}/{max_attempts} failed: {err}");
                    if attempt >= max_attempts {
                        return Err(FetchError::Exhausted {
                            attempts: attempt,
                            last: err,
                        });
                    }
                }
            }
            self.sleeper.sleep(self.config.retry_delay);
            attempt += 1;
        }
    }
}
