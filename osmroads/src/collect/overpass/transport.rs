use std::time::Duration;

use thiserror::Error;

/// Characters of a failed response body kept in the error message
const BODY_SNIPPET_LEN: usize = 256;

/// Failure of a single request attempt; always eligible for retry
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("server returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[cfg(feature = "http")]
    #[error("request failed: {0}")]
    Request(#[source] reqwest::Error),
}

impl TransportError {
    /// Non-2xx status with the body shortened for logging
    pub fn status(status: u16, body: &str) -> Self {
        let mut snippet: String = body.chars().take(BODY_SNIPPET_LEN).collect();
        if snippet.len() < body.len() {
            snippet.push_str("...");
        }
        TransportError::Status {
            status,
            body: snippet,
        }
    }
}

/// Sends one query to the data source and returns the raw response body
pub trait Transport {
    fn post_query(&self, endpoint: &str, query: &str) -> Result<Vec<u8>, TransportError>;
}

/// Waits between attempts
pub trait Sleeper {
    fn sleep(&self, duration: Duration);
}

/// Blocks the calling thread
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Blocking reqwest client posting the query as the `data` form field
#[cfg(feature = "http")]
pub struct HttpTransport {
    client: reqwest::blocking::Client,
    timeout: Duration,
}

#[cfg(feature = "http")]
impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(TransportError::Request)?;
        Ok(HttpTransport { client, timeout })
    }

    fn classify(&self, err: reqwest::Error) -> TransportError {
        if err.is_timeout() {
            TransportError::Timeout(self.timeout)
        } else {
            TransportError::Request(err)
        }
    }
}

#[cfg(feature = "http")]
impl Transport for HttpTransport {
    fn post_query(&self, endpoint: &str, query: &str) -> Result<Vec<u8>, TransportError> {
        let response = self
            .client
            .post(endpoint)
            .form(&[("data", query)])
            .send()
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(TransportError::status(status.as_u16(), &body));
        }

        let bytes = response.bytes().map_err(|e| self.classify(e))?;
        Ok(bytes.to_vec())
    }
}
