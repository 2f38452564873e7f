//! Outbound HTTP seam
//!
//! Fetchers describe a GET request and hand it to a [`Requester`]. The
//! production requester wraps `reqwest`; tests substitute stubs.

mod http;

pub use http::HttpRequester;

use std::fmt;

/// One outbound GET request
#[derive(Clone, PartialEq, Eq)]
pub struct UpstreamRequest {
    pub url: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
}

impl UpstreamRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            query: Vec::new(),
            headers: Vec::new(),
        }
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// First value of a query parameter
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

// Header values carry credentials.
impl fmt::Debug for UpstreamRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let header_names: Vec<&str> = self.headers.iter().map(|(k, _)| k.as_str()).collect();
        f.debug_struct("UpstreamRequest")
            .field("url", &self.url)
            .field("query", &self.query)
            .field("headers", &header_names)
            .finish()
    }
}

/// Status and raw body of a completed upstream call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamResponse {
    pub status: u16,
    pub body: String,
}

impl UpstreamResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// The request never produced a response
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("{0}")]
    Other(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        let timeout = err.is_timeout();
        let connect = err.is_connect();

        // reqwest errors may echo the full URL; keep only the kind and source
        let detail = std::error::Error::source(&err)
            .map(|source| source.to_string())
            .unwrap_or_else(|| err.without_url().to_string());

        if timeout {
            TransportError::Timeout
        } else if connect {
            TransportError::Connect(detail)
        } else {
            TransportError::Other(detail)
        }
    }
}

/// Performs one upstream GET
#[async_trait::async_trait]
pub trait Requester: Send + Sync {
    async fn get(&self, request: UpstreamRequest) -> Result<UpstreamResponse, TransportError>;
}
