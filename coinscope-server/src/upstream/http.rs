//! reqwest-backed requester

use std::time::Duration;

use coinscope_utils::{CoinscopeError, Result};
use tracing::debug;

use super::{Requester, TransportError, UpstreamRequest, UpstreamResponse};
use crate::config::UpstreamConfig;

/// Production requester
///
/// Idle connections are not pooled, so every call acquires its own
/// connection and releases it when the call ends.
#[derive(Debug, Clone)]
pub struct HttpRequester {
    client: reqwest::Client,
}

impl HttpRequester {
    pub fn new(config: &UpstreamConfig) -> Result<Self> {
        Self::from_builder(client_builder(config))
    }

    fn from_builder(builder: reqwest::ClientBuilder) -> Result<Self> {
        let client = builder
            .build()
            .map_err(|e| CoinscopeError::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

fn client_builder(config: &UpstreamConfig) -> reqwest::ClientBuilder {
    reqwest::Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .pool_max_idle_per_host(0)
}

#[async_trait::async_trait]
impl Requester for HttpRequester {
    async fn get(
        &self,
        request: UpstreamRequest,
    ) -> std::result::Result<UpstreamResponse, TransportError> {
        let mut builder = self.client.get(&request.url).query(&request.query);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        debug!(url = %request.url, status, bytes = body.len(), "Upstream response");
        Ok(UpstreamResponse { status, body })
    }
}
