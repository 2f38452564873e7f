//! Twitter mention search against the ELFA AI API

use serde_json::Value;
use tracing::{error, info};

use super::{endpoint, FetchOutcome};
use crate::config::ApiKey;
use crate::upstream::{Requester, UpstreamRequest};

const MENTIONS_PATH: &str = "/intelligence/twitter/search/mentions";
const API_KEY_HEADER: &str = "X-API-Key";

#[derive(Debug, Clone)]
pub struct MentionFetcher {
    base_url: String,
    api_key: ApiKey,
}

impl MentionFetcher {
    pub fn new(base_url: impl Into<String>, api_key: ApiKey) -> Self {
        Self {
            base_url: base_url.into(),
            api_key,
        }
    }

    pub fn request(&self, keywords: &[String]) -> UpstreamRequest {
        UpstreamRequest::get(endpoint(&self.base_url, MENTIONS_PATH))
            .query("keywords", keywords.join(","))
            .header(API_KEY_HEADER, self.api_key.expose())
    }

    /// Any JSON body on 200 is passed through untouched, empty lists included
    pub async fn fetch(&self, requester: &dyn Requester, keywords: &[String]) -> FetchOutcome {
        let request = self.request(keywords);
        info!(?keywords, url = %request.url, "Searching Twitter mentions");

        let response = match requester.get(request).await {
            Ok(response) => response,
            Err(e) => {
                error!(?keywords, error = %e, "Mention search request failed");
                return FetchOutcome::TransportError {
                    message: e.to_string(),
                };
            }
        };

        if response.status != 200 {
            error!(?keywords, status = response.status, "Mention search returned an error");
            return FetchOutcome::UpstreamError {
                status: response.status,
            };
        }

        match serde_json::from_str::<Value>(&response.body) {
            Ok(body) => FetchOutcome::Success(body),
            Err(e) => {
                error!(?keywords, error = %e, "Mention search returned a non-JSON body");
                FetchOutcome::Malformed {
                    reason: e.to_string(),
                }
            }
        }
    }
}
