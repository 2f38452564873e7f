//! Spot price lookup against the CoinGecko simple price API

use serde_json::{json, Value};
use tracing::{error, info, warn};

use super::{endpoint, FetchOutcome};
use crate::upstream::{Requester, UpstreamRequest};

const PRICE_PATH: &str = "/simple/price";
const VS_CURRENCY: &str = "usd";

#[derive(Debug, Clone)]
pub struct PriceFetcher {
    base_url: String,
}

impl PriceFetcher {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    pub fn request(&self, coin_id: &str) -> UpstreamRequest {
        UpstreamRequest::get(endpoint(&self.base_url, PRICE_PATH))
            .query("ids", coin_id)
            .query("vs_currencies", VS_CURRENCY)
    }

    pub async fn fetch(&self, requester: &dyn Requester, coin_id: &str) -> FetchOutcome {
        let request = self.request(coin_id);
        info!(coin_id, url = %request.url, "Fetching coin price");

        let response = match requester.get(request).await {
            Ok(response) => response,
            Err(e) => {
                error!(coin_id, error = %e, "Price request failed");
                return FetchOutcome::TransportError {
                    message: e.to_string(),
                };
            }
        };

        if response.status != 200 {
            error!(coin_id, status = response.status, "Price API returned an error");
            return FetchOutcome::UpstreamError {
                status: response.status,
            };
        }

        let body: Value = match serde_json::from_str(&response.body) {
            Ok(body) => body,
            Err(e) => {
                error!(coin_id, error = %e, "Price API returned a non-JSON body");
                return FetchOutcome::Malformed {
                    reason: e.to_string(),
                };
            }
        };

        match body
            .get(coin_id)
            .and_then(|coin| coin.get(VS_CURRENCY))
            .filter(|price| price.is_number())
        {
            Some(price) => FetchOutcome::Success(json!({ "price": price })),
            None => {
                warn!(coin_id, "No USD price in response");
                FetchOutcome::Empty
            }
        }
    }
}
