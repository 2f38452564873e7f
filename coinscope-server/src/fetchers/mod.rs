//! Upstream fetchers
//!
//! Each fetcher makes exactly one upstream call and reduces whatever
//! happens to a [`FetchOutcome`]. Expected failures never escape as errors.

mod mentions;
mod price;

pub use mentions::MentionFetcher;
pub use price::PriceFetcher;

use serde_json::Value;

/// Result of one upstream call
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// Payload to hand back to the caller
    Success(Value),
    /// Upstream answered but had nothing for the request
    Empty,
    /// Non-200 status
    UpstreamError { status: u16 },
    /// No response at all
    TransportError { message: String },
    /// 200 with a body that is not JSON
    Malformed { reason: String },
}

impl FetchOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            FetchOutcome::UpstreamError { .. }
                | FetchOutcome::TransportError { .. }
                | FetchOutcome::Malformed { .. }
        )
    }
}

/// Join a base URL and an absolute endpoint path
fn endpoint(base: &str, path: &str) -> String {
    format!("{}{}", base.trim_end_matches('/'), path)
}
