//! Tool call dispatch
//!
//! Resolves a tool name against the registry, validates arguments, runs the
//! matching fetcher and wraps its outcome in a [`ToolResult`].

use std::sync::Arc;
use std::time::Instant;

use coinscope_protocol::{ToolDescriptor, ToolResult};
use coinscope_utils::{CoinscopeError, Result};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::error::DispatchError;
use super::tools::{ToolKind, ToolRegistry};
use super::validate::validate;
use crate::config::AppConfig;
use crate::fetchers::{FetchOutcome, MentionFetcher, PriceFetcher};
use crate::observability::Metrics;
use crate::upstream::{HttpRequester, Requester};

/// Fetchers for the enabled tools
#[derive(Debug, Clone, Default)]
pub struct FetcherSet {
    pub price: Option<PriceFetcher>,
    pub mentions: Option<MentionFetcher>,
}

impl FetcherSet {
    pub fn with_price(mut self, fetcher: PriceFetcher) -> Self {
        self.price = Some(fetcher);
        self
    }

    pub fn with_mentions(mut self, fetcher: MentionFetcher) -> Self {
        self.mentions = Some(fetcher);
        self
    }

    /// Build fetchers for the configured tools
    ///
    /// Fails if the mention tool is enabled without a credential.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let mut set = FetcherSet::default();

        for kind in config.enabled_tools() {
            match kind {
                ToolKind::GetCoinPrice => {
                    set.price = Some(PriceFetcher::new(&config.upstream.price_base_url));
                }
                ToolKind::SearchTwitterMentions => {
                    let key = config
                        .upstream
                        .mentions_api_key
                        .clone()
                        .filter(|key| !key.is_blank())
                        .ok_or_else(|| {
                            CoinscopeError::config("search_twitter_mentions requires an API key")
                        })?;
                    set.mentions = Some(MentionFetcher::new(
                        &config.upstream.mentions_base_url,
                        key,
                    ));
                }
            }
        }

        Ok(set)
    }

    fn kinds(&self) -> Vec<ToolKind> {
        let mut kinds = Vec::new();
        if self.price.is_some() {
            kinds.push(ToolKind::GetCoinPrice);
        }
        if self.mentions.is_some() {
            kinds.push(ToolKind::SearchTwitterMentions);
        }
        kinds
    }
}

/// Validated, typed arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolCall {
    CoinPrice { coin_id: String },
    Mentions { keywords: Vec<String> },
}

impl ToolCall {
    /// Convert a validated argument map
    fn from_arguments(kind: ToolKind, arguments: &Map<String, Value>) -> Self {
        match kind {
            ToolKind::GetCoinPrice => ToolCall::CoinPrice {
                coin_id: arguments
                    .get("coin_id")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
            },
            ToolKind::SearchTwitterMentions => ToolCall::Mentions {
                keywords: arguments
                    .get("keywords")
                    .and_then(Value::as_array)
                    .map(|items| {
                        items
                            .iter()
                            .filter_map(Value::as_str)
                            .map(String::from)
                            .collect()
                    })
                    .unwrap_or_default(),
            },
        }
    }
}

/// Shared, read-only tool dispatcher
pub struct Dispatcher {
    registry: ToolRegistry,
    fetchers: FetcherSet,
    requester: Arc<dyn Requester>,
}

impl Dispatcher {
    /// The registry lists exactly the tools that have a fetcher
    pub fn new(fetchers: FetcherSet, requester: Arc<dyn Requester>) -> Self {
        Self {
            registry: ToolRegistry::new(&fetchers.kinds()),
            fetchers,
            requester,
        }
    }

    /// Production dispatcher backed by reqwest
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let fetchers = FetcherSet::from_config(config)?;
        let requester = HttpRequester::new(&config.upstream)?;
        Ok(Self::new(fetchers, Arc::new(requester)))
    }

    pub fn list_tools(&self) -> &[ToolDescriptor] {
        self.registry.list_tools()
    }

    /// Run one tool call
    ///
    /// Caller mistakes come back as `Err` before any upstream request is
    /// made. Upstream trouble is an ordinary `Ok` result.
    pub async fn call_tool(
        &self,
        name: &str,
        arguments: &Value,
    ) -> std::result::Result<ToolResult, DispatchError> {
        let call = self.prepare(name, arguments).inspect_err(|e| {
            Metrics::global().record_rejection();
            warn!(tool = name, error = %e, "Tool call rejected");
        })?;

        let started = Instant::now();
        let (kind, outcome) = self.run(call).await;
        let elapsed = started.elapsed();

        Metrics::global().record_fetch(&outcome, elapsed);
        debug!(tool = %kind, ?elapsed, failure = outcome.is_failure(), "Tool call finished");

        Ok(render(kind, outcome))
    }

    fn prepare(&self, name: &str, arguments: &Value) -> std::result::Result<ToolCall, DispatchError> {
        let (kind, descriptor) = self
            .registry
            .lookup(name)
            .ok_or_else(|| DispatchError::UnknownTool(name.to_string()))?;

        let empty = Map::new();
        let arguments = match arguments {
            Value::Null => &empty,
            Value::Object(map) => map,
            other => {
                return Err(DispatchError::InvalidParams(format!(
                    "arguments must be an object, got {}",
                    json_type(other)
                )))
            }
        };

        validate(&descriptor.input_schema, arguments)?;
        Ok(ToolCall::from_arguments(kind, arguments))
    }

    async fn run(&self, call: ToolCall) -> (ToolKind, FetchOutcome) {
        let requester = self.requester.as_ref();
        match call {
            ToolCall::CoinPrice { coin_id } => {
                let outcome = match &self.fetchers.price {
                    Some(fetcher) => fetcher.fetch(requester, &coin_id).await,
                    None => unreachable_fetcher(ToolKind::GetCoinPrice),
                };
                (ToolKind::GetCoinPrice, outcome)
            }
            ToolCall::Mentions { keywords } => {
                let outcome = match &self.fetchers.mentions {
                    Some(fetcher) => fetcher.fetch(requester, &keywords).await,
                    None => unreachable_fetcher(ToolKind::SearchTwitterMentions),
                };
                (ToolKind::SearchTwitterMentions, outcome)
            }
        }
    }
}

// The registry is built from the fetcher set, so a registered tool always
// has a fetcher. Kept total rather than panicking.
fn unreachable_fetcher(kind: ToolKind) -> FetchOutcome {
    warn!(tool = %kind, "No fetcher configured for registered tool");
    FetchOutcome::TransportError {
        message: format!("{} is not configured", kind),
    }
}

/// Wrap a fetch outcome in the response envelope
pub fn render(kind: ToolKind, outcome: FetchOutcome) -> ToolResult {
    let text = match outcome {
        FetchOutcome::Success(payload) => payload.to_string(),
        FetchOutcome::Empty => kind.empty_payload().to_string(),
        FetchOutcome::UpstreamError { status } => format!("upstream error: HTTP {}", status),
        FetchOutcome::TransportError { message } => format!("transport error: {}", message),
        FetchOutcome::Malformed { reason } => format!("malformed upstream response: {}", reason),
    };
    ToolResult::text(text)
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ApiKey, Profile};
    use crate::testing::{FailingRequester, StaticRequester};
    use serde_json::json;

    fn price_only(requester: Arc<dyn Requester>) -> Dispatcher {
        Dispatcher::new(
            FetcherSet::default().with_price(PriceFetcher::new("http://mock/api/v3")),
            requester,
        )
    }

    fn both(requester: Arc<dyn Requester>) -> Dispatcher {
        Dispatcher::new(
            FetcherSet::default()
                .with_price(PriceFetcher::new("http://mock/api/v3"))
                .with_mentions(MentionFetcher::new("http://mock", ApiKey::new("k"))),
            requester,
        )
    }

    #[tokio::test]
    async fn test_price_success() {
        let dispatcher = price_only(Arc::new(StaticRequester::ok(r#"{"bitcoin":{"usd":50000}}"#)));

        let result = dispatcher
            .call_tool("get_coin_price", &json!({"coin_id": "bitcoin"}))
            .await
            .unwrap();

        assert_eq!(result.first_text(), Some(r#"{"price":50000}"#));
        assert_eq!(result.is_error, None);
    }

    #[tokio::test]
    async fn test_price_empty_renders_null() {
        let dispatcher = price_only(Arc::new(StaticRequester::ok("{}")));

        let result = dispatcher
            .call_tool("get_coin_price", &json!({"coin_id": "nothing"}))
            .await
            .unwrap();

        assert_eq!(result.first_text(), Some(r#"{"price":null}"#));
    }

    #[tokio::test]
    async fn test_upstream_error_is_ordinary_result() {
        let dispatcher = price_only(Arc::new(StaticRequester::new(500, "")));

        let result = dispatcher
            .call_tool("get_coin_price", &json!({"coin_id": "bitcoin"}))
            .await
            .unwrap();

        assert_eq!(result.first_text(), Some("upstream error: HTTP 500"));
        assert_eq!(result.is_error, None);
    }

    #[tokio::test]
    async fn test_transport_error_is_ordinary_result() {
        let dispatcher = price_only(Arc::new(FailingRequester));

        let result = dispatcher
            .call_tool("get_coin_price", &json!({"coin_id": "bitcoin"}))
            .await
            .unwrap();

        assert!(result.first_text().unwrap().starts_with("transport error: "));
    }

    #[tokio::test]
    async fn test_missing_argument_makes_no_request() {
        let requester = Arc::new(StaticRequester::ok("{}"));
        let dispatcher = price_only(requester.clone());

        let err = dispatcher
            .call_tool("get_coin_price", &json!({}))
            .await
            .unwrap_err();

        assert_eq!(
            err,
            DispatchError::MissingArgument {
                field: "coin_id".into()
            }
        );
        assert_eq!(requester.calls(), 0);
    }

    #[tokio::test]
    async fn test_null_arguments_treated_as_empty() {
        let dispatcher = price_only(Arc::new(StaticRequester::ok("{}")));

        let err = dispatcher
            .call_tool("get_coin_price", &Value::Null)
            .await
            .unwrap_err();

        assert!(matches!(err, DispatchError::MissingArgument { .. }));
    }

    #[tokio::test]
    async fn test_non_object_arguments() {
        let dispatcher = price_only(Arc::new(StaticRequester::ok("{}")));

        let err = dispatcher
            .call_tool("get_coin_price", &json!(["bitcoin"]))
            .await
            .unwrap_err();

        assert!(matches!(err, DispatchError::InvalidParams(_)));
    }

    #[tokio::test]
    async fn test_wrong_argument_type() {
        let requester = Arc::new(StaticRequester::ok("{}"));
        let dispatcher = price_only(requester.clone());

        let err = dispatcher
            .call_tool("get_coin_price", &json!({"coin_id": 7}))
            .await
            .unwrap_err();

        assert!(matches!(err, DispatchError::InvalidArgument { .. }));
        assert_eq!(requester.calls(), 0);
    }

    #[tokio::test]
    async fn test_unknown_and_disabled_tools() {
        let requester = Arc::new(StaticRequester::ok("[]"));
        let dispatcher = price_only(requester.clone());

        let err = dispatcher
            .call_tool("get_weather", &json!({}))
            .await
            .unwrap_err();
        assert_eq!(err, DispatchError::UnknownTool("get_weather".into()));

        let err = dispatcher
            .call_tool("search_twitter_mentions", &json!({"keywords": ["btc"]}))
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::UnknownTool(_)));
        assert_eq!(requester.calls(), 0);
    }

    #[tokio::test]
    async fn test_mentions_success() {
        let requester = Arc::new(StaticRequester::ok(r#"[{"id":1}]"#));
        let dispatcher = both(requester.clone());

        let result = dispatcher
            .call_tool("search_twitter_mentions", &json!({"keywords": ["btc", "eth"]}))
            .await
            .unwrap();

        assert_eq!(result.first_text(), Some(r#"[{"id":1}]"#));
        assert_eq!(
            requester.last_request().unwrap().query_value("keywords"),
            Some("btc,eth")
        );
    }

    #[test]
    fn test_registry_follows_fetchers() {
        let requester: Arc<dyn Requester> = Arc::new(FailingRequester);

        let names: Vec<String> = both(requester.clone())
            .list_tools()
            .iter()
            .map(|t| t.name.clone())
            .collect();
        assert_eq!(names, ["get_coin_price", "search_twitter_mentions"]);

        assert_eq!(price_only(requester).list_tools().len(), 1);
    }

    #[test]
    fn test_fetchers_from_config() {
        let mut config = AppConfig::default();
        let set = FetcherSet::from_config(&config).unwrap();
        assert!(set.price.is_some());
        assert!(set.mentions.is_none());

        config.server.profile = Profile::Multi;
        assert!(FetcherSet::from_config(&config).is_err());

        config.upstream.mentions_api_key = Some(ApiKey::new("k"));
        let set = FetcherSet::from_config(&config).unwrap();
        assert!(set.mentions.is_some());
    }

    #[test]
    fn test_render_diagnostics() {
        let render_text = |outcome| {
            render(ToolKind::GetCoinPrice, outcome)
                .first_text()
                .map(String::from)
                .unwrap()
        };

        assert_eq!(
            render_text(FetchOutcome::TransportError {
                message: "request timed out".into()
            }),
            "transport error: request timed out"
        );
        assert_eq!(
            render_text(FetchOutcome::Malformed {
                reason: "expected value".into()
            }),
            "malformed upstream response: expected value"
        );
        assert_eq!(
            render(ToolKind::SearchTwitterMentions, FetchOutcome::Empty).first_text(),
            Some("[]")
        );
    }
}
