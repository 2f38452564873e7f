//! Tool catalog for coinscope
//!
//! Defines the tools exposed to MCP clients and the registry that decides
//! which of them a running server accepts.

use std::fmt;

use coinscope_protocol::{SchemaNode, ToolDescriptor};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Every tool the gateway knows how to serve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    GetCoinPrice,
    SearchTwitterMentions,
}

impl ToolKind {
    /// Declaration order; the catalog is always listed in this order
    pub const ALL: [ToolKind; 2] = [ToolKind::GetCoinPrice, ToolKind::SearchTwitterMentions];

    /// Wire name
    pub fn name(self) -> &'static str {
        match self {
            ToolKind::GetCoinPrice => "get_coin_price",
            ToolKind::SearchTwitterMentions => "search_twitter_mentions",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    pub fn descriptor(self) -> ToolDescriptor {
        match self {
            ToolKind::GetCoinPrice => ToolDescriptor {
                name: self.name().into(),
                description: "Gets the current price of a coin from CoinGecko.".into(),
                input_schema: SchemaNode::object().required_property(
                    "coin_id",
                    SchemaNode::string("The CoinGecko ID of the coin (e.g., bitcoin, ethereum)."),
                ),
            },
            ToolKind::SearchTwitterMentions => ToolDescriptor {
                name: self.name().into(),
                description:
                    "Searches for mentions of specific keywords on Twitter using ELFA AI API."
                        .into(),
                input_schema: SchemaNode::object().required_property(
                    "keywords",
                    SchemaNode::array_of(
                        SchemaNode::String { description: None },
                        "List of keywords to search for.",
                    ),
                ),
            },
        }
    }

    /// Payload reported when the upstream had nothing for the request
    pub fn empty_payload(self) -> Value {
        match self {
            ToolKind::GetCoinPrice => serde_json::json!({ "price": null }),
            ToolKind::SearchTwitterMentions => Value::Array(Vec::new()),
        }
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Immutable catalog of enabled tools
#[derive(Debug, Clone)]
pub struct ToolRegistry {
    kinds: Vec<ToolKind>,
    descriptors: Vec<ToolDescriptor>,
}

impl ToolRegistry {
    /// Build a registry from the enabled set
    ///
    /// Order follows `ToolKind::ALL` regardless of input order; duplicates
    /// collapse.
    pub fn new(enabled: &[ToolKind]) -> Self {
        let kinds: Vec<ToolKind> = ToolKind::ALL
            .into_iter()
            .filter(|kind| enabled.contains(kind))
            .collect();
        let descriptors = kinds.iter().map(|kind| kind.descriptor()).collect();
        Self { kinds, descriptors }
    }

    pub fn list_tools(&self) -> &[ToolDescriptor] {
        &self.descriptors
    }

    /// Resolve an enabled tool by wire name
    pub fn lookup(&self, name: &str) -> Option<(ToolKind, &ToolDescriptor)> {
        self.kinds
            .iter()
            .zip(&self.descriptors)
            .find(|(kind, _)| kind.name() == name)
            .map(|(kind, descriptor)| (*kind, descriptor))
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}
