//! MCP payload types
//!
//! Tool descriptors, their input schemas, and the result envelope returned
//! for every tool invocation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// MCP protocol revision spoken by the server
pub const MCP_PROTOCOL_VERSION: &str = "2024-11-05";

/// Shallow JSON Schema node
///
/// Only the three shapes the gateway needs: flat objects, strings and
/// arrays. Serializes as a JSON Schema fragment tagged by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SchemaNode {
    Object {
        #[serde(default)]
        properties: BTreeMap<String, SchemaNode>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        required: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
    String {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
    Array {
        items: Box<SchemaNode>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
}

impl SchemaNode {
    /// Empty object schema
    pub fn object() -> Self {
        SchemaNode::Object {
            properties: BTreeMap::new(),
            required: Vec::new(),
            description: None,
        }
    }

    /// String schema with a description
    pub fn string(description: impl Into<String>) -> Self {
        SchemaNode::String {
            description: Some(description.into()),
        }
    }

    /// Array schema with the given item schema
    pub fn array_of(items: SchemaNode, description: impl Into<String>) -> Self {
        SchemaNode::Array {
            items: Box::new(items),
            description: Some(description.into()),
        }
    }

    /// Add an optional property. No-op on non-object schemas.
    pub fn property(mut self, name: impl Into<String>, node: SchemaNode) -> Self {
        if let SchemaNode::Object { properties, .. } = &mut self {
            properties.insert(name.into(), node);
        }
        self
    }

    /// Add a property and mark it required. No-op on non-object schemas.
    pub fn required_property(mut self, name: impl Into<String>, node: SchemaNode) -> Self {
        let name = name.into();
        if let SchemaNode::Object {
            properties,
            required,
            ..
        } = &mut self
        {
            properties.insert(name.clone(), node);
            if !required.contains(&name) {
                required.push(name);
            }
        }
        self
    }

    /// Names of required properties (empty for non-object schemas)
    pub fn required_fields(&self) -> &[String] {
        match self {
            SchemaNode::Object { required, .. } => required,
            _ => &[],
        }
    }
}

/// MCP tool definition, as returned by `tools/list`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    /// Tool name (e.g., "get_coin_price")
    pub name: String,
    /// Human-readable description
    pub description: String,
    /// Schema for input arguments
    #[serde(rename = "inputSchema")]
    pub input_schema: SchemaNode,
}

/// Parameters of a `tools/call` request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallToolParams {
    pub name: String,
    #[serde(default)]
    pub arguments: serde_json::Value,
}

/// `tools/list` result body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsListResult {
    pub tools: Vec<ToolDescriptor>,
}

/// MCP Tool call result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    /// Content blocks returned by the tool
    pub content: Vec<ToolContent>,
    /// Whether this result represents an error
    #[serde(rename = "isError", default, skip_serializing_if = "Option::is_none")]
    pub is_error: Option<bool>,
}

impl ToolResult {
    /// Create a text result
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text { text: text.into() }],
            is_error: None,
        }
    }

    /// Text of the first content block, if any
    pub fn first_text(&self) -> Option<&str> {
        self.content.first().map(|content| match content {
            ToolContent::Text { text } => text.as_str(),
        })
    }
}

/// Tool result content block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ToolContent {
    /// Text content
    Text {
        /// The text content
        text: String,
    },
}

/// MCP Server capabilities
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerCapabilities {
    /// Tool capabilities
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<ToolsCapability>,
}

impl Default for ServerCapabilities {
    fn default() -> Self {
        Self {
            tools: Some(ToolsCapability {}),
        }
    }
}

/// Tool capability marker
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsCapability {}

/// MCP Server information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerInfo {
    /// Server name
    pub name: String,
    /// Server version
    pub version: String,
}

impl Default for ServerInfo {
    fn default() -> Self {
        Self {
            name: "coinscope".into(),
            version: env!("CARGO_PKG_VERSION").into(),
        }
    }
}

/// Initialize response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitializeResult {
    /// Protocol version
    #[serde(rename = "protocolVersion")]
    pub protocol_version: String,
    /// Server capabilities
    pub capabilities: ServerCapabilities,
    /// Server info
    #[serde(rename = "serverInfo")]
    pub server_info: ServerInfo,
}

impl Default for InitializeResult {
    fn default() -> Self {
        Self {
            protocol_version: MCP_PROTOCOL_VERSION.into(),
            capabilities: ServerCapabilities::default(),
            server_info: ServerInfo::default(),
        }
    }
}
