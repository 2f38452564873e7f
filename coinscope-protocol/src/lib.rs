//! coinscope-protocol: wire definitions shared by the gateway and its clients
//!
//! This crate defines the JSON-RPC 2.0 envelopes, the MCP payloads carried
//! inside them, the classification of inbound frames, and the SSE framing
//! used by the session transport.

pub mod codec;
pub mod jsonrpc;
pub mod messages;
pub mod types;

// Re-export main types at crate root
pub use codec::{CodecError, SseCodec, SseFrame, MAX_FRAME_SIZE};
pub use jsonrpc::{JsonRpcError, JsonRpcRequest, JsonRpcResponse};
pub use messages::InboundFrame;
pub use types::{
    CallToolParams, InitializeResult, SchemaNode, ServerCapabilities, ServerInfo, ToolContent,
    ToolDescriptor, ToolResult, ToolsListResult, MCP_PROTOCOL_VERSION,
};
