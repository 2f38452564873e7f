//! MCP (Model Context Protocol) tool gateway
//!
//! Sessions speak JSON-RPC 2.0. `tools/list` serves the registry and
//! `tools/call` goes through the dispatcher to an upstream fetcher.
//!
//! MCP Protocol: <https://modelcontextprotocol.io/>

mod dispatch;
mod error;
mod session;
mod tools;
mod validate;

#[cfg(test)]
mod tests;

pub use dispatch::{render, Dispatcher, FetcherSet, ToolCall};
pub use error::DispatchError;
pub use session::Session;
pub use tools::{ToolKind, ToolRegistry};
pub use validate::{validate, ValidationError};
