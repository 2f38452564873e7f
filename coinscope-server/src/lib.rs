//! coinscope server - MCP tool-dispatch gateway
//!
//! Serves a fixed catalog of upstream lookups (CoinGecko spot price, ELFA
//! Twitter mention search) as MCP tools over an SSE or stdio session.

pub mod cli;
pub mod config;
pub mod fetchers;
pub mod mcp;
pub mod observability;
pub mod transport;
pub mod upstream;

#[cfg(test)]
mod testing;
