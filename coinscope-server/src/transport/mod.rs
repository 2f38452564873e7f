//! Session transports
//!
//! Both transports pair each client with a [`Session`](crate::mcp::Session)
//! through an inbound queue of raw frames and an outbound queue of
//! responses.

mod sse;
mod stdio;


pub use sse::{SseServer, MESSAGES_PATH, SSE_PATH};
pub use stdio::{serve_lines, serve_stdio};
