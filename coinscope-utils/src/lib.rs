//! coinscope-utils: Common utilities shared across coinscope crates
//!
//! This crate provides:
//! - Unified error types ([`CoinscopeError`], [`Result`])
//! - Logging infrastructure ([`init_logging_with_config`], [`LogConfig`])

pub mod error;
pub mod logging;

// Re-export main types at crate root for convenience
pub use error::{CoinscopeError, Result};
pub use logging::{init_logging_with_config, LogConfig, LogOutput};
