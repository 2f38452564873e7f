//! Observability subsystem for coinscope
//!
//! Process counters; served over HTTP by the SSE transport.

pub mod metrics;

pub use metrics::Metrics;
