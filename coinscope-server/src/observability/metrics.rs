//! Metrics collection for coinscope
//!
//! Process-wide counters for session and tool-call activity, rendered in
//! Prometheus text format at `/metrics`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;
use std::time::Duration;

use crate::fetchers::FetchOutcome;

/// Metrics collector
#[derive(Debug, Default)]
pub struct Metrics {
    /// Sessions opened since start
    pub sessions_opened_total: AtomicU64,
    /// Sessions currently open
    pub sessions_active: AtomicU64,

    /// Tool calls that reached a fetcher
    pub tool_calls_total: AtomicU64,
    /// Tool calls rejected before any upstream request
    pub tool_call_rejections_total: AtomicU64,

    /// Non-200 and malformed upstream responses
    pub upstream_errors_total: AtomicU64,
    /// Upstream calls that produced no response
    pub transport_errors_total: AtomicU64,

    /// Sum of upstream fetch time in milliseconds
    pub fetch_latency_ms_sum: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the global metrics instance
    pub fn global() -> &'static Self {
        static INSTANCE: OnceLock<Metrics> = OnceLock::new();
        INSTANCE.get_or_init(Metrics::new)
    }

    pub fn record_session_opened(&self) {
        self.sessions_opened_total.fetch_add(1, Ordering::Relaxed);
        self.sessions_active.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_session_closed(&self) {
        let _ = self
            .sessions_active
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1));
    }

    pub fn record_rejection(&self) {
        self.tool_call_rejections_total.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a completed fetch and how it ended
    pub fn record_fetch(&self, outcome: &FetchOutcome, latency: Duration) {
        self.tool_calls_total.fetch_add(1, Ordering::Relaxed);
        self.fetch_latency_ms_sum.fetch_add(millis(latency), Ordering::Relaxed);

        match outcome {
            FetchOutcome::UpstreamError { .. } | FetchOutcome::Malformed { .. } => {
                self.upstream_errors_total.fetch_add(1, Ordering::Relaxed);
            }
            FetchOutcome::TransportError { .. } => {
                self.transport_errors_total.fetch_add(1, Ordering::Relaxed);
            }
            FetchOutcome::Success(_) | FetchOutcome::Empty => {}
        }
    }

    /// Render in Prometheus text exposition format
    pub fn to_prometheus(&self) -> String {
        use std::fmt::Write;

        let mut output = String::with_capacity(1024);

        macro_rules! metric {
            ($kind:expr, $name:expr, $help:expr, $value:expr) => {
                let _ = writeln!(output, "# HELP {} {}", $name, $help);
                let _ = writeln!(output, "# TYPE {} {}", $name, $kind);
                let _ = writeln!(output, "{} {}", $name, $value.load(Ordering::Relaxed));
            };
        }

        metric!(
            "counter",
            "coinscope_sessions_opened_total",
            "Total number of sessions opened",
            self.sessions_opened_total
        );
        metric!(
            "gauge",
            "coinscope_sessions_active",
            "Number of open sessions",
            self.sessions_active
        );
        metric!(
            "counter",
            "coinscope_tool_calls_total",
            "Total number of tool calls dispatched to a fetcher",
            self.tool_calls_total
        );
        metric!(
            "counter",
            "coinscope_tool_call_rejections_total",
            "Total number of tool calls rejected by name or argument checks",
            self.tool_call_rejections_total
        );
        metric!(
            "counter",
            "coinscope_upstream_errors_total",
            "Total number of upstream error or malformed responses",
            self.upstream_errors_total
        );
        metric!(
            "counter",
            "coinscope_transport_errors_total",
            "Total number of upstream calls without a response",
            self.transport_errors_total
        );
        metric!(
            "counter",
            "coinscope_fetch_latency_ms_sum",
            "Sum of upstream fetch latency in milliseconds",
            self.fetch_latency_ms_sum
        );

        output
    }
}

/// Whole milliseconds, saturating at `u64::MAX`
fn millis(latency: Duration) -> u64 {
    u64::try_from(latency.as_millis()).unwrap_or(u64::MAX)
}
