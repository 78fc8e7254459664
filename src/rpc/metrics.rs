//! Per-client counters for commission queries, split by how each query ended.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum QueryOutcome {
    Success,
    Timeout,
    HeightUnavailable,
    Failed,
}

#[derive(Debug, Default)]
pub(crate) struct RpcMetrics {
    succeeded: AtomicU64,
    timed_out: AtomicU64,
    height_unavailable: AtomicU64,
    failed: AtomicU64,
    latency_ns: AtomicU64,
    max_latency_ns: AtomicU64,
}

impl RpcMetrics {
    pub(crate) fn record(&self, outcome: QueryOutcome, latency: Duration) {
        let counter = match outcome {
            QueryOutcome::Success => &self.succeeded,
            QueryOutcome::Timeout => &self.timed_out,
            QueryOutcome::HeightUnavailable => &self.height_unavailable,
            QueryOutcome::Failed => &self.failed,
        };
        counter.fetch_add(1, Ordering::Relaxed);

        let nanos = u64::try_from(latency.as_nanos()).unwrap_or(u64::MAX);
        self.latency_ns.fetch_add(nanos, Ordering::Relaxed);
        self.max_latency_ns.fetch_max(nanos, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> RpcMetricsSnapshot {
        let succeeded = self.succeeded.load(Ordering::Relaxed);
        let total_timeouts = self.timed_out.load(Ordering::Relaxed);
        let height_unavailable = self.height_unavailable.load(Ordering::Relaxed);
        let failed = self.failed.load(Ordering::Relaxed);

        let total_errors = total_timeouts + height_unavailable + failed;
        let total_requests = succeeded + total_errors;
        let average_latency_ms = if total_requests == 0 {
            0.0
        } else {
            self.latency_ns.load(Ordering::Relaxed) as f64 / total_requests as f64 / 1_000_000.0
        };

        RpcMetricsSnapshot {
            total_requests,
            total_errors,
            total_timeouts,
            height_unavailable,
            average_latency_ms,
            max_latency_ms: self.max_latency_ns.load(Ordering::Relaxed) as f64 / 1_000_000.0,
        }
    }
}

/// Point-in-time view of a [`LedgerRpcClient`](crate::rpc::LedgerRpcClient)'s queries.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct RpcMetricsSnapshot {
    pub total_requests: u64,
    /// Timeouts, unavailable heights and every other failed query.
    pub total_errors: u64,
    pub total_timeouts: u64,
    pub height_unavailable: u64,
    pub average_latency_ms: f64,
    pub max_latency_ms: f64,
}

impl RpcMetricsSnapshot {
    pub fn error_rate(&self) -> f64 {
        if self.total_requests == 0 {
            0.0
        } else {
            self.total_errors as f64 / self.total_requests as f64
        }
    }
}
