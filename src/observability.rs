//! Tracing setup and in-process counters

use std::sync::atomic::{AtomicU64, Ordering};
use tracing_subscriber::EnvFilter;

/// Install the global fmt subscriber. `RUST_LOG` takes precedence over
/// `default_filter`.
pub fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Metrics handle for recording counters
#[derive(Debug, Default)]
pub struct Metrics {
    api_requests: AtomicU64,
    api_failures: AtomicU64,
    retries: AtomicU64,
    handles_cleared: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn api_request(&self) {
        self.api_requests.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(counter = "api_requests", "Metric incremented");
    }

    pub fn api_failure(&self) {
        self.api_failures.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "api_failures", "Metric incremented");
    }

    pub fn retry(&self) {
        self.retries.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "retries", "Metric incremented");
    }

    pub fn handle_cleared(&self) {
        self.handles_cleared.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "handles_cleared", "Metric incremented");
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            api_requests: self.api_requests.load(Ordering::Relaxed),
            api_failures: self.api_failures.load(Ordering::Relaxed),
            retries: self.retries.load(Ordering::Relaxed),
            handles_cleared: self.handles_cleared.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub api_requests: u64,
    pub api_failures: u64,
    pub retries: u64,
    pub handles_cleared: u64,
}
