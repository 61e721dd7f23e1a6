//! Logging setup and dispatch counters

use std::sync::atomic::{AtomicU64, Ordering};
use tracing_subscriber::EnvFilter;

/// Installs the global fmt subscriber.
///
/// `RUST_LOG` takes precedence over `default_filter`. Calling this twice is
/// harmless; the second call is ignored.
pub fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Counters shared by every adapter of one application
#[derive(Debug, Default)]
pub struct DispatchMetrics {
    requests_dispatched: AtomicU64,
    bad_requests: AtomicU64,
    domain_errors: AtomicU64,
    pages_rendered: AtomicU64,
}

impl DispatchMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_dispatched(&self) {
        self.requests_dispatched.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "requests_dispatched", "Metric incremented");
    }

    pub fn bad_request(&self) {
        self.bad_requests.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "bad_requests", "Metric incremented");
    }

    pub fn domain_error(&self) {
        self.domain_errors.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "domain_errors", "Metric incremented");
    }

    pub fn page_rendered(&self) {
        self.pages_rendered.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "pages_rendered", "Metric incremented");
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            requests_dispatched: self.requests_dispatched.load(Ordering::Relaxed),
            bad_requests: self.bad_requests.load(Ordering::Relaxed),
            domain_errors: self.domain_errors.load(Ordering::Relaxed),
            pages_rendered: self.pages_rendered.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub requests_dispatched: u64,
    pub bad_requests: u64,
    pub domain_errors: u64,
    pub pages_rendered: u64,
}
