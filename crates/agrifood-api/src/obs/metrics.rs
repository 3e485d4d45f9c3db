//! HTTP request counter and latency histogram.

use std::time::Duration;

use agrifood_core::error::Result;
use agrifood_core::metrics::{Counter, Histogram, HistogramTimer, Registry};

pub const REQUESTS_TOTAL: &str = "http_requests_total";
pub const REQUEST_DURATION: &str = "http_request_duration_seconds";

/// Label names, in the order values are passed.
const LABELS: [&str; 3] = ["method", "route", "status"];

#[derive(Clone)]
pub struct HttpMetrics {
    requests: Counter,
    duration: Histogram,
}

impl HttpMetrics {
    pub fn register(registry: &Registry, buckets: &[f64]) -> Result<Self> {
        let requests = registry.register_counter(REQUESTS_TOTAL, "Total HTTP requests", &LABELS)?;
        let duration = registry.register_histogram(
            REQUEST_DURATION,
            "HTTP request duration in seconds",
            &LABELS,
            buckets,
        )?;
        Ok(Self { requests, duration })
    }

    /// Start timing a request; labels are known only once it finishes.
    pub fn start_timer(&self) -> HistogramTimer {
        self.duration.start_timer()
    }

    /// One increment plus one observation for a finished request.
    pub fn finish(
        &self,
        timer: HistogramTimer,
        method: &str,
        route: &str,
        status: u16,
    ) -> Result<Duration> {
        let status = status.to_string();
        let values = [method, route, status.as_str()];
        self.requests.inc(&values)?;
        timer.observe(&values)
    }

    pub fn requests(&self) -> &Counter {
        &self.requests
    }

    pub fn duration(&self) -> &Histogram {
        &self.duration
    }
}
