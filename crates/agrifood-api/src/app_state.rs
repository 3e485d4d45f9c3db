//! Shared application state: the composition root.
//!
//! The registry is built here once and handed to both the instrumentation
//! middleware (through `HttpMetrics`) and the `/metrics` handler. Registration
//! errors are returned, not panicked on, so `main` can exit cleanly.

use std::sync::Arc;

use agrifood_core::error::Result;
use agrifood_core::metrics::Registry;

use crate::config::ApiConfig;
use crate::obs::HttpMetrics;

#[derive(Clone)]
pub struct AppState {
    registry: Arc<Registry>,
    http: HttpMetrics,
}

impl AppState {
    /// Build application state. Only the `metrics` section of `cfg` is read;
    /// the listen address is resolved by the caller before this point.
    pub fn new(cfg: &ApiConfig) -> Result<Self> {
        let registry = Arc::new(Registry::new());

        // 1) Process metrics, sampled lazily at export
        if cfg.metrics.default_metrics {
            registry.collect_default_metrics(&cfg.metrics.prefix)?;
        }

        // 2) HTTP instruments shared by every instrumented route
        let http = HttpMetrics::register(&registry, &cfg.metrics.duration_buckets)?;

        Ok(Self { registry, http })
    }

    pub fn registry(&self) -> Arc<Registry> {
        Arc::clone(&self.registry)
    }

    pub fn http_metrics(&self) -> HttpMetrics {
        self.http.clone()
    }
}
