//! Request instrumentation.
//!
//! `metrics` owns the two HTTP instruments; `instrument` is the per-route
//! middleware that feeds them once each response has been fully sent.

pub mod instrument;
pub mod metrics;

pub use instrument::{track, RouteInstrument};
pub use metrics::HttpMetrics;
