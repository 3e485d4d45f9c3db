//! agri-food API library entry.
//!
//! This crate wires config, the metric registry, the instrumentation
//! middleware and the route handlers into one axum application. It is
//! consumed by the binary (`main.rs`) and by integration tests.

pub mod app_state;
pub mod config;
pub mod obs;
pub mod ops;
pub mod router;
pub mod services;
