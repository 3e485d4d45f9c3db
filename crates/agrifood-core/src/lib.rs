//! agri-food core: error types and the in-process metric registry.
//!
//! This crate owns the counter/histogram instruments, the lazily sampled
//! process collector, and the Prometheus text encoder. It carries no HTTP or
//! runtime dependencies so the registry can be exercised directly in tests.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here. All fallible paths
//! surface as `AgriFoodError`/`Result` so a bad label set or a poisoned lock
//! never takes the process down.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod metrics;

/// Shared result type.
pub use error::{AgriFoodError, Result};
