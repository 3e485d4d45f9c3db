//! Business routes. Each one is mounted behind the instrumentation middleware.

pub mod catalog;

pub use catalog::{list_products, simulated_error, Product};
