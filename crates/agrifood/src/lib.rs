//! Top-level facade crate for the agri-food API.
//!
//! Re-exports the metric registry and the HTTP service so users can depend on a single crate.

pub mod core {
    pub use agrifood_core::*;
}

pub mod api {
    pub use agrifood_api::*;
}
