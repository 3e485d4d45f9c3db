//! Static product catalog and the error-simulation route.

use axum::{http::StatusCode, response::{IntoResponse, Json}};
use serde::Serialize;
use serde_json::json;

#[derive(Debug, Clone, Serialize)]
pub struct Product {
    pub id: u32,
    pub name: &'static str,
    pub category: &'static str,
}

pub static PRODUCTS: [Product; 2] = [
    Product { id: 1, name: "Wheat", category: "grain" },
    Product { id: 2, name: "Tomato", category: "vegetable" },
];

pub async fn list_products() -> Json<&'static [Product]> {
    Json(&PRODUCTS)
}

/// Always 500; exists to put non-2xx samples into the metrics.
pub async fn simulated_error() -> impl IntoResponse {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "Internal Server Error (test)" })),
    )
}
