//! Axum router wiring.
//!
//! `/products` and `/error` run behind the instrumentation middleware, each
//! labeled with its registered route. `/health` and `/metrics` are not counted.
//! The middleware is a route layer, so requests answered by the method
//! router's 405 fallback never reach it and cannot mint new `method` labels.

use axum::{middleware, routing::get, Router};

use crate::{app_state::AppState, obs::{self, RouteInstrument}, ops, services};

pub fn build_router(state: AppState) -> Router {
    let http = state.http_metrics();

    Router::new()
        .route("/health", get(ops::health))
        .route(
            "/products",
            get(services::list_products).route_layer(middleware::from_fn_with_state(
                RouteInstrument::new(http.clone(), "/products"),
                obs::track,
            )),
        )
        .route(
            "/error",
            get(services::simulated_error).route_layer(middleware::from_fn_with_state(
                RouteInstrument::new(http, "/error"),
                obs::track,
            )),
        )
        .route("/metrics", get(ops::metrics))
        .with_state(state)
}
