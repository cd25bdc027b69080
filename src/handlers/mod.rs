//! HTTP request handlers for the pointcast API.
//!
//! This module contains all the endpoint handlers for the web server.

pub mod heartbeat;
pub mod point;

pub use heartbeat::heartbeat_handler;
pub use point::forecast_handler;

use axum::{routing::get, Router};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

use crate::logging::create_http_trace_layer;
use crate::state::AppState;

/// Build the router with every endpoint
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/v1/forecast", get(forecast_handler))
        .route("/heartbeat", get(heartbeat_handler))
        .layer(
            ServiceBuilder::new()
                .layer(create_http_trace_layer())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
