//! API Module
//!
//! HTTP surface of the gateway: a health check, and a fallback that
//! proxies every other path to the node it names.

pub mod cors;
pub mod error;
pub mod health;
pub mod proxy;

use axum::{Router, extract::DefaultBodyLimit, middleware, routing::get};
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};

use crate::state::AppState;

/// Create the gateway router
///
/// Inbound bodies are forwarded whole, so the default body limit is off.
/// Layers, innermost first: preflight short-circuit, panic recovery,
/// CORS headers, request tracing.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Everything else is forwarded
        .fallback(proxy::proxy)
        .with_state(state)
        .layer(DefaultBodyLimit::disable())
        .layer(middleware::from_fn(cors::preflight))
        .layer(CatchPanicLayer::custom(error::handle_panic))
        .layer(middleware::map_response(cors::add_cors_headers))
        .layer(TraceLayer::new_for_http())
}
