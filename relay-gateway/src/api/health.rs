//! Health Check API Handler
//!
//! Answered by the gateway itself, never proxied.

use axum::{http::StatusCode, response::IntoResponse};

/// GET /health
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
