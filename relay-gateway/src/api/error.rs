//! API Error Handling
//!
//! Every gateway failure renders as a JSON body with an `error` field.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::any::Any;
use thiserror::Error;

/// Error text for requests that do not name a node
pub const MISSING_TARGET: &str = "Missing node URL";

/// Error text for every fault raised while forwarding
pub const PROXY_FAULT: &str = "Proxy error";

/// Gateway error type
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Missing node URL")]
    MissingTarget,

    #[error("invalid node identifier {0:?}")]
    InvalidTarget(String),

    #[error("upstream request failed: {0}")]
    Upstream(#[from] reqwest::Error),

    #[error("upstream declared JSON but sent an invalid body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("failed to build response: {0}")]
    Response(#[from] axum::http::Error),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

fn fault(message: String) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorBody {
            error: PROXY_FAULT,
            message: Some(message),
        }),
    )
        .into_response()
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        match self {
            GatewayError::MissingTarget => (
                StatusCode::BAD_REQUEST,
                Json(ErrorBody {
                    error: MISSING_TARGET,
                    message: None,
                }),
            )
                .into_response(),
            GatewayError::InvalidTarget(_) => (
                StatusCode::BAD_REQUEST,
                Json(ErrorBody {
                    error: "Invalid node URL",
                    message: Some(self.to_string()),
                }),
            )
                .into_response(),
            err => {
                tracing::error!("Proxy error: {}", err);
                fault(err.to_string())
            }
        }
    }
}

/// Turns a panic inside a handler into the regular fault response
pub fn handle_panic(panic: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "handler panicked".to_string()
    };

    tracing::error!("Handler panicked: {}", message);
    fault(message)
}

pub type GatewayResult<T> = Result<T, GatewayError>;
