//! Relay Gateway
//!
//! A stateless reverse proxy that lets a browser reach any compute node by
//! name through one fixed endpoint. The node is read from the request path
//! at request time; the gateway normalizes authentication headers, response
//! encoding and CORS.

pub mod api;
pub mod config;
pub mod state;

pub use api::create_router;
pub use config::GatewayConfig;
pub use state::AppState;
