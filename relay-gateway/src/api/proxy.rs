//! Proxy API Handler
//!
//! Resolves the target node from the request path and forwards the call:
//!
//! ```text
//! {method} <prefix>/<node>/<path...>?<query>  →  {scheme}://<node>/<path...>?<query>
//! ```
//!
//! Only allow-listed headers travel upstream. The response keeps the
//! upstream status; its body is re-encoded according to its declared
//! content type.

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{
        HeaderMap, HeaderName, HeaderValue, Method, Response, Uri,
        header::CONTENT_TYPE,
        uri::Authority,
    },
};
use base64::{Engine, engine::general_purpose::STANDARD};

use super::error::{GatewayError, GatewayResult};
use crate::config::FORWARDED_HEADERS;
use crate::state::AppState;

/// Marks a body that was base64-encoded by the gateway
pub const CONTENT_TRANSFER_ENCODING: HeaderName =
    HeaderName::from_static("content-transfer-encoding");

/// One inbound call, resolved against its target node
#[derive(Debug, Clone)]
pub struct ProxyRequest {
    pub node: String,
    pub path: String,
    pub query: Option<String>,
    pub method: Method,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl ProxyRequest {
    /// Resolves an inbound call
    ///
    /// The first segment after `prefix` names the node; the rest is the
    /// upstream path. A path outside `prefix` is read whole.
    ///
    /// # Errors
    /// `MissingTarget` when no node is named, `InvalidTarget` when the
    /// node is not a bare `host[:port]`.
    pub fn resolve(
        prefix: &str,
        method: Method,
        uri: &Uri,
        inbound: &HeaderMap,
        body: Bytes,
    ) -> GatewayResult<Self> {
        let full = uri.path();
        let routed = match full.strip_prefix(prefix) {
            Some(rest) if !prefix.is_empty() && (rest.is_empty() || rest.starts_with('/')) => rest,
            _ => full,
        };

        let routed = routed.strip_prefix('/').unwrap_or(routed);
        let (node, path) = routed.split_once('/').unwrap_or((routed, ""));
        if node.is_empty() {
            return Err(GatewayError::MissingTarget);
        }

        let authority: Authority = node
            .parse()
            .map_err(|_| GatewayError::InvalidTarget(node.to_string()))?;
        if authority.as_str().contains('@') {
            return Err(GatewayError::InvalidTarget(node.to_string()));
        }

        let mut headers = HeaderMap::new();
        for name in FORWARDED_HEADERS {
            for value in inbound.get_all(name) {
                headers.append(name, value.clone());
            }
        }
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        Ok(Self {
            node: authority.as_str().to_string(),
            path: path.to_string(),
            query: uri.query().map(str::to_string),
            method,
            headers,
            body,
        })
    }

    /// Absolute upstream URL for this call
    pub fn upstream_url(&self, scheme: &str) -> String {
        let mut url = format!("{}://{}/{}", scheme, self.node, self.path);
        if let Some(query) = &self.query {
            url.push('?');
            url.push_str(query);
        }
        url
    }

    fn carries_body(&self) -> bool {
        !self.body.is_empty() && self.method != Method::GET && self.method != Method::HEAD
    }
}

/// How an upstream body is handed back to the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Payload {
    Json,
    Text,
    Binary,
}

impl Payload {
    /// Picks the encoding from a declared media type; undeclared is binary
    pub fn classify(content_type: Option<&str>) -> Self {
        let Some(content_type) = content_type else {
            return Payload::Binary;
        };
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        if essence == "application/json" || essence.ends_with("+json") {
            Payload::Json
        } else if essence.starts_with("text/")
            || essence.ends_with("+xml")
            || matches!(
                essence.as_str(),
                "application/xml" | "application/javascript" | "application/x-www-form-urlencoded"
            )
        {
            Payload::Text
        } else {
            Payload::Binary
        }
    }
}

/// Fallback handler: every path that is not a gateway route is proxied
pub async fn proxy(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> GatewayResult<Response<Body>> {
    let request = ProxyRequest::resolve(&state.config.prefix, method, &uri, &headers, body)?;
    forward(&state, request).await
}

/// Sends `request` upstream and re-encodes the reply
pub async fn forward(state: &AppState, request: ProxyRequest) -> GatewayResult<Response<Body>> {
    let url = request.upstream_url(&state.config.upstream_scheme);
    tracing::debug!("Forwarding {} {}", request.method, url);

    let mut outbound = state
        .client
        .request(request.method.clone(), &url)
        .headers(request.headers.clone())
        .timeout(state.config.upstream_timeout);
    if request.carries_body() {
        outbound = outbound.body(request.body);
    }

    let upstream = outbound.send().await?;
    let status = upstream.status();
    let content_type = upstream.headers().get(CONTENT_TYPE).cloned();
    let bytes = upstream.bytes().await?;

    tracing::debug!("Upstream {} answered {} ({} bytes)", url, status, bytes.len());

    let payload = Payload::classify(content_type.as_ref().and_then(|v| v.to_str().ok()));
    let response = Response::builder().status(status);

    let response = match payload {
        Payload::Json if bytes.is_empty() => response
            .header(CONTENT_TYPE, "application/json")
            .body(Body::empty())?,
        Payload::Json => {
            let value: serde_json::Value = serde_json::from_slice(&bytes)?;
            response
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&value)?))?
        }
        Payload::Text => {
            let response = match content_type {
                Some(ct) => response.header(CONTENT_TYPE, ct),
                None => response,
            };
            response.body(Body::from(bytes))?
        }
        Payload::Binary => {
            let content_type = content_type
                .unwrap_or_else(|| HeaderValue::from_static("application/octet-stream"));
            response
                .header(CONTENT_TYPE, content_type)
                .header(CONTENT_TRANSFER_ENCODING, "base64")
                .body(Body::from(STANDARD.encode(&bytes)))?
        }
    };

    Ok(response)
}
