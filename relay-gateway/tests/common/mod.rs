//! Shared helpers for gateway integration tests

#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use axum::body::{Body, Bytes};
use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderMap, Method, Request, StatusCode, Uri, header::CONTENT_TYPE};
use axum::response::{IntoResponse, Response};
use axum::routing;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use relay_gateway::{AppState, GatewayConfig, create_router};

pub const PNG_BYTES: [u8; 12] = [0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a, 0, 1, 254, 255];

/// Gateway wired to reach test upstreams over plain HTTP
pub fn build_test_app() -> Router {
    build_test_app_with_timeout(Duration::from_secs(5))
}

pub fn build_test_app_with_timeout(timeout: Duration) -> Router {
    let config = GatewayConfig::default()
        .with_upstream_scheme("http")
        .with_upstream_timeout(timeout);
    create_router(AppState::new(config).unwrap())
}

/// Echoes what it received as JSON
async fn echo(method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> impl IntoResponse {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };

    axum::Json(json!({
        "method": method.as_str(),
        "path": uri.path(),
        "query": uri.query(),
        "api_key": header("x-c3-api-key"),
        "session": header("x-c3-session"),
        "cookie": header("cookie"),
        "authorization": header("authorization"),
        "other": header("x-other"),
        "content_type": header("content-type"),
        "body": String::from_utf8_lossy(&body),
    }))
}

/// Serves a fake upstream node on an ephemeral local port
pub async fn spawn_upstream() -> SocketAddr {
    let app = Router::new()
        .route(
            "/image.png",
            routing::get(|| async { ([(CONTENT_TYPE, "image/png")], PNG_BYTES.to_vec()) }),
        )
        .route(
            "/raw",
            routing::get(|| async { Response::new(Body::from(vec![0u8, 159, 146, 150])) }),
        )
        .route(
            "/notes.txt",
            routing::get(|| async { ([(CONTENT_TYPE, "text/plain; charset=utf-8")], "plain  words\n") }),
        )
        .route(
            "/pretty.json",
            routing::get(|| async {
                (
                    [(CONTENT_TYPE, "application/json")],
                    "{\n  \"status\" : \"running\"\n}",
                )
            }),
        )
        .route(
            "/ordered.json",
            routing::get(|| async {
                (
                    [(CONTENT_TYPE, "application/json")],
                    r#"{"z": 1, "a": {"y": true, "b": null}, "m": 18446744073709551615}"#,
                )
            }),
        )
        .route(
            "/upload",
            routing::post(|body: Bytes| async move {
                axum::Json(json!({ "received": body.len() }))
            }),
        )
        .route(
            "/broken.json",
            routing::get(|| async { ([(CONTENT_TYPE, "application/json")], "{ nope") }),
        )
        .route(
            "/missing",
            routing::get(|| async {
                (
                    StatusCode::NOT_FOUND,
                    axum::Json(json!({ "detail": "no such job" })),
                )
            }),
        )
        .route(
            "/slow",
            routing::get(|| async {
                tokio::time::sleep(Duration::from_secs(3)).await;
                "late"
            }),
        )
        .fallback(echo)
        .layer(DefaultBodyLimit::disable());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    addr
}

/// A local address nothing is listening on
pub async fn closed_port() -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

pub async fn send(app: Router, request: Request<Body>) -> Response {
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response {
    send(
        app,
        Request::builder().uri(uri).body(Body::empty()).unwrap(),
    )
    .await
}

pub async fn body_bytes(response: Response) -> Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

pub async fn body_json(response: Response) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

pub fn assert_cors(response: &Response) {
    let headers = response.headers();
    assert_eq!(headers["access-control-allow-origin"], "*");
    assert_eq!(headers["access-control-allow-credentials"], "true");
    let methods = headers["access-control-allow-methods"].to_str().unwrap();
    for method in ["GET", "POST", "PUT", "DELETE", "OPTIONS"] {
        assert!(methods.contains(method), "{method} not allowed");
    }
    let allowed = headers["access-control-allow-headers"]
        .to_str()
        .unwrap()
        .to_ascii_lowercase();
    for header in ["content-type", "authorization", "x-c3-api-key", "x-c3-session", "cookie"] {
        assert!(allowed.contains(header), "{header} not allowed");
    }
}
