//! Integration tests for request forwarding, encoding, CORS and faults.

mod common;

use std::time::Duration;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use base64::{Engine, engine::general_purpose::STANDARD};
use common::{
    PNG_BYTES, assert_cors, body_bytes, body_json, build_test_app, build_test_app_with_timeout,
    closed_port, get, send, spawn_upstream,
};

// ---------------------------------------------------------------------------
// Missing target
// ---------------------------------------------------------------------------

#[tokio::test]
async fn missing_node_is_400_for_every_method() {
    for method in [Method::GET, Method::POST, Method::PUT, Method::DELETE] {
        for uri in ["/", "/proxy", "/proxy/"] {
            let request = Request::builder()
                .method(method.clone())
                .uri(uri)
                .body(Body::from("{}"))
                .unwrap();
            let response = send(build_test_app(), request).await;

            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{method} {uri}");
            assert_cors(&response);
            assert_eq!(
                body_bytes(response).await,
                r#"{"error":"Missing node URL"}"#.as_bytes()
            );
        }
    }
}

#[tokio::test]
async fn node_with_userinfo_is_rejected() {
    let response = get(build_test_app(), "/proxy/user@127.0.0.1/x").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_cors(&response);
}

// ---------------------------------------------------------------------------
// Preflight and health
// ---------------------------------------------------------------------------

#[tokio::test]
async fn preflight_is_answered_without_forwarding() {
    // Nothing listens on this node; a forwarded call would fail with 500
    let node = closed_port().await;

    for uri in [format!("/proxy/{node}/csm"), "/".to_string(), "/health".to_string()] {
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri(&uri)
            .body(Body::empty())
            .unwrap();
        let response = send(build_test_app(), request).await;

        assert_eq!(response.status(), StatusCode::OK, "{uri}");
        assert_cors(&response);
        assert!(body_bytes(response).await.is_empty());
    }
}

#[tokio::test]
async fn health_is_served_locally() {
    let response = get(build_test_app(), "/health").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_cors(&response);
    assert_eq!(body_bytes(response).await, "OK".as_bytes());
}

// ---------------------------------------------------------------------------
// Forwarding
// ---------------------------------------------------------------------------

#[tokio::test]
async fn post_is_forwarded_with_path_query_body_and_allowed_headers() {
    let node = spawn_upstream().await;
    let request = Request::builder()
        .method(Method::POST)
        .uri(format!("/proxy/{node}/echo/deep?x=1&y=a%20b"))
        .header("X-C3-API-KEY", "acct-key")
        .header("X-C3-Session", "sess")
        .header("Cookie", "c=1")
        .header("Authorization", "Bearer not-forwarded")
        .header("X-Other", "dropped")
        .header("Content-Type", "text/plain")
        .body(Body::from(r#"{"text":"hi"}"#))
        .unwrap();

    let response = send(build_test_app(), request).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_cors(&response);
    assert_eq!(response.headers()["content-type"], "application/json");

    let echoed = body_json(response).await;
    assert_eq!(echoed["method"], "POST");
    assert_eq!(echoed["path"], "/echo/deep");
    assert_eq!(echoed["query"], "x=1&y=a%20b");
    assert_eq!(echoed["api_key"], "acct-key");
    assert_eq!(echoed["session"], "sess");
    assert_eq!(echoed["cookie"], "c=1");
    assert!(echoed["authorization"].is_null());
    assert!(echoed["other"].is_null());
    assert_eq!(echoed["content_type"], "application/json");
    assert_eq!(echoed["body"], r#"{"text":"hi"}"#);
}

#[tokio::test]
async fn get_is_forwarded_without_body() {
    let node = spawn_upstream().await;
    let request = Request::builder()
        .uri(format!("/proxy/{node}/status/j1"))
        .body(Body::from("ignored"))
        .unwrap();

    let echoed = body_json(send(build_test_app(), request).await).await;
    assert_eq!(echoed["method"], "GET");
    assert_eq!(echoed["path"], "/status/j1");
    assert!(echoed["query"].is_null());
    assert_eq!(echoed["body"], "");
}

#[tokio::test]
async fn put_and_delete_are_forwarded() {
    let node = spawn_upstream().await;
    for method in [Method::PUT, Method::DELETE] {
        let request = Request::builder()
            .method(method.clone())
            .uri(format!("/proxy/{node}/things/7"))
            .body(Body::empty())
            .unwrap();
        let echoed = body_json(send(build_test_app(), request).await).await;
        assert_eq!(echoed["method"], method.as_str());
        assert_eq!(echoed["path"], "/things/7");
    }
}

#[tokio::test]
async fn large_upload_is_forwarded_whole() {
    let node = spawn_upstream().await;
    let size = 3 * 1024 * 1024;
    let request = Request::builder()
        .method(Method::POST)
        .uri(format!("/proxy/{node}/upload"))
        .body(Body::from(vec![b'a'; size]))
        .unwrap();

    let response = send(build_test_app(), request).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_cors(&response);
    assert_eq!(body_json(response).await["received"], size);
}

// ---------------------------------------------------------------------------
// Response encoding
// ---------------------------------------------------------------------------

#[tokio::test]
async fn binary_response_round_trips_through_base64() {
    let node = spawn_upstream().await;
    let response = get(build_test_app(), &format!("/proxy/{node}/image.png")).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_cors(&response);
    assert_eq!(response.headers()["content-type"], "image/png");
    assert_eq!(response.headers()["content-transfer-encoding"], "base64");

    let encoded = body_bytes(response).await;
    assert_eq!(STANDARD.decode(&encoded).unwrap(), PNG_BYTES.to_vec());
}

#[tokio::test]
async fn undeclared_content_type_is_treated_as_binary() {
    let node = spawn_upstream().await;
    let response = get(build_test_app(), &format!("/proxy/{node}/raw")).await;

    assert_eq!(response.headers()["content-transfer-encoding"], "base64");
    let encoded = body_bytes(response).await;
    assert_eq!(STANDARD.decode(&encoded).unwrap(), vec![0u8, 159, 146, 150]);
}

#[tokio::test]
async fn text_response_passes_through_unchanged() {
    let node = spawn_upstream().await;
    let response = get(build_test_app(), &format!("/proxy/{node}/notes.txt")).await;

    assert_eq!(
        response.headers()["content-type"],
        "text/plain; charset=utf-8"
    );
    assert!(response.headers().get("content-transfer-encoding").is_none());
    assert_eq!(body_bytes(response).await, "plain  words\n".as_bytes());
}

#[tokio::test]
async fn json_response_is_reserialized() {
    let node = spawn_upstream().await;
    let response = get(build_test_app(), &format!("/proxy/{node}/pretty.json")).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, r#"{"status":"running"}"#.as_bytes());
}

#[tokio::test]
async fn json_response_keeps_key_order_and_large_integers() {
    let node = spawn_upstream().await;
    let response = get(build_test_app(), &format!("/proxy/{node}/ordered.json")).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_bytes(response).await,
        r#"{"z":1,"a":{"y":true,"b":null},"m":18446744073709551615}"#.as_bytes()
    );
}

#[tokio::test]
async fn upstream_error_status_is_relayed() {
    let node = spawn_upstream().await;
    let response = get(build_test_app(), &format!("/proxy/{node}/missing")).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_cors(&response);
    assert_eq!(body_json(response).await["detail"], "no such job");
}

// ---------------------------------------------------------------------------
// Faults
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unreachable_node_is_a_proxy_fault() {
    let node = closed_port().await;
    let response = get(build_test_app(), &format!("/proxy/{node}/csm")).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_cors(&response);

    let body = body_json(response).await;
    assert_eq!(body["error"], "Proxy error");
    assert!(!body["message"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn invalid_upstream_json_is_a_proxy_fault() {
    let node = spawn_upstream().await;
    let response = get(build_test_app(), &format!("/proxy/{node}/broken.json")).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(response).await["error"], "Proxy error");
}

#[tokio::test]
async fn slow_upstream_times_out() {
    let node = spawn_upstream().await;
    let app = build_test_app_with_timeout(Duration::from_millis(200));
    let response = get(app, &format!("/proxy/{node}/slow")).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_cors(&response);
    assert_eq!(body_json(response).await["error"], "Proxy error");
}
