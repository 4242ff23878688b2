//! The reqwest forwarder against a local stand-in for the Notify API.

use std::time::Duration;

use axum::body::Bytes;
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio_test::{assert_err, assert_ok};

use notify_ratelimit_emulator::error::EmulatorError;
use notify_ratelimit_emulator::http::{ForwardRequest, Forwarder, HttpForwarder};

/// Echoes back what it received so the test can inspect it.
async fn echo(headers: HeaderMap, body: Bytes) -> impl IntoResponse {
    let payload: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (
        StatusCode::CREATED,
        Json(json!({
            "received": payload,
            "authorization": headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()),
            "host": headers.get(header::HOST).and_then(|v| v.to_str().ok()),
        })),
    )
}

async fn slow() -> &'static str {
    tokio::time::sleep(Duration::from_secs(5)).await;
    "too late"
}

async fn spawn_upstream(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

fn request(body: &Value) -> ForwardRequest {
    let mut headers = HeaderMap::new();
    headers.insert(header::HOST, HeaderValue::from_static("emulator.local:8000"));
    headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc.def.ghi"));
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
    ForwardRequest {
        headers,
        body: Bytes::from(body.to_string()),
    }
}

#[tokio::test]
async fn test_forwards_body_and_headers_and_relays_response() {
    let base = spawn_upstream(Router::new().route("/v2/notifications/email", post(echo))).await;
    let forwarder = HttpForwarder::new(&base, Duration::from_secs(5)).unwrap();
    let body = json!({ "email_address": "someone@example.com", "template_id": "abc" });

    let response = assert_ok!(forwarder.forward(request(&body)).await);

    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.content_type.unwrap(), "application/json");
    let relayed: Value = serde_json::from_slice(&response.body).unwrap();
    assert_eq!(relayed["received"], body);
    assert_eq!(relayed["authorization"], "Bearer abc.def.ghi");
    // Host is the upstream's own, not the inbound one
    assert_ne!(relayed["host"], "emulator.local:8000");
}

#[tokio::test]
async fn test_upstream_timeout_is_surfaced() {
    let base = spawn_upstream(Router::new().route("/v2/notifications/email", post(slow))).await;
    let forwarder = HttpForwarder::new(&base, Duration::from_millis(200)).unwrap();

    let err = assert_err!(forwarder.forward(request(&json!({}))).await);

    match err {
        EmulatorError::Upstream(e) => assert!(e.is_timeout()),
        other => panic!("Expected upstream error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_unreachable_upstream_is_surfaced() {
    // Bind then drop to get a port nobody is listening on
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let forwarder = HttpForwarder::new(&format!("http://{}", addr), Duration::from_secs(2)).unwrap();

    let err = assert_err!(forwarder.forward(request(&json!({}))).await);
    assert!(matches!(err, EmulatorError::Upstream(_)));
}
