//! Forwarding of non-mocked requests to the real Notify API.

use std::time::Duration;

use async_trait::async_trait;
use axum::body::Bytes;
use axum::http::{header, HeaderMap, HeaderName, StatusCode};
use axum::response::{IntoResponse, Response};
use tracing::{debug, error};

use crate::error::Result;
use crate::notify::EMAIL_ENDPOINT;

/// Headers that are not copied onto the upstream request.
const SKIPPED_HEADERS: [HeaderName; 4] = [
    header::HOST,
    header::CONTENT_LENGTH,
    header::TRANSFER_ENCODING,
    header::CONNECTION,
];

/// An inbound request to be passed upstream.
#[derive(Debug, Clone)]
pub struct ForwardRequest {
    /// Original request headers
    pub headers: HeaderMap,
    /// Original body bytes
    pub body: Bytes,
}

/// Response received from upstream, relayed as-is.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub content_type: Option<header::HeaderValue>,
    pub body: Bytes,
}

impl IntoResponse for UpstreamResponse {
    fn into_response(self) -> Response {
        let mut headers = HeaderMap::new();
        if let Some(content_type) = self.content_type {
            headers.insert(header::CONTENT_TYPE, content_type);
        }
        (self.status, headers, self.body).into_response()
    }
}

/// Capability to send a request to the upstream API.
///
/// Failures are surfaced to the caller, never masked.
#[async_trait]
pub trait Forwarder: Send + Sync {
    /// Forward a send-email request and return the upstream response.
    async fn forward(&self, request: ForwardRequest) -> Result<UpstreamResponse>;
}

/// Forwarder backed by a `reqwest` client.
pub struct HttpForwarder {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpForwarder {
    /// Create a forwarder posting to `<base_url>/v2/notifications/email`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: format!("{}{}", base_url.trim_end_matches('/'), EMAIL_ENDPOINT),
        })
    }

    /// Full URL requests are forwarded to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

/// Copy inbound headers, minus host and framing headers.
fn upstream_headers(inbound: &HeaderMap) -> HeaderMap {
    inbound
        .iter()
        .filter(|(name, _)| !SKIPPED_HEADERS.contains(*name))
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect()
}

#[async_trait]
impl Forwarder for HttpForwarder {
    async fn forward(&self, request: ForwardRequest) -> Result<UpstreamResponse> {
        debug!(endpoint = %self.endpoint, "Forwarding request upstream");

        let response = self
            .client
            .post(&self.endpoint)
            .headers(upstream_headers(&request.headers))
            .body(request.body)
            .send()
            .await
            .map_err(|e| {
                error!(endpoint = %self.endpoint, error = %e, "Upstream request failed");
                e
            })?;

        let status = response.status();
        let content_type = response.headers().get(header::CONTENT_TYPE).cloned();
        let body = response.bytes().await?;

        debug!(status = %status, bytes = body.len(), "Relaying upstream response");

        Ok(UpstreamResponse {
            status,
            content_type,
            body,
        })
    }
}
