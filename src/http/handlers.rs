//! HTTP handlers for the emulator service.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::forward::{ForwardRequest, Forwarder};
use crate::error::EmulatorError;
use crate::notify::{Decision, NotifyRouter};

/// Shared application state.
pub struct AppState {
    pub router: NotifyRouter,
    pub forwarder: Arc<dyn Forwarder>,
}

/// Error response body, in the `{"detail": ...}` shape clients of the
/// emulator already parse.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub detail: String,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

impl IntoResponse for EmulatorError {
    fn into_response(self) -> Response {
        let status = match &self {
            EmulatorError::InvalidBody(_) => StatusCode::BAD_REQUEST,
            EmulatorError::LimitExceeded(_) => StatusCode::TOO_MANY_REQUESTS,
            EmulatorError::Upstream(e) if e.is_timeout() => StatusCode::GATEWAY_TIMEOUT,
            EmulatorError::Upstream(_) => StatusCode::BAD_GATEWAY,
            EmulatorError::Config(_) | EmulatorError::Bind { .. } | EmulatorError::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (
            status,
            Json(ErrorResponse {
                detail: self.to_string(),
            }),
        )
            .into_response()
    }
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Intercept a send-email request: mock it under rate limits, or forward it
/// to the real API and relay the answer.
pub async fn send_email(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let payload: Value = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(e) => {
            warn!(error = %e, "Rejecting send-email request with invalid JSON body");
            return EmulatorError::InvalidBody(e).into_response();
        }
    };

    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    match state.router.handle_send_request(&payload, auth_header) {
        Decision::Mock(notification) => (StatusCode::CREATED, Json(notification)).into_response(),
        Decision::LimitExceeded(exceeded) => EmulatorError::from(exceeded).into_response(),
        Decision::Forward => {
            match state.forwarder.forward(ForwardRequest { headers, body }).await {
                Ok(upstream) => {
                    debug!(status = %upstream.status, "Relaying forwarded response");
                    upstream.into_response()
                }
                Err(e) => e.into_response(),
            }
        }
    }
}
