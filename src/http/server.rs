//! HTTP server implementation.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use super::handlers::{health, send_email, AppState};
use crate::error::{EmulatorError, Result};
use crate::notify::EMAIL_ENDPOINT;

/// Build the axum application.
///
/// CORS is fully permissive so browser-based load generators can call the
/// emulator directly.
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route(EMAIL_ENDPOINT, post(send_email))
        .route("/health", get(health))
        .layer(CorsLayer::very_permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// HTTP server for the emulator.
pub struct HttpServer {
    /// Address to bind to
    addr: String,
    /// Shared handler state
    state: Arc<AppState>,
}

impl HttpServer {
    /// Create a new HTTP server.
    pub fn new(addr: impl Into<String>, state: Arc<AppState>) -> Self {
        Self {
            addr: addr.into(),
            state,
        }
    }

    /// Start the HTTP server with graceful shutdown.
    ///
    /// The server will shut down when the provided signal resolves.
    pub async fn serve_with_shutdown<F>(self, signal: F) -> Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(&self.addr)
            .await
            .map_err(|source| EmulatorError::Bind {
                addr: self.addr.clone(),
                source,
            })?;

        info!(addr = %self.addr, "HTTP server listening");

        axum::serve(listener, app(self.state))
            .with_graceful_shutdown(signal)
            .await
            .map_err(|e| {
                error!(error = %e, "HTTP server failed");
                EmulatorError::Io(e)
            })
    }
}
