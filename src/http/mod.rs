//! HTTP surface: the intercepted Notify endpoint and upstream forwarding.

mod forward;
mod handlers;
mod server;

pub use forward::{ForwardRequest, Forwarder, HttpForwarder, UpstreamResponse};
pub use handlers::{health, send_email, AppState, ErrorResponse, HealthResponse};
pub use server::{app, HttpServer};
