//! Mock-or-forward decision for send-email requests.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};

use super::mock::MockNotification;
use super::request::SendEmailRequest;
use crate::identity::{bearer_token, extract_identity, Identity};
use crate::ratelimit::{LimitExceeded, RateLimiter};

/// Outcome of routing one send-email request.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// Answer with a synthetic notification
    Mock(MockNotification),
    /// Reject the mocked request with 429
    LimitExceeded(LimitExceeded),
    /// Pass the request through to the real API
    Forward,
}

/// Decides, per request, between mocking with rate limits and forwarding.
///
/// Holds no state of its own beyond the shared limiter.
pub struct NotifyRouter {
    limiter: Arc<RateLimiter>,
    base_url: String,
    test_marker: String,
}

impl NotifyRouter {
    /// Create a router over a shared limiter.
    pub fn new(
        limiter: Arc<RateLimiter>,
        base_url: impl Into<String>,
        test_marker: impl Into<String>,
    ) -> Self {
        Self {
            limiter,
            base_url: base_url.into(),
            test_marker: test_marker.into(),
        }
    }

    /// The limiter requests are counted against.
    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    /// Route a send-email request given its parsed body and raw
    /// `Authorization` header.
    ///
    /// Only requests whose recipient carries the test marker *and* that
    /// present a bearer token are mocked; everything else is forwarded
    /// without touching the limiter.
    pub fn handle_send_request(&self, body: &Value, auth_header: Option<&str>) -> Decision {
        let request = SendEmailRequest::new(body);
        let token = auth_header.and_then(bearer_token);

        let token = match token {
            Some(token) if request.is_marked(&self.test_marker) => token,
            _ => {
                debug!("Request not marked for mocking, forwarding");
                return Decision::Forward;
            }
        };

        let identity = extract_identity(token).unwrap_or_else(|| {
            warn!("Bearer token has no readable issuer, limiting as anonymous");
            Identity::Anonymous
        });

        if let Err(exceeded) = self.limiter.admit(&identity) {
            info!(issuer = %identity, reason = %exceeded, "Mocked request rate limited");
            return Decision::LimitExceeded(exceeded);
        }

        let notification = MockNotification::for_request(&request, &self.base_url);
        info!(
            issuer = %identity,
            notification_id = %notification.id,
            "Mocking send-email request"
        );
        Decision::Mock(notification)
    }
}
