//! Send-email interception: request view, mock responses and routing.

mod mock;
mod request;
mod router;

pub use mock::{MockContent, MockNotification, MockTemplate};
pub use request::SendEmailRequest;
pub use router::{Decision, NotifyRouter};

/// Path of the intercepted send-email endpoint.
pub const EMAIL_ENDPOINT: &str = "/v2/notifications/email";
