//! Synthetic "notification created" responses.

use serde::Serialize;
use uuid::Uuid;

use super::request::SendEmailRequest;

const DEFAULT_SUBJECT: &str = "Test Email";
const DEFAULT_BODY: &str = "This is a test email for rate limiting";
const FROM_EMAIL: &str = "test.notifications@example.gov.uk";
const UNSUBSCRIBE_URL: &str = "https://example.com/unsubscribe";

/// Response body returned for a mocked send-email request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MockNotification {
    pub id: Uuid,
    pub reference: String,
    pub content: MockContent,
    pub uri: String,
    pub template: MockTemplate,
}

/// Rendered message content.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MockContent {
    pub subject: String,
    pub body: String,
    pub from_email: String,
    pub one_click_unsubscribe_url: String,
}

/// Template reference.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MockTemplate {
    pub id: Uuid,
    pub version: u32,
    pub uri: String,
}

impl MockNotification {
    /// Build a response for `request` with fresh notification and template
    /// ids, linking to `base_url`.
    pub fn for_request(request: &SendEmailRequest<'_>, base_url: &str) -> Self {
        let id = Uuid::new_v4();
        let template_id = Uuid::new_v4();

        let subject = request
            .template_id()
            .filter(|t| !t.is_empty())
            .unwrap_or(DEFAULT_SUBJECT);

        Self {
            id,
            reference: request.reference().unwrap_or_default().to_string(),
            content: MockContent {
                subject: subject.to_string(),
                body: request
                    .personalisation_body()
                    .unwrap_or(DEFAULT_BODY)
                    .to_string(),
                from_email: FROM_EMAIL.to_string(),
                one_click_unsubscribe_url: UNSUBSCRIBE_URL.to_string(),
            },
            uri: format!("{}/v2/notifications/{}", base_url, id),
            template: MockTemplate {
                id: template_id,
                version: 1,
                uri: format!("{}/v2/template/{}", base_url, template_id),
            },
        }
    }
}
