//! View over an inbound send-email payload.
//!
//! The body is kept as a raw JSON document so that requests which are not
//! mocked can be forwarded untouched, whatever fields they carry.

use serde_json::Value;

/// Borrowed accessors for the fields the emulator reads.
#[derive(Debug, Clone, Copy)]
pub struct SendEmailRequest<'a> {
    body: &'a Value,
}

impl<'a> SendEmailRequest<'a> {
    /// Wrap a parsed request body.
    pub fn new(body: &'a Value) -> Self {
        Self { body }
    }

    fn str_field(&self, name: &str) -> Option<&'a str> {
        self.body.get(name).and_then(Value::as_str)
    }

    /// Recipient address, if present and a string.
    pub fn email_address(&self) -> Option<&'a str> {
        self.str_field("email_address")
    }

    /// Template id, used as a subject hint by the mock.
    pub fn template_id(&self) -> Option<&'a str> {
        self.str_field("template_id")
    }

    /// Caller-supplied reference.
    pub fn reference(&self) -> Option<&'a str> {
        self.str_field("reference")
    }

    /// `personalisation.body`, if present and a string.
    pub fn personalisation_body(&self) -> Option<&'a str> {
        self.body
            .get("personalisation")
            .and_then(|p| p.get("body"))
            .and_then(Value::as_str)
    }

    /// Whether the recipient address carries the test marker.
    pub fn is_marked(&self, marker: &str) -> bool {
        self.email_address()
            .is_some_and(|address| address.contains(marker))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_reads_fields() {
        let body = json!({
            "email_address": "user+test-ratelimit@example.com",
            "template_id": "f33517ff-2a88-4f6e-b855-c550268ce08a",
            "reference": "ref-1",
            "personalisation": { "body": "Hello", "name": "Ada" }
        });
        let request = SendEmailRequest::new(&body);

        assert_eq!(request.email_address(), Some("user+test-ratelimit@example.com"));
        assert_eq!(request.template_id(), Some("f33517ff-2a88-4f6e-b855-c550268ce08a"));
        assert_eq!(request.reference(), Some("ref-1"));
        assert_eq!(request.personalisation_body(), Some("Hello"));
        assert!(request.is_marked("test-ratelimit"));
    }

    #[test]
    fn test_missing_or_mistyped_fields() {
        let body = json!({
            "email_address": 12,
            "reference": null,
            "personalisation": "flat"
        });
        let request = SendEmailRequest::new(&body);

        assert_eq!(request.email_address(), None);
        assert_eq!(request.reference(), None);
        assert_eq!(request.personalisation_body(), None);
        assert!(!request.is_marked("test-ratelimit"));
    }

    #[test]
    fn test_unmarked_address() {
        let body = json!({ "email_address": "someone@example.com" });
        assert!(!SendEmailRequest::new(&body).is_marked("test-ratelimit"));
    }
}
