//! Notifier trait and implementations

use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

use crate::error::NotifyError;
use crate::message::Message;
use crate::Result;

/// Delivery channel for rendered messages
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver one message
    async fn send(&self, message: &Message) -> Result<()>;
}

// ==================== Log Implementation ====================

/// Notifier for test runs: logs what would have been sent
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

impl LogNotifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, message: &Message) -> Result<()> {
        info!(
            to = %message.to,
            subject = %message.subject,
            kind = ?message.kind,
            "Notification not sent (test mode)"
        );
        debug!(body = %message.body, "Notification body");
        Ok(())
    }
}

// ==================== HTTP Implementation ====================

#[derive(Debug, Serialize, PartialEq)]
struct Address<'a> {
    email: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct MailPayload<'a> {
    from: Address<'a>,
    to: Vec<Address<'a>>,
    subject: &'a str,
    text: &'a str,
}

/// Sends messages through a transactional mail relay
///
/// Each message is one JSON `POST` authenticated with a bearer API key.
pub struct HttpMailer {
    client: reqwest::Client,
    endpoint: Url,
    api_key: String,
    from_address: String,
    from_name: String,
}

impl HttpMailer {
    /// Create a new mailer
    pub fn new(
        endpoint: &str,
        api_key: impl Into<String>,
        from_address: impl Into<String>,
        from_name: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let endpoint = Url::parse(endpoint)
            .map_err(|e| NotifyError::Config(format!("invalid endpoint '{}': {}", endpoint, e)))?;

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NotifyError::Config(e.to_string()))?;

        Ok(Self {
            client,
            endpoint,
            api_key: api_key.into(),
            from_address: from_address.into(),
            from_name: from_name.into(),
        })
    }

    /// Create a mailer from config; the sender name falls back to the carousel name
    pub fn from_config(config: &config::CarouselConfig) -> Result<Self> {
        let notifications = &config.notifications;
        let from_name = notifications
            .from_name
            .clone()
            .unwrap_or_else(|| config.carousel.name.clone());

        Self::new(
            &notifications.endpoint,
            notifications.api_key.clone(),
            notifications.from_address.clone(),
            from_name,
            Duration::from_secs(notifications.send_timeout_seconds),
        )
    }

    fn payload<'a>(&'a self, message: &'a Message) -> MailPayload<'a> {
        let to_name = message.to_name.trim();
        MailPayload {
            from: Address {
                email: &self.from_address,
                name: Some(&self.from_name),
            },
            to: vec![Address {
                email: message.to.as_str(),
                name: (!to_name.is_empty()).then_some(to_name),
            }],
            subject: &message.subject,
            text: &message.body,
        }
    }
}

#[async_trait]
impl Notifier for HttpMailer {
    async fn send(&self, message: &Message) -> Result<()> {
        if message.to.is_empty() || !message.to.as_str().contains('@') {
            return Err(NotifyError::InvalidRecipient(message.to.to_string()));
        }

        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(&self.api_key)
            .json(&self.payload(message))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Rejected {
                recipient: message.to.clone(),
                status: status.as_u16(),
                body,
            });
        }

        debug!(to = %message.to, "Notification sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Templates;
    use assert_matches::assert_matches;
    use common::Email;

    fn mailer() -> HttpMailer {
        HttpMailer::new(
            "https://mail.example.com/send",
            "key",
            "carousel@example.com",
            "Union St Coffee Carousel",
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[test]
    fn test_payload_shape() {
        let mailer = mailer();
        let message = Templates::new("Sig", "Coffee Time").no_match(&Email::new("ann@x.com"), "Ann");

        let json = serde_json::to_value(mailer.payload(&message)).unwrap();
        assert_eq!(json["from"]["email"], "carousel@example.com");
        assert_eq!(json["from"]["name"], "Union St Coffee Carousel");
        assert_eq!(json["to"][0]["email"], "ann@x.com");
        assert_eq!(json["to"][0]["name"], "Ann");
        assert_eq!(json["subject"], "Coffee Time");
        assert!(json["text"].as_str().unwrap().contains("Hi Ann"));
    }

    #[test]
    fn test_payload_omits_blank_recipient_name() {
        let mailer = mailer();
        let message = Templates::new("Sig", "S").no_match(&Email::new("ann@x.com"), "");

        let json = serde_json::to_value(mailer.payload(&message)).unwrap();
        assert!(json["to"][0].get("name").is_none());
    }

    #[test]
    fn test_invalid_endpoint() {
        let result = HttpMailer::new("nope", "k", "a@b.c", "n", Duration::from_secs(1));
        assert_matches!(result.err(), Some(NotifyError::Config(_)));
    }

    #[tokio::test]
    async fn test_rejects_bad_recipient_without_io() {
        let mailer = mailer();
        let message = Templates::new("Sig", "S").no_match(&Email::new("not-an-address"), "X");
        assert_matches!(
            mailer.send(&message).await,
            Err(NotifyError::InvalidRecipient(_))
        );
    }

    #[tokio::test]
    async fn test_log_notifier_always_succeeds() {
        let message = Templates::new("Sig", "S").no_match(&Email::new("a@x.com"), "A");
        assert!(LogNotifier::new().send(&message).await.is_ok());
    }
}
