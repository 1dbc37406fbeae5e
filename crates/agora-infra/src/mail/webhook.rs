//! Mail delivery through an HTTP mail API.

use async_trait::async_trait;
use serde::Serialize;

use agora_core::ports::{MailError, MailMessage, MailSender};

#[derive(Debug, Clone)]
pub struct WebhookMailConfig {
    pub url: String,
    pub api_key: Option<String>,
    pub from: String,
}

#[derive(Serialize)]
struct Payload<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    text: &'a str,
}

/// Posts each message as JSON to the configured endpoint.
pub struct WebhookMailSender {
    config: WebhookMailConfig,
    client: reqwest::Client,
}

impl WebhookMailSender {
    pub fn new(config: WebhookMailConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl MailSender for WebhookMailSender {
    async fn send(&self, message: MailMessage) -> Result<(), MailError> {
        let payload = Payload {
            from: &self.config.from,
            to: &message.to,
            subject: &message.subject,
            text: &message.body,
        };

        let mut request = self.client.post(&self.config.url).json(&payload);
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| MailError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = %status, to = %message.to, "Mail provider rejected message");
            return Err(MailError::Rejected(format!("{status}: {body}")));
        }

        tracing::info!(to = %message.to, subject = %message.subject, "Mail sent");
        Ok(())
    }
}
