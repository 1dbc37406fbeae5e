use async_trait::async_trait;

use agora_core::ports::{MailError, MailMessage, MailSender};

/// Writes messages to the log instead of delivering them. Used when no mail
/// provider is configured, so reset links stay reachable in development.
#[derive(Debug, Default)]
pub struct LogMailSender;

#[async_trait]
impl MailSender for LogMailSender {
    async fn send(&self, message: MailMessage) -> Result<(), MailError> {
        tracing::info!(to = %message.to, subject = %message.subject, "Mail not sent: no provider configured");
        tracing::debug!(body = %message.body, "Undelivered mail body");
        Ok(())
    }
}
