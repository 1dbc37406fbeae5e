//! Mail sender port.

use async_trait::async_trait;

/// A plain-text message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[async_trait]
pub trait MailSender: Send + Sync {
    /// Deliver a message. Errors are returned to the caller, never retried.
    async fn send(&self, message: MailMessage) -> Result<(), MailError>;
}

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("Mail transport error: {0}")]
    Transport(String),

    #[error("Mail rejected: {0}")]
    Rejected(String),
}
