use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use agora_core::ports::{MailError, MailMessage, MailSender};

/// Collects messages in an outbox for inspection in tests.
#[derive(Default)]
pub struct InMemoryMailSender {
    outbox: Mutex<Vec<MailMessage>>,
    fail: AtomicBool,
}

impl InMemoryMailSender {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following delivery fail with a transport error.
    pub fn fail_deliveries(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub async fn sent(&self) -> Vec<MailMessage> {
        self.outbox.lock().await.clone()
    }
}

#[async_trait]
impl MailSender for InMemoryMailSender {
    async fn send(&self, message: MailMessage) -> Result<(), MailError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(MailError::Transport("outbox closed".into()));
        }

        self.outbox.lock().await.push(message);
        Ok(())
    }
}
