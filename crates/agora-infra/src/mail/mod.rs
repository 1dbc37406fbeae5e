//! Outbound mail: HTTP webhook provider, log-only, and in-memory.

mod log;
mod memory;
mod webhook;

pub use log::LogMailSender;
pub use memory::InMemoryMailSender;
pub use webhook::{WebhookMailConfig, WebhookMailSender};
