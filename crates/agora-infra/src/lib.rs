//! # Agora Infrastructure
//!
//! Concrete implementations of the ports defined in `agora-core`.
//! This crate contains the document stores, media stores, mail senders and
//! authentication services.
//!
//! ## Feature Flags
//!
//! - `full` (default) - All features enabled
//! - `minimal` - No external services, in-memory stores only
//! - `postgres` - PostgreSQL document store via SeaORM
//! - `auth` - JWT + Argon2 authentication

pub mod database;
pub mod mail;
pub mod media;

#[cfg(feature = "auth")]
pub mod auth;

// Re-exports - In-Memory
pub use database::{
    DatabaseConfig, DatabaseConnections, InMemoryNotificationRepository, InMemoryPostRepository,
    InMemoryUserRepository,
};
pub use mail::{InMemoryMailSender, LogMailSender, WebhookMailConfig, WebhookMailSender};
pub use media::{InMemoryMediaStore, LocalMediaStore, MediaFile};

#[cfg(feature = "auth")]
pub use auth::{Argon2PasswordService, JwtConfig, JwtTokenService};

#[cfg(feature = "postgres")]
pub use database::{
    PostgresNotificationRepository, PostgresPostRepository, PostgresUserRepository,
};
