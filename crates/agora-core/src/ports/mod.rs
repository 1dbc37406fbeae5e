//! Ports - trait definitions for external dependencies.
//! These are the "interfaces" that infrastructure must implement.

mod auth;
mod mail;
mod media;
mod repository;

pub use auth::{AuthError, PasswordService, TokenClaims, TokenService};
pub use mail::{MailError, MailMessage, MailSender};
pub use media::{MediaError, MediaStore, MediaUpload, StoredMedia};
pub use repository::{BaseRepository, NotificationRepository, PostRepository, UserRepository};
