//! Domain entities - the core business objects.

mod notification;
mod post;
mod user;
mod views;

pub use notification::{Notification, NotificationKind};
pub use post::{Comment, MediaAttachment, MediaKind, Post};
pub use user::{ResetToken, StoredImage, User, UserSummary};
pub use views::{CommentView, NotificationView, PostView};
