//! Read models with user references resolved to public identities.

use serde::Serialize;

use super::{Comment, Notification, Post, UserSummary};

/// A comment with its author attached.
#[derive(Debug, Clone, Serialize)]
pub struct CommentView {
    pub comment: Comment,
    pub author: Option<UserSummary>,
}

/// A post with its owner and comment authors attached.
#[derive(Debug, Clone, Serialize)]
pub struct PostView {
    pub post: Post,
    pub author: Option<UserSummary>,
    pub comments: Vec<CommentView>,
}

/// A notification with the acting user attached.
#[derive(Debug, Clone, Serialize)]
pub struct NotificationView {
    pub notification: Notification,
    pub from: Option<UserSummary>,
}
