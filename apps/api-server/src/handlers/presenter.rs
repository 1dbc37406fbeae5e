//! Conversions between domain values and wire types.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use agora_core::domain::{CommentView, NotificationView, PostView, User, UserSummary};
use agora_core::ports::MediaUpload;
use agora_shared::dto::{
    CommentResponse, MediaPayload, NotificationResponse, PostResponse, UserResponse,
    UserSummaryResponse,
};

use crate::middleware::error::AppError;

pub fn user(user: &User) -> UserResponse {
    UserResponse {
        id: user.id,
        username: user.username.clone(),
        full_name: user.full_name.clone(),
        email: user.email.clone(),
        followers: user.followers.iter().copied().collect(),
        following: user.following.iter().copied().collect(),
        liked_posts: user.liked_posts.iter().copied().collect(),
        profile_img: user.profile_img.as_ref().map(|img| img.url.clone()),
        cover_img: user.cover_img.as_ref().map(|img| img.url.clone()),
        bio: user.bio.clone(),
        link: user.link.clone(),
        created_at: user.created_at,
        updated_at: user.updated_at,
    }
}

pub fn summary(summary: UserSummary) -> UserSummaryResponse {
    UserSummaryResponse {
        id: summary.id,
        username: summary.username,
        full_name: summary.full_name,
        profile_img: summary.profile_img,
    }
}

pub fn comment(view: CommentView) -> CommentResponse {
    CommentResponse {
        id: view.comment.id,
        text: view.comment.text,
        user: view.author.map(summary),
        created_at: view.comment.created_at,
    }
}

pub fn post(view: PostView) -> PostResponse {
    let PostView {
        post,
        author,
        comments,
    } = view;

    PostResponse {
        id: post.id,
        user: author.map(summary),
        media_type: post.media_type().to_string(),
        media_url: post.media.map(|media| media.url),
        text: post.text,
        likes: post.likes.into_iter().collect(),
        comments: comments.into_iter().map(comment).collect(),
        created_at: post.created_at,
        updated_at: post.updated_at,
    }
}

pub fn notification(view: NotificationView) -> NotificationResponse {
    NotificationResponse {
        id: view.notification.id,
        from: view.from.map(summary),
        to: view.notification.to,
        kind: view.notification.kind.as_str().to_string(),
        created_at: view.notification.created_at,
    }
}

/// Decode an embedded file. Data URLs (`data:image/png;base64,...`) are
/// accepted as well as bare base64.
pub fn media(payload: MediaPayload, max_bytes: usize) -> Result<MediaUpload, AppError> {
    let encoded = payload
        .data
        .split_once(";base64,")
        .map(|(_, data)| data)
        .unwrap_or(&payload.data);

    let bytes = STANDARD
        .decode(encoded.trim())
        .map_err(|e| AppError::BadRequest(format!("Media data is not valid base64: {}", e)))?;

    if bytes.len() > max_bytes {
        return Err(AppError::BadRequest(format!(
            "Media exceeds the {} byte limit",
            max_bytes
        )));
    }

    Ok(MediaUpload {
        content_type: payload.content_type.trim().to_lowercase(),
        bytes,
    })
}
