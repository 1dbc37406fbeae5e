//! Post handlers: create, feed, delete, like and comment.

use actix_web::{HttpResponse, web};
use uuid::Uuid;

use agora_core::services::{FeedFilter, LikeToggle, MediaCleanup, NewPost};
use agora_shared::dto::{
    CommentEnvelope, CommentRequest, CreatePostRequest, FeedQuery, FeedScope, MessageResponse,
    PostEnvelope, PostsEnvelope,
};

use super::presenter;
use crate::middleware::auth::Identity;
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// POST /api/posts/create
pub async fn create(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<CreatePostRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let media = req
        .media
        .map(|payload| presenter::media(payload, state.config.media.max_upload_bytes))
        .transpose()?;

    let view = state
        .posts
        .create(
            identity.actor(),
            NewPost {
                text: req.text,
                media,
            },
        )
        .await?;

    Ok(HttpResponse::Created().json(PostEnvelope {
        message: "Post created successfully".to_string(),
        post: presenter::post(view),
    }))
}

/// GET /api/posts/all?filter=all|following
pub async fn all(
    state: web::Data<AppState>,
    identity: Identity,
    query: web::Query<FeedQuery>,
) -> AppResult<HttpResponse> {
    let filter = match query.filter {
        FeedScope::All => FeedFilter::All,
        FeedScope::Following => FeedFilter::Following,
    };

    let posts = state.posts.feed(identity.actor(), filter).await?;

    Ok(HttpResponse::Ok().json(PostsEnvelope {
        message: format!("{} posts", posts.len()),
        posts: posts.into_iter().map(presenter::post).collect(),
    }))
}

/// DELETE /api/posts/delete/{id}
pub async fn delete(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let deletion = state
        .posts
        .delete(identity.actor(), path.into_inner())
        .await?;

    let message = match deletion.media_cleanup {
        MediaCleanup::Failed(reason) => {
            format!("Post deleted, but its media could not be removed: {}", reason)
        }
        MediaCleanup::NoMedia | MediaCleanup::Removed | MediaCleanup::AlreadyGone => {
            "Post deleted successfully".to_string()
        }
    };

    Ok(HttpResponse::Ok().json(MessageResponse::new(message)))
}

/// POST /api/posts/like/{id} - likes or unlikes depending on current state.
pub async fn like(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let outcome = state
        .engagement
        .toggle_like(identity.actor(), path.into_inner())
        .await?;

    let message = match outcome {
        LikeToggle::Liked => "Post liked successfully",
        LikeToggle::Unliked => "Post unliked successfully",
    };

    Ok(HttpResponse::Ok().json(MessageResponse::new(message)))
}

/// POST /api/posts/comment/{id}
pub async fn comment(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
    body: web::Json<CommentRequest>,
) -> AppResult<HttpResponse> {
    let view = state
        .engagement
        .comment(identity.actor(), path.into_inner(), &body.text)
        .await?;

    Ok(HttpResponse::Ok().json(CommentEnvelope {
        message: "Comment added successfully".to_string(),
        comment: presenter::comment(view),
    }))
}
