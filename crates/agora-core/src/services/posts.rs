//! Post lifecycle: creation with optional media, owner-only deletion, feeds.

use std::collections::HashMap;
use std::sync::Arc;

use uuid::Uuid;

use super::{Actor, resolve_summaries};
use crate::domain::{
    CommentView, MediaAttachment, MediaKind, Post, PostView, User, UserSummary,
};
use crate::error::{DomainError, RepoError};
use crate::ports::{MediaError, MediaStore, MediaUpload, PostRepository, UserRepository};

/// Input for [`PostService::create`].
#[derive(Debug, Clone, Default)]
pub struct NewPost {
    pub text: Option<String>,
    pub media: Option<MediaUpload>,
}

/// Which posts a feed contains.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FeedFilter {
    #[default]
    All,
    /// Only posts by users the actor follows.
    Following,
}

/// What happened to a deleted post's media.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaCleanup {
    NoMedia,
    Removed,
    /// The media store no longer had the object.
    AlreadyGone,
    /// The media store refused; the post was deleted regardless.
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostDeletion {
    pub post_id: Uuid,
    pub media_cleanup: MediaCleanup,
}

pub struct PostService {
    users: Arc<dyn UserRepository>,
    posts: Arc<dyn PostRepository>,
    media: Arc<dyn MediaStore>,
}

impl PostService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        posts: Arc<dyn PostRepository>,
        media: Arc<dyn MediaStore>,
    ) -> Self {
        Self {
            users,
            posts,
            media,
        }
    }

    /// Publish a post. Media is uploaded before the post is stored, so an
    /// upload failure leaves nothing behind.
    pub async fn create(&self, actor: Actor, new_post: NewPost) -> Result<PostView, DomainError> {
        let text = new_post
            .text
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());

        let upload = match new_post.media {
            Some(upload) => {
                let kind = MediaKind::classify(&upload.content_type).ok_or_else(|| {
                    DomainError::UnsupportedMediaType(format!(
                        "{}; only images and videos are allowed",
                        upload.content_type
                    ))
                })?;
                if upload.bytes.is_empty() {
                    return Err(DomainError::Validation("media file is empty".into()));
                }
                Some((upload, kind))
            }
            None => None,
        };

        if text.is_none() && upload.is_none() {
            return Err(DomainError::Validation("a post needs text or media".into()));
        }

        let owner = self
            .users
            .find_by_id(actor.id)
            .await?
            .ok_or_else(|| DomainError::not_found("User", actor.id))?;

        let attachment = match upload {
            Some((upload, kind)) => {
                let stored = self
                    .media
                    .upload(&upload.bytes, kind, &upload.content_type)
                    .await
                    .map_err(|e| DomainError::Upload(e.to_string()))?;
                tracing::debug!(
                    actor = %actor.id,
                    public_id = %stored.public_id,
                    kind = %kind,
                    "Post media uploaded"
                );
                Some(MediaAttachment {
                    url: stored.url,
                    public_id: stored.public_id,
                    kind,
                })
            }
            None => None,
        };

        let saved = match self.store_post(actor, text, attachment.clone()).await {
            Ok(post) => post,
            Err(e) => {
                if let Some(media) = attachment {
                    self.discard_media(&media.public_id).await;
                }
                return Err(e);
            }
        };

        tracing::info!(
            actor = %actor.id,
            post = %saved.id,
            media_type = saved.media_type(),
            "Post created"
        );

        Ok(PostView {
            post: saved,
            author: Some(owner.summary()),
            comments: Vec::new(),
        })
    }

    /// Delete a post owned by the actor, removing its media first.
    pub async fn delete(&self, actor: Actor, post_id: Uuid) -> Result<PostDeletion, DomainError> {
        let post = self
            .posts
            .find_by_id(post_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Post", post_id))?;

        if !post.is_owned_by(actor.id) {
            tracing::warn!(actor = %actor.id, post = %post_id, "Rejected delete of foreign post");
            return Err(DomainError::Unauthorized);
        }

        let media_cleanup = match &post.media {
            None => MediaCleanup::NoMedia,
            Some(media) => match self.media.delete(&media.public_id).await {
                Ok(()) => MediaCleanup::Removed,
                Err(MediaError::NotFound(_)) => MediaCleanup::AlreadyGone,
                Err(e) => {
                    tracing::warn!(
                        post = %post_id,
                        public_id = %media.public_id,
                        error = %e,
                        "Failed to delete post media, deleting post anyway"
                    );
                    MediaCleanup::Failed(e.to_string())
                }
            },
        };

        self.posts.delete(post_id).await.map_err(|e| match e {
            RepoError::NotFound => DomainError::not_found("Post", post_id),
            other => DomainError::Store(other),
        })?;
        tracing::info!(actor = %actor.id, post = %post_id, "Post deleted");

        // Drop the post from its likers' liked sets; stores that cascade see no-ops.
        for liker in &post.likes {
            match self.users.remove_liked_post(*liker, post_id).await {
                Ok(_) | Err(RepoError::NotFound) => {}
                Err(e) => tracing::warn!(
                    post = %post_id,
                    user = %liker,
                    error = %e,
                    "Failed to unlink deleted post from liker"
                ),
            }
        }

        Ok(PostDeletion {
            post_id,
            media_cleanup,
        })
    }

    /// Posts newest first with owners and comment authors resolved.
    pub async fn feed(&self, actor: Actor, filter: FeedFilter) -> Result<Vec<PostView>, DomainError> {
        let mut posts = match filter {
            FeedFilter::All => self.posts.find_all().await?,
            FeedFilter::Following => {
                let user: User = self
                    .users
                    .find_by_id(actor.id)
                    .await?
                    .ok_or_else(|| DomainError::not_found("User", actor.id))?;
                if user.following.is_empty() {
                    return Ok(Vec::new());
                }
                let followed: Vec<Uuid> = user.following.iter().copied().collect();
                self.posts.find_by_user_ids(&followed).await?
            }
        };
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let people = resolve_summaries(
            self.users.as_ref(),
            posts
                .iter()
                .flat_map(|p| std::iter::once(p.user_id).chain(p.comments.iter().map(|c| c.user_id)))
                .collect::<Vec<_>>(),
        )
        .await?;

        Ok(posts
            .into_iter()
            .map(|post| Self::view(post, &people))
            .collect())
    }

    fn view(post: Post, people: &HashMap<Uuid, UserSummary>) -> PostView {
        let comments = post
            .comments
            .iter()
            .map(|comment| CommentView {
                author: people.get(&comment.user_id).cloned(),
                comment: comment.clone(),
            })
            .collect();

        PostView {
            author: people.get(&post.user_id).cloned(),
            comments,
            post,
        }
    }

    async fn store_post(
        &self,
        actor: Actor,
        text: Option<String>,
        media: Option<MediaAttachment>,
    ) -> Result<Post, DomainError> {
        let post = Post::new(actor.id, text, media)?;
        Ok(self.posts.save(post).await?)
    }

    async fn discard_media(&self, public_id: &str) {
        if let Err(e) = self.media.delete(public_id).await {
            tracing::warn!(public_id = %public_id, error = %e, "Failed to discard orphaned media");
        }
    }
}
