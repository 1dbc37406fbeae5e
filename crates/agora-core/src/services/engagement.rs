//! The engagement engine: follow graph, likes and comments.
//!
//! Every mutation touching two documents runs as a small saga: primary
//! write, secondary write, then a best-effort notification. Membership
//! writes have set semantics, so retrying after a partial failure converges
//! instead of duplicating entries.

use std::sync::Arc;

use uuid::Uuid;

use super::{Actor, Notifier};
use crate::domain::{Comment, CommentView, NotificationKind, Post, User, UserSummary};
use crate::error::DomainError;
use crate::ports::{PostRepository, UserRepository};
use crate::sync::KeyedMutex;

/// Outcome of [`EngagementService::toggle_like`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeToggle {
    Liked,
    Unliked,
}

pub struct EngagementService {
    users: Arc<dyn UserRepository>,
    posts: Arc<dyn PostRepository>,
    notifier: Arc<Notifier>,
    /// Serializes follow/unfollow per target user.
    follow_locks: KeyedMutex,
    /// Serializes like/unlike per post.
    like_locks: KeyedMutex,
}

impl EngagementService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        posts: Arc<dyn PostRepository>,
        notifier: Arc<Notifier>,
    ) -> Self {
        Self {
            users,
            posts,
            notifier,
            follow_locks: KeyedMutex::new(),
            like_locks: KeyedMutex::new(),
        }
    }

    /// Make `actor` follow `target_id`.
    ///
    /// Following someone already followed is rejected with
    /// [`DomainError::AlreadyFollowing`] rather than treated as a no-op.
    pub async fn follow(&self, actor: Actor, target_id: Uuid) -> Result<UserSummary, DomainError> {
        if actor.id == target_id {
            return Err(DomainError::Validation("you cannot follow yourself".into()));
        }

        let _guard = self.follow_locks.lock(target_id).await;
        let target = self.load_user(target_id).await?;
        let current = self.load_user(actor.id).await?;

        if target.is_followed_by(actor.id) {
            // Finish a follow that was interrupted after its first write.
            if !current.following.contains(&target_id) {
                self.users.add_following(actor.id, target_id).await?;
                tracing::warn!(
                    actor = %actor.id,
                    target = %target_id,
                    "Repaired one-sided follow relationship"
                );
            }
            return Err(DomainError::AlreadyFollowing {
                username: target.username,
            });
        }

        self.users.add_follower(target_id, actor.id).await?;
        self.users.add_following(actor.id, target_id).await?;
        tracing::info!(actor = %actor.id, target = %target_id, "User followed");

        self.notifier
            .emit(actor.id, target_id, NotificationKind::Follow)
            .await;

        Ok(target.summary())
    }

    /// Remove the follow relationship from `actor` to `target_id`.
    pub async fn unfollow(
        &self,
        actor: Actor,
        target_id: Uuid,
    ) -> Result<UserSummary, DomainError> {
        let _guard = self.follow_locks.lock(target_id).await;
        let target = self.load_user(target_id).await?;
        let current = self.load_user(actor.id).await?;

        if !target.is_followed_by(actor.id) {
            // Finish an unfollow that was interrupted after its first write.
            if current.following.contains(&target_id) {
                self.users.remove_following(actor.id, target_id).await?;
                tracing::warn!(
                    actor = %actor.id,
                    target = %target_id,
                    "Repaired one-sided follow relationship"
                );
            }
            return Err(DomainError::NotFollowing {
                username: target.username,
            });
        }

        self.users.remove_follower(target_id, actor.id).await?;
        self.users.remove_following(actor.id, target_id).await?;
        tracing::info!(actor = %actor.id, target = %target_id, "User unfollowed");

        Ok(target.summary())
    }

    /// Like the post if the actor has not liked it yet, unlike it otherwise.
    /// Only the transition to liked notifies the post owner.
    pub async fn toggle_like(&self, actor: Actor, post_id: Uuid) -> Result<LikeToggle, DomainError> {
        let _guard = self.like_locks.lock(post_id).await;
        let post = self.load_post(post_id).await?;
        self.load_user(actor.id).await?;

        if post.is_liked_by(actor.id) {
            self.posts.remove_like(post_id, actor.id).await?;
            self.users.remove_liked_post(actor.id, post_id).await?;
            tracing::info!(actor = %actor.id, post = %post_id, "Post unliked");
            return Ok(LikeToggle::Unliked);
        }

        self.posts.add_like(post_id, actor.id).await?;
        self.users.add_liked_post(actor.id, post_id).await?;
        tracing::info!(actor = %actor.id, post = %post_id, "Post liked");

        self.notifier
            .emit(actor.id, post.user_id, NotificationKind::Like)
            .await;

        Ok(LikeToggle::Liked)
    }

    /// Append a comment to a post and return it with its author resolved.
    pub async fn comment(
        &self,
        actor: Actor,
        post_id: Uuid,
        text: &str,
    ) -> Result<CommentView, DomainError> {
        let comment = Comment::new(actor.id, text)?;
        let post = self.load_post(post_id).await?;

        self.posts.push_comment(post_id, comment.clone()).await?;
        tracing::info!(
            actor = %actor.id,
            post = %post_id,
            comment = %comment.id,
            "Comment added"
        );

        let author = self
            .users
            .find_by_id(actor.id)
            .await?
            .map(|user| user.summary());

        self.notifier
            .emit(actor.id, post.user_id, NotificationKind::Comment)
            .await;

        Ok(CommentView { comment, author })
    }

    async fn load_user(&self, id: Uuid) -> Result<User, DomainError> {
        self.users
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("User", id))
    }

    async fn load_post(&self, id: Uuid) -> Result<Post, DomainError> {
        self.posts
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Post", id))
    }
}
