use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Comment, Notification, Post, User};
use crate::error::RepoError;

/// Generic repository trait defining standard CRUD operations.
#[async_trait]
pub trait BaseRepository<T, ID>: Send + Sync {
    /// Find an entity by its unique ID.
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, RepoError>;

    /// Save an entity (create or update).
    async fn save(&self, entity: T) -> Result<T, RepoError>;

    /// Delete an entity by its ID.
    async fn delete(&self, id: ID) -> Result<(), RepoError>;
}

/// User repository with domain-specific methods.
///
/// The membership operations have set semantics: adding a present member or
/// removing an absent one is a no-op, and the returned flag tells whether the
/// set changed. `save` persists account fields only; graph and like
/// membership is written exclusively through the membership operations.
#[async_trait]
pub trait UserRepository: BaseRepository<User, Uuid> {
    /// Find a user by their email address.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError>;

    /// Find the user holding a pending password reset token.
    async fn find_by_reset_token(&self, token: &str) -> Result<Option<User>, RepoError>;

    /// Fetch every user whose id is in `ids`. Missing ids are skipped.
    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<User>, RepoError>;

    async fn find_all(&self) -> Result<Vec<User>, RepoError>;

    /// Case-insensitive substring match on username or full name.
    async fn search(&self, query: &str) -> Result<Vec<User>, RepoError>;

    async fn add_follower(&self, user_id: Uuid, follower_id: Uuid) -> Result<bool, RepoError>;

    async fn remove_follower(&self, user_id: Uuid, follower_id: Uuid)
    -> Result<bool, RepoError>;

    async fn add_following(&self, user_id: Uuid, followee_id: Uuid) -> Result<bool, RepoError>;

    async fn remove_following(&self, user_id: Uuid, followee_id: Uuid)
    -> Result<bool, RepoError>;

    async fn add_liked_post(&self, user_id: Uuid, post_id: Uuid) -> Result<bool, RepoError>;

    async fn remove_liked_post(&self, user_id: Uuid, post_id: Uuid) -> Result<bool, RepoError>;
}

/// Post repository.
///
/// Likes and comments are written through `add_like`, `remove_like` and
/// `push_comment`; `save` persists the post body and media only.
#[async_trait]
pub trait PostRepository: BaseRepository<Post, Uuid> {
    /// Every post, newest first.
    async fn find_all(&self) -> Result<Vec<Post>, RepoError>;

    /// Posts owned by any of `user_ids`, newest first.
    async fn find_by_user_ids(&self, user_ids: &[Uuid]) -> Result<Vec<Post>, RepoError>;

    async fn add_like(&self, post_id: Uuid, user_id: Uuid) -> Result<bool, RepoError>;

    async fn remove_like(&self, post_id: Uuid, user_id: Uuid) -> Result<bool, RepoError>;

    /// Append a comment to the end of the post's comment sequence.
    async fn push_comment(&self, post_id: Uuid, comment: Comment) -> Result<(), RepoError>;
}

/// Notification repository. Notifications are never updated or deleted.
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn create(&self, notification: Notification) -> Result<Notification, RepoError>;

    /// Notifications addressed to `user_id`, newest first.
    async fn find_by_recipient(&self, user_id: Uuid) -> Result<Vec<Notification>, RepoError>;
}
