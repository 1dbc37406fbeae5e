//! In-memory document store - used when no database is configured.
//!
//! Each repository keeps its documents behind an async `RwLock`. Membership
//! updates run under the write lock, so they are atomic per document and
//! naturally idempotent. Data is lost on process restart.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use agora_core::domain::{Comment, Notification, Post, User};
use agora_core::error::RepoError;
use agora_core::ports::{BaseRepository, NotificationRepository, PostRepository, UserRepository};

/// In-memory user repository.
#[derive(Default)]
pub struct InMemoryUserRepository {
    store: RwLock<HashMap<Uuid, User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    async fn mutate<F>(&self, user_id: Uuid, f: F) -> Result<bool, RepoError>
    where
        F: FnOnce(&mut User) -> bool + Send,
    {
        let mut store = self.store.write().await;
        let user = store.get_mut(&user_id).ok_or(RepoError::NotFound)?;
        Ok(f(user))
    }
}

#[async_trait]
impl BaseRepository<User, Uuid> for InMemoryUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        Ok(self.store.read().await.get(&id).cloned())
    }

    async fn save(&self, mut user: User) -> Result<User, RepoError> {
        let mut store = self.store.write().await;

        let clash = store.values().find(|other| {
            other.id != user.id
                && (other.email == user.email || other.username == user.username)
        });
        if let Some(other) = clash {
            let field = if other.email == user.email {
                "email"
            } else {
                "username"
            };
            return Err(RepoError::Constraint(format!("{field} already exists")));
        }

        // Membership is owned by the set operations, never by `save`.
        match store.get(&user.id) {
            Some(existing) => {
                user.followers = existing.followers.clone();
                user.following = existing.following.clone();
                user.liked_posts = existing.liked_posts.clone();
            }
            None => {
                user.followers.clear();
                user.following.clear();
                user.liked_posts.clear();
            }
        }

        store.insert(user.id, user.clone());
        Ok(user)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        self.store
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or(RepoError::NotFound)
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        let store = self.store.read().await;
        Ok(store.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        let store = self.store.read().await;
        Ok(store.values().find(|u| u.username == username).cloned())
    }

    async fn find_by_reset_token(&self, token: &str) -> Result<Option<User>, RepoError> {
        let store = self.store.read().await;
        Ok(store
            .values()
            .find(|u| u.reset_token.as_ref().is_some_and(|r| r.token == token))
            .cloned())
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<User>, RepoError> {
        let store = self.store.read().await;
        Ok(ids.iter().filter_map(|id| store.get(id).cloned()).collect())
    }

    async fn find_all(&self) -> Result<Vec<User>, RepoError> {
        let mut users: Vec<User> = self.store.read().await.values().cloned().collect();
        users.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(users)
    }

    async fn search(&self, query: &str) -> Result<Vec<User>, RepoError> {
        let needle = query.to_lowercase();
        let mut users: Vec<User> = self
            .store
            .read()
            .await
            .values()
            .filter(|u| {
                u.username.to_lowercase().contains(&needle)
                    || u
                        .full_name
                        .as_ref()
                        .is_some_and(|name| name.to_lowercase().contains(&needle))
            })
            .cloned()
            .collect();
        users.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(users)
    }

    async fn add_follower(&self, user_id: Uuid, follower_id: Uuid) -> Result<bool, RepoError> {
        self.mutate(user_id, |u| u.followers.insert(follower_id)).await
    }

    async fn remove_follower(&self, user_id: Uuid, follower_id: Uuid) -> Result<bool, RepoError> {
        self.mutate(user_id, |u| u.followers.remove(&follower_id)).await
    }

    async fn add_following(&self, user_id: Uuid, followee_id: Uuid) -> Result<bool, RepoError> {
        self.mutate(user_id, |u| u.following.insert(followee_id)).await
    }

    async fn remove_following(&self, user_id: Uuid, followee_id: Uuid) -> Result<bool, RepoError> {
        self.mutate(user_id, |u| u.following.remove(&followee_id)).await
    }

    async fn add_liked_post(&self, user_id: Uuid, post_id: Uuid) -> Result<bool, RepoError> {
        self.mutate(user_id, |u| u.liked_posts.insert(post_id)).await
    }

    async fn remove_liked_post(&self, user_id: Uuid, post_id: Uuid) -> Result<bool, RepoError> {
        self.mutate(user_id, |u| u.liked_posts.remove(&post_id)).await
    }
}

/// In-memory post repository.
#[derive(Default)]
pub struct InMemoryPostRepository {
    store: RwLock<HashMap<Uuid, Post>>,
}

impl InMemoryPostRepository {
    pub fn new() -> Self {
        Self::default()
    }

    async fn mutate<F, R>(&self, post_id: Uuid, f: F) -> Result<R, RepoError>
    where
        F: FnOnce(&mut Post) -> R + Send,
    {
        let mut store = self.store.write().await;
        let post = store.get_mut(&post_id).ok_or(RepoError::NotFound)?;
        Ok(f(post))
    }

    fn newest_first(mut posts: Vec<Post>) -> Vec<Post> {
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        posts
    }
}

#[async_trait]
impl BaseRepository<Post, Uuid> for InMemoryPostRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        Ok(self.store.read().await.get(&id).cloned())
    }

    async fn save(&self, mut post: Post) -> Result<Post, RepoError> {
        let mut store = self.store.write().await;

        match store.get(&post.id) {
            Some(existing) => {
                post.likes = existing.likes.clone();
                post.comments = existing.comments.clone();
            }
            None => {
                post.likes.clear();
                post.comments.clear();
            }
        }

        store.insert(post.id, post.clone());
        Ok(post)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        self.store
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or(RepoError::NotFound)
    }
}

#[async_trait]
impl PostRepository for InMemoryPostRepository {
    async fn find_all(&self) -> Result<Vec<Post>, RepoError> {
        let posts = self.store.read().await.values().cloned().collect();
        Ok(Self::newest_first(posts))
    }

    async fn find_by_user_ids(&self, user_ids: &[Uuid]) -> Result<Vec<Post>, RepoError> {
        let posts = self
            .store
            .read()
            .await
            .values()
            .filter(|p| user_ids.contains(&p.user_id))
            .cloned()
            .collect();
        Ok(Self::newest_first(posts))
    }

    async fn add_like(&self, post_id: Uuid, user_id: Uuid) -> Result<bool, RepoError> {
        self.mutate(post_id, |p| p.likes.insert(user_id)).await
    }

    async fn remove_like(&self, post_id: Uuid, user_id: Uuid) -> Result<bool, RepoError> {
        self.mutate(post_id, |p| p.likes.remove(&user_id)).await
    }

    async fn push_comment(&self, post_id: Uuid, comment: Comment) -> Result<(), RepoError> {
        self.mutate(post_id, |p| p.comments.push(comment)).await
    }
}

/// In-memory notification log, kept in insertion order.
#[derive(Default)]
pub struct InMemoryNotificationRepository {
    store: RwLock<Vec<Notification>>,
}

impl InMemoryNotificationRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl NotificationRepository for InMemoryNotificationRepository {
    async fn create(&self, notification: Notification) -> Result<Notification, RepoError> {
        self.store.write().await.push(notification.clone());
        Ok(notification)
    }

    async fn find_by_recipient(&self, user_id: Uuid) -> Result<Vec<Notification>, RepoError> {
        let store = self.store.read().await;
        // Reverse first so equal timestamps keep newest-first after the stable sort.
        let mut found: Vec<Notification> = store
            .iter()
            .rev()
            .filter(|n| n.to == user_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(found)
    }
}
