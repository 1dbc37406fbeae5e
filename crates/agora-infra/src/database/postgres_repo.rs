//! PostgreSQL repository implementations.
//!
//! Graph and like membership live in edge tables (`follows`, `post_likes`)
//! keyed by both endpoints, so set semantics come from the composite primary
//! key: inserts use `ON CONFLICT DO NOTHING` and the affected row count says
//! whether the set changed. Loaded documents get their edges and comments
//! attached in one batched query per table.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::{Expr, Func, OnConflict};
use sea_orm::{
    ColumnTrait, Condition, DbConn, DbErr, EntityTrait, QueryFilter, QueryOrder, Set, SqlErr,
};
use uuid::Uuid;

use agora_core::domain::{Comment, Notification, Post, User};
use agora_core::error::RepoError;
use agora_core::ports::{BaseRepository, NotificationRepository, PostRepository, UserRepository};

use super::entity::comment::{self, Entity as CommentEntity};
use super::entity::follow::{self, Entity as FollowEntity};
use super::entity::notification::{self, Entity as NotificationEntity};
use super::entity::post::{self, Entity as PostEntity};
use super::entity::post_like::{self, Entity as PostLikeEntity};
use super::entity::user::{self, Entity as UserEntity};
use super::postgres_base::{PostgresBaseRepository, query_error, write_error};

/// Edge writes against a missing endpoint surface as `NotFound`.
fn edge_error(err: DbErr) -> RepoError {
    match err.sql_err() {
        Some(SqlErr::ForeignKeyConstraintViolation(_)) => RepoError::NotFound,
        _ => write_error(err),
    }
}

/// Mask email for logging to avoid PII in logs.
fn mask_email(email: &str) -> String {
    match email.find('@') {
        Some(at_pos) => {
            let (local, domain) = email.split_at(at_pos);
            let masked_local = match local.chars().next() {
                Some(first) if local.len() > 1 => format!("{first}***"),
                _ => "***".to_string(),
            };
            format!("{masked_local}{domain}")
        }
        None => "***".to_string(),
    }
}

async fn insert_follow(db: &DbConn, follower_id: Uuid, followee_id: Uuid) -> Result<bool, RepoError> {
    let edge = follow::ActiveModel {
        follower_id: Set(follower_id),
        followee_id: Set(followee_id),
        created_at: Set(Utc::now().into()),
    };

    let inserted = FollowEntity::insert(edge)
        .on_conflict(
            OnConflict::columns([follow::Column::FollowerId, follow::Column::FolloweeId])
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(db)
        .await
        .map_err(edge_error)?;

    Ok(inserted > 0)
}

async fn delete_follow(db: &DbConn, follower_id: Uuid, followee_id: Uuid) -> Result<bool, RepoError> {
    let result = FollowEntity::delete_many()
        .filter(follow::Column::FollowerId.eq(follower_id))
        .filter(follow::Column::FolloweeId.eq(followee_id))
        .exec(db)
        .await
        .map_err(query_error)?;

    Ok(result.rows_affected > 0)
}

async fn insert_like(db: &DbConn, post_id: Uuid, user_id: Uuid) -> Result<bool, RepoError> {
    let edge = post_like::ActiveModel {
        post_id: Set(post_id),
        user_id: Set(user_id),
        created_at: Set(Utc::now().into()),
    };

    let inserted = PostLikeEntity::insert(edge)
        .on_conflict(
            OnConflict::columns([post_like::Column::PostId, post_like::Column::UserId])
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(db)
        .await
        .map_err(edge_error)?;

    Ok(inserted > 0)
}

async fn delete_like(db: &DbConn, post_id: Uuid, user_id: Uuid) -> Result<bool, RepoError> {
    let result = PostLikeEntity::delete_many()
        .filter(post_like::Column::PostId.eq(post_id))
        .filter(post_like::Column::UserId.eq(user_id))
        .exec(db)
        .await
        .map_err(query_error)?;

    Ok(result.rows_affected > 0)
}

/// PostgreSQL user repository.
pub struct PostgresUserRepository {
    base: PostgresBaseRepository<UserEntity>,
}

impl PostgresUserRepository {
    pub fn new(db: DbConn) -> Self {
        Self {
            base: PostgresBaseRepository::new(db),
        }
    }

    fn db(&self) -> &DbConn {
        &self.base.db
    }

    /// Attach followers, following and liked posts to freshly loaded users.
    async fn hydrate_many(&self, mut users: Vec<User>) -> Result<Vec<User>, RepoError> {
        if users.is_empty() {
            return Ok(users);
        }

        let ids: Vec<Uuid> = users.iter().map(|u| u.id).collect();
        let index: HashMap<Uuid, usize> = ids.iter().enumerate().map(|(i, id)| (*id, i)).collect();

        let inbound = FollowEntity::find()
            .filter(follow::Column::FolloweeId.is_in(ids.clone()))
            .all(self.db())
            .await
            .map_err(query_error)?;
        let outbound = FollowEntity::find()
            .filter(follow::Column::FollowerId.is_in(ids.clone()))
            .all(self.db())
            .await
            .map_err(query_error)?;
        let likes = PostLikeEntity::find()
            .filter(post_like::Column::UserId.is_in(ids))
            .all(self.db())
            .await
            .map_err(query_error)?;

        for edge in inbound {
            if let Some(&i) = index.get(&edge.followee_id) {
                users[i].followers.insert(edge.follower_id);
            }
        }
        for edge in outbound {
            if let Some(&i) = index.get(&edge.follower_id) {
                users[i].following.insert(edge.followee_id);
            }
        }
        for like in likes {
            if let Some(&i) = index.get(&like.user_id) {
                users[i].liked_posts.insert(like.post_id);
            }
        }

        Ok(users)
    }

    async fn hydrate_one(&self, user: Option<User>) -> Result<Option<User>, RepoError> {
        match user {
            Some(user) => Ok(self.hydrate_many(vec![user]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn find_one(&self, condition: Condition) -> Result<Option<User>, RepoError> {
        let model = UserEntity::find()
            .filter(condition)
            .one(self.db())
            .await
            .map_err(query_error)?;

        self.hydrate_one(model.map(Into::into)).await
    }
}

#[async_trait]
impl BaseRepository<User, Uuid> for PostgresUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        let user = BaseRepository::<User, Uuid>::find_by_id(&self.base, id).await?;
        self.hydrate_one(user).await
    }

    async fn save(&self, user: User) -> Result<User, RepoError> {
        let saved = BaseRepository::<User, Uuid>::save(&self.base, user).await?;
        let id = saved.id;
        self.hydrate_one(Some(saved))
            .await?
            .ok_or_else(|| RepoError::Query(format!("user {id} vanished after save")))
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        BaseRepository::<User, Uuid>::delete(&self.base, id).await
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        tracing::debug!(user_email = %mask_email(email), "Finding user by email");
        self.find_one(Condition::all().add(user::Column::Email.eq(email)))
            .await
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        self.find_one(Condition::all().add(user::Column::Username.eq(username)))
            .await
    }

    async fn find_by_reset_token(&self, token: &str) -> Result<Option<User>, RepoError> {
        self.find_one(Condition::all().add(user::Column::ResetToken.eq(token)))
            .await
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<User>, RepoError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let models = UserEntity::find()
            .filter(user::Column::Id.is_in(ids.to_vec()))
            .all(self.db())
            .await
            .map_err(query_error)?;

        self.hydrate_many(models.into_iter().map(Into::into).collect())
            .await
    }

    async fn find_all(&self) -> Result<Vec<User>, RepoError> {
        let models = UserEntity::find()
            .order_by_asc(user::Column::CreatedAt)
            .all(self.db())
            .await
            .map_err(query_error)?;

        self.hydrate_many(models.into_iter().map(Into::into).collect())
            .await
    }

    async fn search(&self, query: &str) -> Result<Vec<User>, RepoError> {
        let pattern = format!("%{}%", query.to_lowercase());
        let condition = Condition::any()
            .add(Expr::expr(Func::lower(Expr::col(user::Column::Username))).like(pattern.clone()))
            .add(Expr::expr(Func::lower(Expr::col(user::Column::FullName))).like(pattern));

        let models = UserEntity::find()
            .filter(condition)
            .order_by_asc(user::Column::Username)
            .all(self.db())
            .await
            .map_err(query_error)?;

        self.hydrate_many(models.into_iter().map(Into::into).collect())
            .await
    }

    async fn add_follower(&self, user_id: Uuid, follower_id: Uuid) -> Result<bool, RepoError> {
        insert_follow(self.db(), follower_id, user_id).await
    }

    async fn remove_follower(&self, user_id: Uuid, follower_id: Uuid) -> Result<bool, RepoError> {
        delete_follow(self.db(), follower_id, user_id).await
    }

    async fn add_following(&self, user_id: Uuid, followee_id: Uuid) -> Result<bool, RepoError> {
        insert_follow(self.db(), user_id, followee_id).await
    }

    async fn remove_following(&self, user_id: Uuid, followee_id: Uuid) -> Result<bool, RepoError> {
        delete_follow(self.db(), user_id, followee_id).await
    }

    async fn add_liked_post(&self, user_id: Uuid, post_id: Uuid) -> Result<bool, RepoError> {
        insert_like(self.db(), post_id, user_id).await
    }

    async fn remove_liked_post(&self, user_id: Uuid, post_id: Uuid) -> Result<bool, RepoError> {
        delete_like(self.db(), post_id, user_id).await
    }
}

/// PostgreSQL post repository.
pub struct PostgresPostRepository {
    base: PostgresBaseRepository<PostEntity>,
}

impl PostgresPostRepository {
    pub fn new(db: DbConn) -> Self {
        Self {
            base: PostgresBaseRepository::new(db),
        }
    }

    fn db(&self) -> &DbConn {
        &self.base.db
    }

    /// Attach likes and comments (oldest first) to freshly loaded posts.
    async fn hydrate_many(&self, mut posts: Vec<Post>) -> Result<Vec<Post>, RepoError> {
        if posts.is_empty() {
            return Ok(posts);
        }

        let ids: Vec<Uuid> = posts.iter().map(|p| p.id).collect();
        let index: HashMap<Uuid, usize> = ids.iter().enumerate().map(|(i, id)| (*id, i)).collect();

        let likes = PostLikeEntity::find()
            .filter(post_like::Column::PostId.is_in(ids.clone()))
            .all(self.db())
            .await
            .map_err(query_error)?;
        let comments = CommentEntity::find()
            .filter(comment::Column::PostId.is_in(ids))
            .order_by_asc(comment::Column::CreatedAt)
            .order_by_asc(comment::Column::Id)
            .all(self.db())
            .await
            .map_err(query_error)?;

        for like in likes {
            if let Some(&i) = index.get(&like.post_id) {
                posts[i].likes.insert(like.user_id);
            }
        }
        for model in comments {
            if let Some(&i) = index.get(&model.post_id) {
                posts[i].comments.push(Comment::from(model));
            }
        }

        Ok(posts)
    }

    async fn load_newest_first(&self, condition: Condition) -> Result<Vec<Post>, RepoError> {
        let models = PostEntity::find()
            .filter(condition)
            .order_by_desc(post::Column::CreatedAt)
            .order_by_asc(post::Column::Id)
            .all(self.db())
            .await
            .map_err(query_error)?;

        self.hydrate_many(models.into_iter().map(Into::into).collect())
            .await
    }
}

#[async_trait]
impl BaseRepository<Post, Uuid> for PostgresPostRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        match BaseRepository::<Post, Uuid>::find_by_id(&self.base, id).await? {
            Some(post) => Ok(self.hydrate_many(vec![post]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn save(&self, post: Post) -> Result<Post, RepoError> {
        let saved = BaseRepository::<Post, Uuid>::save(&self.base, post).await?;
        let id = saved.id;
        self.hydrate_many(vec![saved])
            .await?
            .pop()
            .ok_or_else(|| RepoError::Query(format!("post {id} vanished after save")))
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        // Likes and comments go with the post through ON DELETE CASCADE.
        BaseRepository::<Post, Uuid>::delete(&self.base, id).await
    }
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn find_all(&self) -> Result<Vec<Post>, RepoError> {
        self.load_newest_first(Condition::all()).await
    }

    async fn find_by_user_ids(&self, user_ids: &[Uuid]) -> Result<Vec<Post>, RepoError> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }

        self.load_newest_first(Condition::all().add(post::Column::UserId.is_in(user_ids.to_vec())))
            .await
    }

    async fn add_like(&self, post_id: Uuid, user_id: Uuid) -> Result<bool, RepoError> {
        insert_like(self.db(), post_id, user_id).await
    }

    async fn remove_like(&self, post_id: Uuid, user_id: Uuid) -> Result<bool, RepoError> {
        delete_like(self.db(), post_id, user_id).await
    }

    async fn push_comment(&self, post_id: Uuid, comment: Comment) -> Result<(), RepoError> {
        CommentEntity::insert(comment::ActiveModel::for_post(post_id, comment))
            .exec_without_returning(self.db())
            .await
            .map_err(edge_error)?;

        Ok(())
    }
}

/// PostgreSQL notification repository.
pub struct PostgresNotificationRepository {
    db: DbConn,
}

impl PostgresNotificationRepository {
    pub fn new(db: DbConn) -> Self {
        Self { db }
    }
}

#[async_trait]
impl NotificationRepository for PostgresNotificationRepository {
    async fn create(&self, notification: Notification) -> Result<Notification, RepoError> {
        NotificationEntity::insert(notification::ActiveModel::from(notification.clone()))
            .exec_without_returning(&self.db)
            .await
            .map_err(edge_error)?;

        Ok(notification)
    }

    async fn find_by_recipient(&self, user_id: Uuid) -> Result<Vec<Notification>, RepoError> {
        let models = NotificationEntity::find()
            .filter(notification::Column::ToUserId.eq(user_id))
            .order_by_desc(notification::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(query_error)?;

        models.into_iter().map(Notification::try_from).collect()
    }
}
