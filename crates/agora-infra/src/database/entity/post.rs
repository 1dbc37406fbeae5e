//! Post entity for SeaORM.

use sea_orm::Set;
use sea_orm::entity::prelude::*;

use agora_core::domain::{MediaAttachment, MediaKind};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "posts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    #[sea_orm(column_type = "Text", nullable)]
    pub text: Option<String>,
    pub media_url: Option<String>,
    pub media_public_id: Option<String>,
    /// `image`, `video` or `none`.
    pub media_type: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    User,
    #[sea_orm(has_many = "super::comment::Entity")]
    Comment,
    #[sea_orm(has_many = "super::post_like::Entity")]
    PostLike,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::comment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Comment.def()
    }
}

impl Related<super::post_like::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PostLike.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Conversion from SeaORM Model to Domain Post.
///
/// Likes and comments are attached by the repository after loading.
impl From<Model> for agora_core::domain::Post {
    fn from(model: Model) -> Self {
        let media = match (
            model.media_url,
            model.media_public_id,
            model.media_type.parse::<MediaKind>(),
        ) {
            (Some(url), Some(public_id), Ok(kind)) => Some(MediaAttachment {
                url,
                public_id,
                kind,
            }),
            _ => None,
        };

        Self {
            id: model.id,
            user_id: model.user_id,
            text: model.text,
            media,
            likes: Default::default(),
            comments: Vec::new(),
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        }
    }
}

/// Conversion from Domain Post to SeaORM ActiveModel.
impl From<agora_core::domain::Post> for ActiveModel {
    fn from(post: agora_core::domain::Post) -> Self {
        let media_type = post.media_type().to_string();
        let (media_url, media_public_id) = match post.media {
            Some(media) => (Some(media.url), Some(media.public_id)),
            None => (None, None),
        };

        Self {
            id: Set(post.id),
            user_id: Set(post.user_id),
            text: Set(post.text),
            media_url: Set(media_url),
            media_public_id: Set(media_public_id),
            media_type: Set(media_type),
            created_at: Set(post.created_at.into()),
            updated_at: Set(post.updated_at.into()),
        }
    }
}
