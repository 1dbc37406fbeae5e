//! User entity for SeaORM.

use sea_orm::Set;
use sea_orm::entity::prelude::*;

use agora_core::domain::{ResetToken, StoredImage};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub username: String,
    pub full_name: Option<String>,
    #[sea_orm(unique)]
    pub email: String,
    pub password_hash: String,
    pub profile_img_url: Option<String>,
    pub profile_img_id: Option<String>,
    pub cover_img_url: Option<String>,
    pub cover_img_id: Option<String>,
    #[sea_orm(column_type = "Text")]
    pub bio: String,
    pub link: String,
    pub reset_token: Option<String>,
    pub reset_token_expires_at: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::post::Entity")]
    Post,
}

impl Related<super::post::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Post.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

fn image(url: Option<String>, public_id: Option<String>) -> Option<StoredImage> {
    Some(StoredImage {
        url: url?,
        public_id: public_id?,
    })
}

/// Conversion from SeaORM Model to Domain User.
///
/// Graph and like membership live in their own tables and are attached by
/// the repository after loading.
impl From<Model> for agora_core::domain::User {
    fn from(model: Model) -> Self {
        let reset_token = match (model.reset_token, model.reset_token_expires_at) {
            (Some(token), Some(expires_at)) => Some(ResetToken {
                token,
                expires_at: expires_at.into(),
            }),
            _ => None,
        };

        Self {
            id: model.id,
            username: model.username,
            full_name: model.full_name,
            email: model.email,
            password_hash: model.password_hash,
            followers: Default::default(),
            following: Default::default(),
            liked_posts: Default::default(),
            profile_img: image(model.profile_img_url, model.profile_img_id),
            cover_img: image(model.cover_img_url, model.cover_img_id),
            bio: model.bio,
            link: model.link,
            reset_token,
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        }
    }
}

/// Conversion from Domain User to SeaORM ActiveModel.
impl From<agora_core::domain::User> for ActiveModel {
    fn from(user: agora_core::domain::User) -> Self {
        let (profile_img_url, profile_img_id) = match user.profile_img {
            Some(img) => (Some(img.url), Some(img.public_id)),
            None => (None, None),
        };
        let (cover_img_url, cover_img_id) = match user.cover_img {
            Some(img) => (Some(img.url), Some(img.public_id)),
            None => (None, None),
        };
        let (reset_token, reset_token_expires_at) = match user.reset_token {
            Some(reset) => (
                Some(reset.token),
                Some(DateTimeWithTimeZone::from(reset.expires_at)),
            ),
            None => (None, None),
        };

        Self {
            id: Set(user.id),
            username: Set(user.username),
            full_name: Set(user.full_name),
            email: Set(user.email),
            password_hash: Set(user.password_hash),
            profile_img_url: Set(profile_img_url),
            profile_img_id: Set(profile_img_id),
            cover_img_url: Set(cover_img_url),
            cover_img_id: Set(cover_img_id),
            bio: Set(user.bio),
            link: Set(user.link),
            reset_token: Set(reset_token),
            reset_token_expires_at: Set(reset_token_expires_at),
            created_at: Set(user.created_at.into()),
            updated_at: Set(user.updated_at.into()),
        }
    }
}
