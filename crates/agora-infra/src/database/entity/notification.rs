//! Notification entity for SeaORM.

use sea_orm::Set;
use sea_orm::entity::prelude::*;

use agora_core::domain::Notification;
use agora_core::error::RepoError;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "notifications")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub from_user_id: Uuid,
    pub to_user_id: Uuid,
    pub kind: String,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::FromUserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Sender,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::ToUserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Recipient,
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Notification {
    type Error = RepoError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            from: model.from_user_id,
            to: model.to_user_id,
            kind: model.kind.parse().map_err(RepoError::Query)?,
            created_at: model.created_at.into(),
        })
    }
}

impl From<Notification> for ActiveModel {
    fn from(notification: Notification) -> Self {
        Self {
            id: Set(notification.id),
            from_user_id: Set(notification.from),
            to_user_id: Set(notification.to),
            kind: Set(notification.kind.as_str().to_string()),
            created_at: Set(notification.created_at.into()),
        }
    }
}
