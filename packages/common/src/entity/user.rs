use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub username: String,
    pub password: String,

    /// Service accounts authenticate with long-lived tokens and cannot
    /// log in interactively.
    pub is_service_account: bool,

    #[sea_orm(has_many)]
    pub team_memberships: HasMany<super::team_member::Entity>,

    #[sea_orm(has_many)]
    pub submissions: HasMany<super::async_submission::Entity>,

    #[sea_orm(has_many)]
    pub uploads: HasMany<super::user_media::Entity>,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
