use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Grants a user a moderation role within one community.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "community_membership")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub community_id: i32,
    #[sea_orm(primary_key)]
    pub user_id: i32,
    #[sea_orm(belongs_to, from = "community_id", to = "id")]
    pub community: Option<super::community::Entity>,
    #[sea_orm(belongs_to, from = "user_id", to = "id")]
    pub user: Option<super::user::Entity>,

    /// "moderator" or "janitor".
    pub role: String,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
