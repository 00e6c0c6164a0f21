use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "package_category")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub community_id: i32,
    #[sea_orm(belongs_to, from = "community_id", to = "id")]
    pub community: HasOne<super::community::Entity>,

    pub name: String,
    /// Unique within the community.
    pub slug: String,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
