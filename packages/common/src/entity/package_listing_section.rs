use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Named front-page grouping of listings, matched by category slugs.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "package_listing_section")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub community_id: i32,
    #[sea_orm(belongs_to, from = "community_id", to = "id")]
    pub community: HasOne<super::community::Entity>,

    pub name: String,
    pub slug: String,
    /// Higher priority sections render first.
    pub priority: i32,
    pub is_listed: bool,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
