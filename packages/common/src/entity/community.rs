use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A game community with its own listing surface and caches.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "community")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// URL slug, e.g. "riskofrain2".
    #[sea_orm(unique)]
    pub identifier: String,
    pub name: String,

    pub is_listed: bool,
    /// When set, new listings stay hidden from the public until approved.
    pub require_package_listing_approval: bool,

    #[sea_orm(has_many)]
    pub listings: HasMany<super::package_listing::Entity>,

    #[sea_orm(has_many)]
    pub categories: HasMany<super::package_category::Entity>,

    #[sea_orm(has_many)]
    pub sections: HasMany<super::package_listing_section::Entity>,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
