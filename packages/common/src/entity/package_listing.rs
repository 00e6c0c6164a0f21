use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A package made visible in one community. Review state is tracked per
/// listing; the same package can be approved in one community and
/// rejected in another.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "package_listing")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub package_id: i32,
    #[sea_orm(belongs_to, from = "package_id", to = "id")]
    pub package: HasOne<super::package::Entity>,

    pub community_id: i32,
    #[sea_orm(belongs_to, from = "community_id", to = "id")]
    pub community: HasOne<super::community::Entity>,

    /// "unreviewed", "approved" or "rejected".
    pub review_status: String,
    pub rejection_reason: Option<String>,
    /// Internal moderator notes, never exposed publicly.
    pub notes: Option<String>,

    pub has_nsfw_content: bool,

    pub public_list: bool,
    pub public_detail: bool,
    pub owner_list: bool,
    pub owner_detail: bool,
    pub moderator_list: bool,
    pub moderator_detail: bool,
    pub admin_list: bool,
    pub admin_detail: bool,

    #[sea_orm(has_many)]
    pub categories: HasMany<super::package_listing_category::Entity>,

    pub date_created: DateTimeUtc,
    pub date_updated: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
