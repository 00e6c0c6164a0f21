use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A package identity within a namespace. Versions hang off it; listings
/// expose it per community.
///
/// Uniqueness of (namespace_id, name) is enforced case-insensitively at
/// submission time, not by the schema.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "package")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Stable public identifier, exposed by the package indexes.
    #[sea_orm(unique)]
    pub uuid4: Uuid,

    pub name: String,

    pub namespace_id: i32,
    #[sea_orm(belongs_to, from = "namespace_id", to = "id")]
    pub namespace: HasOne<super::namespace::Entity>,

    pub is_active: bool,
    pub is_deprecated: bool,
    pub is_pinned: bool,

    /// Denormalized id of the newest active version.
    pub latest_version_id: Option<i32>,

    // Visibility flags, recomputed whenever the inputs change.
    pub public_list: bool,
    pub public_detail: bool,
    pub owner_list: bool,
    pub owner_detail: bool,
    pub moderator_list: bool,
    pub moderator_detail: bool,
    pub admin_list: bool,
    pub admin_detail: bool,

    #[sea_orm(has_many)]
    pub versions: HasMany<super::package_version::Entity>,

    #[sea_orm(has_many)]
    pub listings: HasMany<super::package_listing::Entity>,

    pub date_created: DateTimeUtc,
    pub date_updated: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
