use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A rendered flat package index for one community, stored gzipped as a
/// blob. The newest row per community is live; older rows are dropped
/// once superseded for long enough.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "package_list_cache")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// NULL for the cross-community default index.
    pub community_id: Option<i32>,
    #[sea_orm(belongs_to, from = "community_id", to = "id")]
    pub community: Option<super::community::Entity>,

    pub blob_hash: String,
    pub content_type: String,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
