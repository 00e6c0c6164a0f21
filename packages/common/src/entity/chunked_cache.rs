use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A chunked listing index snapshot for one community.
///
/// `index_blob_hash` points at a gzipped JSON list of chunk URLs; chunk
/// blobs are tied to the snapshot through `data_blob_ref` rows with
/// owner_type "chunked_cache".
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "chunked_cache")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub community_id: i32,
    #[sea_orm(belongs_to, from = "community_id", to = "id")]
    pub community: HasOne<super::community::Entity>,

    pub index_blob_hash: String,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
