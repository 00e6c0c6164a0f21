use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Content-addressed blob metadata. The bytes live in object storage
/// under `blobs/<hash>`, with a gzip variant alongside.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "data_blob")]
pub struct Model {
    /// SHA-256 content hash.
    #[sea_orm(primary_key, auto_increment = false)]
    pub content_hash: String,

    pub size: i64,
    pub gzip_size: i64,

    pub created_at: DateTimeUtc,

    #[sea_orm(has_many)]
    pub refs: HasMany<super::data_blob_ref::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}
