use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Links a blob to the row that owns it. Blobs with no remaining refs
/// are garbage.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "data_blob_ref")]
pub struct Model {
    /// UUIDv7 primary key.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Owner entity type (e.g. "package_version", "chunked_cache").
    pub owner_type: String,

    /// Owner entity ID (canonical string form).
    pub owner_id: String,

    /// Role of the blob for its owner (e.g. "icon", "chunk/3").
    pub path: String,

    pub content_hash: String,

    #[sea_orm(belongs_to, from = "content_hash", to = "content_hash")]
    pub blob: Option<super::data_blob::Entity>,

    pub content_type: Option<String>,

    /// Copy of the blob's size, so list queries need no join.
    pub size: i64,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
