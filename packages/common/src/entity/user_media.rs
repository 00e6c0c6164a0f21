use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A multipart upload session. Rows persist past completion so the
/// submission flow can hand a finished upload to the worker by uuid.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user_media")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub uuid: Uuid,

    pub owner_user_id: Option<i32>,
    #[sea_orm(belongs_to, from = "owner_user_id", to = "id")]
    pub owner: Option<super::user::Entity>,

    /// Original client filename, directories stripped.
    pub filename: String,
    /// Declared size in bytes. Verified against the stored object on finish.
    pub size: i64,

    /// Object storage key computed at initiation. Completion fails if the
    /// backend reports a different key.
    pub key: String,
    /// Backend multipart upload id. NULL once completed or aborted.
    pub upload_id: Option<String>,

    /// "initial", "upload_created", "upload_complete", "upload_error".
    pub status: String,

    pub expiry: DateTimeUtc,
    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
