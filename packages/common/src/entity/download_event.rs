use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One counted download, kept for analytics export.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "download_event")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub version_id: i32,
    #[sea_orm(belongs_to, from = "version_id", to = "id")]
    pub version: HasOne<super::package_version::Entity>,

    pub timestamp: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
