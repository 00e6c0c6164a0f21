use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Per-client download dedup state for one package version.
///
/// `total` counts every request; `counted` only those outside the
/// dedup window, and is what the version counter reflects.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "download_tracker")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub version_id: i32,
    /// Opaque hash of the requesting client's address and agent.
    #[sea_orm(primary_key)]
    pub client_id: String,
    #[sea_orm(belongs_to, from = "version_id", to = "id")]
    pub version: Option<super::package_version::Entity>,

    pub total: i64,
    pub counted: i64,

    pub first_download: DateTimeUtc,
    pub last_download: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
