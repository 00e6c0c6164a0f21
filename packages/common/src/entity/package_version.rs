use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One uploaded version of a package. The archive, icon, readme and
/// changelog are content-addressed blobs.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "package_version")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Stable public identifier, exposed by the package indexes.
    #[sea_orm(unique)]
    pub uuid4: Uuid,

    pub package_id: i32,
    #[sea_orm(belongs_to, from = "package_id", to = "id")]
    pub package: HasOne<super::package::Entity>,

    /// Package name at upload time. Kept so a version stays reproducible
    /// even if the package is ever renamed.
    pub name: String,
    /// "major.minor.patch".
    pub version_number: String,
    pub major: i64,
    pub minor: i64,
    pub patch: i64,

    pub description: String,
    pub website_url: String,
    /// "modvault.io:v0.x" manifest format the archive declared.
    pub format_spec: String,

    /// SHA-256 of the stored zip.
    pub file_hash: String,
    pub file_size: i64,
    pub icon_hash: String,
    pub readme_hash: String,
    pub changelog_hash: Option<String>,

    pub is_active: bool,
    /// "unreviewed", "approved" or "rejected".
    pub review_status: String,

    pub downloads: i64,

    pub public_list: bool,
    pub public_detail: bool,
    pub owner_list: bool,
    pub owner_detail: bool,
    pub moderator_list: bool,
    pub moderator_detail: bool,
    pub admin_list: bool,
    pub admin_detail: bool,

    pub uploaded_by_user_id: Option<i32>,
    #[sea_orm(belongs_to, from = "uploaded_by_user_id", to = "id")]
    pub uploaded_by: Option<super::user::Entity>,

    #[sea_orm(has_many)]
    pub dependencies: HasMany<super::package_version_dependency::Entity>,

    pub date_created: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
