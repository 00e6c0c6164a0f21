use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "team")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub name: String,

    pub donation_link: Option<String>,

    /// Inactive teams cannot submit new packages.
    pub is_active: bool,

    /// Per-team override of the zip entry limit. NULL means the
    /// configured default applies.
    pub max_file_count_per_zip: Option<i32>,

    #[sea_orm(has_many)]
    pub members: HasMany<super::team_member::Entity>,

    #[sea_orm(has_many)]
    pub namespaces: HasMany<super::namespace::Entity>,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
