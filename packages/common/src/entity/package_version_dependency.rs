use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Edge from a version to the exact version it depends on.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "package_version_dependency")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub version_id: i32,
    #[sea_orm(primary_key)]
    pub dependency_id: i32,
    // Only one side is mapped as a relation: a second belongs_to to the
    // same entity would collide in the generated Relation enum. Queries
    // on the dependency side go through the column directly.
    #[sea_orm(belongs_to, from = "version_id", to = "id")]
    pub version: Option<super::package_version::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}
