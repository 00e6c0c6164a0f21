use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// The upload prefix packages live under. Every namespace belongs to
/// exactly one team; most teams have one namespace matching their name.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "namespace")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub name: String,

    pub team_id: i32,
    #[sea_orm(belongs_to, from = "team_id", to = "id")]
    pub team: HasOne<super::team::Entity>,

    #[sea_orm(has_many)]
    pub packages: HasMany<super::package::Entity>,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
