use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "package_listing_category")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub listing_id: i32,
    #[sea_orm(primary_key)]
    pub category_id: i32,
    #[sea_orm(belongs_to, from = "listing_id", to = "id")]
    pub listing: Option<super::package_listing::Entity>,
    #[sea_orm(belongs_to, from = "category_id", to = "id")]
    pub category: Option<super::package_category::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}
