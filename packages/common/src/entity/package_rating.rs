use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One user's thumbs-up on a package. Rating again is a no-op; the
/// "rated" state can also be removed.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "package_rating")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub package_id: i32,
    #[sea_orm(primary_key)]
    pub user_id: i32,
    #[sea_orm(belongs_to, from = "package_id", to = "id")]
    pub package: Option<super::package::Entity>,
    #[sea_orm(belongs_to, from = "user_id", to = "id")]
    pub user: Option<super::user::Entity>,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
