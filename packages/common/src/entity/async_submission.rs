use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A queued package submission and its eventual outcome.
///
/// Status only moves forward: pending, processing, finished. A finished
/// row carries exactly one of `result` or `form_errors`, or has
/// `task_error` set when processing crashed.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "async_submission")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub owner_user_id: i32,
    #[sea_orm(belongs_to, from = "owner_user_id", to = "id")]
    pub owner: HasOne<super::user::Entity>,

    /// "pending", "processing" or "finished".
    pub status: String,

    /// The submission form as received.
    #[sea_orm(column_type = "JsonBinary")]
    pub form_data: serde_json::Value,

    /// Success payload, set on acceptance.
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub result: Option<serde_json::Value>,

    /// Field-keyed validation errors, set on rejection.
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub form_errors: Option<serde_json::Value>,

    /// Processing crashed; neither result nor form_errors were produced.
    pub task_error: bool,

    /// Last time a client polled this submission.
    pub last_polled_at: Option<DateTimeUtc>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
