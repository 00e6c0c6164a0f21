use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use worker::submission::SubmissionForm;

/// Request body for submitting a package.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct SubmitRequest {
    /// Namespace to publish under. The caller must belong to the team
    /// owning it.
    #[schema(example = "AliceMods")]
    pub author_name: String,
    /// Community identifiers the package is listed in. At least one.
    #[schema(example = json!(["riskofrain2"]))]
    pub communities: Vec<String>,
    /// Category slugs per community identifier.
    #[serde(default)]
    #[schema(value_type = Object)]
    pub community_categories: HashMap<String, Vec<String>>,
    #[serde(default)]
    pub has_nsfw_content: bool,
    /// A completed upload session holding the package archive.
    pub upload_uuid: Uuid,
}

impl From<SubmitRequest> for SubmissionForm {
    fn from(req: SubmitRequest) -> Self {
        Self {
            author_name: req.author_name,
            communities: req.communities,
            community_categories: req.community_categories,
            has_nsfw_content: req.has_nsfw_content,
            upload_uuid: req.upload_uuid,
        }
    }
}

/// A submission's current state as reported to its owner.
#[derive(Serialize, utoipa::ToSchema)]
pub struct SubmissionResponse {
    pub id: Uuid,
    /// One of `pending`, `finished`.
    #[schema(example = "pending")]
    pub status: String,
    /// Success payload, set once processing finished without errors.
    #[schema(value_type = Option<Object>)]
    pub result: Option<serde_json::Value>,
    /// Per-field validation messages, set when the form was rejected.
    #[schema(value_type = Option<Object>)]
    pub form_errors: Option<serde_json::Value>,
    /// Whether processing failed for reasons unrelated to the form.
    pub task_error: bool,
    pub created_at: DateTime<Utc>,
}

impl From<common::entity::async_submission::Model> for SubmissionResponse {
    fn from(submission: common::entity::async_submission::Model) -> Self {
        Self {
            id: submission.id,
            status: submission.status,
            result: submission.result,
            form_errors: submission.form_errors,
            task_error: submission.task_error,
            created_at: submission.created_at,
        }
    }
}
