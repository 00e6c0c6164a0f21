use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::instrument;
use uuid::Uuid;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::submission::{SubmitRequest, SubmissionResponse};
use crate::state::AppState;

/// Accept a package submission and queue it for processing.
///
/// Processing happens asynchronously; the client polls the returned
/// submission until its status is `finished`.
#[utoipa::path(
    post,
    path = "/submission/submit/",
    tag = "Submissions",
    security(("jwt" = [])),
    request_body = SubmitRequest,
    responses(
        (status = 202, description = "Submission accepted", body = SubmissionResponse),
        (status = 400, description = "Invalid form data", body = ErrorBody),
        (status = 401, description = "Not authenticated", body = ErrorBody),
    ),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn submit(
    State(state): State<AppState>,
    auth_user: AuthUser,
    AppJson(payload): AppJson<SubmitRequest>,
) -> Result<impl IntoResponse, AppError> {
    let submission =
        worker::submission::create_submission(&state.ctx, auth_user.user_id, payload.into())
            .await?;
    Ok((
        StatusCode::ACCEPTED,
        Json(SubmissionResponse::from(submission)),
    ))
}

/// Poll a submission's status.
#[utoipa::path(
    get,
    path = "/submission/poll/{submission_id}/",
    tag = "Submissions",
    security(("jwt" = [])),
    params(("submission_id" = Uuid, Path, description = "Submission ID")),
    responses(
        (status = 200, description = "Submission state", body = SubmissionResponse),
        (status = 403, description = "Submission belongs to another user", body = ErrorBody),
        (status = 404, description = "Submission not found", body = ErrorBody),
    ),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn poll(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(submission_id): Path<Uuid>,
) -> Result<Json<SubmissionResponse>, AppError> {
    let submission =
        worker::submission::poll_submission(&state.ctx, auth_user.user_id, submission_id).await?;
    Ok(Json(submission.into()))
}
