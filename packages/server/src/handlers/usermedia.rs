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
use crate::models::usermedia::{
    FinishUploadRequest, InitiateUploadRequest, InitiateUploadResponse, UserMediaResponse,
};
use crate::state::AppState;

/// Start a multipart upload session.
///
/// The response carries a presigned URL for every part; the client PUTs
/// the bytes directly to storage and reports the parts back on finish.
#[utoipa::path(
    post,
    path = "/usermedia/initiate-upload/",
    tag = "Usermedia",
    security(("jwt" = [])),
    request_body = InitiateUploadRequest,
    responses(
        (status = 201, description = "Upload session created", body = InitiateUploadResponse),
        (status = 400, description = "Invalid filename or size", body = ErrorBody),
        (status = 401, description = "Not authenticated", body = ErrorBody),
    ),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn initiate_upload(
    State(state): State<AppState>,
    auth_user: AuthUser,
    AppJson(payload): AppJson<InitiateUploadRequest>,
) -> Result<impl IntoResponse, AppError> {
    let session = worker::usermedia::initiate_upload(
        &state.ctx,
        Some(auth_user.user_id),
        &payload.filename,
        payload.file_size_bytes,
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(InitiateUploadResponse::from(session)),
    ))
}

/// Finalize an upload session from the client-reported parts.
#[utoipa::path(
    post,
    path = "/usermedia/{uuid}/finish-upload/",
    tag = "Usermedia",
    security(("jwt" = [])),
    params(("uuid" = Uuid, Path, description = "Upload session ID")),
    request_body = FinishUploadRequest,
    responses(
        (status = 200, description = "Upload completed", body = UserMediaResponse),
        (status = 400, description = "Session is not in a finishable state", body = ErrorBody),
        (status = 403, description = "Session belongs to another user", body = ErrorBody),
        (status = 404, description = "Session not found", body = ErrorBody),
    ),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn finish_upload(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(uuid): Path<Uuid>,
    AppJson(payload): AppJson<FinishUploadRequest>,
) -> Result<Json<UserMediaResponse>, AppError> {
    let parts = payload.into_parts();
    let media =
        worker::usermedia::finish_upload(&state.ctx, Some(auth_user.user_id), uuid, &parts).await?;
    Ok(Json(media.into()))
}

/// Cancel an upload session.
#[utoipa::path(
    post,
    path = "/usermedia/{uuid}/abort-upload/",
    tag = "Usermedia",
    security(("jwt" = [])),
    params(("uuid" = Uuid, Path, description = "Upload session ID")),
    responses(
        (status = 200, description = "Upload aborted", body = UserMediaResponse),
        (status = 400, description = "Session is not in an abortable state", body = ErrorBody),
        (status = 403, description = "Session belongs to another user", body = ErrorBody),
        (status = 404, description = "Session not found", body = ErrorBody),
    ),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn abort_upload(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(uuid): Path<Uuid>,
) -> Result<Json<UserMediaResponse>, AppError> {
    let media = worker::usermedia::abort_upload(&state.ctx, Some(auth_user.user_id), uuid).await?;
    Ok(Json(media.into()))
}
