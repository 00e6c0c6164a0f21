use axum::{
    Json,
    extract::{Path, State},
};
use common::entity::{package_rating, package_version};
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::package::{
    DeprecateRequest, MessageResponse, PackageMetricsResponse, RateRequest, RateResponse,
    VersionMetricsResponse,
};
use crate::state::AppState;

/// Aggregate metrics for a package.
#[utoipa::path(
    get,
    path = "/package-metrics/{namespace}/{name}/",
    tag = "Packages",
    params(
        ("namespace" = String, Path, description = "Namespace name"),
        ("name" = String, Path, description = "Package name"),
    ),
    responses(
        (status = 200, description = "Package metrics", body = PackageMetricsResponse),
        (status = 404, description = "Package not found", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn package_metrics(
    State(state): State<AppState>,
    Path((namespace, name)): Path<(String, String)>,
) -> Result<Json<PackageMetricsResponse>, AppError> {
    let (ns, pkg) = worker::listing::find_package(&state.ctx, &namespace, &name).await?;

    let versions = package_version::Entity::find()
        .filter(package_version::Column::PackageId.eq(pkg.id))
        .all(&state.db)
        .await?;
    let downloads = versions.iter().map(|v| v.downloads).sum();

    let rating_score = package_rating::Entity::find()
        .filter(package_rating::Column::PackageId.eq(pkg.id))
        .count(&state.db)
        .await?;

    Ok(Json(PackageMetricsResponse {
        namespace: ns.name,
        name: pkg.name,
        downloads,
        rating_score,
    }))
}

/// Download metrics for one version of a package.
#[utoipa::path(
    get,
    path = "/package-metrics/{namespace}/{name}/{version}/",
    tag = "Packages",
    params(
        ("namespace" = String, Path, description = "Namespace name"),
        ("name" = String, Path, description = "Package name"),
        ("version" = String, Path, description = "Version number"),
    ),
    responses(
        (status = 200, description = "Version metrics", body = VersionMetricsResponse),
        (status = 404, description = "Version not found", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn version_metrics(
    State(state): State<AppState>,
    Path((namespace, name, version)): Path<(String, String, String)>,
) -> Result<Json<VersionMetricsResponse>, AppError> {
    let (ns, pkg) = worker::listing::find_package(&state.ctx, &namespace, &name).await?;

    let version = package_version::Entity::find()
        .filter(package_version::Column::PackageId.eq(pkg.id))
        .filter(package_version::Column::VersionNumber.eq(&version))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Version not found".into()))?;

    Ok(Json(VersionMetricsResponse {
        namespace: ns.name,
        name: pkg.name,
        version_number: version.version_number,
        downloads: version.downloads,
    }))
}

/// Rate or unrate a package for the authenticated user.
#[utoipa::path(
    post,
    path = "/package/{namespace}/{name}/rate/",
    tag = "Packages",
    security(("jwt" = [])),
    params(
        ("namespace" = String, Path, description = "Namespace name"),
        ("name" = String, Path, description = "Package name"),
    ),
    request_body = RateRequest,
    responses(
        (status = 200, description = "Rating applied", body = RateResponse),
        (status = 400, description = "Invalid target state", body = ErrorBody),
        (status = 401, description = "Not authenticated", body = ErrorBody),
        (status = 404, description = "Package not found", body = ErrorBody),
    ),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn rate(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path((namespace, name)): Path<(String, String)>,
    AppJson(payload): AppJson<RateRequest>,
) -> Result<Json<RateResponse>, AppError> {
    let (state_str, score) = worker::listing::rate_package(
        &state.ctx,
        auth_user.user_id,
        &namespace,
        &name,
        &payload.target_state,
    )
    .await?;
    Ok(Json(RateResponse {
        state: state_str,
        score,
    }))
}

/// Set or clear a package's deprecation flag.
///
/// Allowed for members of the owning team and for moderators of any
/// community the package is listed in.
#[utoipa::path(
    post,
    path = "/package/{namespace}/{name}/deprecate/",
    tag = "Packages",
    security(("jwt" = [])),
    params(
        ("namespace" = String, Path, description = "Namespace name"),
        ("name" = String, Path, description = "Package name"),
    ),
    request_body = DeprecateRequest,
    responses(
        (status = 200, description = "Flag applied", body = MessageResponse),
        (status = 401, description = "Not authenticated", body = ErrorBody),
        (status = 403, description = "Not allowed to manage this package", body = ErrorBody),
        (status = 404, description = "Package not found", body = ErrorBody),
    ),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn deprecate(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path((namespace, name)): Path<(String, String)>,
    AppJson(payload): AppJson<DeprecateRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    worker::listing::set_deprecation(
        &state.ctx,
        auth_user.user_id,
        &namespace,
        &name,
        payload.deprecate,
    )
    .await?;
    Ok(Json(MessageResponse {
        message: "Success".to_string(),
    }))
}
