use axum::{
    body::Body,
    extract::{Path, State},
    http::{StatusCode, header},
    response::Response,
};
use common::entity::{chunked_cache, community, package_list_cache};
use common::storage::{ContentHash, gzip_blob_key};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use tokio_util::io::ReaderStream;
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::state::AppState;

/// The flat package index for a community.
///
/// Serves the most recent prebuilt index blob as-is: gzip bytes with a
/// `Content-Encoding` header, so intermediaries can cache the compressed
/// form.
#[utoipa::path(
    get,
    path = "/{community}/api/v1/package/",
    tag = "Index",
    params(("community" = String, Path, description = "Community identifier")),
    responses(
        (status = 200, description = "Gzip-encoded JSON package index"),
        (status = 404, description = "Community or index not found", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn community_package_index(
    State(state): State<AppState>,
    Path(identifier): Path<String>,
) -> Result<Response, AppError> {
    let community = find_community(&state, &identifier).await?;

    let row = package_list_cache::Entity::find()
        .filter(package_list_cache::Column::CommunityId.eq(community.id))
        .order_by_desc(package_list_cache::Column::Id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Package index has not been built yet".into()))?;

    serve_gzip_blob(&state, &row.blob_hash, &row.content_type).await
}

/// The chunked index for a community.
///
/// Redirects to the blob holding the chunk URL list, so the document is
/// fetched from blob storage like the chunks themselves.
#[utoipa::path(
    get,
    path = "/{community}/api/v1/package-listing-index/",
    tag = "Index",
    params(("community" = String, Path, description = "Community identifier")),
    responses(
        (status = 302, description = "Redirect to the chunk index blob"),
        (status = 404, description = "Community or index not found", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn community_chunked_index(
    State(state): State<AppState>,
    Path(identifier): Path<String>,
) -> Result<Response, AppError> {
    let community = find_community(&state, &identifier).await?;

    let row = chunked_cache::Entity::find()
        .filter(chunked_cache::Column::CommunityId.eq(community.id))
        .order_by_desc(chunked_cache::Column::Id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Chunked index has not been built yet".into()))?;

    let hash = ContentHash::from_hex(&row.index_blob_hash)
        .map_err(|e| AppError::Internal(format!("Corrupt cache row: {e}")))?;
    let url = state.ctx.storage.blob_url(&hash, true, None).await?;
    found_redirect(&url)
}

// axum's Redirect only offers 303/307/308; clients here expect a plain
// 302.
fn found_redirect(url: &str) -> Result<Response, AppError> {
    Response::builder()
        .status(StatusCode::FOUND)
        .header(header::LOCATION, url)
        .body(Body::empty())
        .map_err(|e| AppError::Internal(e.to_string()))
}

async fn find_community(state: &AppState, identifier: &str) -> Result<community::Model, AppError> {
    community::Entity::find()
        .filter(community::Column::Identifier.eq(identifier))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Community not found".into()))
}

async fn serve_gzip_blob(
    state: &AppState,
    blob_hash: &str,
    content_type: &str,
) -> Result<Response, AppError> {
    let hash = ContentHash::from_hex(blob_hash)
        .map_err(|e| AppError::Internal(format!("Corrupt cache row: {e}")))?;
    let reader = state
        .ctx
        .storage
        .get_object_stream(&gzip_blob_key(&hash))
        .await?;

    Response::builder()
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_ENCODING, "gzip")
        .body(Body::from_stream(ReaderStream::new(reader)))
        .map_err(|e| AppError::Internal(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_index_redirect_is_a_found() {
        let response = found_redirect("https://cdn.example/blobs/abc.gz").unwrap();
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(
            response.headers()[header::LOCATION],
            "https://cdn.example/blobs/abc.gz"
        );
    }
}
