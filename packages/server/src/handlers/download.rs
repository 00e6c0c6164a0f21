use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, Path, State},
    http::HeaderMap,
    response::Redirect,
};
use common::entity::package_version;
use common::storage::ContentHash;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use tracing::{instrument, warn};

use crate::error::{AppError, ErrorBody};
use crate::state::AppState;

/// Download a package archive.
///
/// Redirects to the archive blob. Counting never blocks the download:
/// a metrics failure is logged and the redirect still happens.
#[utoipa::path(
    get,
    path = "/download/{namespace}/{name}/{version}/",
    tag = "Downloads",
    params(
        ("namespace" = String, Path, description = "Namespace name"),
        ("name" = String, Path, description = "Package name"),
        ("version" = String, Path, description = "Version number"),
    ),
    responses(
        (status = 307, description = "Redirect to the archive"),
        (status = 404, description = "Version not found", body = ErrorBody),
    ),
)]
#[instrument(skip(state, headers))]
pub async fn download_version(
    State(state): State<AppState>,
    Path((namespace, name, version)): Path<(String, String, String)>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> Result<Redirect, AppError> {
    let (_, pkg) = worker::listing::find_package(&state.ctx, &namespace, &name).await?;

    let version = package_version::Entity::find()
        .filter(package_version::Column::PackageId.eq(pkg.id))
        .filter(package_version::Column::VersionNumber.eq(&version))
        .filter(package_version::Column::IsActive.eq(true))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Version not found".into()))?;

    let client = worker::downloads::client_id(&client_addr(&headers, addr));
    if let Err(e) = worker::downloads::record_download(&state.ctx, version.id, &client).await {
        warn!(version_id = version.id, "Download count failed: {e}");
    }

    let hash = ContentHash::from_hex(&version.file_hash)
        .map_err(|e| AppError::Internal(format!("Corrupt version row: {e}")))?;
    let ttl = if state.config.storage.sign_download_urls {
        Some(state.config.storage.signed_url_ttl_secs)
    } else {
        None
    };
    let url = state.ctx.storage.blob_url(&hash, false, ttl).await?;

    Ok(Redirect::temporary(&url))
}

/// The client address for metrics: the first `X-Forwarded-For` hop when
/// present, the socket peer otherwise.
fn client_addr(headers: &HeaderMap, addr: SocketAddr) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .unwrap_or_else(|| addr.ip().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forwarded_header_takes_first_hop() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "10.0.0.1, 172.16.0.1".parse().unwrap());
        let addr: SocketAddr = "127.0.0.1:9999".parse().unwrap();
        assert_eq!(client_addr(&headers, addr), "10.0.0.1");
    }

    #[test]
    fn socket_peer_is_the_fallback() {
        let addr: SocketAddr = "192.168.1.5:1234".parse().unwrap();
        assert_eq!(client_addr(&HeaderMap::new(), addr), "192.168.1.5");
    }
}
