//! Rendered package index caches.
//!
//! Each community gets a flat gzipped JSON index plus a chunked variant
//! for incremental clients. Snapshots are immutable blobs; a new refresh
//! writes fresh blobs and a fresh row, and the stale sweep later removes
//! superseded snapshots and unreferenced blobs.

use chrono::{Duration, Utc};
use common::entity::{
    chunked_cache, community, data_blob, data_blob_ref, namespace, package, package_category,
    package_list_cache, package_listing, package_listing_category, package_rating,
    package_version, package_version_dependency,
};
use common::storage::ContentHash;
use sea_orm::sea_query::{Expr, ExprTrait, Query};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::blobs::{drop_owner_refs, persist_blob};
use crate::context::RegistryContext;
use crate::error::WorkerError;

/// Snapshots superseded for longer than this are dropped.
pub const STALE_CUTOFF_SECS: i64 = 3600;

/// One version as rendered into the index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexVersion {
    pub name: String,
    pub full_name: String,
    pub uuid4: uuid::Uuid,
    pub description: String,
    pub icon: String,
    pub version_number: String,
    pub dependencies: Vec<String>,
    pub download_url: String,
    pub downloads: i64,
    pub date_created: chrono::DateTime<chrono::Utc>,
    pub website_url: String,
    pub is_active: bool,
    pub file_size: i64,
}

/// One package with its versions as rendered into the index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexPackage {
    pub name: String,
    pub full_name: String,
    pub uuid4: uuid::Uuid,
    pub owner: String,
    pub package_url: String,
    pub date_created: chrono::DateTime<chrono::Utc>,
    pub date_updated: chrono::DateTime<chrono::Utc>,
    pub rating_score: u64,
    pub is_pinned: bool,
    pub is_deprecated: bool,
    pub has_nsfw_content: bool,
    pub categories: Vec<String>,
    pub versions: Vec<IndexVersion>,
}

/// Split listings into fixed-size chunks, preserving order.
pub fn chunk_listings<T>(items: Vec<T>, chunk_size: usize) -> Vec<Vec<T>> {
    let mut chunks = Vec::new();
    let mut current = Vec::new();
    for item in items {
        current.push(item);
        if current.len() == chunk_size {
            chunks.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Rebuild both index variants for one community.
#[instrument(skip(ctx))]
pub async fn refresh_community_cache(
    ctx: &RegistryContext,
    community_id: i32,
) -> Result<(), WorkerError> {
    let comm = community::Entity::find_by_id(community_id)
        .one(&ctx.db)
        .await?
        .ok_or_else(|| WorkerError::NotFound(format!("Community {community_id} not found")))?;

    let packages = build_community_index(ctx, &comm).await?;
    let payload = serde_json::to_vec(&packages)?;
    let now = Utc::now();

    // Flat index.
    let flat_blob = ctx
        .storage
        .put_blob(&payload, Some("application/json"))
        .await?;
    let flat_row = package_list_cache::ActiveModel {
        community_id: Set(Some(comm.id)),
        blob_hash: Set(flat_blob.checksum.to_hex()),
        content_type: Set("application/json".to_string()),
        created_at: Set(now),
        ..Default::default()
    };
    let flat_row = flat_row.insert(&ctx.db).await?;
    record_blob_ref(ctx, "package_list_cache", flat_row.id, "data", &payload).await?;

    // Chunked index.
    let chunks = chunk_listings(packages, ctx.repository.cache_chunk_size);
    let mut chunk_payloads = Vec::with_capacity(chunks.len());
    let mut chunk_urls = Vec::with_capacity(chunks.len());
    for chunk in &chunks {
        let chunk_payload = serde_json::to_vec(chunk)?;
        let blob = ctx
            .storage
            .put_blob(&chunk_payload, Some("application/json"))
            .await?;
        chunk_urls.push(ctx.storage.blob_url(&blob.checksum, true, None).await?);
        chunk_payloads.push(chunk_payload);
    }
    // The index file is a bare JSON array of chunk URLs.
    let index_payload = serde_json::to_vec(&chunk_urls)?;
    let index_blob = ctx
        .storage
        .put_blob(&index_payload, Some("application/json"))
        .await?;

    let chunked_row = chunked_cache::ActiveModel {
        community_id: Set(comm.id),
        index_blob_hash: Set(index_blob.checksum.to_hex()),
        created_at: Set(now),
        ..Default::default()
    };
    let chunked_row = chunked_row.insert(&ctx.db).await?;
    record_blob_ref(ctx, "chunked_cache", chunked_row.id, "index", &index_payload).await?;
    for (i, chunk_payload) in chunk_payloads.iter().enumerate() {
        record_blob_ref(
            ctx,
            "chunked_cache",
            chunked_row.id,
            &format!("chunk/{i}"),
            chunk_payload,
        )
        .await?;
    }

    info!(
        community = comm.identifier,
        chunks = chunk_payloads.len(),
        "Community caches rebuilt"
    );
    Ok(())
}

/// Rebuild every listed community except the isolated heavy one.
#[instrument(skip(ctx))]
pub async fn refresh_all_caches(ctx: &RegistryContext) -> Result<(), WorkerError> {
    let communities = community::Entity::find()
        .filter(community::Column::IsListed.eq(true))
        .all(&ctx.db)
        .await?;

    for comm in communities {
        if ctx.repository.heavy_community.as_deref() == Some(comm.identifier.as_str()) {
            continue;
        }
        if let Err(e) = refresh_community_cache(ctx, comm.id).await {
            warn!(community = comm.identifier, "Cache refresh failed: {e}");
        }
    }
    Ok(())
}

/// Rebuild only the configured heavy community. Runs on its own schedule
/// so its cost never delays the others.
#[instrument(skip(ctx))]
pub async fn refresh_heavy_cache(ctx: &RegistryContext) -> Result<(), WorkerError> {
    let Some(identifier) = &ctx.repository.heavy_community else {
        return Ok(());
    };
    let comm = community::Entity::find()
        .filter(community::Column::Identifier.eq(identifier))
        .one(&ctx.db)
        .await?
        .ok_or_else(|| WorkerError::NotFound(format!("Community {identifier} not found")))?;
    refresh_community_cache(ctx, comm.id).await
}

/// Drop superseded snapshots past the cutoff and reap unreferenced blobs.
#[instrument(skip(ctx))]
pub async fn drop_stale_caches(ctx: &RegistryContext) -> Result<(), WorkerError> {
    let cutoff = Utc::now() - Duration::seconds(STALE_CUTOFF_SECS);

    let flat_rows = package_list_cache::Entity::find()
        .order_by_desc(package_list_cache::Column::Id)
        .all(&ctx.db)
        .await?;
    let mut seen_communities = std::collections::HashSet::new();
    for row in flat_rows {
        // Newest row per community survives; everything older than the
        // cutoff behind it goes.
        let is_latest = seen_communities.insert(row.community_id);
        if is_latest || row.created_at >= cutoff {
            continue;
        }
        drop_owner_refs(&ctx.db, "package_list_cache", &row.id.to_string()).await?;
        package_list_cache::Entity::delete_by_id(row.id)
            .exec(&ctx.db)
            .await?;
    }

    let chunked_rows = chunked_cache::Entity::find()
        .order_by_desc(chunked_cache::Column::Id)
        .all(&ctx.db)
        .await?;
    let mut seen_chunked = std::collections::HashSet::new();
    for row in chunked_rows {
        let is_latest = seen_chunked.insert(row.community_id);
        if is_latest || row.created_at >= cutoff {
            continue;
        }
        drop_owner_refs(&ctx.db, "chunked_cache", &row.id.to_string()).await?;
        chunked_cache::Entity::delete_by_id(row.id)
            .exec(&ctx.db)
            .await?;
    }

    // Blobs nothing points at anymore.
    let referenced = Query::select()
        .column(data_blob_ref::Column::ContentHash)
        .from(data_blob_ref::Entity)
        .to_owned();
    let orphans = data_blob::Entity::find()
        .filter(data_blob::Column::CreatedAt.lt(cutoff))
        .filter(
            Expr::col((data_blob::Entity, data_blob::Column::ContentHash))
                .not_in_subquery(referenced),
        )
        .all(&ctx.db)
        .await?;

    let orphan_count = orphans.len();
    for blob in orphans {
        let hash = ContentHash::from_hex(&blob.content_hash)?;
        ctx.storage.delete_blob(&hash).await?;
        data_blob::Entity::delete_by_id(blob.content_hash)
            .exec(&ctx.db)
            .await?;
    }

    if orphan_count > 0 {
        info!(orphans = orphan_count, "Unreferenced blobs reaped");
    }
    Ok(())
}

async fn record_blob_ref(
    ctx: &RegistryContext,
    owner_type: &str,
    owner_id: i32,
    path: &str,
    payload: &[u8],
) -> Result<(), WorkerError> {
    persist_blob(
        &ctx.db,
        &*ctx.storage,
        payload,
        Some("application/json"),
        owner_type,
        &owner_id.to_string(),
        path,
    )
    .await?;
    Ok(())
}

async fn build_community_index(
    ctx: &RegistryContext,
    comm: &community::Model,
) -> Result<Vec<IndexPackage>, WorkerError> {
    let listings = package_listing::Entity::find()
        .filter(package_listing::Column::CommunityId.eq(comm.id))
        .filter(package_listing::Column::PublicList.eq(true))
        .order_by_desc(package_listing::Column::DateUpdated)
        .all(&ctx.db)
        .await?;

    let mut packages = Vec::with_capacity(listings.len());
    for listing in listings {
        let Some(pkg) = package::Entity::find_by_id(listing.package_id)
            .one(&ctx.db)
            .await?
        else {
            continue;
        };
        if !pkg.public_list {
            continue;
        }
        let Some(ns) = namespace::Entity::find_by_id(pkg.namespace_id)
            .one(&ctx.db)
            .await?
        else {
            continue;
        };

        let versions = package_version::Entity::find()
            .filter(package_version::Column::PackageId.eq(pkg.id))
            .filter(package_version::Column::PublicList.eq(true))
            .order_by_desc(package_version::Column::Id)
            .all(&ctx.db)
            .await?;
        if versions.is_empty() {
            continue;
        }

        let rating_score = package_rating::Entity::find()
            .filter(package_rating::Column::PackageId.eq(pkg.id))
            .count(&ctx.db)
            .await?;

        let category_links = package_listing_category::Entity::find()
            .filter(package_listing_category::Column::ListingId.eq(listing.id))
            .all(&ctx.db)
            .await?;
        let mut categories = Vec::with_capacity(category_links.len());
        for link in category_links {
            if let Some(category) = package_category::Entity::find_by_id(link.category_id)
                .one(&ctx.db)
                .await?
            {
                categories.push(category.name);
            }
        }

        let mut index_versions = Vec::with_capacity(versions.len());
        for version in versions {
            let icon_hash = ContentHash::from_hex(&version.icon_hash)?;
            index_versions.push(IndexVersion {
                full_name: format!("{}-{}-{}", ns.name, version.name, version.version_number),
                name: version.name.clone(),
                uuid4: version.uuid4,
                description: version.description.clone(),
                icon: ctx.storage.blob_url(&icon_hash, false, None).await?,
                version_number: version.version_number.clone(),
                dependencies: dependency_names(ctx, version.id).await?,
                download_url: format!(
                    "/package/download/{}/{}/{}/",
                    ns.name, version.name, version.version_number
                ),
                downloads: version.downloads,
                date_created: version.date_created,
                website_url: version.website_url.clone(),
                is_active: version.is_active,
                file_size: version.file_size,
            });
        }

        packages.push(IndexPackage {
            full_name: format!("{}-{}", ns.name, pkg.name),
            name: pkg.name.clone(),
            uuid4: pkg.uuid4,
            owner: ns.name.clone(),
            package_url: format!("/c/{}/p/{}/{}/", comm.identifier, ns.name, pkg.name),
            date_created: pkg.date_created,
            date_updated: pkg.date_updated,
            rating_score,
            is_pinned: pkg.is_pinned,
            is_deprecated: pkg.is_deprecated,
            has_nsfw_content: listing.has_nsfw_content,
            categories,
            versions: index_versions,
        });
    }

    Ok(packages)
}

async fn dependency_names(
    ctx: &RegistryContext,
    version_id: i32,
) -> Result<Vec<String>, WorkerError> {
    let edges = package_version_dependency::Entity::find()
        .filter(package_version_dependency::Column::VersionId.eq(version_id))
        .all(&ctx.db)
        .await?;

    let mut names = Vec::with_capacity(edges.len());
    for edge in edges {
        let Some(dep) = package_version::Entity::find_by_id(edge.dependency_id)
            .one(&ctx.db)
            .await?
        else {
            continue;
        };
        let Some(dep_pkg) = package::Entity::find_by_id(dep.package_id)
            .one(&ctx.db)
            .await?
        else {
            continue;
        };
        let Some(dep_ns) = namespace::Entity::find_by_id(dep_pkg.namespace_id)
            .one(&ctx.db)
            .await?
        else {
            continue;
        };
        names.push(format!(
            "{}-{}-{}",
            dep_ns.name, dep.name, dep.version_number
        ));
    }
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunking_preserves_order_and_sizes() {
        let chunks = chunk_listings((0..450).collect::<Vec<_>>(), 200);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].len(), 200);
        assert_eq!(chunks[1].len(), 200);
        assert_eq!(chunks[2].len(), 50);
        assert_eq!(chunks[0][0], 0);
        assert_eq!(chunks[2][49], 449);
    }

    #[test]
    fn exact_multiple_has_no_empty_tail() {
        let chunks = chunk_listings((0..400).collect::<Vec<_>>(), 200);
        assert_eq!(chunks.len(), 2);
    }

    #[test]
    fn empty_input_yields_no_chunks() {
        let chunks = chunk_listings(Vec::<i32>::new(), 200);
        assert!(chunks.is_empty());
    }

    #[test]
    fn index_entries_carry_the_stable_uuid() {
        let version_uuid = uuid::Uuid::new_v4();
        let package_uuid = uuid::Uuid::new_v4();
        let entry = IndexPackage {
            name: "Mod".into(),
            full_name: "Team-Mod".into(),
            uuid4: package_uuid,
            owner: "Team".into(),
            package_url: "/c/ror2/p/Team/Mod/".into(),
            date_created: Utc::now(),
            date_updated: Utc::now(),
            rating_score: 0,
            is_pinned: false,
            is_deprecated: false,
            has_nsfw_content: false,
            categories: vec![],
            versions: vec![IndexVersion {
                name: "Mod".into(),
                full_name: "Team-Mod-1.0.0".into(),
                uuid4: version_uuid,
                description: String::new(),
                icon: String::new(),
                version_number: "1.0.0".into(),
                dependencies: vec![],
                download_url: String::new(),
                downloads: 0,
                date_created: Utc::now(),
                website_url: String::new(),
                is_active: true,
                file_size: 0,
            }],
        };
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["uuid4"], serde_json::json!(package_uuid));
        assert_eq!(value["versions"][0]["uuid4"], serde_json::json!(version_uuid));
    }

    #[test]
    fn chunk_index_file_is_a_bare_url_array() {
        let urls = vec!["https://cdn/a.gz".to_string(), "https://cdn/b.gz".to_string()];
        let payload = serde_json::to_vec(&urls).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&payload).unwrap();
        assert!(value.is_array());
        assert_eq!(value[1], "https://cdn/b.gz");
    }
}
