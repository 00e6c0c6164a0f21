//! Content-addressed blob bookkeeping.
//!
//! Storage writes the bytes; these helpers keep the `data_blob` and
//! `data_blob_ref` tables in step so unreferenced blobs can be reaped.

use chrono::Utc;
use common::entity::{data_blob, data_blob_ref};
use common::storage::{BlobRecord, ObjectStorage};
use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use crate::error::WorkerError;

/// Store bytes as a blob and record it under an owner.
///
/// Idempotent at every layer: re-storing the same bytes for the same
/// owner path updates the ref in place.
pub async fn persist_blob<C: ConnectionTrait>(
    db: &C,
    storage: &dyn ObjectStorage,
    data: &[u8],
    content_type: Option<&str>,
    owner_type: &str,
    owner_id: &str,
    path: &str,
) -> Result<BlobRecord, WorkerError> {
    let record = storage.put_blob(data, content_type).await?;

    let blob = data_blob::ActiveModel {
        content_hash: Set(record.checksum.to_hex()),
        size: Set(record.size as i64),
        gzip_size: Set(record.gzip_size.unwrap_or(0) as i64),
        created_at: Set(Utc::now()),
    };
    data_blob::Entity::insert(blob)
        .on_conflict(
            OnConflict::column(data_blob::Column::ContentHash)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(db)
        .await?;

    let blob_ref = data_blob_ref::ActiveModel {
        id: Set(Uuid::now_v7()),
        owner_type: Set(owner_type.to_string()),
        owner_id: Set(owner_id.to_string()),
        path: Set(path.to_string()),
        content_hash: Set(record.checksum.to_hex()),
        content_type: Set(content_type.map(|s| s.to_string())),
        size: Set(record.size as i64),
        created_at: Set(Utc::now()),
    };
    data_blob_ref::Entity::insert(blob_ref)
        .on_conflict(
            OnConflict::columns([
                data_blob_ref::Column::OwnerType,
                data_blob_ref::Column::OwnerId,
                data_blob_ref::Column::Path,
            ])
            .update_columns([
                data_blob_ref::Column::ContentHash,
                data_blob_ref::Column::ContentType,
                data_blob_ref::Column::Size,
                data_blob_ref::Column::CreatedAt,
            ])
            .to_owned(),
        )
        .exec_without_returning(db)
        .await?;

    Ok(record)
}

/// Drop all refs an owner holds. The blobs themselves stay behind for
/// the orphan sweep.
pub async fn drop_owner_refs<C: ConnectionTrait>(
    db: &C,
    owner_type: &str,
    owner_id: &str,
) -> Result<u64, WorkerError> {
    let result = data_blob_ref::Entity::delete_many()
        .filter(data_blob_ref::Column::OwnerType.eq(owner_type))
        .filter(data_blob_ref::Column::OwnerId.eq(owner_id))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}
