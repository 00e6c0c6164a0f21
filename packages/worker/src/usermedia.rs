//! Multipart upload session lifecycle.
//!
//! Clients upload package archives directly to object storage through
//! presigned part URLs; the database row tracks the session so the
//! submission pipeline can consume the finished object by uuid.

use chrono::{Duration, Utc};
use common::entity::user_media;
use common::enums::UserMediaStatus;
use common::storage::{CompletedPart, StorageError};
use common::validators::base_filename;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::context::RegistryContext;
use crate::error::WorkerError;

/// A presigned URL the client PUTs one part's bytes to.
#[derive(Debug, Clone)]
pub struct PartUrl {
    pub part_number: u32,
    pub url: String,
    /// Byte offset of this part within the file.
    pub offset: u64,
    /// Number of bytes the client should send for this part.
    pub length: u64,
}

/// The result of initiating an upload session.
pub struct UploadSession {
    pub media: user_media::Model,
    pub part_size: u64,
    pub part_urls: Vec<PartUrl>,
}

/// Number of parts needed to cover `size` bytes.
pub fn part_count(size: u64, part_size: u64) -> u32 {
    size.div_ceil(part_size) as u32
}

/// Byte range covered by a 1-based part number.
pub fn part_range(part_number: u32, size: u64, part_size: u64) -> (u64, u64) {
    let offset = u64::from(part_number - 1) * part_size;
    (offset, (size - offset).min(part_size))
}

/// Object storage key for an upload. Computed once at initiation and
/// stored; completion cross-checks the backend against it.
pub fn upload_key(uuid: Uuid, filename: &str) -> String {
    format!("usermedia/{uuid}/{filename}")
}

/// Start a multipart upload session and presign all part URLs.
#[instrument(skip(ctx))]
pub async fn initiate_upload(
    ctx: &RegistryContext,
    user_id: Option<i32>,
    filename: &str,
    size: u64,
) -> Result<UploadSession, WorkerError> {
    let limits = &ctx.repository;
    if size < limits.min_upload_size {
        return Err(WorkerError::validation(
            "file_size_bytes",
            &format!("Minimum upload size is {} bytes", limits.min_upload_size),
        ));
    }
    if size > limits.max_upload_size {
        return Err(WorkerError::validation(
            "file_size_bytes",
            &format!("Maximum upload size is {} bytes", limits.max_upload_size),
        ));
    }

    let filename = base_filename(filename).to_string();
    if filename.is_empty() {
        return Err(WorkerError::validation("filename", "A filename is required"));
    }

    let uuid = Uuid::new_v4();
    let key = upload_key(uuid, &filename);
    let session = ctx.storage.initiate_multipart(&key).await?;

    let now = Utc::now();
    let media = user_media::ActiveModel {
        uuid: Set(uuid),
        owner_user_id: Set(user_id),
        filename: Set(filename),
        size: Set(size as i64),
        key: Set(key.clone()),
        upload_id: Set(Some(session.upload_id.clone())),
        status: Set(UserMediaStatus::UploadCreated.as_str().to_string()),
        expiry: Set(now + Duration::seconds(limits.usermedia_ttl_secs)),
        created_at: Set(now),
    };
    let media = media.insert(&ctx.db).await?;

    let count = part_count(size, limits.upload_part_size);
    let mut part_urls = Vec::with_capacity(count as usize);
    for part_number in 1..=count {
        let url = ctx
            .storage
            .presign_part(&key, &session.upload_id, part_number, limits.part_url_ttl_secs)
            .await?;
        let (offset, length) = part_range(part_number, size, limits.upload_part_size);
        part_urls.push(PartUrl {
            part_number,
            url,
            offset,
            length,
        });
    }

    info!(uuid = %uuid, parts = count, "Upload session created");
    Ok(UploadSession {
        media,
        part_size: limits.upload_part_size,
        part_urls,
    })
}

/// Finalize an upload from the client-reported parts.
///
/// Fails the session permanently if the backend reports the object under
/// a different key than the one recorded at initiation.
#[instrument(skip(ctx, parts))]
pub async fn finish_upload(
    ctx: &RegistryContext,
    user_id: Option<i32>,
    uuid: Uuid,
    parts: &[CompletedPart],
) -> Result<user_media::Model, WorkerError> {
    let media = find_owned(ctx, user_id, uuid).await?;

    let status = UserMediaStatus::parse(&media.status);
    if status != Some(UserMediaStatus::UploadCreated) {
        return Err(WorkerError::InvalidState(format!(
            "Cannot finish upload in status {}",
            media.status
        )));
    }
    if media.expiry < Utc::now() {
        return Err(WorkerError::InvalidState("Upload session has expired".into()));
    }
    let upload_id = media
        .upload_id
        .clone()
        .ok_or_else(|| WorkerError::InvalidState("Upload has no backend session".into()))?;

    let metadata = match ctx
        .storage
        .complete_multipart(&media.key, &upload_id, parts)
        .await
    {
        Ok(metadata) => metadata,
        Err(e) => {
            mark_errored(ctx, &media).await;
            return Err(e.into());
        }
    };

    if metadata.key != media.key {
        mark_errored(ctx, &media).await;
        return Err(StorageError::KeyChanged {
            expected: media.key,
            actual: metadata.key,
        }
        .into());
    }

    let mut active: user_media::ActiveModel = media.into();
    active.status = Set(UserMediaStatus::UploadComplete.as_str().to_string());
    active.size = Set(metadata.size as i64);
    let media = active.update(&ctx.db).await?;

    info!(uuid = %uuid, size = media.size, "Upload completed");
    Ok(media)
}

/// Cancel an upload session. Idempotent against the backend: an already
/// expired or reaped multipart upload is treated as aborted.
#[instrument(skip(ctx))]
pub async fn abort_upload(
    ctx: &RegistryContext,
    user_id: Option<i32>,
    uuid: Uuid,
) -> Result<user_media::Model, WorkerError> {
    let media = find_owned(ctx, user_id, uuid).await?;

    match UserMediaStatus::parse(&media.status) {
        Some(UserMediaStatus::Initial) | Some(UserMediaStatus::UploadCreated) => {}
        _ => {
            return Err(WorkerError::InvalidState(format!(
                "Cannot abort upload in status {}",
                media.status
            )));
        }
    }

    if let Some(upload_id) = &media.upload_id {
        match ctx.storage.abort_multipart(&media.key, upload_id).await {
            Ok(()) | Err(StorageError::NoSuchUpload(_)) => {}
            Err(e) => return Err(e.into()),
        }
    }

    let mut active: user_media::ActiveModel = media.into();
    active.status = Set(UserMediaStatus::UploadError.as_str().to_string());
    active.upload_id = Set(None);
    Ok(active.update(&ctx.db).await?)
}

/// Delete expired sessions, aborting any still in flight and removing
/// completed objects from storage. Returns the number of rows removed.
#[instrument(skip(ctx))]
pub async fn cleanup_expired(ctx: &RegistryContext) -> Result<u64, WorkerError> {
    let expired = user_media::Entity::find()
        .filter(user_media::Column::Expiry.lt(Utc::now()))
        .all(&ctx.db)
        .await?;

    let mut removed = 0u64;
    for media in expired {
        match UserMediaStatus::parse(&media.status) {
            Some(UserMediaStatus::UploadCreated) => {
                if let Some(upload_id) = &media.upload_id {
                    match ctx.storage.abort_multipart(&media.key, upload_id).await {
                        Ok(()) | Err(StorageError::NoSuchUpload(_)) => {}
                        Err(e) => {
                            warn!(uuid = %media.uuid, "Failed to abort expired upload: {e}");
                            continue;
                        }
                    }
                }
            }
            Some(UserMediaStatus::UploadComplete) => {
                if let Err(e) = ctx.storage.delete_object(&media.key).await {
                    warn!(uuid = %media.uuid, "Failed to delete expired upload object: {e}");
                    continue;
                }
            }
            _ => {}
        }

        user_media::Entity::delete_by_id(media.uuid)
            .exec(&ctx.db)
            .await?;
        removed += 1;
    }

    if removed > 0 {
        info!(removed, "Expired upload sessions cleaned up");
    }
    Ok(removed)
}

async fn find_owned(
    ctx: &RegistryContext,
    user_id: Option<i32>,
    uuid: Uuid,
) -> Result<user_media::Model, WorkerError> {
    let media = user_media::Entity::find_by_id(uuid)
        .one(&ctx.db)
        .await?
        .ok_or_else(|| WorkerError::NotFound("Upload not found".into()))?;

    if media.owner_user_id != user_id {
        return Err(WorkerError::PermissionDenied(
            "Upload belongs to another user".into(),
        ));
    }
    Ok(media)
}

/// Best-effort transition to the error status after a failed completion.
async fn mark_errored(ctx: &RegistryContext, media: &user_media::Model) {
    let mut active: user_media::ActiveModel = media.clone().into();
    active.status = Set(UserMediaStatus::UploadError.as_str().to_string());
    if let Err(e) = active.update(&ctx.db).await {
        warn!(uuid = %media.uuid, "Failed to mark upload as errored: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn part_count_uses_ceiling_division() {
        let part = 50 * 1024 * 1024;
        assert_eq!(part_count(1, part), 1);
        assert_eq!(part_count(part, part), 1);
        assert_eq!(part_count(part + 1, part), 2);
        assert_eq!(part_count(3 * part - 1, part), 3);
    }

    #[test]
    fn part_ranges_tile_the_file() {
        let part = 50 * 1024 * 1024u64;
        let size = 2 * part + 7;
        assert_eq!(part_range(1, size, part), (0, part));
        assert_eq!(part_range(2, size, part), (part, part));
        assert_eq!(part_range(3, size, part), (2 * part, 7));
    }

    #[test]
    fn upload_key_embeds_uuid_and_filename() {
        let uuid = Uuid::new_v4();
        let key = upload_key(uuid, "mod.zip");
        assert_eq!(key, format!("usermedia/{uuid}/mod.zip"));
    }
}
