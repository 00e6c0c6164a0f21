use chrono::{DateTime, Utc};
use common::storage::CompletedPart;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use worker::usermedia::UploadSession;

/// Request body for starting a multipart upload session.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct InitiateUploadRequest {
    /// Name of the file being uploaded. Any path components are stripped.
    #[schema(example = "mod-1.0.0.zip")]
    pub filename: String,
    /// Total size of the file in bytes.
    #[schema(example = 52428800)]
    pub file_size_bytes: u64,
}

/// A presigned URL one part's bytes may be PUT to.
#[derive(Serialize, utoipa::ToSchema)]
pub struct UploadPartUrl {
    /// 1-based part number.
    pub part_number: u32,
    /// Presigned URL, valid for a limited time.
    pub url: String,
    /// Byte offset of this part within the file.
    pub offset: u64,
    /// Number of bytes to send for this part.
    pub length: u64,
}

/// An upload session's media record.
#[derive(Serialize, utoipa::ToSchema)]
pub struct UserMediaResponse {
    pub uuid: Uuid,
    pub filename: String,
    /// Size in bytes. Updated to the stored size once the upload completes.
    pub size: i64,
    /// One of `initial`, `upload_created`, `upload_complete`, `upload_error`.
    #[schema(example = "upload_created")]
    pub status: String,
    /// The session and its stored parts are reclaimed after this time.
    pub expiry: DateTime<Utc>,
}

impl From<common::entity::user_media::Model> for UserMediaResponse {
    fn from(media: common::entity::user_media::Model) -> Self {
        Self {
            uuid: media.uuid,
            filename: media.filename,
            size: media.size,
            status: media.status,
            expiry: media.expiry,
        }
    }
}

/// Successful response to an initiate-upload request.
#[derive(Serialize, utoipa::ToSchema)]
pub struct InitiateUploadResponse {
    pub user_media: UserMediaResponse,
    /// Size of every part except possibly the last, in bytes.
    pub part_size: u64,
    pub upload_urls: Vec<UploadPartUrl>,
}

impl From<UploadSession> for InitiateUploadResponse {
    fn from(session: UploadSession) -> Self {
        Self {
            user_media: session.media.into(),
            part_size: session.part_size,
            upload_urls: session
                .part_urls
                .into_iter()
                .map(|p| UploadPartUrl {
                    part_number: p.part_number,
                    url: p.url,
                    offset: p.offset,
                    length: p.length,
                })
                .collect(),
        }
    }
}

/// One client-reported part of a finished upload.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct FinishedPart {
    /// 1-based part number.
    pub part_number: u32,
    /// ETag the store returned for the part's PUT.
    pub etag: String,
}

/// Request body for finalizing an upload session.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct FinishUploadRequest {
    pub parts: Vec<FinishedPart>,
}

impl FinishUploadRequest {
    pub fn into_parts(self) -> Vec<CompletedPart> {
        self.parts
            .into_iter()
            .map(|p| CompletedPart {
                part_number: p.part_number,
                etag: p.etag,
            })
            .collect()
    }
}
