use std::collections::HashMap;
use std::io::Cursor;

use async_trait::async_trait;
use s3::creds::Credentials;
use s3::error::S3Error;
use s3::serde_types::Part;
use s3::{Bucket, Region};

use crate::config::S3StorageConfig;

use super::error::StorageError;
use super::traits::{BoxReader, CompletedPart, MultipartSession, ObjectMetadata, ObjectStorage};

/// S3-backed object store (AWS, MinIO, B2 and friends via custom endpoints).
pub struct S3Storage {
    bucket: Box<Bucket>,
    /// CDN or bucket-website prefix for unsigned URLs. When unset, unsigned
    /// URL requests fall back to the endpoint-style URL.
    public_base_url: Option<String>,
}

impl S3Storage {
    pub fn new(config: &S3StorageConfig) -> Result<Self, StorageError> {
        if config.bucket.is_empty() {
            return Err(StorageError::Config("storage.s3.bucket is not set".into()));
        }

        let region = Region::Custom {
            region: config.region.clone(),
            endpoint: config.endpoint.clone(),
        };
        let credentials = Credentials::new(
            Some(&config.access_key),
            Some(&config.secret_key),
            None,
            None,
            None,
        )
        .map_err(|e| StorageError::Config(format!("invalid S3 credentials: {e}")))?;

        let mut bucket = Bucket::new(&config.bucket, region, credentials)
            .map_err(|e| StorageError::Config(format!("invalid S3 bucket config: {e}")))?;
        if config.path_style {
            bucket = bucket.with_path_style();
        }

        Ok(Self {
            bucket,
            public_base_url: config
                .public_base_url
                .as_ref()
                .map(|url| url.trim_end_matches('/').to_string()),
        })
    }
}

fn map_err(err: S3Error) -> StorageError {
    let msg = err.to_string();
    if msg.contains("NoSuchUpload") {
        StorageError::NoSuchUpload(msg)
    } else if msg.contains("NoSuchKey") || msg.contains("404") {
        StorageError::NotFound(msg)
    } else {
        StorageError::Backend(msg)
    }
}

#[async_trait]
impl ObjectStorage for S3Storage {
    async fn put_object(
        &self,
        key: &str,
        data: &[u8],
        content_type: Option<&str>,
        content_encoding: Option<&str>,
    ) -> Result<(), StorageError> {
        // rust-s3 has no direct content-encoding knob on simple puts; the
        // encoding is recorded in the DB row and implied by the `.gz` key.
        let _ = content_encoding;
        let content_type = content_type.unwrap_or("application/octet-stream");
        let response = self
            .bucket
            .put_object_with_content_type(key, data, content_type)
            .await
            .map_err(map_err)?;
        if response.status_code() >= 300 {
            return Err(StorageError::Backend(format!(
                "put {key} returned status {}",
                response.status_code()
            )));
        }
        Ok(())
    }

    async fn get_object(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        let response = self.bucket.get_object(key).await.map_err(map_err)?;
        match response.status_code() {
            200 => Ok(response.to_vec()),
            404 => Err(StorageError::NotFound(key.to_string())),
            status => Err(StorageError::Backend(format!(
                "get {key} returned status {status}"
            ))),
        }
    }

    async fn get_object_stream(&self, key: &str) -> Result<BoxReader, StorageError> {
        let data = self.get_object(key).await?;
        Ok(Box::new(Cursor::new(data)))
    }

    async fn object_exists(&self, key: &str) -> Result<bool, StorageError> {
        match self.bucket.head_object(key).await {
            Ok((_, 200)) => Ok(true),
            Ok((_, 404)) => Ok(false),
            Ok((_, status)) => Err(StorageError::Backend(format!(
                "head {key} returned status {status}"
            ))),
            Err(e) => match map_err(e) {
                StorageError::NotFound(_) => Ok(false),
                other => Err(other),
            },
        }
    }

    async fn object_size(&self, key: &str) -> Result<u64, StorageError> {
        match self.bucket.head_object(key).await {
            Ok((head, 200)) => Ok(head.content_length.unwrap_or(0) as u64),
            Ok((_, 404)) => Err(StorageError::NotFound(key.to_string())),
            Ok((_, status)) => Err(StorageError::Backend(format!(
                "head {key} returned status {status}"
            ))),
            Err(e) => Err(map_err(e)),
        }
    }

    async fn delete_object(&self, key: &str) -> Result<bool, StorageError> {
        match self.bucket.delete_object(key).await {
            Ok(_) => Ok(true),
            Err(e) => match map_err(e) {
                StorageError::NotFound(_) => Ok(false),
                other => Err(other),
            },
        }
    }

    fn object_url(&self, key: &str) -> Result<String, StorageError> {
        match &self.public_base_url {
            Some(base) => Ok(format!("{base}/{key}")),
            None => Ok(format!("{}/{}", self.bucket.url(), key)),
        }
    }

    async fn presign_get(&self, key: &str, ttl_secs: u32) -> Result<String, StorageError> {
        self.bucket
            .presign_get(key, ttl_secs, None)
            .await
            .map_err(map_err)
    }

    async fn initiate_multipart(&self, key: &str) -> Result<MultipartSession, StorageError> {
        let response = self
            .bucket
            .initiate_multipart_upload(key, "application/octet-stream")
            .await
            .map_err(map_err)?;
        Ok(MultipartSession {
            key: response.key,
            upload_id: response.upload_id,
        })
    }

    async fn presign_part(
        &self,
        key: &str,
        upload_id: &str,
        part_number: u32,
        ttl_secs: u32,
    ) -> Result<String, StorageError> {
        let mut queries = HashMap::new();
        queries.insert("uploadId".to_string(), upload_id.to_string());
        queries.insert("partNumber".to_string(), part_number.to_string());
        self.bucket
            .presign_put(key, ttl_secs, None, Some(queries))
            .await
            .map_err(map_err)
    }

    async fn complete_multipart(
        &self,
        key: &str,
        upload_id: &str,
        parts: &[CompletedPart],
    ) -> Result<ObjectMetadata, StorageError> {
        let parts: Vec<Part> = parts
            .iter()
            .map(|p| Part {
                part_number: p.part_number,
                etag: p.etag.clone(),
            })
            .collect();

        let response = self
            .bucket
            .complete_multipart_upload(key, upload_id, parts)
            .await
            .map_err(map_err)?;
        if response.status_code() >= 300 {
            return Err(StorageError::Backend(format!(
                "complete multipart for {key} returned status {}",
                response.status_code()
            )));
        }

        let size = self.object_size(key).await?;
        Ok(ObjectMetadata {
            key: key.to_string(),
            size,
        })
    }

    async fn abort_multipart(&self, key: &str, upload_id: &str) -> Result<(), StorageError> {
        self.bucket
            .abort_upload(key, upload_id)
            .await
            .map_err(map_err)
    }
}
