use std::io::Write;

use async_trait::async_trait;
use flate2::{Compression, write::GzEncoder};
use tokio::io::AsyncRead;

use super::error::StorageError;
use super::hash::ContentHash;

/// Type alias for a boxed async reader.
pub type BoxReader = Box<dyn AsyncRead + Unpin + Send>;

/// Metadata reported by the store after a completed write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectMetadata {
    pub key: String,
    pub size: u64,
}

/// An in-flight multipart upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultipartSession {
    pub key: String,
    pub upload_id: String,
}

/// A part reported back by the client after a presigned PUT.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedPart {
    pub part_number: u32,
    pub etag: String,
}

/// The outcome of storing a content-addressed blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobRecord {
    pub checksum: ContentHash,
    pub size: u64,
    /// Size of the stored gzip variant, when one was produced.
    pub gzip_size: Option<u64>,
}

/// Object key for a content-addressed blob.
pub fn blob_key(hash: &ContentHash) -> String {
    format!("blobs/{}", hash.to_hex())
}

/// Object key for the gzip variant of a content-addressed blob.
pub fn gzip_blob_key(hash: &ContentHash) -> String {
    format!("blobs/{}.gz", hash.to_hex())
}

/// Keyed object storage with multipart upload brokering.
///
/// The keyed surface is what backends implement; the blob layer on top of it
/// addresses immutable objects by SHA-256 under `blobs/<hex>` and is shared
/// by all backends through the default methods.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Write an object. Overwrites are allowed at the key level; blob-layer
    /// callers never overwrite because keys are derived from content.
    async fn put_object(
        &self,
        key: &str,
        data: &[u8],
        content_type: Option<&str>,
        content_encoding: Option<&str>,
    ) -> Result<(), StorageError>;

    /// Retrieve all bytes of an object.
    async fn get_object(&self, key: &str) -> Result<Vec<u8>, StorageError>;

    /// Retrieve an object as a streaming async reader.
    async fn get_object_stream(&self, key: &str) -> Result<BoxReader, StorageError>;

    /// Check whether an object exists.
    async fn object_exists(&self, key: &str) -> Result<bool, StorageError>;

    /// Get the size of an object in bytes.
    async fn object_size(&self, key: &str) -> Result<u64, StorageError>;

    /// Delete an object. Returns `true` if it existed.
    async fn delete_object(&self, key: &str) -> Result<bool, StorageError>;

    /// A stable, publicly reachable URL for an object.
    fn object_url(&self, key: &str) -> Result<String, StorageError>;

    /// A time-limited signed URL for an object.
    async fn presign_get(&self, key: &str, ttl_secs: u32) -> Result<String, StorageError>;

    /// Start a multipart upload for the given key.
    async fn initiate_multipart(&self, key: &str) -> Result<MultipartSession, StorageError>;

    /// Presign a URL the client may PUT one part's bytes to.
    async fn presign_part(
        &self,
        key: &str,
        upload_id: &str,
        part_number: u32,
        ttl_secs: u32,
    ) -> Result<String, StorageError>;

    /// Finalize a multipart upload from the client-reported parts.
    async fn complete_multipart(
        &self,
        key: &str,
        upload_id: &str,
        parts: &[CompletedPart],
    ) -> Result<ObjectMetadata, StorageError>;

    /// Cancel an in-flight multipart upload.
    ///
    /// Fails with `NoSuchUpload` if the upload id is unknown.
    async fn abort_multipart(&self, key: &str, upload_id: &str) -> Result<(), StorageError>;

    /// Store a content-addressed blob together with its gzip variant.
    ///
    /// Idempotent on checksum: writing bytes that already exist is a no-op
    /// returning the existing record.
    async fn put_blob(
        &self,
        data: &[u8],
        content_type: Option<&str>,
    ) -> Result<BlobRecord, StorageError> {
        let checksum = ContentHash::compute(data);
        let key = blob_key(&checksum);
        let gz_key = gzip_blob_key(&checksum);

        if self.object_exists(&key).await? {
            let gzip_size = match self.object_size(&gz_key).await {
                Ok(size) => Some(size),
                Err(StorageError::NotFound(_)) => None,
                Err(e) => return Err(e),
            };
            return Ok(BlobRecord {
                checksum,
                size: data.len() as u64,
                gzip_size,
            });
        }

        self.put_object(&key, data, content_type, None).await?;

        let gzipped = gzip_bytes(data)?;
        let gzip_size = gzipped.len() as u64;
        self.put_object(&gz_key, &gzipped, content_type, Some("gzip"))
            .await?;

        Ok(BlobRecord {
            checksum,
            size: data.len() as u64,
            gzip_size: Some(gzip_size),
        })
    }

    /// Retrieve a blob's bytes by checksum.
    async fn get_blob(&self, hash: &ContentHash) -> Result<Vec<u8>, StorageError> {
        self.get_object(&blob_key(hash)).await
    }

    /// Retrieve a blob as a streaming reader.
    async fn get_blob_stream(&self, hash: &ContentHash) -> Result<BoxReader, StorageError> {
        self.get_object_stream(&blob_key(hash)).await
    }

    /// URL for a blob, optionally the gzip variant, optionally signed.
    async fn blob_url(
        &self,
        hash: &ContentHash,
        gzip: bool,
        signed_ttl_secs: Option<u32>,
    ) -> Result<String, StorageError> {
        let key = if gzip {
            gzip_blob_key(hash)
        } else {
            blob_key(hash)
        };
        match signed_ttl_secs {
            Some(ttl) => self.presign_get(&key, ttl).await,
            None => self.object_url(&key),
        }
    }

    /// Delete a blob and its gzip variant. Returns `true` if the primary
    /// object existed.
    async fn delete_blob(&self, hash: &ContentHash) -> Result<bool, StorageError> {
        let deleted = self.delete_object(&blob_key(hash)).await?;
        let _ = self.delete_object(&gzip_blob_key(hash)).await?;
        Ok(deleted)
    }
}

/// Gzip-compress a byte slice.
pub fn gzip_bytes(data: &[u8]) -> Result<Vec<u8>, StorageError> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use super::*;

    #[test]
    fn gzip_round_trip() {
        let data = b"[{\"name\": \"Test_Package\"}]".repeat(64);
        let gzipped = gzip_bytes(&data).unwrap();
        assert!(gzipped.len() < data.len());

        let mut decoder = flate2::read::GzDecoder::new(&gzipped[..]);
        let mut out = Vec::new();
        decoder.read_to_end(&mut out).unwrap();
        assert_eq!(out, data);
    }

    #[test]
    fn blob_keys_use_hex_checksum() {
        let hash = ContentHash::compute(b"key test");
        assert_eq!(blob_key(&hash), format!("blobs/{}", hash.to_hex()));
        assert_eq!(gzip_blob_key(&hash), format!("blobs/{}.gz", hash.to_hex()));
    }
}
