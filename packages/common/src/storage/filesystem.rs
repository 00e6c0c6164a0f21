use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::BufReader;
use uuid::Uuid;

use super::error::StorageError;
use super::traits::{BoxReader, CompletedPart, MultipartSession, ObjectMetadata, ObjectStorage};

/// Filesystem-backed object store for local development and tests.
///
/// Objects live at `{base_path}/{key}`. In-flight multipart uploads are
/// staged under `{base_path}/.multipart/{upload_id}/` and concatenated on
/// completion. "Presigned" URLs are plain paths under `base_url`; there is
/// no actual signing, which is fine for the environments this backend is
/// meant for.
pub struct FilesystemStorage {
    base_path: PathBuf,
    base_url: String,
}

impl FilesystemStorage {
    pub async fn new(base_path: PathBuf, base_url: String) -> Result<Self, StorageError> {
        fs::create_dir_all(&base_path).await?;
        fs::create_dir_all(base_path.join(".tmp")).await?;
        fs::create_dir_all(base_path.join(".multipart")).await?;
        Ok(Self {
            base_path,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn object_path(&self, key: &str) -> Result<PathBuf, StorageError> {
        validate_key(key)?;
        Ok(self.base_path.join(key))
    }

    fn temp_path(&self) -> PathBuf {
        self.base_path.join(".tmp").join(Uuid::new_v4().to_string())
    }

    fn upload_dir(&self, upload_id: &str) -> PathBuf {
        self.base_path.join(".multipart").join(upload_id)
    }

    fn part_path(&self, upload_id: &str, part_number: u32) -> PathBuf {
        self.upload_dir(upload_id).join(format!("part-{part_number}"))
    }

    /// Write one part's bytes directly, standing in for a client PUT against
    /// the part URL. Upload tests drive the multipart lifecycle through this.
    pub async fn write_part(
        &self,
        upload_id: &str,
        part_number: u32,
        data: &[u8],
    ) -> Result<CompletedPart, StorageError> {
        let dir = self.upload_dir(upload_id);
        if !fs::try_exists(&dir).await? {
            return Err(StorageError::NoSuchUpload(upload_id.to_string()));
        }
        fs::write(self.part_path(upload_id, part_number), data).await?;
        Ok(CompletedPart {
            part_number,
            etag: super::ContentHash::compute(data).to_hex(),
        })
    }

    async fn write_atomic(&self, target: &Path, data: &[u8]) -> Result<(), StorageError> {
        let temp_path = self.temp_path();
        if let Err(e) = fs::write(&temp_path, data).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).await?;
        }
        if let Err(e) = fs::rename(&temp_path, target).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }
        Ok(())
    }
}

/// Reject keys that could escape the base directory.
fn validate_key(key: &str) -> Result<(), StorageError> {
    if key.is_empty()
        || key.starts_with('/')
        || key.contains('\\')
        || key.split('/').any(|seg| seg.is_empty() || seg == "." || seg == "..")
    {
        return Err(StorageError::Config(format!("unsafe object key: {key}")));
    }
    Ok(())
}

#[async_trait]
impl ObjectStorage for FilesystemStorage {
    async fn put_object(
        &self,
        key: &str,
        data: &[u8],
        _content_type: Option<&str>,
        _content_encoding: Option<&str>,
    ) -> Result<(), StorageError> {
        let path = self.object_path(key)?;
        self.write_atomic(&path, data).await
    }

    async fn get_object(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.object_path(key)?;
        match fs::read(&path).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(key.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn get_object_stream(&self, key: &str) -> Result<BoxReader, StorageError> {
        let path = self.object_path(key)?;
        match fs::File::open(&path).await {
            Ok(file) => Ok(Box::new(BufReader::new(file))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(key.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn object_exists(&self, key: &str) -> Result<bool, StorageError> {
        let path = self.object_path(key)?;
        Ok(fs::try_exists(&path).await?)
    }

    async fn object_size(&self, key: &str) -> Result<u64, StorageError> {
        let path = self.object_path(key)?;
        match fs::metadata(&path).await {
            Ok(meta) => Ok(meta.len()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(key.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn delete_object(&self, key: &str) -> Result<bool, StorageError> {
        let path = self.object_path(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn object_url(&self, key: &str) -> Result<String, StorageError> {
        validate_key(key)?;
        Ok(format!("{}/{}", self.base_url, key))
    }

    async fn presign_get(&self, key: &str, ttl_secs: u32) -> Result<String, StorageError> {
        validate_key(key)?;
        Ok(format!("{}/{}?expires={}", self.base_url, key, ttl_secs))
    }

    async fn initiate_multipart(&self, key: &str) -> Result<MultipartSession, StorageError> {
        validate_key(key)?;
        let upload_id = Uuid::new_v4().to_string();
        let dir = self.upload_dir(&upload_id);
        fs::create_dir_all(&dir).await?;
        fs::write(dir.join("key"), key.as_bytes()).await?;
        Ok(MultipartSession {
            key: key.to_string(),
            upload_id,
        })
    }

    async fn presign_part(
        &self,
        key: &str,
        upload_id: &str,
        part_number: u32,
        ttl_secs: u32,
    ) -> Result<String, StorageError> {
        validate_key(key)?;
        Ok(format!(
            "{}/.multipart/{}/part-{}?expires={}",
            self.base_url, upload_id, part_number, ttl_secs
        ))
    }

    async fn complete_multipart(
        &self,
        key: &str,
        upload_id: &str,
        parts: &[CompletedPart],
    ) -> Result<ObjectMetadata, StorageError> {
        let dir = self.upload_dir(upload_id);
        if !fs::try_exists(&dir).await? {
            return Err(StorageError::NoSuchUpload(upload_id.to_string()));
        }

        let stored_key = fs::read_to_string(dir.join("key")).await?;

        let mut assembled = Vec::new();
        for part in parts {
            let part_path = self.part_path(upload_id, part.part_number);
            match fs::read(&part_path).await {
                Ok(bytes) => assembled.extend_from_slice(&bytes),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    return Err(StorageError::Backend(format!(
                        "missing part {} for upload {}",
                        part.part_number, upload_id
                    )));
                }
                Err(e) => return Err(e.into()),
            }
        }

        let target = self.object_path(&stored_key)?;
        let size = assembled.len() as u64;
        self.write_atomic(&target, &assembled).await?;
        let _ = fs::remove_dir_all(&dir).await;

        // `key` is what the caller thinks it wrote to; `stored_key` is
        // authoritative and may disagree, which the session layer detects.
        let _ = key;
        Ok(ObjectMetadata {
            key: stored_key,
            size,
        })
    }

    async fn abort_multipart(&self, _key: &str, upload_id: &str) -> Result<(), StorageError> {
        let dir = self.upload_dir(upload_id);
        if !fs::try_exists(&dir).await? {
            return Err(StorageError::NoSuchUpload(upload_id.to_string()));
        }
        fs::remove_dir_all(&dir).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::ContentHash;

    async fn temp_store() -> (FilesystemStorage, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = FilesystemStorage::new(
            dir.path().join("objects"),
            "http://localhost/media".into(),
        )
        .await
        .unwrap();
        (store, dir)
    }

    #[tokio::test]
    async fn put_get_round_trip() {
        let (store, _dir) = temp_store().await;
        store
            .put_object("repository/test.zip", b"zip bytes", None, None)
            .await
            .unwrap();
        let data = store.get_object("repository/test.zip").await.unwrap();
        assert_eq!(data, b"zip bytes");
    }

    #[tokio::test]
    async fn get_missing_is_not_found() {
        let (store, _dir) = temp_store().await;
        assert!(matches!(
            store.get_object("missing/key").await,
            Err(StorageError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn unsafe_keys_rejected() {
        let (store, _dir) = temp_store().await;
        for key in ["../escape", "/abs", "a//b", "a/./b", "a\\b"] {
            assert!(
                store.put_object(key, b"x", None, None).await.is_err(),
                "key {key:?} should be rejected"
            );
        }
    }

    #[tokio::test]
    async fn delete_reports_existence() {
        let (store, _dir) = temp_store().await;
        store.put_object("a/b", b"x", None, None).await.unwrap();
        assert!(store.delete_object("a/b").await.unwrap());
        assert!(!store.delete_object("a/b").await.unwrap());
    }

    #[tokio::test]
    async fn multipart_assembles_parts_in_order() {
        let (store, _dir) = temp_store().await;
        let session = store
            .initiate_multipart("usermedia/abc/file.zip")
            .await
            .unwrap();

        let p1 = store.write_part(&session.upload_id, 1, b"hello ").await.unwrap();
        let p2 = store.write_part(&session.upload_id, 2, b"world").await.unwrap();

        let meta = store
            .complete_multipart("usermedia/abc/file.zip", &session.upload_id, &[p1, p2])
            .await
            .unwrap();
        assert_eq!(meta.key, "usermedia/abc/file.zip");
        assert_eq!(meta.size, 11);

        let data = store.get_object("usermedia/abc/file.zip").await.unwrap();
        assert_eq!(data, b"hello world");
    }

    #[tokio::test]
    async fn abort_unknown_upload_is_no_such_upload() {
        let (store, _dir) = temp_store().await;
        assert!(matches!(
            store.abort_multipart("k", "nope").await,
            Err(StorageError::NoSuchUpload(_))
        ));
    }

    #[tokio::test]
    async fn abort_discards_staged_parts() {
        let (store, _dir) = temp_store().await;
        let session = store.initiate_multipart("usermedia/x/y.zip").await.unwrap();
        store.write_part(&session.upload_id, 1, b"data").await.unwrap();
        store
            .abort_multipart("usermedia/x/y.zip", &session.upload_id)
            .await
            .unwrap();
        assert!(matches!(
            store.write_part(&session.upload_id, 2, b"more").await,
            Err(StorageError::NoSuchUpload(_))
        ));
    }

    #[tokio::test]
    async fn put_blob_is_idempotent_and_gzips() {
        let (store, _dir) = temp_store().await;
        let data = b"content addressed".repeat(16);
        let first = store.put_blob(&data, Some("application/zip")).await.unwrap();
        let second = store.put_blob(&data, Some("application/zip")).await.unwrap();
        assert_eq!(first.checksum, second.checksum);
        assert_eq!(first.checksum, ContentHash::compute(&data));
        assert!(first.gzip_size.is_some());

        let fetched = store.get_blob(&first.checksum).await.unwrap();
        assert_eq!(fetched, data);
    }

    #[tokio::test]
    async fn blob_url_variants() {
        let (store, _dir) = temp_store().await;
        let record = store.put_blob(b"url test", None).await.unwrap();
        let plain = store.blob_url(&record.checksum, false, None).await.unwrap();
        let gz = store.blob_url(&record.checksum, true, None).await.unwrap();
        assert!(plain.ends_with(&record.checksum.to_hex()));
        assert!(gz.ends_with(".gz"));
    }
}
