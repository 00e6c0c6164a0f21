use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::warn;

use super::error::StorageError;
use super::traits::{BoxReader, CompletedPart, MultipartSession, ObjectMetadata, ObjectStorage};

/// How long a destination write lock may be held before it is considered
/// abandoned.
pub const MIRROR_LOCK_TIMEOUT: Duration = Duration::from_secs(30);

/// A named storage destination participating in mirroring.
pub struct MirrorTarget {
    pub name: String,
    pub store: Arc<dyn ObjectStorage>,
}

/// Fans writes out to a primary store and N mirrors.
///
/// Each write takes a non-blocking named lock on the destination; a held
/// lock fails the caller with `Busy` rather than queueing. Reads, URL
/// issuing and multipart brokering always go to the primary. A failed
/// mirror write fails the whole operation after best-effort rollback of the
/// mirrors written so far.
pub struct MirroredStorage {
    primary: MirrorTarget,
    mirrors: Vec<MirrorTarget>,
    locks: DashMap<String, Instant>,
}

impl MirroredStorage {
    pub fn new(primary: MirrorTarget, mirrors: Vec<MirrorTarget>) -> Self {
        Self {
            primary,
            mirrors,
            locks: DashMap::new(),
        }
    }

    fn lock_name(target: &MirrorTarget, key: &str) -> String {
        format!("{}:{}", target.name, key)
    }

    /// Non-blocking acquire. A stale entry past the timeout is stolen.
    fn try_lock(&self, name: &str) -> Result<(), StorageError> {
        let now = Instant::now();
        match self.locks.entry(name.to_string()) {
            Entry::Vacant(entry) => {
                entry.insert(now);
                Ok(())
            }
            Entry::Occupied(mut entry) => {
                if now.duration_since(*entry.get()) > MIRROR_LOCK_TIMEOUT {
                    entry.insert(now);
                    Ok(())
                } else {
                    Err(StorageError::Busy(name.to_string()))
                }
            }
        }
    }

    fn unlock(&self, name: &str) {
        self.locks.remove(name);
    }

    async fn locked_put(
        &self,
        target: &MirrorTarget,
        key: &str,
        data: &[u8],
        content_type: Option<&str>,
        content_encoding: Option<&str>,
    ) -> Result<(), StorageError> {
        let lock = Self::lock_name(target, key);
        self.try_lock(&lock)?;
        let result = target
            .store
            .put_object(key, data, content_type, content_encoding)
            .await;
        self.unlock(&lock);
        result
    }
}

#[async_trait]
impl ObjectStorage for MirroredStorage {
    async fn put_object(
        &self,
        key: &str,
        data: &[u8],
        content_type: Option<&str>,
        content_encoding: Option<&str>,
    ) -> Result<(), StorageError> {
        self.locked_put(&self.primary, key, data, content_type, content_encoding)
            .await?;

        let mut written: Vec<&MirrorTarget> = Vec::new();
        for mirror in &self.mirrors {
            match self
                .locked_put(mirror, key, data, content_type, content_encoding)
                .await
            {
                Ok(()) => written.push(mirror),
                Err(e) => {
                    for done in written {
                        if let Err(rollback) = done.store.delete_object(key).await {
                            warn!(
                                mirror = %done.name,
                                key,
                                error = %rollback,
                                "Mirror rollback failed"
                            );
                        }
                    }
                    return Err(e);
                }
            }
        }
        Ok(())
    }

    async fn get_object(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        self.primary.store.get_object(key).await
    }

    async fn get_object_stream(&self, key: &str) -> Result<BoxReader, StorageError> {
        self.primary.store.get_object_stream(key).await
    }

    async fn object_exists(&self, key: &str) -> Result<bool, StorageError> {
        self.primary.store.object_exists(key).await
    }

    async fn object_size(&self, key: &str) -> Result<u64, StorageError> {
        self.primary.store.object_size(key).await
    }

    async fn delete_object(&self, key: &str) -> Result<bool, StorageError> {
        let deleted = self.primary.store.delete_object(key).await?;
        for mirror in &self.mirrors {
            if let Err(e) = mirror.store.delete_object(key).await {
                warn!(mirror = %mirror.name, key, error = %e, "Mirror delete failed");
            }
        }
        Ok(deleted)
    }

    fn object_url(&self, key: &str) -> Result<String, StorageError> {
        self.primary.store.object_url(key)
    }

    async fn presign_get(&self, key: &str, ttl_secs: u32) -> Result<String, StorageError> {
        self.primary.store.presign_get(key, ttl_secs).await
    }

    async fn initiate_multipart(&self, key: &str) -> Result<MultipartSession, StorageError> {
        self.primary.store.initiate_multipart(key).await
    }

    async fn presign_part(
        &self,
        key: &str,
        upload_id: &str,
        part_number: u32,
        ttl_secs: u32,
    ) -> Result<String, StorageError> {
        self.primary
            .store
            .presign_part(key, upload_id, part_number, ttl_secs)
            .await
    }

    async fn complete_multipart(
        &self,
        key: &str,
        upload_id: &str,
        parts: &[CompletedPart],
    ) -> Result<ObjectMetadata, StorageError> {
        self.primary
            .store
            .complete_multipart(key, upload_id, parts)
            .await
    }

    async fn abort_multipart(&self, key: &str, upload_id: &str) -> Result<(), StorageError> {
        self.primary.store.abort_multipart(key, upload_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::filesystem::FilesystemStorage;

    async fn fs_target(name: &str, dir: &tempfile::TempDir) -> MirrorTarget {
        MirrorTarget {
            name: name.to_string(),
            store: Arc::new(
                FilesystemStorage::new(
                    dir.path().join(name),
                    format!("http://{name}.local"),
                )
                .await
                .unwrap(),
            ),
        }
    }

    #[tokio::test]
    async fn writes_reach_all_mirrors() {
        let dir = tempfile::tempdir().unwrap();
        let primary = fs_target("primary", &dir).await;
        let mirror = fs_target("mirror", &dir).await;
        let mirror_store = Arc::clone(&mirror.store);

        let mirrored = MirroredStorage::new(primary, vec![mirror]);
        mirrored
            .put_object("a/b.zip", b"payload", None, None)
            .await
            .unwrap();

        assert_eq!(mirrored.get_object("a/b.zip").await.unwrap(), b"payload");
        assert_eq!(
            mirror_store.get_object("a/b.zip").await.unwrap(),
            b"payload"
        );
    }

    #[tokio::test]
    async fn deletes_fan_out() {
        let dir = tempfile::tempdir().unwrap();
        let primary = fs_target("primary", &dir).await;
        let mirror = fs_target("mirror", &dir).await;
        let mirror_store = Arc::clone(&mirror.store);

        let mirrored = MirroredStorage::new(primary, vec![mirror]);
        mirrored.put_object("x", b"1", None, None).await.unwrap();
        assert!(mirrored.delete_object("x").await.unwrap());
        assert!(!mirror_store.object_exists("x").await.unwrap());
    }

    #[tokio::test]
    async fn held_lock_fails_with_busy() {
        let dir = tempfile::tempdir().unwrap();
        let primary = fs_target("primary", &dir).await;
        let mirrored = MirroredStorage::new(primary, vec![]);

        mirrored.try_lock("primary:contested").unwrap();
        let err = mirrored.try_lock("primary:contested").unwrap_err();
        assert!(matches!(err, StorageError::Busy(_)));

        mirrored.unlock("primary:contested");
        mirrored.try_lock("primary:contested").unwrap();
    }
}
