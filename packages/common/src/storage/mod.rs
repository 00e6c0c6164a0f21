mod error;
mod hash;
mod traits;

pub mod filesystem;
pub mod mirror;
#[cfg(feature = "object-storage")]
pub mod s3;

pub use error::StorageError;
pub use hash::ContentHash;
pub use traits::{
    BlobRecord, BoxReader, CompletedPart, MultipartSession, ObjectMetadata, ObjectStorage,
    blob_key, gzip_blob_key,
};

use std::sync::Arc;

use crate::config::StorageConfig;

/// Build the configured storage backend, wrapping it in a mirror layer
/// when mirror targets are configured.
pub async fn build_storage(
    config: &StorageConfig,
) -> Result<Arc<dyn ObjectStorage>, StorageError> {
    let primary: Arc<dyn ObjectStorage> = match config.backend.as_str() {
        "filesystem" => Arc::new(
            filesystem::FilesystemStorage::new(
                config.filesystem.base_path.clone().into(),
                config.filesystem.base_url.clone(),
            )
            .await?,
        ),
        #[cfg(feature = "object-storage")]
        "s3" => Arc::new(s3::S3Storage::new(&config.s3)?),
        other => {
            return Err(StorageError::Config(format!(
                "Unknown storage backend: {other}"
            )));
        }
    };

    if config.mirrors.is_empty() {
        return Ok(primary);
    }

    #[cfg(feature = "object-storage")]
    {
        let mut targets = Vec::with_capacity(config.mirrors.len());
        for mirror_config in &config.mirrors {
            targets.push(mirror::MirrorTarget {
                name: mirror_config.bucket.clone(),
                store: Arc::new(s3::S3Storage::new(mirror_config)?),
            });
        }
        let primary = mirror::MirrorTarget {
            name: "primary".to_string(),
            store: primary,
        };
        Ok(Arc::new(mirror::MirroredStorage::new(primary, targets)))
    }
    #[cfg(not(feature = "object-storage"))]
    Err(StorageError::Config(
        "Mirror targets require the object-storage feature".into(),
    ))
}
