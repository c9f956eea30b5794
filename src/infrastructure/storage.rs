use std::sync::Arc;

use async_trait::async_trait;
use derive_more::Display;

use crate::settings::{AppConfig, StorageBackend};

pub mod local;
pub mod s3;

pub use local::LocalDiskStorage;
pub use s3::S3Storage;

/// Reference to an object written to the storage backend.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredImage {
    pub key: String,
    pub url: String,
}

#[derive(Debug, Display)]
pub enum StorageError {
    #[display("Object not found: {_0}")]
    NotFound(String),

    #[display("Invalid storage key: {_0}")]
    InvalidKey(String),

    #[display("Filesystem error: {_0}")]
    Io(std::io::Error),

    #[display("Object storage error: {_0}")]
    Backend(String),
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        StorageError::Io(err)
    }
}

/// Durable home of uploaded image bytes.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ImageStorage: Send + Sync {
    /// Writes `bytes` under `key` and returns a publicly dereferenceable reference.
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<StoredImage, StorageError>;

    async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError>;

    async fn delete(&self, key: &str) -> Result<(), StorageError>;
}

#[async_trait]
impl<T: ImageStorage + ?Sized> ImageStorage for Arc<T> {
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<StoredImage, StorageError> {
        (**self).put(key, bytes, content_type).await
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        (**self).get(key).await
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        (**self).delete(key).await
    }
}

/// Public URL served by this application's `/uploads` route.
pub fn app_served_url(public_base_url: &str, key: &str) -> String {
    format!("{}/uploads/{}", public_base_url.trim_end_matches('/'), key)
}

/// Builds the backend selected by `storage_backend`.
pub async fn from_config(config: &AppConfig) -> Result<Arc<dyn ImageStorage>, StorageError> {
    match config.storage_backend {
        StorageBackend::Local => {
            let storage = LocalDiskStorage::new(&config.upload_dir, &config.public_base_url).await?;
            tracing::info!("Storing uploads on local disk at {}", config.upload_dir);
            Ok(Arc::new(storage))
        }
        StorageBackend::S3 => {
            let storage = S3Storage::from_config(config).await?;
            tracing::info!("Storing uploads in S3 bucket {}", storage.bucket());
            Ok(Arc::new(storage))
        }
    }
}
