use std::{io, path::{Path, PathBuf}};

use async_trait::async_trait;
use tokio::fs;

use super::{app_served_url, ImageStorage, StorageError, StoredImage};

/// Keeps images in a directory on the local filesystem.
#[derive(Debug, Clone)]
pub struct LocalDiskStorage {
    root: PathBuf,
    public_base_url: String,
}

impl LocalDiskStorage {
    /// Creates the upload directory when it does not exist yet.
    pub async fn new(root: impl AsRef<Path>, public_base_url: &str) -> Result<Self, StorageError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).await?;

        Ok(LocalDiskStorage {
            root,
            public_base_url: public_base_url.to_string(),
        })
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let is_plain_name = !key.is_empty()
            && !key.starts_with('.')
            && key.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));

        if !is_plain_name {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(key))
    }
}

#[async_trait]
impl ImageStorage for LocalDiskStorage {
    async fn put(&self, key: &str, bytes: Vec<u8>, _content_type: &str) -> Result<StoredImage, StorageError> {
        let path = self.path_for(key)?;
        fs::write(&path, bytes).await?;

        Ok(StoredImage {
            key: key.to_string(),
            url: app_served_url(&self.public_base_url, key),
        })
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.path_for(key)?;
        match fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(StorageError::NotFound(key.to_string())),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(StorageError::NotFound(key.to_string())),
            Err(e) => Err(e.into()),
        }
    }
}
