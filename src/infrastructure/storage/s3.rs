use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::{
    config::{Credentials, Region},
    primitives::ByteStream,
    Client,
};

use super::{app_served_url, ImageStorage, StorageError, StoredImage};
use crate::settings::AppConfig;

/// Keeps images in an S3 (or S3-compatible) bucket.
#[derive(Clone)]
pub struct S3Storage {
    client: Client,
    bucket: String,
    public_url: Option<String>,
    public_base_url: String,
}

impl S3Storage {
    pub async fn from_config(config: &AppConfig) -> Result<Self, StorageError> {
        let bucket = config
            .s3_bucket
            .clone()
            .filter(|b| !b.trim().is_empty())
            .ok_or_else(|| StorageError::Backend("S3 bucket is not configured".to_string()))?;

        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = &config.s3_region {
            loader = loader.region(Region::new(region.clone()));
        }
        let sdk_config = loader.load().await;

        let mut builder = aws_sdk_s3::config::Builder::from(&sdk_config);
        if let Some(endpoint) = &config.s3_endpoint {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }
        if let (Some(key_id), Some(secret)) = (&config.s3_access_key_id, &config.s3_secret_access_key) {
            builder = builder.credentials_provider(Credentials::new(
                key_id,
                secret,
                None,
                None,
                "app-config",
            ));
        }

        Ok(S3Storage {
            client: Client::from_conf(builder.build()),
            bucket,
            public_url: config.s3_public_url.clone(),
            public_base_url: config.public_base_url.clone(),
        })
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Without a bucket/CDN URL the image is proxied through `/uploads`.
    fn url_for(&self, key: &str) -> String {
        match &self.public_url {
            Some(url) => format!("{}/{}", url.trim_end_matches('/'), key),
            None => app_served_url(&self.public_base_url, key),
        }
    }
}

#[async_trait]
impl ImageStorage for S3Storage {
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<StoredImage, StorageError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(bytes))
            .send()
            .await
            .map_err(|e| StorageError::Backend(format!("S3 put_object error: {}", e)))?;

        Ok(StoredImage {
            key: key.to_string(),
            url: self.url_for(key),
        })
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        let output = self.client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                if e.as_service_error().is_some_and(|se| se.is_no_such_key()) {
                    StorageError::NotFound(key.to_string())
                } else {
                    StorageError::Backend(format!("S3 get_object error: {}", e))
                }
            })?;

        let data = output
            .body
            .collect()
            .await
            .map_err(|e| StorageError::Backend(format!("S3 body read error: {}", e)))?;

        Ok(data.into_bytes().to_vec())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| StorageError::Backend(format!("S3 delete_object error: {}", e)))?;

        Ok(())
    }
}
