//! Object storage client (`/storage/v1`)

use async_trait::async_trait;
use reqwest::{header, Method};
use serde::Serialize;
use std::sync::Arc;

use super::{check, BackendClient, BackendError, Credential};
use crate::config::StorageConfig;

/// Object storage used for post and resource images
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Upload `data` to `path` inside the image bucket and return its public URL
    async fn upload(
        &self,
        credential: &Credential,
        path: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<String, BackendError>;
}

/// Bucket definition used by the setup binary
#[derive(Debug, Clone, Serialize)]
pub struct BucketSpec {
    pub id: String,
    pub name: String,
    pub public: bool,
    pub file_size_limit: u64,
    pub allowed_mime_types: Vec<String>,
}

impl BucketSpec {
    /// Public image bucket restricted to the configured size and types
    pub fn public_images(config: &StorageConfig) -> Self {
        Self {
            id: config.bucket.clone(),
            name: config.bucket.clone(),
            public: true,
            file_size_limit: config.max_file_size,
            allowed_mime_types: config.allowed_types.clone(),
        }
    }
}

/// Result of a bucket creation attempt that did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketOutcome {
    Created,
    AlreadyExists,
}

/// Storage implementation over the shared backend client
pub struct SupabaseStorage {
    client: BackendClient,
    bucket: String,
}

impl SupabaseStorage {
    pub fn new(client: BackendClient, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }

    pub fn boxed(client: BackendClient, bucket: impl Into<String>) -> Arc<dyn ObjectStorage> {
        Arc::new(Self::new(client, bucket))
    }

    /// Public URL of an object in the bucket
    pub fn public_url(&self, path: &str) -> String {
        self.client
            .endpoint(&format!("storage/v1/object/public/{}/{}", self.bucket, path))
    }

    /// Create the bucket with the service role key
    pub async fn create_bucket(&self, spec: &BucketSpec, service_key: &str) -> Result<BucketOutcome, BackendError> {
        let response = self
            .client
            .request_with_key(Method::POST, "storage/v1/bucket", service_key)
            .json(spec)
            .send()
            .await?;

        match check(response).await {
            Ok(_) => Ok(BucketOutcome::Created),
            Err(e) if is_already_exists(&e) => Ok(BucketOutcome::AlreadyExists),
            Err(e) => Err(e),
        }
    }
}

fn is_already_exists(err: &BackendError) -> bool {
    match err {
        BackendError::Api { status, message } => {
            *status == 409 || message.to_lowercase().contains("already exists")
        }
        _ => false,
    }
}

#[async_trait]
impl ObjectStorage for SupabaseStorage {
    async fn upload(
        &self,
        credential: &Credential,
        path: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<String, BackendError> {
        let object_path = format!("storage/v1/object/{}/{}", self.bucket, path);
        tracing::debug!(bucket = %self.bucket, path, size = data.len(), "uploading object");

        let response = self
            .client
            .request(Method::POST, &object_path, credential)
            .header(header::CONTENT_TYPE, content_type)
            .header("cache-control", "max-age=3600")
            .header("x-upsert", "false")
            .body(data)
            .send()
            .await?;
        check(response).await?;

        Ok(self.public_url(path))
    }
}
