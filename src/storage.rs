//! Object storage for re-hosted images.
//!
//! The bucket is a shared external resource; jobs write under namespaced,
//! job-tagged keys (`uploads/hwp-images/{jobId}_{index}.{ext}`) so concurrent
//! imports cannot collide. The trait is deliberately tiny — put and delete of
//! byte blobs — because that is all the pipeline needs; browsing, listing and
//! locking belong to the site's attachment service, not to this crate.
//!
//! [`S3Store`] targets any S3-compatible endpoint; in production that is
//! Cloudflare R2 behind a custom domain. [`MemoryStore`] backs tests and
//! local development where no bucket exists.

use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;
use std::collections::HashMap;
use std::sync::Mutex;
use thiserror::Error;
use tracing::debug;

/// Failure talking to the object store. Always non-fatal to the job; the
/// image stage records it and moves on.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("put '{key}' failed: {detail}")]
    PutFailed { key: String, detail: String },

    #[error("delete '{key}' failed: {detail}")]
    DeleteFailed { key: String, detail: String },
}

/// Minimal byte-blob store the image stage uploads into.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `bytes` under `key` with the given content type, overwriting
    /// any previous object.
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<(), StoreError>;

    /// Remove the object at `key`. Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<(), StoreError>;
}

// ── S3 / R2 ──────────────────────────────────────────────────────────────

/// S3-compatible store (Cloudflare R2 in production).
#[derive(Clone)]
pub struct S3Store {
    client: S3Client,
    bucket: String,
}

impl S3Store {
    pub fn new(client: S3Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }

    /// Build a store from explicit R2-style credentials.
    ///
    /// `endpoint` may be a bare account id or host; scheme and the
    /// `r2.cloudflarestorage.com` suffix are filled in when missing, matching
    /// how the site's deployment settings are written.
    pub fn from_credentials(
        access_key_id: &str,
        secret_access_key: &str,
        endpoint: &str,
        region: &str,
        bucket: impl Into<String>,
    ) -> Self {
        use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};

        let endpoint = normalize_endpoint(endpoint);
        let credentials = Credentials::new(access_key_id, secret_access_key, None, None, "r2");

        let s3_config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .credentials_provider(credentials)
            .region(Region::new(region.to_string()))
            .endpoint_url(endpoint)
            .force_path_style(true)
            .build();

        Self::new(S3Client::from_conf(s3_config), bucket)
    }

    /// Build a store from the ambient AWS environment (profile, environment
    /// variables, instance metadata). For plain S3 deployments that don't go
    /// through the R2 settings.
    pub async fn from_env(bucket: impl Into<String>) -> Self {
        let shared = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        Self::new(S3Client::new(&shared), bucket)
    }
}

/// Fix up a deployment-supplied endpoint: prepend https and append the R2
/// storage host when the value is just an account id.
fn normalize_endpoint(endpoint: &str) -> String {
    let mut ep = endpoint.trim().to_string();
    if !ep.starts_with("http") {
        ep = format!("https://{ep}");
        if !ep.contains(".r2.cloudflarestorage.com") {
            ep = format!("{ep}.r2.cloudflarestorage.com");
        }
    }
    ep
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<(), StoreError> {
        debug!("put s3://{}/{} ({} bytes)", self.bucket, key, bytes.len());
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(bytes))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| StoreError::PutFailed {
                key: key.to_string(),
                detail: e.to_string(),
            })?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| StoreError::DeleteFailed {
                key: key.to_string(),
                detail: e.to_string(),
            })?;
        Ok(())
    }
}

// ── In-memory store (tests, local development) ───────────────────────────

/// Keeps objects in a mutex-guarded map. When `fail_puts` is set every put is
/// refused, which is how tests exercise the per-image isolation path.
#[derive(Default)]
pub struct MemoryStore {
    objects: Mutex<HashMap<String, (Vec<u8>, String)>>,
    fail_puts: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that rejects every upload.
    pub fn failing() -> Self {
        Self {
            objects: Mutex::new(HashMap::new()),
            fail_puts: true,
        }
    }

    /// Stored object bytes and content type, if present.
    pub fn get(&self, key: &str) -> Option<(Vec<u8>, String)> {
        self.objects.lock().unwrap().get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.objects.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<(), StoreError> {
        if self.fail_puts {
            return Err(StoreError::PutFailed {
                key: key.to_string(),
                detail: "store configured to fail".to_string(),
            });
        }
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), (bytes, content_type.to_string()));
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.objects.lock().unwrap().remove(key);
        Ok(())
    }
}
