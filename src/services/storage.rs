//! Object storage for report attachments.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;

use crate::config::{StorageBackend, StorageConfig};

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("File upload failed: {0}")]
    Upload(String),

    #[error("File delete failed: {0}")]
    Delete(String),

    #[error("Object is not managed by this store: {0}")]
    Unmanaged(String),

    #[error("Invalid object key: {0}")]
    InvalidKey(String),

    #[error("Storage is not configured: {0}")]
    NotConfigured(&'static str),
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `bytes` under `key`, returning the public URL.
    async fn put(&self, key: &str, content_type: &str, bytes: Vec<u8>) -> Result<String, StorageError>;

    /// Remove the object previously returned as `url`. Missing objects are not an error.
    async fn delete(&self, url: &str) -> Result<(), StorageError>;
}

pub fn from_config(config: &StorageConfig) -> Result<Box<dyn ObjectStore>, StorageError> {
    match config.backend {
        StorageBackend::Local => Ok(Box::new(LocalObjectStore::new(
            &config.local_root,
            &config.public_base_url,
        ))),
        StorageBackend::Http => {
            let bucket_url = config
                .bucket_url
                .clone()
                .ok_or(StorageError::NotConfigured("STORAGE_BUCKET_URL"))?;
            Ok(Box::new(HttpObjectStore::new(bucket_url, &config.public_base_url)))
        }
    }
}

/// Key of `url` relative to `base`, if it lives there.
fn key_from_url<'a>(base: &str, url: &'a str) -> Option<&'a str> {
    url.strip_prefix(base.trim_end_matches('/'))?
        .strip_prefix('/')
        .filter(|key| !key.is_empty())
}

fn public_url(base: &str, key: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), key)
}

/// Keys are relative paths without `..`, so they cannot escape the store root.
fn validate_key(key: &str) -> Result<(), StorageError> {
    let path = Path::new(key);
    let ok = !key.is_empty() && path.components().all(|c| matches!(c, Component::Normal(_)));
    if ok {
        Ok(())
    } else {
        Err(StorageError::InvalidKey(key.to_string()))
    }
}

/// Filesystem-backed store; objects are served from `public_base_url`.
#[derive(Debug, Clone)]
pub struct LocalObjectStore {
    root: PathBuf,
    public_base_url: String,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>, public_base_url: &str) -> Self {
        Self { root: root.into(), public_base_url: public_base_url.to_string() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn put(&self, key: &str, _content_type: &str, bytes: Vec<u8>) -> Result<String, StorageError> {
        validate_key(key)?;
        let path = self.root.join(key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StorageError::Upload(e.to_string()))?;
        }
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| StorageError::Upload(e.to_string()))?;
        Ok(public_url(&self.public_base_url, key))
    }

    async fn delete(&self, url: &str) -> Result<(), StorageError> {
        let key = key_from_url(&self.public_base_url, url).ok_or_else(|| StorageError::Unmanaged(url.to_string()))?;
        validate_key(key)?;
        match tokio::fs::remove_file(self.root.join(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::Delete(e.to_string())),
        }
    }
}

/// Bucket reachable over plain HTTP PUT/DELETE.
#[derive(Debug, Clone)]
pub struct HttpObjectStore {
    client: reqwest::Client,
    bucket_url: String,
    public_base_url: String,
}

impl HttpObjectStore {
    pub fn new(bucket_url: impl Into<String>, public_base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            bucket_url: bucket_url.into(),
            public_base_url: public_base_url.to_string(),
        }
    }
}

#[async_trait]
impl ObjectStore for HttpObjectStore {
    async fn put(&self, key: &str, content_type: &str, bytes: Vec<u8>) -> Result<String, StorageError> {
        validate_key(key)?;
        let response = self
            .client
            .put(public_url(&self.bucket_url, key))
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await
            .map_err(|e| StorageError::Upload(e.to_string()))?;

        if !response.status().is_success() {
            return Err(StorageError::Upload(format!("bucket responded {}", response.status())));
        }
        Ok(public_url(&self.public_base_url, key))
    }

    async fn delete(&self, url: &str) -> Result<(), StorageError> {
        let key = key_from_url(&self.public_base_url, url).ok_or_else(|| StorageError::Unmanaged(url.to_string()))?;
        let response = self
            .client
            .delete(public_url(&self.bucket_url, key))
            .send()
            .await
            .map_err(|e| StorageError::Delete(e.to_string()))?;

        let status = response.status();
        if status.is_success() || status == reqwest::StatusCode::NOT_FOUND {
            Ok(())
        } else {
            Err(StorageError::Delete(format!("bucket responded {}", status)))
        }
    }
}
