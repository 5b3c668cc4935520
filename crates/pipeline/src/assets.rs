//! Collaborator seams for network and storage I/O.
//!
//! The exporter fetches source images through an [`AssetFetcher`] and
//! stores finished rasters through a [`RasterStore`]. HTTP- and
//! disk-backed implementations live in the API crate; the in-memory ones
//! here serve tests and local tooling.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("Asset not found: {0}")]
    NotFound(String),

    #[error("Failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("Failed to store {key}: {reason}")]
    Store { key: String, reason: String },
}

/// Loads image bytes referenced by a resolved absolute URL.
#[async_trait]
pub trait AssetFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, AssetError>;
}

/// Persists a baked raster and returns the absolute URL it is served at.
#[async_trait]
pub trait RasterStore: Send + Sync {
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<String, AssetError>;
}

/// Fixed URL to bytes map.
#[derive(Debug, Default, Clone)]
pub struct MemoryAssets {
    assets: HashMap<String, Vec<u8>>,
}

impl MemoryAssets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, url: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.assets.insert(url.into(), bytes);
        self
    }

    pub fn insert(&mut self, url: impl Into<String>, bytes: Vec<u8>) {
        self.assets.insert(url.into(), bytes);
    }
}

#[async_trait]
impl AssetFetcher for MemoryAssets {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, AssetError> {
        self.assets
            .get(url)
            .cloned()
            .ok_or_else(|| AssetError::NotFound(url.to_string()))
    }
}

/// A stored raster held in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredRaster {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// Keeps every stored raster in memory and serves them under `base_url`.
#[derive(Debug, Clone)]
pub struct MemoryRasterStore {
    base_url: String,
    objects: Arc<Mutex<HashMap<String, StoredRaster>>>,
}

impl MemoryRasterStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            objects: Arc::default(),
        }
    }

    pub fn get(&self, key: &str) -> Option<StoredRaster> {
        self.objects.lock().ok()?.get(key).cloned()
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .objects
            .lock()
            .map(|objects| objects.keys().cloned().collect())
            .unwrap_or_default();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.objects.lock().map(|objects| objects.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl RasterStore for MemoryRasterStore {
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<String, AssetError> {
        let mut objects = self.objects.lock().map_err(|e| AssetError::Store {
            key: key.to_string(),
            reason: e.to_string(),
        })?;
        objects.insert(
            key.to_string(),
            StoredRaster {
                bytes,
                content_type: content_type.to_string(),
            },
        );
        Ok(format!("{}/{key}", self.base_url))
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[tokio::test]
    async fn memory_assets_serve_known_urls_only() {
        let assets = MemoryAssets::new().with("https://a.test/x.png", vec![1, 2, 3]);
        assert_eq!(assets.fetch("https://a.test/x.png").await.unwrap(), vec![1, 2, 3]);
        assert_matches!(assets.fetch("https://a.test/y.png").await, Err(AssetError::NotFound(_)));
    }

    #[tokio::test]
    async fn memory_store_returns_public_url() {
        let store = MemoryRasterStore::new("https://cdn.test/generated/");
        let url = store.put("signatures/1/logo-ab.gif", vec![9], "image/gif").await.unwrap();
        assert_eq!(url, "https://cdn.test/generated/signatures/1/logo-ab.gif");
        assert_eq!(store.get("signatures/1/logo-ab.gif").unwrap().content_type, "image/gif");
        assert_eq!(store.len(), 1);
    }
}
