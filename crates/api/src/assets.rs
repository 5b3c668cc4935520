//! Network and disk implementations of the pipeline's asset seams.

use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use sigcraft_pipeline::assets::{AssetError, AssetFetcher, RasterStore};

/// Largest source image accepted for baking.
pub const MAX_ASSET_BYTES: usize = 10 * 1024 * 1024;

/// Fetches source images over HTTP(S). `data:` URIs are decoded in place.
#[derive(Debug, Clone)]
pub struct HttpAssetFetcher {
    client: reqwest::Client,
}

impl HttpAssetFetcher {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

fn fetch_error(url: &str, reason: impl ToString) -> AssetError {
    AssetError::Fetch {
        url: url.to_string(),
        reason: reason.to_string(),
    }
}

/// Decode a base64 `data:` URI.
fn decode_data_uri(uri: &str) -> Result<Vec<u8>, AssetError> {
    let (meta, payload) = uri
        .strip_prefix("data:")
        .and_then(|rest| rest.split_once(','))
        .ok_or_else(|| fetch_error("data URI", "malformed data URI"))?;
    if !meta.ends_with(";base64") {
        return Err(fetch_error("data URI", "only base64 data URIs are supported"));
    }
    STANDARD
        .decode(payload.trim())
        .map_err(|e| fetch_error("data URI", e))
}

#[async_trait]
impl AssetFetcher for HttpAssetFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, AssetError> {
        if url.starts_with("data:") {
            return decode_data_uri(url);
        }

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| fetch_error(url, e))?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(AssetError::NotFound(url.to_string()));
        }
        let response = response.error_for_status().map_err(|e| fetch_error(url, e))?;
        if response
            .content_length()
            .is_some_and(|len| len as usize > MAX_ASSET_BYTES)
        {
            return Err(fetch_error(url, "asset exceeds size limit"));
        }

        let bytes = response.bytes().await.map_err(|e| fetch_error(url, e))?;
        if bytes.len() > MAX_ASSET_BYTES {
            return Err(fetch_error(url, "asset exceeds size limit"));
        }
        tracing::debug!(url, bytes = bytes.len(), "Fetched asset");
        Ok(bytes.to_vec())
    }
}

/// Writes rasters under a local directory that the server exposes at
/// `base_url`.
#[derive(Debug, Clone)]
pub struct LocalRasterStore {
    root: PathBuf,
    base_url: String,
}

impl LocalRasterStore {
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve `key` below the root, rejecting anything that would escape it.
    fn path_for(&self, key: &str) -> Result<PathBuf, AssetError> {
        let relative = Path::new(key);
        let safe = !key.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !safe {
            return Err(AssetError::Store {
                key: key.to_string(),
                reason: "key must be a relative path without '..'".into(),
            });
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl RasterStore for LocalRasterStore {
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<String, AssetError> {
        let path = self.path_for(key)?;
        let store_error = |e: std::io::Error| AssetError::Store {
            key: key.to_string(),
            reason: e.to_string(),
        };

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(store_error)?;
        }
        tokio::fs::write(&path, &bytes).await.map_err(store_error)?;
        tracing::debug!(key, content_type, bytes = bytes.len(), "Stored raster");
        Ok(format!("{}/{key}", self.base_url))
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn decodes_base64_data_uris() {
        let bytes = decode_data_uri("data:image/png;base64,AQID").unwrap();
        assert_eq!(bytes, vec![1, 2, 3]);
        assert_matches!(decode_data_uri("data:text/plain,hello"), Err(AssetError::Fetch { .. }));
        assert_matches!(decode_data_uri("data:nocomma"), Err(AssetError::Fetch { .. }));
    }

    #[tokio::test]
    async fn data_uris_skip_the_network() {
        let fetcher = HttpAssetFetcher::new(Duration::from_secs(1)).unwrap();
        let bytes = fetcher.fetch("data:image/gif;base64,R0lG").await.unwrap();
        assert_eq!(bytes, b"GIF");
    }

    #[tokio::test]
    async fn local_store_writes_under_root_and_returns_public_url() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalRasterStore::new(dir.path(), "https://sig.test/generated/");

        let url = store
            .put("signatures/abc/headshot-ff.gif", b"GIF89a".to_vec(), "image/gif")
            .await
            .unwrap();

        assert_eq!(url, "https://sig.test/generated/signatures/abc/headshot-ff.gif");
        let written = std::fs::read(dir.path().join("signatures/abc/headshot-ff.gif")).unwrap();
        assert_eq!(written, b"GIF89a");
    }

    #[tokio::test]
    async fn local_store_rejects_escaping_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalRasterStore::new(dir.path(), "https://sig.test/generated");
        for key in ["../outside.gif", "/etc/passwd", ""] {
            assert_matches!(
                store.put(key, vec![0], "image/gif").await,
                Err(AssetError::Store { .. }),
                "{key}"
            );
        }
    }
}
