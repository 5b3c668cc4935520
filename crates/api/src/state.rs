use std::sync::Arc;

use sigcraft_pipeline::Exporter;

use crate::config::ServerConfig;
use crate::store::SignatureStore;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn SignatureStore>,
    /// Export pipeline with its surface pool, fetcher and raster store.
    pub exporter: Arc<Exporter>,
    pub config: Arc<ServerConfig>,
}
