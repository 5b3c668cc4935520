//! Export orchestration.
//!
//! [`Exporter`] owns the shared resources an export needs (surface pool,
//! asset fetcher, raster store) and runs one request-scoped pipeline per
//! call:
//!
//! - static: layout -> inline -> extract -> validate
//! - animated: layout -> bake -> substitute -> inline -> extract -> validate
//! - markup: MJML build -> compile -> extract -> validate
//!
//! Any stage failure aborts the export with an [`ExportError`]; callers
//! never see partial HTML. Compatibility issues are advisory and returned
//! alongside the HTML.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use sigcraft_core::animation::FrameConfig;
use sigcraft_core::images::{resolve_images, ResolvedImages};
use sigcraft_core::signature::Signature;
use tokio_util::sync::CancellationToken;

use crate::assets::{AssetFetcher, RasterStore};
use crate::bake::{self, BakedElements, SocialBakeMode};
use crate::error::ExportError;
use crate::inline::inline_css;
use crate::markup::{build_mjml, compile_mjml};
use crate::raster::{FrameOrder, SurfacePool};
use crate::table::{self, TableError, ValidationReport};
use crate::templates::{Layout, LayoutContext, RenderMode};

/// Default upper bound on the baking phase.
pub const DEFAULT_EXPORT_TIMEOUT: Duration = Duration::from_secs(30);

/// Mail client the export is tuned for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EmailClient {
    #[default]
    Gmail,
    Outlook,
    #[serde(alias = "apple", alias = "applemail")]
    AppleMail,
}

impl EmailClient {
    pub fn name(self) -> &'static str {
        match self {
            Self::Gmail => "gmail",
            Self::Outlook => "outlook",
            Self::AppleMail => "apple-mail",
        }
    }

    /// Outlook only ever shows the first GIF frame.
    pub fn frame_order(self) -> FrameOrder {
        match self {
            Self::Outlook => FrameOrder::SettledFirst,
            Self::Gmail | Self::AppleMail => FrameOrder::Natural,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// Base that relative image references resolve against.
    pub base_url: String,
    /// Base of the static social icon sets.
    pub icon_base_url: String,
    pub frames: FrameConfig,
    /// Upper bound on the baking phase of one export.
    pub timeout: Duration,
    pub social_mode: SocialBakeMode,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            icon_base_url: "http://localhost:3000/icons".to_string(),
            frames: FrameConfig::default(),
            timeout: DEFAULT_EXPORT_TIMEOUT,
            social_mode: SocialBakeMode::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportStrategy {
    Static,
    Animated,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportOutput {
    pub html: String,
    /// Raster key (`headshot`, `socialIcons.linkedin`, ...) to URL.
    pub raster_urls: BTreeMap<String, String>,
    pub validation: ValidationReport,
    pub strategy: ExportStrategy,
}

#[derive(Debug, Clone, Serialize)]
pub struct InlineExport {
    pub html: String,
    pub validation: ValidationReport,
}

#[derive(Debug, Clone, Serialize)]
pub struct MarkupExport {
    pub html: String,
    pub mjml: String,
    pub validation: ValidationReport,
}

pub struct Exporter {
    config: ExportConfig,
    pool: Arc<SurfacePool>,
    fetcher: Arc<dyn AssetFetcher>,
    store: Arc<dyn RasterStore>,
}

impl Exporter {
    pub fn new(
        config: ExportConfig,
        pool: Arc<SurfacePool>,
        fetcher: Arc<dyn AssetFetcher>,
        store: Arc<dyn RasterStore>,
    ) -> Self {
        Self {
            config,
            pool,
            fetcher,
            store,
        }
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    pub fn pool(&self) -> &Arc<SurfacePool> {
        &self.pool
    }

    fn resolve_images(&self, signature: &Signature) -> ResolvedImages {
        let resolution = resolve_images(&signature.images, &self.config.base_url);
        for field in &resolution.unresolved {
            tracing::warn!(
                signature_id = %signature.id,
                field,
                "Image reference could not be resolved, omitting it",
            );
        }
        resolution.images
    }

    /// Raw layout HTML for the live preview, keyframes included.
    pub fn preview(&self, signature: &Signature) -> String {
        let layout = Layout::for_signature(signature);
        let images = self.resolve_images(signature);
        let ctx = LayoutContext::new(signature, &images, &self.config.icon_base_url, RenderMode::Preview);
        layout.render(&ctx)
    }

    /// Export for `client`, baking animated elements when any are active.
    pub async fn export(&self, signature: &Signature, client: EmailClient) -> Result<ExportOutput, ExportError> {
        signature.ensure_complete()?;
        let layout = Layout::for_signature(signature);
        let images = self.resolve_images(signature);
        let ctx = LayoutContext::new(signature, &images, &self.config.icon_base_url, RenderMode::Export);

        if signature.tag_is_stale() {
            tracing::debug!(
                signature_id = %signature.id,
                tag = signature.tag.name(),
                "Stored tag disagrees with element animations, using animations",
            );
        }

        let mut document = layout.render(&ctx);
        let mut raster_urls = BTreeMap::new();
        let strategy = if signature.has_active_animation() {
            let baked = self.bake(signature, layout, &ctx, client).await?;
            if baked.is_empty() {
                tracing::info!(signature_id = %signature.id, "No animated element present in layout");
            } else {
                document = bake::substitute(&document, &baked).map_err(ExportError::Html)?;
                raster_urls = baked.urls();
            }
            ExportStrategy::Animated
        } else {
            ExportStrategy::Static
        };

        let html = finish(signature, layout, &document)?;
        let validation = table::validate(&html);
        tracing::info!(
            signature_id = %signature.id,
            layout = layout.name(),
            client = client.name(),
            strategy = ?strategy,
            rasters = raster_urls.len(),
            valid = validation.valid,
            "Signature exported",
        );

        Ok(ExportOutput {
            html,
            raster_urls,
            validation,
            strategy,
        })
    }

    /// Maximum-compatibility export: always static, animations ignored.
    pub fn export_inline(&self, signature: &Signature) -> Result<InlineExport, ExportError> {
        signature.ensure_complete()?;
        let layout = Layout::for_signature(signature);
        let images = self.resolve_images(signature);
        let ctx = LayoutContext::new(signature, &images, &self.config.icon_base_url, RenderMode::Export);

        let html = finish(signature, layout, &layout.render(&ctx))?;
        let validation = table::validate(&html);
        if !validation.valid {
            tracing::warn!(
                signature_id = %signature.id,
                layout = layout.name(),
                issues = validation.issues.len(),
                "Inline export has compatibility issues",
            );
        }
        Ok(InlineExport { html, validation })
    }

    /// Export through the MJML builder and compiler.
    pub fn export_markup(&self, signature: &Signature) -> Result<MarkupExport, ExportError> {
        signature.ensure_complete()?;
        let layout = Layout::for_signature(signature);
        let images = self.resolve_images(signature);
        let ctx = LayoutContext::new(signature, &images, &self.config.icon_base_url, RenderMode::Export);

        let mjml = build_mjml(layout, &ctx);
        let html = bake::strip_markers(&compile_mjml(&mjml)?).map_err(ExportError::Html)?;
        let table = extract(signature, layout, &html)?;
        let validation = table::validate(&table);
        Ok(MarkupExport { html, mjml, validation })
    }

    /// Bake every present animated element, bounded by the export
    /// timeout. On expiry the render loop is cancelled at its next frame
    /// boundary, which releases the surface.
    async fn bake(
        &self,
        signature: &Signature,
        layout: Layout,
        ctx: &LayoutContext<'_>,
        client: EmailClient,
    ) -> Result<BakedElements, ExportError> {
        let timeout = self.config.timeout;
        let cancel = CancellationToken::new();
        let work = self.bake_within(signature, layout, ctx, client, cancel.clone());

        match tokio::time::timeout(timeout, work).await {
            Ok(result) => result,
            Err(_) => {
                cancel.cancel();
                tracing::warn!(
                    signature_id = %signature.id,
                    timeout_ms = timeout.as_millis() as u64,
                    "Baking timed out",
                );
                Err(ExportError::Timeout(timeout))
            }
        }
    }

    async fn bake_within(
        &self,
        signature: &Signature,
        layout: Layout,
        ctx: &LayoutContext<'_>,
        client: EmailClient,
        cancel: CancellationToken,
    ) -> Result<BakedElements, ExportError> {
        let mode = self.config.social_mode;
        let jobs = bake::plan(layout, ctx, self.fetcher.as_ref(), mode).await?;
        if jobs.is_empty() {
            return Ok(BakedElements::new(mode));
        }

        let timeout = self.config.timeout;
        let frames = self.config.frames;
        let order = client.frame_order();
        let guard = self
            .pool
            .acquire()
            .await
            .map_err(|e| ExportError::from_raster("surface", e, timeout))?;

        let rendered = tokio::task::spawn_blocking(move || {
            let mut guard = guard;
            bake::render_jobs(&mut guard, &jobs, frames, order, &cancel)
        })
        .await
        .map_err(|e| ExportError::RenderingSurface(format!("render task failed: {e}")))?
        .map_err(|(key, e)| ExportError::from_raster(&key, e, timeout))?;

        bake::store(signature.id, rendered, self.store.as_ref(), mode).await
    }
}

fn extract(signature: &Signature, layout: Layout, document: &str) -> Result<String, ExportError> {
    table::extract(document).map_err(|e| match e {
        TableError::TopLevelCount { found } => {
            tracing::error!(
                signature_id = %signature.id,
                template = layout.name(),
                found,
                "Layout did not produce exactly one top-level table",
            );
            ExportError::TableExtraction {
                template: layout.name(),
                signature_id: signature.id,
                found,
            }
        }
        TableError::Html(e) => ExportError::Html(e),
    })
}

/// Strip markers, inline styles and reduce to the root table.
fn finish(signature: &Signature, layout: Layout, document: &str) -> Result<String, ExportError> {
    let stripped = bake::strip_markers(document).map_err(ExportError::Html)?;
    let inlined = inline_css(&stripped).map_err(ExportError::Inline)?;
    extract(signature, layout, &inlined)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_client_wire_names() {
        let client: EmailClient = serde_json::from_str("\"apple-mail\"").unwrap();
        assert_eq!(client, EmailClient::AppleMail);
        let client: EmailClient = serde_json::from_str("\"outlook\"").unwrap();
        assert_eq!(client.frame_order(), FrameOrder::SettledFirst);
        assert_eq!(EmailClient::default().frame_order(), FrameOrder::Natural);
    }
}
