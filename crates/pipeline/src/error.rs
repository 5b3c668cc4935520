use std::time::Duration;

use sigcraft_core::error::CoreError;

use crate::assets::AssetError;
use crate::html::HtmlError;
use crate::markup::MarkupError;
use crate::raster::RasterError;

/// Every way an export can fail. No variant ever carries partial HTML.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("CSS inlining failed: {0}")]
    Inline(#[source] HtmlError),

    #[error(
        "Template '{template}' for signature {signature_id} produced {found} top-level tables, expected 1"
    )]
    TableExtraction {
        template: &'static str,
        signature_id: uuid::Uuid,
        found: usize,
    },

    #[error("Markup rewrite failed: {0}")]
    Html(#[source] HtmlError),

    #[error(transparent)]
    Markup(#[from] MarkupError),

    #[error("Rendering surface error: {0}")]
    RenderingSurface(String),

    #[error("Failed to fetch asset for {element}: {source}")]
    AssetFetch {
        element: String,
        #[source]
        source: AssetError,
    },

    #[error("Failed to encode {element}: {reason}")]
    Encoding { element: String, reason: String },

    #[error("Failed to store raster: {0}")]
    Storage(#[source] AssetError),

    #[error("Export did not finish within {}ms", .0.as_millis())]
    Timeout(Duration),
}

impl ExportError {
    /// Pipeline stage the failure happened in, reported alongside errors.
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Core(CoreError::MissingRequiredField { .. }) => "validate",
            Self::Core(_) => "prepare",
            Self::Inline(_) => "inline",
            Self::TableExtraction { .. } => "extract",
            Self::Html(_) => "substitute",
            Self::Markup(_) => "markup",
            Self::RenderingSurface(_) => "render",
            Self::AssetFetch { .. } => "fetch",
            Self::Encoding { .. } => "encode",
            Self::Storage(_) => "store",
            Self::Timeout(_) => "bake",
        }
    }

    /// Map a raster failure for `element` onto the export taxonomy.
    pub(crate) fn from_raster(element: &str, err: RasterError, timeout: Duration) -> Self {
        match err {
            RasterError::SurfaceUnavailable(reason) => Self::RenderingSurface(reason),
            RasterError::Allocation { .. } | RasterError::Svg(_) => Self::RenderingSurface(err.to_string()),
            RasterError::Image(e) => Self::Encoding {
                element: element.to_string(),
                reason: e.to_string(),
            },
            RasterError::Cancelled { .. } => Self::Timeout(timeout),
        }
    }
}
