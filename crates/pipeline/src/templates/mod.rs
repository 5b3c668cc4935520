//! Layout generators.
//!
//! Each layout turns a [`LayoutContext`] into a complete HTML document
//! whose body is a single `sig-root` table. Styling lives in a `<style>`
//! block keyed by `sig-*` classes; the inliner moves it onto elements
//! before export. Animatable elements carry `data-element` markers (and
//! `data-animation` when active) so baking can find and replace them.

mod classic;
mod minimal;
mod modern;
pub(crate) mod parts;
mod sales_professional;

pub use minimal::WIDTH as MINIMAL_WIDTH;
pub use parts::icon_url;
pub use sales_professional::SIDEBAR_WIDTH;

use sigcraft_core::images::ResolvedImages;
use sigcraft_core::signature::{
    AnimatedElement, ElementAnimations, ElementPositions, PersonalInfo, Signature, SocialMedia, SocialPlatform,
    TemplateId,
};

/// Base size scaled by a clamped percentage.
pub fn scaled_px(base: u32, percent: u32) -> u32 {
    let percent = sigcraft_core::signature::clamp_image_size(percent);
    ((base * percent) as f32 / 100.0).round() as u32
}

// ---------------------------------------------------------------------------
// Layout selection
// ---------------------------------------------------------------------------

/// A concrete layout. Several template ids share the default layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    SalesProfessional,
    Modern,
    Minimal,
    Default,
}

impl Layout {
    pub fn for_template(template: TemplateId) -> Self {
        match template {
            TemplateId::SalesProfessional => Self::SalesProfessional,
            TemplateId::Modern => Self::Modern,
            TemplateId::Minimal => Self::Minimal,
            TemplateId::Professional | TemplateId::Creative => Self::Default,
        }
    }

    /// Layout for a stored record. Unknown template ids fall back to the
    /// default layout with a warning rather than failing the export.
    pub fn for_signature(signature: &Signature) -> Self {
        match signature.template() {
            Ok(template) => Self::for_template(template),
            Err(err) => {
                tracing::warn!(
                    signature_id = %signature.id,
                    template = %signature.template_id,
                    error = %err,
                    "Unknown template, falling back to default layout",
                );
                Self::Default
            }
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::SalesProfessional => "sales-professional",
            Self::Modern => "modern",
            Self::Minimal => "minimal",
            Self::Default => "default",
        }
    }

    pub fn geometry(self) -> &'static Geometry {
        match self {
            Self::SalesProfessional => &sales_professional::GEOMETRY,
            Self::Modern => &modern::GEOMETRY,
            Self::Minimal => &minimal::GEOMETRY,
            Self::Default => &classic::GEOMETRY,
        }
    }

    /// Render the full HTML document for this layout.
    pub fn render(self, ctx: &LayoutContext<'_>) -> String {
        let geometry = self.geometry();
        let (css, body) = match self {
            Self::SalesProfessional => (
                sales_professional::CSS,
                sales_professional::body(ctx, geometry),
            ),
            Self::Modern => (modern::CSS, modern::body(ctx, geometry)),
            Self::Minimal => (minimal::CSS, minimal::body(ctx, geometry)),
            Self::Default => (classic::CSS, classic::body(ctx, geometry)),
        };
        parts::document(css, &body, ctx.mode)
    }
}

// ---------------------------------------------------------------------------
// Geometry
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadshotShape {
    Circle,
    /// Rectangle with the left edge cut on a diagonal.
    Angled,
    RoundedSquare,
}

impl HeadshotShape {
    /// CSS used in the browser preview and static export. Angled needs
    /// `clip-path`, which email clients ignore; baking draws the shape
    /// into the raster instead.
    pub fn css(self) -> &'static str {
        match self {
            Self::Circle => "border-radius: 50%",
            Self::Angled => "clip-path: polygon(22% 0, 100% 0, 100% 100%, 0 100%)",
            Self::RoundedSquare => "border-radius: 8px",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub background: &'static str,
    pub text: &'static str,
    pub muted: &'static str,
    pub accent: &'static str,
    pub divider: &'static str,
}

/// Shown in place of a missing company name (and, for minimal, a missing
/// logo).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placeholder {
    pub title: &'static str,
    pub subtitle: &'static str,
}

/// Fixed per-layout dimensions and colours. Shared by the HTML generator,
/// the MJML builder and the frame renderer so all three agree on sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    pub headshot_base: u32,
    pub logo_base: u32,
    pub logo_max_width: u32,
    pub headshot_shape: HeadshotShape,
    /// Adds a glow ring around the portrait.
    pub headshot_glow: bool,
    pub icon_size: u32,
    pub icon_gap: u32,
    pub social_vertical: bool,
    pub social_order: [SocialPlatform; 5],
    /// Icon set under the icon base URL (`color` or `light`).
    pub icon_variant: &'static str,
    pub placeholder: Placeholder,
    pub palette: Palette,
    /// Solid colour behind each animatable element, used as the GIF
    /// backdrop so baked frames blend with the surrounding cell.
    pub headshot_backdrop: &'static str,
    pub logo_backdrop: &'static str,
    pub social_backdrop: &'static str,
}

impl Geometry {
    pub fn headshot_px(&self, percent: u32) -> u32 {
        scaled_px(self.headshot_base, percent)
    }

    pub fn logo_px(&self, percent: u32) -> u32 {
        scaled_px(self.logo_base, percent)
    }

    /// Backdrop behind a given animatable element.
    pub fn backdrop(&self, element: AnimatedElement) -> &'static str {
        match element {
            AnimatedElement::Headshot => self.headshot_backdrop,
            AnimatedElement::Logo => self.logo_backdrop,
            AnimatedElement::SocialIcons => self.social_backdrop,
        }
    }
}

/// Default social order for layouts that do not override it.
pub const DEFAULT_SOCIAL_ORDER: [SocialPlatform; 5] = SocialPlatform::ALL;

// ---------------------------------------------------------------------------
// Context
// ---------------------------------------------------------------------------

/// Whether the document is headed for a browser preview (keyframes and
/// animation classes kept) or for export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    Preview,
    Export,
}

/// Everything a layout reads. Images are already resolved and clamped.
#[derive(Debug, Clone, Copy)]
pub struct LayoutContext<'a> {
    pub info: &'a PersonalInfo,
    pub images: &'a ResolvedImages,
    pub social: &'a SocialMedia,
    pub positions: &'a ElementPositions,
    pub animations: &'a ElementAnimations,
    pub icon_base_url: &'a str,
    pub mode: RenderMode,
}

impl<'a> LayoutContext<'a> {
    pub fn new(
        signature: &'a Signature,
        images: &'a ResolvedImages,
        icon_base_url: &'a str,
        mode: RenderMode,
    ) -> Self {
        Self {
            info: &signature.personal_info,
            images,
            social: &signature.social_media,
            positions: &signature.element_positions,
            animations: &signature.element_animations,
            icon_base_url,
            mode,
        }
    }
}
