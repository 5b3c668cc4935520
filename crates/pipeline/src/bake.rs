//! Element baking.
//!
//! Animated elements are rendered to looping GIFs and swapped into the
//! layout in place of their live markup. Planning fetches the source
//! images up front; rendering is synchronous and runs on a pooled surface
//! inside a blocking task; storage keys are content-addressed so repeated
//! exports of the same signature produce the same URLs.

use std::collections::BTreeMap;

use quick_xml::events::{BytesEnd, Event};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use sigcraft_core::animation::FrameConfig;
use sigcraft_core::signature::{AnimatedElement, ElementAnimation, SocialPlatform};
use tokio_util::sync::CancellationToken;

use crate::assets::{AssetError, AssetFetcher, RasterStore};
use crate::error::ExportError;
use crate::html::{self, is_void, Element, HtmlError};
use crate::raster::{
    encode_gif, parse_hex_color, render_frames, EmbeddedImage, FrameOrder, RasterError, RenderSurface, Sprite,
    SpriteShape,
};
use crate::templates::parts::{icon_url, ANIMATION_CLASS_PREFIX, ANIMATION_MARKER, ELEMENT_MARKER, PLATFORM_MARKER};
use crate::templates::{HeadshotShape, Layout, LayoutContext};

const GIF_CONTENT_TYPE: &str = "image/gif";

/// Corner radius of rounded-square portraits, matching the layout CSS.
const ROUNDED_RADIUS: u32 = 8;

/// How an animated social cluster is baked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SocialBakeMode {
    /// One raster per icon, each inside its original link.
    #[default]
    PerIcon,
    /// One raster for the whole cluster. Per-icon links are lost.
    Flatten,
}

impl SocialBakeMode {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "per-icon" | "per_icon" | "pericon" => Some(Self::PerIcon),
            "flatten" => Some(Self::Flatten),
            _ => None,
        }
    }
}

/// Key under which a raster URL is reported: `headshot`, `logo`,
/// `socialIcons` or `socialIcons.<platform>`.
pub fn raster_key(element: AnimatedElement, platform: Option<SocialPlatform>) -> String {
    match platform {
        Some(platform) => format!("{}.{}", element.key(), platform.name()),
        None => element.key().to_string(),
    }
}

/// `signatures/{id}/{key}-{sha256}.gif`
pub fn storage_key(signature_id: uuid::Uuid, key: &str, bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    format!("signatures/{signature_id}/{key}-{digest:x}.gif")
}

// ---------------------------------------------------------------------------
// Planning
// ---------------------------------------------------------------------------

/// One raster to render.
#[derive(Debug, Clone)]
pub(crate) struct BakeJob {
    pub key: String,
    pub animation: ElementAnimation,
    pub sprite: Sprite,
    pub backdrop: (u8, u8, u8),
}

async fn load_image(fetcher: &dyn AssetFetcher, element: &str, url: &str) -> Result<EmbeddedImage, ExportError> {
    let bytes = fetcher.fetch(url).await.map_err(|source| ExportError::AssetFetch {
        element: element.to_string(),
        source,
    })?;
    EmbeddedImage::from_bytes(&bytes).map_err(|e| ExportError::AssetFetch {
        element: element.to_string(),
        source: AssetError::Fetch {
            url: url.to_string(),
            reason: e.to_string(),
        },
    })
}

fn sprite_shape(shape: HeadshotShape) -> SpriteShape {
    match shape {
        HeadshotShape::Circle => SpriteShape::Circle,
        HeadshotShape::Angled => SpriteShape::Angled,
        HeadshotShape::RoundedSquare => SpriteShape::RoundedSquare { radius: ROUNDED_RADIUS },
    }
}

/// Work out which rasters an export needs and fetch their sources.
///
/// Animated elements that are absent from the layout (no image, no
/// social links) are skipped.
pub(crate) async fn plan(
    layout: Layout,
    ctx: &LayoutContext<'_>,
    fetcher: &dyn AssetFetcher,
    mode: SocialBakeMode,
) -> Result<Vec<BakeJob>, ExportError> {
    let geometry = layout.geometry();
    let mut jobs = Vec::new();

    for (element, animation) in ctx.animations.active() {
        let backdrop = parse_hex_color(geometry.backdrop(element));
        match element {
            AnimatedElement::Headshot => {
                let Some(url) = ctx.images.headshot.as_deref() else {
                    tracing::debug!(element = element.key(), "Animated element absent from layout, not baking");
                    continue;
                };
                let image = load_image(fetcher, element.key(), url).await?;
                jobs.push(BakeJob {
                    key: raster_key(element, None),
                    animation,
                    sprite: Sprite::Headshot {
                        image,
                        size: geometry.headshot_px(ctx.images.headshot_size),
                        shape: sprite_shape(geometry.headshot_shape),
                        glow: geometry.headshot_glow.then_some(geometry.palette.accent),
                    },
                    backdrop,
                });
            }
            AnimatedElement::Logo => {
                let Some(url) = ctx.images.logo.as_deref() else {
                    tracing::debug!(element = element.key(), "Animated element absent from layout, not baking");
                    continue;
                };
                let image = load_image(fetcher, element.key(), url).await?;
                jobs.push(BakeJob {
                    key: raster_key(element, None),
                    animation,
                    sprite: Sprite::logo(
                        image,
                        geometry.logo_px(ctx.images.logo_size),
                        geometry.logo_max_width,
                    ),
                    backdrop,
                });
            }
            AnimatedElement::SocialIcons => {
                let present = ctx.social.present_in(&geometry.social_order);
                if present.is_empty() {
                    tracing::debug!(element = element.key(), "Animated element absent from layout, not baking");
                    continue;
                }
                let mut icons = Vec::with_capacity(present.len());
                for (platform, _) in &present {
                    let url = icon_url(ctx.icon_base_url, geometry.icon_variant, *platform);
                    icons.push((*platform, load_image(fetcher, element.key(), &url).await?));
                }
                match mode {
                    SocialBakeMode::PerIcon => {
                        for (platform, image) in icons {
                            jobs.push(BakeJob {
                                key: raster_key(element, Some(platform)),
                                animation,
                                sprite: Sprite::Icon {
                                    image,
                                    size: geometry.icon_size,
                                },
                                backdrop,
                            });
                        }
                    }
                    SocialBakeMode::Flatten => {
                        tracing::info!("Flattening social icons into one raster; per-icon links are dropped");
                        jobs.push(BakeJob {
                            key: raster_key(element, None),
                            animation,
                            sprite: Sprite::IconStrip {
                                icons: icons.into_iter().map(|(_, image)| image).collect(),
                                size: geometry.icon_size,
                                gap: geometry.icon_gap,
                                vertical: geometry.social_vertical,
                            },
                            backdrop,
                        });
                    }
                }
            }
        }
    }

    Ok(jobs)
}

// ---------------------------------------------------------------------------
// Rendering and storage
// ---------------------------------------------------------------------------

/// An encoded GIF waiting to be stored.
#[derive(Debug, Clone)]
pub(crate) struct RenderedRaster {
    pub key: String,
    pub width: u32,
    pub height: u32,
    pub bytes: Vec<u8>,
}

/// Render and encode every job on one surface, in order. Runs on a
/// blocking thread. The failing job's key is returned with the error.
pub(crate) fn render_jobs(
    surface: &mut RenderSurface,
    jobs: &[BakeJob],
    frames: FrameConfig,
    order: FrameOrder,
    cancel: &CancellationToken,
) -> Result<Vec<RenderedRaster>, (String, RasterError)> {
    let mut rendered = Vec::with_capacity(jobs.len());
    for job in jobs {
        let captured = render_frames(surface, &job.sprite, job.animation, frames, job.backdrop, cancel)
            .map_err(|e| (job.key.clone(), e))?;
        let bytes = encode_gif(captured, frames.frame_delay_ms, order).map_err(|e| (job.key.clone(), e))?;
        let (width, height) = job.sprite.dimensions();
        rendered.push(RenderedRaster {
            key: job.key.clone(),
            width,
            height,
            bytes,
        });
    }
    Ok(rendered)
}

/// A stored raster ready for substitution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BakedRaster {
    pub url: String,
    pub width: u32,
    pub height: u32,
}

/// Stored rasters for one export, by raster key.
#[derive(Debug, Clone, Default)]
pub struct BakedElements {
    mode: SocialBakeMode,
    rasters: BTreeMap<String, BakedRaster>,
}

impl BakedElements {
    pub fn new(mode: SocialBakeMode) -> Self {
        Self {
            mode,
            rasters: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, key: impl Into<String>, raster: BakedRaster) {
        self.rasters.insert(key.into(), raster);
    }

    pub fn get(&self, key: &str) -> Option<&BakedRaster> {
        self.rasters.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.rasters.is_empty()
    }

    /// Raster key to public URL.
    pub fn urls(&self) -> BTreeMap<String, String> {
        self.rasters
            .iter()
            .map(|(key, raster)| (key.clone(), raster.url.clone()))
            .collect()
    }

    fn target(&self, element_key: &str) -> Option<Target<'_>> {
        match AnimatedElement::from_key(element_key)? {
            AnimatedElement::SocialIcons => match self.mode {
                SocialBakeMode::Flatten => self.get(element_key).map(Target::Replace),
                SocialBakeMode::PerIcon => {
                    let prefix = format!("{element_key}.");
                    self.rasters
                        .keys()
                        .any(|key| key.starts_with(&prefix))
                        .then_some(Target::Icons)
                }
            },
            element => self.get(element.key()).map(Target::Replace),
        }
    }

    fn icon(&self, platform: &str) -> Option<&BakedRaster> {
        self.get(&format!("{}.{platform}", AnimatedElement::SocialIcons.key()))
    }
}

/// Store every rendered raster under its content-addressed key.
pub(crate) async fn store(
    signature_id: uuid::Uuid,
    rendered: Vec<RenderedRaster>,
    store: &dyn RasterStore,
    mode: SocialBakeMode,
) -> Result<BakedElements, ExportError> {
    let mut baked = BakedElements::new(mode);
    for raster in rendered {
        let object_key = storage_key(signature_id, &raster.key, &raster.bytes);
        let size = raster.bytes.len();
        let url = store
            .put(&object_key, raster.bytes, GIF_CONTENT_TYPE)
            .await
            .map_err(ExportError::Storage)?;
        tracing::info!(
            signature_id = %signature_id,
            element = %raster.key,
            bytes = size,
            url = %url,
            "Animated element baked",
        );
        baked.insert(
            raster.key,
            BakedRaster {
                url,
                width: raster.width,
                height: raster.height,
            },
        );
    }
    Ok(baked)
}

// ---------------------------------------------------------------------------
// Substitution
// ---------------------------------------------------------------------------

enum Target<'a> {
    /// Replace the container's content with one raster.
    Replace(&'a BakedRaster),
    /// Swap each icon image for its own raster, keeping the links.
    Icons,
}

fn raster_img(raster: &BakedRaster, alt: &str) -> Element {
    let mut img = Element::new("img");
    img.set_attr("src", raster.url.as_str());
    img.set_attr("alt", alt);
    img.set_attr("width", raster.width.to_string());
    img.set_attr("height", raster.height.to_string());
    img.set_attr("border", "0");
    img.set_attr(
        "style",
        format!("display: block; width: {}px; height: {}px", raster.width, raster.height),
    );
    img
}

/// What a replaced container held that the raster must keep.
#[derive(Default)]
struct Inner {
    link: Option<Element>,
    alt: Option<String>,
}

/// Consume events up to the end tag closing the current container.
fn read_inner(reader: &mut quick_xml::Reader<&[u8]>) -> Result<Inner, HtmlError> {
    let mut inner = Inner::default();
    let mut depth = 0usize;
    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let element = Element::from_start(&e);
                if !is_void(&element.name) {
                    depth += 1;
                }
                inner.observe(element);
            }
            Event::Empty(e) => inner.observe(Element::from_start(&e)),
            Event::End(_) => {
                if depth == 0 {
                    return Ok(inner);
                }
                depth -= 1;
            }
            Event::Eof => return Ok(inner),
            _ => {}
        }
    }
}

impl Inner {
    fn observe(&mut self, element: Element) {
        match element.name.as_str() {
            "a" if self.link.is_none() && element.has_attr("href") => self.link = Some(element),
            "img" if self.alt.is_none() => self.alt = element.attr("alt").map(str::to_string),
            _ => {}
        }
    }
}

fn write_replacement(
    writer: &mut html::HtmlWriter,
    container: &str,
    raster: &BakedRaster,
    inner: &Inner,
) -> Result<(), HtmlError> {
    let wrap_row = container == "table";
    if wrap_row {
        writer.write_event(Event::Start(Element::new("tr").to_start()))?;
        writer.write_event(Event::Start(Element::new("td").to_start()))?;
    }

    let img = raster_img(raster, inner.alt.as_deref().unwrap_or_default());
    match (&inner.link, wrap_row) {
        // A flattened cluster has no single link to keep.
        (Some(link), false) => {
            let mut anchor = Element::new("a");
            if let Some(href) = link.attr("href") {
                anchor.set_attr("href", href);
            }
            anchor.set_attr("target", link.attr("target").unwrap_or("_blank"));
            writer.write_event(Event::Start(anchor.to_start()))?;
            writer.write_event(Event::Empty(img.to_start()))?;
            writer.write_event(Event::End(BytesEnd::new("a")))?;
        }
        _ => writer.write_event(Event::Empty(img.to_start()))?,
    }

    if wrap_row {
        writer.write_event(Event::End(BytesEnd::new("td")))?;
        writer.write_event(Event::End(BytesEnd::new("tr")))?;
    }
    Ok(())
}

/// Swap marked elements for their baked rasters.
pub fn substitute(document: &str, baked: &BakedElements) -> Result<String, HtmlError> {
    let mut reader = html::reader(document);
    let mut writer = html::writer(document.len());
    // Open-element depth inside a per-icon social container.
    let mut icons_depth: Option<usize> = None;
    let mut platform: Option<String> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let element = Element::from_start(&e);
                let target = element.attr(ELEMENT_MARKER).and_then(|key| baked.target(key));
                match target {
                    Some(Target::Replace(raster)) => {
                        writer.write_event(Event::Start(e.borrow()))?;
                        let inner = read_inner(&mut reader)?;
                        write_replacement(&mut writer, &element.name, raster, &inner)?;
                        writer.write_event(Event::End(BytesEnd::new(element.name.clone())))?;
                        continue;
                    }
                    Some(Target::Icons) => icons_depth = Some(0),
                    None => {}
                }

                if let Some(depth) = icons_depth.as_mut() {
                    if !is_void(&element.name) {
                        *depth += 1;
                    }
                    if element.name == "a" {
                        platform = element.attr(PLATFORM_MARKER).map(str::to_string);
                    }
                    if element.name == "img" {
                        if let Some(img) = icon_swap(&element, platform.as_deref(), baked) {
                            writer.write_event(Event::Start(img.to_start()))?;
                            continue;
                        }
                    }
                }
                writer.write_event(Event::Start(e))?;
            }
            Event::Empty(e) => {
                if icons_depth.is_some() {
                    let element = Element::from_start(&e);
                    if element.name == "img" {
                        if let Some(img) = icon_swap(&element, platform.as_deref(), baked) {
                            writer.write_event(Event::Empty(img.to_start()))?;
                            continue;
                        }
                    }
                }
                writer.write_event(Event::Empty(e))?;
            }
            Event::End(e) => {
                if let Some(depth) = icons_depth.as_mut() {
                    let name = String::from_utf8_lossy(e.name().as_ref()).to_ascii_lowercase();
                    if name == "a" {
                        platform = None;
                    }
                    if !is_void(&name) {
                        *depth = depth.saturating_sub(1);
                        if *depth == 0 {
                            icons_depth = None;
                        }
                    }
                }
                writer.write_event(Event::End(e))?;
            }
            Event::Eof => break,
            event => writer.write_event(event)?,
        }
    }

    html::finish(writer)
}

fn icon_swap(img: &Element, platform: Option<&str>, baked: &BakedElements) -> Option<Element> {
    let raster = baked.icon(platform?)?;
    let mut swapped = img.clone();
    swapped.set_attr("src", raster.url.as_str());
    swapped.set_attr("width", raster.width.to_string());
    swapped.set_attr("height", raster.height.to_string());
    swapped.set_attr("border", "0");
    Some(swapped)
}

// ---------------------------------------------------------------------------
// Marker stripping
// ---------------------------------------------------------------------------

fn strip_element(element: &mut Element) -> bool {
    let mut changed = false;
    for marker in [ELEMENT_MARKER, ANIMATION_MARKER, PLATFORM_MARKER] {
        changed |= element.remove_attr(marker).is_some();
    }
    if element.classes().any(|c| c.starts_with(ANIMATION_CLASS_PREFIX)) {
        let kept: Vec<&str> = element
            .classes()
            .filter(|c| !c.starts_with(ANIMATION_CLASS_PREFIX))
            .collect();
        let kept = kept.join(" ");
        if kept.is_empty() {
            element.remove_attr("class");
        } else {
            element.set_attr("class", kept);
        }
        changed = true;
    }
    changed
}

/// Remove every animation marker attribute and animation hook class.
pub fn strip_markers(document: &str) -> Result<String, HtmlError> {
    let mut reader = html::reader(document);
    let mut writer = html::writer(document.len());

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let mut element = Element::from_start(&e);
                if strip_element(&mut element) {
                    writer.write_event(Event::Start(element.to_start()))?;
                } else {
                    writer.write_event(Event::Start(e))?;
                }
            }
            Event::Empty(e) => {
                let mut element = Element::from_start(&e);
                if strip_element(&mut element) {
                    writer.write_event(Event::Empty(element.to_start()))?;
                } else {
                    writer.write_event(Event::Empty(e))?;
                }
            }
            Event::Eof => break,
            event => writer.write_event(event)?,
        }
    }

    html::finish(writer)
}
