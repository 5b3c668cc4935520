//! Standalone drawings of animatable elements.
//!
//! A [`Sprite`] knows its own pixel size and how to describe itself as an
//! SVG document for a given [`FrameState`]. Images are embedded as data
//! URIs so a frame never reaches the network.

use std::io::Cursor;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use image::{ImageFormat, ImageReader};
use sigcraft_core::animation::FrameState;

use super::RasterError;

/// Band width of the `test-sweep` highlight, as a fraction of the sprite.
const SWEEP_BAND: f32 = 0.4;

/// Glow ring stroke width in px.
const GLOW_STROKE: f32 = 3.0;

/// A decoded-enough image: its data URI and intrinsic size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedImage {
    pub data_uri: String,
    pub width: u32,
    pub height: u32,
}

impl EmbeddedImage {
    /// Sniff `bytes`, read the dimensions and build a data URI. PNG and
    /// JPEG are embedded as-is; anything else is re-encoded to PNG.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, RasterError> {
        let format = image::guess_format(bytes)?;
        let (width, height) = ImageReader::with_format(Cursor::new(bytes), format).into_dimensions()?;

        let (mime, payload) = match format {
            ImageFormat::Png => ("image/png", BASE64.encode(bytes)),
            ImageFormat::Jpeg => ("image/jpeg", BASE64.encode(bytes)),
            _ => {
                let decoded = image::load_from_memory_with_format(bytes, format)?;
                let mut png = Cursor::new(Vec::new());
                decoded.write_to(&mut png, ImageFormat::Png)?;
                ("image/png", BASE64.encode(png.into_inner()))
            }
        };

        Ok(Self {
            data_uri: format!("data:{mime};base64,{payload}"),
            width,
            height,
        })
    }
}

/// Outline a headshot is clipped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpriteShape {
    Circle,
    /// Left edge cut on a diagonal starting 22% in from the top-left.
    Angled,
    RoundedSquare { radius: u32 },
    Rectangle,
}

impl SpriteShape {
    fn clip_svg(self, width: f32, height: f32) -> String {
        match self {
            Self::Circle => {
                let r = width.min(height) / 2.0;
                format!("<circle cx=\"{:.2}\" cy=\"{:.2}\" r=\"{r:.2}\"/>", width / 2.0, height / 2.0)
            }
            Self::Angled => format!(
                "<polygon points=\"{:.2},0 {width:.2},0 {width:.2},{height:.2} 0,{height:.2}\"/>",
                width * 0.22
            ),
            Self::RoundedSquare { radius } => format!(
                "<rect x=\"0\" y=\"0\" width=\"{width:.2}\" height=\"{height:.2}\" rx=\"{radius}\" ry=\"{radius}\"/>"
            ),
            Self::Rectangle => format!("<rect x=\"0\" y=\"0\" width=\"{width:.2}\" height=\"{height:.2}\"/>"),
        }
    }
}

/// One element drawn in isolation.
#[derive(Debug, Clone)]
pub enum Sprite {
    Headshot {
        image: EmbeddedImage,
        size: u32,
        shape: SpriteShape,
        /// Ring colour drawn around circular portraits.
        glow: Option<&'static str>,
    },
    Logo {
        image: EmbeddedImage,
        width: u32,
        height: u32,
    },
    Icon {
        image: EmbeddedImage,
        size: u32,
    },
    /// Every social icon in one strip.
    IconStrip {
        icons: Vec<EmbeddedImage>,
        size: u32,
        gap: u32,
        vertical: bool,
    },
}

impl Sprite {
    /// Logo sized to `height`, keeping the aspect ratio and capped at
    /// `max_width`.
    pub fn logo(image: EmbeddedImage, height: u32, max_width: u32) -> Self {
        let aspect = if image.height == 0 {
            1.0
        } else {
            image.width as f32 / image.height as f32
        };
        let width = ((height as f32 * aspect).round() as u32).clamp(1, max_width.max(1));
        Self::Logo { image, width, height: height.max(1) }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            Self::Headshot { size, .. } | Self::Icon { size, .. } => (*size, *size),
            Self::Logo { width, height, .. } => (*width, *height),
            Self::IconStrip { icons, size, gap, vertical } => {
                let count = icons.len() as u32;
                let length = count * size + count.saturating_sub(1) * gap;
                if *vertical {
                    (*size, length.max(1))
                } else {
                    (length.max(1), *size)
                }
            }
        }
    }

    fn shape(&self) -> SpriteShape {
        match self {
            Self::Headshot { shape, .. } => *shape,
            _ => SpriteShape::Rectangle,
        }
    }

    fn content_svg(&self) -> String {
        match self {
            Self::Headshot { image, size, .. } => image_svg(image, 0, 0, *size, *size, "xMidYMid slice"),
            Self::Logo { image, width, height } => image_svg(image, 0, 0, *width, *height, "xMidYMid meet"),
            Self::Icon { image, size } => image_svg(image, 0, 0, *size, *size, "xMidYMid meet"),
            Self::IconStrip { icons, size, gap, vertical } => icons
                .iter()
                .enumerate()
                .map(|(idx, icon)| {
                    let offset = idx as u32 * (size + gap);
                    let (x, y) = if *vertical { (0, offset) } else { (offset, 0) };
                    image_svg(icon, x, y, *size, *size, "xMidYMid meet")
                })
                .collect(),
        }
    }

    /// The complete SVG document for one frame.
    pub fn frame_svg(&self, state: &FrameState) -> String {
        let (width, height) = self.dimensions();
        let (w, h) = (width as f32, height as f32);
        let (cx, cy) = (w / 2.0, h / 2.0);
        let reveal = state.reveal.clamp(0.0, 1.0) * w;

        let mut defs = format!(
            "<clipPath id=\"shape\">{}</clipPath>\
             <clipPath id=\"reveal\"><rect x=\"0\" y=\"0\" width=\"{reveal:.2}\" height=\"{h:.2}\"/></clipPath>",
            self.shape().clip_svg(w, h)
        );

        let mut overlay = String::new();
        if let Self::Headshot { glow: Some(color), shape: SpriteShape::Circle, .. } = self {
            let r = (w.min(h) - GLOW_STROKE) / 2.0;
            overlay.push_str(&format!(
                "<circle cx=\"{cx:.2}\" cy=\"{cy:.2}\" r=\"{r:.2}\" fill=\"none\" stroke=\"{color}\" \
                 stroke-width=\"{GLOW_STROKE}\" stroke-opacity=\"0.6\"/>"
            ));
        }
        if let Some(sweep) = state.sweep {
            defs.push_str(
                "<linearGradient id=\"sweep\" x1=\"0\" y1=\"0\" x2=\"1\" y2=\"0\">\
                 <stop offset=\"0\" stop-color=\"#ffffff\" stop-opacity=\"0\"/>\
                 <stop offset=\"0.5\" stop-color=\"#ffffff\" stop-opacity=\"0.55\"/>\
                 <stop offset=\"1\" stop-color=\"#ffffff\" stop-opacity=\"0\"/></linearGradient>",
            );
            let band = w * SWEEP_BAND;
            let x = -band + sweep.clamp(0.0, 1.0) * (w + band);
            overlay.push_str(&format!(
                "<rect x=\"{x:.2}\" y=\"0\" width=\"{band:.2}\" height=\"{h:.2}\" fill=\"url(#sweep)\" clip-path=\"url(#shape)\"/>"
            ));
        }

        format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" xmlns:xlink=\"http://www.w3.org/1999/xlink\" \
             width=\"{width}\" height=\"{height}\" viewBox=\"0 0 {width} {height}\">\
             <defs>{defs}</defs>\
             <g clip-path=\"url(#reveal)\">\
             <g opacity=\"{:.3}\" transform=\"translate({cx:.2} {cy:.2}) rotate({:.2}) scale({:.4}) translate({:.2} {:.2})\">\
             <g clip-path=\"url(#shape)\">{}</g>{overlay}</g></g></svg>",
            state.opacity.clamp(0.0, 1.0),
            state.rotation,
            state.scale.max(0.0),
            -cx,
            -cy,
            self.content_svg()
        )
    }
}

fn image_svg(image: &EmbeddedImage, x: u32, y: u32, width: u32, height: u32, aspect: &str) -> String {
    format!(
        "<image x=\"{x}\" y=\"{y}\" width=\"{width}\" height=\"{height}\" preserveAspectRatio=\"{aspect}\" \
         xlink:href=\"{}\"/>",
        image.data_uri
    )
}

#[cfg(test)]
mod tests {
    use image::{Rgba, RgbaImage};

    use super::*;

    fn png(width: u32, height: u32, color: [u8; 4]) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, Rgba(color));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn embeds_png_with_dimensions() {
        let image = EmbeddedImage::from_bytes(&png(30, 10, [255, 0, 0, 255])).unwrap();
        assert!(image.data_uri.starts_with("data:image/png;base64,"));
        assert_eq!((image.width, image.height), (30, 10));
    }

    #[test]
    fn rejects_non_images() {
        assert!(EmbeddedImage::from_bytes(b"<html>nope</html>").is_err());
    }

    #[test]
    fn logo_keeps_aspect_and_caps_width() {
        let image = EmbeddedImage::from_bytes(&png(300, 100, [0, 0, 0, 255])).unwrap();
        assert_eq!(Sprite::logo(image.clone(), 40, 500).dimensions(), (120, 40));
        assert_eq!(Sprite::logo(image, 40, 90).dimensions(), (90, 40));
    }

    #[test]
    fn icon_strip_spans_icons_and_gaps() {
        let icon = EmbeddedImage::from_bytes(&png(8, 8, [0, 0, 255, 255])).unwrap();
        let strip = Sprite::IconStrip {
            icons: vec![icon.clone(), icon.clone(), icon],
            size: 20,
            gap: 10,
            vertical: true,
        };
        assert_eq!(strip.dimensions(), (20, 80));
    }

    #[test]
    fn frame_svg_reflects_state() {
        let image = EmbeddedImage::from_bytes(&png(4, 4, [0, 255, 0, 255])).unwrap();
        let sprite = Sprite::Headshot {
            image,
            size: 100,
            shape: SpriteShape::Angled,
            glow: None,
        };
        let svg = sprite.frame_svg(&FrameState {
            opacity: 0.5,
            scale: 1.2,
            reveal: 0.25,
            sweep: Some(0.5),
            rotation: -8.0,
        });
        assert!(svg.contains("opacity=\"0.500\""), "{svg}");
        assert!(svg.contains("scale(1.2000)"));
        assert!(svg.contains("rotate(-8.00)"));
        assert!(svg.contains("width=\"25.00\""));
        assert!(svg.contains("<polygon points=\"22.00,0"));
        assert!(svg.contains("url(#sweep)"));
    }
}
