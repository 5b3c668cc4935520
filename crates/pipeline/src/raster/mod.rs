//! Frame rasterization for animated elements.
//!
//! An animated element is drawn as a standalone [`Sprite`] at its own
//! bounding box. [`render_frames`] redraws the sprite once per frame on a
//! pooled [`RenderSurface`] and [`encode_gif`] turns the captured frames
//! into a looping GIF.

mod encoder;
mod frames;
mod sprite;
mod surface;

pub use encoder::{encode_gif, FrameOrder};
pub use frames::render_frames;
pub use sprite::{EmbeddedImage, Sprite, SpriteShape};
pub use surface::{RenderSurface, SurfaceGuard, SurfacePool};

/// Errors raised while rasterizing or encoding frames.
#[derive(Debug, thiserror::Error)]
pub enum RasterError {
    #[error("Rendering surface unavailable: {0}")]
    SurfaceUnavailable(String),

    #[error("Failed to allocate a {width}x{height} surface")]
    Allocation { width: u32, height: u32 },

    #[error("Failed to build frame: {0}")]
    Svg(String),

    #[error("Unsupported or corrupt image: {0}")]
    Image(#[from] image::ImageError),

    #[error("Frame rendering cancelled after {frames} frames")]
    Cancelled { frames: usize },
}

/// Parse `#rrggbb` (or `#rgb`) into RGB components. Anything else is
/// treated as white.
pub fn parse_hex_color(value: &str) -> (u8, u8, u8) {
    let hex = value.trim().trim_start_matches('#');
    let expand = |c: u8| c * 16 + c;
    let digit = |c: u8| (c as char).to_digit(16).map(|d| d as u8);

    let parsed = match hex.len() {
        6 => u32::from_str_radix(hex, 16)
            .ok()
            .map(|v| ((v >> 16) as u8, (v >> 8) as u8, v as u8)),
        3 => {
            let bytes = hex.as_bytes();
            match (digit(bytes[0]), digit(bytes[1]), digit(bytes[2])) {
                (Some(r), Some(g), Some(b)) => Some((expand(r), expand(g), expand(b))),
                _ => None,
            }
        }
        _ => None,
    };
    parsed.unwrap_or((255, 255, 255))
}
