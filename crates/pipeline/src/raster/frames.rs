use image::RgbaImage;
use sigcraft_core::animation::{frame_state, FrameConfig};
use sigcraft_core::signature::ElementAnimation;
use tokio_util::sync::CancellationToken;

use super::{RasterError, RenderSurface, Sprite};

/// Draw every frame of `animation` for `sprite`, strictly in order.
///
/// Each frame clears the surface to `backdrop` and redraws the sprite from
/// scratch. `cancel` is checked before every frame; a cancelled run
/// returns [`RasterError::Cancelled`] without touching the surface again.
pub fn render_frames(
    surface: &mut RenderSurface,
    sprite: &Sprite,
    animation: ElementAnimation,
    config: FrameConfig,
    backdrop: (u8, u8, u8),
    cancel: &CancellationToken,
) -> Result<Vec<RgbaImage>, RasterError> {
    let (width, height) = sprite.dimensions();
    let mut frames = Vec::with_capacity(config.frame_count as usize);

    for progress in config.progress_steps() {
        if cancel.is_cancelled() {
            return Err(RasterError::Cancelled { frames: frames.len() });
        }
        let state = frame_state(animation, progress);
        surface.begin_frame(width, height, backdrop)?;
        surface.draw_svg(&sprite.frame_svg(&state))?;
        frames.push(surface.capture()?);
    }

    tracing::trace!(
        animation = animation.name(),
        frames = frames.len(),
        width,
        height,
        "Frames rendered",
    );
    Ok(frames)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use assert_matches::assert_matches;
    use image::{ImageFormat, Rgba};

    use super::*;
    use crate::raster::EmbeddedImage;

    fn sprite() -> Sprite {
        let img = RgbaImage::from_pixel(6, 6, Rgba([200, 0, 0, 255]));
        let mut bytes = Cursor::new(Vec::new());
        img.write_to(&mut bytes, ImageFormat::Png).unwrap();
        Sprite::Icon {
            image: EmbeddedImage::from_bytes(&bytes.into_inner()).unwrap(),
            size: 12,
        }
    }

    #[test]
    fn renders_one_frame_per_step() {
        let mut surface = RenderSurface::default();
        let config = FrameConfig::clamped(5, 100);
        let frames = render_frames(
            &mut surface,
            &sprite(),
            ElementAnimation::FadeIn,
            config,
            (255, 255, 255),
            &CancellationToken::new(),
        )
        .unwrap();

        assert_eq!(frames.len(), 5);
        assert!(frames.iter().all(|f| f.dimensions() == (12, 12)));
        // Fade-in starts on the bare backdrop and ends on the icon.
        assert_eq!(frames[0].get_pixel(6, 6).0, [255, 255, 255, 255]);
        assert_eq!(frames[4].get_pixel(6, 6).0, [200, 0, 0, 255]);
        assert_eq!(surface.frames_drawn(), 5);
    }

    #[test]
    fn cancelled_token_stops_before_drawing() {
        let mut surface = RenderSurface::default();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = render_frames(
            &mut surface,
            &sprite(),
            ElementAnimation::Pulse,
            FrameConfig::default(),
            (0, 0, 0),
            &cancel,
        );
        assert_matches!(result, Err(RasterError::Cancelled { frames: 0 }));
        assert_eq!(surface.frames_drawn(), 0);
    }
}
