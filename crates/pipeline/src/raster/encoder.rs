use image::codecs::gif::{GifEncoder, Repeat};
use image::{Delay, Frame, RgbaImage};

use super::RasterError;

/// GIF quantizer speed, 1 (best) to 30 (fastest).
const GIF_SPEED: i32 = 10;

/// Order frames are written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOrder {
    Natural,
    /// The last (settled) frame moves to the front, for clients that only
    /// ever show the first frame.
    SettledFirst,
}

impl FrameOrder {
    fn apply(self, frames: &mut [RgbaImage]) {
        if self == Self::SettledFirst && !frames.is_empty() {
            frames.rotate_right(1);
        }
    }
}

/// Encode `frames` as an infinitely looping GIF with a fixed per-frame
/// delay.
pub fn encode_gif(mut frames: Vec<RgbaImage>, delay_ms: u32, order: FrameOrder) -> Result<Vec<u8>, RasterError> {
    order.apply(&mut frames);

    let delay = Delay::from_numer_denom_ms(delay_ms, 1);
    let mut bytes = Vec::new();
    {
        let mut encoder = GifEncoder::new_with_speed(&mut bytes, GIF_SPEED);
        encoder.set_repeat(Repeat::Infinite)?;
        encoder.encode_frames(frames.into_iter().map(|f| Frame::from_parts(f, 0, 0, delay)))?;
    }
    Ok(bytes)
}
