//! Animation easing curves.
//!
//! Each curve is a pure function of `progress` in `[0, 1]` producing the
//! [`FrameState`] the renderer should draw an element at. The renderer
//! calls [`frame_state`] once per output frame with
//! [`frame_progress`]`(i, n)`.

use crate::signature::ElementAnimation;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Default number of frames in a baked loop.
pub const DEFAULT_FRAME_COUNT: u32 = 20;

/// Default per-frame delay in milliseconds (20 x 120ms = 2.4s loop).
pub const DEFAULT_FRAME_DELAY_MS: u32 = 120;

/// Bounds accepted for a configured frame delay.
pub const MIN_FRAME_DELAY_MS: u32 = 20;
pub const MAX_FRAME_DELAY_MS: u32 = 1000;

/// Bounds accepted for a configured frame count.
pub const MIN_FRAME_COUNT: u32 = 2;
pub const MAX_FRAME_COUNT: u32 = 120;

/// Opacity milestones for cross-dissolve at progress 0, .25, .5, .75, 1.
const CROSS_DISSOLVE_STOPS: [(f32, f32); 5] =
    [(0.0, 0.0), (0.25, 0.3), (0.5, 0.7), (0.75, 0.9), (1.0, 1.0)];

// ---------------------------------------------------------------------------
// Frame state
// ---------------------------------------------------------------------------

/// How an element should be drawn for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameState {
    /// Alpha multiplier in `[0, 1]`.
    pub opacity: f32,
    /// Uniform scale about the element centre.
    pub scale: f32,
    /// Visible fraction for left-to-right wipes, `1.0` when fully shown.
    pub reveal: f32,
    /// Horizontal position of a highlight band in `[0, 1]`, if any.
    pub sweep: Option<f32>,
    /// Rotation in degrees about the element centre.
    pub rotation: f32,
}

impl FrameState {
    /// Fully visible, untransformed.
    pub const SETTLED: FrameState = FrameState {
        opacity: 1.0,
        scale: 1.0,
        reveal: 1.0,
        sweep: None,
        rotation: 0.0,
    };

    fn with_opacity_scale(opacity: f32, scale: f32) -> Self {
        Self {
            opacity,
            scale,
            ..Self::SETTLED
        }
    }
}

/// Frame timing for a baked loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameConfig {
    pub frame_count: u32,
    pub frame_delay_ms: u32,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            frame_count: DEFAULT_FRAME_COUNT,
            frame_delay_ms: DEFAULT_FRAME_DELAY_MS,
        }
    }
}

impl FrameConfig {
    /// Build a config with both values clamped to their accepted bounds.
    pub fn clamped(frame_count: u32, frame_delay_ms: u32) -> Self {
        Self {
            frame_count: frame_count.clamp(MIN_FRAME_COUNT, MAX_FRAME_COUNT),
            frame_delay_ms: frame_delay_ms.clamp(MIN_FRAME_DELAY_MS, MAX_FRAME_DELAY_MS),
        }
    }

    /// Total loop duration in milliseconds.
    pub fn loop_duration_ms(&self) -> u64 {
        u64::from(self.frame_count) * u64::from(self.frame_delay_ms)
    }

    /// Progress values for every frame, in order.
    pub fn progress_steps(&self) -> impl Iterator<Item = f32> + '_ {
        (0..self.frame_count).map(move |i| frame_progress(i, self.frame_count))
    }
}

/// `frame_index / (frame_count - 1)`, with single-frame loops pinned to 1.
pub fn frame_progress(frame_index: u32, frame_count: u32) -> f32 {
    if frame_count <= 1 {
        return 1.0;
    }
    (frame_index.min(frame_count - 1) as f32) / ((frame_count - 1) as f32)
}

// ---------------------------------------------------------------------------
// Curves
// ---------------------------------------------------------------------------

/// Opacity ramps linearly from 0 to 1.
pub fn fade_in(progress: f32) -> FrameState {
    FrameState::with_opacity_scale(progress.clamp(0.0, 1.0), 1.0)
}

/// Two-second breathing loop: slightly dimmer and larger at mid-cycle,
/// identical at both ends so the loop is seamless.
pub fn pulse(progress: f32) -> FrameState {
    let cycle = (progress.clamp(0.0, 1.0) * 2.0) % 2.0;
    let pulse_progress = if cycle <= 1.0 { cycle } else { 2.0 - cycle };
    FrameState::with_opacity_scale(0.8 + 0.2 * (1.0 - pulse_progress), 1.0 + 0.05 * pulse_progress)
}

/// Piecewise-linear opacity through the cross-dissolve milestones.
pub fn cross_dissolve(progress: f32) -> FrameState {
    let p = progress.clamp(0.0, 1.0);
    let opacity = CROSS_DISSOLVE_STOPS
        .windows(2)
        .find(|w| p <= w[1].0)
        .map(|w| {
            let (x0, y0) = w[0];
            let (x1, y1) = w[1];
            y0 + (y1 - y0) * (p - x0) / (x1 - x0)
        })
        .unwrap_or(1.0);
    FrameState::with_opacity_scale(opacity, 1.0)
}

/// Grows from 60% to full size with a cubic ease-out, fading in alongside.
pub fn zoom_in(progress: f32) -> FrameState {
    let eased = ease_out_cubic(progress);
    FrameState::with_opacity_scale(eased, 0.6 + 0.4 * eased)
}

/// Left-to-right wipe with smoothstep easing.
pub fn block_reveal(progress: f32) -> FrameState {
    FrameState {
        reveal: smoothstep(progress),
        ..FrameState::SETTLED
    }
}

/// A highlight band crossing the element once per loop.
pub fn test_sweep(progress: f32) -> FrameState {
    FrameState {
        sweep: Some(progress.clamp(0.0, 1.0)),
        ..FrameState::SETTLED
    }
}

/// Slapped on like a sticker: drops in large and tilted, overshoots, settles.
pub fn stick_on(progress: f32) -> FrameState {
    let p = progress.clamp(0.0, 1.0);
    let (opacity, scale, rotation) = if p < 0.5 {
        let t = p / 0.5;
        (t, lerp(1.4, 0.92, ease_out_cubic(t)), lerp(-8.0, -2.0, t))
    } else if p < 0.75 {
        let t = (p - 0.5) / 0.25;
        (1.0, lerp(0.92, 1.04, t), lerp(-2.0, 0.0, t))
    } else {
        let t = (p - 0.75) / 0.25;
        (1.0, lerp(1.04, 1.0, t), 0.0)
    };
    FrameState {
        opacity,
        scale,
        rotation,
        ..FrameState::SETTLED
    }
}

/// Dispatch to the curve for `animation`. `None` always yields
/// [`FrameState::SETTLED`].
pub fn frame_state(animation: ElementAnimation, progress: f32) -> FrameState {
    match animation {
        ElementAnimation::None => FrameState::SETTLED,
        ElementAnimation::FadeIn => fade_in(progress),
        ElementAnimation::Pulse => pulse(progress),
        ElementAnimation::CrossDissolve => cross_dissolve(progress),
        ElementAnimation::BlockReveal => block_reveal(progress),
        ElementAnimation::ZoomIn => zoom_in(progress),
        ElementAnimation::TestSweep => test_sweep(progress),
        ElementAnimation::StickOn => stick_on(progress),
    }
}

fn lerp(from: f32, to: f32, t: f32) -> f32 {
    from + (to - from) * t
}

fn ease_out_cubic(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    1.0 - (1.0 - t).powi(3)
}

fn smoothstep(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}
