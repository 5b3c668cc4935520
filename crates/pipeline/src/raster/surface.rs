//! Bounded pool of reusable rendering surfaces.
//!
//! The pool is an explicit value handed to the exporter; there is no
//! global surface. [`SurfacePool::acquire`] waits for a permit up to the
//! configured timeout and returns a [`SurfaceGuard`]. Dropping the guard
//! puts the surface back on the idle list and releases the permit, on
//! every exit path including a panic inside a blocking render task.

use std::ops::{Deref, DerefMut};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use image::RgbaImage;
use resvg::tiny_skia;
use resvg::usvg::{Options, Tree};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use super::RasterError;

pub struct SurfacePool {
    permits: Arc<Semaphore>,
    idle: Arc<Mutex<Vec<RenderSurface>>>,
    capacity: usize,
    acquire_timeout: Duration,
}

impl SurfacePool {
    /// A pool of at most `capacity` surfaces (at least one).
    pub fn new(capacity: usize, acquire_timeout: Duration) -> Self {
        let capacity = capacity.max(1);
        Self {
            permits: Arc::new(Semaphore::new(capacity)),
            idle: Arc::new(Mutex::new(Vec::with_capacity(capacity))),
            capacity,
            acquire_timeout,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Surfaces not currently checked out.
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    /// Check out a surface, waiting up to the acquire timeout.
    pub async fn acquire(&self) -> Result<SurfaceGuard, RasterError> {
        let permit = tokio::time::timeout(self.acquire_timeout, self.permits.clone().acquire_owned())
            .await
            .map_err(|_| {
                RasterError::SurfaceUnavailable(format!(
                    "no surface free within {}ms",
                    self.acquire_timeout.as_millis()
                ))
            })?
            .map_err(|_| RasterError::SurfaceUnavailable("surface pool closed".into()))?;

        let surface = self
            .idle
            .lock()
            .ok()
            .and_then(|mut idle| idle.pop())
            .unwrap_or_default();

        tracing::debug!(available = self.available(), "Rendering surface acquired");
        Ok(SurfaceGuard {
            surface,
            idle: Arc::clone(&self.idle),
            _permit: permit,
        })
    }
}

/// Exclusive access to one pooled surface.
pub struct SurfaceGuard {
    surface: RenderSurface,
    idle: Arc<Mutex<Vec<RenderSurface>>>,
    _permit: OwnedSemaphorePermit,
}

impl std::fmt::Debug for SurfaceGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SurfaceGuard")
            .field("surface", &self.surface)
            .finish_non_exhaustive()
    }
}

impl Deref for SurfaceGuard {
    type Target = RenderSurface;

    fn deref(&self) -> &RenderSurface {
        &self.surface
    }
}

impl DerefMut for SurfaceGuard {
    fn deref_mut(&mut self) -> &mut RenderSurface {
        &mut self.surface
    }
}

impl Drop for SurfaceGuard {
    fn drop(&mut self) {
        let mut surface = std::mem::take(&mut self.surface);
        // A surface abandoned mid-frame is reset rather than reused dirty.
        if surface.in_frame {
            surface = RenderSurface::default();
        }
        if let Ok(mut idle) = self.idle.lock() {
            idle.push(surface);
        }
    }
}

/// A reusable pixel buffer that frames are drawn onto one at a time.
#[derive(Default)]
pub struct RenderSurface {
    pixmap: Option<tiny_skia::Pixmap>,
    in_frame: bool,
    frames_drawn: u64,
}

impl std::fmt::Debug for RenderSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderSurface")
            .field("size", &self.pixmap.as_ref().map(|p| (p.width(), p.height())))
            .field("in_frame", &self.in_frame)
            .field("frames_drawn", &self.frames_drawn)
            .finish()
    }
}

impl RenderSurface {
    /// Clear to `backdrop` at `width` x `height`, reallocating only when
    /// the size changes.
    pub fn begin_frame(&mut self, width: u32, height: u32, backdrop: (u8, u8, u8)) -> Result<(), RasterError> {
        let reuse = self
            .pixmap
            .as_ref()
            .is_some_and(|p| p.width() == width && p.height() == height);
        if !reuse {
            self.pixmap = Some(
                tiny_skia::Pixmap::new(width, height).ok_or(RasterError::Allocation { width, height })?,
            );
        }
        let (r, g, b) = backdrop;
        if let Some(pixmap) = self.pixmap.as_mut() {
            pixmap.fill(tiny_skia::Color::from_rgba8(r, g, b, 255));
        }
        self.in_frame = true;
        Ok(())
    }

    /// Draw an SVG document over the current frame.
    pub fn draw_svg(&mut self, svg: &str) -> Result<(), RasterError> {
        let pixmap = self
            .pixmap
            .as_mut()
            .ok_or_else(|| RasterError::SurfaceUnavailable("draw before begin_frame".into()))?;
        let tree = Tree::from_str(svg, &Options::default()).map_err(|e| RasterError::Svg(e.to_string()))?;
        resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());
        Ok(())
    }

    /// Copy the current frame out as straight-alpha RGBA.
    pub fn capture(&mut self) -> Result<RgbaImage, RasterError> {
        let pixmap = self
            .pixmap
            .as_ref()
            .ok_or_else(|| RasterError::SurfaceUnavailable("capture before begin_frame".into()))?;

        let mut data = Vec::with_capacity(pixmap.data().len());
        for pixel in pixmap.pixels() {
            let color = pixel.demultiply();
            data.extend_from_slice(&[color.red(), color.green(), color.blue(), color.alpha()]);
        }
        let (width, height) = (pixmap.width(), pixmap.height());
        self.in_frame = false;
        self.frames_drawn += 1;

        RgbaImage::from_raw(width, height, data).ok_or(RasterError::Allocation { width, height })
    }

    /// Frames captured over this surface's lifetime.
    pub fn frames_drawn(&self) -> u64 {
        self.frames_drawn
    }
}
