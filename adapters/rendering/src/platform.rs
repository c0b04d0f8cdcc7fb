//! Boundary to the graphics surface owned by the platform layer.

use std::time::Duration;

use anyhow::Result as AnyResult;
use tactica_core::RawInput;
use tracing::info;

use crate::{FrameBuffer, Palette, Presentation, SurfaceError};

/// Geometry of a locked surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SurfaceLock {
    /// Width in pixels.
    pub width: i32,
    /// Height in pixels.
    pub height: i32,
    /// Bytes per row.
    pub pitch: i32,
}

/// Display surface the finished 8-bit frame is handed to.
pub trait PlatformSurface {
    /// Acquires the surface for the current frame.
    fn lock(&mut self) -> Result<SurfaceLock, SurfaceError>;

    /// Releases a previous lock.
    fn unlock(&mut self);

    /// Uploads palette entries used to convert later flips.
    fn set_palette(&mut self, palette: &Palette);

    /// Presents a finished frame.
    fn flip(&mut self, frame: &FrameBuffer) -> Result<(), SurfaceError>;
}

/// Releases a surface lock when dropped.
#[derive(Debug)]
pub struct LockGuard<'a, P>
where
    P: PlatformSurface + ?Sized,
{
    surface: &'a mut P,
    lock: SurfaceLock,
}

impl<'a, P> LockGuard<'a, P>
where
    P: PlatformSurface + ?Sized,
{
    /// Locks `surface`, unlocking it again when the guard goes out of scope.
    pub fn acquire(surface: &'a mut P) -> Result<Self, SurfaceError> {
        let lock = surface.lock()?;
        Ok(Self { surface, lock })
    }

    /// Geometry reported by the lock.
    #[must_use]
    pub const fn lock(&self) -> SurfaceLock {
        self.lock
    }

    /// Uploads a palette through the held surface.
    pub fn set_palette(&mut self, palette: &Palette) {
        self.surface.set_palette(palette);
    }

    /// Presents a frame while the lock is held.
    pub fn flip(&mut self, frame: &FrameBuffer) -> Result<(), SurfaceError> {
        self.surface.flip(frame)
    }
}

impl<P> Drop for LockGuard<'_, P>
where
    P: PlatformSurface + ?Sized,
{
    fn drop(&mut self) {
        self.surface.unlock();
    }
}

/// In-memory surface that records what it was given.
#[derive(Clone, Debug)]
pub struct HeadlessSurface {
    width: i32,
    height: i32,
    palette: Palette,
    locked: bool,
    fail_lock: bool,
    fail_flip: bool,
    flips: u64,
    palette_uploads: u64,
    last_frame: Option<FrameBuffer>,
}

impl HeadlessSurface {
    /// Creates a surface of the given size.
    #[must_use]
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            width,
            height,
            palette: Palette::black(),
            locked: false,
            fail_lock: false,
            fail_flip: false,
            flips: 0,
            palette_uploads: 0,
            last_frame: None,
        }
    }

    /// Makes every lock fail until reset.
    pub fn set_lock_failure(&mut self, fail: bool) {
        self.fail_lock = fail;
    }

    /// Makes every flip fail until reset.
    pub fn set_flip_failure(&mut self, fail: bool) {
        self.fail_flip = fail;
    }

    /// Successful flips so far.
    #[must_use]
    pub const fn flips(&self) -> u64 {
        self.flips
    }

    /// Palette uploads so far.
    #[must_use]
    pub const fn palette_uploads(&self) -> u64 {
        self.palette_uploads
    }

    /// Returns `true` while a lock is held.
    #[must_use]
    pub const fn is_locked(&self) -> bool {
        self.locked
    }

    /// Last uploaded palette.
    #[must_use]
    pub const fn palette(&self) -> &Palette {
        &self.palette
    }

    /// Last presented frame.
    #[must_use]
    pub fn last_frame(&self) -> Option<&FrameBuffer> {
        self.last_frame.as_ref()
    }
}

impl PlatformSurface for HeadlessSurface {
    fn lock(&mut self) -> Result<SurfaceLock, SurfaceError> {
        if self.fail_lock {
            return Err(SurfaceError::LockFailed {
                reason: "surface unavailable".to_owned(),
            });
        }
        self.locked = true;
        Ok(SurfaceLock {
            width: self.width,
            height: self.height,
            pitch: self.width,
        })
    }

    fn unlock(&mut self) {
        self.locked = false;
    }

    fn set_palette(&mut self, palette: &Palette) {
        self.palette = palette.clone();
        self.palette_uploads += 1;
    }

    fn flip(&mut self, frame: &FrameBuffer) -> Result<(), SurfaceError> {
        if self.fail_flip {
            return Err(SurfaceError::FlipFailed {
                reason: "surface lost".to_owned(),
            });
        }
        self.flips += 1;
        self.last_frame = Some(frame.clone());
        Ok(())
    }
}

/// Whether the frame loop keeps going.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FrameControl {
    /// Run another frame.
    Continue,
    /// Stop after this frame.
    Exit,
}

/// Rendering backend that owns the frame loop and a platform surface.
pub trait RenderingBackend {
    /// Runs frames until the callback asks to exit or the backend stops.
    ///
    /// Each frame the callback receives the elapsed frame time, the raw
    /// device snapshot and the surface to render into.
    fn run<F>(self, presentation: Presentation, frame: F) -> AnyResult<()>
    where
        F: FnMut(Duration, RawInput, &mut dyn PlatformSurface) -> AnyResult<FrameControl> + 'static;
}

/// Backend without a window that feeds scripted input for a fixed number of frames.
#[derive(Clone, Debug, Default)]
pub struct HeadlessBackend {
    frames: u64,
    inputs: Vec<RawInput>,
}

impl HeadlessBackend {
    /// Runs at most `frames` frames.
    #[must_use]
    pub fn new(frames: u64) -> Self {
        Self {
            frames,
            inputs: Vec::new(),
        }
    }

    /// Input snapshots replayed one per frame; the last one repeats.
    #[must_use]
    pub fn with_inputs(mut self, inputs: Vec<RawInput>) -> Self {
        self.inputs = inputs;
        self
    }
}

impl RenderingBackend for HeadlessBackend {
    fn run<F>(self, presentation: Presentation, mut frame: F) -> AnyResult<()>
    where
        F: FnMut(Duration, RawInput, &mut dyn PlatformSurface) -> AnyResult<FrameControl> + 'static,
    {
        let mut surface = HeadlessSurface::new(presentation.width, presentation.height);
        let frame_time = presentation.frame_time();
        let mut elapsed = Duration::ZERO;
        let mut ran = 0;
        for index in 0..self.frames {
            elapsed += frame_time;
            let mut input = usize::try_from(index)
                .ok()
                .and_then(|index| self.inputs.get(index).or(self.inputs.last()))
                .cloned()
                .unwrap_or_default();
            input.timestamp = elapsed;
            ran += 1;
            if frame(frame_time, input, &mut surface)? == FrameControl::Exit {
                break;
            }
        }
        info!(
            title = %presentation.window_title,
            frames = ran,
            flips = surface.flips(),
            "headless run finished"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{cell::Cell, rc::Rc};

    #[test]
    fn lock_guard_unlocks_on_drop() {
        let mut surface = HeadlessSurface::new(8, 8);
        {
            let guard = LockGuard::acquire(&mut surface).expect("lock succeeds");
            assert_eq!(guard.lock().pitch, 8);
        }
        assert!(!surface.is_locked(), "dropping the guard releases the lock");
    }

    #[test]
    fn failing_lock_reports_an_error() {
        let mut surface = HeadlessSurface::new(8, 8);
        surface.set_lock_failure(true);
        assert!(matches!(
            LockGuard::acquire(&mut surface),
            Err(SurfaceError::LockFailed { .. })
        ));
        assert!(!surface.is_locked());
    }

    #[test]
    fn headless_backend_replays_inputs_and_honours_exit() {
        let seen = Rc::new(Cell::new(0));
        let counter = Rc::clone(&seen);
        let mut input = RawInput::default();
        input.mouse_x = 42;
        HeadlessBackend::new(10)
            .with_inputs(vec![input])
            .run(Presentation::new("test", 640, 400), move |_, raw, _| {
                assert_eq!(raw.mouse_x, 42, "the last input repeats");
                counter.set(counter.get() + 1);
                Ok(if counter.get() == 3 {
                    FrameControl::Exit
                } else {
                    FrameControl::Continue
                })
            })
            .expect("headless run succeeds");
        assert_eq!(seen.get(), 3);
    }
}
