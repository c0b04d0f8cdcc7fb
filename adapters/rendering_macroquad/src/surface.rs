//! Palette expansion and presentation of 8-bit frames through a texture.

use glam::Vec2;
use macroquad::{
    color::WHITE,
    texture::{draw_texture_ex, DrawTextureParams, FilterMode, Image, Texture2D},
};
use tactica_rendering::{
    DrawSurface, FrameBuffer, Palette, PlatformSurface, SurfaceError, SurfaceLock,
};

/// Placement of the frame inside the window.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Letterbox {
    /// Top-left corner of the frame in window pixels.
    pub origin: Vec2,
    /// Window pixels per frame pixel.
    pub scale: f32,
    /// Frame size in frame pixels.
    pub frame: Vec2,
}

impl Letterbox {
    /// Largest uniform fit of `frame` inside `window`, centred.
    #[must_use]
    pub fn fit(window: Vec2, frame: Vec2) -> Self {
        let scale = if frame.x <= 0.0 || frame.y <= 0.0 {
            1.0
        } else {
            (window.x / frame.x).min(window.y / frame.y).max(f32::EPSILON)
        };
        let origin = ((window - frame * scale) * 0.5).max(Vec2::ZERO);
        Self {
            origin,
            scale,
            frame,
        }
    }

    /// Size of the frame on screen.
    #[must_use]
    pub fn size(&self) -> Vec2 {
        self.frame * self.scale
    }

    /// Maps a window position to frame pixels, clamped to the frame.
    #[must_use]
    pub fn to_frame(&self, x: f32, y: f32) -> (i32, i32) {
        let local = (Vec2::new(x, y) - self.origin) / self.scale;
        let max = (self.frame - Vec2::ONE).max(Vec2::ZERO);
        let clamped = local.floor().clamp(Vec2::ZERO, max);
        (clamped.x as i32, clamped.y as i32)
    }
}

/// Expands palette indices into RGBA bytes.
pub fn expand_frame(frame: &FrameBuffer, lookup: &[[u8; 4]; 256], out: &mut Vec<u8>) {
    out.clear();
    out.reserve(frame.pixels().len() * 4);
    for index in frame.pixels() {
        out.extend_from_slice(&lookup[usize::from(*index)]);
    }
}

/// Opaque RGBA lookup built from a palette.
#[must_use]
pub fn rgba_lookup(palette: &Palette) -> [[u8; 4]; 256] {
    let mut lookup = [[0, 0, 0, 255]; 256];
    for (entry, color) in lookup.iter_mut().zip(palette.colors()) {
        *entry = [color.r, color.g, color.b, 255];
    }
    lookup
}

/// Surface that uploads each flipped frame into a texture and draws it letterboxed.
///
/// Only usable inside a running macroquad window.
#[derive(Debug)]
pub struct MacroquadSurface {
    width: i32,
    height: i32,
    locked: bool,
    lookup: [[u8; 4]; 256],
    rgba: Vec<u8>,
    texture: Option<Texture2D>,
    letterbox: Letterbox,
}

impl MacroquadSurface {
    /// Creates a surface for frames of the given size.
    #[must_use]
    pub fn new(width: i32, height: i32) -> Self {
        let frame = Vec2::new(width as f32, height as f32);
        Self {
            width,
            height,
            locked: false,
            lookup: rgba_lookup(&Palette::black()),
            rgba: Vec::new(),
            texture: None,
            letterbox: Letterbox::fit(frame, frame),
        }
    }

    /// Recomputes the frame placement for the current window size.
    pub fn fit_window(&mut self, window: Vec2) {
        self.letterbox = Letterbox::fit(window, self.letterbox.frame);
    }

    /// Placement used by the last flip.
    #[must_use]
    pub const fn letterbox(&self) -> &Letterbox {
        &self.letterbox
    }

    fn upload(&mut self, frame: &FrameBuffer) -> Result<Texture2D, SurfaceError> {
        let (Ok(width), Ok(height)) = (u16::try_from(frame.width()), u16::try_from(frame.height()))
        else {
            return Err(SurfaceError::FlipFailed {
                reason: format!(
                    "frame {}x{} exceeds texture limits",
                    frame.width(),
                    frame.height()
                ),
            });
        };
        expand_frame(frame, &self.lookup, &mut self.rgba);
        let image = Image {
            bytes: std::mem::take(&mut self.rgba),
            width,
            height,
        };

        let texture = match self.texture {
            Some(texture) if texture.width() as u16 == width && texture.height() as u16 == height => {
                texture.update(&image);
                texture
            }
            _ => {
                if let Some(stale) = self.texture.take() {
                    stale.delete();
                }
                let texture = Texture2D::from_image(&image);
                texture.set_filter(FilterMode::Nearest);
                self.texture = Some(texture);
                texture
            }
        };
        self.rgba = image.bytes;
        Ok(texture)
    }
}

impl PlatformSurface for MacroquadSurface {
    fn lock(&mut self) -> Result<SurfaceLock, SurfaceError> {
        if self.locked {
            return Err(SurfaceError::LockFailed {
                reason: "surface is already locked".to_owned(),
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
        self.lookup = rgba_lookup(palette);
    }

    fn flip(&mut self, frame: &FrameBuffer) -> Result<(), SurfaceError> {
        let texture = self.upload(frame)?;
        let size = self.letterbox.size();
        draw_texture_ex(
            texture,
            self.letterbox.origin.x,
            self.letterbox.origin.y,
            WHITE,
            DrawTextureParams {
                dest_size: Some(macroquad::math::Vec2::new(size.x, size.y)),
                ..DrawTextureParams::default()
            },
        );
        Ok(())
    }
}
