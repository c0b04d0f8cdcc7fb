#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Indexed-colour rendering for the Tactica engine.
//!
//! Everything draws into 8-bit [`FrameBuffer`]s through the [`DrawSurface`]
//! trait. The [`RenderPipeline`] composes terrain, sprites, sidebar, radar and
//! cursor in layer order and hands the finished frame to a
//! [`PlatformSurface`], which converts it through the active palette.

mod assets;
mod batch;
mod cursor;
mod dirty;
mod error;
mod hud;
mod palette;
mod pipeline;
mod platform;
mod remap;
mod shapes;
mod surface;
mod tiles;

use std::time::Duration;

pub use assets::{
    AssetManifest, AssetSource, DirectoryAssets, MemoryAssets, ShapeEntry, TheaterAssets,
    SUPPORTED_MANIFEST_VERSION,
};
pub use batch::{BatchGroup, BatchStats, DrawSource, RenderLayer, SpriteBatch, SpriteRequest};
pub use cursor::{cursor_frames, CursorFrames, MouseCursor, DEFAULT_ANIMATION_DELAY};
pub use dirty::{
    DirtyRectConfig, DirtyRectTracker, DoubleBufferedDirtyTracker, DEBUG_OVERLAY_COLOR,
};
pub use error::{AssetError, ConfigError, SurfaceError};
pub use hud::{
    terrain_color, BuildItem, ButtonState, RadarBlip, RadarRenderer, RadarState, SidebarButton,
    SidebarHit, SidebarRenderer, SidebarTab, MAX_BLIPS, RADAR_VIEWPORT_COLOR,
};
pub use palette::{
    AnimationRange, FadeState, FlashKind, Palette, PaletteManager, Rgb, Theater,
    MAX_ANIMATION_RANGES, PALETTE_SIZE, PROTECTED_RANGE,
};
pub use pipeline::{
    FrameReport, FrameScene, FrameStage, FrameStats, PipelineConfig, RenderPipeline, TerrainCell,
};
pub use platform::{
    FrameControl, HeadlessBackend, HeadlessSurface, LockGuard, PlatformSurface,
    RenderingBackend, SurfaceLock,
};
pub use remap::{
    EffectTables, HouseColor, RemapTable, FADE_LEVELS, HOUSE_REMAP_END, HOUSE_REMAP_START,
};
pub use shapes::{
    draw_frame, DrawFlags, DrawParams, Frame, FrameEncoding, ShapeCacheStats, ShapeData,
    ShapeEncoder, ShapeId, ShapeRenderer,
};
pub use surface::{DrawSurface, FrameBuffer};
pub use tiles::{
    land_type, template_info, OverlayKind, TemplateInfo, TileCacheStats, TileOutcome,
    TileRenderer, CLEAR_VARIANTS, MISSING_TILE_COLOR, TEMPLATES, TILE_BYTES, TILE_SIZE,
};

/// RGBA color used when presenting frames.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    /// Red channel intensity in the range 0.0..=1.0.
    pub red: f32,
    /// Green channel intensity in the range 0.0..=1.0.
    pub green: f32,
    /// Blue channel intensity in the range 0.0..=1.0.
    pub blue: f32,
    /// Alpha channel intensity in the range 0.0..=1.0.
    pub alpha: f32,
}

impl Color {
    /// Creates a new color from floating point channels.
    #[must_use]
    pub const fn new(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Creates an opaque color from byte RGB values.
    #[must_use]
    pub const fn from_rgb_u8(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red: red as f32 / 255.0,
            green: green as f32 / 255.0,
            blue: blue as f32 / 255.0,
            alpha: 1.0,
        }
    }

    /// Byte channels in RGBA order.
    #[must_use]
    pub fn to_rgba8(self) -> [u8; 4] {
        let byte = |channel: f32| (channel.clamp(0.0, 1.0) * 255.0).round() as u8;
        [
            byte(self.red),
            byte(self.green),
            byte(self.blue),
            byte(self.alpha),
        ]
    }
}

/// Window and timing settings consumed by rendering backends.
#[derive(Clone, Debug, PartialEq)]
pub struct Presentation {
    /// Title used by the created window.
    pub window_title: String,
    /// Colour around the letterboxed frame.
    pub clear_color: Color,
    /// Frame width in game pixels.
    pub width: i32,
    /// Frame height in game pixels.
    pub height: i32,
    /// Window pixels per game pixel.
    pub scale: u32,
    /// Frames per second the backend aims for.
    pub target_fps: u32,
}

impl Presentation {
    /// Constructs a presentation descriptor with a black border, scale 2 and 60 fps.
    #[must_use]
    pub fn new<T>(window_title: T, width: i32, height: i32) -> Self
    where
        T: Into<String>,
    {
        Self {
            window_title: window_title.into(),
            clear_color: Color::from_rgb_u8(0, 0, 0),
            width,
            height,
            scale: 2,
            target_fps: 60,
        }
    }

    /// Sets the border colour.
    #[must_use]
    pub fn with_clear_color(mut self, color: Color) -> Self {
        self.clear_color = color;
        self
    }

    /// Sets the window scale; zero is treated as one.
    #[must_use]
    pub fn with_scale(mut self, scale: u32) -> Self {
        self.scale = scale.max(1);
        self
    }

    /// Sets the frame rate; zero is treated as one.
    #[must_use]
    pub fn with_target_fps(mut self, fps: u32) -> Self {
        self.target_fps = fps.max(1);
        self
    }

    /// Duration of one frame at the target rate.
    #[must_use]
    pub fn frame_time(&self) -> Duration {
        Duration::from_secs(1) / self.target_fps.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_colours_convert_to_presentation_colours() {
        let color = Color::from(Rgb::new(255, 0, 51));
        assert_eq!(color.to_rgba8(), [255, 0, 51, 255]);
    }

    #[test]
    fn presentation_frame_time_follows_target_rate() {
        let presentation = Presentation::new("test", 640, 400).with_target_fps(50);
        assert_eq!(presentation.frame_time(), Duration::from_millis(20));
        assert_eq!(
            Presentation::new("test", 640, 400).with_scale(0).scale,
            1,
            "zero scale is clamped"
        );
    }
}
