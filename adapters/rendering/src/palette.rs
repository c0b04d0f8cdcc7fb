//! 256-entry palettes and the manager that fades, flashes and cycles them.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{AssetError, AssetSource, Color};

/// Number of entries in an indexed palette.
pub const PALETTE_SIZE: usize = 256;

/// Indices kept stable across theater loads and skipped by fades.
pub const PROTECTED_RANGE: std::ops::RangeInclusive<usize> = 1..=15;

/// Most colour-cycling ranges a manager runs at once.
pub const MAX_ANIMATION_RANGES: usize = 8;

/// One palette entry with 8-bit channels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
}

impl Rgb {
    /// Pure black.
    pub const BLACK: Self = Self::new(0, 0, 0);

    /// Creates an entry from its channels.
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Every channel multiplied by `factor`, clamped to `0.0..=1.0`.
    #[must_use]
    pub fn scaled(self, factor: f32) -> Self {
        let factor = factor.clamp(0.0, 1.0);
        let scale = |c: u8| (f32::from(c) * factor) as u8;
        Self::new(scale(self.r), scale(self.g), scale(self.b))
    }

    /// Linear blend towards `target`; `t = 1.0` yields `target`.
    #[must_use]
    pub fn lerp(self, target: Rgb, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| {
            let a = f32::from(a);
            (a + (f32::from(b) - a) * t).round() as u8
        };
        Self::new(
            mix(self.r, target.r),
            mix(self.g, target.g),
            mix(self.b, target.b),
        )
    }

    fn distance_squared(self, other: Rgb) -> i32 {
        let dr = i32::from(self.r) - i32::from(other.r);
        let dg = i32::from(self.g) - i32::from(other.g);
        let db = i32::from(self.b) - i32::from(other.b);
        dr * dr + dg * dg + db * db
    }
}

impl From<Rgb> for Color {
    fn from(rgb: Rgb) -> Self {
        Color::from_rgb_u8(rgb.r, rgb.g, rgb.b)
    }
}

/// Map theater selecting palette and tile set.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theater {
    /// Grassland.
    #[default]
    Temperate,
    /// Winter.
    Snow,
    /// Indoor missions.
    Interior,
}

impl Theater {
    /// Every theater.
    pub const ALL: [Theater; 3] = [Self::Temperate, Self::Snow, Self::Interior];

    /// Asset name of the theater palette.
    #[must_use]
    pub const fn palette_name(&self) -> &'static str {
        match self {
            Self::Temperate => "TEMPERAT.PAL",
            Self::Snow => "SNOW.PAL",
            Self::Interior => "INTERIOR.PAL",
        }
    }

    /// File extension of the theater's terrain templates.
    #[must_use]
    pub const fn tile_extension(&self) -> &'static str {
        match self {
            Self::Temperate => ".TMP",
            Self::Snow => ".SNO",
            Self::Interior => ".INT",
        }
    }

    /// Lowercase name used in configuration and manifests.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Temperate => "temperate",
            Self::Snow => "snow",
            Self::Interior => "interior",
        }
    }
}

/// Fixed colours every palette carries in its protected range.
const UI_COLORS: [Rgb; 15] = [
    Rgb::new(0, 0, 170),
    Rgb::new(0, 170, 0),
    Rgb::new(0, 170, 170),
    Rgb::new(170, 0, 0),
    Rgb::new(170, 0, 170),
    Rgb::new(170, 85, 0),
    Rgb::new(170, 170, 170),
    Rgb::new(85, 85, 85),
    Rgb::new(85, 85, 255),
    Rgb::new(85, 255, 85),
    Rgb::new(85, 255, 255),
    Rgb::new(255, 85, 85),
    Rgb::new(255, 85, 255),
    Rgb::new(255, 255, 85),
    Rgb::new(255, 255, 255),
];

/// 256 palette entries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Palette {
    colors: [Rgb; PALETTE_SIZE],
}

impl Default for Palette {
    fn default() -> Self {
        Self::standard()
    }
}

impl Palette {
    /// All-black palette.
    #[must_use]
    pub const fn black() -> Self {
        Self {
            colors: [Rgb::BLACK; PALETTE_SIZE],
        }
    }

    /// Palette with the UI colours and sixteen shaded ramps of distinct hues.
    ///
    /// Used when no theater palette is available.
    #[must_use]
    pub fn standard() -> Self {
        const HUES: [Rgb; 15] = [
            Rgb::new(255, 255, 255),
            Rgb::new(64, 160, 48),
            Rgb::new(150, 110, 60),
            Rgb::new(128, 128, 128),
            Rgb::new(40, 90, 200),
            Rgb::new(255, 255, 0),
            Rgb::new(255, 0, 0),
            Rgb::new(0, 200, 0),
            Rgb::new(255, 128, 0),
            Rgb::new(0, 160, 255),
            Rgb::new(200, 40, 200),
            Rgb::new(220, 200, 120),
            Rgb::new(90, 70, 40),
            Rgb::new(0, 0, 255),
            Rgb::new(140, 80, 40),
        ];
        let mut palette = Self::black();
        palette.colors[1..=15].copy_from_slice(&UI_COLORS);
        for (ramp, hue) in HUES.iter().enumerate() {
            for step in 0..16 {
                let shade = 0.25 + 0.75 * (step as f32 / 15.0);
                palette.colors[16 + ramp * 16 + step] = hue.scaled(shade);
            }
        }
        palette
    }

    /// Decodes 768 bytes of 6-bit VGA components, widening each with `<< 2`.
    pub fn from_vga(name: &str, bytes: &[u8]) -> Result<Self, AssetError> {
        if bytes.len() != PALETTE_SIZE * 3 {
            return Err(AssetError::MalformedPalette {
                name: name.to_owned(),
                reason: format!("expected {} bytes, found {}", PALETTE_SIZE * 3, bytes.len()),
            });
        }
        if let Some(position) = bytes.iter().position(|&b| b > 63) {
            return Err(AssetError::MalformedPalette {
                name: name.to_owned(),
                reason: format!("component at offset {position} exceeds 6 bits"),
            });
        }
        let mut palette = Self::black();
        for (entry, chunk) in palette.colors.iter_mut().zip(bytes.chunks_exact(3)) {
            *entry = Rgb::new(chunk[0] << 2, chunk[1] << 2, chunk[2] << 2);
        }
        Ok(palette)
    }

    /// Encodes the palette as 6-bit VGA components.
    #[must_use]
    pub fn to_vga(&self) -> Vec<u8> {
        self.colors
            .iter()
            .flat_map(|c| [c.r >> 2, c.g >> 2, c.b >> 2])
            .collect()
    }

    /// Entry at `index`.
    #[must_use]
    pub const fn get(&self, index: u8) -> Rgb {
        self.colors[index as usize]
    }

    /// Replaces the entry at `index`.
    pub fn set(&mut self, index: u8, color: Rgb) {
        self.colors[index as usize] = color;
    }

    /// Every entry in index order.
    #[must_use]
    pub const fn colors(&self) -> &[Rgb; PALETTE_SIZE] {
        &self.colors
    }

    /// Index of the nearest entry by squared RGB distance. Never returns 0.
    #[must_use]
    pub fn find_closest_color(&self, target: Rgb) -> u8 {
        let mut best = 1u8;
        let mut best_distance = i32::MAX;
        for index in 1..PALETTE_SIZE {
            let distance = self.colors[index].distance_squared(target);
            if distance < best_distance {
                best_distance = distance;
                best = index as u8;
            }
        }
        best
    }

    fn rotate_forward(&mut self, start: usize, count: usize) {
        if count > 1 {
            self.colors[start..start + count].rotate_right(1);
        }
    }
}

/// Progress of a palette fade.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum FadeState {
    /// No fade in progress.
    #[default]
    None,
    /// Brightening from black towards the base palette.
    FadingIn,
    /// Darkening towards black.
    FadingOut,
    /// Fully black after a fade out.
    FadedOut,
}

/// Tint colour of a palette flash.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlashKind {
    /// White flash (explosions).
    White,
    /// Red flash (damage).
    Red,
    /// Green flash.
    Green,
    /// Any colour.
    Custom(Rgb),
}

impl FlashKind {
    /// Tint colour.
    #[must_use]
    pub const fn color(&self) -> Rgb {
        match self {
            Self::White => Rgb::new(255, 255, 255),
            Self::Red => Rgb::new(255, 0, 0),
            Self::Green => Rgb::new(0, 255, 0),
            Self::Custom(rgb) => *rgb,
        }
    }
}

/// Contiguous palette range rotated every `delay` ticks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AnimationRange {
    /// First index of the range.
    pub start: u8,
    /// Number of entries.
    pub count: u8,
    /// Ticks between rotations.
    pub delay: u32,
    counter: u32,
}

impl AnimationRange {
    /// Shoreline water cycle.
    pub const WATER: Self = Self::new(192, 16, 4);
    /// Burning fire cycle.
    pub const FIRE: Self = Self::new(96, 16, 3);

    /// Creates a range; a zero delay rotates every tick.
    #[must_use]
    pub const fn new(start: u8, count: u8, delay: u32) -> Self {
        Self {
            start,
            count,
            delay: if delay == 0 { 1 } else { delay },
            counter: 0,
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct Flash {
    color: Rgb,
    intensity: f32,
    current: f32,
    duration: u32,
    frame: u32,
}

/// Active palette plus the effects layered over it.
///
/// The base palette is what the theater defines (rotated by colour cycling);
/// the current palette is the base after fade and flash, and is what the
/// platform surface shows.
#[derive(Clone, Debug)]
pub struct PaletteManager {
    base: Palette,
    current: Palette,
    theater: Option<Theater>,
    fade: FadeState,
    fade_progress: f32,
    fade_elapsed: u32,
    fade_frames: u32,
    flash: Option<Flash>,
    animations: Vec<AnimationRange>,
    changed: bool,
}

impl Default for PaletteManager {
    fn default() -> Self {
        Self::new(Palette::standard())
    }
}

impl PaletteManager {
    /// Creates a manager showing `palette` with no effects.
    #[must_use]
    pub fn new(palette: Palette) -> Self {
        let mut manager = Self {
            base: palette.clone(),
            current: palette,
            theater: None,
            fade: FadeState::None,
            fade_progress: 1.0,
            fade_elapsed: 0,
            fade_frames: 1,
            flash: None,
            animations: Vec::new(),
            changed: true,
        };
        manager.apply_effects();
        manager
    }

    /// Palette after every effect; what the screen shows.
    #[must_use]
    pub const fn current(&self) -> &Palette {
        &self.current
    }

    /// Palette before fade and flash.
    #[must_use]
    pub const fn base(&self) -> &Palette {
        &self.base
    }

    /// Theater whose palette is loaded, if any.
    #[must_use]
    pub const fn theater(&self) -> Option<Theater> {
        self.theater
    }

    /// Replaces the base palette with a theater palette.
    ///
    /// Index 0 stays black and the protected UI range keeps its colours.
    pub fn set_theater_palette(&mut self, theater: Theater, palette: &Palette) {
        for index in 16..PALETTE_SIZE {
            self.base.colors[index] = palette.colors[index];
        }
        self.base.colors[0] = Rgb::BLACK;
        self.theater = Some(theater);
        info!(theater = theater.name(), "theater palette loaded");
        self.apply_effects();
    }

    /// Reads and installs the theater's palette from `assets`.
    pub fn load_theater_palette<A>(&mut self, theater: Theater, assets: &A) -> Result<(), AssetError>
    where
        A: AssetSource + ?Sized,
    {
        let name = theater.palette_name();
        let palette = Palette::from_vga(name, &assets.read(name)?)?;
        self.set_theater_palette(theater, &palette);
        Ok(())
    }

    /// Overwrites one base entry. Index 0 cannot be changed.
    pub fn set_color(&mut self, index: u8, color: Rgb) {
        if index == 0 {
            return;
        }
        self.base.set(index, color);
        self.apply_effects();
    }

    /// Begins brightening from black over `frames` updates.
    pub fn start_fade_in(&mut self, frames: u32) {
        self.fade = FadeState::FadingIn;
        self.fade_progress = 0.0;
        self.fade_elapsed = 0;
        self.fade_frames = frames.max(1);
        debug!(frames, "palette fade in");
        self.apply_effects();
    }

    /// Begins darkening to black over `frames` updates.
    pub fn start_fade_out(&mut self, frames: u32) {
        self.fade = FadeState::FadingOut;
        self.fade_progress = 1.0;
        self.fade_elapsed = 0;
        self.fade_frames = frames.max(1);
        debug!(frames, "palette fade out");
        self.apply_effects();
    }

    /// Jumps straight to black.
    pub fn fade_to_black(&mut self) {
        self.fade = FadeState::FadedOut;
        self.fade_progress = 0.0;
        self.apply_effects();
    }

    /// Jumps straight back to the full palette.
    pub fn restore_from_black(&mut self) {
        self.fade = FadeState::None;
        self.fade_progress = 1.0;
        self.apply_effects();
    }

    /// Current fade state.
    #[must_use]
    pub const fn fade_state(&self) -> FadeState {
        self.fade
    }

    /// Fade brightness in `0.0..=1.0`.
    #[must_use]
    pub const fn fade_progress(&self) -> f32 {
        self.fade_progress
    }

    /// Tints the palette towards `kind` and decays linearly over `frames` updates.
    pub fn flash(&mut self, kind: FlashKind, frames: u32, intensity: f32) {
        let intensity = intensity.clamp(0.0, 1.0);
        self.flash = Some(Flash {
            color: kind.color(),
            intensity,
            current: intensity,
            duration: frames.max(1),
            frame: 0,
        });
        self.apply_effects();
    }

    /// Cancels any flash.
    pub fn stop_flash(&mut self) {
        if self.flash.take().is_some() {
            self.apply_effects();
        }
    }

    /// Returns `true` while a flash is decaying.
    #[must_use]
    pub const fn is_flashing(&self) -> bool {
        self.flash.is_some()
    }

    /// Adds a cycling range. Duplicate starts and ranges past the limit are ignored.
    pub fn add_animation_range(&mut self, range: AnimationRange) -> bool {
        let fits = usize::from(range.start) + usize::from(range.count) <= PALETTE_SIZE;
        if !fits
            || self.animations.len() >= MAX_ANIMATION_RANGES
            || self.animations.iter().any(|r| r.start == range.start)
        {
            return false;
        }
        self.animations.push(range);
        true
    }

    /// Removes the cycling range starting at `start`.
    pub fn remove_animation_range(&mut self, start: u8) {
        self.animations.retain(|range| range.start != start);
    }

    /// Active cycling ranges.
    #[must_use]
    pub fn animation_ranges(&self) -> &[AnimationRange] {
        &self.animations
    }

    /// Enables or disables the water and fire cycles.
    pub fn set_standard_animations(&mut self, enabled: bool) {
        if enabled {
            let _ = self.add_animation_range(AnimationRange::WATER);
            let _ = self.add_animation_range(AnimationRange::FIRE);
        } else {
            self.remove_animation_range(AnimationRange::WATER.start);
            self.remove_animation_range(AnimationRange::FIRE.start);
        }
    }

    /// Advances every effect by one tick.
    ///
    /// Does nothing when no effect is active.
    pub fn update(&mut self) {
        let mut dirty = false;

        match self.fade {
            FadeState::FadingIn => {
                self.fade_elapsed += 1;
                if self.fade_elapsed >= self.fade_frames {
                    self.fade_progress = 1.0;
                    self.fade = FadeState::None;
                } else {
                    self.fade_progress = self.fade_elapsed as f32 / self.fade_frames as f32;
                }
                dirty = true;
            }
            FadeState::FadingOut => {
                self.fade_elapsed += 1;
                if self.fade_elapsed >= self.fade_frames {
                    self.fade_progress = 0.0;
                    self.fade = FadeState::FadedOut;
                } else {
                    self.fade_progress = 1.0 - self.fade_elapsed as f32 / self.fade_frames as f32;
                }
                dirty = true;
            }
            FadeState::None | FadeState::FadedOut => {}
        }

        if let Some(flash) = self.flash.as_mut() {
            flash.frame += 1;
            let progress = flash.frame as f32 / flash.duration as f32;
            flash.current = flash.intensity * (1.0 - progress);
            if flash.frame >= flash.duration {
                self.flash = None;
            }
            dirty = true;
        }

        for range in &mut self.animations {
            range.counter += 1;
            if range.counter >= range.delay {
                range.counter = 0;
                self.base
                    .rotate_forward(usize::from(range.start), usize::from(range.count));
                dirty = true;
            }
        }

        if dirty {
            self.apply_effects();
        }
    }

    /// Returns `true` once after the current palette changed.
    pub fn take_changed(&mut self) -> bool {
        std::mem::take(&mut self.changed)
    }

    fn apply_effects(&mut self) {
        let mut current = self.base.clone();
        if self.fade_progress < 1.0 {
            for (index, color) in current.colors.iter_mut().enumerate() {
                if !PROTECTED_RANGE.contains(&index) {
                    *color = color.scaled(self.fade_progress);
                }
            }
        }
        if let Some(flash) = self.flash.filter(|flash| flash.current > 0.0) {
            for color in current.colors.iter_mut().skip(1) {
                *color = color.lerp(flash.color, flash.current);
            }
        }
        current.colors[0] = Rgb::BLACK;
        if current != self.current {
            self.changed = true;
        }
        self.current = current;
    }
}
