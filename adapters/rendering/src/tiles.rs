//! Opaque 24x24 terrain tiles and transparent cell overlays.

use std::collections::BTreeMap;

use tactica_core::{LandType, Rect, TemplateId, CELL_PIXELS};
use tracing::{info, warn};

use crate::{AssetError, AssetSource, DrawSurface, Theater};

/// Edge length of a tile in pixels.
pub const TILE_SIZE: i32 = CELL_PIXELS;
/// Bytes of pixel data in one tile.
pub const TILE_BYTES: usize = (TILE_SIZE * TILE_SIZE) as usize;
/// Palette index filled when not even a clear tile is available.
pub const MISSING_TILE_COLOR: u8 = 21;

/// Clear-ground variants a placeholder tile picks from.
pub const CLEAR_VARIANTS: u32 = 4;

/// Built-in terrain template.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TemplateInfo {
    /// Id maps refer to.
    pub id: TemplateId,
    /// Base file name; the theater supplies the extension.
    pub name: &'static str,
    /// Land type of every icon in the template.
    pub land: LandType,
}

const fn template(id: u16, name: &'static str, land: LandType) -> TemplateInfo {
    TemplateInfo {
        id: TemplateId::new(id),
        name,
        land,
    }
}

/// Every built-in template, indexed by id.
pub const TEMPLATES: [TemplateInfo; 18] = [
    template(0, "CLEAR1", LandType::Clear),
    template(1, "W1", LandType::Water),
    template(2, "W2", LandType::Water),
    template(3, "SH1", LandType::Beach),
    template(4, "SH2", LandType::Beach),
    template(5, "SH3", LandType::Beach),
    template(6, "SH4", LandType::Beach),
    template(7, "SH5", LandType::Beach),
    template(8, "SH6", LandType::Beach),
    template(9, "SH7", LandType::Beach),
    template(10, "SH8", LandType::Beach),
    template(11, "CL1", LandType::Rock),
    template(12, "CL2", LandType::Rock),
    template(13, "RD01", LandType::Road),
    template(14, "RD02", LandType::Road),
    template(15, "RD03", LandType::Road),
    template(16, "RG01", LandType::Rough),
    template(17, "RG02", LandType::Rough),
];

/// Looks up a built-in template.
#[must_use]
pub fn template_info(id: TemplateId) -> Option<&'static TemplateInfo> {
    TEMPLATES.get(usize::from(id.get()))
}

/// Land type of a template icon; unknown templates count as clear.
#[must_use]
pub fn land_type(id: TemplateId) -> LandType {
    template_info(id).map_or(LandType::Clear, |info| info.land)
}

/// Transparent decorations drawn over terrain cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OverlayKind {
    /// Sandbag wall.
    SandbagWall,
    /// Chain-link wall.
    CycloneWall,
    /// Concrete wall.
    BrickWall,
    /// Barbed wire.
    BarbedWire,
    /// Wooden wall.
    WoodWall,
    /// Ore field, sparse to dense.
    Gold(u8),
    /// Gem field, sparse to dense.
    Gems(u8),
    /// Wooden fence.
    WoodFence,
    /// Capture-the-flag marker.
    Flag,
}

impl OverlayKind {
    /// Asset name of the overlay frames.
    #[must_use]
    pub fn asset_name(&self) -> String {
        match self {
            Self::SandbagWall => "SBAG.SHP".to_owned(),
            Self::CycloneWall => "CYCL.SHP".to_owned(),
            Self::BrickWall => "BRIK.SHP".to_owned(),
            Self::BarbedWire => "BARB.SHP".to_owned(),
            Self::WoodWall => "WOOD.SHP".to_owned(),
            Self::Gold(density) => format!("GOLD{:02}.SHP", (*density).clamp(1, 4)),
            Self::Gems(density) => format!("GEM{:02}.SHP", (*density).clamp(1, 4)),
            Self::WoodFence => "FENC.SHP".to_owned(),
            Self::Flag => "FLAGFLY.SHP".to_owned(),
        }
    }
}

/// How a tile request was satisfied.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TileOutcome {
    /// The requested icon was drawn.
    Drawn,
    /// A clear-ground variant stood in for a missing template or icon.
    ClearPlaceholder,
    /// Nothing was loaded, so the cell was filled with [`MISSING_TILE_COLOR`].
    SolidPlaceholder,
}

/// Cache and draw counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TileCacheStats {
    /// Templates currently decoded.
    pub templates_loaded: usize,
    /// Overlays currently decoded.
    pub overlays_loaded: usize,
    /// Bytes of pixel data held.
    pub bytes: usize,
    /// Tiles drawn from their template.
    pub tiles_drawn: u64,
    /// Tiles replaced by a placeholder.
    pub placeholders_drawn: u64,
}

#[derive(Clone, Debug)]
struct TileSet {
    pixels: Vec<u8>,
}

impl TileSet {
    fn decode(name: &str, bytes: Vec<u8>) -> Result<Self, AssetError> {
        if bytes.is_empty() || bytes.len() % TILE_BYTES != 0 {
            return Err(AssetError::MalformedTiles {
                name: name.to_owned(),
                reason: format!("{} bytes is not a whole number of tiles", bytes.len()),
            });
        }
        Ok(Self { pixels: bytes })
    }

    fn count(&self) -> usize {
        self.pixels.len() / TILE_BYTES
    }

    fn tile(&self, icon: usize) -> Option<&[u8]> {
        self.pixels.get(icon * TILE_BYTES..(icon + 1) * TILE_BYTES)
    }
}

/// Draws terrain for one theater at a time.
#[derive(Clone, Debug, Default)]
pub struct TileRenderer {
    theater: Option<Theater>,
    templates: BTreeMap<TemplateId, TileSet>,
    overlays: BTreeMap<OverlayKind, TileSet>,
    tiles_drawn: u64,
    placeholders_drawn: u64,
}

impl TileRenderer {
    /// Creates a renderer with nothing loaded.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Theater whose tiles are loaded.
    #[must_use]
    pub const fn theater(&self) -> Option<Theater> {
        self.theater
    }

    /// Loads every built-in template of `theater`, evicting the previous theater.
    ///
    /// Templates missing from `assets` are skipped; cells using them draw a
    /// placeholder. Returns the number of templates loaded.
    pub fn set_theater<A>(&mut self, theater: Theater, extension: &str, assets: &A) -> usize
    where
        A: AssetSource + ?Sized,
    {
        if self.theater == Some(theater) {
            return self.templates.len();
        }
        self.clear_cache();
        for info in &TEMPLATES {
            let name = format!("{}{}", info.name, extension);
            match assets.read(&name).and_then(|bytes| TileSet::decode(&name, bytes)) {
                Ok(set) => {
                    let _ = self.templates.insert(info.id, set);
                }
                Err(error) => warn!(template = info.name, %error, "terrain template unavailable"),
            }
        }
        self.theater = Some(theater);
        info!(
            theater = theater.name(),
            templates = self.templates.len(),
            "theater tiles loaded"
        );
        self.templates.len()
    }

    /// Loads an overlay's frames. Returns `false` when the asset is unusable.
    pub fn load_overlay<A>(&mut self, overlay: OverlayKind, assets: &A) -> bool
    where
        A: AssetSource + ?Sized,
    {
        let name = overlay.asset_name();
        match assets.read(&name).and_then(|bytes| TileSet::decode(&name, bytes)) {
            Ok(set) => {
                let _ = self.overlays.insert(overlay, set);
                true
            }
            Err(error) => {
                warn!(overlay = %name, %error, "overlay unavailable");
                false
            }
        }
    }

    /// Returns `true` when the template is loaded.
    #[must_use]
    pub fn has_template(&self, id: TemplateId) -> bool {
        self.templates.contains_key(&id)
    }

    /// Number of icons in a loaded template.
    #[must_use]
    pub fn icon_count(&self, id: TemplateId) -> usize {
        self.templates.get(&id).map_or(0, TileSet::count)
    }

    /// Draws one opaque tile with its top-left corner at `(x, y)`.
    ///
    /// Unknown templates or icons never fail: a clear variant chosen from
    /// `seed` is drawn instead, or a solid fill when clear ground is missing too.
    pub fn draw_tile<S>(
        &mut self,
        surface: &mut S,
        x: i32,
        y: i32,
        template: TemplateId,
        icon: u8,
        seed: u32,
    ) -> TileOutcome
    where
        S: DrawSurface + ?Sized,
    {
        if let Some(pixels) = self
            .templates
            .get(&template)
            .and_then(|set| set.tile(usize::from(icon)))
        {
            blit(surface, x, y, pixels, false);
            self.tiles_drawn += 1;
            return TileOutcome::Drawn;
        }
        self.placeholders_drawn += 1;
        self.draw_clear(surface, x, y, seed)
    }

    /// Draws a clear-ground variant chosen from `seed`.
    pub fn draw_clear<S>(&self, surface: &mut S, x: i32, y: i32, seed: u32) -> TileOutcome
    where
        S: DrawSurface + ?Sized,
    {
        let variation = seed.wrapping_mul(2_654_435_761) % CLEAR_VARIANTS;
        let clear = self.templates.get(&TemplateId::CLEAR).filter(|set| set.count() > 0).and_then(|set| {
            let icon = variation as usize % set.count();
            set.tile(icon)
        });
        match clear {
            Some(pixels) => {
                blit(surface, x, y, pixels, false);
                TileOutcome::ClearPlaceholder
            }
            None => {
                surface.fill_rect(Rect::new(x, y, TILE_SIZE, TILE_SIZE), MISSING_TILE_COLOR);
                TileOutcome::SolidPlaceholder
            }
        }
    }

    /// Draws an overlay frame with index-0 transparency.
    ///
    /// Returns `false` when the overlay is not loaded. Out-of-range frames draw frame 0.
    pub fn draw_overlay<S>(
        &self,
        surface: &mut S,
        x: i32,
        y: i32,
        overlay: OverlayKind,
        frame: usize,
    ) -> bool
    where
        S: DrawSurface + ?Sized,
    {
        let Some(set) = self.overlays.get(&overlay) else {
            return false;
        };
        let frame = if frame < set.count() { frame } else { 0 };
        match set.tile(frame) {
            Some(pixels) => {
                blit(surface, x, y, pixels, true);
                true
            }
            None => false,
        }
    }

    /// Frees every decoded template and overlay.
    pub fn clear_cache(&mut self) {
        self.templates.clear();
        self.overlays.clear();
        self.theater = None;
    }

    /// Cache and draw counters.
    #[must_use]
    pub fn stats(&self) -> TileCacheStats {
        let bytes = self
            .templates
            .values()
            .chain(self.overlays.values())
            .map(|set| set.pixels.len())
            .sum();
        TileCacheStats {
            templates_loaded: self.templates.len(),
            overlays_loaded: self.overlays.len(),
            bytes,
            tiles_drawn: self.tiles_drawn,
            placeholders_drawn: self.placeholders_drawn,
        }
    }
}

fn blit<S>(surface: &mut S, x: i32, y: i32, pixels: &[u8], transparent: bool)
where
    S: DrawSurface + ?Sized,
{
    let width = surface.width();
    let height = surface.height();
    if x >= width || y >= height || x + TILE_SIZE <= 0 || y + TILE_SIZE <= 0 {
        return;
    }
    for (row, line) in pixels.chunks_exact(TILE_SIZE as usize).enumerate() {
        let dy = y + row as i32;
        if dy < 0 || dy >= height {
            continue;
        }
        for (column, &color) in line.iter().enumerate() {
            if transparent && color == 0 {
                continue;
            }
            surface.set_pixel(x + column as i32, dy, color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FrameBuffer, MemoryAssets};

    fn assets() -> MemoryAssets {
        let mut clear = vec![0u8; TILE_BYTES * 4];
        for (variant, tile) in clear.chunks_exact_mut(TILE_BYTES).enumerate() {
            tile.fill(100 + variant as u8);
        }
        MemoryAssets::new()
            .with_asset("CLEAR1.TMP", clear)
            .with_asset("W1.TMP", vec![40; TILE_BYTES * 2])
            .with_asset("RD01.TMP", vec![1, 2, 3])
    }

    #[test]
    fn theater_load_skips_missing_and_malformed_templates() {
        let mut tiles = TileRenderer::new();
        let loaded = tiles.set_theater(Theater::Temperate, ".TMP", &assets());
        assert_eq!(loaded, 2, "only CLEAR1 and W1 decode");
        assert!(!tiles.has_template(TemplateId::new(13)), "RD01 is truncated");
        assert_eq!(tiles.icon_count(TemplateId::new(1)), 2);
        assert_eq!(tiles.stats().bytes, TILE_BYTES * 6);
    }

    #[test]
    fn known_tiles_are_drawn_opaquely() {
        let mut tiles = TileRenderer::new();
        let _ = tiles.set_theater(Theater::Temperate, ".TMP", &assets());
        let mut buffer = FrameBuffer::new(48, 48);
        let outcome = tiles.draw_tile(&mut buffer, 24, 0, TemplateId::new(1), 1, 0);
        assert_eq!(outcome, TileOutcome::Drawn);
        assert_eq!(buffer.pixel(24, 0), Some(40));
        assert_eq!(buffer.pixel(47, 23), Some(40));
        assert_eq!(buffer.pixel(23, 0), Some(0));
    }

    #[test]
    fn missing_icon_falls_back_to_a_seeded_clear_variant() {
        let mut tiles = TileRenderer::new();
        let _ = tiles.set_theater(Theater::Temperate, ".TMP", &assets());
        let mut buffer = FrameBuffer::new(24, 24);
        let outcome = tiles.draw_tile(&mut buffer, 0, 0, TemplateId::new(1), 9, 3);
        assert_eq!(outcome, TileOutcome::ClearPlaceholder);
        let variant = 3u32.wrapping_mul(2_654_435_761) % 4;
        assert_eq!(buffer.pixel(5, 5), Some(100 + variant as u8));
        assert_eq!(tiles.stats().placeholders_drawn, 1);
    }

    #[test]
    fn without_clear_ground_the_cell_is_filled() {
        let mut tiles = TileRenderer::new();
        let mut buffer = FrameBuffer::new(30, 30);
        let outcome = tiles.draw_tile(&mut buffer, -4, -4, TemplateId::new(5), 0, 1);
        assert_eq!(outcome, TileOutcome::SolidPlaceholder);
        assert_eq!(buffer.pixel(0, 0), Some(MISSING_TILE_COLOR));
        assert_eq!(buffer.pixel(20, 20), Some(0), "the fill is clipped to the tile");
    }

    #[test]
    fn switching_theater_evicts_the_previous_tiles() {
        let mut tiles = TileRenderer::new();
        let _ = tiles.set_theater(Theater::Temperate, ".TMP", &assets());
        let loaded = tiles.set_theater(Theater::Snow, ".SNO", &assets());
        assert_eq!(loaded, 0, "no snow templates are available");
        assert_eq!(tiles.theater(), Some(Theater::Snow));
        assert_eq!(tiles.stats().templates_loaded, 0);
    }

    #[test]
    fn overlays_keep_transparent_pixels() {
        let mut frame = vec![0u8; TILE_BYTES];
        frame[0] = 77;
        let assets = MemoryAssets::new().with_asset("GOLD02.SHP", frame);
        let mut tiles = TileRenderer::new();
        assert!(tiles.load_overlay(OverlayKind::Gold(2), &assets));
        let mut buffer = FrameBuffer::new(24, 24);
        buffer.clear(9);
        assert!(tiles.draw_overlay(&mut buffer, 0, 0, OverlayKind::Gold(2), 5));
        assert_eq!(buffer.pixel(0, 0), Some(77));
        assert_eq!(buffer.pixel(1, 0), Some(9), "index 0 lets the terrain show");
        assert!(!tiles.draw_overlay(&mut buffer, 0, 0, OverlayKind::Flag, 0));
    }

    #[test]
    fn template_table_matches_land_types() {
        assert_eq!(land_type(TemplateId::new(11)), LandType::Rock);
        assert_eq!(land_type(TemplateId::new(500)), LandType::Clear);
        assert_eq!(template_info(TemplateId::new(17)).map(|t| t.name), Some("RG02"));
    }
}
