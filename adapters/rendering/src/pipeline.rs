//! Per-frame orchestration of every renderer into the indexed frame buffer.
//!
//! Stages draw the full frame into a back buffer in strict layer order.
//! Compositing then copies either the dirty regions or the whole frame into
//! the front buffer, which is the only buffer ever handed to the platform.

use serde::Deserialize;
use tactica_core::{CellCoord, CursorShape, Rect, ScreenPoint, TemplateId, CELL_PIXELS};
use tracing::{debug, info, warn};

use crate::{
    AssetManifest, AssetSource, BatchStats, DirtyRectConfig, DoubleBufferedDirtyTracker,
    DrawFlags, DrawParams, DrawSource, DrawSurface, EffectTables, FrameBuffer, LockGuard,
    MouseCursor, OverlayKind, Palette, PaletteManager, PlatformSurface, RadarRenderer,
    RadarState, RenderLayer, ShapeId, ShapeRenderer, SidebarRenderer, SpriteBatch, SpriteRequest,
    SurfaceError, Theater, TileRenderer, TILE_SIZE,
};

const TAB_BAR_COLOR: u8 = 14;

/// Render pipeline settings.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Frame width in pixels.
    pub width: i32,
    /// Frame height in pixels.
    pub height: i32,
    /// Dirty-rect tracking.
    pub dirty_rects: DirtyRectConfig,
    /// Outlines dirty regions on the presented frame.
    pub debug_overlay: bool,
    /// Lets the sprite batch reorder non-overlapping requests.
    pub reorder_sprites: bool,
    /// Theater loaded at start-up.
    pub theater: Theater,
    /// Left edge of the sidebar.
    pub sidebar_x: i32,
    /// Height of the tab bar along the top.
    pub tab_height: i32,
    /// Side length of the square radar at the top of the sidebar.
    pub radar_size: i32,
    /// Shape id of the mouse cursor file.
    pub cursor_shape: u16,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 400,
            dirty_rects: DirtyRectConfig::default(),
            debug_overlay: false,
            reorder_sprites: false,
            theater: Theater::Temperate,
            sidebar_x: 480,
            tab_height: 16,
            radar_size: 128,
            cursor_shape: 0,
        }
    }
}

impl PipelineConfig {
    /// Screen area showing the map.
    #[must_use]
    pub fn tactical_area(&self) -> Rect {
        Rect::new(0, self.tab_height, self.sidebar_x, self.height - self.tab_height)
    }

    /// Screen area of the sidebar including the radar.
    #[must_use]
    pub fn sidebar_area(&self) -> Rect {
        Rect::new(
            self.sidebar_x,
            self.tab_height,
            self.width - self.sidebar_x,
            self.height - self.tab_height,
        )
    }

    /// Screen area of the radar, centred horizontally in the sidebar.
    #[must_use]
    pub fn radar_area(&self) -> Rect {
        let sidebar = self.sidebar_area();
        let inset = ((sidebar.width() - self.radar_size) / 2).max(0);
        Rect::new(sidebar.x() + inset, sidebar.y(), self.radar_size, self.radar_size)
    }
}

/// Where the pipeline is inside a frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FrameStage {
    /// Between frames.
    #[default]
    Idle,
    /// Surface locked, palette ticked.
    Begun,
    /// Map tiles drawn.
    Terrain,
    /// Shadows drawn.
    Shadow,
    /// Units and buildings drawn.
    Object,
    /// Effects drawn.
    Effect,
    /// Sidebar, radar and tab bar drawn.
    Ui,
    /// Pointer drawn.
    Cursor,
    /// Front buffer updated.
    Composited,
    /// Frame handed to the platform, successfully or not.
    Flipped,
}

/// One map cell as the terrain stage sees it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TerrainCell {
    /// Template drawn under the cell.
    pub template: TemplateId,
    /// Icon within the template.
    pub icon: u8,
    /// Wall, ore or crate drawn over the tile.
    pub overlay: Option<(OverlayKind, usize)>,
}

/// Everything the pipeline needs to draw one frame.
pub struct FrameScene<'a> {
    /// World pixel shown at the top-left of the tactical area.
    pub view_origin: ScreenPoint,
    /// Terrain lookup; `None` outside the map.
    pub terrain: &'a dyn Fn(CellCoord) -> Option<TerrainCell>,
    /// Sprites in screen coordinates.
    pub sprites: &'a [SpriteRequest],
    /// Pointer position and shape; `None` hides it.
    pub cursor: Option<(ScreenPoint, CursorShape)>,
}

/// Result of one [`RenderPipeline::render_frame`] call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameReport {
    /// Frame counter after this frame.
    pub frame: u64,
    /// `true` when the platform accepted the flip.
    pub presented: bool,
    /// Surface failure that skipped the visible update.
    pub error: Option<SurfaceError>,
    /// The whole frame was copied instead of dirty regions.
    pub full_redraw: bool,
    /// Regions composited.
    pub dirty_rects: usize,
    /// Tiles and sprites drawn.
    pub draw_calls: usize,
    /// Sprite batch counters.
    pub batch: BatchStats,
}

/// Running totals.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Frames whose flip succeeded.
    pub frames_rendered: u64,
    /// Frames dropped by a lock or flip failure.
    pub frames_skipped: u64,
    /// Tiles and sprites drawn over the pipeline's life.
    pub draw_calls: u64,
}

/// Owns every renderer and the frame buffers.
pub struct RenderPipeline {
    config: PipelineConfig,
    back: FrameBuffer,
    front: FrameBuffer,
    palette: PaletteManager,
    effects: EffectTables,
    tiles: TileRenderer,
    shapes: ShapeRenderer,
    batch: SpriteBatch,
    dirty: DoubleBufferedDirtyTracker,
    sidebar: SidebarRenderer,
    radar: RadarRenderer,
    cursor: MouseCursor,
    stage: FrameStage,
    stats: FrameStats,
    frame: u64,
    last_origin: Option<ScreenPoint>,
    palette_uploaded: bool,
}

impl RenderPipeline {
    /// Creates a pipeline with the standard palette and nothing loaded.
    #[must_use]
    pub fn new(config: PipelineConfig) -> Self {
        let palette = Palette::standard();
        let effects = EffectTables::build(&palette);
        let sidebar = SidebarRenderer::new(config.sidebar_area(), config.radar_size + 8);
        let radar = RadarRenderer::new(config.radar_area());
        info!(
            width = config.width,
            height = config.height,
            dirty_rects = config.dirty_rects.enabled,
            "render pipeline created"
        );
        Self {
            back: FrameBuffer::new(config.width, config.height),
            front: FrameBuffer::new(config.width, config.height),
            palette: PaletteManager::new(palette),
            effects,
            tiles: TileRenderer::new(),
            shapes: ShapeRenderer::new(),
            batch: SpriteBatch::new(config.reorder_sprites),
            dirty: DoubleBufferedDirtyTracker::new(
                config.dirty_rects,
                config.width,
                config.height,
            ),
            sidebar,
            radar,
            cursor: MouseCursor::new(ShapeId::new(config.cursor_shape)),
            stage: FrameStage::Idle,
            stats: FrameStats::default(),
            frame: 0,
            last_origin: None,
            palette_uploaded: false,
            config,
        }
    }

    /// Active settings.
    #[must_use]
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Current stage; [`FrameStage::Idle`] between frames.
    #[must_use]
    pub const fn stage(&self) -> FrameStage {
        self.stage
    }

    /// Running totals.
    #[must_use]
    pub const fn stats(&self) -> FrameStats {
        self.stats
    }

    /// Buffer last handed to the platform.
    #[must_use]
    pub const fn front_buffer(&self) -> &FrameBuffer {
        &self.front
    }

    /// Palette effects.
    pub fn palette_mut(&mut self) -> &mut PaletteManager {
        &mut self.palette
    }

    /// Palette effects.
    #[must_use]
    pub const fn palette(&self) -> &PaletteManager {
        &self.palette
    }

    /// Shape cache and loader.
    pub fn shapes_mut(&mut self) -> &mut ShapeRenderer {
        &mut self.shapes
    }

    /// Tile cache and loader.
    pub fn tiles_mut(&mut self) -> &mut TileRenderer {
        &mut self.tiles
    }

    /// Production sidebar.
    pub fn sidebar_mut(&mut self) -> &mut SidebarRenderer {
        &mut self.sidebar
    }

    /// Minimap.
    pub fn radar_mut(&mut self) -> &mut RadarRenderer {
        &mut self.radar
    }

    /// Software pointer.
    pub fn cursor_mut(&mut self) -> &mut MouseCursor {
        &mut self.cursor
    }

    /// Switches theater: palette, effect tables and tile set.
    ///
    /// A missing palette keeps the current colours; missing templates draw
    /// placeholders.
    pub fn set_theater<A>(&mut self, theater: Theater, manifest: &AssetManifest, assets: &A) -> usize
    where
        A: AssetSource + ?Sized,
    {
        let palette_name = manifest.palette_for(theater);
        match assets
            .read(palette_name)
            .and_then(|bytes| Palette::from_vga(palette_name, &bytes))
        {
            Ok(palette) => {
                self.palette.set_theater_palette(theater, &palette);
                self.effects = EffectTables::build(self.palette.base());
            }
            Err(error) => warn!(theater = theater.name(), %error, "theater palette unavailable"),
        }
        let loaded = self
            .tiles
            .set_theater(theater, manifest.extension_for(theater), assets);
        self.shapes.clear_cache();
        self.dirty.mark_full_redraw();
        debug!(theater = theater.name(), templates = loaded, "theater switched");
        loaded
    }

    /// Loads every shape the manifest lists. Returns how many loaded.
    pub fn load_shapes<A>(&mut self, manifest: &AssetManifest, assets: &A) -> usize
    where
        A: AssetSource + ?Sized,
    {
        let mut loaded = 0;
        for (id, name) in manifest.shape_ids() {
            match self.shapes.load_from(id, name, assets) {
                Ok(()) => loaded += 1,
                Err(error) => warn!(shape = id.get(), %error, "shape not loaded"),
            }
        }
        loaded
    }

    /// Marks a screen region as changed outside the pipeline's knowledge.
    pub fn invalidate(&mut self, rect: Rect) {
        self.dirty.mark_dirty(rect);
    }

    /// Redraws the whole screen next frame.
    pub fn invalidate_all(&mut self) {
        self.dirty.mark_full_redraw();
    }

    /// Changes the frame size; the next frame is a full redraw.
    pub fn resize(&mut self, width: i32, height: i32) {
        self.config.width = width;
        self.config.height = height;
        self.back = FrameBuffer::new(width, height);
        self.front = FrameBuffer::new(width, height);
        self.dirty.resize(width, height);
        self.sidebar = SidebarRenderer::new(self.config.sidebar_area(), self.config.radar_size + 8);
        let mut radar = RadarRenderer::new(self.config.radar_area());
        radar.set_state(self.radar.state());
        self.radar = radar;
        debug!(width, height, "render pipeline resized");
    }

    /// Draws and presents one frame.
    ///
    /// A lock or flip failure skips the visible update; the frame still ends
    /// and the surface is always unlocked.
    pub fn render_frame(
        &mut self,
        scene: &FrameScene<'_>,
        surface: &mut dyn PlatformSurface,
    ) -> FrameReport {
        self.frame += 1;
        let mut guard = match self.begin_frame(surface) {
            Ok(guard) => guard,
            Err(error) => {
                warn!(frame = self.frame, %error, "surface lock failed, frame skipped");
                self.stats.frames_skipped += 1;
                self.batch.clear();
                self.stage = FrameStage::Idle;
                return self.report(false, Some(error), false, 0, 0, BatchStats::default());
            }
        };

        if self.palette.take_changed() || !self.palette_uploaded {
            guard.set_palette(self.palette.current());
            self.palette_uploaded = true;
        }

        if self.last_origin != Some(scene.view_origin) {
            self.dirty.mark_full_redraw();
            self.last_origin = Some(scene.view_origin);
        }

        for request in scene.sprites {
            if let Some(bounds) = request_bounds(&self.shapes, request) {
                self.dirty.mark_dirty(bounds);
            }
            self.batch.push(*request);
        }
        let groups = self.batch.plan(|request| request_bounds(&self.shapes, request));

        let mut draw_calls = self.draw_terrain(scene);
        self.stage = FrameStage::Terrain;
        draw_calls += self.draw_layer(RenderLayer::Terrain);
        draw_calls += self.draw_layer(RenderLayer::Shadow);
        self.stage = FrameStage::Shadow;
        draw_calls += self.draw_layer(RenderLayer::Object);
        self.stage = FrameStage::Object;
        draw_calls += self.draw_layer(RenderLayer::Effect);
        self.stage = FrameStage::Effect;
        self.draw_ui();
        draw_calls += self.draw_layer(RenderLayer::Ui);
        self.stage = FrameStage::Ui;
        draw_calls += self.draw_layer(RenderLayer::Cursor);
        self.draw_cursor(scene.cursor);
        self.stage = FrameStage::Cursor;
        let batch = self.batch.finish(groups.len());

        let (full_redraw, dirty_rects) = self.composite();
        self.stage = FrameStage::Composited;

        let flipped = guard.flip(&self.front);
        self.stage = FrameStage::Flipped;
        drop(guard);

        self.end_frame();
        self.stats.draw_calls += draw_calls as u64;
        match flipped {
            Ok(()) => {
                self.stats.frames_rendered += 1;
                self.report(true, None, full_redraw, dirty_rects, draw_calls, batch)
            }
            Err(error) => {
                warn!(frame = self.frame, %error, "flip failed, frame skipped");
                self.stats.frames_skipped += 1;
                self.report(false, Some(error), full_redraw, dirty_rects, draw_calls, batch)
            }
        }
    }

    fn begin_frame<'s>(
        &mut self,
        surface: &'s mut dyn PlatformSurface,
    ) -> Result<LockGuard<'s, dyn PlatformSurface + 's>, SurfaceError> {
        let guard = LockGuard::acquire(surface)?;
        let lock = guard.lock();
        if lock.width != self.config.width || lock.height != self.config.height {
            return Err(SurfaceError::SizeMismatch {
                expected_width: self.config.width,
                expected_height: self.config.height,
                actual_width: lock.width,
                actual_height: lock.height,
            });
        }
        self.palette.update();
        self.stage = FrameStage::Begun;
        Ok(guard)
    }

    fn draw_terrain(&mut self, scene: &FrameScene<'_>) -> usize {
        let area = self.config.tactical_area();
        let origin = scene.view_origin;
        let first = CellCoord::new(
            origin.x().div_euclid(CELL_PIXELS),
            origin.y().div_euclid(CELL_PIXELS),
        );
        let last = CellCoord::new(
            (origin.x() + area.width() - 1).div_euclid(CELL_PIXELS),
            (origin.y() + area.height() - 1).div_euclid(CELL_PIXELS),
        );
        let mut drawn = 0;
        for row in first.row()..=last.row() {
            for column in first.column()..=last.column() {
                let cell = CellCoord::new(column, row);
                let x = area.x() + column * CELL_PIXELS - origin.x();
                let y = area.y() + row * CELL_PIXELS - origin.y();
                let seed = (row as u32).wrapping_mul(1024).wrapping_add(column as u32);
                match (scene.terrain)(cell) {
                    Some(terrain) => {
                        let _ = self
                            .tiles
                            .draw_tile(&mut self.back, x, y, terrain.template, terrain.icon, seed);
                        if let Some((overlay, frame)) = terrain.overlay {
                            let _ = self.tiles.draw_overlay(&mut self.back, x, y, overlay, frame);
                        }
                    }
                    None => self.back.fill_rect(Rect::new(x, y, TILE_SIZE, TILE_SIZE), 0),
                }
                drawn += 1;
            }
        }
        drawn
    }

    fn draw_layer(&mut self, layer: RenderLayer) -> usize {
        let clip = match layer {
            RenderLayer::Ui | RenderLayer::Cursor => self.back.bounds(),
            _ => self.config.tactical_area(),
        };
        let mut drawn = 0;
        for request in self.batch.requests().iter().filter(|r| r.layer == layer) {
            if draw_request(
                &mut self.back,
                &mut self.shapes,
                &mut self.tiles,
                &self.effects,
                clip,
                request,
            ) {
                drawn += 1;
            }
        }
        drawn
    }

    fn draw_ui(&mut self) {
        let tab_bar = Rect::new(0, 0, self.config.width, self.config.tab_height);
        self.back.fill_rect(tab_bar, TAB_BAR_COLOR);
        if self.sidebar.take_dirty() {
            self.dirty.mark_dirty(self.sidebar.area());
        }
        self.sidebar.draw(&mut self.back, &mut self.shapes);
        self.radar.update();
        self.radar.draw(&mut self.back);
        if self.radar.state() != RadarState::Disabled {
            self.dirty.mark_dirty(self.radar.area());
        }
    }

    fn draw_cursor(&mut self, cursor: Option<(ScreenPoint, CursorShape)>) {
        let Some((position, shape)) = cursor else {
            return;
        };
        self.cursor.set_shape(shape);
        self.cursor.update();
        if let Some(bounds) = self.cursor.draw(&mut self.back, &mut self.shapes, position) {
            self.dirty.mark_dirty(bounds);
        }
    }

    fn composite(&mut self) -> (bool, usize) {
        let regions = self.dirty.frame_rects();
        let full = !self.config.dirty_rects.enabled || regions.is_full_redraw();
        let count = if full {
            self.front.copy_region(&self.back, self.back.bounds());
            1
        } else {
            for rect in regions.rects() {
                self.front.copy_region(&self.back, *rect);
            }
            regions.rects().len()
        };
        if self.config.debug_overlay {
            regions.draw_debug_overlay(&mut self.front);
        }
        (full, count)
    }

    fn end_frame(&mut self) {
        self.dirty.end_frame();
        self.stage = FrameStage::Idle;
    }

    fn report(
        &self,
        presented: bool,
        error: Option<SurfaceError>,
        full_redraw: bool,
        dirty_rects: usize,
        draw_calls: usize,
        batch: BatchStats,
    ) -> FrameReport {
        FrameReport {
            frame: self.frame,
            presented,
            error,
            full_redraw,
            dirty_rects,
            draw_calls,
            batch,
        }
    }
}

/// Screen area a queued request covers.
fn request_bounds(shapes: &ShapeRenderer, request: &SpriteRequest) -> Option<Rect> {
    match request.source {
        DrawSource::Shape(id) => shapes.bounds(
            id,
            request.position.x(),
            request.position.y(),
            request.flags,
        ),
        DrawSource::Tile(_) => Some(Rect::new(
            request.position.x(),
            request.position.y(),
            TILE_SIZE,
            TILE_SIZE,
        )),
    }
}

fn draw_request(
    surface: &mut FrameBuffer,
    shapes: &mut ShapeRenderer,
    tiles: &mut TileRenderer,
    effects: &EffectTables,
    clip: Rect,
    request: &SpriteRequest,
) -> bool {
    let (x, y) = (request.position.x(), request.position.y());
    match request.source {
        DrawSource::Tile(template) => {
            let icon = u8::try_from(request.frame).unwrap_or(0);
            let seed = (x as u32) ^ (y as u32).rotate_left(16);
            let _ = tiles.draw_tile(surface, x, y, template, icon, seed);
            true
        }
        DrawSource::Shape(id) => {
            let flags = request.flags;
            let mut params = DrawParams::new()
                .with_flags(flags)
                .with_clip(clip)
                .with_phase(request.param);
            if flags.contains(DrawFlags::SHADOW) {
                params = params.with_remap(&effects.shadow);
            } else if flags.contains(DrawFlags::FADING) {
                params = params.with_remap(effects.fade_level(usize::from(request.param)));
            } else if let Some(house) = request.remap {
                params = params.with_remap(effects.house(house));
            }
            if flags.contains(DrawFlags::FLAT) {
                params = params.with_flat_color(request.param);
            }
            shapes.draw(surface, id, request.frame, x, y, &params)
        }
    }
}
