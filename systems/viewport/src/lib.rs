#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Viewport and scroll state for the tactical map.
//!
//! The viewport maps world pixels onto the tactical area of the 640x400
//! screen. Its origin is stored in world pixels and is clamped after every
//! mutation so the visible rectangle never leaves the map. Edge scrolling,
//! keyboard scrolling and target tracking all funnel into the same clamped
//! shift, so diagonal input composes additively before clamping.

use bitflags::bitflags;
use glam::IVec2;
use serde::{Deserialize, Serialize};
use tactica_core::{
    lepton_to_pixel, pixel_to_lepton, CellCoord, Rect, ScreenPoint, ScrollEdge, WorldPoint,
    CELL_PIXELS,
};
use tracing::debug;

/// Number of viewport bookmarks the player can store.
pub const BOOKMARK_SLOTS: usize = 4;

/// Tunable geometry and scroll speeds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    /// Width of the whole game screen in pixels.
    pub screen_width: i32,
    /// Height of the whole game screen in pixels.
    pub screen_height: i32,
    /// Width of the sidebar along the right edge.
    pub sidebar_width: i32,
    /// Height of the tab bar along the top edge.
    pub tab_height: i32,
    /// Percentage multiplier applied to [`Viewport::scroll`]; 100 is normal speed.
    pub scroll_speed: i32,
    /// Width of the edge-scroll zone in pixels.
    pub edge_zone: i32,
    /// Edge-scroll speed at the inner border of the zone.
    pub edge_min_speed: i32,
    /// Edge-scroll speed at the very screen edge.
    pub edge_max_speed: i32,
    /// Frames of continuous edge scrolling until full acceleration.
    pub edge_accel_frames: i32,
    /// Pixels scrolled per frame per held scroll key.
    pub keyboard_step: i32,
    /// Multiplier applied to keyboard scrolling while fast scroll is held.
    pub fast_multiplier: i32,
    /// Distance the tracked point may drift from the view center before the view follows.
    pub tracking_dead_zone: i32,
    /// Divisor applied to the tracking offset each frame.
    pub tracking_divisor: i32,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            screen_width: 640,
            screen_height: 400,
            sidebar_width: 160,
            tab_height: 16,
            scroll_speed: 100,
            edge_zone: 16,
            edge_min_speed: 4,
            edge_max_speed: 32,
            edge_accel_frames: 30,
            keyboard_step: 16,
            fast_multiplier: 3,
            tracking_dead_zone: 100,
            tracking_divisor: 8,
        }
    }
}

impl ViewportConfig {
    /// Size of the tactical map area on screen.
    #[must_use]
    pub const fn tactical_size(&self) -> (i32, i32) {
        (
            self.screen_width - self.sidebar_width,
            self.screen_height - self.tab_height,
        )
    }
}

bitflags! {
    /// Scroll directions requested in a single frame.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct ScrollDirection: u8 {
        /// Up.
        const NORTH = 1;
        /// Down.
        const SOUTH = 2;
        /// Left.
        const WEST  = 4;
        /// Right.
        const EAST  = 8;
    }
}

impl ScrollDirection {
    /// Offset produced by scrolling `step` pixels along every requested axis.
    ///
    /// Opposing directions cancel out.
    #[must_use]
    pub fn delta(self, step: i32) -> IVec2 {
        let mut delta = IVec2::ZERO;
        if self.contains(Self::NORTH) {
            delta.y -= step;
        }
        if self.contains(Self::SOUTH) {
            delta.y += step;
        }
        if self.contains(Self::WEST) {
            delta.x -= step;
        }
        if self.contains(Self::EAST) {
            delta.x += step;
        }
        delta
    }

    /// Compass direction described by the flags, if any.
    #[must_use]
    pub fn edge(self) -> Option<ScrollEdge> {
        let delta = self.delta(1);
        ScrollEdge::from_signs(delta.x, delta.y)
    }

    /// Flags corresponding to a compass direction.
    #[must_use]
    pub const fn from_edge(edge: ScrollEdge) -> Self {
        match edge {
            ScrollEdge::North => Self::NORTH,
            ScrollEdge::NorthEast => Self::NORTH.union(Self::EAST),
            ScrollEdge::East => Self::EAST,
            ScrollEdge::SouthEast => Self::SOUTH.union(Self::EAST),
            ScrollEdge::South => Self::SOUTH,
            ScrollEdge::SouthWest => Self::SOUTH.union(Self::WEST),
            ScrollEdge::West => Self::WEST,
            ScrollEdge::NorthWest => Self::NORTH.union(Self::WEST),
        }
    }
}

/// Inclusive range of map cells touched by the visible rectangle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CellSpan {
    /// Upper-left visible cell.
    pub first: CellCoord,
    /// Number of visible columns.
    pub columns: i32,
    /// Number of visible rows.
    pub rows: i32,
}

impl CellSpan {
    /// Returns `true` when no cell is visible.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.columns <= 0 || self.rows <= 0
    }

    /// Iterates the visible cells in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = CellCoord> {
        let first = self.first;
        let columns = self.columns.max(0);
        let rows = self.rows.max(0);
        (0..rows).flat_map(move |row| {
            (0..columns).map(move |column| {
                CellCoord::new(first.column() + column, first.row() + row)
            })
        })
    }
}

/// Visible window onto the map.
#[derive(Clone, Debug)]
pub struct Viewport {
    config: ViewportConfig,
    origin: IVec2,
    visible: IVec2,
    map: IVec2,
    enabled: bool,
    edge_accel: i32,
    tracking: Option<WorldPoint>,
    bookmarks: [Option<IVec2>; BOOKMARK_SLOTS],
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(ViewportConfig::default())
    }
}

impl Viewport {
    /// Creates a viewport over an empty map at the world origin.
    #[must_use]
    pub fn new(config: ViewportConfig) -> Self {
        let (width, height) = config.tactical_size();
        Self {
            config,
            origin: IVec2::ZERO,
            visible: IVec2::new(width.max(0), height.max(0)),
            map: IVec2::ZERO,
            enabled: true,
            edge_accel: 0,
            tracking: None,
            bookmarks: [None; BOOKMARK_SLOTS],
        }
    }

    /// Configuration the viewport was created with.
    #[must_use]
    pub const fn config(&self) -> &ViewportConfig {
        &self.config
    }

    /// Defines the map bounds in world pixels and re-clamps the origin.
    pub fn set_map_size(&mut self, width: i32, height: i32) {
        self.map = IVec2::new(width.max(0), height.max(0));
        self.origin = self.clamped(self.origin);
        debug!(width = self.map.x, height = self.map.y, "viewport map size set");
    }

    /// Defines the map bounds in cells.
    pub fn set_map_cells(&mut self, columns: i32, rows: i32) {
        self.set_map_size(columns * CELL_PIXELS, rows * CELL_PIXELS);
    }

    /// Map bounds in world pixels.
    #[must_use]
    pub const fn map_size(&self) -> (i32, i32) {
        (self.map.x, self.map.y)
    }

    /// Size of the visible rectangle in world pixels.
    #[must_use]
    pub const fn visible_size(&self) -> (i32, i32) {
        (self.visible.x, self.visible.y)
    }

    /// Upper-left corner of the visible rectangle in world pixels.
    #[must_use]
    pub const fn origin(&self) -> WorldPoint {
        WorldPoint::new(self.origin.x, self.origin.y)
    }

    /// Upper-left corner of the visible rectangle in leptons.
    #[must_use]
    pub const fn origin_leptons(&self) -> (i32, i32) {
        (pixel_to_lepton(self.origin.x), pixel_to_lepton(self.origin.y))
    }

    /// Largest origin that keeps the visible rectangle on the map.
    #[must_use]
    pub fn max_origin(&self) -> WorldPoint {
        let max = (self.map - self.visible).max(IVec2::ZERO);
        WorldPoint::new(max.x, max.y)
    }

    /// Visible rectangle in world pixels.
    #[must_use]
    pub const fn visible_rect(&self) -> Rect {
        Rect::new(self.origin.x, self.origin.y, self.visible.x, self.visible.y)
    }

    /// Tactical area in screen pixels.
    #[must_use]
    pub const fn tactical_rect(&self) -> Rect {
        Rect::new(0, self.config.tab_height, self.visible.x, self.visible.y)
    }

    /// Whether scroll input is honoured.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Enables or disables scroll input. Disabling also drops edge acceleration.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.edge_accel = 0;
        }
    }

    /// Scrolls by the delta in world pixels, scaled by the configured scroll speed.
    ///
    /// Returns `true` when the origin moved.
    pub fn scroll(&mut self, dx: i32, dy: i32) -> bool {
        if !self.enabled {
            return false;
        }
        let speed = i64::from(self.config.scroll_speed);
        let scaled = |delta: i32| saturate(i64::from(delta) * speed / 100);
        self.shift(IVec2::new(scaled(dx), scaled(dy)))
    }

    /// Scrolls by a delta measured in leptons.
    pub fn scroll_leptons(&mut self, dx: i32, dy: i32) -> bool {
        self.scroll(lepton_to_pixel(dx), lepton_to_pixel(dy))
    }

    /// Places the origin at the world position, clamped to the map.
    pub fn scroll_to(&mut self, x: i32, y: i32) {
        self.origin = self.clamped(IVec2::new(x, y));
    }

    /// Places the origin at a lepton position, clamped to the map.
    pub fn set_origin_leptons(&mut self, x: i32, y: i32) {
        self.scroll_to(lepton_to_pixel(x), lepton_to_pixel(y));
    }

    /// Centers the view on the world position.
    pub fn center_on(&mut self, point: WorldPoint) {
        self.scroll_to(
            point.x() - self.visible.x / 2,
            point.y() - self.visible.y / 2,
        );
    }

    /// Centers the view on the middle of the cell.
    pub fn center_on_cell(&mut self, cell: CellCoord) {
        self.center_on(cell.center());
    }

    /// Converts a world position into screen pixels.
    #[must_use]
    pub const fn world_to_screen(&self, point: WorldPoint) -> ScreenPoint {
        ScreenPoint::new(
            point.x() - self.origin.x,
            point.y() - self.origin.y + self.config.tab_height,
        )
    }

    /// Converts a screen position into world pixels.
    #[must_use]
    pub const fn screen_to_world(&self, point: ScreenPoint) -> WorldPoint {
        WorldPoint::new(
            point.x() + self.origin.x,
            point.y() - self.config.tab_height + self.origin.y,
        )
    }

    /// Map cell beneath the screen position.
    #[must_use]
    pub const fn screen_to_cell(&self, point: ScreenPoint) -> CellCoord {
        self.screen_to_world(point).cell()
    }

    /// Returns `true` when the world rectangle overlaps the visible area.
    #[must_use]
    pub const fn is_visible(&self, area: Rect) -> bool {
        self.visible_rect().intersects(&area)
    }

    /// Returns `true` when the world position lies inside the visible area.
    #[must_use]
    pub const fn is_point_visible(&self, point: WorldPoint) -> bool {
        self.visible_rect().contains_point(point.x(), point.y())
    }

    /// Cells touched by the visible rectangle, clipped to the map.
    #[must_use]
    pub fn visible_cells(&self) -> CellSpan {
        let first = IVec2::new(
            self.origin.x.div_euclid(CELL_PIXELS),
            self.origin.y.div_euclid(CELL_PIXELS),
        )
        .max(IVec2::ZERO);
        let far = self.origin + self.visible - IVec2::ONE;
        let map_cells = IVec2::new(
            (self.map.x + CELL_PIXELS - 1) / CELL_PIXELS,
            (self.map.y + CELL_PIXELS - 1) / CELL_PIXELS,
        );
        let last = IVec2::new(far.x.div_euclid(CELL_PIXELS), far.y.div_euclid(CELL_PIXELS))
            .min(map_cells - IVec2::ONE);
        let span = (last - first + IVec2::ONE).max(IVec2::ZERO);
        CellSpan {
            first: CellCoord::new(first.x, first.y),
            columns: span.x,
            rows: span.y,
        }
    }

    /// Edge-scroll direction the screen position requests, if any.
    ///
    /// Only positions within the tactical area participate.
    #[must_use]
    pub fn edge_at(&self, screen: ScreenPoint) -> Option<ScrollEdge> {
        let (x, _) = self.edge_axes(screen)?;
        let (y, _) = self.edge_axes_vertical(screen)?;
        ScrollEdge::from_signs(x, y)
    }

    /// Returns `true` when the view can still move toward every requested direction.
    #[must_use]
    pub fn can_scroll(&self, direction: ScrollDirection) -> bool {
        let delta = direction.delta(1);
        if delta == IVec2::ZERO {
            return false;
        }
        let moved = self.clamped(self.origin + delta);
        (delta.x == 0 || moved.x != self.origin.x) && (delta.y == 0 || moved.y != self.origin.y)
    }

    /// Applies one frame of mouse edge scrolling.
    ///
    /// Speed grows from the configured minimum at the inner border of the zone
    /// to the maximum at the screen edge, and accelerates by up to half again
    /// while the cursor stays in the zone. Leaving the zone resets acceleration.
    pub fn update_edge_scroll(&mut self, screen: ScreenPoint) -> bool {
        let axes = self
            .edge_axes(screen)
            .zip(self.edge_axes_vertical(screen));
        let Some(((sign_x, depth_x), (sign_y, depth_y))) = axes else {
            self.edge_accel = 0;
            return false;
        };
        if (sign_x == 0 && sign_y == 0) || !self.enabled {
            self.edge_accel = 0;
            return false;
        }

        self.edge_accel = (self.edge_accel + 1).min(self.config.edge_accel_frames);
        let delta = IVec2::new(
            sign_x * self.edge_speed(depth_x),
            sign_y * self.edge_speed(depth_y),
        );
        self.scroll(delta.x, delta.y)
    }

    /// Current edge-scroll acceleration counter.
    #[must_use]
    pub const fn edge_acceleration(&self) -> i32 {
        self.edge_accel
    }

    /// Applies one frame of keyboard scrolling.
    pub fn update_keyboard_scroll(&mut self, direction: ScrollDirection, fast: bool) -> bool {
        let mut step = self.config.keyboard_step;
        if fast {
            step *= self.config.fast_multiplier;
        }
        let delta = direction.delta(step);
        if delta == IVec2::ZERO {
            return false;
        }
        self.scroll(delta.x, delta.y)
    }

    /// Starts following the world position.
    pub fn track(&mut self, target: WorldPoint) {
        self.tracking = Some(target);
    }

    /// Stops following any target.
    pub fn stop_tracking(&mut self) {
        self.tracking = None;
    }

    /// Position currently followed, if any.
    #[must_use]
    pub const fn tracking(&self) -> Option<WorldPoint> {
        self.tracking
    }

    /// Moves the view toward the tracked position once it leaves the dead zone.
    pub fn update_tracking(&mut self) -> bool {
        let Some(target) = self.tracking else {
            return false;
        };
        if !self.enabled {
            return false;
        }
        let center = self.origin + self.visible / 2;
        let offset = IVec2::new(target.x(), target.y()) - center;
        let step = IVec2::new(self.tracking_step(offset.x), self.tracking_step(offset.y));
        if step == IVec2::ZERO {
            return false;
        }
        self.shift(step)
    }

    /// Stores the current origin in a bookmark slot.
    pub fn save_bookmark(&mut self, slot: usize) -> bool {
        match self.bookmarks.get_mut(slot) {
            Some(entry) => {
                *entry = Some(self.origin);
                debug!(slot, x = self.origin.x, y = self.origin.y, "bookmark saved");
                true
            }
            None => false,
        }
    }

    /// Restores the origin stored in a bookmark slot.
    pub fn recall_bookmark(&mut self, slot: usize) -> bool {
        let Some(origin) = self.bookmarks.get(slot).copied().flatten() else {
            return false;
        };
        self.stop_tracking();
        self.origin = self.clamped(origin);
        debug!(slot, "bookmark recalled");
        true
    }

    /// Returns `true` when the bookmark slot holds an origin.
    #[must_use]
    pub fn has_bookmark(&self, slot: usize) -> bool {
        self.bookmarks.get(slot).is_some_and(Option::is_some)
    }

    fn shift(&mut self, delta: IVec2) -> bool {
        let next = self.clamped(IVec2::new(
            self.origin.x.saturating_add(delta.x),
            self.origin.y.saturating_add(delta.y),
        ));
        let moved = next != self.origin;
        self.origin = next;
        moved
    }

    fn clamped(&self, origin: IVec2) -> IVec2 {
        let max = (self.map - self.visible).max(IVec2::ZERO);
        origin.clamp(IVec2::ZERO, max)
    }

    fn edge_speed(&self, depth: i32) -> i32 {
        let zone = self.config.edge_zone.max(1);
        let min = self.config.edge_min_speed;
        let max = self.config.edge_max_speed;
        let base = min + (max - min) * depth.min(zone) / zone;
        let frames = self.config.edge_accel_frames.max(1);
        base + base * self.edge_accel / frames / 2
    }

    fn tracking_step(&self, offset: i32) -> i32 {
        if offset.abs() <= self.config.tracking_dead_zone {
            return 0;
        }
        let step = offset / self.config.tracking_divisor.max(1);
        if step == 0 {
            offset.signum()
        } else {
            step
        }
    }

    fn in_tactical(&self, screen: ScreenPoint) -> bool {
        self.tactical_rect().contains_point(screen.x(), screen.y())
    }

    fn edge_axes(&self, screen: ScreenPoint) -> Option<(i32, i32)> {
        if !self.in_tactical(screen) {
            return None;
        }
        Some(edge_axis(screen.x(), self.visible.x, self.config.edge_zone))
    }

    fn edge_axes_vertical(&self, screen: ScreenPoint) -> Option<(i32, i32)> {
        if !self.in_tactical(screen) {
            return None;
        }
        let local = screen.y() - self.config.tab_height;
        Some(edge_axis(local, self.visible.y, self.config.edge_zone))
    }
}

/// Direction sign and penetration depth along one axis of the edge zone.
fn edge_axis(position: i32, extent: i32, zone: i32) -> (i32, i32) {
    if position < zone {
        (-1, zone - position)
    } else if position >= extent - zone {
        (1, position - (extent - zone) + 1)
    } else {
        (0, 0)
    }
}

/// Narrows a widened pixel offset back to `i32`, pinning at the type bounds.
fn saturate(value: i64) -> i32 {
    i32::try_from(value).unwrap_or(if value < 0 { i32::MIN } else { i32::MAX })
}
