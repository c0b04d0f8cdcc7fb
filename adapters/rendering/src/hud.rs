//! Sidebar and radar panels.

use glam::Vec2;
use tactica_core::{CellCoord, LandType, Rect, ScreenPoint};

use crate::{DrawParams, DrawSurface, ShapeId, ShapeRenderer};

const TAB_HEIGHT: i32 = 24;
const ICON_WIDTH: i32 = 64;
const ICON_HEIGHT: i32 = 48;
const ICON_GAP: i32 = 4;
const ICON_COLUMNS: i32 = 2;
const BUTTON_WIDTH: i32 = 48;
const BUTTON_HEIGHT: i32 = 20;
const BACKGROUND: u8 = 14;
const HIGHLIGHT: u8 = 253;
const PROGRESS: u8 = 250;
const ON_HOLD: u8 = 252;

/// Most blips the radar keeps per frame.
pub const MAX_BLIPS: usize = 512;
/// Palette index of the radar's viewport rectangle.
pub const RADAR_VIEWPORT_COLOR: u8 = 15;

/// Sidebar production tab.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SidebarTab {
    /// Buildings.
    #[default]
    Structures,
    /// Units and infantry.
    Units,
}

impl SidebarTab {
    const fn index(self) -> usize {
        match self {
            Self::Structures => 0,
            Self::Units => 1,
        }
    }
}

/// Command buttons under the build icons.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SidebarButton {
    /// Toggles repair mode.
    Repair,
    /// Toggles sell mode.
    Sell,
    /// Toggles the radar map.
    Map,
}

impl SidebarButton {
    const ALL: [SidebarButton; 3] = [Self::Repair, Self::Sell, Self::Map];

    const fn index(self) -> usize {
        match self {
            Self::Repair => 0,
            Self::Sell => 1,
            Self::Map => 2,
        }
    }
}

/// Visual state of a sidebar button.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ButtonState {
    /// Idle.
    #[default]
    Normal,
    /// Cursor over the button.
    Hover,
    /// Held down.
    Pressed,
    /// Unavailable.
    Disabled,
    /// Mode toggled on.
    Active,
}

/// One buildable item on a tab.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BuildItem {
    /// Object type the item produces.
    pub type_index: u16,
    /// Icon shape and frame.
    pub icon: Option<(ShapeId, usize)>,
    /// Production progress in `0.0..=1.0`.
    pub progress: f32,
    /// Production paused.
    pub on_hold: bool,
}

impl BuildItem {
    /// Idle item with an icon.
    #[must_use]
    pub const fn new(type_index: u16, icon: Option<(ShapeId, usize)>) -> Self {
        Self {
            type_index,
            icon,
            progress: 0.0,
            on_hold: false,
        }
    }
}

/// What a sidebar click landed on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SidebarHit {
    /// A production tab.
    Tab(SidebarTab),
    /// The build icon at this position of the active tab.
    BuildItem(usize),
    /// A command button.
    Button(SidebarButton),
    /// Empty sidebar background.
    Background,
}

/// Production sidebar: tabs, scrolling build icons and command buttons.
#[derive(Clone, Debug)]
pub struct SidebarRenderer {
    area: Rect,
    top: i32,
    active_tab: SidebarTab,
    items: [Vec<BuildItem>; 2],
    scroll: usize,
    buttons: [ButtonState; 3],
    dirty: bool,
}

impl SidebarRenderer {
    /// Creates a sidebar covering `area`, leaving `reserved_top` pixels for the radar.
    #[must_use]
    pub fn new(area: Rect, reserved_top: i32) -> Self {
        Self {
            area,
            top: area.y() + reserved_top.max(0),
            active_tab: SidebarTab::Structures,
            items: [Vec::new(), Vec::new()],
            scroll: 0,
            buttons: [ButtonState::Normal; 3],
            dirty: true,
        }
    }

    /// Screen area of the sidebar.
    #[must_use]
    pub const fn area(&self) -> Rect {
        self.area
    }

    /// Tab whose items are shown.
    #[must_use]
    pub const fn active_tab(&self) -> SidebarTab {
        self.active_tab
    }

    /// Shows another tab and resets scrolling.
    pub fn set_active_tab(&mut self, tab: SidebarTab) {
        if self.active_tab != tab {
            self.active_tab = tab;
            self.scroll = 0;
            self.dirty = true;
        }
    }

    /// Items of a tab.
    #[must_use]
    pub fn items(&self, tab: SidebarTab) -> &[BuildItem] {
        &self.items[tab.index()]
    }

    /// Appends an item to a tab.
    pub fn add_item(&mut self, tab: SidebarTab, item: BuildItem) {
        self.items[tab.index()].push(item);
        self.dirty = true;
    }

    /// Removes every item from both tabs.
    pub fn clear_items(&mut self) {
        self.items.iter_mut().for_each(Vec::clear);
        self.scroll = 0;
        self.dirty = true;
    }

    /// Sets production progress for every item of `type_index`.
    pub fn set_progress(&mut self, type_index: u16, progress: f32) {
        let progress = progress.clamp(0.0, 1.0);
        for item in self.items.iter_mut().flatten() {
            if item.type_index == type_index {
                item.progress = progress;
                self.dirty = true;
            }
        }
    }

    /// Pauses or resumes production of every item of `type_index`.
    pub fn set_on_hold(&mut self, type_index: u16, on_hold: bool) {
        for item in self.items.iter_mut().flatten() {
            if item.type_index == type_index {
                item.on_hold = on_hold;
                self.dirty = true;
            }
        }
    }

    /// Changes a button's state.
    pub fn set_button_state(&mut self, button: SidebarButton, state: ButtonState) {
        if self.buttons[button.index()] != state {
            self.buttons[button.index()] = state;
            self.dirty = true;
        }
    }

    /// State of a button.
    #[must_use]
    pub const fn button_state(&self, button: SidebarButton) -> ButtonState {
        self.buttons[button.index()]
    }

    fn icons_top(&self) -> i32 {
        self.top + TAB_HEIGHT + ICON_GAP
    }

    fn buttons_y(&self) -> i32 {
        self.area.bottom() - BUTTON_HEIGHT - ICON_GAP
    }

    fn visible_rows(&self) -> usize {
        let space = self.buttons_y() - self.icons_top();
        (space / (ICON_HEIGHT + ICON_GAP)).max(0) as usize
    }

    fn visible_slots(&self) -> usize {
        self.visible_rows() * ICON_COLUMNS as usize
    }

    /// Furthest scroll position in rows.
    #[must_use]
    pub fn max_scroll(&self) -> usize {
        let count = self.items[self.active_tab.index()].len();
        let columns = ICON_COLUMNS as usize;
        let rows = count.div_ceil(columns);
        rows.saturating_sub(self.visible_rows())
    }

    /// First visible row.
    #[must_use]
    pub const fn scroll(&self) -> usize {
        self.scroll
    }

    /// Scrolls the icons up one row.
    pub fn scroll_up(&mut self) {
        if self.scroll > 0 {
            self.scroll -= 1;
            self.dirty = true;
        }
    }

    /// Scrolls the icons down one row.
    pub fn scroll_down(&mut self) {
        if self.scroll < self.max_scroll() {
            self.scroll += 1;
            self.dirty = true;
        }
    }

    fn tab_rect(&self, tab: SidebarTab) -> Rect {
        let width = self.area.width() / 2;
        Rect::new(
            self.area.x() + width * tab.index() as i32,
            self.top,
            width,
            TAB_HEIGHT,
        )
    }

    fn icon_rect(&self, slot: usize) -> Rect {
        let row = slot as i32 / ICON_COLUMNS;
        let column = slot as i32 % ICON_COLUMNS;
        Rect::new(
            self.area.x() + 8 + column * (ICON_WIDTH + ICON_GAP),
            self.icons_top() + row * (ICON_HEIGHT + ICON_GAP),
            ICON_WIDTH,
            ICON_HEIGHT,
        )
    }

    fn button_rect(&self, button: SidebarButton) -> Rect {
        Rect::new(
            self.area.x() + 8 + (BUTTON_WIDTH + ICON_GAP) * button.index() as i32,
            self.buttons_y(),
            BUTTON_WIDTH,
            BUTTON_HEIGHT,
        )
    }

    /// Element under a screen point, or `None` outside the sidebar's controls.
    #[must_use]
    pub fn hit_test(&self, point: ScreenPoint) -> Option<SidebarHit> {
        let (x, y) = (point.x(), point.y());
        if !self.area.contains_point(x, y) || y < self.top {
            return None;
        }
        for tab in [SidebarTab::Structures, SidebarTab::Units] {
            if self.tab_rect(tab).contains_point(x, y) {
                return Some(SidebarHit::Tab(tab));
            }
        }
        for button in SidebarButton::ALL {
            if self.button_rect(button).contains_point(x, y) {
                return Some(SidebarHit::Button(button));
            }
        }
        let first = self.scroll * ICON_COLUMNS as usize;
        let count = self.items[self.active_tab.index()].len();
        for slot in 0..self.visible_slots() {
            if first + slot < count && self.icon_rect(slot).contains_point(x, y) {
                return Some(SidebarHit::BuildItem(first + slot));
            }
        }
        Some(SidebarHit::Background)
    }

    /// Returns `true` once after anything visible changed.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    /// Forces a redraw next frame.
    pub fn invalidate(&mut self) {
        self.dirty = true;
    }

    /// Draws the whole sidebar below the reserved radar space.
    pub fn draw<S>(&self, surface: &mut S, shapes: &mut ShapeRenderer)
    where
        S: DrawSurface + ?Sized,
    {
        surface.fill_rect(self.area, BACKGROUND);
        surface.fill_rect(Rect::new(self.area.x(), self.area.y(), 1, self.area.height()), 0);

        for tab in [SidebarTab::Structures, SidebarTab::Units] {
            let rect = self.tab_rect(tab);
            let active = tab == self.active_tab;
            surface.fill_rect(rect, if active { 15 } else { 13 });
            surface.outline_rect(rect, 0);
            if active {
                surface.fill_rect(Rect::new(rect.x() + 1, rect.y() + 1, rect.width() - 2, 1), HIGHLIGHT);
            }
        }

        let items = &self.items[self.active_tab.index()];
        let first = self.scroll * ICON_COLUMNS as usize;
        for (slot, item) in items.iter().skip(first).take(self.visible_slots()).enumerate() {
            draw_build_item(surface, shapes, self.icon_rect(slot), item);
        }

        for button in SidebarButton::ALL {
            let state = self.buttons[button.index()];
            let color = match state {
                ButtonState::Active => PROGRESS,
                ButtonState::Pressed => 7,
                ButtonState::Hover => HIGHLIGHT,
                ButtonState::Disabled => 8,
                ButtonState::Normal => 15,
            };
            let rect = self.button_rect(button);
            surface.fill_rect(rect, color);
            surface.outline_rect(rect, 0);
        }
    }
}

fn draw_build_item<S>(surface: &mut S, shapes: &mut ShapeRenderer, rect: Rect, item: &BuildItem)
where
    S: DrawSurface + ?Sized,
{
    surface.fill_rect(rect, 12);
    surface.outline_rect(rect, HIGHLIGHT);
    if let Some((shape, frame)) = item.icon {
        let _ = shapes.draw(surface, shape, frame, rect.x() + 2, rect.y() + 2, &DrawParams::new());
    }
    if item.progress > 0.0 && item.progress < 1.0 {
        let bar = Rect::new(rect.x() + 2, rect.bottom() - 6, rect.width() - 4, 4);
        surface.fill_rect(bar, 0);
        let fill = ((bar.width() - 2) as f32 * item.progress) as i32;
        surface.fill_rect(Rect::new(bar.x() + 1, bar.y() + 1, fill, 2), PROGRESS);
    }
    if item.on_hold {
        surface.fill_rect(
            Rect::new(rect.x() + 8, rect.y() + rect.height() / 2, rect.width() - 16, 1),
            ON_HOLD,
        );
    }
}

/// Radar availability.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum RadarState {
    /// No radar building; the panel is dark.
    #[default]
    Disabled,
    /// Jammed; the panel shows static.
    Jammed,
    /// Showing the map.
    Active,
}

/// Unit or building marker on the radar.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RadarBlip {
    /// Map cell of the object.
    pub cell: CellCoord,
    /// Palette index of the blip.
    pub color: u8,
    /// Buildings draw 2x2, units 1 pixel.
    pub building: bool,
    /// Selected blips blink.
    pub selected: bool,
}

/// Radar colour for a land type; `None` is off-map.
#[must_use]
pub const fn terrain_color(land: Option<LandType>) -> u8 {
    match land {
        None => 0,
        Some(LandType::Clear) => 175,
        Some(LandType::Water | LandType::River) => 173,
        Some(LandType::Beach) => 176,
        Some(LandType::Rough) => 174,
        Some(LandType::Road) => 177,
        Some(LandType::Rock | LandType::Wall) => 178,
        Some(LandType::Tiberium) => 170,
    }
}

/// Minimap of the battlefield.
#[derive(Clone, Debug)]
pub struct RadarRenderer {
    area: Rect,
    state: RadarState,
    map_size: (i32, i32),
    scale: Vec2,
    terrain: Vec<u8>,
    blips: Vec<RadarBlip>,
    viewport: Rect,
    blink_counter: u32,
    blink_rate: u32,
    blink_on: bool,
    static_frame: i32,
}

impl RadarRenderer {
    /// Creates a disabled radar occupying `area`.
    #[must_use]
    pub fn new(area: Rect) -> Self {
        let mut radar = Self {
            area,
            state: RadarState::Disabled,
            map_size: (1, 1),
            scale: Vec2::ONE,
            terrain: vec![0; area.area().max(0) as usize],
            blips: Vec::new(),
            viewport: Rect::new(0, 0, 0, 0),
            blink_counter: 0,
            blink_rate: 8,
            blink_on: true,
            static_frame: 0,
        };
        radar.set_map_size(1, 1);
        radar
    }

    /// Screen area of the radar.
    #[must_use]
    pub const fn area(&self) -> Rect {
        self.area
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> RadarState {
        self.state
    }

    /// Changes the state.
    pub fn set_state(&mut self, state: RadarState) {
        self.state = state;
    }

    /// Map size in cells; sets the cell-to-pixel scale.
    pub fn set_map_size(&mut self, columns: i32, rows: i32) {
        self.map_size = (columns.max(1), rows.max(1));
        self.scale = Vec2::new(
            self.area.width() as f32 / self.map_size.0 as f32,
            self.area.height() as f32 / self.map_size.1 as f32,
        );
    }

    /// Rebuilds the terrain image from a per-cell colour lookup.
    pub fn update_terrain<F>(&mut self, color_of: F)
    where
        F: Fn(CellCoord) -> u8,
    {
        let (width, height) = (self.area.width(), self.area.height());
        for y in 0..height {
            for x in 0..width {
                let cell = self.local_to_cell(x, y);
                self.terrain[(y * width + x) as usize] = color_of(cell);
            }
        }
    }

    /// Visible map region in cells.
    pub fn set_viewport(&mut self, first: CellCoord, columns: i32, rows: i32) {
        self.viewport = Rect::new(first.column(), first.row(), columns, rows);
    }

    /// Drops every blip.
    pub fn clear_blips(&mut self) {
        self.blips.clear();
    }

    /// Adds a blip; extras past [`MAX_BLIPS`] are dropped.
    pub fn add_blip(&mut self, blip: RadarBlip) -> bool {
        if self.blips.len() >= MAX_BLIPS {
            return false;
        }
        self.blips.push(blip);
        true
    }

    /// Blips for this frame.
    #[must_use]
    pub fn blips(&self) -> &[RadarBlip] {
        &self.blips
    }

    /// Advances blinking and static animation.
    pub fn update(&mut self) {
        self.blink_counter += 1;
        if self.blink_counter >= self.blink_rate {
            self.blink_counter = 0;
            self.blink_on = !self.blink_on;
        }
        if self.state == RadarState::Jammed {
            self.static_frame = (self.static_frame + 1) % 8;
        }
    }

    fn local_to_cell(&self, x: i32, y: i32) -> CellCoord {
        let cell = Vec2::new(x as f32, y as f32) / self.scale;
        CellCoord::new(cell.x as i32, cell.y as i32)
    }

    /// Screen pixel of a cell's top-left corner.
    #[must_use]
    pub fn cell_to_radar(&self, cell: CellCoord) -> ScreenPoint {
        let local = Vec2::new(cell.column() as f32, cell.row() as f32) * self.scale;
        ScreenPoint::new(self.area.x() + local.x as i32, self.area.y() + local.y as i32)
    }

    /// Cell under a screen point inside the radar.
    #[must_use]
    pub fn radar_to_cell(&self, point: ScreenPoint) -> Option<CellCoord> {
        if !self.area.contains_point(point.x(), point.y()) {
            return None;
        }
        Some(self.local_to_cell(point.x() - self.area.x(), point.y() - self.area.y()))
    }

    /// Draws the radar panel for its state.
    pub fn draw<S>(&self, surface: &mut S)
    where
        S: DrawSurface + ?Sized,
    {
        match self.state {
            RadarState::Disabled => surface.fill_rect(self.area, 0),
            RadarState::Jammed => self.draw_static(surface),
            RadarState::Active => {
                self.draw_terrain(surface);
                self.draw_blips(surface);
                self.draw_viewport(surface);
            }
        }
    }

    fn draw_terrain<S>(&self, surface: &mut S)
    where
        S: DrawSurface + ?Sized,
    {
        let width = self.area.width();
        for (index, &color) in self.terrain.iter().enumerate() {
            let index = index as i32;
            surface.set_pixel(self.area.x() + index % width, self.area.y() + index / width, color);
        }
    }

    fn draw_blips<S>(&self, surface: &mut S)
    where
        S: DrawSurface + ?Sized,
    {
        for blip in &self.blips {
            if blip.selected && !self.blink_on {
                continue;
            }
            let at = self.cell_to_radar(blip.cell);
            let size = if blip.building { 2 } else { 1 };
            let rect = Rect::new(at.x(), at.y(), size, size);
            if let Some(clipped) = rect.intersection(&self.area) {
                surface.fill_rect(clipped, blip.color);
            }
        }
    }

    fn draw_viewport<S>(&self, surface: &mut S)
    where
        S: DrawSurface + ?Sized,
    {
        let top_left = self.cell_to_radar(CellCoord::new(self.viewport.x(), self.viewport.y()));
        let bottom_right =
            self.cell_to_radar(CellCoord::new(self.viewport.right(), self.viewport.bottom()));
        let rect = Rect::new(
            top_left.x(),
            top_left.y(),
            bottom_right.x() - top_left.x(),
            bottom_right.y() - top_left.y(),
        );
        if let Some(clipped) = rect.intersection(&self.area) {
            surface.outline_rect(clipped, RADAR_VIEWPORT_COLOR);
        }
    }

    fn draw_static<S>(&self, surface: &mut S)
    where
        S: DrawSurface + ?Sized,
    {
        for y in 0..self.area.height() {
            for x in 0..self.area.width() {
                let noise = (x * 7 + y * 11 + self.static_frame * 13) % 16;
                surface.set_pixel(self.area.x() + x, self.area.y() + y, (noise + 8) as u8);
            }
        }
    }
}
