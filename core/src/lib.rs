#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Tactica engine.
//!
//! This crate defines the value types that connect adapters, the externally
//! owned object storage, and the pure per-frame systems. Objects are referred
//! to exclusively through [`ObjectId`] handles; systems query snapshots of
//! them through the [`ObjectStore`] and [`TerrainMap`] collaborator traits and
//! never own the objects themselves. Orders are expressed as [`Command`]
//! values and dispatched as [`MissionType`] assignments.

use std::time::Duration;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// Canonical banner emitted when the engine boots.
pub const WELCOME_BANNER: &str = "Tactica engine core ready.";

/// Width and height of a single map cell measured in world pixels.
pub const CELL_PIXELS: i32 = 24;

/// Number of leptons spanning a single map cell.
pub const LEPTONS_PER_CELL: i32 = 256;

/// Converts a lepton distance into world pixels.
#[must_use]
pub const fn lepton_to_pixel(leptons: i32) -> i32 {
    leptons * CELL_PIXELS / LEPTONS_PER_CELL
}

/// Converts a world pixel distance into leptons.
#[must_use]
pub const fn pixel_to_lepton(pixels: i32) -> i32 {
    pixels * LEPTONS_PER_CELL / CELL_PIXELS
}

/// Unique handle referring to an object held by external storage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId(u32);

impl ObjectId {
    /// Creates a new object identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Player or faction identity that owns objects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HouseId(u8);

impl HouseId {
    /// Creates a new house identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u8) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the house.
    #[must_use]
    pub const fn get(&self) -> u8 {
        self.0
    }
}

/// Identifier of an object's type data entry (for example a specific tank model).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TypeIndex(u16);

impl TypeIndex {
    /// Creates a new type index.
    #[must_use]
    pub const fn new(value: u16) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the type index.
    #[must_use]
    pub const fn get(&self) -> u16 {
        self.0
    }
}

/// Identifier of a terrain template within a theater tile set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TemplateId(u16);

impl TemplateId {
    /// Template used for plain clear ground.
    pub const CLEAR: Self = Self(0);

    /// Creates a new template identifier.
    #[must_use]
    pub const fn new(value: u16) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the template identifier.
    #[must_use]
    pub const fn get(&self) -> u16 {
        self.0
    }
}

/// Position in world space measured in pixels from the map origin.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorldPoint {
    x: i32,
    y: i32,
}

impl WorldPoint {
    /// Creates a new world position.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Horizontal component in world pixels.
    #[must_use]
    pub const fn x(&self) -> i32 {
        self.x
    }

    /// Vertical component in world pixels.
    #[must_use]
    pub const fn y(&self) -> i32 {
        self.y
    }

    /// Map cell containing this position.
    #[must_use]
    pub const fn cell(&self) -> CellCoord {
        CellCoord::new(
            self.x.div_euclid(CELL_PIXELS),
            self.y.div_euclid(CELL_PIXELS),
        )
    }

    /// Returns the position translated by the provided offsets.
    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

/// Position on the 8-bit screen measured in pixels from the top-left corner.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScreenPoint {
    x: i32,
    y: i32,
}

impl ScreenPoint {
    /// Creates a new screen position.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Horizontal component in screen pixels.
    #[must_use]
    pub const fn x(&self) -> i32 {
        self.x
    }

    /// Vertical component in screen pixels.
    #[must_use]
    pub const fn y(&self) -> i32 {
        self.y
    }
}

/// Location of a single map cell expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: i32,
    row: i32,
}

impl CellCoord {
    /// Creates a new map cell coordinate.
    #[must_use]
    pub const fn new(column: i32, row: i32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> i32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> i32 {
        self.row
    }

    /// World position of the cell's upper-left pixel.
    #[must_use]
    pub const fn origin(&self) -> WorldPoint {
        WorldPoint::new(self.column * CELL_PIXELS, self.row * CELL_PIXELS)
    }

    /// World position of the cell's center pixel.
    #[must_use]
    pub const fn center(&self) -> WorldPoint {
        WorldPoint::new(
            self.column * CELL_PIXELS + CELL_PIXELS / 2,
            self.row * CELL_PIXELS + CELL_PIXELS / 2,
        )
    }

    /// Computes the Manhattan distance between two cell coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: CellCoord) -> u32 {
        self.column.abs_diff(other.column) + self.row.abs_diff(other.row)
    }
}

/// Axis-aligned rectangle with an inclusive origin and exclusive far edges.
///
/// The same type is used for screen pixels (dirty regions, UI panels) and for
/// world pixels (selection boxes); the owning API documents the space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    x: i32,
    y: i32,
    width: i32,
    height: i32,
}

impl Rect {
    /// Creates a rectangle from its origin and size. Negative sizes collapse to zero.
    #[must_use]
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width: if width < 0 { 0 } else { width },
            height: if height < 0 { 0 } else { height },
        }
    }

    /// Creates the smallest rectangle covering both corner pixels, in any order.
    #[must_use]
    pub fn spanning(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        let left = x1.min(x2);
        let top = y1.min(y2);
        let right = x1.max(x2);
        let bottom = y1.max(y2);
        Self::new(left, top, right - left + 1, bottom - top + 1)
    }

    /// Leftmost column covered by the rectangle.
    #[must_use]
    pub const fn x(&self) -> i32 {
        self.x
    }

    /// Topmost row covered by the rectangle.
    #[must_use]
    pub const fn y(&self) -> i32 {
        self.y
    }

    /// Width of the rectangle.
    #[must_use]
    pub const fn width(&self) -> i32 {
        self.width
    }

    /// Height of the rectangle.
    #[must_use]
    pub const fn height(&self) -> i32 {
        self.height
    }

    /// First column past the right edge.
    #[must_use]
    pub const fn right(&self) -> i32 {
        self.x + self.width
    }

    /// First row past the bottom edge.
    #[must_use]
    pub const fn bottom(&self) -> i32 {
        self.y + self.height
    }

    /// Returns `true` when the rectangle covers no pixels.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// Number of pixels covered by the rectangle.
    #[must_use]
    pub const fn area(&self) -> i64 {
        self.width as i64 * self.height as i64
    }

    /// Returns `true` when the pixel lies inside the rectangle.
    #[must_use]
    pub const fn contains_point(&self, x: i32, y: i32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    /// Returns `true` when `other` lies completely inside this rectangle.
    #[must_use]
    pub const fn contains_rect(&self, other: &Rect) -> bool {
        other.is_empty()
            || (other.x >= self.x
                && other.y >= self.y
                && other.right() <= self.right()
                && other.bottom() <= self.bottom())
    }

    /// Returns `true` when the rectangles share at least one pixel.
    #[must_use]
    pub const fn intersects(&self, other: &Rect) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    /// Returns `true` when the rectangles overlap or share an edge.
    #[must_use]
    pub const fn touches(&self, other: &Rect) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.x <= other.right()
            && other.x <= self.right()
            && self.y <= other.bottom()
            && other.y <= self.bottom()
    }

    /// Smallest rectangle covering both rectangles.
    #[must_use]
    pub fn union(&self, other: &Rect) -> Rect {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        let left = self.x.min(other.x);
        let top = self.y.min(other.y);
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        Rect::new(left, top, right - left, bottom - top)
    }

    /// Overlapping region of both rectangles, if any.
    #[must_use]
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let left = self.x.max(other.x);
        let top = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        let clipped = Rect::new(left, top, right - left, bottom - top);
        (!clipped.is_empty()).then_some(clipped)
    }

    /// Returns the rectangle moved by the provided offsets.
    #[must_use]
    pub const fn translate(&self, dx: i32, dy: i32) -> Rect {
        Rect::new(self.x + dx, self.y + dy, self.width, self.height)
    }
}

/// Closed set of object categories distinguished by the engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectKind {
    /// Foot soldier.
    Infantry,
    /// Ground vehicle.
    Vehicle,
    /// Naval unit.
    Vessel,
    /// Aircraft or helicopter.
    Aircraft,
    /// Static structure.
    Building,
}

impl ObjectKind {
    /// Returns `true` for every mobile kind.
    #[must_use]
    pub const fn is_unit(&self) -> bool {
        !matches!(self, Self::Building)
    }

    /// Returns `true` for static structures.
    #[must_use]
    pub const fn is_building(&self) -> bool {
        matches!(self, Self::Building)
    }
}

bitflags! {
    /// Capabilities an object advertises to input classification and command dispatch.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct ObjectTraits: u16 {
        /// Object can carry passengers.
        const TRANSPORT   = 1 << 0;
        /// Object gathers resources from harvest areas.
        const HARVESTER   = 1 << 1;
        /// Object may be targeted by attacks.
        const ATTACKABLE  = 1 << 2;
        /// Object belongs to civilians.
        const CIVILIAN    = 1 << 3;
        /// Object can deploy into another form.
        const DEPLOYABLE  = 1 << 4;
        /// Object can capture enemy structures.
        const CAN_CAPTURE = 1 << 5;
        /// Structure can be repaired.
        const REPAIRABLE  = 1 << 6;
        /// Structure can be sold.
        const SELLABLE    = 1 << 7;
    }
}

/// Selection priority granted to every mobile unit.
pub const UNIT_PRIORITY: u32 = 1000;

/// Additional selection priority granted to infantry.
pub const INFANTRY_PRIORITY: u32 = 100;

/// Snapshot of an externally owned object as seen by the input systems.
///
/// Snapshots are plain values; storage hands out fresh copies on every query
/// so the systems never observe stale state through them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SelectableObject {
    /// Handle used to refer back to the object.
    pub id: ObjectId,
    /// Category of the object.
    pub kind: ObjectKind,
    /// Type data entry of the object.
    pub type_index: TypeIndex,
    /// House controlling the object.
    pub owner: HouseId,
    /// Center of the object in world pixels.
    pub position: WorldPoint,
    /// Width of the object's bounding box in world pixels.
    pub width: i32,
    /// Height of the object's bounding box in world pixels.
    pub height: i32,
    /// Whether the object is alive and on the map.
    pub active: bool,
    /// Capabilities advertised by the object.
    pub traits: ObjectTraits,
}

impl SelectableObject {
    /// Creates an active, cell-sized object centered within the provided cell.
    #[must_use]
    pub const fn new(id: ObjectId, kind: ObjectKind, owner: HouseId, cell: CellCoord) -> Self {
        Self {
            id,
            kind,
            type_index: TypeIndex::new(0),
            owner,
            position: cell.center(),
            width: CELL_PIXELS,
            height: CELL_PIXELS,
            active: true,
            traits: ObjectTraits::ATTACKABLE,
        }
    }

    /// Overrides the type data entry.
    #[must_use]
    pub const fn with_type(mut self, type_index: TypeIndex) -> Self {
        self.type_index = type_index;
        self
    }

    /// Overrides the advertised capabilities.
    #[must_use]
    pub const fn with_traits(mut self, traits: ObjectTraits) -> Self {
        self.traits = traits;
        self
    }

    /// Overrides the bounding box size.
    #[must_use]
    pub const fn with_size(mut self, width: i32, height: i32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Overrides the world position.
    #[must_use]
    pub const fn with_position(mut self, position: WorldPoint) -> Self {
        self.position = position;
        self
    }

    /// Overrides the active flag.
    #[must_use]
    pub const fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    /// Map cell containing the object's center.
    #[must_use]
    pub const fn cell(&self) -> CellCoord {
        self.position.cell()
    }

    /// Bounding box in world pixels centered on the object's position.
    #[must_use]
    pub const fn bounds(&self) -> Rect {
        Rect::new(
            self.position.x() - self.width / 2,
            self.position.y() - self.height / 2,
            self.width,
            self.height,
        )
    }

    /// Ordering weight used to arrange the selection (higher first).
    #[must_use]
    pub const fn selection_priority(&self) -> u32 {
        let mut priority = 0;
        if self.kind.is_unit() {
            priority += UNIT_PRIORITY;
        }
        if matches!(self.kind, ObjectKind::Infantry) {
            priority += INFANTRY_PRIORITY;
        }
        priority
    }
}

/// Terrain classification of a map cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LandType {
    /// Open ground.
    #[default]
    Clear,
    /// Paved road.
    Road,
    /// Open water.
    Water,
    /// Impassable rock.
    Rock,
    /// Wall segment.
    Wall,
    /// Harvestable resource field.
    Tiberium,
    /// Shoreline.
    Beach,
    /// Rough ground.
    Rough,
    /// River bed.
    River,
}

impl LandType {
    /// Returns `true` when ground units may enter the cell.
    #[must_use]
    pub const fn is_passable(&self) -> bool {
        matches!(
            self,
            Self::Clear | Self::Road | Self::Tiberium | Self::Beach | Self::Rough
        )
    }

    /// Returns `true` for water cells.
    #[must_use]
    pub const fn is_water(&self) -> bool {
        matches!(self, Self::Water | Self::River)
    }
}

/// Collaborator exposing externally owned objects as snapshots.
pub trait ObjectStore {
    /// Looks up an object by handle.
    fn object(&self, id: ObjectId) -> Option<SelectableObject>;

    /// Returns the topmost object occupying the provided cell.
    fn object_at(&self, cell: CellCoord) -> Option<SelectableObject>;

    /// Returns every object whose position lies inside the world-space rectangle.
    fn objects_in(&self, area: Rect) -> Vec<SelectableObject>;

    /// Returns every object in storage.
    fn all_objects(&self) -> Vec<SelectableObject>;
}

/// Collaborator describing map terrain.
pub trait TerrainMap {
    /// Map dimensions measured in cells as `(columns, rows)`.
    fn size_in_cells(&self) -> (i32, i32);

    /// Land type of the cell, or `None` outside the map.
    fn land(&self, cell: CellCoord) -> Option<LandType>;

    /// Whether the player has revealed the cell.
    fn is_visible(&self, cell: CellCoord) -> bool;

    /// Whether ground units may enter the cell.
    fn is_passable(&self, cell: CellCoord) -> bool {
        self.land(cell).is_some_and(|land| land.is_passable())
    }

    /// Whether a structure may be placed on the cell.
    fn is_buildable(&self, cell: CellCoord) -> bool {
        matches!(self.land(cell), Some(LandType::Clear))
    }
}

/// Receives notification that an object is about to be freed by storage.
pub trait DestructionObserver {
    /// Called before the object's handle becomes invalid.
    fn on_object_destroyed(&mut self, id: ObjectId);
}

/// Orders a player can issue to the selection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommandType {
    /// No order could be derived.
    #[default]
    None,
    /// Move to a location.
    Move,
    /// Move while engaging enemies en route.
    AttackMove,
    /// Attack a specific object.
    Attack,
    /// Attack the ground or a friendly object.
    ForceFire,
    /// Guard the current position.
    Guard,
    /// Cancel current orders.
    Stop,
    /// Enter a transport or structure.
    Enter,
    /// Deploy into another form.
    Deploy,
    /// Unload passengers.
    Unload,
    /// Harvest resources.
    Harvest,
    /// Repair a structure.
    Repair,
    /// Sell a structure.
    Sell,
    /// Spread out from the current position.
    Scatter,
    /// Follow another object.
    Follow,
    /// Patrol between positions.
    Patrol,
    /// Capture an enemy structure.
    Capture,
    /// Sabotage an enemy structure.
    Sabotage,
    /// Infiltrate an enemy structure.
    Infiltrate,
}

bitflags! {
    /// Modifiers recorded alongside a command.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct CommandFlags: u8 {
        /// Append to the unit's order queue instead of replacing it.
        const QUEUED = 1 << 0;
        /// Issued with the force-attack modifier.
        const FORCED = 1 << 1;
        /// Issued with the force-move modifier.
        const ALT    = 1 << 2;
    }
}

/// What an order is directed at.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommandTarget {
    /// The order needs no target.
    #[default]
    None,
    /// A precise world position.
    Ground {
        /// Targeted position in world pixels.
        point: WorldPoint,
    },
    /// A whole map cell.
    Cell {
        /// Targeted cell.
        cell: CellCoord,
    },
    /// Another object.
    Object {
        /// Handle of the targeted object.
        id: ObjectId,
    },
}

impl CommandTarget {
    /// Map cell addressed by the target, when it is positional.
    #[must_use]
    pub const fn cell(&self) -> Option<CellCoord> {
        match self {
            Self::Ground { point } => Some(point.cell()),
            Self::Cell { cell } => Some(*cell),
            Self::None | Self::Object { .. } => None,
        }
    }

    /// World position addressed by the target, when it is positional.
    #[must_use]
    pub const fn point(&self) -> Option<WorldPoint> {
        match self {
            Self::Ground { point } => Some(*point),
            Self::Cell { cell } => Some(cell.center()),
            Self::None | Self::Object { .. } => None,
        }
    }
}

/// Fully resolved order awaiting dispatch to the selection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Command {
    /// Kind of order.
    pub kind: CommandType,
    /// Target of the order.
    pub target: CommandTarget,
    /// Modifiers recorded with the order.
    pub flags: CommandFlags,
}

impl Command {
    /// Creates a new command.
    #[must_use]
    pub const fn new(kind: CommandType, target: CommandTarget, flags: CommandFlags) -> Self {
        Self {
            kind,
            target,
            flags,
        }
    }

    /// Returns `true` when the order should be appended to the unit's queue.
    #[must_use]
    pub const fn is_queued(&self) -> bool {
        self.flags.contains(CommandFlags::QUEUED)
    }
}

/// Missions understood by the mission-assignment collaborator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MissionType {
    /// Travel to a destination.
    Move,
    /// Engage a target.
    Attack,
    /// Hold position and engage nearby enemies.
    Guard,
    /// Abandon the current mission.
    Stop,
    /// Board a transport or structure.
    Enter,
    /// Gather resources.
    Harvest,
    /// Take over a structure.
    Capture,
    /// Destroy a structure from the inside.
    Sabotage,
    /// Release passengers or deploy.
    Unload,
    /// Repair a structure.
    Repair,
}

impl CommandType {
    /// Mission the command translates into, if any.
    #[must_use]
    pub const fn mission(&self) -> Option<MissionType> {
        match self {
            Self::Move | Self::AttackMove => Some(MissionType::Move),
            Self::Attack | Self::ForceFire => Some(MissionType::Attack),
            Self::Guard => Some(MissionType::Guard),
            Self::Stop => Some(MissionType::Stop),
            Self::Enter => Some(MissionType::Enter),
            Self::Harvest => Some(MissionType::Harvest),
            Self::Capture => Some(MissionType::Capture),
            Self::Sabotage => Some(MissionType::Sabotage),
            Self::Unload | Self::Deploy => Some(MissionType::Unload),
            Self::Repair => Some(MissionType::Repair),
            Self::None
            | Self::Sell
            | Self::Scatter
            | Self::Follow
            | Self::Patrol
            | Self::Infiltrate => None,
        }
    }
}

/// Outcome of issuing a command.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommandResult {
    /// At least one selected object accepted the order.
    Success,
    /// The order had no valid target.
    InvalidTarget,
    /// Nothing suitable was selected.
    InvalidSelection,
    /// No selected object could carry out the order.
    CannotPerform,
    /// The target is out of range.
    OutOfRange,
    /// The path to the target is blocked.
    Blocked,
}

impl CommandResult {
    /// Returns `true` for [`CommandResult::Success`].
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

/// Region of the screen the cursor occupies.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ScreenRegion {
    /// Main map view.
    Tactical,
    /// Build sidebar.
    Sidebar,
    /// Minimap within the sidebar.
    Radar,
    /// Tab bar along the top edge.
    TabBar,
    /// Outside the game screen.
    #[default]
    Outside,
}

/// Classification of whatever lies beneath the cursor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ContextKind {
    /// Nothing notable.
    #[default]
    Normal,
    /// Open ground units may enter.
    TerrainPassable,
    /// Ground units cannot enter.
    TerrainBlocked,
    /// Water.
    TerrainWater,
    /// Unexplored cell.
    TerrainShroud,
    /// Player-owned mobile unit.
    OwnUnit,
    /// Player-owned structure.
    OwnBuilding,
    /// Player-owned harvester.
    OwnHarvester,
    /// Player-owned transport.
    OwnTransport,
    /// Hostile mobile unit.
    EnemyUnit,
    /// Hostile structure.
    EnemyBuilding,
    /// Unowned structure that may be captured.
    NeutralBuilding,
    /// Civilian object.
    Civilian,
    /// Structure that may be repaired in repair mode.
    RepairTarget,
    /// Structure that may be sold in sell mode.
    SellTarget,
    /// Object that may be entered.
    EnterTarget,
    /// Resource field.
    HarvestArea,
    /// Cursor over interface chrome.
    Interface,
    /// Structure placement would succeed.
    PlacementValid,
    /// Structure placement would fail.
    PlacementInvalid,
    /// Edge scroll toward the given direction.
    Scroll(ScrollEdge),
}

/// One of the eight edge-scroll directions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScrollEdge {
    /// Up.
    North,
    /// Up and right.
    NorthEast,
    /// Right.
    East,
    /// Down and right.
    SouthEast,
    /// Down.
    South,
    /// Down and left.
    SouthWest,
    /// Left.
    West,
    /// Up and left.
    NorthWest,
}

impl ScrollEdge {
    /// Maps a pair of axis signs to a direction; `None` when both are zero.
    #[must_use]
    pub const fn from_signs(dx: i32, dy: i32) -> Option<Self> {
        match (dx.signum(), dy.signum()) {
            (0, -1) => Some(Self::North),
            (1, -1) => Some(Self::NorthEast),
            (1, 0) => Some(Self::East),
            (1, 1) => Some(Self::SouthEast),
            (0, 1) => Some(Self::South),
            (-1, 1) => Some(Self::SouthWest),
            (-1, 0) => Some(Self::West),
            (-1, -1) => Some(Self::NorthWest),
            _ => None,
        }
    }
}

/// Transient description of what lies beneath the cursor.
///
/// Always rebuilt from scratch for each query and never persisted across frames.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CursorContext {
    /// Overall classification.
    pub kind: ContextKind,
    /// Screen region containing the cursor.
    pub region: ScreenRegion,
    /// Cursor position in world pixels.
    pub world: WorldPoint,
    /// Map cell beneath the cursor.
    pub cell: CellCoord,
    /// Object beneath the cursor, if any.
    pub object: Option<SelectableObject>,
    /// Object belongs to the player.
    pub is_own: bool,
    /// Object belongs to a hostile house.
    pub is_enemy: bool,
    /// Object may be selected by the player.
    pub is_selectable: bool,
    /// Object may be attacked.
    pub is_attackable: bool,
    /// Ground units may enter the cell.
    pub is_passable: bool,
    /// Structures may be placed on the cell.
    pub is_buildable: bool,
    /// The cell is revealed.
    pub is_visible: bool,
}

/// Cursor images the engine can display.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum CursorShape {
    /// Default pointer.
    #[default]
    Arrow,
    /// Edge scroll indicator.
    Scroll(ScrollEdge),
    /// Scrolling is blocked at the map edge.
    NoScroll,
    /// Select an object.
    Select,
    /// Move to a location.
    Move,
    /// Movement is not possible.
    NoMove,
    /// Attack a target.
    Attack,
    /// Enter an object.
    Enter,
    /// Deploy in place.
    Deploy,
    /// Sell a structure.
    Sell,
    /// Repair a structure.
    Repair,
    /// Guard an area.
    Guard,
    /// Capture a structure.
    Capture,
    /// Harvest resources.
    Harvest,
}

/// Virtual key codes reported by platform adapters.
pub mod keys {
    /// Backspace.
    pub const BACKSPACE: u8 = 8;
    /// Tab.
    pub const TAB: u8 = 9;
    /// Return / Enter.
    pub const RETURN: u8 = 13;
    /// Either shift key.
    pub const SHIFT: u8 = 16;
    /// Either control key.
    pub const CONTROL: u8 = 17;
    /// Either alt key.
    pub const ALT: u8 = 18;
    /// Pause.
    pub const PAUSE: u8 = 19;
    /// Escape.
    pub const ESCAPE: u8 = 27;
    /// Space bar.
    pub const SPACE: u8 = 32;
    /// End.
    pub const END: u8 = 35;
    /// Home.
    pub const HOME: u8 = 36;
    /// Left arrow.
    pub const LEFT: u8 = 37;
    /// Up arrow.
    pub const UP: u8 = 38;
    /// Right arrow.
    pub const RIGHT: u8 = 39;
    /// Down arrow.
    pub const DOWN: u8 = 40;
    /// Delete.
    pub const DELETE: u8 = 46;
    /// Either meta / command key.
    pub const META: u8 = 91;
    /// Function key F1; F2 through F12 follow consecutively.
    pub const F1: u8 = 112;

    /// Key code of the digit `0..=9`.
    #[must_use]
    pub const fn digit(value: u8) -> u8 {
        b'0' + value % 10
    }

    /// Key code of the uppercase ASCII letter.
    #[must_use]
    pub const fn letter(value: char) -> u8 {
        value.to_ascii_uppercase() as u8
    }

    /// Key code of function key `F<n>` for `n` in `1..=12`.
    #[must_use]
    pub const fn function(n: u8) -> u8 {
        F1 + n.saturating_sub(1)
    }
}

/// Mouse buttons tracked by the input layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MouseButton {
    /// Primary button.
    Left,
    /// Secondary button.
    Right,
    /// Wheel button.
    Middle,
}

impl MouseButton {
    /// Every tracked button in index order.
    pub const ALL: [MouseButton; 3] = [Self::Left, Self::Right, Self::Middle];

    /// Index of the button within per-button arrays.
    #[must_use]
    pub const fn index(&self) -> usize {
        match self {
            Self::Left => 0,
            Self::Right => 1,
            Self::Middle => 2,
        }
    }
}

/// Raw device snapshot gathered by a platform adapter for a single frame.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RawInput {
    /// Virtual key codes currently held.
    pub keys_down: Vec<u8>,
    /// Virtual key codes pressed since the previous frame, in order.
    pub typed: Vec<u8>,
    /// Mouse position in window pixels.
    pub mouse_x: i32,
    /// Mouse position in window pixels.
    pub mouse_y: i32,
    /// Held state of each [`MouseButton`], indexed by [`MouseButton::index`].
    pub buttons: [bool; 3],
    /// Wheel movement since the previous frame.
    pub wheel: i32,
    /// Time elapsed since the adapter started.
    pub timestamp: Duration,
}

/// Identifier of a sound effect known to the audio collaborator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SoundId(u16);

impl SoundId {
    /// Acknowledgement played when a command is accepted.
    pub const ACKNOWLEDGE: Self = Self(1);
    /// Buzz played when a command is rejected.
    pub const REJECTED: Self = Self(2);

    /// Creates a new sound identifier.
    #[must_use]
    pub const fn new(value: u16) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the sound.
    #[must_use]
    pub const fn get(&self) -> u16 {
        self.0
    }
}

/// Handle to a playing voice returned by the audio collaborator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct VoiceHandle(u32);

impl VoiceHandle {
    /// Creates a new voice handle.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the handle.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Fire-and-forget audio service running on its own thread.
///
/// Calls never block and never report completion; the engine treats a
/// missing voice handle as "not playing".
pub trait AudioService {
    /// Starts playing the sound at the provided volume (0..=255).
    fn play(&mut self, sound: SoundId, volume: u8) -> Option<VoiceHandle>;

    /// Stops a playing voice.
    fn stop(&mut self, voice: VoiceHandle);

    /// Adjusts the volume of a playing voice.
    fn set_volume(&mut self, voice: VoiceHandle, volume: u8);
}
