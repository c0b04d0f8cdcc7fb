#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! In-memory object storage and terrain for the Tactica engine.
//!
//! The engine core never owns game objects. This crate provides the
//! reference implementation of the collaborators the core consumes: an
//! [`ObjectStore`] that hands out snapshots, a [`TerrainMap`] describing the
//! map, and a mission-assignment entry point that records the orders each
//! object receives. Destroying an object always notifies a
//! [`DestructionObserver`] before the handle becomes invalid.

mod objects;
mod terrain;

use std::collections::{BTreeMap, VecDeque};

use tactica_core::{
    CellCoord, CommandTarget, CommandType, DestructionObserver, HouseId, LandType, MissionType,
    ObjectId, ObjectKind, ObjectStore, ObjectTraits, Rect, SelectableObject, TemplateId,
    TerrainMap, WorldPoint, CELL_PIXELS, WELCOME_BANNER,
};
use tracing::debug;

use self::objects::ObjectRegistry;
use self::terrain::TerrainGrid;

pub use self::terrain::TerrainCell;

const DEFAULT_MAP_COLUMNS: i32 = 64;
const DEFAULT_MAP_ROWS: i32 = 64;

/// Mission recorded against an object by the mission-assignment entry point.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Order {
    /// Mission the object was told to carry out.
    pub mission: MissionType,
    /// Target supplied with the mission.
    pub target: CommandTarget,
}

/// Represents the authoritative state of the map and its objects.
#[derive(Debug)]
pub struct World {
    banner: &'static str,
    objects: ObjectRegistry,
    terrain: TerrainGrid,
    orders: BTreeMap<ObjectId, VecDeque<Order>>,
}

impl Default for World {
    fn default() -> Self {
        Self::new(DEFAULT_MAP_COLUMNS, DEFAULT_MAP_ROWS)
    }
}

impl World {
    /// Creates a world with a clear, unrevealed map of the provided size in cells.
    #[must_use]
    pub fn new(columns: i32, rows: i32) -> Self {
        Self {
            banner: WELCOME_BANNER,
            objects: ObjectRegistry::new(),
            terrain: TerrainGrid::new(columns, rows),
            orders: BTreeMap::new(),
        }
    }

    /// Spawns an object of the given kind centered in the cell, using the
    /// kind's default size and capabilities.
    pub fn spawn(&mut self, kind: ObjectKind, owner: HouseId, cell: CellCoord) -> ObjectId {
        let id = self.objects.allocate();
        let object = SelectableObject::new(id, kind, owner, cell)
            .with_traits(default_traits(kind))
            .with_size(default_extent(kind), default_extent(kind));
        self.objects.insert(object);
        id
    }

    /// Spawns an object from a prototype snapshot; the prototype's identifier is replaced.
    pub fn spawn_from(&mut self, prototype: SelectableObject) -> ObjectId {
        let id = self.objects.allocate();
        self.objects.insert(SelectableObject { id, ..prototype });
        id
    }

    /// Removes an object, notifying the observer before the handle is invalidated.
    pub fn destroy<O>(&mut self, id: ObjectId, observer: &mut O) -> Option<SelectableObject>
    where
        O: DestructionObserver + ?Sized,
    {
        if self.objects.get(id).is_none() {
            return None;
        }
        observer.on_object_destroyed(id);
        let _ = self.orders.remove(&id);
        debug!(object = id.get(), "object destroyed");
        self.objects.remove(id)
    }

    /// Moves an object to a new world position.
    pub fn relocate(&mut self, id: ObjectId, position: WorldPoint) -> bool {
        match self.objects.get_mut(id) {
            Some(object) => {
                object.position = position;
                true
            }
            None => false,
        }
    }

    /// Toggles whether an object is considered alive and on the map.
    pub fn set_active(&mut self, id: ObjectId, active: bool) -> bool {
        match self.objects.get_mut(id) {
            Some(object) => {
                object.active = active;
                true
            }
            None => false,
        }
    }

    /// Replaces the capabilities an object advertises.
    pub fn set_traits(&mut self, id: ObjectId, traits: ObjectTraits) -> bool {
        match self.objects.get_mut(id) {
            Some(object) => {
                object.traits = traits;
                true
            }
            None => false,
        }
    }

    /// Overwrites the terrain of a cell. Returns `false` outside the map.
    pub fn set_terrain(
        &mut self,
        cell: CellCoord,
        land: LandType,
        template: TemplateId,
        icon: u8,
    ) -> bool {
        match self.terrain.cell_mut(cell) {
            Some(entry) => {
                entry.land = land;
                entry.template = template;
                entry.icon = icon;
                true
            }
            None => false,
        }
    }

    /// Reveals a single cell.
    pub fn reveal(&mut self, cell: CellCoord) -> bool {
        match self.terrain.cell_mut(cell) {
            Some(entry) => {
                entry.revealed = true;
                true
            }
            None => false,
        }
    }

    /// Reveals every cell of the map.
    pub fn reveal_all(&mut self) {
        self.terrain.reveal_all();
    }

    /// Mission-assignment collaborator: records the mission for the object.
    ///
    /// A queued mission is appended to the object's order queue; otherwise the
    /// queue is replaced. Returns `false` when the object is missing or inactive,
    /// or when an object target no longer exists.
    pub fn assign_mission(
        &mut self,
        object: &SelectableObject,
        mission: MissionType,
        target: CommandTarget,
        queued: bool,
    ) -> bool {
        let Some(current) = self.objects.get(object.id) else {
            return false;
        };
        if !current.active {
            return false;
        }
        if let CommandTarget::Object { id } = target {
            if self.objects.get(id).is_none() {
                return false;
            }
        }

        let queue = self.orders.entry(object.id).or_default();
        if !queued {
            queue.clear();
        }
        queue.push_back(Order { mission, target });
        debug!(
            object = object.id.get(),
            ?mission,
            queued,
            "mission assigned"
        );
        true
    }

    /// Capability-check collaborator: whether the object can carry out the command.
    #[must_use]
    pub fn can_perform(&self, object: &SelectableObject, command: CommandType) -> bool {
        let traits = object.traits;
        match command {
            CommandType::None => false,
            CommandType::Stop => true,
            CommandType::Move
            | CommandType::AttackMove
            | CommandType::Guard
            | CommandType::Scatter
            | CommandType::Follow
            | CommandType::Patrol
            | CommandType::Attack
            | CommandType::ForceFire => object.kind.is_unit(),
            CommandType::Enter => matches!(object.kind, ObjectKind::Infantry | ObjectKind::Vehicle),
            CommandType::Deploy | CommandType::Unload => {
                traits.intersects(ObjectTraits::DEPLOYABLE | ObjectTraits::TRANSPORT)
            }
            CommandType::Harvest => traits.contains(ObjectTraits::HARVESTER),
            CommandType::Capture | CommandType::Sabotage | CommandType::Infiltrate => {
                traits.contains(ObjectTraits::CAN_CAPTURE)
            }
            CommandType::Repair => traits.contains(ObjectTraits::REPAIRABLE),
            CommandType::Sell => traits.contains(ObjectTraits::SELLABLE),
        }
    }
}

fn default_traits(kind: ObjectKind) -> ObjectTraits {
    match kind {
        ObjectKind::Building => {
            ObjectTraits::ATTACKABLE | ObjectTraits::REPAIRABLE | ObjectTraits::SELLABLE
        }
        ObjectKind::Infantry
        | ObjectKind::Vehicle
        | ObjectKind::Vessel
        | ObjectKind::Aircraft => ObjectTraits::ATTACKABLE,
    }
}

fn default_extent(kind: ObjectKind) -> i32 {
    match kind {
        ObjectKind::Building => CELL_PIXELS * 2,
        ObjectKind::Infantry => CELL_PIXELS / 2,
        ObjectKind::Vehicle | ObjectKind::Vessel | ObjectKind::Aircraft => CELL_PIXELS,
    }
}

impl ObjectStore for World {
    fn object(&self, id: ObjectId) -> Option<SelectableObject> {
        self.objects.get(id).copied()
    }

    fn object_at(&self, cell: CellCoord) -> Option<SelectableObject> {
        self.objects.topmost_at(cell)
    }

    fn objects_in(&self, area: Rect) -> Vec<SelectableObject> {
        self.objects.within(area)
    }

    fn all_objects(&self) -> Vec<SelectableObject> {
        self.objects.iter().copied().collect()
    }
}

impl TerrainMap for World {
    fn size_in_cells(&self) -> (i32, i32) {
        (self.terrain.columns(), self.terrain.rows())
    }

    fn land(&self, cell: CellCoord) -> Option<LandType> {
        self.terrain.cell(cell).map(|entry| entry.land)
    }

    fn is_visible(&self, cell: CellCoord) -> bool {
        self.terrain.cell(cell).is_some_and(|entry| entry.revealed)
    }

    fn is_buildable(&self, cell: CellCoord) -> bool {
        matches!(self.land(cell), Some(LandType::Clear)) && self.objects.topmost_at(cell).is_none()
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use super::{Order, TerrainCell, World};
    use tactica_core::{CellCoord, ObjectId};

    /// Retrieves the welcome banner that adapters may display to players.
    #[must_use]
    pub fn welcome_banner(world: &World) -> &'static str {
        world.banner
    }

    /// Number of objects currently held in storage.
    #[must_use]
    pub fn object_count(world: &World) -> usize {
        world.objects.len()
    }

    /// Orders queued for the object, oldest first.
    #[must_use]
    pub fn orders(world: &World, id: ObjectId) -> Vec<Order> {
        world
            .orders
            .get(&id)
            .map(|queue| queue.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Terrain stored for the cell, if it lies on the map.
    #[must_use]
    pub fn terrain_cell(world: &World, cell: CellCoord) -> Option<TerrainCell> {
        world.terrain.cell(cell).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        destroyed: Vec<ObjectId>,
    }

    impl DestructionObserver for Recorder {
        fn on_object_destroyed(&mut self, id: ObjectId) {
            self.destroyed.push(id);
        }
    }

    #[test]
    fn world_defaults_to_welcome_banner() {
        let world = World::default();
        assert_eq!(query::welcome_banner(&world), WELCOME_BANNER);
        assert_eq!(world.size_in_cells(), (DEFAULT_MAP_COLUMNS, DEFAULT_MAP_ROWS));
    }

    #[test]
    fn destroy_notifies_observer_before_removal() {
        let mut world = World::new(8, 8);
        let id = world.spawn(ObjectKind::Vehicle, HouseId::new(0), CellCoord::new(1, 1));
        let mut recorder = Recorder::default();

        let removed = world.destroy(id, &mut recorder);

        assert!(removed.is_some());
        assert_eq!(recorder.destroyed, vec![id]);
        assert!(world.object(id).is_none());
    }

    #[test]
    fn destroying_missing_object_does_not_notify() {
        let mut world = World::new(8, 8);
        let mut recorder = Recorder::default();

        assert!(world.destroy(ObjectId::new(99), &mut recorder).is_none());
        assert!(recorder.destroyed.is_empty());
    }

    #[test]
    fn queued_missions_append_and_unqueued_replace() {
        let mut world = World::new(8, 8);
        let id = world.spawn(ObjectKind::Vehicle, HouseId::new(0), CellCoord::new(1, 1));
        let object = world.object(id).expect("spawned object");
        let first = CommandTarget::Cell {
            cell: CellCoord::new(2, 2),
        };
        let second = CommandTarget::Cell {
            cell: CellCoord::new(3, 3),
        };

        assert!(world.assign_mission(&object, MissionType::Move, first, false));
        assert!(world.assign_mission(&object, MissionType::Move, second, true));
        assert_eq!(query::orders(&world, id).len(), 2);

        assert!(world.assign_mission(&object, MissionType::Stop, CommandTarget::None, false));
        assert_eq!(
            query::orders(&world, id),
            vec![Order {
                mission: MissionType::Stop,
                target: CommandTarget::None,
            }]
        );
    }

    #[test]
    fn missions_targeting_missing_objects_are_rejected() {
        let mut world = World::new(8, 8);
        let id = world.spawn(ObjectKind::Vehicle, HouseId::new(0), CellCoord::new(1, 1));
        let object = world.object(id).expect("spawned object");

        let accepted = world.assign_mission(
            &object,
            MissionType::Attack,
            CommandTarget::Object {
                id: ObjectId::new(500),
            },
            false,
        );

        assert!(!accepted, "attacking a missing object must fail");
    }

    #[test]
    fn buildings_cannot_move_but_can_be_sold() {
        let mut world = World::new(8, 8);
        let id = world.spawn(ObjectKind::Building, HouseId::new(0), CellCoord::new(2, 2));
        let building = world.object(id).expect("spawned building");

        assert!(!world.can_perform(&building, CommandType::Move));
        assert!(world.can_perform(&building, CommandType::Sell));
        assert!(world.can_perform(&building, CommandType::Stop));
    }

    #[test]
    fn terrain_reports_passability_and_buildability() {
        let mut world = World::new(4, 4);
        let water = CellCoord::new(1, 1);
        assert!(world.set_terrain(water, LandType::Water, TemplateId::new(1), 0));
        let _ = world.spawn(ObjectKind::Vehicle, HouseId::new(0), CellCoord::new(2, 2));

        assert!(!world.is_passable(water));
        assert!(world.is_passable(CellCoord::new(0, 0)));
        assert!(!world.is_buildable(CellCoord::new(2, 2)), "occupied cell is not buildable");
        assert!(world.is_buildable(CellCoord::new(3, 3)));
        assert!(!world.is_passable(CellCoord::new(9, 9)), "off-map cells are blocked");
    }

    #[test]
    fn reveal_controls_visibility() {
        let mut world = World::new(4, 4);
        let cell = CellCoord::new(1, 2);
        assert!(!world.is_visible(cell));
        assert!(world.reveal(cell));
        assert!(world.is_visible(cell));
        world.reveal_all();
        assert!(world.is_visible(CellCoord::new(3, 3)));
        assert_eq!(
            query::terrain_cell(&world, cell).map(|entry| entry.revealed),
            Some(true)
        );
    }

    #[test]
    fn relocate_and_deactivate_update_snapshots() {
        let mut world = World::new(8, 8);
        let id = world.spawn(ObjectKind::Infantry, HouseId::new(0), CellCoord::new(0, 0));

        assert!(world.relocate(id, WorldPoint::new(100, 100)));
        assert!(world.set_active(id, false));

        let object = world.object(id).expect("object present");
        assert_eq!(object.position, WorldPoint::new(100, 100));
        assert!(!object.active);
        assert_eq!(query::object_count(&world), 1);
    }
}
