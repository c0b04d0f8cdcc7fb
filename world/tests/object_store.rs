use tactica_core::{
    CellCoord, DestructionObserver, HouseId, ObjectId, ObjectKind, ObjectStore, ObjectTraits,
    Rect, SelectableObject, TerrainMap,
};
use tactica_world::{query, World};

struct Tally {
    destroyed: Vec<ObjectId>,
}

impl DestructionObserver for Tally {
    fn on_object_destroyed(&mut self, id: ObjectId) {
        self.destroyed.push(id);
    }
}

#[test]
fn objects_in_returns_every_object_inside_the_box() {
    let mut world = World::new(32, 32);
    let owner = HouseId::new(0);
    for column in 0..5 {
        for row in 0..10 {
            let _ = world.spawn(ObjectKind::Vehicle, owner, CellCoord::new(column, row));
        }
    }

    let found = world.objects_in(Rect::new(0, 0, 5 * 24, 10 * 24));

    assert_eq!(found.len(), 50, "all fifty vehicles lie inside the box");
    assert_eq!(world.all_objects().len(), 50);
    assert_eq!(query::object_count(&world), 50);
}

#[test]
fn object_at_prefers_the_unit_over_the_structure_beneath_it() {
    let mut world = World::new(16, 16);
    let owner = HouseId::new(0);
    let yard = world.spawn(ObjectKind::Building, owner, CellCoord::new(4, 4));
    let harvester = world.spawn_from(
        SelectableObject::new(ObjectId::new(0), ObjectKind::Vehicle, owner, CellCoord::new(4, 4))
            .with_traits(ObjectTraits::HARVESTER | ObjectTraits::ATTACKABLE),
    );

    let top = world.object_at(CellCoord::new(4, 4)).expect("object expected");

    assert_eq!(top.id, harvester);
    assert_ne!(top.id, yard);
    assert!(top.traits.contains(ObjectTraits::HARVESTER));
}

#[test]
fn destruction_is_reported_once_and_handles_become_invalid() {
    let mut world = World::new(8, 8);
    let id = world.spawn(ObjectKind::Infantry, HouseId::new(2), CellCoord::new(3, 3));
    let mut tally = Tally {
        destroyed: Vec::new(),
    };

    assert!(world.destroy(id, &mut tally).is_some());
    assert!(world.destroy(id, &mut tally).is_none());

    assert_eq!(tally.destroyed, vec![id], "second destroy must not notify");
    assert!(world.object(id).is_none());
    assert!(world.object_at(CellCoord::new(3, 3)).is_none());
}

#[test]
fn map_size_reports_columns_then_rows() {
    let world = World::new(40, 25);
    assert_eq!(world.size_in_cells(), (40, 25));
    assert!(world.land(CellCoord::new(39, 24)).is_some());
    assert!(world.land(CellCoord::new(40, 0)).is_none());
}
