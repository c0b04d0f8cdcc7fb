use tactica_core::{
    CellCoord, HouseId, ObjectId, ObjectKind, ObjectStore, Rect, SelectableObject, TypeIndex,
    CELL_PIXELS,
};
use tactica_system_selection::{SelectionConfig, SelectionEvent, SelectionManager};
use tactica_world::World;

const PLAYER: HouseId = HouseId::new(0);
const ENEMY: HouseId = HouseId::new(1);

/// 20 player units, 20 player buildings and 10 enemy units on a 10x5 block.
fn crowded_world() -> (World, Vec<ObjectId>) {
    let mut world = World::new(32, 32);
    let mut ids = Vec::new();
    for index in 0..50 {
        let cell = CellCoord::new(index % 10, index / 10);
        let (kind, owner) = match index {
            0..=19 => (ObjectKind::Vehicle, PLAYER),
            20..=39 => (ObjectKind::Building, PLAYER),
            _ => (ObjectKind::Infantry, ENEMY),
        };
        ids.push(world.spawn(kind, owner, cell));
    }
    (world, ids)
}

#[test]
fn box_selection_keeps_only_player_units() {
    let (world, _) = crowded_world();
    let mut selection = SelectionManager::default();

    let area = Rect::new(0, 0, 10 * CELL_PIXELS, 5 * CELL_PIXELS);
    assert_eq!(world.objects_in(area).len(), 50, "box covers every object");

    let selected = selection.select_in_box(&world, area);
    assert_eq!(selected, 20, "only the 20 player units qualify");

    let objects = selection.objects(&world);
    assert!(
        objects.iter().all(|object| object.owner == PLAYER),
        "no enemy may be selected"
    );
    assert!(
        objects.iter().all(|object| object.kind.is_unit()),
        "buildings are excluded from box selection"
    );
    assert!(!selection.has_selected_buildings());
}

#[test]
fn empty_box_keeps_the_previous_selection() {
    let (world, ids) = crowded_world();
    let mut selection = SelectionManager::default();
    let first = world.object(ids[0]).expect("spawned");
    assert!(selection.select(&first));

    let far_away = Rect::new(600, 600, 48, 48);
    assert_eq!(selection.select_in_box(&world, far_away), 0);
    assert_eq!(selection.ids(), vec![ids[0]], "selection is unchanged");
}

#[test]
fn box_selection_truncates_to_the_cap() {
    let (world, _) = crowded_world();
    let mut selection = SelectionManager::new(SelectionConfig {
        cap: 8,
        ..SelectionConfig::default()
    });
    let area = Rect::new(0, 0, 10 * CELL_PIXELS, 5 * CELL_PIXELS);
    assert_eq!(selection.select_in_box(&world, area), 8);
}

#[test]
fn saved_group_survives_clear_and_recall() {
    let (world, ids) = crowded_world();
    let mut selection = SelectionManager::default();
    for id in &ids[..5] {
        let object = world.object(*id).expect("spawned");
        assert!(selection.add(&object));
    }
    let saved = selection.ids();
    assert!(selection.save_group(1));

    selection.clear();
    assert!(selection.is_empty());
    assert_eq!(selection.recall_group(1, &world), 5);
    assert_eq!(selection.ids(), saved, "recall restores the saved identities");

    let mut events = Vec::new();
    selection.drain_events(&mut events);
    assert_eq!(events.last(), Some(&SelectionEvent::GroupRecalled(1)));
    assert!(events.contains(&SelectionEvent::GroupSaved(1)));
    assert!(events.contains(&SelectionEvent::Cleared));
}

#[test]
fn destroyed_objects_leave_the_selection_and_every_group() {
    let (mut world, ids) = crowded_world();
    let mut selection = SelectionManager::default();
    for id in &ids[..3] {
        let object = world.object(*id).expect("spawned");
        assert!(selection.add(&object));
    }
    assert!(selection.save_group(1));
    assert!(selection.save_group(2));

    let victim = ids[1];
    assert!(world.destroy(victim, &mut selection).is_some());

    assert!(!selection.is_selected(victim));
    assert!(!selection.group(1).contains(&victim));
    assert!(!selection.group(2).contains(&victim));
    assert_eq!(selection.recall_group(2, &world), 2);
}

#[test]
fn recall_prunes_members_that_became_inactive() {
    let (mut world, ids) = crowded_world();
    let mut selection = SelectionManager::default();
    for id in &ids[..4] {
        let object = world.object(*id).expect("spawned");
        assert!(selection.add(&object));
    }
    assert!(selection.save_group(0));
    assert!(world.set_active(ids[0], false));

    assert_eq!(selection.recall_group(0, &world), 3);
    assert_eq!(selection.group_size(0), 3, "inactive member was pruned");
}

#[test]
fn recalling_an_empty_group_keeps_the_selection() {
    let (world, ids) = crowded_world();
    let mut selection = SelectionManager::default();
    let object = world.object(ids[2]).expect("spawned");
    assert!(selection.select(&object));
    assert_eq!(selection.recall_group(7, &world), 0);
    assert_eq!(selection.ids(), vec![ids[2]]);
}

#[test]
fn group_center_averages_member_positions() {
    let mut world = World::new(16, 16);
    let a = world.spawn(ObjectKind::Vehicle, PLAYER, CellCoord::new(0, 0));
    let b = world.spawn(ObjectKind::Vehicle, PLAYER, CellCoord::new(2, 0));
    let mut selection = SelectionManager::default();
    for id in [a, b] {
        let object = world.object(id).expect("spawned");
        assert!(selection.add(&object));
    }
    assert!(selection.save_group(4));

    let center = selection.group_center(4, &world).expect("group has members");
    assert_eq!((center.x(), center.y()), (CELL_PIXELS * 3 / 2, CELL_PIXELS / 2));
    assert_eq!(selection.group_center(5, &world), None);
}

#[test]
fn add_group_to_selection_merges_without_duplicates() {
    let (world, ids) = crowded_world();
    let mut selection = SelectionManager::default();
    for id in &ids[..3] {
        let object = world.object(*id).expect("spawned");
        assert!(selection.add(&object));
    }
    assert!(selection.save_group(1));
    selection.clear();

    let fourth = world.object(ids[3]).expect("spawned");
    assert!(selection.add(&fourth));
    assert!(selection.add(&world.object(ids[0]).expect("spawned")));
    assert_eq!(selection.add_group_to_selection(1, &world), 2);
    assert_eq!(selection.len(), 4);
}

#[test]
fn select_all_of_type_matches_type_and_owner() {
    let mut world = World::new(16, 16);
    let tank = TypeIndex::new(7);
    let prototype = |owner, column| {
        SelectableObject::new(ObjectId::new(0), ObjectKind::Vehicle, owner, CellCoord::new(column, 0))
            .with_type(tank)
    };
    for column in 0..3 {
        let _ = world.spawn_from(prototype(PLAYER, column));
    }
    let _ = world.spawn_from(prototype(ENEMY, 5));
    let _ = world.spawn(ObjectKind::Vehicle, PLAYER, CellCoord::new(8, 8));

    let mut selection = SelectionManager::default();
    assert_eq!(selection.select_all_of_type(&world, tank), 3);
    assert_eq!(selection.selected_type(), Some(tank));
    assert_eq!(selection.select_all_units(&world), 4);
}
