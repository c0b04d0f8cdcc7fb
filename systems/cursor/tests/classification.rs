use tactica_core::{
    CellCoord, ContextKind, CursorShape, HouseId, LandType, ObjectId, ObjectKind, ObjectTraits,
    ScreenRegion, ScrollEdge, SelectableObject, TemplateId,
};
use tactica_system_cursor::{cursor_shape_for, CursorClassifier, CursorQuery, InteractionMode};
use tactica_world::World;

const PLAYER: HouseId = HouseId::new(0);
const ENEMY: HouseId = HouseId::new(1);

fn revealed_world() -> World {
    let mut world = World::new(16, 16);
    world.reveal_all();
    world
}

fn query_at(cell: CellCoord, mode: InteractionMode) -> CursorQuery {
    CursorQuery {
        region: ScreenRegion::Tactical,
        world: cell.center(),
        scroll: None,
        mode,
    }
}

#[test]
fn enemy_units_are_attack_targets_for_a_selection() {
    let mut world = revealed_world();
    let _ = world.spawn(ObjectKind::Vehicle, ENEMY, CellCoord::new(5, 5));
    let classifier = CursorClassifier::new(PLAYER);

    let context = classifier.classify(
        &query_at(CellCoord::new(5, 5), InteractionMode::Normal),
        &world,
        &world,
    );

    assert_eq!(context.kind, ContextKind::EnemyUnit);
    assert!(context.is_enemy && context.is_attackable);
    assert_eq!(cursor_shape_for(&context, true), CursorShape::Attack);
    assert_eq!(cursor_shape_for(&context, false), CursorShape::Arrow);
}

#[test]
fn own_transport_offers_enter() {
    let mut world = revealed_world();
    let _ = world.spawn_from(
        SelectableObject::new(ObjectId::new(0), ObjectKind::Vehicle, PLAYER, CellCoord::new(2, 2))
            .with_traits(ObjectTraits::TRANSPORT | ObjectTraits::ATTACKABLE),
    );
    let classifier = CursorClassifier::new(PLAYER);

    let context = classifier.classify(
        &query_at(CellCoord::new(2, 2), InteractionMode::Normal),
        &world,
        &world,
    );

    assert_eq!(context.kind, ContextKind::OwnTransport);
    assert_eq!(cursor_shape_for(&context, true), CursorShape::Enter);
    assert_eq!(cursor_shape_for(&context, false), CursorShape::Select);
}

#[test]
fn shrouded_cells_hide_objects() {
    let mut world = World::new(16, 16);
    let _ = world.spawn(ObjectKind::Vehicle, ENEMY, CellCoord::new(3, 3));
    let classifier = CursorClassifier::new(PLAYER);

    let context = classifier.classify(
        &query_at(CellCoord::new(3, 3), InteractionMode::Normal),
        &world,
        &world,
    );

    assert_eq!(context.kind, ContextKind::TerrainShroud);
    assert!(context.object.is_none(), "shroud must not leak the enemy position");
}

#[test]
fn water_and_resources_are_classified_from_land_type() {
    let mut world = revealed_world();
    assert!(world.set_terrain(CellCoord::new(1, 1), LandType::Water, TemplateId::new(1), 0));
    assert!(world.set_terrain(CellCoord::new(2, 1), LandType::Tiberium, TemplateId::CLEAR, 0));
    let classifier = CursorClassifier::new(PLAYER);

    let water = classifier.classify(&query_at(CellCoord::new(1, 1), InteractionMode::Normal), &world, &world);
    let field = classifier.classify(&query_at(CellCoord::new(2, 1), InteractionMode::Normal), &world, &world);

    assert_eq!(water.kind, ContextKind::TerrainWater);
    assert_eq!(cursor_shape_for(&water, true), CursorShape::NoMove);
    assert_eq!(field.kind, ContextKind::HarvestArea);
    assert_eq!(cursor_shape_for(&field, true), CursorShape::Harvest);
}

#[test]
fn classification_reflects_changes_between_queries() {
    let mut world = revealed_world();
    let classifier = CursorClassifier::new(PLAYER);
    let query = query_at(CellCoord::new(4, 4), InteractionMode::Normal);

    assert_eq!(classifier.classify(&query, &world, &world).kind, ContextKind::TerrainPassable);
    assert!(world.set_terrain(CellCoord::new(4, 4), LandType::Rock, TemplateId::CLEAR, 0));
    assert_eq!(classifier.classify(&query, &world, &world).kind, ContextKind::TerrainBlocked);
}

#[test]
fn modes_override_normal_classification() {
    let mut world = revealed_world();
    let _ = world.spawn(ObjectKind::Building, PLAYER, CellCoord::new(6, 6));
    let _ = world.spawn(ObjectKind::Building, ENEMY, CellCoord::new(10, 10));
    let classifier = CursorClassifier::new(PLAYER);

    let sell = classifier.classify(&query_at(CellCoord::new(6, 6), InteractionMode::Sell), &world, &world);
    let sell_enemy = classifier.classify(&query_at(CellCoord::new(10, 10), InteractionMode::Sell), &world, &world);
    let repair = classifier.classify(&query_at(CellCoord::new(6, 6), InteractionMode::Repair), &world, &world);
    let place_free = classifier.classify(&query_at(CellCoord::new(1, 12), InteractionMode::Placement), &world, &world);
    let place_taken = classifier.classify(&query_at(CellCoord::new(6, 6), InteractionMode::Placement), &world, &world);

    assert_eq!(sell.kind, ContextKind::SellTarget);
    assert_eq!(sell_enemy.kind, ContextKind::Normal, "enemy structures cannot be sold");
    assert_eq!(repair.kind, ContextKind::RepairTarget);
    assert_eq!(cursor_shape_for(&repair, false), CursorShape::Repair);
    assert_eq!(place_free.kind, ContextKind::PlacementValid);
    assert_eq!(place_taken.kind, ContextKind::PlacementInvalid);
}

#[test]
fn edge_scroll_wins_unless_disabled() {
    let world = revealed_world();
    let mut query = query_at(CellCoord::new(0, 0), InteractionMode::Normal);
    query.scroll = Some(ScrollEdge::NorthWest);

    let scrolling = CursorClassifier::new(PLAYER).classify(&query, &world, &world);
    let fixed = CursorClassifier::new(PLAYER)
        .with_edge_scroll(false)
        .classify(&query, &world, &world);

    assert_eq!(scrolling.kind, ContextKind::Scroll(ScrollEdge::NorthWest));
    assert_eq!(fixed.kind, ContextKind::TerrainPassable);
}
