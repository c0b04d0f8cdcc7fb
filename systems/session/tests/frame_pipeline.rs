use std::cell::RefCell;
use std::time::Duration;

use tactica_core::{
    keys, CellCoord, CommandResult, CommandTarget, CommandType, CursorShape, HouseId, MissionType,
    ObjectId, ObjectKind, ObjectStore, RawInput, SelectableObject,
};
use tactica_system_command::Callbacks;
use tactica_system_cursor::InteractionMode;
use tactica_system_input::GameAction;
use tactica_system_selection::SelectionEvent;
use tactica_system_session::{FrameOutcome, Session, SessionConfig};
use tactica_world::World;

const PLAYER: HouseId = HouseId::new(0);
const ENEMY: HouseId = HouseId::new(1);

type Assigned = RefCell<Vec<(ObjectId, MissionType, CommandTarget)>>;

struct Harness {
    world: World,
    session: Session,
    clock: u64,
}

impl Harness {
    fn new(config: SessionConfig) -> Self {
        let mut world = World::new(64, 64);
        world.reveal_all();
        let mut session = Session::new(config);
        session.attach_map(&world);
        Self {
            world,
            session,
            clock: 0,
        }
    }

    fn step(
        &mut self,
        x: i32,
        y: i32,
        buttons: [bool; 3],
        keys_down: &[u8],
    ) -> (FrameOutcome, Vec<(ObjectId, MissionType, CommandTarget)>) {
        self.clock += 1000;
        let raw = RawInput {
            keys_down: keys_down.to_vec(),
            typed: Vec::new(),
            mouse_x: x,
            mouse_y: y,
            buttons,
            wheel: 0,
            timestamp: Duration::from_millis(self.clock),
        };
        let assigned: Assigned = RefCell::new(Vec::new());
        let world = &self.world;
        let mut dispatch = Callbacks::new(
            |object: &SelectableObject, command| world.can_perform(object, command),
            |object: &SelectableObject, mission, target, _| {
                assigned.borrow_mut().push((object.id, mission, target));
                true
            },
        );
        let outcome = self
            .session
            .process_frame(&raw, (1.0, 1.0), world, world, &mut dispatch);
        drop(dispatch);
        (outcome, assigned.into_inner())
    }

    fn idle(&mut self) {
        let _ = self.step(240, 200, [false; 3], &[]);
    }
}

const LEFT: [bool; 3] = [true, false, false];
const RIGHT: [bool; 3] = [false, true, false];
const NONE: [bool; 3] = [false; 3];

/// Screen position of a cell center while the view sits at the map origin.
fn on_screen(cell: CellCoord) -> (i32, i32) {
    let center = cell.center();
    (center.x(), center.y() + 16)
}

#[test]
fn clicking_an_own_unit_selects_it() {
    let mut harness = Harness::new(SessionConfig::default());
    let cell = CellCoord::new(4, 4);
    let tank = harness.world.spawn(ObjectKind::Vehicle, PLAYER, cell);
    harness.idle();

    let (x, y) = on_screen(cell);
    let (outcome, _) = harness.step(x, y, LEFT, &[]);
    assert_eq!(harness.session.selection().ids(), vec![tank]);
    assert_eq!(outcome.selection_events, vec![SelectionEvent::Replaced]);
}

#[test]
fn dragging_a_band_selects_only_player_units() {
    let mut harness = Harness::new(SessionConfig::default());
    let first = harness.world.spawn(ObjectKind::Vehicle, PLAYER, CellCoord::new(2, 2));
    let second = harness.world.spawn(ObjectKind::Infantry, PLAYER, CellCoord::new(3, 2));
    let _ = harness.world.spawn(ObjectKind::Building, PLAYER, CellCoord::new(5, 5));
    let _ = harness.world.spawn(ObjectKind::Vehicle, ENEMY, CellCoord::new(6, 6));
    harness.idle();

    let _ = harness.step(30, 40, LEFT, &[]);
    let (dragging, _) = harness.step(200, 200, LEFT, &[]);
    assert!(dragging.drag_band.is_some(), "band is reported while dragging");
    let (released, _) = harness.step(200, 200, NONE, &[]);
    assert!(released.drag_band.is_none());

    let mut selected = harness.session.selection().ids();
    selected.sort();
    assert_eq!(selected, vec![first, second]);
}

#[test]
fn right_click_on_ground_moves_the_selection() {
    let mut harness = Harness::new(SessionConfig::default());
    let ids = [
        harness.world.spawn(ObjectKind::Vehicle, PLAYER, CellCoord::new(2, 2)),
        harness.world.spawn(ObjectKind::Vehicle, PLAYER, CellCoord::new(3, 2)),
    ];
    for id in ids {
        let object = harness.world.object(id).expect("spawned");
        assert!(harness.session.selection_mut().add(&object));
    }
    harness.idle();

    let (outcome, assigned) = harness.step(300, 250, RIGHT, &[]);
    assert_eq!(outcome.command_result(), Some(CommandResult::Success));
    assert_eq!(outcome.shape, CursorShape::Move);
    assert_eq!(assigned.len(), 2);
    assert!(assigned
        .iter()
        .all(|&(_, mission, _)| mission == MissionType::Move));
}

#[test]
fn right_click_without_selection_is_rejected() {
    let mut harness = Harness::new(SessionConfig::default());
    harness.idle();
    let (outcome, assigned) = harness.step(300, 250, RIGHT, &[]);
    assert_eq!(outcome.command_result(), Some(CommandResult::InvalidSelection));
    assert!(assigned.is_empty());
}

#[test]
fn right_click_on_an_enemy_attacks_it() {
    let mut harness = Harness::new(SessionConfig::default());
    let tank = harness.world.spawn(ObjectKind::Vehicle, PLAYER, CellCoord::new(2, 2));
    let enemy_cell = CellCoord::new(8, 6);
    let enemy = harness.world.spawn(ObjectKind::Vehicle, ENEMY, enemy_cell);
    let object = harness.world.object(tank).expect("spawned");
    assert!(harness.session.selection_mut().select(&object));
    harness.idle();

    let (x, y) = on_screen(enemy_cell);
    let (hover, _) = harness.step(x, y, NONE, &[]);
    assert_eq!(hover.shape, CursorShape::Attack);

    let (outcome, assigned) = harness.step(x, y, RIGHT, &[]);
    let (command, result) = outcome.command.expect("an order was issued");
    assert_eq!(command.kind, CommandType::Attack);
    assert_eq!(result, CommandResult::Success);
    assert_eq!(
        assigned,
        vec![(tank, MissionType::Attack, CommandTarget::Object { id: enemy })]
    );
}

#[test]
fn held_arrow_keys_scroll_the_view() {
    let mut harness = Harness::new(SessionConfig::default());
    harness.idle();
    let (outcome, _) = harness.step(240, 200, NONE, &[keys::RIGHT]);
    assert!(outcome.scrolled);
    assert_eq!(harness.session.viewport().origin().x(), 16);

    let (fast, _) = harness.step(240, 200, NONE, &[keys::RIGHT, keys::SHIFT]);
    assert!(fast.scrolled);
    assert_eq!(harness.session.viewport().origin().x(), 16 + 48);
}

#[test]
fn edge_scroll_against_the_map_border_shows_no_scroll() {
    let mut harness = Harness::new(SessionConfig::default());
    let (outcome, _) = harness.step(2, 200, NONE, &[]);
    assert!(!outcome.scrolled);
    assert_eq!(outcome.shape, CursorShape::NoScroll);

    let (east, _) = harness.step(478, 200, NONE, &[]);
    assert!(east.scrolled);
    assert!(matches!(east.shape, CursorShape::Scroll(_)));
}

#[test]
fn control_groups_round_trip_through_hotkeys() {
    let mut harness = Harness::new(SessionConfig::default());
    let tank = harness.world.spawn(ObjectKind::Vehicle, PLAYER, CellCoord::new(2, 2));
    let object = harness.world.object(tank).expect("spawned");
    assert!(harness.session.selection_mut().select(&object));
    harness.idle();

    let _ = harness.step(240, 200, NONE, &[keys::CONTROL, keys::digit(1)]);
    assert_eq!(harness.session.selection().group(1), &[tank]);
    harness.idle();

    let (escape, _) = harness.step(240, 200, NONE, &[keys::ESCAPE]);
    assert!(harness.session.selection().is_empty());
    assert!(
        escape
            .interface_actions
            .contains(&GameAction::OptionsMenu),
        "escape also reaches the interface"
    );
    harness.idle();

    let (recall, _) = harness.step(240, 200, NONE, &[keys::digit(1)]);
    assert_eq!(harness.session.selection().ids(), vec![tank]);
    assert!(recall
        .selection_events
        .contains(&SelectionEvent::GroupRecalled(1)));
}

#[test]
fn repair_mode_sends_the_clicked_structure_to_repair() {
    let mut harness = Harness::new(SessionConfig::default());
    let cell = CellCoord::new(5, 5);
    let yard = harness.world.spawn(ObjectKind::Building, PLAYER, cell);
    harness.idle();

    let _ = harness.step(240, 200, NONE, &[keys::letter('r')]);
    assert_eq!(harness.session.mode(), InteractionMode::Repair);
    harness.idle();

    let (x, y) = on_screen(cell);
    let (hover, _) = harness.step(x, y, NONE, &[]);
    assert_eq!(hover.shape, CursorShape::Repair);

    let (outcome, assigned) = harness.step(x, y, LEFT, &[]);
    assert_eq!(outcome.command_result(), Some(CommandResult::Success));
    assert_eq!(
        assigned,
        vec![(yard, MissionType::Repair, CommandTarget::Object { id: yard })]
    );

    let _ = harness.step(x, y, NONE, &[]);
    let _ = harness.step(x, y, RIGHT, &[]);
    assert_eq!(harness.session.mode(), InteractionMode::Normal, "right click leaves the mode");
}

#[test]
fn partial_toml_configuration_keeps_other_defaults() {
    let config: SessionConfig = toml::from_str(
        r#"
            follow_selection = true

            [selection]
            cap = 4

            [viewport]
            keyboard_step = 8
        "#,
    )
    .expect("valid configuration");
    assert_eq!(config.selection.cap, 4);
    assert_eq!(config.viewport.keyboard_step, 8);
    assert_eq!(config.viewport.screen_width, 640);
    assert_eq!(config.input.double_click_ms, 400);
    assert!(config.follow_selection);
}
