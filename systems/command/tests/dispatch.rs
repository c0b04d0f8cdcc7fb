use tactica_core::{
    AudioService, CellCoord, CommandResult, CommandTarget, CommandType, HouseId, MissionType,
    ObjectKind, ObjectStore, ObjectTraits, SelectableObject, SoundId, VoiceHandle, WorldPoint,
};
use tactica_system_command::{Callbacks, CommandSystem, MissionDispatch};
use tactica_system_selection::SelectionManager;
use tactica_world::{query, World};

const PLAYER: HouseId = HouseId::new(0);

struct WorldDispatch<'a> {
    world: &'a mut World,
}

impl MissionDispatch for WorldDispatch<'_> {
    fn can_perform(&self, object: &SelectableObject, command: CommandType) -> bool {
        self.world.can_perform(object, command)
    }

    fn assign(
        &mut self,
        object: &SelectableObject,
        mission: MissionType,
        target: CommandTarget,
        queued: bool,
    ) -> bool {
        self.world.assign_mission(object, mission, target, queued)
    }
}

#[derive(Default)]
struct RecordingAudio {
    played: Vec<SoundId>,
    stopped: Vec<VoiceHandle>,
    volumes: Vec<(VoiceHandle, u8)>,
}

impl AudioService for RecordingAudio {
    fn play(&mut self, sound: SoundId, _volume: u8) -> Option<VoiceHandle> {
        self.played.push(sound);
        Some(VoiceHandle::new(self.played.len() as u32))
    }

    fn stop(&mut self, voice: VoiceHandle) {
        self.stopped.push(voice);
    }

    fn set_volume(&mut self, voice: VoiceHandle, volume: u8) {
        self.volumes.push((voice, volume));
    }
}

#[test]
fn two_selected_units_receive_a_move_mission_each() {
    let mut world = World::new(16, 16);
    let first = world.spawn(ObjectKind::Vehicle, PLAYER, CellCoord::new(1, 1));
    let second = world.spawn(ObjectKind::Infantry, PLAYER, CellCoord::new(2, 1));

    let mut selection = SelectionManager::default();
    assert!(selection.select(&world.object(first).expect("spawned")));
    assert!(selection.add(&world.object(second).expect("spawned")));

    let mut assigned = Vec::new();
    let mut dispatch = Callbacks::new(
        |_: &SelectableObject, _| true,
        |object: &SelectableObject, mission, _, queued| {
            assigned.push((object.id, mission, queued));
            true
        },
    );
    let mut system = CommandSystem::default();
    let objects = selection.objects(&world);
    let result = system.issue_move(WorldPoint::new(100, 100), false, &objects, &mut dispatch);

    assert_eq!(result, CommandResult::Success);
    assert_eq!(assigned.len(), 2, "one assignment per selected unit");
    assert!(
        assigned
            .iter()
            .all(|&(_, mission, queued)| mission == MissionType::Move && !queued),
        "every unit is told to move"
    );
}

#[test]
fn empty_selection_assigns_nothing() {
    let mut calls = 0;
    let mut dispatch = Callbacks::new(
        |_: &SelectableObject, _| true,
        |_: &SelectableObject, _, _, _| {
            calls += 1;
            true
        },
    );
    let mut system = CommandSystem::default();
    let result = system.issue_move(WorldPoint::new(10, 10), false, &[], &mut dispatch);
    drop(dispatch);
    assert_eq!(result, CommandResult::InvalidSelection);
    assert_eq!(calls, 0);
}

#[test]
fn incapable_objects_are_skipped_without_failing_the_order() {
    let mut world = World::new(16, 16);
    let tank = world.spawn(ObjectKind::Vehicle, PLAYER, CellCoord::new(1, 1));
    let yard = world.spawn(ObjectKind::Building, PLAYER, CellCoord::new(4, 4));
    let objects: Vec<SelectableObject> = [tank, yard]
        .into_iter()
        .filter_map(|id| world.object(id))
        .collect();

    let mut system = CommandSystem::default();
    let result = system.issue_move(
        WorldPoint::new(200, 200),
        false,
        &objects,
        &mut WorldDispatch { world: &mut world },
    );
    assert_eq!(result, CommandResult::Success);
    assert_eq!(query::orders(&world, tank).len(), 1);
    assert!(query::orders(&world, yard).is_empty(), "buildings cannot move");

    let harvest = system.issue_harvest(
        CellCoord::new(3, 3),
        &objects,
        &mut WorldDispatch { world: &mut world },
    );
    assert_eq!(harvest, CommandResult::CannotPerform, "nobody can harvest");
}

#[test]
fn shift_appends_to_the_order_queue() {
    let mut world = World::new(16, 16);
    let tank = world.spawn(ObjectKind::Vehicle, PLAYER, CellCoord::new(1, 1));
    let objects = vec![world.object(tank).expect("spawned")];
    let mut system = CommandSystem::default();

    for (x, queued) in [(50, false), (80, true), (120, true)] {
        let result = system.issue_move(
            WorldPoint::new(x, 50),
            queued,
            &objects,
            &mut WorldDispatch { world: &mut world },
        );
        assert!(result.is_success());
    }
    assert_eq!(query::orders(&world, tank).len(), 3);

    let _ = system.issue_stop(&objects, &mut WorldDispatch { world: &mut world });
    let orders = query::orders(&world, tank);
    assert_eq!(orders.len(), 1, "an unqueued order replaces the queue");
    assert_eq!(orders[0].mission, MissionType::Stop);
}

#[test]
fn attacks_on_missing_targets_are_refused() {
    let mut world = World::new(16, 16);
    let tank = world.spawn(ObjectKind::Vehicle, PLAYER, CellCoord::new(1, 1));
    let enemy = world.spawn(ObjectKind::Vehicle, HouseId::new(1), CellCoord::new(5, 5));
    let objects = vec![world.object(tank).expect("spawned")];
    let mut system = CommandSystem::default();

    let mut selection = SelectionManager::default();
    let _ = world.destroy(enemy, &mut selection);

    let result = system.issue_attack(
        enemy,
        false,
        &objects,
        &mut WorldDispatch { world: &mut world },
    );
    assert_eq!(result, CommandResult::CannotPerform);
}

#[test]
fn sell_and_repair_reach_structures_with_the_matching_traits() {
    let mut world = World::new(16, 16);
    let refinery = world.spawn(ObjectKind::Building, PLAYER, CellCoord::new(3, 3));
    let objects = vec![world.object(refinery).expect("spawned")];
    assert!(objects[0].traits.contains(ObjectTraits::REPAIRABLE));

    let mut system = CommandSystem::default();
    let repair = system.issue_repair(refinery, &objects, &mut WorldDispatch { world: &mut world });
    assert_eq!(repair, CommandResult::Success);
    let sell = system.issue_sell(refinery, &objects, &mut WorldDispatch { world: &mut world });
    assert_eq!(sell, CommandResult::CannotPerform, "selling has no mission");
    assert_eq!(system.last_command().kind, CommandType::Sell);
}

#[test]
fn acknowledgements_follow_the_last_result() {
    let mut audio = RecordingAudio::default();
    let mut system = CommandSystem::default();
    system.acknowledge(&mut audio);
    assert!(audio.played.is_empty(), "nothing to acknowledge yet");

    let unit = SelectableObject::new(
        tactica_core::ObjectId::new(1),
        ObjectKind::Vehicle,
        PLAYER,
        CellCoord::new(0, 0),
    );
    let mut dispatch = Callbacks::new(
        |_: &SelectableObject, _| true,
        |_: &SelectableObject, _, _, _| true,
    );
    let _ = system.issue_guard(false, &[unit], &mut dispatch);
    system.acknowledge(&mut audio);
    let _ = system.issue_guard(false, &[], &mut dispatch);
    system.acknowledge(&mut audio);
    system.set_volume(64, &mut audio);

    assert_eq!(audio.played, vec![SoundId::ACKNOWLEDGE, SoundId::REJECTED]);
    assert_eq!(audio.stopped, vec![VoiceHandle::new(1)], "previous voice is cut off");
    assert_eq!(audio.volumes, vec![(VoiceHandle::new(2), 64)]);
}
