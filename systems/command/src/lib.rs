#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Resolution of cursor contexts into orders and their dispatch to the selection.
//!
//! [`CommandSystem::resolve_command`] is a pure decision table over a
//! [`CursorContext`] and the modifier keys. Dispatch goes through the
//! [`MissionDispatch`] collaborator, which answers the per-object capability
//! check and performs the mission assignment; the system itself never
//! touches object state.

use serde::{Deserialize, Serialize};
use tactica_core::{
    AudioService, CellCoord, Command, CommandFlags, CommandResult, CommandTarget, CommandType,
    ContextKind, CursorContext, MissionType, ObjectId, SelectableObject, SoundId, VoiceHandle,
    WorldPoint,
};
use tracing::debug;

/// Collaborator that checks capabilities and assigns missions to objects.
pub trait MissionDispatch {
    /// Returns `true` when the object is able to carry out the command.
    fn can_perform(&self, object: &SelectableObject, command: CommandType) -> bool;

    /// Hands the mission to the object. `queued` appends instead of replacing
    /// the object's current orders. Returns `false` when the object refused.
    fn assign(
        &mut self,
        object: &SelectableObject,
        mission: MissionType,
        target: CommandTarget,
        queued: bool,
    ) -> bool;
}

/// [`MissionDispatch`] built from a pair of closures.
#[derive(Debug)]
pub struct Callbacks<C, A> {
    can_perform: C,
    assign: A,
}

impl<C, A> Callbacks<C, A>
where
    C: Fn(&SelectableObject, CommandType) -> bool,
    A: FnMut(&SelectableObject, MissionType, CommandTarget, bool) -> bool,
{
    /// Wraps the capability check and the assignment callback.
    #[must_use]
    pub const fn new(can_perform: C, assign: A) -> Self {
        Self {
            can_perform,
            assign,
        }
    }
}

impl<C, A> MissionDispatch for Callbacks<C, A>
where
    C: Fn(&SelectableObject, CommandType) -> bool,
    A: FnMut(&SelectableObject, MissionType, CommandTarget, bool) -> bool,
{
    fn can_perform(&self, object: &SelectableObject, command: CommandType) -> bool {
        (self.can_perform)(object, command)
    }

    fn assign(
        &mut self,
        object: &SelectableObject,
        mission: MissionType,
        target: CommandTarget,
        queued: bool,
    ) -> bool {
        (self.assign)(object, mission, target, queued)
    }
}

/// Voice feedback settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandConfig {
    /// Whether accepted and rejected orders produce a sound.
    pub acknowledge: bool,
    /// Volume used for acknowledgements (0..=255).
    pub volume: u8,
}

impl Default for CommandConfig {
    fn default() -> Self {
        Self {
            acknowledge: true,
            volume: 192,
        }
    }
}

/// Turns cursor contexts into commands and dispatches them.
#[derive(Clone, Debug, Default)]
pub struct CommandSystem {
    config: CommandConfig,
    last_command: Command,
    last_result: Option<CommandResult>,
    voice: Option<VoiceHandle>,
}

impl CommandSystem {
    /// Creates a command system with no history.
    #[must_use]
    pub fn new(config: CommandConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Derives the order a right click on the context would issue.
    ///
    /// `shift` queues the order, `ctrl` forces an attack and `alt` forces a
    /// move. Force-move wins over force-attack.
    #[must_use]
    pub fn resolve_command(
        &self,
        context: &CursorContext,
        shift: bool,
        ctrl: bool,
        alt: bool,
    ) -> Command {
        let mut flags = CommandFlags::empty();
        flags.set(CommandFlags::QUEUED, shift);
        flags.set(CommandFlags::FORCED, ctrl);
        flags.set(CommandFlags::ALT, alt);

        let target = match context.object {
            Some(object) => CommandTarget::Object { id: object.id },
            None => CommandTarget::Ground {
                point: context.world,
            },
        };
        Command::new(command_for_context(context, ctrl, alt), target, flags)
    }

    /// Issues a command to the provided selection snapshot.
    ///
    /// Objects failing the capability check are skipped; the command succeeds
    /// as long as one object accepted its mission.
    pub fn issue<D>(
        &mut self,
        command: Command,
        selection: &[SelectableObject],
        dispatch: &mut D,
    ) -> CommandResult
    where
        D: MissionDispatch + ?Sized,
    {
        let result = execute(command, selection, dispatch);
        debug!(kind = ?command.kind, ?result, "command issued");
        self.last_command = command;
        self.last_result = Some(result);
        result
    }

    /// Orders the selection to move to a world position.
    pub fn issue_move<D>(
        &mut self,
        point: WorldPoint,
        queued: bool,
        selection: &[SelectableObject],
        dispatch: &mut D,
    ) -> CommandResult
    where
        D: MissionDispatch + ?Sized,
    {
        let command = Command::new(
            CommandType::Move,
            CommandTarget::Ground { point },
            queued_flag(queued),
        );
        self.issue(command, selection, dispatch)
    }

    /// Orders the selection to attack an object.
    pub fn issue_attack<D>(
        &mut self,
        target: ObjectId,
        queued: bool,
        selection: &[SelectableObject],
        dispatch: &mut D,
    ) -> CommandResult
    where
        D: MissionDispatch + ?Sized,
    {
        let command = Command::new(
            CommandType::Attack,
            CommandTarget::Object { id: target },
            queued_flag(queued),
        );
        self.issue(command, selection, dispatch)
    }

    /// Orders the selection to fire at a world position.
    pub fn issue_attack_ground<D>(
        &mut self,
        point: WorldPoint,
        queued: bool,
        selection: &[SelectableObject],
        dispatch: &mut D,
    ) -> CommandResult
    where
        D: MissionDispatch + ?Sized,
    {
        let command = Command::new(
            CommandType::ForceFire,
            CommandTarget::Ground { point },
            queued_flag(queued) | CommandFlags::FORCED,
        );
        self.issue(command, selection, dispatch)
    }

    /// Orders the selection to guard its position.
    pub fn issue_guard<D>(
        &mut self,
        queued: bool,
        selection: &[SelectableObject],
        dispatch: &mut D,
    ) -> CommandResult
    where
        D: MissionDispatch + ?Sized,
    {
        let command = Command::new(CommandType::Guard, CommandTarget::None, queued_flag(queued));
        self.issue(command, selection, dispatch)
    }

    /// Cancels the selection's orders.
    pub fn issue_stop<D>(
        &mut self,
        selection: &[SelectableObject],
        dispatch: &mut D,
    ) -> CommandResult
    where
        D: MissionDispatch + ?Sized,
    {
        self.issue_untargeted(CommandType::Stop, selection, dispatch)
    }

    /// Spreads the selection out.
    pub fn issue_scatter<D>(
        &mut self,
        selection: &[SelectableObject],
        dispatch: &mut D,
    ) -> CommandResult
    where
        D: MissionDispatch + ?Sized,
    {
        self.issue_untargeted(CommandType::Scatter, selection, dispatch)
    }

    /// Deploys or unloads the selection.
    pub fn issue_deploy<D>(
        &mut self,
        selection: &[SelectableObject],
        dispatch: &mut D,
    ) -> CommandResult
    where
        D: MissionDispatch + ?Sized,
    {
        self.issue_untargeted(CommandType::Deploy, selection, dispatch)
    }

    /// Sends the selection into a transport or structure.
    pub fn issue_enter<D>(
        &mut self,
        transport: ObjectId,
        selection: &[SelectableObject],
        dispatch: &mut D,
    ) -> CommandResult
    where
        D: MissionDispatch + ?Sized,
    {
        self.issue_on_object(CommandType::Enter, transport, selection, dispatch)
    }

    /// Sends the selection's harvesters to a cell.
    pub fn issue_harvest<D>(
        &mut self,
        cell: CellCoord,
        selection: &[SelectableObject],
        dispatch: &mut D,
    ) -> CommandResult
    where
        D: MissionDispatch + ?Sized,
    {
        let command = Command::new(
            CommandType::Harvest,
            CommandTarget::Cell { cell },
            CommandFlags::empty(),
        );
        self.issue(command, selection, dispatch)
    }

    /// Sells a structure.
    pub fn issue_sell<D>(
        &mut self,
        building: ObjectId,
        selection: &[SelectableObject],
        dispatch: &mut D,
    ) -> CommandResult
    where
        D: MissionDispatch + ?Sized,
    {
        self.issue_on_object(CommandType::Sell, building, selection, dispatch)
    }

    /// Repairs a structure.
    pub fn issue_repair<D>(
        &mut self,
        building: ObjectId,
        selection: &[SelectableObject],
        dispatch: &mut D,
    ) -> CommandResult
    where
        D: MissionDispatch + ?Sized,
    {
        self.issue_on_object(CommandType::Repair, building, selection, dispatch)
    }

    fn issue_untargeted<D>(
        &mut self,
        kind: CommandType,
        selection: &[SelectableObject],
        dispatch: &mut D,
    ) -> CommandResult
    where
        D: MissionDispatch + ?Sized,
    {
        let command = Command::new(kind, CommandTarget::None, CommandFlags::empty());
        self.issue(command, selection, dispatch)
    }

    fn issue_on_object<D>(
        &mut self,
        kind: CommandType,
        id: ObjectId,
        selection: &[SelectableObject],
        dispatch: &mut D,
    ) -> CommandResult
    where
        D: MissionDispatch + ?Sized,
    {
        let command = Command::new(kind, CommandTarget::Object { id }, CommandFlags::empty());
        self.issue(command, selection, dispatch)
    }

    /// Most recently issued command.
    #[must_use]
    pub const fn last_command(&self) -> Command {
        self.last_command
    }

    /// Result of the most recently issued command, if any was issued.
    #[must_use]
    pub const fn last_result(&self) -> Option<CommandResult> {
        self.last_result
    }

    /// Plays the voice response for the last result.
    ///
    /// The previous response is cut off so responses never stack up.
    pub fn acknowledge<A>(&mut self, audio: &mut A)
    where
        A: AudioService + ?Sized,
    {
        if !self.config.acknowledge {
            return;
        }
        let Some(result) = self.last_result else {
            return;
        };
        if let Some(voice) = self.voice.take() {
            audio.stop(voice);
        }
        let sound = if result.is_success() {
            SoundId::ACKNOWLEDGE
        } else {
            SoundId::REJECTED
        };
        self.voice = audio.play(sound, self.config.volume);
    }

    /// Changes the acknowledgement volume, including a response still playing.
    pub fn set_volume<A>(&mut self, volume: u8, audio: &mut A)
    where
        A: AudioService + ?Sized,
    {
        self.config.volume = volume;
        if let Some(voice) = self.voice {
            audio.set_volume(voice, volume);
        }
    }
}

const fn queued_flag(queued: bool) -> CommandFlags {
    if queued {
        CommandFlags::QUEUED
    } else {
        CommandFlags::empty()
    }
}

fn command_for_context(
    context: &CursorContext,
    force_attack: bool,
    force_move: bool,
) -> CommandType {
    if force_move {
        return CommandType::Move;
    }
    let Some(object) = context.object else {
        return if force_attack {
            CommandType::ForceFire
        } else if context.is_passable {
            CommandType::Move
        } else {
            CommandType::None
        };
    };
    if force_attack {
        return CommandType::Attack;
    }

    if context.is_enemy && context.is_attackable {
        CommandType::Attack
    } else if context.is_own && context.kind == ContextKind::OwnTransport {
        CommandType::Enter
    } else if context.is_own && context.kind == ContextKind::OwnUnit {
        CommandType::Guard
    } else if context.is_own && object.kind.is_building() {
        CommandType::Enter
    } else if context.kind == ContextKind::NeutralBuilding {
        CommandType::Capture
    } else if context.kind == ContextKind::HarvestArea {
        CommandType::Harvest
    } else if context.is_passable {
        CommandType::Move
    } else {
        CommandType::None
    }
}

fn execute<D>(command: Command, selection: &[SelectableObject], dispatch: &mut D) -> CommandResult
where
    D: MissionDispatch + ?Sized,
{
    if command.kind == CommandType::None {
        return CommandResult::InvalidTarget;
    }
    if selection.is_empty() {
        return CommandResult::InvalidSelection;
    }
    let Some(mission) = command.kind.mission() else {
        debug!(kind = ?command.kind, "command has no mission");
        return CommandResult::CannotPerform;
    };

    let mut accepted = 0_usize;
    for object in selection {
        if !dispatch.can_perform(object, command.kind) {
            continue;
        }
        if dispatch.assign(object, mission, command.target, command.is_queued()) {
            accepted += 1;
        }
    }
    debug!(
        kind = ?command.kind,
        accepted,
        refused = selection.len() - accepted,
        "command dispatched"
    );
    if accepted == 0 {
        CommandResult::CannotPerform
    } else {
        CommandResult::Success
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tactica_core::{HouseId, ObjectKind, ObjectTraits, ScreenRegion};

    fn enemy_tank() -> SelectableObject {
        SelectableObject::new(
            ObjectId::new(9),
            ObjectKind::Vehicle,
            HouseId::new(1),
            CellCoord::new(4, 4),
        )
    }

    fn ground(passable: bool) -> CursorContext {
        CursorContext {
            kind: if passable {
                ContextKind::TerrainPassable
            } else {
                ContextKind::TerrainBlocked
            },
            region: ScreenRegion::Tactical,
            world: WorldPoint::new(100, 100),
            is_passable: passable,
            is_visible: true,
            ..CursorContext::default()
        }
    }

    fn enemy() -> CursorContext {
        CursorContext {
            kind: ContextKind::EnemyUnit,
            object: Some(enemy_tank()),
            is_enemy: true,
            is_attackable: true,
            ..ground(true)
        }
    }

    #[test]
    fn decision_table_matches_the_modifier_rules() {
        let system = CommandSystem::default();
        let resolve = |context: &CursorContext, ctrl, alt| {
            system.resolve_command(context, false, ctrl, alt).kind
        };
        assert_eq!(resolve(&ground(true), false, false), CommandType::Move);
        assert_eq!(resolve(&enemy(), false, false), CommandType::Attack);
        assert_eq!(resolve(&enemy(), false, true), CommandType::Move, "alt forces a move");
        assert_eq!(resolve(&ground(true), true, false), CommandType::ForceFire);
        assert_eq!(resolve(&ground(false), false, false), CommandType::None);
        assert_eq!(resolve(&enemy(), true, true), CommandType::Move, "alt wins over ctrl");
    }

    #[test]
    fn own_objects_resolve_to_guard_or_enter() {
        let system = CommandSystem::default();
        let own = |kind, object_kind, traits| CursorContext {
            kind,
            object: Some(
                SelectableObject::new(
                    ObjectId::new(2),
                    object_kind,
                    HouseId::new(0),
                    CellCoord::new(1, 1),
                )
                .with_traits(traits),
            ),
            is_own: true,
            is_selectable: true,
            is_attackable: true,
            ..ground(true)
        };
        let resolve = |context: &CursorContext| system.resolve_command(context, false, false, false);

        let transport = own(
            ContextKind::OwnTransport,
            ObjectKind::Vehicle,
            ObjectTraits::TRANSPORT,
        );
        assert_eq!(resolve(&transport).kind, CommandType::Enter);

        let unit = own(ContextKind::OwnUnit, ObjectKind::Vehicle, ObjectTraits::empty());
        assert_eq!(resolve(&unit).kind, CommandType::Guard);

        let depot = own(
            ContextKind::OwnBuilding,
            ObjectKind::Building,
            ObjectTraits::REPAIRABLE,
        );
        assert_eq!(resolve(&depot).kind, CommandType::Enter);
        assert_eq!(
            resolve(&depot).target,
            CommandTarget::Object { id: ObjectId::new(2) }
        );
    }

    #[test]
    fn neutral_buildings_and_resources_have_their_own_orders() {
        let system = CommandSystem::default();
        let neutral = CursorContext {
            kind: ContextKind::NeutralBuilding,
            object: Some(
                SelectableObject::new(
                    ObjectId::new(5),
                    ObjectKind::Building,
                    HouseId::new(7),
                    CellCoord::new(2, 2),
                )
                .with_traits(ObjectTraits::CIVILIAN),
            ),
            ..ground(false)
        };
        assert_eq!(
            system.resolve_command(&neutral, false, false, false).kind,
            CommandType::Capture
        );

        let field = CursorContext {
            kind: ContextKind::HarvestArea,
            ..ground(true)
        };
        let command = system.resolve_command(&field, true, false, false);
        assert_eq!(command.kind, CommandType::Move, "empty resource cells resolve to a move");
        assert!(command.is_queued(), "shift queues the order");
    }

    #[test]
    fn modifiers_are_recorded_as_flags() {
        let system = CommandSystem::default();
        let command = system.resolve_command(&ground(true), true, true, false);
        assert!(command.flags.contains(CommandFlags::QUEUED | CommandFlags::FORCED));
        assert!(!command.flags.contains(CommandFlags::ALT));
        assert_eq!(
            command.target,
            CommandTarget::Ground {
                point: WorldPoint::new(100, 100)
            }
        );
    }

    #[test]
    fn commands_without_missions_cannot_be_performed() {
        let mut system = CommandSystem::default();
        let unit = SelectableObject::new(
            ObjectId::new(1),
            ObjectKind::Vehicle,
            HouseId::new(0),
            CellCoord::new(0, 0),
        );
        let mut dispatch = Callbacks::new(
            |_: &SelectableObject, _| true,
            |_: &SelectableObject, _, _, _| true,
        );
        assert_eq!(
            system.issue_scatter(&[unit], &mut dispatch),
            CommandResult::CannotPerform
        );
        assert_eq!(system.last_command().kind, CommandType::Scatter);
    }

    #[test]
    fn none_commands_report_an_invalid_target() {
        let mut system = CommandSystem::default();
        let mut dispatch = Callbacks::new(
            |_: &SelectableObject, _| true,
            |_: &SelectableObject, _, _, _| true,
        );
        let command = Command::default();
        assert_eq!(
            system.issue(command, &[], &mut dispatch),
            CommandResult::InvalidTarget
        );
        assert_eq!(system.last_result(), Some(CommandResult::InvalidTarget));
    }
}
