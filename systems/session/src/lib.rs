#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Explicit per-frame context tying the input systems together.
//!
//! A [`Session`] owns the viewport, the input state and key mapper, the
//! cursor classifier, the selection and the command system. The external
//! frame loop calls [`Session::process_frame`] once per tick with the raw
//! device snapshot and the world collaborators; nothing here is global.

use serde::{Deserialize, Serialize};
use tactica_core::{
    AudioService, CellCoord, Command, CommandFlags, CommandResult, CommandTarget, CommandType,
    ContextKind, CursorContext, CursorShape, MouseButton, ObjectStore, RawInput, Rect,
    ScreenPoint, ScreenRegion, SelectableObject, TerrainMap, WorldPoint,
};
use tactica_system_command::{CommandConfig, CommandSystem, MissionDispatch};
use tactica_system_cursor::{
    cursor_shape_for, CursorClassifier, CursorQuery, InteractionMode, ScreenLayout,
};
use tactica_system_input::{
    GameAction, InputConfig, InputFocus, InputMapper, InputState, Modifiers, MouseState,
};
use tactica_system_selection::{SelectionConfig, SelectionEvent, SelectionManager};
use tactica_system_viewport::{ScrollDirection, Viewport, ViewportConfig};
use tracing::debug;

/// Aggregated configuration of every input-side subsystem.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Viewport geometry and scroll speeds.
    pub viewport: ViewportConfig,
    /// Device thresholds and key bindings.
    pub input: InputConfig,
    /// Selection cap and player house.
    pub selection: SelectionConfig,
    /// Order acknowledgement settings.
    pub command: CommandConfig,
    /// Placement of the interface panels.
    pub layout: ScreenLayout,
    /// Disables mouse edge scrolling when set.
    pub disable_edge_scroll: bool,
    /// Keeps the view on the primary selected object.
    pub follow_selection: bool,
}

/// Everything a frame produced that the presentation layer may need.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FrameOutcome {
    /// Classification of the cursor position.
    pub context: CursorContext,
    /// Cursor image to display.
    pub shape: CursorShape,
    /// Order issued this frame together with its result.
    pub command: Option<(Command, CommandResult)>,
    /// Selection changes made this frame.
    pub selection_events: Vec<SelectionEvent>,
    /// Whether the view moved.
    pub scrolled: bool,
    /// Selection band being dragged, in screen pixels.
    pub drag_band: Option<Rect>,
    /// Cell confirmed while in placement mode.
    pub placement: Option<CellCoord>,
    /// Interface actions the session does not handle itself.
    pub interface_actions: Vec<GameAction>,
}

impl FrameOutcome {
    /// Result of the order issued this frame, if any.
    #[must_use]
    pub fn command_result(&self) -> Option<CommandResult> {
        self.command.map(|(_, result)| result)
    }
}

/// Input-side state of one running game.
#[derive(Clone, Debug)]
pub struct Session {
    config: SessionConfig,
    viewport: Viewport,
    input: InputState,
    mapper: InputMapper,
    classifier: CursorClassifier,
    selection: SelectionManager,
    commands: CommandSystem,
    mode: InteractionMode,
    attack_move_armed: bool,
    frame: u64,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

impl Session {
    /// Builds every subsystem from the configuration.
    #[must_use]
    pub fn new(config: SessionConfig) -> Self {
        let viewport = Viewport::new(config.viewport);
        let mut input = InputState::new(config.input.clone());
        input.set_drag_region(viewport.tactical_rect());
        let mapper = config.input.mapper();
        let selection = SelectionManager::new(config.selection);
        let classifier = CursorClassifier::new(selection.player())
            .with_edge_scroll(!config.disable_edge_scroll);
        let commands = CommandSystem::new(config.command);
        Self {
            config,
            viewport,
            input,
            mapper,
            classifier,
            selection,
            commands,
            mode: InteractionMode::Normal,
            attack_move_armed: false,
            frame: 0,
        }
    }

    /// Sizes the viewport to the terrain.
    pub fn attach_map<T>(&mut self, terrain: &T)
    where
        T: TerrainMap + ?Sized,
    {
        let (columns, rows) = terrain.size_in_cells();
        self.viewport.set_map_cells(columns, rows);
    }

    /// Configuration in use.
    #[must_use]
    pub const fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Viewport state.
    #[must_use]
    pub const fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Mutable viewport state.
    pub fn viewport_mut(&mut self) -> &mut Viewport {
        &mut self.viewport
    }

    /// Device state.
    #[must_use]
    pub const fn input(&self) -> &InputState {
        &self.input
    }

    /// Mutable device state, used to change focus or start text entry.
    pub fn input_mut(&mut self) -> &mut InputState {
        &mut self.input
    }

    /// Key mapper.
    #[must_use]
    pub const fn mapper(&self) -> &InputMapper {
        &self.mapper
    }

    /// Current selection.
    #[must_use]
    pub const fn selection(&self) -> &SelectionManager {
        &self.selection
    }

    /// Mutable selection; storage routes destruction notices through it.
    pub fn selection_mut(&mut self) -> &mut SelectionManager {
        &mut self.selection
    }

    /// Command history.
    #[must_use]
    pub const fn commands(&self) -> &CommandSystem {
        &self.commands
    }

    /// Active interaction mode.
    #[must_use]
    pub const fn mode(&self) -> InteractionMode {
        self.mode
    }

    /// Enters structure placement mode.
    pub fn begin_placement(&mut self) {
        self.set_mode(InteractionMode::Placement);
    }

    /// Returns to normal interaction.
    pub fn cancel_mode(&mut self) {
        self.set_mode(InteractionMode::Normal);
    }

    fn set_mode(&mut self, mode: InteractionMode) {
        if self.mode != mode {
            debug!(from = ?self.mode, to = ?mode, "interaction mode changed");
        }
        self.mode = mode;
    }

    /// Returns `true` while the next left click issues an attack-move.
    #[must_use]
    pub const fn is_attack_move_armed(&self) -> bool {
        self.attack_move_armed
    }

    /// Number of frames processed so far.
    #[must_use]
    pub const fn frame(&self) -> u64 {
        self.frame
    }

    /// Mouse position in world pixels.
    #[must_use]
    pub const fn mouse_world(&self) -> WorldPoint {
        self.viewport.screen_to_world(self.input.mouse().position())
    }

    /// Plays the voice response to the most recent order.
    pub fn acknowledge<A>(&mut self, audio: &mut A)
    where
        A: AudioService + ?Sized,
    {
        self.commands.acknowledge(audio);
    }

    /// Runs one frame of the input pipeline.
    ///
    /// `scale` is the ratio of window pixels to game-screen pixels. The store
    /// and terrain are only read; orders reach the world through `dispatch`.
    pub fn process_frame<S, T, D>(
        &mut self,
        raw: &RawInput,
        scale: (f32, f32),
        store: &S,
        terrain: &T,
        dispatch: &mut D,
    ) -> FrameOutcome
    where
        S: ObjectStore + ?Sized,
        T: TerrainMap + ?Sized,
        D: MissionDispatch + ?Sized,
    {
        self.frame += 1;
        self.input.update(raw, scale);
        if self.input.accepts_game_input() {
            self.mapper.evaluate(self.input.keyboard());
        } else {
            self.mapper.clear();
        }

        let mut outcome = FrameOutcome {
            scrolled: self.apply_scrolling(),
            ..FrameOutcome::default()
        };

        outcome.context = self.classify(store, terrain);
        if self.input.accepts_game_input() {
            self.handle_mouse(&mut outcome, store, dispatch);
            self.handle_hotkeys(&mut outcome, store, dispatch);
        }

        if self.config.follow_selection {
            if let Some(primary) = self.selection.primary().and_then(|id| store.object(id)) {
                self.viewport.track(primary.position);
            }
        }
        outcome.scrolled |= self.viewport.update_tracking();

        outcome.drag_band = self
            .input
            .mouse()
            .drag()
            .filter(|drag| drag.started)
            .map(|drag| drag.rect());
        outcome.shape = self.shape_for(&outcome.context);
        self.selection.drain_events(&mut outcome.selection_events);
        outcome
    }

    fn apply_scrolling(&mut self) -> bool {
        let mut direction = ScrollDirection::empty();
        for (action, flag) in [
            (GameAction::ScrollUp, ScrollDirection::NORTH),
            (GameAction::ScrollDown, ScrollDirection::SOUTH),
            (GameAction::ScrollLeft, ScrollDirection::WEST),
            (GameAction::ScrollRight, ScrollDirection::EAST),
        ] {
            direction.set(flag, self.mapper.is_active(action));
        }
        let fast = self.mapper.is_active(GameAction::ScrollFast);

        let mut scrolled = false;
        if !direction.is_empty() {
            self.viewport.stop_tracking();
            scrolled |= self.viewport.update_keyboard_scroll(direction, fast);
        }
        if !self.config.disable_edge_scroll && self.input.focus() != InputFocus::Disabled {
            scrolled |= self.viewport.update_edge_scroll(self.input.mouse().position());
        }
        scrolled
    }

    fn classify<S, T>(&self, store: &S, terrain: &T) -> CursorContext
    where
        S: ObjectStore + ?Sized,
        T: TerrainMap + ?Sized,
    {
        let screen = self.input.mouse().position();
        let query = CursorQuery {
            region: self.config.layout.region_at(screen),
            world: self.viewport.screen_to_world(screen),
            scroll: self.viewport.edge_at(screen),
            mode: self.mode,
        };
        self.classifier.classify(&query, store, terrain)
    }

    fn shape_for(&self, context: &CursorContext) -> CursorShape {
        if let ContextKind::Scroll(edge) = context.kind {
            if !self.viewport.can_scroll(ScrollDirection::from_edge(edge)) {
                return CursorShape::NoScroll;
            }
        }
        if self.attack_move_armed && context.region == ScreenRegion::Tactical {
            return CursorShape::Attack;
        }
        cursor_shape_for(context, !self.selection.is_empty())
    }

    fn handle_mouse<S, D>(&mut self, outcome: &mut FrameOutcome, store: &S, dispatch: &mut D)
    where
        S: ObjectStore + ?Sized,
        D: MissionDispatch + ?Sized,
    {
        let context = outcome.context;
        let mouse = self.input.mouse().clone();
        let modifiers = self.input.modifiers();
        let shift = modifiers.contains(Modifiers::SHIFT);

        if let Some(band) = mouse.drag_completed() {
            let first = self
                .viewport
                .screen_to_world(ScreenPoint::new(band.x(), band.y()));
            let area = Rect::new(first.x(), first.y(), band.width(), band.height());
            let _ = self.selection.select_in_box(store, area);
            return;
        }
        if context.region != ScreenRegion::Tactical {
            return;
        }

        if mouse.was_pressed(MouseButton::Right) {
            if self.mode != InteractionMode::Normal || self.attack_move_armed {
                self.attack_move_armed = false;
                self.cancel_mode();
                return;
            }
            let command = self.commands.resolve_command(
                &context,
                shift,
                modifiers.contains(Modifiers::CTRL),
                modifiers.contains(Modifiers::ALT),
            );
            if command.kind != CommandType::None {
                let objects = self.selection.objects(store);
                let result = self.commands.issue(command, &objects, dispatch);
                outcome.command = Some((command, result));
            }
            return;
        }

        if !mouse.was_pressed(MouseButton::Left) {
            return;
        }
        match self.mode {
            InteractionMode::Placement => {
                if context.kind == ContextKind::PlacementValid {
                    outcome.placement = Some(context.cell);
                    self.cancel_mode();
                }
            }
            InteractionMode::Sell | InteractionMode::Repair => {
                self.click_structure(outcome, &context, dispatch);
            }
            InteractionMode::Normal if self.attack_move_armed => {
                self.attack_move_armed = false;
                let mut flags = CommandFlags::empty();
                flags.set(CommandFlags::QUEUED, shift);
                let command = Command::new(
                    CommandType::AttackMove,
                    CommandTarget::Ground {
                        point: context.world,
                    },
                    flags,
                );
                let objects = self.selection.objects(store);
                let result = self.commands.issue(command, &objects, dispatch);
                outcome.command = Some((command, result));
            }
            InteractionMode::Normal => self.click_select(&context, shift, &mouse, store),
        }
    }

    fn click_structure<D>(
        &mut self,
        outcome: &mut FrameOutcome,
        context: &CursorContext,
        dispatch: &mut D,
    ) where
        D: MissionDispatch + ?Sized,
    {
        let Some(target) = context.object else {
            return;
        };
        let targets = [target];
        let result = match context.kind {
            ContextKind::SellTarget => self.commands.issue_sell(target.id, &targets, dispatch),
            ContextKind::RepairTarget => self.commands.issue_repair(target.id, &targets, dispatch),
            _ => return,
        };
        outcome.command = Some((self.commands.last_command(), result));
    }

    fn click_select<S>(
        &mut self,
        context: &CursorContext,
        shift: bool,
        mouse: &MouseState,
        store: &S,
    ) where
        S: ObjectStore + ?Sized,
    {
        match context.object {
            Some(object) if context.is_selectable => {
                if mouse.was_double_clicked(MouseButton::Left) {
                    let _ = self.selection.select_all_of_type(store, object.type_index);
                } else if shift {
                    let _ = self.selection.toggle(&object);
                } else {
                    let _ = self.selection.select(&object);
                }
            }
            _ if !shift => self.selection.clear(),
            _ => {}
        }
    }

    fn handle_hotkeys<S, D>(&mut self, outcome: &mut FrameOutcome, store: &S, dispatch: &mut D)
    where
        S: ObjectStore + ?Sized,
        D: MissionDispatch + ?Sized,
    {
        let triggered: Vec<GameAction> = self.mapper.triggered_actions().collect();
        for action in triggered {
            let objects = self.selection.objects(store);
            let result = match action {
                GameAction::Stop => Some(self.commands.issue_stop(&objects, dispatch)),
                GameAction::Guard => Some(self.commands.issue_guard(false, &objects, dispatch)),
                GameAction::Scatter => Some(self.commands.issue_scatter(&objects, dispatch)),
                GameAction::Deploy => Some(self.commands.issue_deploy(&objects, dispatch)),
                _ => {
                    self.handle_action(action, outcome, store);
                    None
                }
            };
            if let Some(result) = result {
                outcome.command = Some((self.commands.last_command(), result));
            }
        }
    }

    fn handle_action<S>(&mut self, action: GameAction, outcome: &mut FrameOutcome, store: &S)
    where
        S: ObjectStore + ?Sized,
    {
        match action {
            GameAction::SelectAll => {
                let _ = self.selection.select_all_units(store);
            }
            GameAction::SelectType => {
                if let Some(kind) = self.selection.selected_type() {
                    let _ = self.selection.select_all_of_type(store, kind);
                }
            }
            GameAction::DeselectAll => {
                self.attack_move_armed = false;
                self.cancel_mode();
                self.selection.clear();
            }
            GameAction::AttackMove => {
                self.attack_move_armed = !self.selection.is_empty();
            }
            GameAction::GroupSelect(slot) => {
                let _ = self.selection.recall_group(slot, store);
            }
            GameAction::GroupCreate(slot) => {
                let _ = self.selection.save_group(slot);
            }
            GameAction::GroupAdd(slot) => {
                let _ = self.selection.add_to_group(slot);
            }
            GameAction::SellMode => self.toggle_mode(InteractionMode::Sell),
            GameAction::RepairMode => self.toggle_mode(InteractionMode::Repair),
            GameAction::CenterSelection => {
                let objects = self.selection.objects(store);
                if let Some(center) = average_position(&objects) {
                    self.viewport.center_on(center);
                    outcome.scrolled = true;
                }
            }
            GameAction::CenterBase => {
                let player = self.selection.player();
                let base = store
                    .all_objects()
                    .into_iter()
                    .filter(|object| object.owner == player && object.active)
                    .max_by_key(|object| object.kind.is_building());
                if let Some(base) = base {
                    self.viewport.center_on(base.position);
                    outcome.scrolled = true;
                }
            }
            GameAction::Bookmark(slot) => {
                outcome.scrolled |= self.viewport.recall_bookmark(usize::from(slot));
            }
            GameAction::SetBookmark(slot) => {
                let _ = self.viewport.save_bookmark(usize::from(slot));
            }
            other if other.is_scroll() => {}
            GameAction::ForceFire | GameAction::ForceMove => {}
            other => outcome.interface_actions.push(other),
        }
    }

    /// Enters `mode`, or returns to normal when it is already active.
    pub fn toggle_mode(&mut self, mode: InteractionMode) {
        if self.mode == mode {
            self.cancel_mode();
        } else {
            self.set_mode(mode);
        }
    }
}

fn average_position(objects: &[SelectableObject]) -> Option<WorldPoint> {
    if objects.is_empty() {
        return None;
    }
    let count = i64::try_from(objects.len()).ok()?;
    let (x, y) = objects.iter().fold((0_i64, 0_i64), |(x, y), object| {
        (
            x + i64::from(object.position.x()),
            y + i64::from(object.position.y()),
        )
    });
    Some(WorldPoint::new(
        i32::try_from(x / count).ok()?,
        i32::try_from(y / count).ok()?,
    ))
}
