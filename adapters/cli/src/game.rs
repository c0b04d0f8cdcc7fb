//! Frame loop gluing the world, the input session and the render pipeline.

use std::{cell::RefCell, time::Duration};

use anyhow::Result;
use tactica_core::{
    AudioService, CellCoord, CommandTarget, HouseId, LandType, MissionType, MouseButton, ObjectKind,
    ObjectStore, ObjectTraits, RawInput, ScreenPoint, SelectableObject, SoundId, TerrainMap,
    VoiceHandle,
};
use tactica_rendering::{
    terrain_color, AssetManifest, AssetSource, BuildItem, ButtonState, DrawFlags, FrameControl,
    FrameScene, HouseColor, OverlayKind, PlatformSurface, RadarBlip, RadarState, RenderLayer,
    RenderPipeline, SidebarButton, SidebarHit, SidebarTab, SpriteRequest, TerrainCell,
};
use tactica_system_command::Callbacks;
use tactica_system_cursor::InteractionMode;
use tactica_system_input::GameAction;
use tactica_system_session::{FrameOutcome, Session};
use tactica_world::{query, World};
use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::demo::{shape_for, PLAYER};

const SHADOW_OFFSET: i32 = 6;
const FADE_FRAMES: u32 = 15;
/// Radar blip colour of each house; selected units blink white.
const HOUSE_BLIPS: [u8; 3] = [84, 116, 196];

type PendingOrder = (SelectableObject, MissionType, CommandTarget, bool);

/// Audio collaborator that only reports what would play.
#[derive(Debug, Default)]
pub(crate) struct LoggedAudio {
    next_voice: u32,
}

impl AudioService for LoggedAudio {
    fn play(&mut self, sound: SoundId, volume: u8) -> Option<VoiceHandle> {
        self.next_voice = self.next_voice.wrapping_add(1);
        debug!(sound = sound.get(), volume, voice = self.next_voice, "sound played");
        Some(VoiceHandle::new(self.next_voice))
    }

    fn stop(&mut self, voice: VoiceHandle) {
        debug!(voice = voice.get(), "sound stopped");
    }

    fn set_volume(&mut self, voice: VoiceHandle, volume: u8) {
        debug!(voice = voice.get(), volume, "sound volume changed");
    }
}

/// One running game: world state, input session and renderer.
pub(crate) struct Game {
    world: World,
    session: Session,
    pipeline: RenderPipeline,
    audio: LoggedAudio,
    frame_limit: Option<u64>,
    elapsed: Duration,
    paused: bool,
    exit_requested: bool,
}

impl Game {
    /// Loads the theater and shapes and points the view at the player's base.
    pub(crate) fn new<A>(
        config: &AppConfig,
        world: World,
        manifest: &AssetManifest,
        assets: &A,
        frame_limit: Option<u64>,
    ) -> Self
    where
        A: AssetSource + ?Sized,
    {
        let mut pipeline = RenderPipeline::new(config.pipeline.clone());
        let templates = pipeline.set_theater(config.pipeline.theater, manifest, assets);
        let shapes = pipeline.load_shapes(manifest, assets);
        let overlays = (1..=4)
            .filter(|density| {
                pipeline
                    .tiles_mut()
                    .load_overlay(OverlayKind::Gold(*density), assets)
            })
            .count();
        pipeline.palette_mut().set_standard_animations(true);
        info!(
            theater = config.pipeline.theater.name(),
            templates, shapes, overlays, "assets loaded"
        );

        let (columns, rows) = world.size_in_cells();
        let radar = pipeline.radar_mut();
        radar.set_state(RadarState::Active);
        radar.set_map_size(columns, rows);
        radar.update_terrain(|cell| terrain_color(world.land(cell)));

        let sidebar = pipeline.sidebar_mut();
        sidebar.add_item(
            SidebarTab::Structures,
            BuildItem::new(0, Some((shape_for(ObjectKind::Building), 0))),
        );
        for (type_index, kind) in [(1, ObjectKind::Vehicle), (2, ObjectKind::Infantry)] {
            sidebar.add_item(SidebarTab::Units, BuildItem::new(type_index, Some((shape_for(kind), 0))));
        }

        let mut session = Session::new(config.session.clone());
        session.attach_map(&world);
        if let Some(base) = player_base(&world) {
            session.viewport_mut().center_on(base.position);
        }

        Self {
            world,
            session,
            pipeline,
            audio: LoggedAudio::default(),
            frame_limit,
            elapsed: Duration::ZERO,
            paused: false,
            exit_requested: false,
        }
    }

    /// Runs input, orders and rendering for one frame.
    pub(crate) fn frame(
        &mut self,
        dt: Duration,
        raw: &RawInput,
        surface: &mut dyn PlatformSurface,
    ) -> Result<FrameControl> {
        self.elapsed += dt;
        let outcome = self.run_session(raw);
        self.apply_outcome(&outcome);
        self.handle_sidebar(raw.wheel);
        self.sync_sidebar_buttons();
        self.render(&outcome, surface);

        let frame = self.session.frame();
        let finished = self.frame_limit.is_some_and(|limit| frame >= limit);
        if finished || self.exit_requested {
            let stats = self.pipeline.stats();
            info!(
                frames = frame,
                rendered = stats.frames_rendered,
                skipped = stats.frames_skipped,
                draw_calls = stats.draw_calls,
                objects = query::object_count(&self.world),
                selected = self.session.selection().len(),
                last_order = ?self.session.commands().last_result(),
                elapsed_ms = self.elapsed.as_millis() as u64,
                "session finished"
            );
            return Ok(FrameControl::Exit);
        }
        Ok(FrameControl::Continue)
    }

    fn run_session(&mut self, raw: &RawInput) -> FrameOutcome {
        let pending: RefCell<Vec<PendingOrder>> = RefCell::new(Vec::new());
        let world = &self.world;
        let mut dispatch = Callbacks::new(
            |object: &SelectableObject, command| world.can_perform(object, command),
            |object: &SelectableObject, mission, target, queued| {
                pending.borrow_mut().push((*object, mission, target, queued));
                true
            },
        );
        let outcome = self
            .session
            .process_frame(raw, (1.0, 1.0), world, world, &mut dispatch);
        drop(dispatch);

        for (object, mission, target, queued) in pending.into_inner() {
            if !self.world.assign_mission(&object, mission, target, queued) {
                debug!(object = object.id.get(), ?mission, "world refused order");
            }
        }
        self.session.acknowledge(&mut self.audio);
        outcome
    }

    fn apply_outcome(&mut self, outcome: &FrameOutcome) {
        if let Some((command, result)) = outcome.command {
            debug!(kind = ?command.kind, ?result, "order issued");
        }
        if !outcome.selection_events.is_empty() {
            debug!(
                events = outcome.selection_events.len(),
                selected = self.session.selection().len(),
                "selection changed"
            );
        }
        if let Some(cell) = outcome.placement {
            self.place_structure(cell);
        }
        for action in &outcome.interface_actions {
            match action {
                GameAction::ToggleRadar => self.toggle_radar(),
                GameAction::DebugRevealMap => {
                    self.world.reveal_all();
                    self.pipeline.invalidate_all();
                    info!("map revealed");
                }
                GameAction::Pause => {
                    self.paused = !self.paused;
                    if self.paused {
                        self.pipeline.palette_mut().start_fade_out(FADE_FRAMES);
                    } else {
                        self.pipeline.palette_mut().start_fade_in(FADE_FRAMES);
                    }
                    info!(paused = self.paused, "pause toggled");
                }
                GameAction::OptionsMenu => self.exit_requested = true,
                other => debug!(action = ?other, "interface action ignored"),
            }
        }
    }

    fn place_structure(&mut self, cell: CellCoord) {
        let id = self.world.spawn(ObjectKind::Building, HouseId::new(PLAYER), cell);
        let traits = ObjectTraits::ATTACKABLE | ObjectTraits::REPAIRABLE | ObjectTraits::SELLABLE;
        let _ = self.world.set_traits(id, traits);
        info!(
            object = id.get(),
            column = cell.column(),
            row = cell.row(),
            "structure placed"
        );
    }

    fn deliver_unit(&mut self, kind: ObjectKind) {
        let Some(base) = player_base(&self.world) else {
            warn!(?kind, "no base to deliver units to");
            return;
        };
        let origin = base.cell();
        let exit = (-1..=2)
            .flat_map(|dy| (-1..=2).map(move |dx| CellCoord::new(origin.column() + dx, origin.row() + dy)))
            .find(|cell| {
                self.world.land(*cell).is_some_and(|land| land.is_passable())
                    && self.world.object_at(*cell).is_none()
            });
        match exit {
            Some(cell) => {
                let id = self.world.spawn(kind, HouseId::new(PLAYER), cell);
                let _ = self.world.set_traits(id, ObjectTraits::ATTACKABLE);
                info!(object = id.get(), ?kind, "unit delivered");
            }
            None => warn!(?kind, "base exit blocked"),
        }
    }

    fn toggle_radar(&mut self) {
        let radar = self.pipeline.radar_mut();
        let state = match radar.state() {
            RadarState::Active => RadarState::Disabled,
            RadarState::Disabled | RadarState::Jammed => RadarState::Active,
        };
        radar.set_state(state);
        debug!(?state, "radar toggled");
    }

    fn handle_sidebar(&mut self, wheel: i32) {
        let mouse = self.session.input().mouse();
        let point = mouse.position();
        let clicked = mouse.was_pressed(MouseButton::Left);
        let radar_area = self.pipeline.radar_mut().area();
        if radar_area.contains_point(point.x(), point.y()) {
            if clicked {
                if let Some(cell) = self.pipeline.radar_mut().radar_to_cell(point) {
                    self.session.viewport_mut().center_on_cell(cell);
                }
            }
            return;
        }

        let Some(hit) = self.pipeline.sidebar_mut().hit_test(point) else {
            return;
        };
        if wheel > 0 {
            self.pipeline.sidebar_mut().scroll_up();
        } else if wheel < 0 {
            self.pipeline.sidebar_mut().scroll_down();
        }
        if !clicked {
            return;
        }
        match hit {
            SidebarHit::Tab(tab) => self.pipeline.sidebar_mut().set_active_tab(tab),
            SidebarHit::BuildItem(index) => {
                let tab = self.pipeline.sidebar_mut().active_tab();
                let item = self.pipeline.sidebar_mut().items(tab).get(index).copied();
                match (tab, item) {
                    (SidebarTab::Structures, Some(_)) => self.session.begin_placement(),
                    (SidebarTab::Units, Some(item)) if item.type_index == 2 => {
                        self.deliver_unit(ObjectKind::Infantry);
                    }
                    (SidebarTab::Units, Some(_)) => self.deliver_unit(ObjectKind::Vehicle),
                    (_, None) => {}
                }
            }
            SidebarHit::Button(SidebarButton::Sell) => self.session.toggle_mode(InteractionMode::Sell),
            SidebarHit::Button(SidebarButton::Repair) => {
                self.session.toggle_mode(InteractionMode::Repair);
            }
            SidebarHit::Button(SidebarButton::Map) => self.toggle_radar(),
            SidebarHit::Background => {}
        }
    }

    fn sync_sidebar_buttons(&mut self) {
        let mode = self.session.mode();
        let sidebar = self.pipeline.sidebar_mut();
        for (button, active) in [
            (SidebarButton::Sell, mode == InteractionMode::Sell),
            (SidebarButton::Repair, mode == InteractionMode::Repair),
        ] {
            let state = if active {
                ButtonState::Active
            } else {
                ButtonState::Normal
            };
            sidebar.set_button_state(button, state);
        }
    }

    fn render(&mut self, outcome: &FrameOutcome, surface: &mut dyn PlatformSurface) {
        let viewport = self.session.viewport();
        let selection = self.session.selection();
        let radar = self.pipeline.radar_mut();
        radar.clear_blips();
        let span = viewport.visible_cells();
        radar.set_viewport(span.first, span.columns, span.rows);

        let mut sprites = Vec::new();
        for object in self.world.all_objects() {
            if !object.active || !self.world.is_visible(object.cell()) {
                continue;
            }
            let selected = selection.is_selected(object.id);
            let owner = usize::from(object.owner.get());
            let _ = radar.add_blip(RadarBlip {
                cell: object.cell(),
                color: HOUSE_BLIPS.get(owner).copied().unwrap_or(15),
                building: object.kind == ObjectKind::Building,
                selected,
            });
            if !viewport.is_visible(object.bounds()) {
                continue;
            }
            let at = viewport.world_to_screen(object.position);
            let body = SpriteRequest::shape(shape_for(object.kind), 0, at)
                .on_layer(RenderLayer::Object)
                .with_sort_y(at.y())
                .with_remap(HouseColor::for_house(object.owner.get()))
                .with_flags(DrawFlags::CENTER);
            if object.kind == ObjectKind::Aircraft {
                let ground = ScreenPoint::new(at.x(), at.y() + SHADOW_OFFSET);
                sprites.push(
                    SpriteRequest::shape(shape_for(object.kind), 0, ground)
                        .on_layer(RenderLayer::Shadow)
                        .with_flags(DrawFlags::CENTER | DrawFlags::SHADOW),
                );
            }
            sprites.push(body);
        }

        let world = &self.world;
        let terrain = |cell: CellCoord| -> Option<TerrainCell> {
            let stored = query::terrain_cell(world, cell)?;
            if !stored.revealed {
                return None;
            }
            let overlay = (stored.land == LandType::Tiberium)
                .then(|| (OverlayKind::Gold(1 + (cell.column() + cell.row()).rem_euclid(4) as u8), 0));
            Some(TerrainCell {
                template: stored.template,
                icon: stored.icon,
                overlay,
            })
        };
        let origin = viewport.origin();
        let scene = FrameScene {
            view_origin: ScreenPoint::new(origin.x(), origin.y()),
            terrain: &terrain,
            sprites: &sprites,
            cursor: Some((self.session.input().mouse().position(), outcome.shape)),
        };
        let report = self.pipeline.render_frame(&scene, surface);
        if let Some(error) = report.error {
            debug!(frame = report.frame, %error, "frame not presented");
        }
    }
}

/// Reveals the cells within `radius` of anything the player owns.
pub(crate) fn reveal_player_sight(world: &mut World, radius: u32) {
    let player = HouseId::new(PLAYER);
    let eyes: Vec<CellCoord> = world
        .all_objects()
        .into_iter()
        .filter(|object| object.owner == player)
        .map(|object| object.cell())
        .collect();
    let reach = radius as i32;
    for eye in eyes {
        for row in eye.row() - reach..=eye.row() + reach {
            for column in eye.column() - reach..=eye.column() + reach {
                let cell = CellCoord::new(column, row);
                if eye.manhattan_distance(cell) <= radius {
                    let _ = world.reveal(cell);
                }
            }
        }
    }
}

fn player_base(world: &World) -> Option<SelectableObject> {
    let player = HouseId::new(PLAYER);
    let owned: Vec<SelectableObject> = world
        .all_objects()
        .into_iter()
        .filter(|object| object.owner == player)
        .collect();
    owned
        .iter()
        .find(|object| object.kind == ObjectKind::Building)
        .or_else(|| owned.first())
        .copied()
}
