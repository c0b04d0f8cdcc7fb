#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure classification of whatever lies beneath the mouse cursor.
//!
//! Every query rebuilds the [`CursorContext`] from the object store and the
//! terrain map; nothing is cached between calls because ownership and
//! passability can change between frames.

use serde::{Deserialize, Serialize};
use tactica_core::{
    ContextKind, CursorContext, CursorShape, HouseId, LandType, ObjectStore, ObjectTraits, Rect,
    ScreenPoint, ScreenRegion, ScrollEdge, SelectableObject, TerrainMap, WorldPoint,
};

/// Placement of the interface panels on the game screen.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenLayout {
    /// Width of the game screen.
    pub screen_width: i32,
    /// Height of the game screen.
    pub screen_height: i32,
    /// Left edge of the sidebar.
    pub sidebar_x: i32,
    /// Height of the tab bar along the top edge.
    pub tab_height: i32,
    /// Radar area inside the sidebar.
    pub radar: Rect,
}

impl Default for ScreenLayout {
    fn default() -> Self {
        Self {
            screen_width: 640,
            screen_height: 400,
            sidebar_x: 480,
            tab_height: 16,
            radar: Rect::new(496, 16, 128, 128),
        }
    }
}

impl ScreenLayout {
    /// Screen region containing the point.
    #[must_use]
    pub const fn region_at(&self, point: ScreenPoint) -> ScreenRegion {
        let (x, y) = (point.x(), point.y());
        if x < 0 || y < 0 || x >= self.screen_width || y >= self.screen_height {
            ScreenRegion::Outside
        } else if y < self.tab_height {
            ScreenRegion::TabBar
        } else if x >= self.sidebar_x {
            if self.radar.contains_point(x, y) {
                ScreenRegion::Radar
            } else {
                ScreenRegion::Sidebar
            }
        } else {
            ScreenRegion::Tactical
        }
    }
}

/// Interaction mode that overrides normal classification.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum InteractionMode {
    /// Regular selection and orders.
    #[default]
    Normal,
    /// A structure is being placed.
    Placement,
    /// Clicking sells structures.
    Sell,
    /// Clicking repairs structures.
    Repair,
}

/// Everything the classifier needs to know about the cursor itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CursorQuery {
    /// Screen region under the cursor.
    pub region: ScreenRegion,
    /// Cursor position in world pixels.
    pub world: WorldPoint,
    /// Edge-scroll direction requested by the cursor position, if any.
    pub scroll: Option<ScrollEdge>,
    /// Active interaction mode.
    pub mode: InteractionMode,
}

/// Stateless classifier configured with the local player's house.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CursorClassifier {
    player: HouseId,
    edge_scroll: bool,
}

impl CursorClassifier {
    /// Creates a classifier for the player's house.
    #[must_use]
    pub const fn new(player: HouseId) -> Self {
        Self {
            player,
            edge_scroll: true,
        }
    }

    /// Enables or disables edge-scroll contexts.
    #[must_use]
    pub const fn with_edge_scroll(mut self, enabled: bool) -> Self {
        self.edge_scroll = enabled;
        self
    }

    /// House treated as the local player.
    #[must_use]
    pub const fn player(&self) -> HouseId {
        self.player
    }

    /// Builds a fresh context for the query.
    pub fn classify<S, T>(&self, query: &CursorQuery, store: &S, terrain: &T) -> CursorContext
    where
        S: ObjectStore + ?Sized,
        T: TerrainMap + ?Sized,
    {
        let cell = query.world.cell();
        let mut context = CursorContext {
            region: query.region,
            world: query.world,
            cell,
            ..CursorContext::default()
        };

        match query.region {
            ScreenRegion::Tactical => {}
            ScreenRegion::Outside => return context,
            ScreenRegion::Sidebar | ScreenRegion::Radar | ScreenRegion::TabBar => {
                context.kind = ContextKind::Interface;
                return context;
            }
        }

        if let (true, Some(edge)) = (self.edge_scroll, query.scroll) {
            context.kind = ContextKind::Scroll(edge);
            return context;
        }

        context.is_visible = terrain.is_visible(cell);
        context.is_passable = terrain.is_passable(cell);
        context.is_buildable = terrain.is_buildable(cell);
        if context.is_visible {
            context.object = store.object_at(cell).filter(|object| object.active);
        }
        if let Some(object) = context.object {
            context.is_own = object.owner == self.player;
            context.is_enemy = !context.is_own && !object.traits.contains(ObjectTraits::CIVILIAN);
            context.is_selectable = context.is_own;
            context.is_attackable = object.traits.contains(ObjectTraits::ATTACKABLE);
        }

        context.kind = match query.mode {
            InteractionMode::Placement => {
                if context.is_visible && context.is_buildable && context.object.is_none() {
                    ContextKind::PlacementValid
                } else {
                    ContextKind::PlacementInvalid
                }
            }
            InteractionMode::Sell => {
                mode_target(&context, ObjectTraits::SELLABLE, ContextKind::SellTarget)
            }
            InteractionMode::Repair => {
                mode_target(&context, ObjectTraits::REPAIRABLE, ContextKind::RepairTarget)
            }
            InteractionMode::Normal => match context.object {
                Some(object) => object_kind(&object, &context),
                None => terrain_kind(&context, terrain.land(cell)),
            },
        };
        context
    }
}

fn mode_target(
    context: &CursorContext,
    required: ObjectTraits,
    kind: ContextKind,
) -> ContextKind {
    match context.object {
        Some(object)
            if context.is_own
                && object.kind.is_building()
                && object.traits.contains(required) =>
        {
            kind
        }
        _ => ContextKind::Normal,
    }
}

fn object_kind(object: &SelectableObject, context: &CursorContext) -> ContextKind {
    let traits = object.traits;
    if context.is_own {
        if traits.contains(ObjectTraits::TRANSPORT) {
            ContextKind::OwnTransport
        } else if traits.contains(ObjectTraits::HARVESTER) {
            ContextKind::OwnHarvester
        } else if object.kind.is_building() {
            ContextKind::OwnBuilding
        } else {
            ContextKind::OwnUnit
        }
    } else if traits.contains(ObjectTraits::CIVILIAN) {
        if object.kind.is_building() {
            ContextKind::NeutralBuilding
        } else {
            ContextKind::Civilian
        }
    } else if object.kind.is_building() {
        ContextKind::EnemyBuilding
    } else {
        ContextKind::EnemyUnit
    }
}

fn terrain_kind(context: &CursorContext, land: Option<LandType>) -> ContextKind {
    if !context.is_visible {
        return ContextKind::TerrainShroud;
    }
    match land {
        Some(LandType::Tiberium) => ContextKind::HarvestArea,
        Some(land) if land.is_water() => ContextKind::TerrainWater,
        _ if context.is_passable => ContextKind::TerrainPassable,
        _ => ContextKind::TerrainBlocked,
    }
}

/// Cursor image for the context.
#[must_use]
pub fn cursor_shape_for(context: &CursorContext, has_selection: bool) -> CursorShape {
    if let ContextKind::Scroll(edge) = context.kind {
        return CursorShape::Scroll(edge);
    }
    match context.region {
        ScreenRegion::Sidebar | ScreenRegion::TabBar | ScreenRegion::Radar | ScreenRegion::Outside => {
            return CursorShape::Arrow;
        }
        ScreenRegion::Tactical => {}
    }
    match context.kind {
        ContextKind::PlacementValid => return CursorShape::Select,
        ContextKind::PlacementInvalid => return CursorShape::NoMove,
        ContextKind::SellTarget => return CursorShape::Sell,
        ContextKind::RepairTarget => return CursorShape::Repair,
        _ => {}
    }

    if has_selection {
        if context.is_enemy && context.is_attackable {
            CursorShape::Attack
        } else if context.is_own && context.kind == ContextKind::OwnTransport {
            CursorShape::Enter
        } else if context.kind == ContextKind::HarvestArea {
            CursorShape::Harvest
        } else if context.is_passable {
            CursorShape::Move
        } else {
            CursorShape::NoMove
        }
    } else if context.is_own && context.is_selectable {
        CursorShape::Select
    } else {
        CursorShape::Arrow
    }
}
