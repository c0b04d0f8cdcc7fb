//! Seeded demo scenarios, generated artwork and a scripted input run.

use std::{collections::BTreeMap, collections::HashSet};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tactica_core::{
    keys, CellCoord, LandType, ObjectKind, ObjectTraits, RawInput, ScreenPoint,
};
use tactica_rendering::{
    AssetManifest, MemoryAssets, OverlayKind, Palette, Rgb, ShapeEncoder, ShapeEntry, ShapeId,
    Theater, CLEAR_VARIANTS, SUPPORTED_MANIFEST_VERSION, TEMPLATES, TILE_BYTES, TILE_SIZE,
};

use crate::config::MapConfig;
use crate::scenario_transfer::{
    ScenarioObject, ScenarioSnapshot, ScenarioTerrain, MAX_MAP_CELLS,
};

const MIN_MAP_CELLS: u32 = 24;
const PLACEMENT_ATTEMPTS: usize = 64;

/// House of the local player.
pub(crate) const PLAYER: u8 = 0;
const ENEMY: u8 = 1;
const CIVILIANS: u8 = 2;

/// Shape id of the mouse cursor frames.
pub(crate) const CURSOR_SHAPE: ShapeId = ShapeId::new(0);
const CURSOR_FRAMES: u8 = 27;
const CURSOR_SIZE: u16 = 24;

/// Shape drawn for objects of the kind.
pub(crate) const fn shape_for(kind: ObjectKind) -> ShapeId {
    match kind {
        ObjectKind::Infantry => ShapeId::new(1),
        ObjectKind::Vehicle => ShapeId::new(2),
        ObjectKind::Vessel => ShapeId::new(3),
        ObjectKind::Aircraft => ShapeId::new(4),
        ObjectKind::Building => ShapeId::new(5),
    }
}

const SHAPE_FILES: [(ShapeId, &str, ObjectKind); 5] = [
    (shape_for(ObjectKind::Infantry), "E1.SHP", ObjectKind::Infantry),
    (shape_for(ObjectKind::Vehicle), "MTNK.SHP", ObjectKind::Vehicle),
    (shape_for(ObjectKind::Vessel), "LST.SHP", ObjectKind::Vessel),
    (shape_for(ObjectKind::Aircraft), "HELI.SHP", ObjectKind::Aircraft),
    (shape_for(ObjectKind::Building), "FACT.SHP", ObjectKind::Building),
];

/// Generates a scenario deterministically from `seed`.
pub(crate) fn generate(seed: u64, map: MapConfig) -> ScenarioSnapshot {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let columns = map.columns.clamp(MIN_MAP_CELLS, MAX_MAP_CELLS);
    let rows = map.rows.clamp(MIN_MAP_CELLS, MAX_MAP_CELLS);
    let mut layout = Layout::new(columns as i32, rows as i32);

    let harbour = layout.lake(&mut rng);
    let road_row = rng.gen_range(2..layout.rows - 2);
    for column in 0..layout.columns {
        layout.paint(CellCoord::new(column, road_row), LandType::Road);
    }
    for _ in 0..6 {
        layout.cluster(&mut rng, LandType::Rock, 5);
    }
    for _ in 0..4 {
        layout.cluster(&mut rng, LandType::Rough, 6);
    }
    for _ in 0..2 {
        layout.cluster(&mut rng, LandType::Tiberium, 10);
    }

    let player_base = (layout.columns / 5, layout.rows * 4 / 5);
    let enemy_base = (layout.columns * 4 / 5, layout.rows / 5);
    let town = (layout.columns / 2, layout.rows / 2);
    let armour = ObjectTraits::ATTACKABLE;
    let structure = ObjectTraits::ATTACKABLE | ObjectTraits::REPAIRABLE | ObjectTraits::SELLABLE;

    let roster: [(u8, (i32, i32), ObjectKind, ObjectTraits, usize); 14] = [
        (PLAYER, player_base, ObjectKind::Building, structure, 2),
        (PLAYER, player_base, ObjectKind::Vehicle, armour | ObjectTraits::HARVESTER, 1),
        (PLAYER, player_base, ObjectKind::Vehicle, armour | ObjectTraits::TRANSPORT, 1),
        (PLAYER, player_base, ObjectKind::Vehicle, armour | ObjectTraits::DEPLOYABLE, 1),
        (PLAYER, player_base, ObjectKind::Vehicle, armour, 3),
        (PLAYER, player_base, ObjectKind::Infantry, armour, 4),
        (PLAYER, player_base, ObjectKind::Infantry, armour | ObjectTraits::CAN_CAPTURE, 1),
        (PLAYER, player_base, ObjectKind::Aircraft, armour, 1),
        (ENEMY, enemy_base, ObjectKind::Building, structure, 2),
        (ENEMY, enemy_base, ObjectKind::Vehicle, armour, 3),
        (ENEMY, enemy_base, ObjectKind::Infantry, armour, 4),
        (CIVILIANS, town, ObjectKind::Building, armour | ObjectTraits::CIVILIAN, 1),
        (CIVILIANS, town, ObjectKind::Infantry, armour | ObjectTraits::CIVILIAN, 2),
        (PLAYER, harbour, ObjectKind::Vessel, armour | ObjectTraits::TRANSPORT, 1),
    ];

    let mut objects = Vec::new();
    for (owner, around, kind, traits, count) in roster {
        for _ in 0..count {
            if let Some(cell) = layout.place(&mut rng, around, kind) {
                objects.push(ScenarioObject {
                    kind,
                    owner,
                    cell,
                    traits,
                });
            }
        }
    }

    ScenarioSnapshot {
        columns,
        rows,
        terrain: layout.terrain(),
        objects,
    }
}

struct Layout {
    columns: i32,
    rows: i32,
    land: Vec<LandType>,
    occupied: HashSet<CellCoord>,
}

impl Layout {
    fn new(columns: i32, rows: i32) -> Self {
        Self {
            columns,
            rows,
            land: vec![LandType::Clear; (columns * rows) as usize],
            occupied: HashSet::new(),
        }
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        let inside = (0..self.columns).contains(&cell.column()) && (0..self.rows).contains(&cell.row());
        inside.then(|| (cell.row() * self.columns + cell.column()) as usize)
    }

    fn land(&self, cell: CellCoord) -> Option<LandType> {
        self.index(cell).map(|index| self.land[index])
    }

    fn paint(&mut self, cell: CellCoord, land: LandType) {
        if let Some(index) = self.index(cell) {
            if self.land[index] != LandType::Water {
                self.land[index] = land;
            }
        }
    }

    fn lake(&mut self, rng: &mut ChaCha8Rng) -> (i32, i32) {
        let center = (
            rng.gen_range(self.columns / 4..self.columns * 3 / 4),
            rng.gen_range(self.rows / 4..self.rows * 3 / 4),
        );
        let radius: i32 = rng.gen_range(3..=6);
        for row in center.1 - radius - 1..=center.1 + radius + 1 {
            for column in center.0 - radius - 1..=center.0 + radius + 1 {
                let (dx, dy) = (column - center.0, row - center.1);
                let distance = dx * dx + dy * dy;
                let cell = CellCoord::new(column, row);
                if distance <= radius * radius {
                    if let Some(index) = self.index(cell) {
                        self.land[index] = LandType::Water;
                    }
                } else if distance <= (radius + 1) * (radius + 1) {
                    self.paint(cell, LandType::Beach);
                }
            }
        }
        center
    }

    fn cluster(&mut self, rng: &mut ChaCha8Rng, land: LandType, size: usize) {
        let mut column = rng.gen_range(0..self.columns);
        let mut row = rng.gen_range(0..self.rows);
        for _ in 0..size {
            let cell = CellCoord::new(column, row);
            if self.land(cell) == Some(LandType::Clear) {
                self.paint(cell, land);
            }
            column = (column + rng.gen_range(-1..=1)).clamp(0, self.columns - 1);
            row = (row + rng.gen_range(-1..=1)).clamp(0, self.rows - 1);
        }
    }

    fn place(
        &mut self,
        rng: &mut ChaCha8Rng,
        around: (i32, i32),
        kind: ObjectKind,
    ) -> Option<CellCoord> {
        let spread = 6;
        for _ in 0..PLACEMENT_ATTEMPTS {
            let cell = CellCoord::new(
                around.0 + rng.gen_range(-spread..=spread),
                around.1 + rng.gen_range(-spread..=spread),
            );
            let footprint: Vec<CellCoord> = match kind {
                ObjectKind::Building => (0..2)
                    .flat_map(|dy| (0..2).map(move |dx| CellCoord::new(cell.column() + dx, cell.row() + dy)))
                    .collect(),
                _ => vec![cell],
            };
            let fits = footprint.iter().all(|part| {
                let land = self.land(*part);
                let ground = match kind {
                    ObjectKind::Building => land == Some(LandType::Clear),
                    ObjectKind::Vessel => land == Some(LandType::Water),
                    ObjectKind::Aircraft => land.is_some(),
                    ObjectKind::Infantry | ObjectKind::Vehicle => {
                        land.is_some_and(|land| land.is_passable())
                    }
                };
                ground && !self.occupied.contains(part)
            });
            if fits {
                self.occupied.extend(footprint);
                return Some(cell);
            }
        }
        None
    }

    fn terrain(&self) -> Vec<ScenarioTerrain> {
        let mut terrain = Vec::new();
        for row in 0..self.rows {
            for column in 0..self.columns {
                let cell = CellCoord::new(column, row);
                match self.land(cell) {
                    Some(LandType::Clear) | None => {}
                    Some(land) => terrain.push(ScenarioTerrain { cell, land }),
                }
            }
        }
        terrain
    }
}

/// Palette of the generated art: the standard ramps with a blue cycling water band.
pub(crate) fn demo_palette() -> Palette {
    let mut palette = Palette::standard();
    for step in 0..16u8 {
        palette.set(192 + step, Rgb::new(20, 60 + step * 6, 140 + step * 7));
    }
    palette
}

fn ground_base(theater: Theater) -> u8 {
    match theater {
        Theater::Temperate => 32,
        Theater::Snow => 16,
        Theater::Interior => 64,
    }
}

fn speckle(x: i32, y: i32, salt: i32) -> u8 {
    ((x * 7 + y * 13 + salt * 31).rem_euclid(8)) as u8
}

fn tile<F>(mut pixel: F) -> Vec<u8>
where
    F: FnMut(i32, i32) -> u8,
{
    let mut bytes = Vec::with_capacity(TILE_BYTES);
    for y in 0..TILE_SIZE {
        for x in 0..TILE_SIZE {
            bytes.push(pixel(x, y));
        }
    }
    bytes
}

fn template_tiles(theater: Theater, land: LandType, icons: usize) -> Vec<u8> {
    let ground = ground_base(theater);
    (0..icons as i32)
        .flat_map(|icon| {
            tile(|x, y| match land {
                LandType::Water | LandType::River => 192 + ((x + y * 2 + icon) % 16) as u8,
                LandType::Beach => 240 + 6 + speckle(x, y, icon),
                LandType::Rock | LandType::Wall => 64 + 4 + speckle(x, y, icon),
                LandType::Road => 48 + 6 + speckle(x, y, icon) / 2,
                LandType::Rough => 208 + 6 + speckle(x, y, icon),
                LandType::Clear | LandType::Tiberium => ground + 6 + speckle(x, y, icon),
            })
        })
        .collect()
}

fn ore_tile(density: u8) -> Vec<u8> {
    let spacing = 6 - i32::from(density.clamp(1, 4));
    tile(|x, y| {
        if (x * 5 + y * 3) % spacing == 0 && (x + y) % 2 == 0 {
            100 + speckle(x, y, i32::from(density))
        } else {
            0
        }
    })
}

fn unit_frame(kind: ObjectKind) -> (u16, Vec<u8>) {
    let size: i32 = match kind {
        ObjectKind::Building => 48,
        ObjectKind::Infantry => 12,
        ObjectKind::Vehicle | ObjectKind::Vessel | ObjectKind::Aircraft => 24,
    };
    let half = size / 2;
    let mut pixels = Vec::with_capacity((size * size) as usize);
    for y in 0..size {
        for x in 0..size {
            let (dx, dy) = ((x - half).abs(), (y - half).abs());
            let inside = match kind {
                ObjectKind::Infantry => dx * dx + dy * dy <= (half - 1) * (half - 1),
                ObjectKind::Vehicle => dx < half - 2 && dy < half - 4,
                ObjectKind::Vessel => dx * dx * 4 + dy * dy * 16 <= half * half * 4,
                ObjectKind::Aircraft => dx < 3 || (dy < 3 && dx < half - 1),
                ObjectKind::Building => dx < half - 1 && dy < half - 1,
            };
            let edge = match kind {
                ObjectKind::Building => dx == half - 2 || dy == half - 2,
                _ => false,
            };
            pixels.push(if !inside {
                0
            } else if edge {
                66
            } else {
                84 + ((x + y) % 8) as u8
            });
        }
    }
    (size as u16, pixels)
}

fn cursor_frame(frame: u8) -> Vec<u8> {
    let size = i32::from(CURSOR_SIZE);
    let centre = size / 2;
    let mut pixels = Vec::with_capacity((size * size) as usize);
    for y in 0..size {
        for x in 0..size {
            let (dx, dy) = ((x - centre).abs(), (y - centre).abs());
            let color = match frame {
                0 => (x <= y && y < 16 && x < 10).then_some(31),
                1..=8 => (dx + dy <= 4).then_some(111),
                9 | 11 => (dx == dy && dx < 6).then_some(127),
                10 => ((dx == 0 && dy < 6) || (dy == 0 && dx < 6)).then_some(47),
                12..=15 => {
                    let inset = i32::from(frame - 12);
                    let near_x = x == inset || x == size - 1 - inset;
                    let near_y = y == inset || y == size - 1 - inset;
                    ((near_x && (dy > 6)) || (near_y && (dx > 6))).then_some(31)
                }
                16..=19 => {
                    let gap = 2 + i32::from(frame - 16);
                    (((dx == 0) && dy > gap && dy < 10) || ((dy == 0) && dx > gap && dx < 10))
                        .then_some(127)
                }
                _ => (dx + dy == 6).then_some(96 + frame % 16),
            };
            pixels.push(color.unwrap_or(0));
        }
    }
    pixels
}

/// Manifest and in-memory files for every theater, the cursor and the object shapes.
pub(crate) fn assets() -> (AssetManifest, MemoryAssets) {
    let palette = demo_palette().to_vga();
    let mut assets = MemoryAssets::new();
    for theater in Theater::ALL {
        assets.insert(theater.palette_name(), palette.clone());
        for info in &TEMPLATES {
            let icons = if info.id.get() == 0 {
                CLEAR_VARIANTS as usize
            } else {
                1
            };
            let name = format!("{}{}", info.name, theater.tile_extension());
            assets.insert(name, template_tiles(theater, info.land, icons));
        }
    }
    for density in 1..=4 {
        assets.insert(OverlayKind::Gold(density).asset_name(), ore_tile(density));
    }

    let cursor = (0..CURSOR_FRAMES)
        .fold(ShapeEncoder::new(CURSOR_SIZE, CURSOR_SIZE), |encoder, frame| {
            encoder.raw(cursor_frame(frame))
        })
        .encode();
    assets.insert("MOUSE.SHP", cursor);
    let mut shapes = vec![ShapeEntry {
        id: CURSOR_SHAPE.get(),
        name: "MOUSE.SHP".to_owned(),
    }];
    for (id, name, kind) in SHAPE_FILES {
        let (size, pixels) = unit_frame(kind);
        assets.insert(name, ShapeEncoder::new(size, size).raw(pixels).encode());
        shapes.push(ShapeEntry {
            id: id.get(),
            name: name.to_owned(),
        });
    }

    let manifest = AssetManifest {
        version: SUPPORTED_MANIFEST_VERSION,
        theaters: BTreeMap::new(),
        shapes,
    };
    (manifest, assets)
}

/// Input replayed by headless runs: a box select, an order, grouping and scrolling.
pub(crate) fn scripted_input(frames: u64, centre: ScreenPoint) -> Vec<RawInput> {
    const PERIOD: u64 = 120;
    let frames = usize::try_from(frames.min(PERIOD * 50)).unwrap_or(0);
    let (cx, cy) = (centre.x(), centre.y());
    let mut script = Vec::with_capacity(frames);
    let mut held_before: Vec<u8> = Vec::new();
    for frame in 0..frames as u64 {
        let step = frame % PERIOD;
        let mut input = RawInput {
            mouse_x: cx,
            mouse_y: cy,
            ..RawInput::default()
        };
        match step {
            10 => {
                input.mouse_x = cx - 70;
                input.mouse_y = cy - 70;
                input.buttons[0] = true;
            }
            11..=20 => {
                let t = (step - 10) as i32;
                input.mouse_x = cx - 70 + t * 14;
                input.mouse_y = cy - 70 + t * 14;
                input.buttons[0] = true;
            }
            21 => {
                input.mouse_x = cx + 70;
                input.mouse_y = cy + 70;
            }
            30..=32 => input.keys_down = vec![keys::CONTROL, keys::digit(1)],
            40 => {
                input.mouse_x = cx + 120;
                input.mouse_y = cy - 60;
                input.buttons[1] = true;
            }
            41 => {
                input.mouse_x = cx + 120;
                input.mouse_y = cy - 60;
            }
            50..=70 => input.mouse_x = 478,
            80..=81 => input.keys_down = vec![keys::digit(1)],
            90..=100 => input.keys_down = vec![keys::UP],
            110..=115 => {
                input.mouse_x = 560;
                input.mouse_y = 300;
            }
            _ => {}
        }
        input.typed = input
            .keys_down
            .iter()
            .copied()
            .filter(|key| !held_before.contains(key))
            .collect();
        held_before.clone_from(&input.keys_down);
        script.push(input);
    }
    script
}

#[cfg(test)]
mod tests {
    use super::*;
    use tactica_rendering::AssetSource;

    fn map() -> MapConfig {
        MapConfig {
            columns: 48,
            rows: 40,
        }
    }

    #[test]
    fn same_seed_same_scenario() {
        assert_eq!(generate(7, map()), generate(7, map()));
        assert_ne!(
            generate(7, map()).objects,
            generate(8, map()).objects,
            "different seeds place objects differently"
        );
    }

    #[test]
    fn generated_scenarios_are_valid_snapshots() {
        let scenario = generate(42, map());
        assert_eq!((scenario.columns, scenario.rows), (48, 40));
        let encoded = scenario.encode().expect("encodes");
        let decoded = ScenarioSnapshot::decode(&encoded).expect("every cell lies on the map");
        assert_eq!(decoded, scenario);
        assert!(
            scenario.objects.iter().any(|object| object.owner == PLAYER),
            "the player gets a base"
        );
    }

    #[test]
    fn ground_units_stand_on_passable_land() {
        let scenario = generate(3, map());
        let world = scenario.to_world();
        for object in &scenario.objects {
            let land = tactica_core::TerrainMap::land(&world, object.cell);
            match object.kind {
                ObjectKind::Infantry | ObjectKind::Vehicle => {
                    assert!(land.is_some_and(|land| land.is_passable()), "{object:?} on {land:?}");
                }
                ObjectKind::Building => assert_eq!(land, Some(LandType::Clear)),
                ObjectKind::Vessel => assert_eq!(land, Some(LandType::Water)),
                ObjectKind::Aircraft => assert!(land.is_some()),
            }
        }
    }

    #[test]
    fn tiny_maps_are_enlarged() {
        let scenario = generate(
            1,
            MapConfig {
                columns: 4,
                rows: 4,
            },
        );
        assert_eq!((scenario.columns, scenario.rows), (24, 24));
    }

    #[test]
    fn every_theater_has_palette_and_templates() {
        let (manifest, assets) = assets();
        for theater in Theater::ALL {
            assert!(assets.contains(manifest.palette_for(theater)));
            for info in &TEMPLATES {
                let name = format!("{}{}", info.name, manifest.extension_for(theater));
                assert!(assets.contains(&name), "{name} missing");
            }
        }
        assert_eq!(manifest.shapes.len(), 1 + SHAPE_FILES.len());
        assert_eq!(
            assets.read("CLEAR1.TMP").ok().map(|bytes| bytes.len()),
            Some(TILE_BYTES * CLEAR_VARIANTS as usize)
        );
    }

    #[test]
    fn script_presses_keys_once() {
        let script = scripted_input(120, ScreenPoint::new(240, 208));
        assert_eq!(script.len(), 120);
        assert_eq!(script[30].typed, vec![keys::CONTROL, keys::digit(1)]);
        assert!(script[31].typed.is_empty(), "held keys are not typed again");
        assert!(script[10].buttons[0] && !script[21].buttons[0]);
    }
}
