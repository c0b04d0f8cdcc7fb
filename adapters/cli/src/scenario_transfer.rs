//! Single-line scenario snapshots for sharing maps between runs.

use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use serde::{Deserialize, Serialize};
use tactica_core::{
    CellCoord, HouseId, LandType, ObjectKind, ObjectStore, ObjectTraits, TemplateId, TerrainMap,
};
use tactica_world::World;
use thiserror::Error;

const SNAPSHOT_DOMAIN: &str = "tactica";
const SNAPSHOT_VERSION: &str = "v1";

/// Identifier prefix emitted before the encoded snapshot payload.
pub(crate) const SNAPSHOT_HEADER: &str = "tactica:v1";
/// Delimiter used to separate the prefix, map dimensions and payload.
const FIELD_DELIMITER: char = ':';
/// Largest map side a snapshot may declare, in cells.
pub(crate) const MAX_MAP_CELLS: u32 = 256;

/// Map size, non-clear terrain and objects of a scenario.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct ScenarioSnapshot {
    /// Map width in cells.
    pub(crate) columns: u32,
    /// Map height in cells.
    pub(crate) rows: u32,
    /// Cells whose land is not clear.
    pub(crate) terrain: Vec<ScenarioTerrain>,
    /// Objects placed on the map.
    pub(crate) objects: Vec<ScenarioObject>,
}

/// Land override for one cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct ScenarioTerrain {
    pub(crate) cell: CellCoord,
    pub(crate) land: LandType,
}

/// Object placed by a scenario.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct ScenarioObject {
    pub(crate) kind: ObjectKind,
    pub(crate) owner: u8,
    pub(crate) cell: CellCoord,
    pub(crate) traits: ObjectTraits,
}

#[derive(Debug, Serialize, Deserialize)]
struct SerializableScenario {
    #[serde(default)]
    terrain: Vec<ScenarioTerrain>,
    objects: Vec<ScenarioObject>,
}

/// Errors that can occur while decoding scenario strings.
#[derive(Debug, Error)]
pub(crate) enum ScenarioTransferError {
    /// The provided string was empty or contained only whitespace.
    #[error("scenario string was empty")]
    EmptyPayload,
    /// The prefix segment was missing.
    #[error("scenario string is missing the prefix")]
    MissingPrefix,
    /// The version segment was missing.
    #[error("scenario string is missing the version")]
    MissingVersion,
    /// The map dimensions were missing.
    #[error("scenario string is missing the map dimensions")]
    MissingDimensions,
    /// The payload segment was missing.
    #[error("scenario string is missing the payload")]
    MissingPayload,
    /// More segments followed the payload.
    #[error("scenario string has unexpected trailing fields")]
    TrailingFields,
    /// The prefix named another format.
    #[error("scenario prefix '{0}' is not supported")]
    InvalidPrefix(String),
    /// The version is not understood by this build.
    #[error("scenario version '{0}' is not supported")]
    UnsupportedVersion(String),
    /// The dimensions could not be parsed, were zero or exceeded the map limit.
    #[error("could not parse map dimensions '{0}'")]
    InvalidDimensions(String),
    /// The base64 payload could not be decoded.
    #[error("could not decode scenario payload: {0}")]
    InvalidEncoding(#[source] base64::DecodeError),
    /// The decoded payload is not a scenario document.
    #[error("could not parse scenario payload: {0}")]
    InvalidPayload(#[source] serde_json::Error),
    /// A listed cell lies outside the map.
    #[error("cell ({column}, {row}) lies outside the {columns}x{rows} map")]
    CellOutOfBounds {
        column: i32,
        row: i32,
        columns: u32,
        rows: u32,
    },
}

impl ScenarioSnapshot {
    /// Encodes the snapshot into a single-line string suitable for clipboard transfer.
    pub(crate) fn encode(&self) -> Result<String, serde_json::Error> {
        let payload = SerializableScenario {
            terrain: self.terrain.clone(),
            objects: self.objects.clone(),
        };
        let json = serde_json::to_vec(&payload)?;
        let encoded = STANDARD_NO_PAD.encode(json);
        Ok(format!(
            "{SNAPSHOT_HEADER}:{}x{}:{encoded}",
            self.columns, self.rows
        ))
    }

    /// Decodes a snapshot from the provided string representation.
    pub(crate) fn decode(value: &str) -> Result<Self, ScenarioTransferError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ScenarioTransferError::EmptyPayload);
        }

        let mut parts = trimmed.split(FIELD_DELIMITER);
        let domain = parts.next().ok_or(ScenarioTransferError::MissingPrefix)?;
        let version = parts.next().ok_or(ScenarioTransferError::MissingVersion)?;
        let dimensions = parts
            .next()
            .ok_or(ScenarioTransferError::MissingDimensions)?;
        let payload = parts.next().ok_or(ScenarioTransferError::MissingPayload)?;
        if parts.next().is_some() {
            return Err(ScenarioTransferError::TrailingFields);
        }

        if domain != SNAPSHOT_DOMAIN {
            return Err(ScenarioTransferError::InvalidPrefix(domain.to_owned()));
        }
        if version != SNAPSHOT_VERSION {
            return Err(ScenarioTransferError::UnsupportedVersion(version.to_owned()));
        }

        let (columns, rows) = parse_dimensions(dimensions)?;
        let bytes = STANDARD_NO_PAD
            .decode(payload.as_bytes())
            .map_err(ScenarioTransferError::InvalidEncoding)?;
        let decoded: SerializableScenario =
            serde_json::from_slice(&bytes).map_err(ScenarioTransferError::InvalidPayload)?;

        let cells = decoded
            .terrain
            .iter()
            .map(|entry| entry.cell)
            .chain(decoded.objects.iter().map(|object| object.cell));
        for cell in cells {
            if !in_bounds(cell, columns, rows) {
                return Err(ScenarioTransferError::CellOutOfBounds {
                    column: cell.column(),
                    row: cell.row(),
                    columns,
                    rows,
                });
            }
        }

        Ok(Self {
            columns,
            rows,
            terrain: decoded.terrain,
            objects: decoded.objects,
        })
    }

    /// Captures the terrain and objects currently held by the world.
    pub(crate) fn from_world(world: &World) -> Self {
        let (columns, rows) = world.size_in_cells();
        let mut terrain = Vec::new();
        for row in 0..rows {
            for column in 0..columns {
                let cell = CellCoord::new(column, row);
                match world.land(cell) {
                    Some(LandType::Clear) | None => {}
                    Some(land) => terrain.push(ScenarioTerrain { cell, land }),
                }
            }
        }
        let objects = world
            .all_objects()
            .into_iter()
            .map(|object| ScenarioObject {
                kind: object.kind,
                owner: object.owner.get(),
                cell: object.cell(),
                traits: object.traits,
            })
            .collect();
        Self {
            columns: u32::try_from(columns).unwrap_or(0),
            rows: u32::try_from(rows).unwrap_or(0),
            terrain,
            objects,
        }
    }

    /// Builds a world holding the snapshot's terrain and objects.
    pub(crate) fn to_world(&self) -> World {
        let columns = i32::try_from(self.columns).unwrap_or(i32::MAX);
        let rows = i32::try_from(self.rows).unwrap_or(i32::MAX);
        let mut world = World::new(columns, rows);
        for entry in &self.terrain {
            let _ = world.set_terrain(entry.cell, entry.land, template_for(entry.land), 0);
        }
        for object in &self.objects {
            let id = world.spawn(object.kind, HouseId::new(object.owner), object.cell);
            let _ = world.set_traits(id, object.traits);
        }
        world
    }
}

/// Template drawn for cells of the given land type.
pub(crate) const fn template_for(land: LandType) -> TemplateId {
    match land {
        LandType::Water | LandType::River => TemplateId::new(1),
        LandType::Beach => TemplateId::new(3),
        LandType::Rock | LandType::Wall => TemplateId::new(11),
        LandType::Road => TemplateId::new(13),
        LandType::Rough => TemplateId::new(16),
        LandType::Clear | LandType::Tiberium => TemplateId::CLEAR,
    }
}

fn in_bounds(cell: CellCoord, columns: u32, rows: u32) -> bool {
    u32::try_from(cell.column()).is_ok_and(|column| column < columns)
        && u32::try_from(cell.row()).is_ok_and(|row| row < rows)
}

fn parse_dimensions(dimensions: &str) -> Result<(u32, u32), ScenarioTransferError> {
    let invalid = || ScenarioTransferError::InvalidDimensions(dimensions.to_owned());
    let (columns, rows) = dimensions.split_once(['x', 'X']).ok_or_else(invalid)?;

    let columns = columns.trim().parse::<u32>().map_err(|_| invalid())?;
    let rows = rows.trim().parse::<u32>().map_err(|_| invalid())?;

    if !(1..=MAX_MAP_CELLS).contains(&columns) || !(1..=MAX_MAP_CELLS).contains(&rows) {
        return Err(invalid());
    }

    Ok((columns, rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ScenarioSnapshot {
        ScenarioSnapshot {
            columns: 20,
            rows: 15,
            terrain: vec![ScenarioTerrain {
                cell: CellCoord::new(3, 4),
                land: LandType::Water,
            }],
            objects: vec![
                ScenarioObject {
                    kind: ObjectKind::Vehicle,
                    owner: 0,
                    cell: CellCoord::new(5, 7),
                    traits: ObjectTraits::ATTACKABLE | ObjectTraits::HARVESTER,
                },
                ScenarioObject {
                    kind: ObjectKind::Building,
                    owner: 1,
                    cell: CellCoord::new(12, 4),
                    traits: ObjectTraits::ATTACKABLE | ObjectTraits::SELLABLE,
                },
            ],
        }
    }

    fn payload_for(json: &str) -> String {
        format!("{SNAPSHOT_HEADER}:20x15:{}", STANDARD_NO_PAD.encode(json))
    }

    #[test]
    fn encoded_scenarios_decode_to_the_same_snapshot() {
        let snapshot = sample();
        let encoded = snapshot.encode().expect("snapshot encodes");
        assert!(encoded.starts_with("tactica:v1:20x15:"));
        assert!(!encoded.contains('\n'), "snapshots stay on one line");
        let decoded = ScenarioSnapshot::decode(&encoded).expect("snapshot decodes");
        assert_eq!(decoded, snapshot);
    }

    #[test]
    fn header_fields_are_checked_in_order() {
        assert!(matches!(
            ScenarioSnapshot::decode("   "),
            Err(ScenarioTransferError::EmptyPayload)
        ));
        assert!(matches!(
            ScenarioSnapshot::decode("tactica"),
            Err(ScenarioTransferError::MissingVersion)
        ));
        assert!(matches!(
            ScenarioSnapshot::decode("tactica:v1"),
            Err(ScenarioTransferError::MissingDimensions)
        ));
        assert!(matches!(
            ScenarioSnapshot::decode("tactica:v1:4x4"),
            Err(ScenarioTransferError::MissingPayload)
        ));
        assert!(matches!(
            ScenarioSnapshot::decode("rts:v1:4x4:e30"),
            Err(ScenarioTransferError::InvalidPrefix(prefix)) if prefix == "rts"
        ));
        assert!(matches!(
            ScenarioSnapshot::decode("tactica:v2:4x4:e30"),
            Err(ScenarioTransferError::UnsupportedVersion(version)) if version == "v2"
        ));
        assert!(matches!(
            ScenarioSnapshot::decode("tactica:v1:0x4:e30"),
            Err(ScenarioTransferError::InvalidDimensions(_))
        ));
        assert!(matches!(
            ScenarioSnapshot::decode("tactica:v1:65535x65535:e30"),
            Err(ScenarioTransferError::InvalidDimensions(_))
        ));
        assert!(matches!(
            ScenarioSnapshot::decode(&format!("tactica:v1:4x{}:e30", u32::MAX)),
            Err(ScenarioTransferError::InvalidDimensions(_))
        ));
        assert!(matches!(
            ScenarioSnapshot::decode("tactica:v1:4x4:e30:extra"),
            Err(ScenarioTransferError::TrailingFields)
        ));
    }

    #[test]
    fn malformed_payloads_are_reported() {
        assert!(matches!(
            ScenarioSnapshot::decode("tactica:v1:4x4:***"),
            Err(ScenarioTransferError::InvalidEncoding(_))
        ));
        assert!(matches!(
            ScenarioSnapshot::decode(&payload_for(r#"{"terrain": 3}"#)),
            Err(ScenarioTransferError::InvalidPayload(_))
        ));
        let outside = payload_for(
            r#"{"objects": [{"kind": "Infantry", "owner": 0, "cell": {"column": 20, "row": 0}, "traits": ""}]}"#,
        );
        assert!(
            matches!(
                ScenarioSnapshot::decode(&outside),
                Err(ScenarioTransferError::CellOutOfBounds { column: 20, row: 0, .. })
            ),
            "objects must lie on the map"
        );
    }

    #[test]
    fn worlds_survive_a_snapshot() {
        let world = sample().to_world();
        assert_eq!(world.size_in_cells(), (20, 15));
        assert_eq!(world.land(CellCoord::new(3, 4)), Some(LandType::Water));
        let captured = ScenarioSnapshot::from_world(&world);
        assert_eq!(captured, sample(), "terrain, owners and traits are kept");
    }
}
