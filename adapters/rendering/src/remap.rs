//! Colour remap tables applied per pixel while drawing shapes.

use serde::{Deserialize, Serialize};

use crate::{Palette, Rgb};

/// First palette index recoloured by house remapping.
pub const HOUSE_REMAP_START: u8 = 80;
/// Last palette index recoloured by house remapping.
pub const HOUSE_REMAP_END: u8 = 95;
/// Number of levels in a fade table set.
pub const FADE_LEVELS: usize = 16;

/// Lookup from source palette index to destination index.
///
/// Index 0 always maps to 0 so transparency survives any remap.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemapTable([u8; 256]);

impl Default for RemapTable {
    fn default() -> Self {
        Self::identity()
    }
}

impl RemapTable {
    /// Table mapping every index to itself.
    #[must_use]
    pub fn identity() -> Self {
        let mut table = [0u8; 256];
        for (index, entry) in table.iter_mut().enumerate() {
            *entry = index as u8;
        }
        Self(table)
    }

    /// Builds a table from a mapping function. Index 0 is forced to 0.
    #[must_use]
    pub fn from_fn<F>(mut map: F) -> Self
    where
        F: FnMut(u8) -> u8,
    {
        let mut table = [0u8; 256];
        for (index, entry) in table.iter_mut().enumerate().skip(1) {
            *entry = map(index as u8);
        }
        Self(table)
    }

    /// Darkens every colour by `intensity` (0 keeps it, 1 is black).
    #[must_use]
    pub fn shadow(palette: &Palette, intensity: f32) -> Self {
        let factor = 1.0 - intensity.clamp(0.0, 1.0);
        Self::from_fn(|index| palette.find_closest_color(palette.get(index).scaled(factor)))
    }

    /// Recolours the house range towards the house colour, dark to light.
    #[must_use]
    pub fn house(palette: &Palette, house: HouseColor) -> Self {
        let base = house.primary();
        let count = f32::from(HOUSE_REMAP_END - HOUSE_REMAP_START);
        let mut table = Self::identity();
        for index in HOUSE_REMAP_START..=HOUSE_REMAP_END {
            let t = f32::from(index - HOUSE_REMAP_START) / count;
            let shaded = base.scaled(0.3 + 0.7 * t);
            table.0[usize::from(index)] = palette.find_closest_color(shaded);
        }
        table
    }

    /// Sixteen tables fading from the palette (level 0) to black (level 15).
    #[must_use]
    pub fn fade_levels(palette: &Palette) -> Vec<RemapTable> {
        (0..FADE_LEVELS)
            .map(|level| {
                let factor = 1.0 - level as f32 / (FADE_LEVELS - 1) as f32;
                Self::from_fn(|index| palette.find_closest_color(palette.get(index).scaled(factor)))
            })
            .collect()
    }

    /// Destination index for `index`.
    #[must_use]
    pub const fn apply(&self, index: u8) -> u8 {
        self.0[index as usize]
    }

    /// Raw table entries.
    #[must_use]
    pub const fn entries(&self) -> &[u8; 256] {
        &self.0
    }
}

/// The eight house colours.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HouseColor {
    /// Yellow.
    #[default]
    Gold,
    /// Light blue.
    LightBlue,
    /// Red.
    Red,
    /// Green.
    Green,
    /// Orange.
    Orange,
    /// Grey.
    Grey,
    /// Dark blue.
    Blue,
    /// Brown.
    Brown,
}

impl HouseColor {
    /// Every house colour in index order.
    pub const ALL: [HouseColor; 8] = [
        Self::Gold,
        Self::LightBlue,
        Self::Red,
        Self::Green,
        Self::Orange,
        Self::Grey,
        Self::Blue,
        Self::Brown,
    ];

    /// House colour for a house index; indices wrap around.
    #[must_use]
    pub const fn for_house(house: u8) -> Self {
        Self::ALL[(house % 8) as usize]
    }

    /// Full-brightness colour of the house.
    #[must_use]
    pub const fn primary(&self) -> Rgb {
        match self {
            Self::Gold => Rgb::new(255, 255, 0),
            Self::LightBlue => Rgb::new(0, 160, 255),
            Self::Red => Rgb::new(255, 0, 0),
            Self::Green => Rgb::new(0, 200, 0),
            Self::Orange => Rgb::new(255, 128, 0),
            Self::Grey => Rgb::new(128, 128, 128),
            Self::Blue => Rgb::new(0, 0, 255),
            Self::Brown => Rgb::new(140, 80, 40),
        }
    }
}

/// Every table the shape renderer needs for its effect flags.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EffectTables {
    /// Darkening table used under shadow masks.
    pub shadow: RemapTable,
    /// Fade levels, brightest first.
    pub fade: Vec<RemapTable>,
    /// House tables in [`HouseColor::ALL`] order.
    pub houses: Vec<RemapTable>,
}

impl EffectTables {
    /// Builds every table against `palette`.
    #[must_use]
    pub fn build(palette: &Palette) -> Self {
        Self {
            shadow: RemapTable::shadow(palette, 0.5),
            fade: RemapTable::fade_levels(palette),
            houses: HouseColor::ALL
                .iter()
                .map(|&house| RemapTable::house(palette, house))
                .collect(),
        }
    }

    /// House remap table.
    #[must_use]
    pub fn house(&self, color: HouseColor) -> &RemapTable {
        &self.houses[color as usize]
    }

    /// Fade table for `level`, clamped to the last level.
    #[must_use]
    pub fn fade_level(&self, level: usize) -> &RemapTable {
        &self.fade[level.min(FADE_LEVELS - 1)]
    }
}
