//! Dense terrain grid describing land types, tile art and shroud.

use tactica_core::{CellCoord, LandType, TemplateId};

/// Terrain state stored for a single map cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TerrainCell {
    /// Land classification of the cell.
    pub land: LandType,
    /// Template providing the cell's tile art.
    pub template: TemplateId,
    /// Icon within the template.
    pub icon: u8,
    /// Whether the player has revealed the cell.
    pub revealed: bool,
}

impl Default for TerrainCell {
    fn default() -> Self {
        Self {
            land: LandType::Clear,
            template: TemplateId::CLEAR,
            icon: 0,
            revealed: false,
        }
    }
}

/// Row-major grid of terrain cells.
#[derive(Clone, Debug, Default)]
pub(crate) struct TerrainGrid {
    columns: i32,
    rows: i32,
    cells: Vec<TerrainCell>,
}

impl TerrainGrid {
    /// Creates a grid filled with clear, unrevealed ground.
    pub(crate) fn new(columns: i32, rows: i32) -> Self {
        let columns = columns.max(0);
        let rows = rows.max(0);
        let count = usize::try_from(columns)
            .unwrap_or(0)
            .saturating_mul(usize::try_from(rows).unwrap_or(0));
        Self {
            columns,
            rows,
            cells: vec![TerrainCell::default(); count],
        }
    }

    pub(crate) const fn columns(&self) -> i32 {
        self.columns
    }

    pub(crate) const fn rows(&self) -> i32 {
        self.rows
    }

    pub(crate) fn cell(&self, cell: CellCoord) -> Option<&TerrainCell> {
        self.index(cell).and_then(|index| self.cells.get(index))
    }

    pub(crate) fn cell_mut(&mut self, cell: CellCoord) -> Option<&mut TerrainCell> {
        self.index(cell).and_then(|index| self.cells.get_mut(index))
    }

    /// Marks every cell as revealed.
    pub(crate) fn reveal_all(&mut self) {
        for cell in &mut self.cells {
            cell.revealed = true;
        }
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        if cell.column() < 0
            || cell.row() < 0
            || cell.column() >= self.columns
            || cell.row() >= self.rows
        {
            return None;
        }
        usize::try_from(cell.row() * self.columns + cell.column()).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cells_outside_the_grid_are_rejected() {
        let grid = TerrainGrid::new(4, 3);
        assert!(grid.cell(CellCoord::new(3, 2)).is_some());
        assert!(grid.cell(CellCoord::new(4, 0)).is_none());
        assert!(grid.cell(CellCoord::new(0, -1)).is_none());
    }

    #[test]
    fn negative_dimensions_produce_an_empty_grid() {
        let grid = TerrainGrid::new(-3, 5);
        assert_eq!(grid.columns(), 0);
        assert!(grid.cell(CellCoord::new(0, 0)).is_none());
    }

    #[test]
    fn reveal_all_marks_every_cell() {
        let mut grid = TerrainGrid::new(2, 2);
        grid.reveal_all();
        assert!(grid.cell(CellCoord::new(1, 1)).is_some_and(|cell| cell.revealed));
    }
}
