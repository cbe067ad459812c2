//! 10×10 board

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::cell::Cell;
use crate::coord::{Coord, GRID_SIZE};
use crate::error::DomainError;

/// A square board of [`GRID_SIZE`] × [`GRID_SIZE`] cells, stored row-major.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    cells: Vec<Cell>,
}

impl Default for Grid {
    fn default() -> Self {
        Self::new()
    }
}

impl Grid {
    /// An all-`Empty` board.
    pub fn new() -> Self {
        Self {
            cells: vec![Cell::Empty; GRID_SIZE * GRID_SIZE],
        }
    }

    /// Build a board from rows, rejecting anything that is not exactly 10×10.
    pub fn from_rows(rows: Vec<Vec<Cell>>) -> Result<Self, DomainError> {
        if rows.len() != GRID_SIZE {
            return Err(DomainError::malformed_cell(format!(
                "expected {} rows, got {}",
                GRID_SIZE,
                rows.len()
            )));
        }
        let mut cells = Vec::with_capacity(GRID_SIZE * GRID_SIZE);
        for (idx, row) in rows.into_iter().enumerate() {
            if row.len() != GRID_SIZE {
                return Err(DomainError::malformed_cell(format!(
                    "row {} has {} cells",
                    idx,
                    row.len()
                )));
            }
            cells.extend(row);
        }
        Ok(Self { cells })
    }

    fn index(coord: Coord) -> usize {
        coord.row() * GRID_SIZE + coord.col()
    }

    pub fn get(&self, coord: Coord) -> &Cell {
        &self.cells[Self::index(coord)]
    }

    /// Overwrite a cell unconditionally.
    pub fn set(&mut self, coord: Coord, cell: Cell) {
        self.cells[Self::index(coord)] = cell;
    }

    /// Write `cell` only if it does not move the cell backwards.
    ///
    /// Returns whether the write happened. Equal ranks overwrite.
    pub fn mark(&mut self, coord: Coord, cell: Cell) -> bool {
        let slot = &mut self.cells[Self::index(coord)];
        if cell.rank() < slot.rank() {
            return false;
        }
        *slot = cell;
        true
    }

    /// Names of every ship that has at least one cell on this board.
    pub fn placed_ship_names(&self) -> BTreeSet<String> {
        self.cells
            .iter()
            .filter_map(|cell| cell.ship_name().map(str::to_string))
            .collect()
    }

    /// Coordinates of every cell carrying `ship_id`.
    pub fn ship_cells(&self, ship_id: &str) -> Vec<Coord> {
        Coord::all()
            .filter(|coord| self.get(*coord).ship_id() == Some(ship_id))
            .collect()
    }

    /// Rows in display order.
    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> {
        self.cells.chunks(GRID_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::ShipCellState;

    fn coord(label: &str) -> Coord {
        label.parse().expect("valid label")
    }

    fn ship(id: &str, name: &str) -> Cell {
        Cell::Ship {
            ship_id: id.to_string(),
            state: ShipCellState::Placed,
            ship_name: name.to_string(),
        }
    }

    #[test]
    fn test_mark_never_regresses() {
        let mut grid = Grid::new();
        let target = coord("C4");
        assert!(grid.mark(target, Cell::SunkMarker { initial: 'C' }));
        assert!(!grid.mark(target, Cell::Hit));
        assert!(!grid.mark(target, Cell::Empty));
        assert_eq!(grid.get(target), &Cell::SunkMarker { initial: 'C' });

        // equal rank: last write wins
        assert!(grid.mark(coord("A1"), Cell::Hit));
        assert!(grid.mark(coord("A1"), Cell::Miss));
        assert_eq!(grid.get(coord("A1")), &Cell::Miss);
    }

    #[test]
    fn test_placed_names_and_ship_cells() {
        let mut grid = Grid::new();
        grid.set(coord("A1"), ship("navire_4_Torpilleur", "Torpilleur"));
        grid.set(coord("B1"), ship("navire_4_Torpilleur", "Torpilleur"));
        grid.set(coord("E5"), ship("navire_1_Croiseur", "Croiseur"));

        let names: Vec<String> = grid.placed_ship_names().into_iter().collect();
        assert_eq!(names, ["Croiseur", "Torpilleur"]);
        assert_eq!(
            grid.ship_cells("navire_4_Torpilleur"),
            vec![coord("A1"), coord("B1")]
        );
    }

    #[test]
    fn test_from_rows_rejects_bad_shape() {
        assert!(Grid::from_rows(vec![vec![Cell::Empty; GRID_SIZE]; 9]).is_err());
        let mut rows = vec![vec![Cell::Empty; GRID_SIZE]; GRID_SIZE];
        rows[3].pop();
        assert!(Grid::from_rows(rows).is_err());
        assert_eq!(
            Grid::from_rows(vec![vec![Cell::Empty; GRID_SIZE]; GRID_SIZE]),
            Ok(Grid::new())
        );
    }
}
