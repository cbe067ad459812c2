//! Wire encoding of board cells
//!
//! A cell travels either as a bare marker (`"~"`, `"O"`, `"X"`) or as a
//! `[ship_id, state, ship_name]` triple with state `"S"`, `"X"` or `"C"`.

use broadside_domain::{Cell, DomainError, Grid, ShipCellState};
use serde::{Deserialize, Serialize};

pub const EMPTY_MARKER: &str = "~";
pub const MISS_MARKER: &str = "O";
pub const HIT_MARKER: &str = "X";

/// A cell as it appears in a `grille` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WireCell {
    Marker(String),
    Ship(String, String, String),
}

impl TryFrom<WireCell> for Cell {
    type Error = DomainError;

    fn try_from(value: WireCell) -> Result<Self, Self::Error> {
        match value {
            WireCell::Marker(marker) => match marker.as_str() {
                EMPTY_MARKER => Ok(Cell::Empty),
                MISS_MARKER => Ok(Cell::Miss),
                HIT_MARKER => Ok(Cell::Hit),
                other => Err(DomainError::malformed_cell(format!(
                    "unknown marker '{}'",
                    other
                ))),
            },
            WireCell::Ship(ship_id, state, ship_name) => {
                let state = match state.as_str() {
                    "S" => ShipCellState::Placed,
                    "X" => ShipCellState::Hit,
                    "C" => ShipCellState::Sunk,
                    other => {
                        return Err(DomainError::malformed_cell(format!(
                            "unknown ship state '{}' for {}",
                            other, ship_id
                        )))
                    }
                };
                Ok(Cell::Ship {
                    ship_id,
                    state,
                    ship_name,
                })
            }
        }
    }
}

impl From<&Cell> for WireCell {
    fn from(cell: &Cell) -> Self {
        match cell {
            Cell::Empty => WireCell::Marker(EMPTY_MARKER.to_string()),
            Cell::Miss => WireCell::Marker(MISS_MARKER.to_string()),
            Cell::Hit => WireCell::Marker(HIT_MARKER.to_string()),
            Cell::Ship {
                ship_id,
                state,
                ship_name,
            } => {
                let code = match state {
                    ShipCellState::Placed => "S",
                    ShipCellState::Hit => "X",
                    ShipCellState::Sunk => "C",
                };
                WireCell::Ship(ship_id.clone(), code.to_string(), ship_name.clone())
            }
            Cell::SunkMarker { initial } => {
                WireCell::Ship("sunk".to_string(), "C".to_string(), initial.to_string())
            }
        }
    }
}

/// Decode a full `grille` payload.
pub fn grid_from_wire(rows: Vec<Vec<WireCell>>) -> Result<Grid, DomainError> {
    let rows = rows
        .into_iter()
        .map(|row| {
            row.into_iter()
                .map(Cell::try_from)
                .collect::<Result<Vec<_>, _>>()
        })
        .collect::<Result<Vec<_>, _>>()?;
    Grid::from_rows(rows)
}

/// Encode a board the way the server sends it.
pub fn grid_to_wire(grid: &Grid) -> Vec<Vec<WireCell>> {
    grid.rows()
        .map(|row| row.iter().map(WireCell::from).collect())
        .collect()
}

/// `#[serde(with = "...")]` adapter so message structs can hold a [`Grid`] directly.
pub mod grid_format {
    use super::*;
    use serde::{de::Error as _, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(grid: &Grid, serializer: S) -> Result<S::Ok, S::Error> {
        grid_to_wire(grid).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Grid, D::Error> {
        let rows = Vec::<Vec<WireCell>>::deserialize(deserializer)?;
        grid_from_wire(rows).map_err(D::Error::custom)
    }
}
