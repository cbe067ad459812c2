//! Board cells
//!
//! A cell only ever moves forward: `Empty → {Miss | Hit} → Sunk`. The rank
//! helpers below encode that ordering so re-applied results cannot regress a cell.

use serde::{Deserialize, Serialize};

/// Damage state of a cell that belongs to one of our own ships.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShipCellState {
    Placed,
    Hit,
    Sunk,
}

/// One square of a board.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Cell {
    /// Unknown or not yet attacked
    #[default]
    Empty,
    /// Attack resolved, nothing there
    Miss,
    /// Attack resolved on a ship that is still afloat
    Hit,
    /// Our own ship, identity revealed
    Ship {
        ship_id: String,
        state: ShipCellState,
        ship_name: String,
    },
    /// Opponent ship fully sunk, shown with the ship's initial
    SunkMarker { initial: char },
}

impl Cell {
    /// Progress rank: 0 untouched, 1 resolved, 2 sunk.
    pub fn rank(&self) -> u8 {
        match self {
            Cell::Empty
            | Cell::Ship {
                state: ShipCellState::Placed,
                ..
            } => 0,
            Cell::Miss
            | Cell::Hit
            | Cell::Ship {
                state: ShipCellState::Hit,
                ..
            } => 1,
            Cell::SunkMarker { .. }
            | Cell::Ship {
                state: ShipCellState::Sunk,
                ..
            } => 2,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    pub fn is_ship(&self) -> bool {
        matches!(self, Cell::Ship { .. })
    }

    pub fn ship_id(&self) -> Option<&str> {
        match self {
            Cell::Ship { ship_id, .. } => Some(ship_id),
            _ => None,
        }
    }

    pub fn ship_name(&self) -> Option<&str> {
        match self {
            Cell::Ship { ship_name, .. } => Some(ship_name),
            _ => None,
        }
    }

    /// Same ship identity with a new damage state.
    pub fn with_ship_state(&self, new_state: ShipCellState) -> Option<Cell> {
        match self {
            Cell::Ship {
                ship_id, ship_name, ..
            } => Some(Cell::Ship {
                ship_id: ship_id.clone(),
                state: new_state,
                ship_name: ship_name.clone(),
            }),
            _ => None,
        }
    }

    /// Single-character rendering used by text front-ends.
    pub fn symbol(&self) -> char {
        match self {
            Cell::Empty => '~',
            Cell::Miss => 'O',
            Cell::Hit => 'X',
            Cell::Ship { state, .. } => match state {
                ShipCellState::Placed => 'S',
                ShipCellState::Hit => 'X',
                ShipCellState::Sunk => 'C',
            },
            Cell::SunkMarker { initial } => *initial,
        }
    }
}
