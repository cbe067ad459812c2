//! Broadside domain: board value types shared by the protocol and player crates.

pub mod cell;
pub mod coord;
pub mod error;
pub mod grid;
pub mod ship;

pub use cell::{Cell, ShipCellState};
pub use coord::{Coord, GRID_SIZE};
pub use error::DomainError;
pub use grid::Grid;
pub use ship::{initial_of, Orientation, ShipSpec, SHIP_CATALOG};
