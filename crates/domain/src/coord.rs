//! Board coordinates
//!
//! The wire carries zero-based `[row, col]` pairs; players read them as a column
//! letter followed by a one-based row number (`[0, 0]` is `A1`, `[2, 3]` is `D3`).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Side length of both boards.
pub const GRID_SIZE: usize = 10;

/// A cell position on a 10×10 board.
///
/// Serializes as the wire pair `[row, col]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "[i64; 2]", into = "[u8; 2]")]
pub struct Coord {
    row: u8,
    col: u8,
}

impl Coord {
    /// Create a coordinate, rejecting anything off the board.
    pub fn new(row: usize, col: usize) -> Result<Self, DomainError> {
        if row >= GRID_SIZE || col >= GRID_SIZE {
            return Err(DomainError::out_of_bounds(row as i64, col as i64));
        }
        Ok(Self {
            row: row as u8,
            col: col as u8,
        })
    }

    /// Create a coordinate from signed offsets, as produced by ship footprints.
    pub fn checked(row: i64, col: i64) -> Option<Self> {
        if (0..GRID_SIZE as i64).contains(&row) && (0..GRID_SIZE as i64).contains(&col) {
            Some(Self {
                row: row as u8,
                col: col as u8,
            })
        } else {
            None
        }
    }

    pub fn row(self) -> usize {
        self.row as usize
    }

    pub fn col(self) -> usize {
        self.col as usize
    }

    /// Player-facing label, e.g. `D3`.
    pub fn label(self) -> String {
        self.to_string()
    }

    /// Every coordinate of the board in row-major order.
    pub fn all() -> impl Iterator<Item = Coord> {
        (0..GRID_SIZE).flat_map(|row| {
            (0..GRID_SIZE).map(move |col| Coord {
                row: row as u8,
                col: col as u8,
            })
        })
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = (b'A' + self.col) as char;
        write!(f, "{}{}", letter, self.row + 1)
    }
}

impl FromStr for Coord {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let mut chars = s.chars();
        let letter = chars
            .next()
            .ok_or_else(|| DomainError::parse("Empty coordinate"))?
            .to_ascii_uppercase();
        if !letter.is_ascii_uppercase() {
            return Err(DomainError::parse(format!("Invalid column in '{}'", s)));
        }
        let number: usize = chars
            .as_str()
            .parse()
            .map_err(|_| DomainError::parse(format!("Invalid row in '{}'", s)))?;
        if number == 0 {
            return Err(DomainError::parse(format!("Rows start at 1: '{}'", s)));
        }
        let col = (letter as u8 - b'A') as usize;
        Coord::new(number - 1, col)
    }
}

impl TryFrom<[i64; 2]> for Coord {
    type Error = DomainError;

    fn try_from([row, col]: [i64; 2]) -> Result<Self, Self::Error> {
        Coord::checked(row, col).ok_or(DomainError::OutOfBounds { row, col })
    }
}

impl From<Coord> for [u8; 2] {
    fn from(value: Coord) -> Self {
        [value.row, value.col]
    }
}
