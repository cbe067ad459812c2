//! Fleet catalog and ship orientation

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::coord::Coord;
use crate::error::DomainError;

/// A catalog entry: the ship name as known by the server and its length in cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShipSpec {
    pub name: &'static str,
    pub length: u8,
}

/// The fixed fleet every player places. Names are wire values shared with the server.
pub const SHIP_CATALOG: [ShipSpec; 5] = [
    ShipSpec {
        name: "Porte-avions",
        length: 5,
    },
    ShipSpec {
        name: "Croiseur",
        length: 4,
    },
    ShipSpec {
        name: "Contre-torpilleur",
        length: 3,
    },
    ShipSpec {
        name: "Sous-marin",
        length: 3,
    },
    ShipSpec {
        name: "Torpilleur",
        length: 2,
    },
];

impl ShipSpec {
    /// Look up a catalog entry by its exact name.
    pub fn by_name(name: &str) -> Result<ShipSpec, DomainError> {
        SHIP_CATALOG
            .iter()
            .copied()
            .find(|spec| spec.name == name)
            .ok_or_else(|| DomainError::unknown_ship(name))
    }

    /// Look up a catalog entry by its 1-based position in the catalog.
    pub fn by_number(number: usize) -> Option<ShipSpec> {
        number
            .checked_sub(1)
            .and_then(|idx| SHIP_CATALOG.get(idx))
            .copied()
    }
}

/// First character of a ship name, used for the sunk marker on the opponent board.
/// `?` for an empty name.
pub fn initial_of(name: &str) -> char {
    name.chars().next().unwrap_or('?')
}

/// Placement direction, serialized with the server's two-letter codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Orientation {
    /// Extends towards increasing columns
    #[default]
    #[serde(rename = "HR")]
    HorizontalRight,
    /// Extends towards decreasing columns
    #[serde(rename = "HL")]
    HorizontalLeft,
    /// Extends towards increasing rows
    #[serde(rename = "VD")]
    VerticalDown,
    /// Extends towards decreasing rows
    #[serde(rename = "VU")]
    VerticalUp,
}

impl Orientation {
    /// Next orientation in the rotation cycle `HR → VD → HL → VU → HR`.
    pub fn rotated(self) -> Self {
        match self {
            Self::HorizontalRight => Self::VerticalDown,
            Self::VerticalDown => Self::HorizontalLeft,
            Self::HorizontalLeft => Self::VerticalUp,
            Self::VerticalUp => Self::HorizontalRight,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Self::HorizontalRight => "HR",
            Self::HorizontalLeft => "HL",
            Self::VerticalDown => "VD",
            Self::VerticalUp => "VU",
        }
    }

    /// Cells a ship of `length` anchored at `origin` would cover.
    ///
    /// Cells falling off the board are omitted; legality is the server's call.
    pub fn footprint(self, origin: Coord, length: u8) -> Vec<Coord> {
        let (dr, dc): (i64, i64) = match self {
            Self::HorizontalRight => (0, 1),
            Self::HorizontalLeft => (0, -1),
            Self::VerticalDown => (1, 0),
            Self::VerticalUp => (-1, 0),
        };
        (0..i64::from(length))
            .filter_map(|i| {
                Coord::checked(origin.row() as i64 + dr * i, origin.col() as i64 + dc * i)
            })
            .collect()
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Orientation {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "HR" => Ok(Self::HorizontalRight),
            "HL" => Ok(Self::HorizontalLeft),
            "VD" => Ok(Self::VerticalDown),
            "VU" => Ok(Self::VerticalUp),
            _ => Err(DomainError::parse(format!("Unknown orientation: {}", s))),
        }
    }
}
