//! Unified error types for the domain layer
//!
//! Provides a common error type for value-object construction and parsing,
//! so the protocol and player crates never have to fall back to `String` errors.

use thiserror::Error;

/// Unified error type for domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A coordinate component lies outside the 10×10 board
    #[error("Coordinate out of bounds: ({row}, {col})")]
    OutOfBounds { row: i64, col: i64 },

    /// Parse error (for value objects)
    #[error("Parse error: {0}")]
    Parse(String),

    /// Ship name not present in the catalog
    #[error("Unknown ship: {0}")]
    UnknownShip(String),

    /// A wire cell could not be mapped to a domain cell
    #[error("Malformed cell: {0}")]
    MalformedCell(String),
}

impl DomainError {
    /// Create an out-of-bounds error
    pub fn out_of_bounds(row: impl Into<i64>, col: impl Into<i64>) -> Self {
        Self::OutOfBounds {
            row: row.into(),
            col: col.into(),
        }
    }

    /// Creates a parse error for string-to-type conversion failures.
    ///
    /// Use this in `FromStr` implementations when the input string
    /// doesn't match any known variant or format.
    ///
    /// # Example
    /// ```ignore
    /// impl FromStr for Orientation {
    ///     type Err = DomainError;
    ///     fn from_str(s: &str) -> Result<Self, Self::Err> {
    ///         match s {
    ///             "HR" => Ok(Self::HorizontalRight),
    ///             _ => Err(DomainError::parse(format!("Unknown orientation: {}", s))),
    ///         }
    ///     }
    /// }
    /// ```
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Create an unknown ship error
    pub fn unknown_ship(name: impl Into<String>) -> Self {
        Self::UnknownShip(name.into())
    }

    /// Create a malformed cell error
    pub fn malformed_cell(msg: impl Into<String>) -> Self {
        Self::MalformedCell(msg.into())
    }
}
