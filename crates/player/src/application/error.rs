//! Intent rejection errors

use thiserror::Error;

use broadside_domain::{Coord, DomainError};

use super::session::Phase;

/// Why a player intent was rejected locally. Nothing is sent when this is returned.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IntentError {
    #[error("Not allowed during {phase}")]
    WrongPhase { phase: Phase },

    #[error("Not your turn")]
    NotYourTurn,

    #[error("Cell {0} was already attacked")]
    AlreadyAttacked(Coord),

    #[error("No ship selected")]
    NoShipSelected,

    #[error("{0} is already placed")]
    ShipAlreadyPlaced(String),

    #[error("Placement incomplete: {placed}/{total} ships placed")]
    PlacementIncomplete { placed: usize, total: usize },

    #[error("Already connected or connecting")]
    AlreadyConnected,

    #[error("Rematch already requested")]
    ReplayAlreadyRequested,

    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl IntentError {
    pub fn wrong_phase(phase: Phase) -> Self {
        Self::WrongPhase { phase }
    }
}
