//! ClientMessage builder
//!
//! Centralizes construction of outbound intents so the session never assembles
//! wire payloads by hand.

use broadside_domain::{Coord, Orientation, ShipSpec};
use broadside_shared::ClientMessage;

/// Builder for ClientMessage variants
pub struct ClientMessageBuilder;

impl ClientMessageBuilder {
    // =========================================================================
    // Lobby
    // =========================================================================

    pub fn join() -> ClientMessage {
        ClientMessage::Join
    }

    pub fn set_ready() -> ClientMessage {
        ClientMessage::SetReady
    }

    // =========================================================================
    // Placement
    // =========================================================================

    /// Create a PlaceShip message for a catalog ship
    pub fn place_ship(ship: ShipSpec, origin: Coord, orientation: Orientation) -> ClientMessage {
        ClientMessage::PlaceShip {
            taille_navire: ship.length,
            coordonnees: origin,
            orientation,
            nom_navire: ship.name.to_string(),
        }
    }

    pub fn confirm_placement() -> ClientMessage {
        ClientMessage::ConfirmPlacement
    }

    pub fn reset_placement() -> ClientMessage {
        ClientMessage::ResetPlacement
    }

    pub fn request_auto_placement() -> ClientMessage {
        ClientMessage::RequestAutoPlacement
    }

    // =========================================================================
    // Battle / end of game
    // =========================================================================

    pub fn attack(target: Coord) -> ClientMessage {
        ClientMessage::Attack {
            coordonnees: target,
        }
    }

    pub fn request_replay() -> ClientMessage {
        ClientMessage::RequestReplay
    }

    pub fn disconnect() -> ClientMessage {
        ClientMessage::Disconnect
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_place_ship() {
        let ship = ShipSpec::by_name("Sous-marin").expect("catalog ship");
        let origin = Coord::new(3, 4).expect("valid");
        let msg = ClientMessageBuilder::place_ship(ship, origin, Orientation::VerticalUp);
        match msg {
            ClientMessage::PlaceShip {
                taille_navire,
                coordonnees,
                orientation,
                nom_navire,
            } => {
                assert_eq!(taille_navire, 3);
                assert_eq!(coordonnees, origin);
                assert_eq!(orientation, Orientation::VerticalUp);
                assert_eq!(nom_navire, "Sous-marin");
            }
            _ => panic!("Expected PlaceShip message"),
        }
    }

    #[test]
    fn test_attack() {
        let target = Coord::new(2, 3).expect("valid");
        assert_eq!(
            ClientMessageBuilder::attack(target),
            ClientMessage::Attack {
                coordonnees: target
            }
        );
    }
}
