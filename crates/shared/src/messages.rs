//! WebSocket message types for server-player communication
//!
//! Every frame is a JSON object keyed by `action`. Variant names are English,
//! the `action` values are the server's vocabulary.
//!
//! ## Versioning Policy
//!
//! - New variants can be added at the end (forward compatible)
//! - Unknown inbound actions deserialize to `ServerMessage::Unknown`

use broadside_domain::{Coord, Grid, Orientation};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ProtocolError;

// =============================================================================
// Client Messages (Player → Server)
// =============================================================================

/// Intents sent by the player to the server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action")]
pub enum ClientMessage {
    /// Announce ourselves in the room
    #[serde(rename = "join")]
    Join,
    /// Ready to start placement
    #[serde(rename = "joueur_pret")]
    SetReady,
    /// Place one ship from the catalog
    #[serde(rename = "placer_navire")]
    PlaceShip {
        taille_navire: u8,
        coordonnees: Coord,
        orientation: Orientation,
        nom_navire: String,
    },
    #[serde(rename = "confirmation_placement")]
    ConfirmPlacement,
    #[serde(rename = "reinitialisation_placement")]
    ResetPlacement,
    #[serde(rename = "demande_placement_auto")]
    RequestAutoPlacement,
    /// Fire at a cell of the opponent board
    #[serde(rename = "attaque")]
    Attack { coordonnees: Coord },
    /// Ask for, or accept, a rematch
    #[serde(rename = "rejouer")]
    RequestReplay,
    /// Voluntary leave
    #[serde(rename = "deconnexion")]
    Disconnect,
}

impl ClientMessage {
    /// The `action` value this message is sent under.
    pub fn action(&self) -> &'static str {
        match self {
            Self::Join => "join",
            Self::SetReady => "joueur_pret",
            Self::PlaceShip { .. } => "placer_navire",
            Self::ConfirmPlacement => "confirmation_placement",
            Self::ResetPlacement => "reinitialisation_placement",
            Self::RequestAutoPlacement => "demande_placement_auto",
            Self::Attack { .. } => "attaque",
            Self::RequestReplay => "rejouer",
            Self::Disconnect => "deconnexion",
        }
    }

    pub fn to_json(&self) -> Result<String, ProtocolError> {
        serde_json::to_string(self).map_err(|e| ProtocolError::Serialize(e.to_string()))
    }
}

// =============================================================================
// Server Messages (Server → Player)
// =============================================================================

/// Outcome tag of an attack, as reported by the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttackOutcome {
    #[serde(rename = "manque")]
    Miss,
    #[serde(rename = "touche")]
    Hit,
    #[serde(rename = "coule")]
    Sunk,
    /// Last ship sunk; the server sends no separate `coule` tag for it
    #[serde(rename = "gagne")]
    Won,
    #[serde(rename = "deja_attaque")]
    AlreadyAttacked,
    #[serde(rename = "invalide")]
    Invalid,
    #[serde(other)]
    Unknown,
}

/// Which side of an attack the receiving player is on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttackRole {
    #[serde(rename = "attaquant")]
    Attacker,
    #[serde(rename = "defenseur")]
    Defender,
}

/// Events pushed by the server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action")]
pub enum ServerMessage {
    /// Our identity in the room
    #[serde(rename = "player_joined")]
    PlayerJoined { player_id: String, player_index: u8 },
    /// Both players are connected
    #[serde(rename = "ready")]
    Ready {
        #[serde(default)]
        message: Option<String>,
    },
    /// We are ready, the opponent is not yet
    #[serde(rename = "attente_adversaire")]
    WaitingForOpponent {
        #[serde(default)]
        message: Option<String>,
    },
    #[serde(rename = "debut_placement")]
    PlacementStarted {
        #[serde(default)]
        message: Option<String>,
    },
    /// Our own board, sent after every placement change
    #[serde(rename = "mise_a_jour_grille")]
    GridUpdate {
        #[serde(with = "crate::wire::grid_format")]
        grille: Grid,
    },
    #[serde(rename = "erreur_placement")]
    PlacementRejected {
        #[serde(default)]
        message: Option<String>,
    },
    #[serde(rename = "placement_confirme")]
    PlacementConfirmed {
        #[serde(default)]
        message: Option<String>,
    },
    #[serde(rename = "tous_navires_prets")]
    AllShipsReady {
        #[serde(default)]
        message: Option<String>,
    },
    /// First turn of the battle
    #[serde(rename = "debut_tour")]
    TurnStarted {
        tour_joueur: u8,
        #[serde(default)]
        player_index: Option<u8>,
        #[serde(default)]
        message: Option<String>,
    },
    #[serde(rename = "changement_tour")]
    TurnChanged {
        tour_joueur: u8,
        #[serde(default)]
        player_index: Option<u8>,
        #[serde(default)]
        message: Option<String>,
    },
    /// Broadcast to both players after every attack
    #[serde(rename = "resultat_attaque")]
    AttackResult {
        resultat: AttackOutcome,
        coordonnees: Coord,
        type_joueur: AttackRole,
        #[serde(default)]
        peut_rejouer: bool,
        #[serde(default)]
        nom_navire: Option<String>,
        #[serde(default)]
        positions_coule: Vec<Coord>,
    },
    #[serde(rename = "fin_partie")]
    GameOver {
        victoire: bool,
        #[serde(default)]
        gagnant_id: Option<String>,
    },
    /// A rematch was requested by `waiting_player`
    #[serde(rename = "attente_rejouer")]
    ReplayPending {
        #[serde(default)]
        message: Option<String>,
        #[serde(default)]
        waiting_player: Option<String>,
    },
    /// Both players accepted the rematch
    #[serde(rename = "restart")]
    Restart,
    #[serde(rename = "adversaire_deconnecte")]
    OpponentDisconnected {
        #[serde(default)]
        message: Option<String>,
    },
    #[serde(rename = "erreur")]
    Error {
        #[serde(default)]
        message: Option<String>,
    },

    /// Unknown action for forward compatibility
    ///
    /// When deserializing an unknown action, this variant is used instead of
    /// failing. The raw payload is still available on [`ServerFrame`].
    #[serde(other)]
    Unknown,
}

/// A decoded inbound frame together with its raw JSON.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerFrame {
    pub message: ServerMessage,
    pub raw: Value,
}

impl ServerFrame {
    /// The `action` string exactly as received.
    pub fn action(&self) -> &str {
        self.raw
            .get("action")
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    /// Free-text `message` field, if the server sent one.
    pub fn raw_message(&self) -> Option<&str> {
        self.raw.get("message").and_then(Value::as_str)
    }
}

/// Decode one text frame from the server.
///
/// Unknown actions succeed as [`ServerMessage::Unknown`]; only frames that are not
/// JSON objects with an `action`, or whose payload does not fit a known action, fail.
pub fn parse_server_message(text: &str) -> Result<ServerFrame, ProtocolError> {
    let raw: Value =
        serde_json::from_str(text).map_err(|e| ProtocolError::InvalidJson(e.to_string()))?;
    let action = raw
        .get("action")
        .and_then(Value::as_str)
        .ok_or(ProtocolError::MissingAction)?
        .to_string();
    let message = serde_json::from_value::<ServerMessage>(raw.clone())
        .map_err(|e| ProtocolError::invalid_payload(action, e))?;
    Ok(ServerFrame { message, raw })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coord(row: usize, col: usize) -> Coord {
        Coord::new(row, col).expect("valid")
    }

    #[test]
    fn test_client_message_wire_shape() {
        let json = ClientMessage::PlaceShip {
            taille_navire: 5,
            coordonnees: coord(0, 0),
            orientation: Orientation::VerticalDown,
            nom_navire: "Porte-avions".to_string(),
        }
        .to_json()
        .expect("serialize");
        let value: Value = serde_json::from_str(&json).expect("json");
        assert_eq!(
            value,
            serde_json::json!({
                "action": "placer_navire",
                "taille_navire": 5,
                "coordonnees": [0, 0],
                "orientation": "VD",
                "nom_navire": "Porte-avions",
            })
        );

        let json = ClientMessage::Disconnect.to_json().expect("serialize");
        assert_eq!(json, r#"{"action":"deconnexion"}"#);
        assert_eq!(ClientMessage::RequestReplay.action(), "rejouer");
    }

    #[test]
    fn test_parse_attack_result() {
        let frame = parse_server_message(
            r#"{"action":"resultat_attaque","resultat":"coule","coordonnees":[0,2],
                "type_joueur":"defenseur","peut_rejouer":true,"nom_navire":"Contre-torpilleur",
                "positions_coule":[[0,0],[0,1],[0,2]]}"#,
        )
        .expect("valid frame");
        match frame.message {
            ServerMessage::AttackResult {
                resultat,
                coordonnees,
                type_joueur,
                positions_coule,
                ..
            } => {
                assert_eq!(resultat, AttackOutcome::Sunk);
                assert_eq!(coordonnees, coord(0, 2));
                assert_eq!(type_joueur, AttackRole::Defender);
                assert_eq!(positions_coule.len(), 3);
            }
            other => panic!("Expected AttackResult, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_outcome_and_action_are_tolerated() {
        let frame = parse_server_message(
            r#"{"action":"resultat_attaque","resultat":"explose","coordonnees":[1,1],"type_joueur":"attaquant"}"#,
        )
        .expect("valid frame");
        assert!(matches!(
            frame.message,
            ServerMessage::AttackResult {
                resultat: AttackOutcome::Unknown,
                ..
            }
        ));

        let frame = parse_server_message(r#"{"action":"chat","message":"gg"}"#).expect("frame");
        assert_eq!(frame.message, ServerMessage::Unknown);
        assert_eq!(frame.action(), "chat");
        assert_eq!(frame.raw_message(), Some("gg"));
    }

    #[test]
    fn test_parse_restart_ignores_extra_fields() {
        let frame = parse_server_message(r#"{"action":"restart","message":"go"}"#).expect("frame");
        assert_eq!(frame.message, ServerMessage::Restart);
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            parse_server_message("not json"),
            Err(ProtocolError::InvalidJson(_))
        ));
        assert_eq!(
            parse_server_message(r#"{"message":"hi"}"#),
            Err(ProtocolError::MissingAction)
        );
        assert!(matches!(
            parse_server_message(r#"{"action":"resultat_attaque","resultat":"touche","coordonnees":[12,0],"type_joueur":"attaquant"}"#),
            Err(ProtocolError::InvalidPayload { action, .. }) if action == "resultat_attaque"
        ));
        assert!(matches!(
            parse_server_message(r#"{"action":"player_joined"}"#),
            Err(ProtocolError::InvalidPayload { .. })
        ));
    }

    #[test]
    fn test_parse_grid_update() {
        let mut rows = vec![vec![serde_json::json!("~"); 10]; 10];
        rows[4][4] = serde_json::json!(["navire_1_Croiseur", "S", "Croiseur"]);
        let text = serde_json::json!({"action": "mise_a_jour_grille", "grille": rows}).to_string();
        let frame = parse_server_message(&text).expect("frame");
        match frame.message {
            ServerMessage::GridUpdate { grille } => {
                assert_eq!(grille.placed_ship_names().len(), 1);
            }
            other => panic!("Expected GridUpdate, got {:?}", other),
        }
    }
}
