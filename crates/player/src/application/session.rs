//! Session state machine
//!
//! The server is authoritative: every phase change comes from an inbound event.
//! Player intents are validated against the current phase and either forwarded
//! to the connection or rejected locally with an [`IntentError`].
//!
//! Handlers that touch a board work on a copy and commit at the end, so a
//! rejected event never leaves a half-applied grid behind.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use broadside_domain::{
    initial_of, Cell, Coord, Grid, Orientation, ShipCellState, ShipSpec, SHIP_CATALOG,
};
use broadside_shared::{AttackOutcome, AttackRole, ServerFrame, ServerMessage};
use serde_json::Value;

use super::error::IntentError;
use super::event_log::{EventLog, LogEvent, LogEventKind, Origin};
use crate::config::ClientConfig;
use crate::infrastructure::websocket::ClientMessageBuilder;
use crate::ports::outbound::{
    ClockPort, ConnectOptions, ConnectionState, GameConnectionPort, TransportEvent,
};

/// Fragment of the server's `attente_rejouer` text addressed to the requester,
/// used when the payload carries no `waiting_player`.
const REQUESTER_WAIT_HINT: &str = "accepte le redémarrage";

/// Top-level session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Phase {
    #[default]
    Lobby,
    Waiting,
    Menu,
    Placement,
    Battle,
    Finished,
    WaitReplay,
    ConfirmReplay,
}

/// Coarse progress indicator shown above the boards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ProgressStep {
    Menu,
    Placement,
    Battle,
    Finish,
}

impl Phase {
    pub fn progress_step(self) -> ProgressStep {
        match self {
            Phase::Lobby | Phase::Waiting | Phase::Menu => ProgressStep::Menu,
            Phase::Placement => ProgressStep::Placement,
            Phase::Battle => ProgressStep::Battle,
            Phase::Finished | Phase::WaitReplay | Phase::ConfirmReplay => ProgressStep::Finish,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Lobby => "lobby",
            Phase::Waiting => "waiting",
            Phase::Menu => "menu",
            Phase::Placement => "placement",
            Phase::Battle => "battle",
            Phase::Finished => "finished",
            Phase::WaitReplay => "wait-replay",
            Phase::ConfirmReplay => "confirm-replay",
        };
        f.write_str(name)
    }
}

/// What a `Waiting` phase is waiting for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WaitingKind {
    /// For a second player to join the room
    #[default]
    Searching,
    /// For the opponent to press ready
    ReadyConfirmation,
    /// For the opponent to finish placing ships
    Placement,
}

/// Outcome of a finished game.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EndInfo {
    pub victory: Option<bool>,
    /// The `fin_partie` payload as received
    pub raw: Option<Value>,
}

/// Rematch negotiation flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplayState {
    /// We asked (or accepted) and wait for the other side
    pub waiting_for_opponent: bool,
    /// The opponent asked; we may accept
    pub can_confirm: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ResetScope {
    /// Boards, selection, flags
    Game,
    /// Same plus player identity
    Identity,
}

/// Aggregate root of the client.
pub struct Session {
    connection: Arc<dyn GameConnectionPort>,
    clock: Arc<dyn ClockPort>,
    config: ClientConfig,

    phase: Phase,
    waiting_kind: WaitingKind,
    connection_state: ConnectionState,
    room_id: Option<String>,
    player_id: Option<String>,
    player_index: Option<u8>,
    own_grid: Grid,
    opponent_grid: Grid,
    is_my_turn: bool,
    selected_ship: Option<ShipSpec>,
    orientation: Orientation,
    placed_ship_names: BTreeSet<String>,
    end_info: EndInfo,
    replay: ReplayState,
    status_text: String,
    event_log: EventLog,
}

impl Session {
    pub fn new(
        config: ClientConfig,
        connection: Arc<dyn GameConnectionPort>,
        clock: Arc<dyn ClockPort>,
    ) -> Self {
        Self {
            connection,
            clock,
            config,
            phase: Phase::Lobby,
            waiting_kind: WaitingKind::default(),
            connection_state: ConnectionState::Disconnected,
            room_id: None,
            player_id: None,
            player_index: None,
            own_grid: Grid::new(),
            opponent_grid: Grid::new(),
            is_my_turn: false,
            selected_ship: None,
            orientation: Orientation::default(),
            placed_ship_names: BTreeSet::new(),
            end_info: EndInfo::default(),
            replay: ReplayState::default(),
            status_text: String::new(),
            event_log: EventLog::new(),
        }
    }

    // =========================================================================
    // Snapshot accessors
    // =========================================================================

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn progress_step(&self) -> ProgressStep {
        self.phase.progress_step()
    }

    pub fn waiting_kind(&self) -> WaitingKind {
        self.waiting_kind
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.connection_state
    }

    pub fn room_id(&self) -> Option<&str> {
        self.room_id.as_deref()
    }

    pub fn player_id(&self) -> Option<&str> {
        self.player_id.as_deref()
    }

    pub fn player_index(&self) -> Option<u8> {
        self.player_index
    }

    pub fn own_grid(&self) -> &Grid {
        &self.own_grid
    }

    pub fn opponent_grid(&self) -> &Grid {
        &self.opponent_grid
    }

    pub fn is_my_turn(&self) -> bool {
        self.is_my_turn
    }

    pub fn selected_ship(&self) -> Option<ShipSpec> {
        self.selected_ship
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn placed_ship_names(&self) -> &BTreeSet<String> {
        &self.placed_ship_names
    }

    pub fn end_info(&self) -> &EndInfo {
        &self.end_info
    }

    pub fn replay(&self) -> ReplayState {
        self.replay
    }

    pub fn status_text(&self) -> &str {
        &self.status_text
    }

    pub fn event_log(&self) -> &EventLog {
        &self.event_log
    }

    /// Cells the selected ship would cover if placed at `origin`.
    pub fn placement_preview(&self, origin: Coord) -> Vec<Coord> {
        match self.selected_ship {
            Some(ship) if self.phase == Phase::Placement => {
                self.orientation.footprint(origin, ship.length)
            }
            _ => Vec::new(),
        }
    }

    pub fn all_ships_placed(&self) -> bool {
        SHIP_CATALOG
            .iter()
            .all(|ship| self.placed_ship_names.contains(ship.name))
    }

    // =========================================================================
    // Transport events
    // =========================================================================

    pub fn handle_transport_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::Opened => {
                // The server sees every new socket as a new player
                if self.phase != Phase::Lobby || self.player_id.is_some() {
                    tracing::info!("Reconnected, previous game state discarded");
                    self.reset(ResetScope::Identity);
                    self.event_log.clear();
                }
                self.connection_state = ConnectionState::Connected;
                self.connection.send(ClientMessageBuilder::join());
                self.phase = Phase::Waiting;
                self.waiting_kind = WaitingKind::Searching;
                self.set_status("Searching for an opponent...");
            }
            TransportEvent::Message(frame) => self.handle_server_frame(frame),
            TransportEvent::Closed { will_retry } => {
                if will_retry {
                    self.connection_state = ConnectionState::Reconnecting;
                    self.set_status("Connection lost, reconnecting...");
                } else {
                    self.connection_state = ConnectionState::Disconnected;
                }
            }
            TransportEvent::Error(reason) => {
                tracing::warn!("Transport error: {}", reason);
                self.set_status("Connection error");
            }
            TransportEvent::GaveUp { attempts } => {
                tracing::warn!("Connection abandoned after {} retries", attempts);
                self.enter_lobby(false);
                self.event_log.clear();
                self.connection_state = ConnectionState::Failed;
                self.set_status("Disconnected from the server. Join again to retry.");
            }
        }
    }

    // =========================================================================
    // Server events
    // =========================================================================

    pub fn handle_server_frame(&mut self, frame: ServerFrame) {
        let action = frame.action().to_string();
        let raw_message = frame.raw_message().map(str::to_string);
        tracing::debug!(action = %action, phase = %self.phase, "Server event");

        match frame.message {
            ServerMessage::PlayerJoined {
                player_id,
                player_index,
            } => {
                self.player_id = Some(player_id);
                self.player_index = Some(player_index);
                self.phase = Phase::Waiting;
                self.waiting_kind = WaitingKind::Searching;
                self.set_status("");
            }
            ServerMessage::Ready { .. } => {
                self.phase = Phase::Menu;
                self.set_status("");
            }
            ServerMessage::WaitingForOpponent { message } => {
                self.phase = Phase::Waiting;
                self.waiting_kind = WaitingKind::ReadyConfirmation;
                self.set_status(message.unwrap_or_default());
            }
            ServerMessage::PlacementStarted { .. } => {
                self.phase = Phase::Placement;
                self.placed_ship_names.clear();
                self.selected_ship = None;
                self.orientation = Orientation::default();
                self.set_status("Place your ships!");
            }
            ServerMessage::GridUpdate { grille } => {
                self.placed_ship_names = grille.placed_ship_names();
                self.own_grid = grille;
                self.selected_ship = None;
                self.set_status("Fleet updated.");
            }
            ServerMessage::PlacementRejected { message } => {
                self.set_status(message.unwrap_or_else(|| "Invalid placement.".to_string()));
            }
            ServerMessage::PlacementConfirmed { .. } => {
                self.phase = Phase::Waiting;
                self.waiting_kind = WaitingKind::Placement;
                self.set_status("Waiting for the opponent to finish placing ships...");
            }
            ServerMessage::AllShipsReady { .. } => {
                self.phase = Phase::Battle;
                self.set_status("The battle begins!");
            }
            ServerMessage::TurnStarted {
                tour_joueur,
                player_index,
                ..
            }
            | ServerMessage::TurnChanged {
                tour_joueur,
                player_index,
                ..
            } => {
                let me = player_index.or(self.player_index);
                self.is_my_turn = me == Some(tour_joueur);
                self.set_status(if self.is_my_turn {
                    "Your turn!"
                } else {
                    "Opponent's turn..."
                });
            }
            ServerMessage::AttackResult {
                resultat,
                coordonnees,
                type_joueur,
                nom_navire,
                positions_coule,
                ..
            } => self.apply_attack_result(
                resultat,
                coordonnees,
                type_joueur,
                nom_navire.as_deref(),
                &positions_coule,
            ),
            ServerMessage::GameOver { victoire, .. } => {
                self.phase = Phase::Finished;
                self.end_info = EndInfo {
                    victory: Some(victoire),
                    raw: Some(frame.raw),
                };
                self.replay = ReplayState::default();
                if victoire {
                    self.set_status("Victory!");
                    self.log(LogEvent::new(LogEventKind::Victory, Origin::Player, "Victory!"));
                } else {
                    self.set_status("Defeat.");
                    self.log(LogEvent::new(LogEventKind::Defeat, Origin::Opponent, "Defeat!"));
                }
            }
            ServerMessage::ReplayPending {
                message,
                waiting_player,
            } => {
                let we_asked = match (&waiting_player, &self.player_id) {
                    (Some(requester), Some(me)) => requester == me,
                    _ => message
                        .as_deref()
                        .is_some_and(|text| text.contains(REQUESTER_WAIT_HINT)),
                };
                if we_asked {
                    self.phase = Phase::WaitReplay;
                    self.replay = ReplayState {
                        waiting_for_opponent: true,
                        can_confirm: false,
                    };
                    self.set_status(message.unwrap_or_else(|| "Waiting for a rematch...".into()));
                } else {
                    self.phase = Phase::ConfirmReplay;
                    self.replay = ReplayState {
                        waiting_for_opponent: false,
                        can_confirm: true,
                    };
                    self.set_status(message.unwrap_or_else(|| {
                        "The opponent wants a rematch. Play again?".into()
                    }));
                }
            }
            ServerMessage::Restart => {
                self.reset(ResetScope::Game);
                self.event_log.clear();
                self.phase = Phase::Menu;
                self.log(LogEvent::new(LogEventKind::NewGame, Origin::Player, "New game!"));
            }
            ServerMessage::OpponentDisconnected { .. } => {
                self.enter_lobby(true);
                self.event_log.clear();
                self.set_status("The opponent disconnected. Join again for a new game.");
                self.log(LogEvent::generic("The opponent disconnected."));
            }
            ServerMessage::Error { message } => {
                let text = message.unwrap_or_else(|| "Unknown error".to_string());
                self.set_status(text.clone());
                self.log(LogEvent::generic(text));
            }
            ServerMessage::Unknown => {
                tracing::debug!("Unrecognized server action '{}'", action);
                let text = raw_message.unwrap_or_else(|| "Unknown message from server.".into());
                self.set_status(text.clone());
                self.log(LogEvent::generic(text));
            }
        }
    }

    fn apply_attack_result(
        &mut self,
        outcome: AttackOutcome,
        target: Coord,
        role: AttackRole,
        ship_name: Option<&str>,
        sunk_positions: &[Coord],
    ) {
        // The final sink arrives as `gagne`, identified only by its position list.
        let sunk = outcome == AttackOutcome::Sunk
            || (!matches!(outcome, AttackOutcome::Miss | AttackOutcome::Hit)
                && !sunk_positions.is_empty());

        let kind = match outcome {
            AttackOutcome::Miss => LogEventKind::Miss,
            AttackOutcome::Hit => LogEventKind::Hit,
            _ if sunk => LogEventKind::Sunk,
            _ => match role {
                AttackRole::Attacker => LogEventKind::AttackByMe,
                AttackRole::Defender => LogEventKind::AttackByOpponent,
            },
        };

        match role {
            AttackRole::Attacker => {
                let mut grid = self.opponent_grid.clone();
                match kind {
                    LogEventKind::Miss => {
                        grid.mark(target, Cell::Miss);
                    }
                    LogEventKind::Hit => {
                        grid.mark(target, Cell::Hit);
                    }
                    LogEventKind::Sunk => {
                        let initial = initial_of(ship_name.unwrap_or_default());
                        for &pos in sunk_positions {
                            grid.mark(pos, Cell::SunkMarker { initial });
                        }
                    }
                    _ => {}
                }
                self.opponent_grid = grid;
            }
            AttackRole::Defender => {
                let mut grid = self.own_grid.clone();
                match kind {
                    LogEventKind::Miss => {
                        if !grid.get(target).is_ship() {
                            grid.mark(target, Cell::Miss);
                        }
                    }
                    LogEventKind::Hit => match grid.get(target).with_ship_state(ShipCellState::Hit) {
                        Some(hit) => {
                            grid.mark(target, hit);
                        }
                        None => tracing::debug!("Hit reported on {} but no ship there", target),
                    },
                    LogEventKind::Sunk => sink_own_ship(&mut grid, sunk_positions),
                    _ => {}
                }
                self.own_grid = grid;
            }
        }

        let origin = match role {
            AttackRole::Attacker => Origin::Player,
            AttackRole::Defender => Origin::Opponent,
        };
        self.log(LogEvent::at(kind, origin, target));
    }

    // =========================================================================
    // Intents
    // =========================================================================

    /// Open the connection to `room` (or the configured default room).
    pub fn join(&mut self, room: Option<&str>) -> Result<(), IntentError> {
        self.require_phase(&[Phase::Lobby])?;
        if matches!(
            self.connection.state(),
            ConnectionState::Connecting | ConnectionState::Connected
        ) {
            return Err(IntentError::AlreadyConnected);
        }

        let room = room
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .unwrap_or(self.config.default_room.as_str())
            .to_string();
        let endpoint = self.config.endpoint_for(&room);
        tracing::info!(room = %room, endpoint = %endpoint, "Joining room");

        self.connection.connect(
            &endpoint,
            ConnectOptions {
                auto_reconnect: self.config.auto_reconnect,
            },
        );
        self.set_status(format!("Connecting to room {}...", room));
        self.room_id = Some(room);
        self.connection_state = ConnectionState::Connecting;
        Ok(())
    }

    pub fn set_ready(&mut self) -> Result<(), IntentError> {
        self.require_phase(&[Phase::Menu])?;
        self.connection.send(ClientMessageBuilder::set_ready());
        Ok(())
    }

    /// Select a catalog ship by name for the next placement.
    pub fn select_ship(&mut self, name: &str) -> Result<(), IntentError> {
        self.require_phase(&[Phase::Placement])?;
        let ship = ShipSpec::by_name(name)?;
        if self.placed_ship_names.contains(ship.name) {
            self.set_status(format!("{} is already placed.", ship.name));
            return Err(IntentError::ShipAlreadyPlaced(ship.name.to_string()));
        }
        self.selected_ship = Some(ship);
        Ok(())
    }

    pub fn rotate(&mut self) -> Result<Orientation, IntentError> {
        self.require_phase(&[Phase::Placement])?;
        self.orientation = self.orientation.rotated();
        Ok(self.orientation)
    }

    pub fn place_ship(&mut self, origin: Coord) -> Result<(), IntentError> {
        self.require_phase(&[Phase::Placement])?;
        let Some(ship) = self.selected_ship else {
            self.set_status("Select a ship to place!");
            return Err(IntentError::NoShipSelected);
        };
        if self.placed_ship_names.contains(ship.name) {
            self.set_status("Select a ship to place!");
            return Err(IntentError::ShipAlreadyPlaced(ship.name.to_string()));
        }
        self.connection.send(ClientMessageBuilder::place_ship(
            ship,
            origin,
            self.orientation,
        ));
        Ok(())
    }

    pub fn confirm_placement(&mut self) -> Result<(), IntentError> {
        self.require_phase(&[Phase::Placement])?;
        if !self.all_ships_placed() {
            return Err(IntentError::PlacementIncomplete {
                placed: self.placed_ship_names.len(),
                total: SHIP_CATALOG.len(),
            });
        }
        self.connection.send(ClientMessageBuilder::confirm_placement());
        Ok(())
    }

    pub fn reset_placement(&mut self) -> Result<(), IntentError> {
        self.require_phase(&[Phase::Placement])?;
        self.connection.send(ClientMessageBuilder::reset_placement());
        Ok(())
    }

    pub fn request_auto_placement(&mut self) -> Result<(), IntentError> {
        self.require_phase(&[Phase::Placement])?;
        self.connection
            .send(ClientMessageBuilder::request_auto_placement());
        Ok(())
    }

    pub fn attack(&mut self, target: Coord) -> Result<(), IntentError> {
        self.require_phase(&[Phase::Battle])?;
        if !self.is_my_turn {
            return Err(IntentError::NotYourTurn);
        }
        if !self.opponent_grid.get(target).is_empty() {
            return Err(IntentError::AlreadyAttacked(target));
        }
        self.connection.send(ClientMessageBuilder::attack(target));
        Ok(())
    }

    /// Ask for a rematch after a game, or accept the opponent's request.
    pub fn request_replay(&mut self) -> Result<(), IntentError> {
        match self.phase {
            Phase::Finished if self.replay.waiting_for_opponent => {
                return Err(IntentError::ReplayAlreadyRequested)
            }
            Phase::Finished => self.set_status("Rematch request sent!"),
            Phase::ConfirmReplay => self.set_status("You accepted the rematch!"),
            other => return Err(IntentError::wrong_phase(other)),
        }
        self.replay = ReplayState {
            waiting_for_opponent: true,
            can_confirm: false,
        };
        self.connection.send(ClientMessageBuilder::request_replay());
        Ok(())
    }

    /// Leave the game: the connection says goodbye and the session returns to the lobby.
    pub fn quit(&mut self) -> Result<(), IntentError> {
        if self.phase == Phase::Lobby {
            return Err(IntentError::wrong_phase(self.phase));
        }
        self.enter_lobby(true);
        self.event_log.clear();
        self.connection_state = ConnectionState::Disconnected;
        self.set_status("You left the game. Ready to join another?");
        Ok(())
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn require_phase(&self, allowed: &[Phase]) -> Result<(), IntentError> {
        if allowed.contains(&self.phase) {
            Ok(())
        } else {
            Err(IntentError::wrong_phase(self.phase))
        }
    }

    fn set_status(&mut self, text: impl Into<String>) {
        self.status_text = text.into();
    }

    fn log(&mut self, event: LogEvent) {
        let now = self.clock.now();
        self.event_log.record(event, now);
    }

    fn reset(&mut self, scope: ResetScope) {
        self.own_grid = Grid::new();
        self.opponent_grid = Grid::new();
        self.placed_ship_names.clear();
        self.selected_ship = None;
        self.end_info = EndInfo::default();
        self.is_my_turn = false;
        self.replay = ReplayState::default();
        self.orientation = Orientation::default();
        self.status_text.clear();
        if scope == ResetScope::Identity {
            self.player_id = None;
            self.player_index = None;
        }
    }

    fn enter_lobby(&mut self, close_connection: bool) {
        self.reset(ResetScope::Identity);
        self.phase = Phase::Lobby;
        self.waiting_kind = WaitingKind::default();
        if close_connection {
            self.connection.close();
            self.connection_state = ConnectionState::Disconnected;
        }
    }
}

/// Flip every cell of the ship found at the first sunk position to `Sunk`.
///
/// When that cell carries no ship identity, flips the ship cells at each listed
/// position instead.
fn sink_own_ship(grid: &mut Grid, sunk_positions: &[Coord]) {
    let Some(&first) = sunk_positions.first() else {
        return;
    };
    let cells = match grid.get(first).ship_id() {
        Some(ship_id) => grid.ship_cells(ship_id),
        None => {
            tracing::debug!("No ship at {}, sinking listed positions", first);
            sunk_positions.to_vec()
        }
    };
    for coord in cells {
        if let Some(sunk) = grid.get(coord).with_ship_state(ShipCellState::Sunk) {
            grid.mark(coord, sunk);
        }
    }
}
