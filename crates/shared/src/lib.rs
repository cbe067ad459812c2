//! Broadside Protocol - Shared types for server and player communication
//!
//! This crate contains the JSON wire format spoken over the game websocket:
//! - Outbound intents (`ClientMessage`)
//! - Inbound server events (`ServerMessage`) and frame parsing
//! - Wire encoding of board cells
//!
//! # Design Principles
//!
//! 1. **Minimal dependencies** - Only serde, serde_json, thiserror, and the domain crate
//! 2. **No business logic** - Pure data types and serialization
//! 3. **Forward compatible** - Unknown actions decode to `ServerMessage::Unknown`

pub mod error;
pub mod messages;
pub mod wire;

pub use error::ProtocolError;
pub use messages::{
    parse_server_message, AttackOutcome, AttackRole, ClientMessage, ServerFrame, ServerMessage,
};
pub use wire::WireCell;
