//! WebSocket transport for the game server connection
//!
//! - `transport`: session-scoped handle plus the driver task that owns the socket
//! - `connector`: physical socket factory (tokio-tungstenite in production)
//! - `backoff`: reconnection delay math
//! - `message_builder`: shared ClientMessage construction logic

mod backoff;
mod connector;
mod error;
mod message_builder;
mod transport;

pub use backoff::{
    BackoffState, BACKOFF_MULTIPLIER, INITIAL_RETRY_DELAY_MS, MAX_RETRY_ATTEMPTS,
    MAX_RETRY_DELAY_MS,
};
pub use connector::{Connector, PhysicalSocket, TextSink, TextStream, TungsteniteConnector};
pub use error::TransportError;
pub use message_builder::ClientMessageBuilder;
pub use transport::Transport;
