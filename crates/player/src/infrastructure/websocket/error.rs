//! Transport error type

use thiserror::Error;
use tokio_tungstenite::tungstenite;

/// Failure of a physical socket
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The socket could not be opened
    #[error("Connection failed: {0}")]
    ConnectFailed(String),

    /// The peer went away
    #[error("Socket closed")]
    Closed,

    /// Protocol-level websocket failure
    #[error("WebSocket error: {0}")]
    WebSocket(String),
}

impl From<tungstenite::Error> for TransportError {
    fn from(err: tungstenite::Error) -> Self {
        match err {
            tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed => {
                TransportError::Closed
            }
            other => TransportError::WebSocket(other.to_string()),
        }
    }
}
