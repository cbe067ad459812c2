//! Game Connection Port - Outbound port for the game websocket
//!
//! This port abstracts the logical connection to the game server, allowing the
//! session state machine to send intents and manage the connection lifecycle
//! without depending on the concrete transport.

use broadside_shared::{ClientMessage, ServerFrame};

/// Connection state for the game session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// Not connected to the server
    #[default]
    Disconnected,
    /// Attempting to establish connection
    Connecting,
    /// Successfully connected
    Connected,
    /// Connection lost, a reconnect is scheduled
    Reconnecting,
    /// Connection failed (retries exhausted)
    Failed,
}

impl ConnectionState {
    /// Convert to u8 for atomic storage.
    pub fn to_u8(self) -> u8 {
        match self {
            ConnectionState::Disconnected => 0,
            ConnectionState::Connecting => 1,
            ConnectionState::Connected => 2,
            ConnectionState::Reconnecting => 3,
            ConnectionState::Failed => 4,
        }
    }

    /// Convert from u8 (atomic storage).
    pub fn from_u8(v: u8) -> Self {
        match v {
            1 => ConnectionState::Connecting,
            2 => ConnectionState::Connected,
            3 => ConnectionState::Reconnecting,
            4 => ConnectionState::Failed,
            _ => ConnectionState::Disconnected,
        }
    }

    /// Label for status lines.
    pub fn label(self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Reconnecting => "reconnecting",
            ConnectionState::Failed => "failed",
        }
    }
}

/// Options for a logical connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectOptions {
    /// Reconnect with backoff after involuntary closes
    pub auto_reconnect: bool,
}

impl Default for ConnectOptions {
    fn default() -> Self {
        Self {
            auto_reconnect: true,
        }
    }
}

/// Notifications from the transport, delivered in order on one channel.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    /// A physical socket is open and the outbound queue has been flushed
    Opened,
    /// A decoded server frame
    Message(ServerFrame),
    /// A physical socket went away without `close()` being called
    Closed { will_retry: bool },
    /// Socket or connect failure, always followed by `Closed`
    Error(String),
    /// Terminal: the last involuntary close will not be retried
    GaveUp { attempts: u32 },
}

/// Game Connection Port trait
///
/// Every method is non-blocking: the implementation forwards work to its own task.
/// `send` never fails towards the caller; messages sent while disconnected are
/// queued and flushed on the next successful open.
#[cfg_attr(test, mockall::automock)]
pub trait GameConnectionPort: Send + Sync {
    /// Current connection state
    fn state(&self) -> ConnectionState;

    /// True only while a physical socket is established
    fn is_open(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// Replace any existing connection with a new one to `endpoint`
    fn connect(&self, endpoint: &str, options: ConnectOptions);

    /// Transmit now, or queue until the next open
    fn send(&self, message: ClientMessage);

    /// Cancel reconnects, say goodbye, and tear the socket down
    fn close(&self);
}
