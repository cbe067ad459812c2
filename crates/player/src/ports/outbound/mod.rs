//! Outbound ports - Interfaces for external services
//!
//! These ports define the contracts that infrastructure adapters must implement,
//! allowing the session to talk to the server and read the time without
//! depending on concrete implementations.

pub mod clock_port;
pub mod game_connection_port;

pub use clock_port::ClockPort;
pub use game_connection_port::{ConnectOptions, ConnectionState, GameConnectionPort, TransportEvent};

#[cfg(test)]
pub use clock_port::MockClockPort;
#[cfg(test)]
pub use game_connection_port::MockGameConnectionPort;
