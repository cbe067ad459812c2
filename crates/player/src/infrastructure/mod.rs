pub mod clock;
pub mod websocket;

pub use clock::SystemClock;
pub use websocket::{Transport, TungsteniteConnector};
