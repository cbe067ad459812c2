//! Broadside player crate.
//!
//! Client synchronization layer for a two-player battleship game: a resilient
//! websocket transport, the session state machine the server drives, and a
//! terminal front-end.

pub mod application;
pub mod config;
pub mod infrastructure;
pub mod ports;
pub mod runner;
pub mod ui;
