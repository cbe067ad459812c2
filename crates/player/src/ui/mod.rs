//! Terminal front-end: command parsing and screen rendering.

pub mod command;
pub mod render;

pub use command::{Command, CommandError, HELP};
pub use render::{render, render_with_preview};
