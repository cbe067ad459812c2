//! Application layer: the session state machine and the event log it feeds.

pub mod error;
pub mod event_log;
pub mod session;

pub use error::IntentError;
pub use event_log::{EventLog, LogEntry, LogEvent, LogEventKind, Origin, DISPLAY_LIMIT};
pub use session::{EndInfo, Phase, ProgressStep, ReplayState, Session, WaitingKind};
