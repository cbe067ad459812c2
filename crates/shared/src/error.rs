//! Protocol error type

use thiserror::Error;

/// Failure to decode an inbound frame or encode an outbound one.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// The frame is not JSON at all
    #[error("Invalid JSON: {0}")]
    InvalidJson(String),

    /// The frame is JSON but carries no string `action` field
    #[error("Frame has no action field")]
    MissingAction,

    /// The action is known but its payload does not match
    #[error("Invalid payload for action '{action}': {reason}")]
    InvalidPayload { action: String, reason: String },

    /// Outbound message could not be serialized
    #[error("Serialization failed: {0}")]
    Serialize(String),
}

impl ProtocolError {
    pub fn invalid_payload(action: impl Into<String>, reason: impl ToString) -> Self {
        Self::InvalidPayload {
            action: action.into(),
            reason: reason.to_string(),
        }
    }
}
