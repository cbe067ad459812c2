//! Client configuration loaded from the environment.
//!
//! # Environment Variables
//!
//! - `BROADSIDE_SERVER_URL` - Base websocket URL of the game server (default: `ws://localhost:8000`)
//! - `BROADSIDE_ROOM` - Room joined when none is given (default: `default-room`)
//! - `BROADSIDE_AUTO_RECONNECT` - Reconnect with backoff after drops (default: `true`)
//!
//! `.env` files are honoured through `dotenvy` in `main`.

use thiserror::Error;
use url::Url;

pub const DEFAULT_SERVER_URL: &str = "ws://localhost:8000";
pub const DEFAULT_ROOM: &str = "default-room";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid server URL '{value}': {reason}")]
    InvalidUrl { value: String, reason: String },

    #[error("Server URL must use ws:// or wss://, got '{0}'")]
    UnsupportedScheme(String),

    #[error("Invalid value for {key}: '{value}'")]
    InvalidFlag { key: String, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub server_url: Url,
    pub default_room: String,
    pub auto_reconnect: bool,
}

impl ClientConfig {
    /// Read configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let raw_url = lookup("BROADSIDE_SERVER_URL")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_SERVER_URL.to_string());
        let server_url = parse_server_url(&raw_url)?;

        let default_room = lookup("BROADSIDE_ROOM")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_ROOM.to_string());

        let auto_reconnect = match lookup("BROADSIDE_AUTO_RECONNECT") {
            Some(value) => parse_flag("BROADSIDE_AUTO_RECONNECT", &value)?,
            None => true,
        };

        Ok(Self {
            server_url,
            default_room,
            auto_reconnect,
        })
    }

    /// Websocket endpoint of a room: `{server_url}/ws/game/{room}`.
    pub fn endpoint_for(&self, room: &str) -> String {
        let mut url = self.server_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(["ws", "game", room]);
        }
        url.to_string()
    }
}

fn parse_server_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw).map_err(|e| ConfigError::InvalidUrl {
        value: raw.to_string(),
        reason: e.to_string(),
    })?;
    match url.scheme() {
        "ws" | "wss" => Ok(url),
        other => Err(ConfigError::UnsupportedScheme(other.to_string())),
    }
}

fn parse_flag(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidFlag {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}
