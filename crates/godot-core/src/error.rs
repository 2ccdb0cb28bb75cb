//! Error types for the Godot MCP bridge

use thiserror::Error;

/// Main error type for editor communication
#[derive(Error, Debug)]
pub enum Error {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("WebSocket not connected")]
    NotConnected,

    #[error("Connection closed")]
    ConnectionClosed,

    /// Payload is the command type that did not get a reply in time
    #[error("Command timed out: {0}")]
    Timeout(String),

    /// Error status reported by the editor plugin
    #[error("{0}")]
    Godot(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a connection error
    pub fn connection(msg: impl Into<String>) -> Self {
        Error::Connection(msg.into())
    }

    /// Create an editor-reported error
    pub fn godot(msg: impl Into<String>) -> Self {
        Error::Godot(msg.into())
    }
}
