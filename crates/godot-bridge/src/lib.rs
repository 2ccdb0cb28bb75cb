//! godot-bridge: command channel to a running Godot editor
//!
//! The editor plugin runs a WebSocket server. This crate keeps one session
//! open to it, tags each command with a `commandId`, and routes replies back
//! to the caller that is waiting on them.
//!
//! ```text
//! caller → send_command → {type, params, commandId} → editor
//! caller ← Result<Value> ← {status, result|message, commandId} ← editor
//! ```

pub mod connection;
pub mod protocol;
pub mod sender;

pub use connection::{ConnectionConfig, GodotConnection};
pub use protocol::{GodotCommand, GodotResponse, ResponseStatus};
pub use sender::CommandSender;

pub use godot_core::{Error, Result};
