//! Command sender seam
//!
//! Tools and resources only need "send a command, get JSON back". They hold
//! an `Arc<dyn CommandSender>` so tests can substitute a scripted editor.

use async_trait::async_trait;
use serde_json::Value;

use crate::connection::GodotConnection;
use crate::Result;

#[async_trait]
pub trait CommandSender: Send + Sync {
    /// Send `command` with `params` and wait for the editor's result
    async fn send_command(&self, command: &str, params: Value) -> Result<Value>;
}

#[async_trait]
impl CommandSender for GodotConnection {
    async fn send_command(&self, command: &str, params: Value) -> Result<Value> {
        GodotConnection::send_command(self, command, params).await
    }
}

