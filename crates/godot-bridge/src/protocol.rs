//! Editor wire protocol
//!
//! Commands and replies are single JSON text frames.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use godot_core::{Error, Result};

/// Command sent to the editor plugin
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GodotCommand {
    #[serde(rename = "type")]
    pub command_type: String,
    pub params: Value,
    #[serde(rename = "commandId")]
    pub command_id: String,
}

impl GodotCommand {
    /// Build a command. `null` params are sent as an empty object.
    pub fn new(command_type: impl Into<String>, params: Value, command_id: impl Into<String>) -> Self {
        let params = if params.is_null() { json!({}) } else { params };
        Self {
            command_type: command_type.into(),
            params,
            command_id: command_id.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Success,
    Error,
}

/// Reply from the editor plugin
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GodotResponse {
    pub status: ResponseStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(rename = "commandId", default, skip_serializing_if = "Option::is_none")]
    pub command_id: Option<String>,
}

impl GodotResponse {
    /// Convert into the caller-facing result
    pub fn into_result(self) -> Result<Value> {
        match self.status {
            ResponseStatus::Success => Ok(self.result.unwrap_or(Value::Null)),
            ResponseStatus::Error => Err(Error::godot(
                self.message.unwrap_or_else(|| "Unknown error".to_string()),
            )),
        }
    }
}
