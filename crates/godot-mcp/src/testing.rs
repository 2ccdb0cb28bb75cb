//! Scripted editor for unit tests

use async_trait::async_trait;
use godot_bridge::{CommandSender, Error, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Default)]
pub(crate) struct MockEditor {
    replies: HashMap<String, std::result::Result<Value, String>>,
    calls: Mutex<Vec<(String, Value)>>,
}

impl MockEditor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `command` with a success result
    pub fn with(mut self, command: &str, result: Value) -> Self {
        self.replies.insert(command.to_string(), Ok(result));
        self
    }

    /// Answer `command` with an editor error
    pub fn with_error(mut self, command: &str, message: &str) -> Self {
        self.replies.insert(command.to_string(), Err(message.to_string()));
        self
    }

    pub fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn last_params(&self) -> Value {
        self.calls().last().map(|(_, p)| p.clone()).unwrap_or(Value::Null)
    }
}

#[async_trait]
impl CommandSender for MockEditor {
    async fn send_command(&self, command: &str, params: Value) -> Result<Value> {
        self.calls.lock().unwrap().push((command.to_string(), params));
        match self.replies.get(command) {
            Some(Ok(value)) => Ok(value.clone()),
            Some(Err(message)) => Err(Error::godot(message.clone())),
            None => Err(Error::Timeout(command.to_string())),
        }
    }
}

/// Shared handle for assertions plus the trait object tools take
pub(crate) fn editor(mock: MockEditor) -> (std::sync::Arc<MockEditor>, std::sync::Arc<dyn CommandSender>) {
    let mock = std::sync::Arc::new(mock);
    let sender: std::sync::Arc<dyn CommandSender> = mock.clone();
    (mock, sender)
}
