//! Editor Tools - run code inside the editor

use crate::format::string_list;
use crate::tool_registry::{parse_args, Tool, ToolRegistry};
use anyhow::{Context, Result};
use async_trait::async_trait;
use godot_bridge::CommandSender;
use serde::Deserialize;
use serde_json::{json, Value};
use std::fmt::Write;
use std::sync::Arc;

pub async fn register_all(registry: &ToolRegistry, editor: &Arc<dyn CommandSender>) -> usize {
    registry.register(Arc::new(ExecuteEditorScriptTool { editor: editor.clone() })).await;
    1
}

pub struct ExecuteEditorScriptTool {
    editor: Arc<dyn CommandSender>,
}

#[derive(Deserialize)]
struct ExecuteEditorScriptArgs {
    code: String,
}

#[async_trait]
impl Tool for ExecuteEditorScriptTool {
    fn name(&self) -> &str { "execute_editor_script" }
    fn description(&self) -> &str { "Execute arbitrary GDScript code in the Godot editor" }
    fn category(&self) -> &str { "editor" }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "code": {"type": "string", "description": "GDScript code to execute in the editor context"}
            },
            "required": ["code"]
        })
    }

    async fn execute(&self, input: Value) -> Result<String> {
        let args: ExecuteEditorScriptArgs = parse_args(input)?;
        let result = self
            .editor
            .send_command("execute_editor_script", json!({"code": &args.code}))
            .await
            .context("Script execution failed")?;

        let mut out = "Script executed successfully".to_string();

        let output = string_list(&result, "output");
        if !output.is_empty() {
            let _ = write!(out, "\n\nOutput:\n{}", output.join("\n"));
        }

        match result.get("result") {
            None | Some(Value::Null) => {}
            Some(value) => {
                let rendered = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
                let _ = write!(out, "\n\nResult:\n{}", rendered);
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{editor, MockEditor};

    #[tokio::test]
    async fn test_output_and_result() {
        let (mock, sender) = editor(MockEditor::new().with(
            "execute_editor_script",
            json!({"output": ["hello", "world"], "result": 42}),
        ));
        let tool = ExecuteEditorScriptTool { editor: sender };

        let text = tool.execute(json!({"code": "print('hello')"})).await.unwrap();
        assert_eq!(text, "Script executed successfully\n\nOutput:\nhello\nworld\n\nResult:\n42");
        assert_eq!(mock.last_params()["code"], "print('hello')");
    }

    #[tokio::test]
    async fn test_silent_script() {
        let (_, sender) = editor(
            MockEditor::new().with("execute_editor_script", json!({"output": [], "result": null})),
        );
        let tool = ExecuteEditorScriptTool { editor: sender };

        let text = tool.execute(json!({"code": "pass"})).await.unwrap();
        assert_eq!(text, "Script executed successfully");
    }

    #[tokio::test]
    async fn test_compile_error() {
        let (_, sender) = editor(
            MockEditor::new().with_error("execute_editor_script", "Parse error at line 1"),
        );
        let tool = ExecuteEditorScriptTool { editor: sender };

        let err = tool.execute(json!({"code": "func"})).await.unwrap_err();
        assert_eq!(format!("{:#}", err), "Script execution failed: Parse error at line 1");
    }
}
