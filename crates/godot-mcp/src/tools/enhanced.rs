//! Enhanced Tools - whole-scene inspection, debug output and transforms

use crate::format::{scene_tree, str_field};
use crate::tool_registry::{parse_args, Tool, ToolRegistry};
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use godot_bridge::CommandSender;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::sync::Arc;

pub async fn register_all(registry: &ToolRegistry, editor: &Arc<dyn CommandSender>) -> usize {
    registry.register(Arc::new(GetFullSceneTreeTool { editor: editor.clone() })).await;
    registry.register(Arc::new(GetDebugOutputTool { editor: editor.clone() })).await;
    registry.register(Arc::new(UpdateNodeTransformTool { editor: editor.clone() })).await;
    3
}

pub struct GetFullSceneTreeTool {
    editor: Arc<dyn CommandSender>,
}

#[async_trait]
impl Tool for GetFullSceneTreeTool {
    fn name(&self) -> &str { "get_full_scene_tree" }
    fn description(&self) -> &str { "Get the complete node hierarchy of the current scene" }
    fn category(&self) -> &str { "scene" }

    fn input_schema(&self) -> Value {
        json!({"type": "object", "properties": {}})
    }

    async fn execute(&self, _input: Value) -> Result<String> {
        let result = self
            .editor
            .send_command("get_full_scene_tree", json!({}))
            .await
            .context("Failed to get scene tree")?;

        // The plugin wraps the root in `tree` but older versions return it bare
        let root = result.get("tree").unwrap_or(&result);
        if str_field(root, "name").is_none() {
            return Ok("No scene is currently open".to_string());
        }
        Ok(format!("Scene tree:\n\n{}", scene_tree(root)))
    }
}

pub struct GetDebugOutputTool {
    editor: Arc<dyn CommandSender>,
}

#[async_trait]
impl Tool for GetDebugOutputTool {
    fn name(&self) -> &str { "get_debug_output" }
    fn description(&self) -> &str { "Get the editor's debug output log" }
    fn category(&self) -> &str { "editor" }

    fn input_schema(&self) -> Value {
        json!({"type": "object", "properties": {}})
    }

    async fn execute(&self, _input: Value) -> Result<String> {
        let result = self
            .editor
            .send_command("get_debug_output", json!({}))
            .await
            .context("Failed to get debug output")?;

        match str_field(&result, "output").filter(|o| !o.trim().is_empty()) {
            Some(output) => Ok(format!("Debug output:\n{}", output)),
            None => Ok("Debug output is empty".to_string()),
        }
    }
}

pub struct UpdateNodeTransformTool {
    editor: Arc<dyn CommandSender>,
}

#[derive(Deserialize)]
struct UpdateTransformArgs {
    node_path: String,
    #[serde(default)]
    position: Option<Value>,
    #[serde(default)]
    rotation: Option<Value>,
    #[serde(default)]
    scale: Option<Value>,
}

#[async_trait]
impl Tool for UpdateNodeTransformTool {
    fn name(&self) -> &str { "update_node_transform" }
    fn description(&self) -> &str { "Update position, rotation and/or scale of a node" }
    fn category(&self) -> &str { "node" }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "node_path": {"type": "string", "description": "Path to the node"},
                "position": {"type": "array", "items": {"type": "number"}, "description": "New position [x, y] or [x, y, z]"},
                "rotation": {"description": "New rotation (radians, or [x, y, z] for 3D)"},
                "scale": {"type": "array", "items": {"type": "number"}, "description": "New scale [x, y] or [x, y, z]"}
            },
            "required": ["node_path"]
        })
    }

    async fn execute(&self, input: Value) -> Result<String> {
        let args: UpdateTransformArgs = parse_args(input)?;

        let mut params = Map::new();
        params.insert("node_path".into(), json!(&args.node_path));
        for (key, value) in [("position", args.position), ("rotation", args.rotation), ("scale", args.scale)] {
            if let Some(value) = value.filter(|v| !v.is_null()) {
                params.insert(key.into(), value);
            }
        }
        if params.len() == 1 {
            bail!("At least one of position, rotation, or scale must be provided");
        }

        let changed: Vec<&str> = ["position", "rotation", "scale"]
            .into_iter()
            .filter(|k| params.contains_key(*k))
            .collect();

        self.editor
            .send_command("update_node_transform", Value::Object(params))
            .await
            .context("Failed to update transform")?;

        Ok(format!(
            "Updated transform of node at {} ({})",
            args.node_path,
            changed.join(", ")
        ))
    }
}
