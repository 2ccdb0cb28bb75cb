//! Scene Tools - scene files, project info and resources

use crate::format::{godot_version, str_field};
use crate::tool_registry::{parse_args, Tool, ToolRegistry};
use anyhow::{Context, Result};
use async_trait::async_trait;
use godot_bridge::CommandSender;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::sync::Arc;

pub async fn register_all(registry: &ToolRegistry, editor: &Arc<dyn CommandSender>) -> usize {
    registry.register(Arc::new(CreateSceneTool { editor: editor.clone() })).await;
    registry.register(Arc::new(SaveSceneTool { editor: editor.clone() })).await;
    registry.register(Arc::new(OpenSceneTool { editor: editor.clone() })).await;
    registry.register(Arc::new(GetCurrentSceneTool { editor: editor.clone() })).await;
    registry.register(Arc::new(GetProjectInfoTool { editor: editor.clone() })).await;
    registry.register(Arc::new(CreateResourceTool { editor: editor.clone() })).await;
    6
}

pub struct CreateSceneTool {
    editor: Arc<dyn CommandSender>,
}

#[derive(Deserialize)]
struct CreateSceneArgs {
    path: String,
    #[serde(default = "default_root_type")]
    root_node_type: String,
}

fn default_root_type() -> String {
    "Node".to_string()
}

#[async_trait]
impl Tool for CreateSceneTool {
    fn name(&self) -> &str { "create_scene" }
    fn description(&self) -> &str { "Create a new empty scene with an optional root node type" }
    fn category(&self) -> &str { "scene" }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": {"type": "string", "description": "Path where the scene will be saved (e.g. \"res://scenes/main.tscn\")"},
                "root_node_type": {"type": "string", "description": "Type of root node (default: \"Node\")"}
            },
            "required": ["path"]
        })
    }

    async fn execute(&self, input: Value) -> Result<String> {
        let args: CreateSceneArgs = parse_args(input)?;
        let result = self
            .editor
            .send_command(
                "create_scene",
                json!({"path": &args.path, "root_node_type": &args.root_node_type}),
            )
            .await
            .context("Failed to create scene")?;

        Ok(format!(
            "Created new scene at {} with root node type {}",
            str_field(&result, "scene_path").unwrap_or(&args.path),
            str_field(&result, "root_node_type").unwrap_or(&args.root_node_type)
        ))
    }
}

pub struct SaveSceneTool {
    editor: Arc<dyn CommandSender>,
}

#[derive(Deserialize)]
struct SaveSceneArgs {
    #[serde(default)]
    path: Option<String>,
}

#[async_trait]
impl Tool for SaveSceneTool {
    fn name(&self) -> &str { "save_scene" }
    fn description(&self) -> &str { "Save the current scene to disk" }
    fn category(&self) -> &str { "scene" }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": {"type": "string", "description": "Path to save to (optional, defaults to the scene's current path)"}
            }
        })
    }

    async fn execute(&self, input: Value) -> Result<String> {
        let args: SaveSceneArgs = parse_args(input)?;
        let params = match &args.path {
            Some(path) => json!({"path": path}),
            None => json!({}),
        };
        let result = self
            .editor
            .send_command("save_scene", params)
            .await
            .context("Failed to save scene")?;

        let path = str_field(&result, "scene_path")
            .or(args.path.as_deref())
            .unwrap_or("(current path)");
        Ok(format!("Saved scene to {}", path))
    }
}

pub struct OpenSceneTool {
    editor: Arc<dyn CommandSender>,
}

#[derive(Deserialize)]
struct OpenSceneArgs {
    path: String,
}

#[async_trait]
impl Tool for OpenSceneTool {
    fn name(&self) -> &str { "open_scene" }
    fn description(&self) -> &str { "Open a scene in the editor" }
    fn category(&self) -> &str { "scene" }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": {"type": "string", "description": "Path to the scene file to open"}
            },
            "required": ["path"]
        })
    }

    async fn execute(&self, input: Value) -> Result<String> {
        let args: OpenSceneArgs = parse_args(input)?;
        let result = self
            .editor
            .send_command("open_scene", json!({"path": &args.path}))
            .await
            .context("Failed to open scene")?;

        Ok(format!(
            "Opened scene at {}",
            str_field(&result, "scene_path").unwrap_or(&args.path)
        ))
    }
}

pub struct GetCurrentSceneTool {
    editor: Arc<dyn CommandSender>,
}

#[async_trait]
impl Tool for GetCurrentSceneTool {
    fn name(&self) -> &str { "get_current_scene" }
    fn description(&self) -> &str { "Get information about the scene open in the editor" }
    fn category(&self) -> &str { "scene" }

    fn input_schema(&self) -> Value {
        json!({"type": "object", "properties": {}})
    }

    async fn execute(&self, _input: Value) -> Result<String> {
        let result = self
            .editor
            .send_command("get_current_scene", json!({}))
            .await
            .context("Failed to get current scene")?;

        let Some(scene_path) = str_field(&result, "scene_path").filter(|p| !p.is_empty()) else {
            return Ok("No scene is currently open".to_string());
        };
        Ok(format!(
            "Current scene: {}\nRoot node: {} ({})",
            scene_path,
            str_field(&result, "root_node_name").unwrap_or("?"),
            str_field(&result, "root_node_type").unwrap_or("Node")
        ))
    }
}

pub struct GetProjectInfoTool {
    editor: Arc<dyn CommandSender>,
}

#[async_trait]
impl Tool for GetProjectInfoTool {
    fn name(&self) -> &str { "get_project_info" }
    fn description(&self) -> &str { "Get information about the open Godot project" }
    fn category(&self) -> &str { "scene" }

    fn input_schema(&self) -> Value {
        json!({"type": "object", "properties": {}})
    }

    async fn execute(&self, _input: Value) -> Result<String> {
        let result = self
            .editor
            .send_command("get_project_info", json!({}))
            .await
            .context("Failed to get project info")?;

        let version = result.get("godot_version").unwrap_or(&Value::Null);
        Ok(format!(
            "Project Name: {}\nProject Version: {}\nProject Path: {}\nGodot Version: {}\nCurrent Scene: {}",
            str_field(&result, "project_name").unwrap_or("(unnamed)"),
            str_field(&result, "project_version").unwrap_or("(unversioned)"),
            str_field(&result, "project_path").unwrap_or("(unknown)"),
            godot_version(version),
            str_field(&result, "current_scene").filter(|s| !s.is_empty()).unwrap_or("None")
        ))
    }
}

pub struct CreateResourceTool {
    editor: Arc<dyn CommandSender>,
}

#[derive(Deserialize)]
struct CreateResourceArgs {
    resource_type: String,
    resource_path: String,
    #[serde(default)]
    properties: Map<String, Value>,
}

#[async_trait]
impl Tool for CreateResourceTool {
    fn name(&self) -> &str { "create_resource" }
    fn description(&self) -> &str { "Create a new resource (material, theme, etc.) in the project" }
    fn category(&self) -> &str { "scene" }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "resource_type": {"type": "string", "description": "Type of resource (e.g. \"StandardMaterial3D\", \"Theme\")"},
                "resource_path": {"type": "string", "description": "Path where the resource will be saved (e.g. \"res://materials/floor.tres\")"},
                "properties": {"type": "object", "description": "Properties to set on the resource (optional)"}
            },
            "required": ["resource_type", "resource_path"]
        })
    }

    async fn execute(&self, input: Value) -> Result<String> {
        let args: CreateResourceArgs = parse_args(input)?;
        let result = self
            .editor
            .send_command(
                "create_resource",
                json!({
                    "resource_type": &args.resource_type,
                    "resource_path": &args.resource_path,
                    "properties": &args.properties,
                }),
            )
            .await
            .context("Failed to create resource")?;

        Ok(format!(
            "Created {} resource at {}",
            args.resource_type,
            str_field(&result, "resource_path").unwrap_or(&args.resource_path)
        ))
    }
}
