//! Script Tools - GDScript authoring and inspection

use crate::format::{str_field, string_list};
use crate::tool_registry::{parse_args, Tool, ToolRegistry};
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use godot_bridge::CommandSender;
use serde::Deserialize;
use serde_json::{json, Value};
use std::fmt::Write;
use std::sync::Arc;

pub async fn register_all(registry: &ToolRegistry, editor: &Arc<dyn CommandSender>) -> usize {
    registry.register(Arc::new(CreateScriptTool { editor: editor.clone() })).await;
    registry.register(Arc::new(EditScriptTool { editor: editor.clone() })).await;
    registry.register(Arc::new(GetScriptTool { editor: editor.clone() })).await;
    registry.register(Arc::new(CreateScriptTemplateTool)).await;
    registry.register(Arc::new(GetScriptMetadataTool { editor: editor.clone() })).await;
    5
}

pub struct CreateScriptTool {
    editor: Arc<dyn CommandSender>,
}

#[derive(Deserialize)]
struct CreateScriptArgs {
    script_path: String,
    content: String,
    #[serde(default)]
    node_path: Option<String>,
}

#[async_trait]
impl Tool for CreateScriptTool {
    fn name(&self) -> &str { "create_script" }
    fn description(&self) -> &str { "Create a new GDScript file, optionally attaching it to a node" }
    fn category(&self) -> &str { "script" }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "script_path": {"type": "string", "description": "Path where the script will be saved (e.g. \"res://scripts/player.gd\")"},
                "content": {"type": "string", "description": "Content of the script"},
                "node_path": {"type": "string", "description": "Path to a node to attach the script to (optional)"}
            },
            "required": ["script_path", "content"]
        })
    }

    async fn execute(&self, input: Value) -> Result<String> {
        let args: CreateScriptArgs = parse_args(input)?;
        let result = self
            .editor
            .send_command(
                "create_script",
                json!({
                    "script_path": &args.script_path,
                    "content": &args.content,
                    "node_path": &args.node_path,
                }),
            )
            .await
            .context("Failed to create script")?;

        let path = str_field(&result, "script_path").unwrap_or(&args.script_path);
        let mut out = format!("Created script at {}", path);
        if let Some(node_path) = &args.node_path {
            let _ = write!(out, " and attached to node at {}", node_path);
        }
        Ok(out)
    }
}

pub struct EditScriptTool {
    editor: Arc<dyn CommandSender>,
}

#[derive(Deserialize)]
struct EditScriptArgs {
    script_path: String,
    content: String,
}

#[async_trait]
impl Tool for EditScriptTool {
    fn name(&self) -> &str { "edit_script" }
    fn description(&self) -> &str { "Replace the content of an existing GDScript file" }
    fn category(&self) -> &str { "script" }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "script_path": {"type": "string", "description": "Path to the script file to edit"},
                "content": {"type": "string", "description": "New content of the script"}
            },
            "required": ["script_path", "content"]
        })
    }

    async fn execute(&self, input: Value) -> Result<String> {
        let args: EditScriptArgs = parse_args(input)?;
        self.editor
            .send_command(
                "edit_script",
                json!({"script_path": &args.script_path, "content": &args.content}),
            )
            .await
            .context("Failed to edit script")?;
        Ok(format!("Updated script at {}", args.script_path))
    }
}

pub struct GetScriptTool {
    editor: Arc<dyn CommandSender>,
}

#[derive(Deserialize)]
struct GetScriptArgs {
    #[serde(default)]
    script_path: Option<String>,
    #[serde(default)]
    node_path: Option<String>,
}

#[async_trait]
impl Tool for GetScriptTool {
    fn name(&self) -> &str { "get_script" }
    fn description(&self) -> &str { "Get the content of a GDScript file by path or from the node it is attached to" }
    fn category(&self) -> &str { "script" }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "script_path": {"type": "string", "description": "Path to the script file"},
                "node_path": {"type": "string", "description": "Path to a node with a script attached"}
            }
        })
    }

    async fn execute(&self, input: Value) -> Result<String> {
        let args: GetScriptArgs = parse_args(input)?;
        if args.script_path.is_none() && args.node_path.is_none() {
            bail!("Either script_path or node_path must be provided");
        }

        let result = self
            .editor
            .send_command(
                "get_script",
                json!({"script_path": &args.script_path, "node_path": &args.node_path}),
            )
            .await
            .context("Failed to get script")?;

        let path = str_field(&result, "script_path")
            .or(args.script_path.as_deref())
            .unwrap_or("(unknown)");
        let content = str_field(&result, "content").unwrap_or("");
        Ok(format!("Script at {}:\n\n```gdscript\n{}\n```", path, content))
    }
}

/// Generates GDScript boilerplate without touching the editor
pub struct CreateScriptTemplateTool;

#[derive(Debug, Deserialize)]
struct ScriptTemplate {
    #[serde(default)]
    class_name: Option<String>,
    #[serde(default = "default_extends")]
    extends_type: String,
    #[serde(default = "default_true")]
    include_ready: bool,
    #[serde(default)]
    include_process: bool,
    #[serde(default)]
    include_input: bool,
    #[serde(default)]
    include_physics: bool,
}

fn default_extends() -> String {
    "Node".to_string()
}

fn default_true() -> bool {
    true
}

impl ScriptTemplate {
    fn render(&self) -> String {
        let mut out = String::new();
        if let Some(class_name) = self.class_name.as_deref().filter(|c| !c.trim().is_empty()) {
            let _ = writeln!(out, "class_name {}", class_name.trim());
        }
        let _ = writeln!(out, "extends {}", self.extends_type);

        let callbacks = [
            (
                self.include_ready,
                "Called when the node enters the scene tree for the first time.",
                "_ready() -> void",
            ),
            (
                self.include_process,
                "Called every frame. 'delta' is the elapsed time since the previous frame.",
                "_process(delta: float) -> void",
            ),
            (
                self.include_physics,
                "Called every physics frame. 'delta' is the fixed physics step.",
                "_physics_process(delta: float) -> void",
            ),
            (
                self.include_input,
                "Called when there is an input event.",
                "_input(event: InputEvent) -> void",
            ),
        ];

        for (_, doc, signature) in callbacks.iter().filter(|(enabled, _, _)| *enabled) {
            let _ = write!(out, "\n\n# {}\nfunc {}:\n\tpass\n", doc, signature);
        }
        out
    }
}

#[async_trait]
impl Tool for CreateScriptTemplateTool {
    fn name(&self) -> &str { "create_script_template" }
    fn description(&self) -> &str { "Generate a GDScript template with common lifecycle callbacks" }
    fn category(&self) -> &str { "script" }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "class_name": {"type": "string", "description": "Optional class_name declaration"},
                "extends_type": {"type": "string", "description": "Base class (default: \"Node\")"},
                "include_ready": {"type": "boolean", "description": "Include _ready() (default: true)"},
                "include_process": {"type": "boolean", "description": "Include _process() (default: false)"},
                "include_input": {"type": "boolean", "description": "Include _input() (default: false)"},
                "include_physics": {"type": "boolean", "description": "Include _physics_process() (default: false)"}
            }
        })
    }

    async fn execute(&self, input: Value) -> Result<String> {
        let template: ScriptTemplate = parse_args(input)?;
        Ok(format!(
            "Generated GDScript template:\n\n```gdscript\n{}```",
            template.render()
        ))
    }
}

pub struct GetScriptMetadataTool {
    editor: Arc<dyn CommandSender>,
}

#[derive(Deserialize)]
struct ScriptMetadataArgs {
    path: String,
}

#[async_trait]
impl Tool for GetScriptMetadataTool {
    fn name(&self) -> &str { "get_script_metadata" }
    fn description(&self) -> &str { "Get class name, base type, methods and signals declared by a script" }
    fn category(&self) -> &str { "script" }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": {"type": "string", "description": "Path to the script (e.g. \"res://scripts/player.gd\")"}
            },
            "required": ["path"]
        })
    }

    async fn execute(&self, input: Value) -> Result<String> {
        let args: ScriptMetadataArgs = parse_args(input)?;
        let result = self
            .editor
            .send_command("get_script_metadata", json!({"path": &args.path}))
            .await
            .context("Failed to get script metadata")?;

        let none = "(none)".to_string();
        let join = |key: &str| {
            let items = string_list(&result, key);
            if items.is_empty() { none.clone() } else { items.join(", ") }
        };

        let mut out = format!("Script metadata for {}:\n", args.path);
        let _ = write!(out, "\nClass name: {}", str_field(&result, "class_name").filter(|s| !s.is_empty()).unwrap_or("(none)"));
        let _ = write!(out, "\nExtends: {}", str_field(&result, "extends").unwrap_or("(unknown)"));
        let _ = write!(out, "\nMethods: {}", join("methods"));
        let _ = write!(out, "\nSignals: {}", join("signals"));
        Ok(out)
    }
}
