//! Node Tools - scene graph manipulation

use crate::format::{json_inline, str_field};
use crate::tool_registry::{parse_args, Tool, ToolRegistry};
use anyhow::{Context, Result};
use async_trait::async_trait;
use godot_bridge::CommandSender;
use serde::Deserialize;
use serde_json::{json, Value};
use std::fmt::Write;
use std::sync::Arc;

pub async fn register_all(registry: &ToolRegistry, editor: &Arc<dyn CommandSender>) -> usize {
    registry.register(Arc::new(CreateNodeTool { editor: editor.clone() })).await;
    registry.register(Arc::new(DeleteNodeTool { editor: editor.clone() })).await;
    registry.register(Arc::new(UpdateNodePropertyTool { editor: editor.clone() })).await;
    registry.register(Arc::new(GetNodePropertiesTool { editor: editor.clone() })).await;
    registry.register(Arc::new(ListNodesTool { editor: editor.clone() })).await;
    5
}

#[derive(Deserialize)]
struct NodePathArgs {
    node_path: String,
}

pub struct CreateNodeTool {
    editor: Arc<dyn CommandSender>,
}

#[derive(Deserialize)]
struct CreateNodeArgs {
    parent_path: String,
    node_type: String,
    node_name: String,
}

#[async_trait]
impl Tool for CreateNodeTool {
    fn name(&self) -> &str { "create_node" }
    fn description(&self) -> &str { "Create a new node in the Godot scene tree" }
    fn category(&self) -> &str { "node" }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "parent_path": {"type": "string", "description": "Path to the parent node (e.g. \"/root\", \"/root/MainScene\")"},
                "node_type": {"type": "string", "description": "Type of node to create (e.g. \"Node2D\", \"Sprite2D\", \"Label\")"},
                "node_name": {"type": "string", "description": "Name for the new node"}
            },
            "required": ["parent_path", "node_type", "node_name"]
        })
    }

    async fn execute(&self, input: Value) -> Result<String> {
        let args: CreateNodeArgs = parse_args(input)?;
        let result = self
            .editor
            .send_command(
                "create_node",
                json!({
                    "parent_path": &args.parent_path,
                    "node_type": &args.node_type,
                    "node_name": &args.node_name,
                }),
            )
            .await
            .context("Failed to create node")?;

        let node_path = str_field(&result, "node_path").unwrap_or(&args.parent_path);
        Ok(format!(
            "Created {} node named \"{}\" at {}",
            args.node_type, args.node_name, node_path
        ))
    }
}

pub struct DeleteNodeTool {
    editor: Arc<dyn CommandSender>,
}

#[async_trait]
impl Tool for DeleteNodeTool {
    fn name(&self) -> &str { "delete_node" }
    fn description(&self) -> &str { "Delete a node from the Godot scene tree" }
    fn category(&self) -> &str { "node" }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "node_path": {"type": "string", "description": "Path to the node to delete (e.g. \"/root/MainScene/Player\")"}
            },
            "required": ["node_path"]
        })
    }

    async fn execute(&self, input: Value) -> Result<String> {
        let args: NodePathArgs = parse_args(input)?;
        self.editor
            .send_command("delete_node", json!({"node_path": &args.node_path}))
            .await
            .context("Failed to delete node")?;
        Ok(format!("Deleted node at {}", args.node_path))
    }
}

pub struct UpdateNodePropertyTool {
    editor: Arc<dyn CommandSender>,
}

#[derive(Deserialize)]
struct UpdateNodePropertyArgs {
    node_path: String,
    property: String,
    value: Value,
}

#[async_trait]
impl Tool for UpdateNodePropertyTool {
    fn name(&self) -> &str { "update_node_property" }
    fn description(&self) -> &str { "Update a property of a node in the Godot scene tree" }
    fn category(&self) -> &str { "node" }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "node_path": {"type": "string", "description": "Path to the node to update"},
                "property": {"type": "string", "description": "Name of the property to update (e.g. \"position\", \"text\")"},
                "value": {"description": "New value for the property"}
            },
            "required": ["node_path", "property", "value"]
        })
    }

    async fn execute(&self, input: Value) -> Result<String> {
        let args: UpdateNodePropertyArgs = parse_args(input)?;
        self.editor
            .send_command(
                "update_node_property",
                json!({
                    "node_path": &args.node_path,
                    "property": &args.property,
                    "value": &args.value,
                }),
            )
            .await
            .context("Failed to update property")?;

        Ok(format!(
            "Updated property \"{}\" of node at {} to {}",
            args.property,
            args.node_path,
            json_inline(&args.value)
        ))
    }
}

pub struct GetNodePropertiesTool {
    editor: Arc<dyn CommandSender>,
}

#[async_trait]
impl Tool for GetNodePropertiesTool {
    fn name(&self) -> &str { "get_node_properties" }
    fn description(&self) -> &str { "Get all properties of a node in the Godot scene tree" }
    fn category(&self) -> &str { "node" }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "node_path": {"type": "string", "description": "Path to the node to inspect"}
            },
            "required": ["node_path"]
        })
    }

    async fn execute(&self, input: Value) -> Result<String> {
        let args: NodePathArgs = parse_args(input)?;
        let result = self
            .editor
            .send_command("get_node_properties", json!({"node_path": &args.node_path}))
            .await
            .context("Failed to get node properties")?;

        let properties = match result.get("properties").and_then(Value::as_object) {
            Some(props) if !props.is_empty() => props,
            _ => return Ok(format!("No properties found for node at {}", args.node_path)),
        };

        let mut out = format!("Properties of node at {}:\n", args.node_path);
        for (key, value) in properties {
            let _ = write!(out, "\n{}: {}", key, json_inline(value));
        }
        Ok(out)
    }
}

pub struct ListNodesTool {
    editor: Arc<dyn CommandSender>,
}

#[derive(Deserialize)]
struct ListNodesArgs {
    parent_path: String,
}

#[async_trait]
impl Tool for ListNodesTool {
    fn name(&self) -> &str { "list_nodes" }
    fn description(&self) -> &str { "List all child nodes under a parent node in the Godot scene tree" }
    fn category(&self) -> &str { "node" }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "parent_path": {"type": "string", "description": "Path to the parent node (e.g. \"/root\")"}
            },
            "required": ["parent_path"]
        })
    }

    async fn execute(&self, input: Value) -> Result<String> {
        let args: ListNodesArgs = parse_args(input)?;
        let result = self
            .editor
            .send_command("list_nodes", json!({"parent_path": &args.parent_path}))
            .await
            .context("Failed to list nodes")?;

        let children = result
            .get("children")
            .and_then(Value::as_array)
            .filter(|c| !c.is_empty());
        let Some(children) = children else {
            return Ok(format!("No child nodes found under {}", args.parent_path));
        };

        let mut out = format!("Children of node at {}:\n", args.parent_path);
        for child in children {
            let _ = write!(
                out,
                "\n{} ({}) - {}",
                str_field(child, "name").unwrap_or("?"),
                str_field(child, "type").unwrap_or("Node"),
                str_field(child, "path").unwrap_or("")
            );
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{editor, MockEditor};

    #[tokio::test]
    async fn test_create_node() {
        let (mock, sender) = editor(
            MockEditor::new().with("create_node", json!({"node_path": "/root/Main/Hero"})),
        );
        let tool = CreateNodeTool { editor: sender };

        let text = tool
            .execute(json!({"parent_path": "/root/Main", "node_type": "Sprite2D", "node_name": "Hero"}))
            .await
            .unwrap();

        assert_eq!(text, "Created Sprite2D node named \"Hero\" at /root/Main/Hero");
        assert_eq!(mock.calls()[0].0, "create_node");
        assert_eq!(mock.last_params()["node_name"], "Hero");
    }

    #[tokio::test]
    async fn test_create_node_missing_argument() {
        let (mock, sender) = editor(MockEditor::new());
        let tool = CreateNodeTool { editor: sender };

        let err = tool.execute(json!({"parent_path": "/root"})).await.unwrap_err();
        assert!(err.to_string().starts_with("Invalid arguments"));
        assert!(mock.calls().is_empty());
    }

    #[tokio::test]
    async fn test_delete_node_editor_error() {
        let (_, sender) = editor(MockEditor::new().with_error("delete_node", "Node not found"));
        let tool = DeleteNodeTool { editor: sender };

        let err = tool.execute(json!({"node_path": "/root/Nope"})).await.unwrap_err();
        assert_eq!(format!("{:#}", err), "Failed to delete node: Node not found");
    }

    #[tokio::test]
    async fn test_update_property_echoes_json_value() {
        let (_, sender) = editor(MockEditor::new().with("update_node_property", json!({})));
        let tool = UpdateNodePropertyTool { editor: sender };

        let text = tool
            .execute(json!({"node_path": "/root/Label", "property": "text", "value": "Hi"}))
            .await
            .unwrap();
        assert_eq!(text, "Updated property \"text\" of node at /root/Label to \"Hi\"");
    }

    #[tokio::test]
    async fn test_get_node_properties() {
        let (_, sender) = editor(MockEditor::new().with(
            "get_node_properties",
            json!({"properties": {"visible": true, "name": "Player"}}),
        ));
        let tool = GetNodePropertiesTool { editor: sender };

        let text = tool.execute(json!({"node_path": "/root/Player"})).await.unwrap();
        assert!(text.starts_with("Properties of node at /root/Player:\n"));
        assert!(text.contains("\nvisible: true"));
        assert!(text.contains("\nname: \"Player\""));
    }

    #[tokio::test]
    async fn test_list_nodes() {
        let (_, sender) = editor(MockEditor::new().with(
            "list_nodes",
            json!({"children": [{"name": "Player", "type": "CharacterBody2D", "path": "/root/Main/Player"}]}),
        ));
        let tool = ListNodesTool { editor: sender };

        let text = tool.execute(json!({"parent_path": "/root/Main"})).await.unwrap();
        assert_eq!(
            text,
            "Children of node at /root/Main:\n\nPlayer (CharacterBody2D) - /root/Main/Player"
        );
    }

    #[tokio::test]
    async fn test_list_nodes_empty() {
        let (_, sender) = editor(MockEditor::new().with("list_nodes", json!({"children": []})));
        let tool = ListNodesTool { editor: sender };

        let text = tool.execute(json!({"parent_path": "/root/Empty"})).await.unwrap();
        assert_eq!(text, "No child nodes found under /root/Empty");
    }
}
