//! Resource Registry for MCP
//!
//! Read-only documents backed by editor commands. Static URIs are listed by
//! `resources/list`; parameterized ones by `resources/templates/list`.

use anyhow::{Context, Result};
use godot_bridge::CommandSender;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::debug;

use crate::format::{str_field, string_list};

pub const MIME_JSON: &str = "application/json";
pub const MIME_TEXT: &str = "text/plain";

const SCRIPT_PREFIX: &str = "godot/script/";
const SCRIPT_METADATA_PREFIX: &str = "godot/script/metadata/";

/// Resource information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceInfo {
    pub uri: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "mimeType")]
    pub mime_type: String,
}

/// URI template (RFC 6570 level 1)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceTemplateInfo {
    #[serde(rename = "uriTemplate")]
    pub uri_template: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "mimeType")]
    pub mime_type: String,
}

/// Body returned by `resources/read`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceContent {
    pub uri: String,
    #[serde(rename = "mimeType")]
    pub mime_type: String,
    pub text: String,
}

fn info(uri: &str, name: &str, description: &str, mime_type: &str) -> ResourceInfo {
    ResourceInfo {
        uri: uri.to_string(),
        name: name.to_string(),
        description: Some(description.to_string()),
        mime_type: mime_type.to_string(),
    }
}

/// Resource registry
pub struct ResourceRegistry {
    editor: Arc<dyn CommandSender>,
    resources: Vec<ResourceInfo>,
    templates: Vec<ResourceTemplateInfo>,
}

impl ResourceRegistry {
    pub fn new(editor: Arc<dyn CommandSender>) -> Self {
        let resources = vec![
            info("godot/scenes", "Godot Scene List", "All scene files in the project", MIME_JSON),
            info("godot/scripts", "Godot Script List", "All GDScript and C# files in the project", MIME_JSON),
            info("godot/project/structure", "Godot Project Structure", "Directory layout and file counts", MIME_JSON),
            info("godot/project/settings", "Godot Project Settings", "Project settings from project.godot", MIME_JSON),
            info("godot/project/resources", "Godot Project Resources", "Resources in the project grouped by type", MIME_JSON),
            info("godot/editor/state", "Godot Editor State", "Current editor state", MIME_JSON),
            info("godot/editor/selected_node", "Godot Selected Node", "Node currently selected in the editor", MIME_JSON),
            info("godot/editor/current_script", "Current Script", "Script currently open in the script editor", MIME_TEXT),
            info("godot/scene/current", "Godot Scene Structure", "Structure of the scene open in the editor", MIME_JSON),
            info("godot/scene/tree", "Full Scene Tree", "Complete node hierarchy of the current scene", MIME_JSON),
            info("godot/debug/log", "Godot Debug Output", "Editor debug output log", MIME_TEXT),
            info("godot/assets", "Asset List", "All project files, flat and grouped by directory", MIME_JSON),
        ];

        let templates = vec![
            ResourceTemplateInfo {
                uri_template: "godot/script/{path}".to_string(),
                name: "Script Content".to_string(),
                description: Some("Source of a script, e.g. godot/script/res://player.gd".to_string()),
                mime_type: MIME_TEXT.to_string(),
            },
            ResourceTemplateInfo {
                uri_template: "godot/script/metadata/{path}".to_string(),
                name: "Script Metadata".to_string(),
                description: Some("Class name, base type, methods and signals of a script".to_string()),
                mime_type: MIME_JSON.to_string(),
            },
        ];

        Self {
            editor,
            resources,
            templates,
        }
    }

    pub fn list_resources(&self) -> &[ResourceInfo] {
        &self.resources
    }

    pub fn list_templates(&self) -> &[ResourceTemplateInfo] {
        &self.templates
    }

    /// Read a resource. `Ok(None)` means the URI is not one we serve.
    pub async fn read_resource(&self, uri: &str) -> Result<Option<ResourceContent>> {
        debug!(uri = %uri, "Reading resource");

        let (mime_type, text) = match uri {
            "godot/scenes" => (MIME_JSON, self.scene_list().await?),
            "godot/scripts" => (MIME_JSON, self.script_list().await?),
            "godot/project/structure" => (MIME_JSON, self.passthrough("get_project_structure").await?),
            "godot/project/settings" => (MIME_JSON, self.passthrough("get_project_settings").await?),
            "godot/project/resources" => (MIME_JSON, self.passthrough("list_project_resources").await?),
            "godot/editor/state" => (MIME_JSON, self.passthrough("get_editor_state").await?),
            "godot/editor/selected_node" => (MIME_JSON, self.passthrough("get_selected_node").await?),
            "godot/editor/current_script" => (MIME_TEXT, self.current_script().await?),
            "godot/scene/current" => (MIME_JSON, self.passthrough("get_current_scene_structure").await?),
            "godot/scene/tree" => (MIME_JSON, self.passthrough("get_full_scene_tree").await?),
            "godot/debug/log" => (MIME_TEXT, self.debug_log().await?),
            "godot/assets" => (MIME_JSON, self.asset_list().await?),
            _ => {
                // Metadata first: its prefix is an extension of the script prefix
                if let Some(path) = uri.strip_prefix(SCRIPT_METADATA_PREFIX) {
                    (MIME_JSON, self.script_metadata(path).await?)
                } else if let Some(path) = uri.strip_prefix(SCRIPT_PREFIX) {
                    (MIME_TEXT, self.script_content(path).await?)
                } else {
                    return Ok(None);
                }
            }
        };

        Ok(Some(ResourceContent {
            uri: uri.to_string(),
            mime_type: mime_type.to_string(),
            text,
        }))
    }

    async fn command(&self, command: &str, params: Value) -> Result<Value> {
        self.editor
            .send_command(command, params)
            .await
            .with_context(|| format!("Godot command {} failed", command))
    }

    async fn passthrough(&self, command: &str) -> Result<String> {
        let result = self.command(command, json!({})).await?;
        Ok(serde_json::to_string_pretty(&result)?)
    }

    async fn project_files(&self, extensions: &[&str]) -> Result<Vec<String>> {
        let result = self
            .command("list_project_files", json!({"extensions": extensions}))
            .await?;
        Ok(string_list(&result, "files"))
    }

    async fn scene_list(&self) -> Result<String> {
        let scenes = self.project_files(&[".tscn", ".scn"]).await?;
        Ok(serde_json::to_string_pretty(&json!({
            "count": scenes.len(),
            "scenes": scenes,
        }))?)
    }

    async fn script_list(&self) -> Result<String> {
        let scripts = self.project_files(&[".gd", ".cs"]).await?;
        let gdscripts: Vec<_> = scripts.iter().filter(|s| s.ends_with(".gd")).collect();
        let csharp: Vec<_> = scripts.iter().filter(|s| s.ends_with(".cs")).collect();
        Ok(serde_json::to_string_pretty(&json!({
            "count": scripts.len(),
            "scripts": &scripts,
            "gdscripts": gdscripts,
            "csharp_scripts": csharp,
        }))?)
    }

    async fn asset_list(&self) -> Result<String> {
        let files = self.project_files(&[]).await?;
        Ok(serde_json::to_string_pretty(&json!({
            "count": files.len(),
            "files": &files,
            "organizedFiles": organize_files(&files),
        }))?)
    }

    async fn current_script(&self) -> Result<String> {
        let result = self.command("get_current_script", json!({})).await?;
        let found = result
            .get("script_found")
            .and_then(Value::as_bool)
            .unwrap_or_else(|| result.get("content").is_some());

        match str_field(&result, "content") {
            Some(content) if found => Ok(content.to_string()),
            _ => Ok("No script is currently being edited.".to_string()),
        }
    }

    async fn debug_log(&self) -> Result<String> {
        let result = self.command("get_debug_output", json!({})).await?;
        Ok(str_field(&result, "output").unwrap_or("").to_string())
    }

    async fn script_content(&self, path: &str) -> Result<String> {
        let result = self
            .command("get_script", json!({"script_path": res_path(path)}))
            .await?;
        Ok(str_field(&result, "content").unwrap_or("").to_string())
    }

    async fn script_metadata(&self, path: &str) -> Result<String> {
        let result = self
            .command("get_script_metadata", json!({"path": res_path(path)}))
            .await?;
        Ok(serde_json::to_string_pretty(&result)?)
    }
}

/// Normalize a project path to `res://` form
fn res_path(path: &str) -> String {
    if path.starts_with("res://") {
        path.to_string()
    } else {
        format!("res://{}", path.trim_start_matches('/'))
    }
}

/// Fold a flat `res://` path list into nested directory objects.
///
/// Leaves map the file name to the full original path.
pub fn organize_files(files: &[String]) -> Value {
    let mut root = Map::new();
    for file in files {
        let relative = file.strip_prefix("res://").unwrap_or(file);
        let mut parts: Vec<&str> = relative.split('/').filter(|p| !p.is_empty()).collect();
        let Some(name) = parts.pop() else {
            continue;
        };
        insert_path(&mut root, &parts, name, file);
    }
    Value::Object(root)
}

fn insert_path(node: &mut Map<String, Value>, dirs: &[&str], name: &str, full: &str) {
    match dirs.split_first() {
        None => {
            node.insert(name.to_string(), Value::String(full.to_string()));
        }
        Some((dir, rest)) => {
            let child = node
                .entry(dir.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !child.is_object() {
                *child = Value::Object(Map::new());
            }
            if let Value::Object(map) = child {
                insert_path(map, rest, name, full);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{editor, MockEditor};

    #[test]
    fn test_organize_files() {
        let files = vec![
            "res://project.godot".to_string(),
            "res://art/player.png".to_string(),
            "res://art/ui/button.png".to_string(),
            "res://scenes/main.tscn".to_string(),
        ];
        let tree = organize_files(&files);

        assert_eq!(
            tree,
            json!({
                "project.godot": "res://project.godot",
                "art": {
                    "player.png": "res://art/player.png",
                    "ui": {"button.png": "res://art/ui/button.png"}
                },
                "scenes": {"main.tscn": "res://scenes/main.tscn"}
            })
        );
    }

    #[test]
    fn test_res_path() {
        assert_eq!(res_path("res://a.gd"), "res://a.gd");
        assert_eq!(res_path("scripts/a.gd"), "res://scripts/a.gd");
        assert_eq!(res_path("/scripts/a.gd"), "res://scripts/a.gd");
    }

    #[tokio::test]
    async fn test_script_list_splits_languages() {
        let (mock, sender) = editor(MockEditor::new().with(
            "list_project_files",
            json!({"files": ["res://player.gd", "res://Enemy.cs", "res://ui.gd"]}),
        ));
        let registry = ResourceRegistry::new(sender);

        let content = registry.read_resource("godot/scripts").await.unwrap().unwrap();
        let body: Value = serde_json::from_str(&content.text).unwrap();

        assert_eq!(content.mime_type, MIME_JSON);
        assert_eq!(body["count"], 3);
        assert_eq!(body["gdscripts"], json!(["res://player.gd", "res://ui.gd"]));
        assert_eq!(body["csharp_scripts"], json!(["res://Enemy.cs"]));
        assert_eq!(mock.last_params(), json!({"extensions": [".gd", ".cs"]}));
    }

    #[tokio::test]
    async fn test_assets_resource() {
        let (mock, sender) = editor(MockEditor::new().with(
            "list_project_files",
            json!({"files": ["res://icon.svg", "res://audio/jump.wav"]}),
        ));
        let registry = ResourceRegistry::new(sender);

        let content = registry.read_resource("godot/assets").await.unwrap().unwrap();
        let body: Value = serde_json::from_str(&content.text).unwrap();

        assert_eq!(body["count"], 2);
        assert_eq!(body["organizedFiles"]["audio"]["jump.wav"], "res://audio/jump.wav");
        assert_eq!(mock.last_params(), json!({"extensions": []}));
    }

    #[tokio::test]
    async fn test_script_templates() {
        let (mock, sender) = editor(
            MockEditor::new()
                .with("get_script", json!({"script_path": "res://player.gd", "content": "extends Node"}))
                .with("get_script_metadata", json!({"class_name": "Player"})),
        );
        let registry = ResourceRegistry::new(sender);

        let script = registry.read_resource("godot/script/player.gd").await.unwrap().unwrap();
        assert_eq!(script.text, "extends Node");
        assert_eq!(script.mime_type, MIME_TEXT);
        assert_eq!(mock.last_params(), json!({"script_path": "res://player.gd"}));

        let meta = registry
            .read_resource("godot/script/metadata/res://player.gd")
            .await
            .unwrap()
            .unwrap();
        assert!(meta.text.contains("\"class_name\": \"Player\""));
        assert_eq!(mock.last_params(), json!({"path": "res://player.gd"}));
    }

    #[tokio::test]
    async fn test_current_script_not_open() {
        let (_, sender) = editor(
            MockEditor::new().with("get_current_script", json!({"script_found": false})),
        );
        let registry = ResourceRegistry::new(sender);

        let content = registry
            .read_resource("godot/editor/current_script")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(content.text, "No script is currently being edited.");
    }

    #[tokio::test]
    async fn test_unknown_uri() {
        let (mock, sender) = editor(MockEditor::new());
        let registry = ResourceRegistry::new(sender);

        assert!(registry.read_resource("godot/nope").await.unwrap().is_none());
        assert!(mock.calls().is_empty());
    }

    #[tokio::test]
    async fn test_editor_failure_propagates() {
        let (_, sender) = editor(MockEditor::new().with_error("get_editor_state", "Editor busy"));
        let registry = ResourceRegistry::new(sender);

        let err = registry.read_resource("godot/editor/state").await.unwrap_err();
        assert_eq!(format!("{:#}", err), "Godot command get_editor_state failed: Editor busy");
    }

    #[test]
    fn test_every_listed_resource_is_readable_uri() {
        let registry = ResourceRegistry::new(Arc::new(MockEditor::new()));
        assert_eq!(registry.list_resources().len(), 12);
        assert_eq!(registry.list_templates().len(), 2);
        assert!(registry.list_resources().iter().all(|r| r.uri.starts_with("godot/")));
    }
}
