//! Asset Tools - project file listings

use crate::format::{preview_list, string_list};
use crate::tool_registry::{parse_args, Tool, ToolRegistry};
use anyhow::{Context, Result};
use async_trait::async_trait;
use godot_bridge::CommandSender;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

pub async fn register_all(registry: &ToolRegistry, editor: &Arc<dyn CommandSender>) -> usize {
    registry.register(Arc::new(ListAssetsByTypeTool { editor: editor.clone() })).await;
    registry.register(Arc::new(ListProjectFilesTool { editor: editor.clone() })).await;
    2
}

pub struct ListAssetsByTypeTool {
    editor: Arc<dyn CommandSender>,
}

#[derive(Deserialize)]
struct ListAssetsArgs {
    #[serde(rename = "type")]
    asset_type: String,
}

#[async_trait]
impl Tool for ListAssetsByTypeTool {
    fn name(&self) -> &str { "list_assets_by_type" }
    fn description(&self) -> &str { "List all assets of a specific type in the project" }
    fn category(&self) -> &str { "asset" }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "type": {"type": "string", "description": "Type of assets to list (e.g. \"images\", \"audio\", \"models\", \"all\")"}
            },
            "required": ["type"]
        })
    }

    async fn execute(&self, input: Value) -> Result<String> {
        let args: ListAssetsArgs = parse_args(input)?;
        let result = self
            .editor
            .send_command("list_assets_by_type", json!({"type": &args.asset_type}))
            .await
            .context("Failed to list assets")?;

        let files = string_list(&result, "files");
        let count = result
            .get("count")
            .and_then(Value::as_u64)
            .map(|c| c as usize)
            .unwrap_or(files.len());
        let asset_type = result
            .get("assetType")
            .and_then(Value::as_str)
            .unwrap_or(&args.asset_type);

        if count == 0 || files.is_empty() {
            return Ok(format!("No {} assets found in the project.", asset_type));
        }

        Ok(format!(
            "Found {} {} assets in the project.\n\n{}",
            count,
            asset_type,
            preview_list("assets", count, &files)
        ))
    }
}

pub struct ListProjectFilesTool {
    editor: Arc<dyn CommandSender>,
}

#[derive(Deserialize)]
struct ListProjectFilesArgs {
    #[serde(default)]
    extensions: Vec<String>,
}

#[async_trait]
impl Tool for ListProjectFilesTool {
    fn name(&self) -> &str { "list_project_files" }
    fn description(&self) -> &str { "List files in the project matching specified extensions" }
    fn category(&self) -> &str { "asset" }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "extensions": {
                    "type": "array",
                    "items": {"type": "string"},
                    "description": "File extensions to filter by (e.g. [\".tscn\", \".gd\"])"
                }
            }
        })
    }

    async fn execute(&self, input: Value) -> Result<String> {
        let args: ListProjectFilesArgs = parse_args(input)?;
        let result = self
            .editor
            .send_command("list_project_files", json!({"extensions": &args.extensions}))
            .await
            .context("Failed to list project files")?;

        let files = string_list(&result, "files");
        let filter = if args.extensions.is_empty() {
            "all".to_string()
        } else {
            args.extensions.join(", ")
        };

        if files.is_empty() {
            return Ok(format!("No files with extensions {} found in the project.", filter));
        }

        Ok(format!(
            "Found {} files with extensions {} in the project.\n\n{}",
            files.len(),
            filter,
            preview_list("files", files.len(), &files)
        ))
    }
}
