//! MCP Server
//!
//! Transport-agnostic dispatcher. Tool and resource calls are answered from
//! the registries, which relay to the editor.

use crate::protocol::{JsonRpcError, McpRequest, McpResponse};
use crate::resources::ResourceRegistry;
use crate::tool_registry::ToolRegistry;
use crate::{PROTOCOL_VERSION, SERVER_NAME, SERVER_VERSION};
use godot_bridge::CommandSender;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

/// Server configuration
#[derive(Debug, Clone)]
pub struct McpServerConfig {
    /// Name reported in `serverInfo`
    pub name: String,
    pub version: String,
}

impl Default for McpServerConfig {
    fn default() -> Self {
        Self {
            name: SERVER_NAME.to_string(),
            version: SERVER_VERSION.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
struct ClientInfo {
    name: String,
    version: Option<String>,
}

pub struct McpServer {
    config: McpServerConfig,
    tools: Arc<ToolRegistry>,
    resources: ResourceRegistry,
    /// Client info from last initialize
    client_info: RwLock<Option<ClientInfo>>,
}

impl McpServer {
    /// Build a server with the full tool and resource catalog bound to `editor`
    pub async fn new(config: McpServerConfig, editor: Arc<dyn CommandSender>) -> Self {
        let tools = Arc::new(ToolRegistry::new());
        crate::tools::register_all(&tools, editor.clone()).await;
        Self::with_registries(config, tools, ResourceRegistry::new(editor))
    }

    pub fn with_registries(
        config: McpServerConfig,
        tools: Arc<ToolRegistry>,
        resources: ResourceRegistry,
    ) -> Self {
        Self {
            config,
            tools,
            resources,
            client_info: RwLock::new(None),
        }
    }

    pub fn tools(&self) -> &Arc<ToolRegistry> {
        &self.tools
    }

    /// Name and version of the client from the last `initialize`, if any
    pub async fn client(&self) -> Option<(String, Option<String>)> {
        self.client_info
            .read()
            .await
            .as_ref()
            .map(|c| (c.name.clone(), c.version.clone()))
    }

    /// Handle an MCP request
    pub async fn handle_request(&self, request: McpRequest) -> McpResponse {
        debug!(method = %request.method, "Handling MCP request");

        match request.method.as_str() {
            "initialize" => self.handle_initialize(request).await,
            "initialized" | "notifications/initialized" => {
                debug!("Client finished initialization");
                McpResponse::success(request.id, json!({}))
            }
            "ping" => McpResponse::success(request.id, json!({})),
            "tools/list" => self.handle_tools_list(request).await,
            "tools/call" => self.handle_tools_call(request).await,
            "resources/list" => self.handle_resources_list(request),
            "resources/templates/list" => self.handle_templates_list(request),
            "resources/read" => self.handle_resources_read(request).await,
            _ => {
                warn!(method = %request.method, "Unknown method");
                McpResponse::error(request.id, JsonRpcError::method_not_found(&request.method))
            }
        }
    }

    async fn handle_initialize(&self, request: McpRequest) -> McpResponse {
        let client = request.params.as_ref().and_then(|p| p.get("clientInfo"));
        let client_name = client
            .and_then(|c| c.get("name"))
            .and_then(Value::as_str)
            .unwrap_or("unknown");
        let client_version = client
            .and_then(|c| c.get("version"))
            .and_then(Value::as_str);

        info!(
            client = %client_name,
            version = %client_version.unwrap_or("?"),
            "Client connected"
        );

        *self.client_info.write().await = Some(ClientInfo {
            name: client_name.to_string(),
            version: client_version.map(String::from),
        });

        McpResponse::success(
            request.id,
            json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": {
                    "tools": { "listChanged": false },
                    "resources": { "subscribe": false, "listChanged": false }
                },
                "serverInfo": {
                    "name": self.config.name,
                    "version": self.config.version
                }
            }),
        )
    }

    async fn handle_tools_list(&self, request: McpRequest) -> McpResponse {
        let tools = self.tools.list().await;
        McpResponse::success(request.id, json!({ "tools": tools }))
    }

    async fn handle_tools_call(&self, request: McpRequest) -> McpResponse {
        let Some(tool_name) = request.param_str("name").map(str::to_string) else {
            return McpResponse::error(request.id, JsonRpcError::invalid_params("Missing tool name"));
        };

        let Some(tool) = self.tools.get(&tool_name).await else {
            warn!(tool = %tool_name, "Unknown tool");
            return McpResponse::error(
                request.id,
                JsonRpcError::invalid_params(format!("Unknown tool: {}", tool_name)),
            );
        };

        let arguments = request
            .params
            .as_ref()
            .and_then(|p| p.get("arguments"))
            .cloned()
            .unwrap_or_else(|| json!({}));

        debug!(tool = %tool_name, "Executing tool");
        let (text, is_error) = match tool.execute(arguments).await {
            Ok(text) => (text, false),
            Err(e) => {
                error!(tool = %tool_name, error = %format!("{:#}", e), "Tool failed");
                (format!("Error: {:#}", e), true)
            }
        };

        McpResponse::success(
            request.id,
            json!({
                "content": [{ "type": "text", "text": text }],
                "isError": is_error
            }),
        )
    }

    fn handle_resources_list(&self, request: McpRequest) -> McpResponse {
        McpResponse::success(
            request.id,
            json!({ "resources": self.resources.list_resources() }),
        )
    }

    fn handle_templates_list(&self, request: McpRequest) -> McpResponse {
        McpResponse::success(
            request.id,
            json!({ "resourceTemplates": self.resources.list_templates() }),
        )
    }

    async fn handle_resources_read(&self, request: McpRequest) -> McpResponse {
        let uri = match request.param_str("uri") {
            Some(uri) if !uri.is_empty() => uri.to_string(),
            _ => return McpResponse::error(request.id, JsonRpcError::invalid_params("Missing uri")),
        };

        match self.resources.read_resource(&uri).await {
            Ok(Some(content)) => McpResponse::success(request.id, json!({ "contents": [content] })),
            Ok(None) => McpResponse::error(request.id, JsonRpcError::resource_not_found(&uri)),
            Err(e) => {
                error!(uri = %uri, error = %format!("{:#}", e), "Resource read failed");
                McpResponse::error(request.id, JsonRpcError::internal_error(format!("{:#}", e)))
            }
        }
    }
}
