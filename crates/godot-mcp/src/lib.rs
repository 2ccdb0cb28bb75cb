//! godot-mcp: MCP adapter for the Godot editor
//!
//! Exposes editor functionality (scene graph, scripts, assets, nodes) as MCP
//! tools and resources. Every call is relayed to the editor plugin through
//! `godot_bridge::GodotConnection`; this crate only shapes arguments and
//! formats replies.
//!
//! Architecture:
//! stdin → MCP JSON-RPC → McpServer → tool/resource → GodotConnection → editor
//!
//! Methods:
//! - initialize → handshake
//! - tools/list, tools/call → tool catalog
//! - resources/list, resources/templates/list, resources/read → resource catalog

pub mod format;
pub mod protocol;
pub mod resources;
pub mod server;
pub mod tool_registry;
pub mod tools;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

/// MCP protocol revision we speak
pub const PROTOCOL_VERSION: &str = "2024-11-05";
pub const SERVER_NAME: &str = "GodotMCP";
pub const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

// Re-export main types
pub use protocol::{JsonRpcError, McpRequest, McpResponse};
pub use resources::ResourceRegistry;
pub use server::{McpServer, McpServerConfig};
pub use tool_registry::{Tool, ToolRegistry};

