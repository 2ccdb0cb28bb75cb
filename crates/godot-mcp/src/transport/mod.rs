//! Transport Layer
//!
//! MCP is served over stdio only. The traits keep the dispatcher independent
//! of how messages are framed.

mod stdio;

pub use stdio::{serve_lines, StdioTransport};

use crate::{McpRequest, McpResponse};
use anyhow::Result;
use std::sync::Arc;

/// Anything that can answer an MCP request
#[async_trait::async_trait]
pub trait McpHandler: Send + Sync {
    async fn handle_request(&self, request: McpRequest) -> McpResponse;
}

/// Transport trait - implement for new transport types
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// Serve requests until the peer goes away
    async fn serve<H: McpHandler + 'static>(self, handler: Arc<H>) -> Result<()>;
}

#[async_trait::async_trait]
impl McpHandler for crate::McpServer {
    async fn handle_request(&self, request: McpRequest) -> McpResponse {
        crate::McpServer::handle_request(self, request).await
    }
}
