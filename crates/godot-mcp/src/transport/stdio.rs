//! Stdio Transport
//!
//! One JSON-RPC message per line on stdin, one response per line on stdout.

use super::{McpHandler, Transport};
use crate::{JsonRpcError, McpRequest, McpResponse};
use anyhow::Result;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, error, info};

/// Stdio transport - reads JSON-RPC from stdin, writes to stdout
pub struct StdioTransport;

impl StdioTransport {
    pub fn new() -> Self {
        Self
    }
}

impl Default for StdioTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Transport for StdioTransport {
    async fn serve<H: McpHandler + 'static>(self, handler: Arc<H>) -> Result<()> {
        info!("Starting MCP stdio transport");
        let stdin = BufReader::new(tokio::io::stdin());
        let stdout = tokio::io::stdout();
        serve_lines(stdin, stdout, handler.as_ref()).await?;
        info!("Stdio transport shutting down");
        Ok(())
    }
}

/// Answer line-delimited requests from `reader` until EOF
pub async fn serve_lines<R, W, H>(reader: R, mut writer: W, handler: &H) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
    H: McpHandler + ?Sized,
{
    let mut lines = reader.lines();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        debug!(request = %line, "Received request");

        let response = match serde_json::from_str::<McpRequest>(line) {
            Ok(request) if request.is_notification() => {
                debug!(method = %request.method, "Notification");
                handler.handle_request(request).await;
                continue;
            }
            Ok(request) => handler.handle_request(request).await,
            Err(e) => {
                error!(error = %e, "Parse error");
                McpResponse::error(None, JsonRpcError::parse_error(e.to_string()))
            }
        };

        let response_json = serde_json::to_string(&response)?;
        debug!(response = %response_json, "Sending response");

        writer.write_all(response_json.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
    }

    Ok(())
}
