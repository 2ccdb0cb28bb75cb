//! godot-mcp: MCP server for the Godot editor
//!
//! Speaks MCP over stdio and relays every tool call to the Godot editor
//! plugin over WebSocket.
//!
//!   godot-mcp                                  # ws://localhost:9080
//!   godot-mcp --url ws://127.0.0.1:9090        # custom plugin port
//!   godot-mcp --config ./godot-mcp.toml        # explicit config file
//!   GODOT_MCP__GODOT__COMMAND_TIMEOUT_MS=5000 godot-mcp

use anyhow::{Context, Result};
use clap::Parser;
use godot_bridge::{CommandSender, ConnectionConfig, GodotConnection};
use godot_core::Settings;
use godot_mcp::{
    transport::{StdioTransport, Transport},
    McpServer, McpServerConfig,
};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "godot-mcp")]
#[command(about = "MCP server exposing the Godot editor", version)]
struct Cli {
    /// Config file (TOML); defaults to config/godot-mcp.toml when present
    #[arg(long, short, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Editor plugin WebSocket URL
    #[arg(long, value_name = "URL")]
    url: Option<String>,

    /// Per-command timeout in milliseconds
    #[arg(long, value_name = "MS")]
    timeout_ms: Option<u64>,

    /// Log level (overridden by RUST_LOG)
    #[arg(long)]
    log_level: Option<String>,

    /// Server name reported to the client
    #[arg(long)]
    name: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut settings = Settings::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(url) = cli.url {
        settings.godot.url = url;
    }
    if let Some(timeout_ms) = cli.timeout_ms {
        settings.godot.command_timeout_ms = timeout_ms;
    }
    if let Some(level) = cli.log_level {
        settings.logging.level = level;
    }
    if let Some(name) = cli.name {
        settings.server.name = name;
    }

    // stdout carries the protocol, so logs go to stderr
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    info!(url = %settings.godot.url, "Starting godot-mcp");

    let connection = Arc::new(GodotConnection::new(ConnectionConfig::from(&settings.godot)));
    let sender: Arc<dyn CommandSender> = connection.clone();

    let server = Arc::new(
        McpServer::new(
            McpServerConfig {
                name: settings.server.name.clone(),
                version: settings.server.version.clone(),
            },
            sender,
        )
        .await,
    );
    info!(tools = server.tools().count().await, "MCP server initialized");

    // Connect eagerly so the first tool call is fast; commands reconnect lazily
    let eager = connection.clone();
    let eager_connect = tokio::spawn(async move {
        match eager.connect().await {
            Ok(()) => info!("Connected to Godot editor"),
            Err(e) => {
                warn!(error = %e, "Could not connect to Godot editor");
                warn!("Will retry connection when commands are executed");
            }
        }
    });

    tokio::select! {
        result = StdioTransport::new().serve(server) => {
            result?;
            info!("Client closed stdin, shutting down...");
        }
        _ = shutdown_signal() => {}
    }

    eager_connect.abort();
    connection.disconnect().await;
    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down...");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down...");
        },
    }
}
