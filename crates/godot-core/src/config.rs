//! Layered configuration
//!
//! Settings are resolved in this order, later sources winning:
//!
//! 1. Built-in defaults
//! 2. TOML file (`config/godot-mcp.toml` if present, or an explicit path)
//! 3. Environment variables `GODOT_MCP__<SECTION>__<KEY>`
//!
//! CLI flags are applied on top by the binary.
//!
//! ```no_run
//! use godot_core::Settings;
//!
//! let settings = Settings::load(None).unwrap();
//! println!("{}", settings.godot.url);
//! ```

use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

use crate::error::Result;

/// Default config file, resolved relative to the working directory
pub const DEFAULT_CONFIG_FILE: &str = "config/godot-mcp";

/// Prefix for environment overrides
pub const ENV_PREFIX: &str = "GODOT_MCP";

pub const DEFAULT_SERVER_NAME: &str = "GodotMCP";
pub const DEFAULT_GODOT_URL: &str = "ws://localhost:9080";
pub const DEFAULT_COMMAND_TIMEOUT_MS: u64 = 20_000;
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 20_000;
pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_RETRY_DELAY_MS: u64 = 2_000;
pub const DEFAULT_SUBPROTOCOL: &str = "json";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub godot: GodotSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub name: String,
    pub version: String,
}

/// Editor connection settings
#[derive(Debug, Clone, Deserialize)]
pub struct GodotSettings {
    pub url: String,
    pub command_timeout_ms: u64,
    pub connect_timeout_ms: u64,
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    /// `Sec-WebSocket-Protocol` to request; empty disables it
    #[serde(default)]
    pub subprotocol: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    pub level: String,
}

impl Settings {
    /// Load settings from defaults, an optional file and the environment.
    ///
    /// An explicit `path` must exist; the default file is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let builder = Config::builder()
            .set_default("server.name", DEFAULT_SERVER_NAME)?
            .set_default("server.version", env!("CARGO_PKG_VERSION"))?
            .set_default("godot.url", DEFAULT_GODOT_URL)?
            .set_default("godot.command_timeout_ms", DEFAULT_COMMAND_TIMEOUT_MS as i64)?
            .set_default("godot.connect_timeout_ms", DEFAULT_CONNECT_TIMEOUT_MS as i64)?
            .set_default("godot.max_retries", DEFAULT_MAX_RETRIES as i64)?
            .set_default("godot.retry_delay_ms", DEFAULT_RETRY_DELAY_MS as i64)?
            .set_default("godot.subprotocol", DEFAULT_SUBPROTOCOL)?
            .set_default("logging.level", "info")?;

        let builder = match path {
            Some(path) => {
                debug!(path = %path.display(), "Loading config file");
                builder.add_source(File::from(path).required(true))
            }
            None => builder.add_source(File::with_name(DEFAULT_CONFIG_FILE).required(false)),
        };

        let settings = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        Ok(settings)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerSettings {
                name: DEFAULT_SERVER_NAME.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            godot: GodotSettings::default(),
            logging: LoggingSettings {
                level: "info".to_string(),
            },
        }
    }
}

impl Default for GodotSettings {
    fn default() -> Self {
        Self {
            url: DEFAULT_GODOT_URL.to_string(),
            command_timeout_ms: DEFAULT_COMMAND_TIMEOUT_MS,
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay_ms: DEFAULT_RETRY_DELAY_MS,
            subprotocol: DEFAULT_SUBPROTOCOL.to_string(),
        }
    }
}

impl GodotSettings {
    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.command_timeout_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn subprotocol(&self) -> Option<&str> {
        let protocol = self.subprotocol.trim();
        (!protocol.is_empty()).then_some(protocol)
    }
}
