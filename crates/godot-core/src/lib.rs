//! Core types shared by the Godot MCP bridge crates
//!
//! # Modules
//!
//! - `config`: Layered settings (defaults, TOML file, environment)
//! - `error`: Error type and Result alias

pub mod config;
pub mod error;

// Re-exports
pub use config::{GodotSettings, LoggingSettings, ServerSettings, Settings};
pub use error::{Error, Result};
