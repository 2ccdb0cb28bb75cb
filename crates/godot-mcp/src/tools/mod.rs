//! Tool catalog
//!
//! Every tool relays one editor command, except `create_script_template`
//! which renders locally.

pub mod asset;
pub mod editor;
pub mod enhanced;
pub mod node;
pub mod scene;
pub mod script;

use crate::tool_registry::ToolRegistry;
use godot_bridge::CommandSender;
use std::sync::Arc;
use tracing::info;

/// Register the whole catalog against one editor connection
pub async fn register_all(registry: &ToolRegistry, sender: Arc<dyn CommandSender>) -> usize {
    let mut count = 0;

    count += node::register_all(registry, &sender).await;
    count += script::register_all(registry, &sender).await;
    count += scene::register_all(registry, &sender).await;
    count += editor::register_all(registry, &sender).await;
    count += asset::register_all(registry, &sender).await;
    count += enhanced::register_all(registry, &sender).await;

    info!(count, "Registered Godot tools");
    count
}
