//! Text formatting for editor replies

use serde_json::Value;
use std::fmt::Write;

/// Number of entries shown before a listing is truncated
pub const PREVIEW_LIMIT: usize = 10;

/// String field of a JSON object, if present
pub fn str_field<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value.get(key).and_then(Value::as_str)
}

/// String array field; non-string entries are skipped
pub fn string_list(value: &Value, key: &str) -> Vec<String> {
    value
        .get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str().map(String::from))
                .collect()
        })
        .unwrap_or_default()
}

/// Compact JSON rendering of a value, strings quoted
pub fn json_inline(value: &Value) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| value.to_string())
}

/// Bulleted preview of the first entries of a listing.
///
/// `total` may exceed `items.len()` when the editor reports a count for a
/// truncated list.
pub fn preview_list(noun: &str, total: usize, items: &[String]) -> String {
    let shown: Vec<&str> = items.iter().take(PREVIEW_LIMIT).map(String::as_str).collect();
    let mut out = format!("First {} {}:\n- {}", shown.len(), noun, shown.join("\n- "));

    if total > shown.len() {
        let _ = write!(out, "\n\n({} more not shown)", total - shown.len());
    }
    out
}

/// `major.minor.patch` from the editor's version dictionary
pub fn godot_version(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Object(_) => {
            let part = |key: &str| {
                value
                    .get(key)
                    .map(|v| match v {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .unwrap_or_else(|| "0".to_string())
            };
            format!("{}.{}.{}", part("major"), part("minor"), part("patch"))
        }
        _ => "unknown".to_string(),
    }
}

/// Indented `name (type)` rendering of a scene tree node and its children
pub fn scene_tree(node: &Value) -> String {
    let mut out = String::new();
    write_tree_node(&mut out, node, 0);
    out.truncate(out.trim_end().len());
    out
}

fn write_tree_node(out: &mut String, node: &Value, depth: usize) {
    let name = str_field(node, "name").unwrap_or("?");
    let node_type = str_field(node, "type").unwrap_or("Node");
    let _ = write!(out, "{}{} ({})", "  ".repeat(depth), name, node_type);

    if let Some(script) = str_field(node, "script").filter(|s| !s.is_empty()) {
        let _ = write!(out, " [script: {}]", script);
    }
    out.push('\n');

    if let Some(children) = node.get("children").and_then(Value::as_array) {
        for child in children {
            write_tree_node(out, child, depth + 1);
        }
    }
}
