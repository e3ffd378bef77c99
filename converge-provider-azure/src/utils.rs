//! Utility functions for value normalization and conversion

use std::collections::HashMap;

use converge_core::resource::Value;
use serde_json::json;

/// Normalize a location (e.g., "West Europe" -> "westeurope")
pub fn normalize_location(s: &str) -> String {
    s.replace(' ', "").to_lowercase()
}

/// Build the ARM tags object from a DSL tag map
pub fn expand_tags(tags: Option<&Value>) -> serde_json::Value {
    let mut out = serde_json::Map::new();
    if let Some(Value::Map(tags)) = tags {
        for (key, value) in tags {
            if let Value::String(v) = value {
                out.insert(key.clone(), json!(v));
            }
        }
    }
    serde_json::Value::Object(out)
}

/// Parse an ARM tags object into a DSL tag map
pub fn flatten_tags(tags: Option<&serde_json::Value>) -> HashMap<String, Value> {
    let mut out = HashMap::new();
    if let Some(serde_json::Value::Object(tags)) = tags {
        for (key, value) in tags {
            if let Some(v) = value.as_str() {
                out.insert(key.clone(), Value::String(v.to_string()));
            }
        }
    }
    out
}

/// Read a string field at a JSON pointer path (e.g., "/properties/serviceBusEndpoint")
pub fn string_at(body: &serde_json::Value, pointer: &str) -> Option<String> {
    body.pointer(pointer)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
}
