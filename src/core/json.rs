//! Helpers for reading loosely structured JSON out of model responses.

use regex::Regex;
use serde_json::{Map, Value};
use std::sync::OnceLock;

fn fence_open() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^```(?:json|JSON)?[ \t]*\n?").expect("valid fence pattern"))
}

fn fence_close() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n?```\s*$").expect("valid fence pattern"))
}

/// Parses a model response as a JSON object, removing Markdown code fences.
/// Anything that is not a JSON object yields an empty map.
pub fn extract_json(text: &str) -> Map<String, Value> {
    let mut text = text.trim().to_string();
    if text.starts_with("```") {
        text = fence_open().replace(&text, "").into_owned();
        text = fence_close().replace(&text, "").into_owned();
    }

    match serde_json::from_str::<Value>(&text) {
        Ok(Value::Object(map)) => map,
        Ok(other) => {
            tracing::warn!("Model returned JSON that is not an object: {}", other);
            Map::new()
        }
        Err(e) => {
            tracing::error!("Failed to parse JSON: {}\nText: {}", e, text);
            Map::new()
        }
    }
}

/// Non-empty string field.
pub fn get_str(map: &Map<String, Value>, key: &str) -> Option<String> {
    map.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// String list field; a lone string counts as a one-element list.
pub fn get_str_list(map: &Map<String, Value>, key: &str) -> Option<Vec<String>> {
    match map.get(key)? {
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        ),
        Value::String(s) if !s.trim().is_empty() => Some(vec![s.trim().to_string()]),
        _ => None,
    }
}

/// Non-negative integer field; numeric strings such as `"2"` are accepted.
pub fn get_index(value: &Value) -> Option<usize> {
    match value {
        Value::Number(n) => n.as_u64().map(|n| n as usize),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
