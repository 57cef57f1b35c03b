//! Configuration loading: JSON + environment-variable layering.
//!
//! Mirrors the teacher's `config::loader::load` precedence and merge
//! strategy (deep-merge JSON objects, scalar env overrides win last),
//! narrowed to the sources this server actually needs.

use super::Config;
use serde_json::Value;
use std::env;
use std::path::{Path, PathBuf};

/// Load configuration. Never fails: malformed sources are logged to
/// stderr and skipped, falling back to defaults for the fields they
/// would have set.
#[must_use]
pub fn load() -> Config {
    let defaults = Config::default();
    let mut merged =
        serde_json::to_value(&defaults).unwrap_or_else(|_| Value::Object(serde_json::Map::new()));

    if let Ok(json) = env::var("RIFT_SIGNAL_CONFIG_JSON") {
        if let Some(value) = parse_json_document(&json, "RIFT_SIGNAL_CONFIG_JSON") {
            merge_values(&mut merged, value);
        }
    }

    if let Ok(path) = env::var("RIFT_SIGNAL_CONFIG_PATH") {
        merge_file_source(&mut merged, &PathBuf::from(path));
    }

    merge_file_source(&mut merged, &PathBuf::from("config.json"));

    apply_env_overrides(&mut merged);

    match serde_json::from_value::<Config>(merged) {
        Ok(cfg) => cfg,
        Err(err) => {
            eprintln!("Failed to deserialize config; using defaults: {err}");
            defaults
        }
    }
}

fn parse_json_document(raw: &str, label: &str) -> Option<Value> {
    if raw.trim().is_empty() {
        return None;
    }
    match serde_json::from_str(raw) {
        Ok(value) => Some(value),
        Err(err) => {
            eprintln!("Failed to parse config from {label}: {err}");
            None
        }
    }
}

fn merge_file_source(target: &mut Value, path: &Path) {
    if path.as_os_str().is_empty() || !path.exists() {
        return;
    }
    match std::fs::read_to_string(path) {
        Ok(contents) => {
            if let Some(value) =
                parse_json_document(&contents, &format!("file {}", path.display()))
            {
                merge_values(target, value);
            }
        }
        Err(err) => eprintln!("Failed to read config from {}: {}", path.display(), err),
    }
}

fn merge_values(target: &mut Value, source: Value) {
    match (target, source) {
        (Value::Object(target_map), Value::Object(source_map)) => {
            for (key, value) in source_map {
                match target_map.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        target_map.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

fn apply_env_overrides(root: &mut Value) {
    for (key, raw_value) in env::vars() {
        let Some(stripped) = key.strip_prefix("RIFT_SIGNAL__") else {
            continue;
        };
        let segments: Vec<String> = stripped
            .split("__")
            .filter(|segment| !segment.is_empty())
            .map(str::to_ascii_lowercase)
            .collect();
        if segments.is_empty() {
            continue;
        }
        set_nested_value(root, &segments, parse_scalar(raw_value.trim()));
    }
}

fn parse_scalar(raw: &str) -> Value {
    if raw.is_empty() {
        return Value::String(String::new());
    }
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

fn set_nested_value(target: &mut Value, segments: &[String], value: Value) {
    if segments.len() == 1 {
        let map = ensure_object(target);
        map.insert(segments[0].clone(), value);
        return;
    }
    let map = ensure_object(target);
    let entry = map
        .entry(segments[0].clone())
        .or_insert_with(|| Value::Object(serde_json::Map::new()));
    set_nested_value(entry, &segments[1..], value);
}

fn ensure_object(value: &mut Value) -> &mut serde_json::Map<String, Value> {
    if !value.is_object() {
        *value = Value::Object(serde_json::Map::new());
    }
    value.as_object_mut().expect("value coerced to object above")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_prefers_source_scalars() {
        let mut target = serde_json::json!({"port": 1, "nested": {"a": 1, "b": 2}});
        let source = serde_json::json!({"port": 2, "nested": {"a": 9}});
        merge_values(&mut target, source);
        assert_eq!(target["port"], 2);
        assert_eq!(target["nested"]["a"], 9);
        assert_eq!(target["nested"]["b"], 2);
    }

    #[test]
    fn nested_env_override_sets_deep_field() {
        let mut root = serde_json::json!({"logging": {"format": "json"}});
        set_nested_value(&mut root, &["logging".into(), "format".into()], "text".into());
        assert_eq!(root["logging"]["format"], "text");
    }
}
