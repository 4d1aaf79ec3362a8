//! Pipeline configuration definition.
//!
//! A configuration names a root subtree to work on, an ordered pipeline of
//! operations, and an output template assembled from `$root` / `$working`
//! references. The executor reads the raw JSON form leniently; this typed
//! form is for callers that want strict decoding and round-tripping.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// A complete pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Configuration version tag (string or integer).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<Value>,

    /// Human-readable description. Ignored by the executor.
    #[serde(default)]
    pub description: String,

    /// Root subtree selection. Missing means "work on the whole input".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<RootConfig>,

    /// Ordered operation records.
    pub pipeline: Vec<Value>,

    /// Output template. Missing means "return the working value".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
}

/// Root subtree selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RootConfig {
    /// Path to the subtree the pipeline works on (default: whole input).
    #[serde(default)]
    pub path: String,

    /// What to use when the path resolves to null.
    #[serde(default)]
    pub on_null: OnNull,
}

/// Fallback when root resolution yields null.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnNull {
    /// Work on an empty object.
    #[default]
    ReturnEmpty,
    /// Work on the whole original input.
    ReturnOriginal,
}

impl PipelineConfig {
    /// Create an empty configuration (identity pipeline).
    pub fn new() -> Self {
        Self {
            version: None,
            description: String::new(),
            root: None,
            pipeline: Vec::new(),
            output: None,
        }
    }

    /// Parse a configuration from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Parse a configuration from a JSON value.
    pub fn from_value(value: &Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value.clone())
    }

    /// Serialize to a pretty JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// The raw JSON form the executor consumes.
    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl RootConfig {
    /// Lenient read of a raw `root` value: missing or wrongly-typed fields
    /// collapse to their defaults instead of failing.
    pub fn from_value_lenient(value: &Value) -> Self {
        let path = value
            .get("path")
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string();
        let on_null = match value.get("on_null").and_then(Value::as_str) {
            Some("return_original") => OnNull::ReturnOriginal,
            _ => OnNull::ReturnEmpty,
        };
        Self { path, on_null }
    }
}

/// Generate a worked example configuration for documentation and the CLI.
pub fn example_config() -> PipelineConfig {
    PipelineConfig {
        version: Some(json!("1.0")),
        description: "Normalize a user-event payload".to_string(),
        root: Some(RootConfig {
            path: "payload".to_string(),
            on_null: OnNull::ReturnOriginal,
        }),
        pipeline: vec![
            json!({"op": "rename", "mapping": {"events[].user_id": "events[].userId"}}),
            json!({"op": "list_to_map", "path": "events[].settings",
                   "key_from": "key", "value_from": "value"}),
            json!({"op": "transform", "path": "events[].userId", "function": "string"}),
            json!({"op": "parse_date", "path": "events[].at"}),
            json!({"op": "date_diff", "from_path": "window.start", "to_path": "window.end",
                   "result_path": "window.days", "unit": "days"}),
            json!({"op": "drop", "paths": ["window.start", "window.end"]}),
            json!({"op": "prune", "strategy": "empty_values"}),
        ],
        output: Some(json!({
            "events": "$working.events",
            "window": "$working.window",
            "source": "$root.meta.source"
        })),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_config_roundtrip() {
        let config = example_config();
        let json = config.to_json().unwrap();
        let parsed = PipelineConfig::from_json(&json).unwrap();
        assert_eq!(parsed.version, config.version);
        assert_eq!(parsed.pipeline.len(), config.pipeline.len());
        assert_eq!(parsed.output, config.output);
    }

    #[test]
    fn test_pipeline_is_required() {
        assert!(PipelineConfig::from_json(r#"{"version": "1.0"}"#).is_err());
        assert!(PipelineConfig::from_json(r#"{"pipeline": []}"#).is_ok());
    }

    #[test]
    fn test_root_defaults() {
        let config = PipelineConfig::from_json(r#"{"pipeline": [], "root": {}}"#).unwrap();
        let root = config.root.unwrap();
        assert_eq!(root.path, "");
        assert_eq!(root.on_null, OnNull::ReturnEmpty);
    }

    #[test]
    fn test_root_lenient_read() {
        let root = RootConfig::from_value_lenient(&json!({"path": "d", "on_null": "return_original"}));
        assert_eq!(root.path, "d");
        assert_eq!(root.on_null, OnNull::ReturnOriginal);

        let sloppy = RootConfig::from_value_lenient(&json!({"path": 42, "on_null": "explode"}));
        assert_eq!(sloppy.path, "");
        assert_eq!(sloppy.on_null, OnNull::ReturnEmpty);
    }
}
