//! Configuration validation.
//!
//! The validator is a surface collaborator: it gives authors early,
//! precisely-located feedback on a configuration, while the executor stays
//! deliberately more permissive (it reduces anything malformed to identity
//! instead of rejecting it). The executor never calls the validator, so
//! everything that survives validation executes, but not vice versa.
//!
//! A rejection is a single string naming the first offending place, e.g.
//!
//! ```text
//! step 2 (rename): "mapping" must be an object of strings
//! ```

use serde_json::Value;

use crate::error::{ValidationError, ValidationResult};

/// Expected shape of one operation parameter.
#[derive(Debug, Clone, Copy)]
enum ParamKind {
    Str,
    StringList,
    StringMap,
    Object,
    List,
    Bool,
    Int,
    PositiveInt,
    Any,
}

impl ParamKind {
    fn matches(&self, value: &Value) -> bool {
        match self {
            ParamKind::Str => value.is_string(),
            ParamKind::StringList => value
                .as_array()
                .is_some_and(|items| items.iter().all(Value::is_string)),
            ParamKind::StringMap => value
                .as_object()
                .is_some_and(|map| map.values().all(Value::is_string)),
            ParamKind::Object => value.is_object(),
            ParamKind::List => value.is_array(),
            ParamKind::Bool => value.is_boolean(),
            ParamKind::Int => value.is_i64() || value.is_u64(),
            ParamKind::PositiveInt => value.as_i64().is_some_and(|n| n > 0),
            ParamKind::Any => true,
        }
    }

    fn describe(&self) -> &'static str {
        match self {
            ParamKind::Str => "a string",
            ParamKind::StringList => "a list of strings",
            ParamKind::StringMap => "an object of strings",
            ParamKind::Object => "an object",
            ParamKind::List => "a list",
            ParamKind::Bool => "a boolean",
            ParamKind::Int => "an integer",
            ParamKind::PositiveInt => "an integer greater than zero",
            ParamKind::Any => "present",
        }
    }
}

/// Validate a configuration document.
///
/// Checks: the config is an object; `pipeline` is present and a list;
/// `version` (when present) is a non-empty string or an integer; `root`
/// (when present) is well-shaped; every step is an object with a string
/// `op`; known operations carry their required, correctly-typed
/// parameters. The first offense wins.
pub fn validate(config: &Value) -> ValidationResult {
    let Some(obj) = config.as_object() else {
        return Err(ValidationError::new("configuration must be a JSON object"));
    };

    if let Some(version) = obj.get("version") {
        let ok = matches!(version, Value::String(s) if !s.is_empty())
            || version.is_i64()
            || version.is_u64();
        if !ok {
            return Err(ValidationError::new(
                "\"version\" must be a non-empty string or an integer",
            ));
        }
    }

    let Some(pipeline) = obj.get("pipeline") else {
        return Err(ValidationError::new("missing \"pipeline\" list"));
    };
    let Some(steps) = pipeline.as_array() else {
        return Err(ValidationError::new("\"pipeline\" must be a list"));
    };

    if let Some(root) = obj.get("root") {
        validate_root(root)?;
    }

    for (index, step) in steps.iter().enumerate() {
        validate_step(index + 1, step)?;
    }

    Ok(())
}

/// True if the configuration validates.
pub fn is_valid(config: &Value) -> bool {
    validate(config).is_ok()
}

fn validate_root(root: &Value) -> ValidationResult {
    let Some(obj) = root.as_object() else {
        return Err(ValidationError::new("\"root\" must be an object"));
    };
    if let Some(path) = obj.get("path") {
        if !path.is_string() {
            return Err(ValidationError::new("root: \"path\" must be a string"));
        }
    }
    if let Some(on_null) = obj.get("on_null") {
        if !on_null.is_string() {
            return Err(ValidationError::new("root: \"on_null\" must be a string"));
        }
    }
    Ok(())
}

fn validate_step(index: usize, step: &Value) -> ValidationResult {
    let Some(obj) = step.as_object() else {
        return Err(ValidationError::new(format!(
            "step {index}: must be an object"
        )));
    };
    let Some(op) = obj.get("op").and_then(Value::as_str) else {
        return Err(ValidationError::new(format!(
            "step {index}: missing \"op\" string"
        )));
    };

    use ParamKind::*;
    let required: &[(&str, ParamKind)] = match op {
        "drop" => &[("paths", StringList)],
        "project" => &[("path", Str), ("mapping", StringMap)],
        "project_and_replace" => &[("projection", StringMap)],
        "rename" => &[("mapping", StringMap)],
        "hoist_map_values" => &[("path", Str), ("child_key", Str)],
        "list_to_map" | "list_to_dynamic_map" => {
            &[("path", Str), ("key_from", Str), ("value_from", Str)]
        }
        "promote_list_to_keys" => &[
            ("path", Str),
            ("child_list", Str),
            ("key_from", Str),
            ("value_from", Str),
        ],
        "truncate_list" => &[("path", Str), ("max_size", PositiveInt), ("shape", Object)],
        "aggregate_list" => &[("path", Str), ("shape", Object)],
        "prune" => &[("strategy", Str)],
        "set" => &[("path", Str), ("value", Any)],
        "transform" => &[("path", Str), ("function", Str)],
        "copy" | "move" => &[("from", Str), ("to", Str)],
        "current_timestamp" => &[("path", Str)],
        "format_date" => &[("path", Str), ("format", Str)],
        "parse_date" => &[("path", Str)],
        "date_add" => &[("path", Str), ("amount", Int), ("unit", Str)],
        "date_diff" => &[("from_path", Str), ("to_path", Str), ("result_path", Str)],
        // Unknown kinds execute as identity, so they validate as-is.
        _ => &[],
    };

    let optional: &[(&str, ParamKind)] = match op {
        "hoist_map_values" => &[("replace_parent", Bool)],
        "transform" => &[("args", List)],
        "current_timestamp" => &[("format", Str), ("timezone", Str)],
        "parse_date" | "date_add" => &[("output_format", Str)],
        "date_diff" => &[("unit", Str)],
        _ => &[],
    };

    for (name, kind) in required {
        match obj.get(*name) {
            Some(value) if kind.matches(value) => {}
            _ => {
                return Err(ValidationError::new(format!(
                    "step {index} ({op}): \"{name}\" must be {}",
                    kind.describe()
                )));
            }
        }
    }

    for (name, kind) in optional {
        if let Some(value) = obj.get(*name) {
            if !kind.matches(value) {
                return Err(ValidationError::new(format!(
                    "step {index} ({op}): \"{name}\" must be {}",
                    kind.describe()
                )));
            }
        }
    }

    Ok(())
}
