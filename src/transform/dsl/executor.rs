//! Pipeline executor.
//!
//! `execute` is a pure, total function of its two arguments: resolve the
//! root subtree, fold the pipeline over it, assemble the output template.
//! A malformed configuration never aborts the run; steps that cannot be
//! decoded or applied reduce to identity and the pipeline continues.

use serde_json::{Map, Value};

use super::config::{OnNull, RootConfig};
use super::operations::Operation;
use crate::path;

/// Maximum template depth followed by the output resolver.
const MAX_DEPTH: usize = 1024;

/// Execute a pipeline configuration against an input document.
///
/// # Arguments
/// * `input` - The original document; never mutated, always reachable in
///   the output template as `$root`.
/// * `config` - The raw JSON configuration (`root` / `pipeline` / `output`).
///
/// # Returns
/// The assembled output document.
pub fn execute(input: &Value, config: &Value) -> Value {
    let mut working = resolve_root(input, config.get("root"));

    if let Some(steps) = config.get("pipeline").and_then(Value::as_array) {
        for step in steps {
            working = apply_step(&working, step);
        }
    }

    resolve_output(config.get("output"), input, &working)
}

/// Select the working subtree from the `root` configuration.
///
/// Missing (or non-object) `root` config selects the whole input. A path
/// that resolves to null falls back according to `on_null`:
/// `return_original` reuses the input, anything else an empty object.
fn resolve_root(input: &Value, root: Option<&Value>) -> Value {
    let Some(root) = root.filter(|r| r.is_object()) else {
        return input.clone();
    };
    let cfg = RootConfig::from_value_lenient(root);
    let selected = path::get(input, &path::parse(&cfg.path));
    if selected.is_null() {
        match cfg.on_null {
            OnNull::ReturnOriginal => input.clone(),
            OnNull::ReturnEmpty => Value::Object(Map::new()),
        }
    } else {
        selected
    }
}

/// Decode and apply one pipeline step. Unknown `op` tags and records that
/// do not decode (missing or wrongly-typed parameters) are identity.
fn apply_step(working: &Value, step: &Value) -> Value {
    match serde_json::from_value::<Operation>(step.clone()) {
        Ok(operation) => operation.apply(working),
        Err(_) => working.clone(),
    }
}

/// Assemble the output. A missing template, or an empty object template,
/// returns the working value as-is.
fn resolve_output(template: Option<&Value>, root: &Value, working: &Value) -> Value {
    match template {
        None => working.clone(),
        Some(Value::Object(map)) if map.is_empty() => working.clone(),
        Some(template) => resolve_template(template, root, working, 0),
    }
}

/// Recursive template substitution. Strings are checked for the
/// `$root` / `$working` prefixes, object values are resolved; arrays and
/// primitives are literal.
fn resolve_template(template: &Value, root: &Value, working: &Value, depth: usize) -> Value {
    if depth >= MAX_DEPTH {
        return template.clone();
    }
    match template {
        Value::String(text) => resolve_reference(text, root, working),
        Value::Object(map) => {
            let mut out = Map::new();
            for (key, value) in map {
                out.insert(key.clone(), resolve_template(value, root, working, depth + 1));
            }
            Value::Object(out)
        }
        _ => template.clone(),
    }
}

/// Resolve one template string. The remainder after a `$root` / `$working`
/// prefix must be empty (the whole value) or start with `.` (a path into
/// it); anything else is a literal.
fn resolve_reference(text: &str, root: &Value, working: &Value) -> Value {
    for (prefix, source) in [("$root", root), ("$working", working)] {
        if let Some(rest) = text.strip_prefix(prefix) {
            if rest.is_empty() {
                return source.clone();
            }
            if let Some(suffix) = rest.strip_prefix('.') {
                return path::get(source, &path::parse(suffix));
            }
        }
    }
    Value::String(text.to_string())
}
