//! Pipeline operations.
//!
//! One variant per operator kind, decoded from its JSON record by the
//! `op` tag. Every operation is a pure function from the working value to
//! a new working value: handlers read, transform, and write subtrees
//! through the path primitives, and anything that does not line up
//! (wrong shapes, unparseable values, unknown function names) leaves the
//! working value unchanged rather than failing the pipeline.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::collections::HashMap;

use super::dates;
use super::sigil::{self, ShapeSigil};
use crate::path::{self, Segment};

/// Maximum data depth followed by recursive whole-tree passes.
const MAX_DEPTH: usize = 1024;

/// All available pipeline operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    /// Delete each listed path, in order.
    Drop { paths: Vec<String> },

    /// Rebuild the subtree at `path` from a mapping of new key to source
    /// path, read against that subtree (elementwise if it is an array).
    Project {
        path: String,
        mapping: HashMap<String, String>,
    },

    /// Apply a projection to the whole working value, replacing it.
    ProjectAndReplace { projection: HashMap<String, String> },

    /// Move values between diverging path suffixes; shared path prefixes
    /// (including wildcards) are honored pointwise.
    Rename { mapping: HashMap<String, String> },

    /// Merge a nested object up into its parent (right wins).
    HoistMapValues {
        path: String,
        child_key: String,
        #[serde(default)]
        replace_parent: bool,
    },

    /// Replace the array at `path` with an object keyed by each item's
    /// `key_from` string, valued by its `value_from`. Last key wins.
    ListToMap {
        path: String,
        key_from: String,
        value_from: String,
    },

    /// As `list_to_map`, but items are grouped: each key holds the array
    /// of values that carried it.
    ListToDynamicMap {
        path: String,
        key_from: String,
        value_from: String,
    },

    /// Fold the array under `child_list` into keys merged directly into
    /// the parent object at `path`.
    PromoteListToKeys {
        path: String,
        child_list: String,
        key_from: String,
        value_from: String,
    },

    /// Replace the array at `path` with an object computed from `shape`
    /// ($length / $slice / $map_slice sigils; other leaves are literals).
    /// `max_size` is accepted for compatibility; the slice sigils carry
    /// their own bounds.
    TruncateList {
        path: String,
        max_size: i64,
        shape: Map<String, Value>,
    },

    /// Replace the array at `path` with an object computed from `shape`
    /// ($min / $max sigils; other leaves are literals).
    AggregateList {
        path: String,
        shape: Map<String, Value>,
    },

    /// Recursively remove empty values (`null`, `""`, `{}`, `[]`).
    /// Only the `empty_values` strategy is implemented; any other
    /// strategy name is identity.
    Prune { strategy: String },

    /// Write a value at `path`. A string value starting with `$path:`
    /// reads from that source path instead of being taken literally.
    Set { path: String, value: Value },

    /// Copy `from` to `to`. Paths sharing the same leading `name[]` pair
    /// copy array-aligned (element i to element i); otherwise the read is
    /// lifted and the write broadcast.
    Copy { from: String, to: String },

    /// Copy, then delete `from`.
    Move { from: String, to: String },

    /// Apply a named value function at `path` (see the module docs of the
    /// crate for the function table).
    Transform {
        path: String,
        function: String,
        #[serde(default)]
        args: Vec<Value>,
    },

    /// Write the current clock reading at `path`.
    CurrentTimestamp {
        path: String,
        #[serde(default = "default_date_format")]
        format: String,
        #[serde(default = "default_timezone")]
        timezone: String,
    },

    /// Re-emit the date at `path` in the named format.
    FormatDate { path: String, format: String },

    /// Canonicalize the date at `path`.
    ParseDate {
        path: String,
        #[serde(default = "default_date_format")]
        output_format: String,
    },

    /// Shift the date at `path` by `amount` units (may be negative).
    DateAdd {
        path: String,
        amount: i64,
        unit: String,
        #[serde(default = "default_date_format")]
        output_format: String,
    },

    /// Write `to_path - from_path` in the requested unit at `result_path`.
    DateDiff {
        from_path: String,
        to_path: String,
        result_path: String,
        #[serde(default = "default_diff_unit")]
        unit: String,
    },
}

fn default_date_format() -> String {
    "iso8601".to_string()
}

fn default_timezone() -> String {
    "UTC".to_string()
}

fn default_diff_unit() -> String {
    "days".to_string()
}

impl Operation {
    /// Apply this operation to the working value.
    pub fn apply(&self, working: &Value) -> Value {
        match self {
            Operation::Drop { paths } => self.apply_drop(working, paths),
            Operation::Project { path, mapping } => self.apply_project(working, path, mapping),
            Operation::ProjectAndReplace { projection } => {
                project_value(working, projection).unwrap_or_else(|| working.clone())
            }
            Operation::Rename { mapping } => self.apply_rename(working, mapping),
            Operation::HoistMapValues {
                path,
                child_key,
                replace_parent,
            } => self.apply_hoist(working, path, child_key, *replace_parent),
            Operation::ListToMap {
                path,
                key_from,
                value_from,
            } => self.apply_list_to_map(working, path, key_from, value_from),
            Operation::ListToDynamicMap {
                path,
                key_from,
                value_from,
            } => self.apply_list_to_dynamic_map(working, path, key_from, value_from),
            Operation::PromoteListToKeys {
                path,
                child_list,
                key_from,
                value_from,
            } => self.apply_promote(working, path, child_list, key_from, value_from),
            Operation::TruncateList { path, shape, .. } => {
                self.apply_truncate(working, path, shape)
            }
            Operation::AggregateList { path, shape } => {
                self.apply_aggregate(working, path, shape)
            }
            Operation::Prune { strategy } => self.apply_prune(working, strategy),
            Operation::Set { path, value } => self.apply_set(working, path, value),
            Operation::Copy { from, to } => {
                copy_between(working, &path::parse(from), &path::parse(to))
            }
            Operation::Move { from, to } => self.apply_move(working, from, to),
            Operation::Transform {
                path,
                function,
                args,
            } => self.apply_transform(working, path, function, args),
            Operation::CurrentTimestamp {
                path,
                format,
                timezone,
            } => self.apply_current_timestamp(working, path, format, timezone),
            Operation::FormatDate { path, format } => {
                self.apply_reformat(working, path, format)
            }
            Operation::ParseDate {
                path,
                output_format,
            } => self.apply_reformat(working, path, output_format),
            Operation::DateAdd {
                path,
                amount,
                unit,
                output_format,
            } => self.apply_date_add(working, path, *amount, unit, output_format),
            Operation::DateDiff {
                from_path,
                to_path,
                result_path,
                unit,
            } => self.apply_date_diff(working, from_path, to_path, result_path, unit),
        }
    }

    // -- restructuring --------------------------------------------------------

    fn apply_drop(&self, working: &Value, paths: &[String]) -> Value {
        paths.iter().fold(working.clone(), |acc, p| {
            path::delete(&acc, &path::parse(p))
        })
    }

    fn apply_project(
        &self,
        working: &Value,
        target: &str,
        mapping: &HashMap<String, String>,
    ) -> Value {
        path::update(working, &path::parse(target), &|subtree| {
            project_value(subtree, mapping)
        })
    }

    fn apply_rename(&self, working: &Value, mapping: &HashMap<String, String>) -> Value {
        let mut out = working.clone();
        for (from, to) in mapping {
            out = rename_one(&out, &path::parse(from), &path::parse(to));
        }
        out
    }

    fn apply_hoist(
        &self,
        working: &Value,
        target: &str,
        child_key: &str,
        replace_parent: bool,
    ) -> Value {
        if !replace_parent {
            // The non-replacing form is accepted but does nothing.
            return working.clone();
        }
        path::update(working, &path::parse(target), &|node| {
            let parent = node.as_object()?;
            let child = parent.get(child_key)?.as_object()?.clone();
            let mut merged = parent.clone();
            merged.remove(child_key);
            for (k, v) in child {
                merged.insert(k, v);
            }
            Some(Value::Object(merged))
        })
    }

    // -- list shaping ---------------------------------------------------------

    fn apply_list_to_map(
        &self,
        working: &Value,
        target: &str,
        key_from: &str,
        value_from: &str,
    ) -> Value {
        path::update(working, &path::parse(target), &|node| {
            let items = node.as_array()?;
            Some(Value::Object(fold_list_to_map(items, key_from, value_from)))
        })
    }

    fn apply_list_to_dynamic_map(
        &self,
        working: &Value,
        target: &str,
        key_from: &str,
        value_from: &str,
    ) -> Value {
        path::update(working, &path::parse(target), &|node| {
            let items = node.as_array()?;
            let mut out = Map::new();
            for item in items {
                let Some(obj) = item.as_object() else { continue };
                let Some(key) = obj.get(key_from).and_then(Value::as_str) else {
                    continue;
                };
                let value = obj.get(value_from).cloned().unwrap_or(Value::Null);
                match out.entry(key.to_string()).or_insert_with(|| Value::Array(Vec::new())) {
                    Value::Array(bucket) => bucket.push(value),
                    _ => {}
                }
            }
            Some(Value::Object(out))
        })
    }

    fn apply_promote(
        &self,
        working: &Value,
        target: &str,
        child_list: &str,
        key_from: &str,
        value_from: &str,
    ) -> Value {
        path::update(working, &path::parse(target), &|node| {
            let parent = node.as_object()?;
            let items = parent.get(child_list)?.as_array()?;
            let folded = fold_list_to_map(items, key_from, value_from);
            let mut merged = parent.clone();
            merged.remove(child_list);
            for (k, v) in folded {
                merged.insert(k, v);
            }
            Some(Value::Object(merged))
        })
    }

    fn apply_truncate(&self, working: &Value, target: &str, shape: &Map<String, Value>) -> Value {
        path::update(working, &path::parse(target), &|node| {
            let items = node.as_array()?;
            let mut out = Map::new();
            for (key, leaf) in shape {
                out.insert(key.clone(), resolve_truncate_leaf(items, leaf));
            }
            Some(Value::Object(out))
        })
    }

    fn apply_aggregate(&self, working: &Value, target: &str, shape: &Map<String, Value>) -> Value {
        path::update(working, &path::parse(target), &|node| {
            let items = node.as_array()?;
            let mut out = Map::new();
            for (key, leaf) in shape {
                out.insert(key.clone(), resolve_aggregate_leaf(items, leaf));
            }
            Some(Value::Object(out))
        })
    }

    // -- cleanup --------------------------------------------------------------

    fn apply_prune(&self, working: &Value, strategy: &str) -> Value {
        match strategy {
            "empty_values" => prune_empty(working, 0),
            // Other strategy names (including "null_values") are identity.
            _ => working.clone(),
        }
    }

    // -- path plumbing --------------------------------------------------------

    fn apply_set(&self, working: &Value, target: &str, value: &Value) -> Value {
        let target_segs = path::parse(target);
        if let Some(source) = value.as_str().and_then(sigil::parse_path_sigil) {
            return copy_between(working, &path::parse(source), &target_segs);
        }
        path::put(working, &target_segs, value)
    }

    fn apply_move(&self, working: &Value, from: &str, to: &str) -> Value {
        let from_segs = path::parse(from);
        let copied = copy_between(working, &from_segs, &path::parse(to));
        path::delete(&copied, &from_segs)
    }

    // -- transforms -----------------------------------------------------------

    fn apply_transform(
        &self,
        working: &Value,
        target: &str,
        function: &str,
        args: &[Value],
    ) -> Value {
        path::update(working, &path::parse(target), &|v| {
            transform_value(v, function, args)
        })
    }

    // -- dates ----------------------------------------------------------------

    fn apply_current_timestamp(
        &self,
        working: &Value,
        target: &str,
        format: &str,
        timezone: &str,
    ) -> Value {
        match dates::now_formatted(format, timezone) {
            Some(now) => path::put(working, &path::parse(target), &now),
            None => working.clone(),
        }
    }

    fn apply_reformat(&self, working: &Value, target: &str, format: &str) -> Value {
        path::update(working, &path::parse(target), &|v| {
            let dt = dates::detect(v)?;
            dates::emit(&dt, format)
        })
    }

    fn apply_date_add(
        &self,
        working: &Value,
        target: &str,
        amount: i64,
        unit: &str,
        output_format: &str,
    ) -> Value {
        path::update(working, &path::parse(target), &|v| {
            let dt = dates::detect(v)?;
            let shifted = dates::add(&dt, amount, unit)?;
            dates::emit(&shifted, output_format)
        })
    }

    fn apply_date_diff(
        &self,
        working: &Value,
        from_path: &str,
        to_path: &str,
        result_path: &str,
        unit: &str,
    ) -> Value {
        let from = dates::detect(&path::get(working, &path::parse(from_path)));
        let to = dates::detect(&path::get(working, &path::parse(to_path)));
        let result = match (from, to) {
            (Some(from), Some(to)) => match dates::diff(&from, &to, unit) {
                Some(value) => value,
                None => return working.clone(),
            },
            // Parse failure writes Null at the destination.
            _ => Value::Null,
        };
        path::put(working, &path::parse(result_path), &result)
    }
}

// -- shared helpers -----------------------------------------------------------

/// Project a subtree: an object is rebuilt from the mapping, an array is
/// projected elementwise. Anything else declines.
fn project_value(subtree: &Value, mapping: &HashMap<String, String>) -> Option<Value> {
    match subtree {
        Value::Object(_) => Some(project_object(subtree, mapping)),
        Value::Array(items) => Some(Value::Array(
            items.iter().map(|item| project_object(item, mapping)).collect(),
        )),
        _ => None,
    }
}

fn project_object(source: &Value, mapping: &HashMap<String, String>) -> Value {
    let mut out = Map::new();
    for (new_key, source_path) in mapping {
        out.insert(new_key.clone(), path::get(source, &path::parse(source_path)));
    }
    Value::Object(out)
}

/// Move one value between diverging suffixes of a shared prefix.
///
/// The prefix is applied pointwise through wildcards; wildcards remaining
/// in either divergent suffix are a structural mismatch and decline. A
/// source that resolves to `Null` also declines, so renaming never
/// manufactures keys.
fn rename_one(value: &Value, from: &[Segment], to: &[Segment]) -> Value {
    let common = from
        .iter()
        .zip(to.iter())
        .take_while(|(a, b)| a == b)
        .count();
    let (from_rest, to_rest) = (&from[common..], &to[common..]);
    if from_rest.is_empty() || to_rest.is_empty() {
        return value.clone();
    }
    if path::has_wildcard(from_rest) || path::has_wildcard(to_rest) {
        return value.clone();
    }
    path::update(value, &from[..common], &|node| {
        let moved = path::get(node, from_rest);
        if moved.is_null() {
            return None;
        }
        Some(path::delete(&path::put(node, to_rest, &moved), from_rest))
    })
}

/// Fold list items `{key_from: k, value_from: v}` into `k -> v`.
/// Items without a string key are skipped; a missing value contributes
/// `Null`. Duplicate keys: last wins.
fn fold_list_to_map(items: &[Value], key_from: &str, value_from: &str) -> Map<String, Value> {
    let mut out = Map::new();
    for item in items {
        let Some(obj) = item.as_object() else { continue };
        let Some(key) = obj.get(key_from).and_then(Value::as_str) else {
            continue;
        };
        let value = obj.get(value_from).cloned().unwrap_or(Value::Null);
        out.insert(key.to_string(), value);
    }
    out
}

fn resolve_truncate_leaf(items: &[Value], leaf: &Value) -> Value {
    let Some(text) = leaf.as_str() else {
        return leaf.clone();
    };
    match sigil::parse_shape_sigil(text) {
        Some(ShapeSigil::Length) => Value::Number(items.len().into()),
        Some(ShapeSigil::Slice(from, to)) => {
            Value::Array(slice_inclusive(items, from, to).to_vec())
        }
        Some(ShapeSigil::MapSlice(from, to, source)) => {
            let segs = path::parse(&source);
            Value::Array(
                slice_inclusive(items, from, to)
                    .iter()
                    .map(|item| path::get(item, &segs))
                    .collect(),
            )
        }
        // $min/$max belong to aggregate_list; here they are literals.
        _ => leaf.clone(),
    }
}

fn resolve_aggregate_leaf(items: &[Value], leaf: &Value) -> Value {
    let Some(text) = leaf.as_str() else {
        return leaf.clone();
    };
    match sigil::parse_shape_sigil(text) {
        Some(ShapeSigil::Min(source)) => fold_extreme(items, &source, false),
        Some(ShapeSigil::Max(source)) => fold_extreme(items, &source, true),
        _ => leaf.clone(),
    }
}

fn slice_inclusive(items: &[Value], from: usize, to: usize) -> &[Value] {
    if from >= items.len() || to < from {
        return &[];
    }
    &items[from..=to.min(items.len() - 1)]
}

/// Smallest/largest value of `source` across items. Null items and null
/// reads are skipped. All-number candidates compare numerically; otherwise
/// only string candidates compete, lexicographically. Nothing comparable
/// yields `Null`.
fn fold_extreme(items: &[Value], source: &str, want_max: bool) -> Value {
    let segs = path::parse(source);
    let candidates: Vec<Value> = items
        .iter()
        .filter(|item| !item.is_null())
        .map(|item| path::get(item, &segs))
        .filter(|v| !v.is_null())
        .collect();

    if candidates.is_empty() {
        return Value::Null;
    }

    if candidates.iter().all(Value::is_number) {
        let mut best: Option<&Value> = None;
        for candidate in &candidates {
            let better = match best {
                None => true,
                Some(current) => {
                    let a = candidate.as_f64().unwrap_or(f64::NAN);
                    let b = current.as_f64().unwrap_or(f64::NAN);
                    if want_max { a > b } else { a < b }
                }
            };
            if better {
                best = Some(candidate);
            }
        }
        return best.cloned().unwrap_or(Value::Null);
    }

    let mut best: Option<&str> = None;
    for candidate in candidates.iter().filter_map(Value::as_str) {
        let better = match best {
            None => true,
            Some(current) => {
                if want_max { candidate > current } else { candidate < current }
            }
        };
        if better {
            best = Some(candidate);
        }
    }
    best.map(|s| Value::String(s.to_string())).unwrap_or(Value::Null)
}

fn prune_empty(value: &Value, depth: usize) -> Value {
    if depth >= MAX_DEPTH {
        return value.clone();
    }
    match value {
        Value::Object(map) => {
            let mut out = Map::new();
            for (k, v) in map {
                let pruned = prune_empty(v, depth + 1);
                if !is_empty(&pruned) {
                    out.insert(k.clone(), pruned);
                }
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|v| prune_empty(v, depth + 1))
                .filter(|v| !is_empty(v))
                .collect(),
        ),
        _ => value.clone(),
    }
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

/// The leading `Field(name), Wildcard` pair, when the path has one.
fn aligned_array_head(path: &[Segment]) -> Option<&str> {
    match path {
        [Segment::Field(name), Segment::Wildcard, ..] => Some(name),
        _ => None,
    }
}

/// The shared copy engine behind `set`/`copy`/`move`.
///
/// When both paths start with the same `name[]` pair the copy is
/// array-aligned: element i's source lands in element i. Otherwise the
/// source is read whole (lifting over any wildcard) and written via `put`
/// (broadcasting over any wildcard in the destination).
fn copy_between(working: &Value, from: &[Segment], to: &[Segment]) -> Value {
    match (aligned_array_head(from), aligned_array_head(to)) {
        (Some(a), Some(b)) if a == b => path::update(working, &from[..2], &|element| {
            Some(path::put(element, &to[2..], &path::get(element, &from[2..])))
        }),
        _ => {
            let value = path::get(working, from);
            path::put(working, to, &value)
        }
    }
}

// -- value functions ----------------------------------------------------------

/// Apply a named transform function. `None` means "leave unchanged":
/// unknown names, and inputs a function does not speak about.
fn transform_value(value: &Value, function: &str, args: &[Value]) -> Option<Value> {
    match function {
        "uppercase" => value.as_str().map(|s| Value::String(s.to_uppercase())),
        "lowercase" => value.as_str().map(|s| Value::String(s.to_lowercase())),
        "capitalize" => value.as_str().map(capitalize),
        "trim" => value.as_str().map(|s| Value::String(s.trim().to_string())),
        "reverse" => match value {
            Value::String(s) => Some(Value::String(s.chars().rev().collect())),
            Value::Array(items) => Some(Value::Array(items.iter().rev().cloned().collect())),
            _ => None,
        },
        "string" => Some(coerce_string(value)),
        "number" => Some(coerce_number(value)),
        "integer" => Some(coerce_integer(value)),
        "float" => Some(coerce_float(value)),
        "boolean" => Some(Value::Bool(is_truthy(value))),
        "length" => Some(length_of(value)),
        "split" => {
            let separator = arg_string(args, 0, " ");
            value.as_str().map(|s| {
                Value::Array(
                    s.split(separator.as_str())
                        .map(|part| Value::String(part.to_string()))
                        .collect(),
                )
            })
        }
        "join" => {
            let separator = arg_string(args, 0, " ");
            let items = value.as_array()?;
            let pieces: Option<Vec<String>> = items.iter().map(join_piece).collect();
            pieces.map(|p| Value::String(p.join(&separator)))
        }
        "abs" => match value {
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Some(Value::Number(i.checked_abs()?.into()))
                } else if n.is_u64() {
                    Some(value.clone())
                } else {
                    Number::from_f64(n.as_f64()?.abs()).map(Value::Number)
                }
            }
            _ => None,
        },
        "round" => {
            let places = args
                .first()
                .and_then(Value::as_i64)
                .unwrap_or(0)
                .clamp(0, 15);
            match value {
                Value::Number(n) if n.is_f64() => {
                    let factor = 10f64.powi(places as i32);
                    let rounded = (n.as_f64()? * factor).round() / factor;
                    Number::from_f64(rounded).map(Value::Number)
                }
                Value::Number(_) => Some(value.clone()),
                _ => None,
            }
        }
        _ => None,
    }
}

fn arg_string(args: &[Value], index: usize, default: &str) -> String {
    args.get(index)
        .and_then(Value::as_str)
        .unwrap_or(default)
        .to_string()
}

fn capitalize(s: &str) -> Value {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => Value::String(
            first
                .to_uppercase()
                .chain(chars.as_str().to_lowercase().chars())
                .collect(),
        ),
        None => Value::String(String::new()),
    }
}

/// Scalar-to-string coercion; arrays and objects pass through unchanged.
fn coerce_string(value: &Value) -> Value {
    match value {
        Value::Null => Value::String(String::new()),
        Value::Bool(b) => Value::String(b.to_string()),
        Value::Number(n) => Value::String(n.to_string()),
        Value::String(_) => value.clone(),
        _ => value.clone(),
    }
}

/// A full integer parse wins; otherwise a float parse. Non-parsable input
/// becomes `Null`.
fn coerce_number(value: &Value) -> Value {
    match value {
        Value::Number(_) => value.clone(),
        Value::String(s) => {
            let trimmed = s.trim();
            if let Ok(i) = trimmed.parse::<i64>() {
                return Value::Number(i.into());
            }
            trimmed
                .parse::<f64>()
                .ok()
                .filter(|f| f.is_finite())
                .and_then(Number::from_f64)
                .map(Value::Number)
                .unwrap_or(Value::Null)
        }
        _ => Value::Null,
    }
}

fn coerce_integer(value: &Value) -> Value {
    match value {
        Value::Number(n) => {
            if n.is_i64() || n.is_u64() {
                value.clone()
            } else {
                truncate_f64(n.as_f64().unwrap_or(f64::NAN))
            }
        }
        Value::String(s) => {
            let trimmed = s.trim();
            if let Ok(i) = trimmed.parse::<i64>() {
                return Value::Number(i.into());
            }
            match trimmed.parse::<f64>() {
                Ok(f) => truncate_f64(f),
                Err(_) => Value::Null,
            }
        }
        _ => Value::Null,
    }
}

fn truncate_f64(f: f64) -> Value {
    if f.is_finite() && f >= i64::MIN as f64 && f <= i64::MAX as f64 {
        Value::Number((f.trunc() as i64).into())
    } else {
        Value::Null
    }
}

fn coerce_float(value: &Value) -> Value {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed
        .filter(|f| f.is_finite())
        .and_then(Number::from_f64)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

/// Everything is truthy except `false`, `null`, `""`, numeric zero, and
/// the strings `"false"`, `"False"`, `"FALSE"`, `"0"`.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !matches!(s.as_str(), "" | "false" | "False" | "FALSE" | "0"),
        _ => true,
    }
}

fn length_of(value: &Value) -> Value {
    match value {
        Value::String(s) => Value::Number(s.chars().count().into()),
        Value::Array(items) => Value::Number(items.len().into()),
        Value::Object(map) => Value::Number(map.len().into()),
        _ => Value::Null,
    }
}

fn join_piece(value: &Value) -> Option<String> {
    match value {
        Value::Null => Some(String::new()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s.clone()),
        _ => None,
    }
}

/// Get a description of all available operations.
pub fn operations_description() -> String {
    r#"Available pipeline operations:

| Operation | Description | Parameters |
|-----------|-------------|------------|
| drop | Delete paths from the working value | paths: [path] |
| project | Rebuild the subtree at path from a key -> source-path mapping | path, mapping |
| project_and_replace | Project the whole working value | projection |
| rename | Move values between path suffixes | mapping: {from: to} |
| hoist_map_values | Merge a nested object into its parent | path, child_key, replace_parent |
| list_to_map | Fold an item list into a map | path, key_from, value_from |
| list_to_dynamic_map | Group an item list into a map of arrays | path, key_from, value_from |
| promote_list_to_keys | Fold a child list into its parent's keys | path, child_list, key_from, value_from |
| truncate_list | Summarize a list ($length, $slice, $map_slice) | path, max_size, shape |
| aggregate_list | Aggregate a list ($min, $max) | path, shape |
| prune | Remove empty values recursively | strategy: "empty_values" |
| set | Write a literal or $path: reference | path, value |
| copy | Copy a path (array-aligned or broadcast) | from, to |
| move | Copy, then delete the source | from, to |
| transform | Apply a value function | path, function, args |
| current_timestamp | Write the clock reading | path, format, timezone |
| format_date | Re-emit a date | path, format |
| parse_date | Canonicalize a date | path, output_format |
| date_add | Shift a date | path, amount, unit, output_format |
| date_diff | Difference between two dates | from_path, to_path, result_path, unit |

Paths are dot-separated; a `[]` suffix applies the rest of the path to
every array element. Date formats: iso8601, iso8601_basic, unix, unix_ms,
human, date_only, time_only. Transform functions: uppercase, lowercase,
capitalize, trim, reverse, string, number, integer, float, boolean,
length, split, join, abs, round.

Example operations in JSON:
[
  {"op": "rename", "mapping": {"events[].user_id": "events[].userId"}},
  {"op": "list_to_map", "path": "events[].cfg", "key_from": "k", "value_from": "v"},
  {"op": "set", "path": "meta.source", "value": "$path:origin.system"},
  {"op": "date_diff", "from_path": "start", "to_path": "end", "result_path": "days", "unit": "days"},
  {"op": "prune", "strategy": "empty_values"}
]"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn op(value: Value) -> Operation {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_drop() {
        let working = json!({"a": 1, "b": {"c": 2, "d": 3}});
        let out = op(json!({"op": "drop", "paths": ["a", "b.c"]})).apply(&working);
        assert_eq!(out, json!({"b": {"d": 3}}));
    }

    #[test]
    fn test_drop_is_idempotent() {
        let working = json!({"a": 1, "b": 2});
        let dropper = op(json!({"op": "drop", "paths": ["a"]}));
        let once = dropper.apply(&working);
        assert_eq!(dropper.apply(&once), once);
    }

    #[test]
    fn test_project_object() {
        let working = json!({"user": {"profile": {"first": "Ada"}, "id": 7}});
        let out = op(json!({
            "op": "project",
            "path": "user",
            "mapping": {"name": "profile.first", "ident": "id"}
        }))
        .apply(&working);
        assert_eq!(out, json!({"user": {"name": "Ada", "ident": 7}}));
    }

    #[test]
    fn test_project_array_elementwise() {
        let working = json!({"users": [{"a": {"b": 1}}, {"a": {"b": 2}}]});
        let out = op(json!({
            "op": "project",
            "path": "users",
            "mapping": {"v": "a.b"}
        }))
        .apply(&working);
        assert_eq!(out, json!({"users": [{"v": 1}, {"v": 2}]}));
    }

    #[test]
    fn test_project_and_replace() {
        let working = json!({"deep": {"x": 1}, "other": 2});
        let out = op(json!({
            "op": "project_and_replace",
            "projection": {"x": "deep.x"}
        }))
        .apply(&working);
        assert_eq!(out, json!({"x": 1}));
    }

    #[test]
    fn test_rename_plain() {
        let working = json!({"a": 1, "keep": true});
        let out = op(json!({"op": "rename", "mapping": {"a": "b"}})).apply(&working);
        assert_eq!(out, json!({"b": 1, "keep": true}));
    }

    #[test]
    fn test_rename_under_wildcard() {
        let working = json!({"events": [{"user_id": "1", "a": 1}, {"user_id": "2", "a": 2}]});
        let out = op(json!({
            "op": "rename",
            "mapping": {"events[].user_id": "events[].userId"}
        }))
        .apply(&working);
        assert_eq!(
            out,
            json!({"events": [{"userId": "1", "a": 1}, {"userId": "2", "a": 2}]})
        );
    }

    #[test]
    fn test_rename_missing_source_is_noop() {
        let working = json!({"a": 1});
        let out = op(json!({"op": "rename", "mapping": {"zzz": "b"}})).apply(&working);
        assert_eq!(out, working);
    }

    #[test]
    fn test_rename_mismatched_wildcards_is_noop() {
        let working = json!({"a": [{"x": 1}], "b": {}});
        let out = op(json!({"op": "rename", "mapping": {"a[].x": "b.x"}})).apply(&working);
        assert_eq!(out, working);
    }

    #[test]
    fn test_hoist_replace_parent() {
        let working = json!({"user": {"id": 1, "attrs": {"name": "Ada", "id": 9}}});
        let out = op(json!({
            "op": "hoist_map_values",
            "path": "user",
            "child_key": "attrs",
            "replace_parent": true
        }))
        .apply(&working);
        // Right-wins merge: the child's "id" shadows the parent's.
        assert_eq!(out, json!({"user": {"id": 9, "name": "Ada"}}));
    }

    #[test]
    fn test_hoist_without_replace_is_identity() {
        let working = json!({"user": {"id": 1, "attrs": {"name": "Ada"}}});
        let out = op(json!({
            "op": "hoist_map_values",
            "path": "user",
            "child_key": "attrs"
        }))
        .apply(&working);
        assert_eq!(out, working);
    }

    #[test]
    fn test_list_to_map_under_wildcard() {
        let working =
            json!({"events": [{"id": 1, "cfg": [{"k": "t", "v": "dark"}, {"k": "l", "v": "en"}]}]});
        let folded = op(json!({
            "op": "list_to_map",
            "path": "events[].cfg",
            "key_from": "k",
            "value_from": "v"
        }))
        .apply(&working);
        let out = op(json!({"op": "drop", "paths": ["events[].id"]})).apply(&folded);
        assert_eq!(out, json!({"events": [{"cfg": {"t": "dark", "l": "en"}}]}));
    }

    #[test]
    fn test_list_to_map_last_key_wins_and_skips() {
        let working = json!({"xs": [
            {"k": "a", "v": 1},
            {"k": "a", "v": 2},
            {"k": 5, "v": 3},
            "scalar",
            {"k": "b"}
        ]});
        let out = op(json!({
            "op": "list_to_map",
            "path": "xs",
            "key_from": "k",
            "value_from": "v"
        }))
        .apply(&working);
        assert_eq!(out, json!({"xs": {"a": 2, "b": null}}));
    }

    #[test]
    fn test_list_to_dynamic_map_groups() {
        let working = json!({"xs": [
            {"k": "a", "v": 1},
            {"k": "b", "v": 2},
            {"k": "a", "v": 3}
        ]});
        let out = op(json!({
            "op": "list_to_dynamic_map",
            "path": "xs",
            "key_from": "k",
            "value_from": "v"
        }))
        .apply(&working);
        assert_eq!(out, json!({"xs": {"a": [1, 3], "b": [2]}}));
    }

    #[test]
    fn test_promote_list_to_keys() {
        let working = json!({"user": {"name": "Ada", "tags": [
            {"k": "role", "v": "admin"},
            {"k": "team", "v": "core"}
        ]}});
        let out = op(json!({
            "op": "promote_list_to_keys",
            "path": "user",
            "child_list": "tags",
            "key_from": "k",
            "value_from": "v"
        }))
        .apply(&working);
        assert_eq!(
            out,
            json!({"user": {"name": "Ada", "role": "admin", "team": "core"}})
        );
    }

    #[test]
    fn test_truncate_list_sigils() {
        let working = json!({"xs": [{"id": 1}, {"id": 2}, {"id": 3}, {"id": 4}]});
        let out = op(json!({
            "op": "truncate_list",
            "path": "xs",
            "max_size": 2,
            "shape": {
                "count": "$length",
                "head": "$slice(0, 1)",
                "ids": "$map_slice(1, 2, id)",
                "note": "literal"
            }
        }))
        .apply(&working);
        assert_eq!(
            out,
            json!({"xs": {
                "count": 4,
                "head": [{"id": 1}, {"id": 2}],
                "ids": [2, 3],
                "note": "literal"
            }})
        );
    }

    #[test]
    fn test_truncate_list_non_array_is_noop() {
        let working = json!({"xs": {"not": "a list"}});
        let out = op(json!({
            "op": "truncate_list",
            "path": "xs",
            "max_size": 2,
            "shape": {"count": "$length"}
        }))
        .apply(&working);
        assert_eq!(out, working);
    }

    #[test]
    fn test_aggregate_list_numeric() {
        let working = json!({"xs": [{"p": 3}, null, {"p": 1}, {"p": 7}]});
        let out = op(json!({
            "op": "aggregate_list",
            "path": "xs",
            "shape": {"lo": "$min(p)", "hi": "$max(p)", "tag": "stats"}
        }))
        .apply(&working);
        assert_eq!(out, json!({"xs": {"lo": 1, "hi": 7, "tag": "stats"}}));
    }

    #[test]
    fn test_aggregate_list_strings_and_empty() {
        let working = json!({"xs": [{"n": "pear"}, {"n": "apple"}]});
        let out = op(json!({
            "op": "aggregate_list",
            "path": "xs",
            "shape": {"first": "$min(n)", "missing": "$min(zzz)"}
        }))
        .apply(&working);
        assert_eq!(out, json!({"xs": {"first": "apple", "missing": null}}));
    }

    #[test]
    fn test_prune_empty_values() {
        let working = json!({"a": "x", "b": "", "c": null, "d": {}, "e": {"k": "y", "m": ""}});
        let out = op(json!({"op": "prune", "strategy": "empty_values"})).apply(&working);
        assert_eq!(out, json!({"a": "x", "e": {"k": "y"}}));
    }

    #[test]
    fn test_prune_cascades_and_is_idempotent() {
        let working = json!({"a": {"b": {"c": null}}, "xs": [null, "", {}, 1]});
        let pruner = op(json!({"op": "prune", "strategy": "empty_values"}));
        let once = pruner.apply(&working);
        assert_eq!(once, json!({"xs": [1]}));
        assert_eq!(pruner.apply(&once), once);
    }

    #[test]
    fn test_prune_unknown_strategy_is_identity() {
        let working = json!({"a": null});
        let out = op(json!({"op": "prune", "strategy": "null_values"})).apply(&working);
        assert_eq!(out, working);
    }

    #[test]
    fn test_set_literal_broadcast() {
        let working = json!({"users": [{"n": 1}, {"n": 2}]});
        let out = op(json!({"op": "set", "path": "users[].active", "value": true}))
            .apply(&working);
        assert_eq!(
            out,
            json!({"users": [{"n": 1, "active": true}, {"n": 2, "active": true}]})
        );
    }

    #[test]
    fn test_set_path_reference_aligned() {
        let working = json!({"u": [{"n": "A"}, {"n": "B"}]});
        let out = op(json!({"op": "set", "path": "u[].d", "value": "$path:u[].n"}))
            .apply(&working);
        assert_eq!(out, json!({"u": [{"n": "A", "d": "A"}, {"n": "B", "d": "B"}]}));
    }

    #[test]
    fn test_copy_array_aligned() {
        let working = json!({"u": [{"n": "A"}, {"n": "B"}], "s": {}});
        let out = op(json!({"op": "copy", "from": "u[].n", "to": "u[].d"})).apply(&working);
        assert_eq!(
            out,
            json!({"u": [{"n": "A", "d": "A"}, {"n": "B", "d": "B"}], "s": {}})
        );
    }

    #[test]
    fn test_copy_lifts_across_subtrees() {
        let working = json!({"u": [{"n": "A"}, {"n": "B"}], "s": {}});
        let out = op(json!({"op": "copy", "from": "u[].n", "to": "s.names"})).apply(&working);
        assert_eq!(
            out,
            json!({"u": [{"n": "A"}, {"n": "B"}], "s": {"names": ["A", "B"]}})
        );
    }

    #[test]
    fn test_copy_preserves_source_equality() {
        let working = json!({"a": {"b": 42}});
        let out = op(json!({"op": "copy", "from": "a.b", "to": "c.d"})).apply(&working);
        assert_eq!(
            path::get(&out, &path::parse("a.b")),
            path::get(&out, &path::parse("c.d"))
        );
    }

    #[test]
    fn test_copy_missing_source_writes_null() {
        let working = json!({"a": 1});
        let out = op(json!({"op": "copy", "from": "zzz", "to": "dest"})).apply(&working);
        assert_eq!(out, json!({"a": 1, "dest": null}));
    }

    #[test]
    fn test_move() {
        let working = json!({"a": {"b": 42}});
        let out = op(json!({"op": "move", "from": "a.b", "to": "c"})).apply(&working);
        assert_eq!(out, json!({"a": {}, "c": 42}));
    }

    #[test]
    fn test_move_missing_source_removes_nothing() {
        let working = json!({"a": 1});
        let out = op(json!({"op": "move", "from": "zzz", "to": "dest"})).apply(&working);
        assert_eq!(out, json!({"a": 1, "dest": null}));
    }

    #[test]
    fn test_transform_string_functions() {
        let working = json!({"s": "  Hello World  "});
        let trimmed =
            op(json!({"op": "transform", "path": "s", "function": "trim"})).apply(&working);
        assert_eq!(trimmed, json!({"s": "Hello World"}));
        let upper = op(json!({"op": "transform", "path": "s", "function": "uppercase"}))
            .apply(&trimmed);
        assert_eq!(upper, json!({"s": "HELLO WORLD"}));
        let cap = op(json!({"op": "transform", "path": "s", "function": "capitalize"}))
            .apply(&upper);
        assert_eq!(cap, json!({"s": "Hello world"}));
    }

    #[test]
    fn test_transform_non_string_unchanged() {
        let working = json!({"n": 42});
        let out =
            op(json!({"op": "transform", "path": "n", "function": "uppercase"})).apply(&working);
        assert_eq!(out, working);
    }

    #[test]
    fn test_transform_reverse() {
        let s = op(json!({"op": "transform", "path": "v", "function": "reverse"}))
            .apply(&json!({"v": "abc"}));
        assert_eq!(s, json!({"v": "cba"}));
        let a = op(json!({"op": "transform", "path": "v", "function": "reverse"}))
            .apply(&json!({"v": [1, 2, 3]}));
        assert_eq!(a, json!({"v": [3, 2, 1]}));
    }

    #[test]
    fn test_transform_coercions() {
        let t = |func: &str, input: Value| {
            op(json!({"op": "transform", "path": "v", "function": func}))
                .apply(&json!({"v": input}))["v"]
                .clone()
        };
        assert_eq!(t("string", json!(42)), json!("42"));
        assert_eq!(t("string", json!(true)), json!("true"));
        assert_eq!(t("string", json!(null)), json!(""));
        assert_eq!(t("number", json!("5")), json!(5));
        assert_eq!(t("number", json!("3.5")), json!(3.5));
        assert_eq!(t("number", json!("nope")), json!(null));
        assert_eq!(t("integer", json!("7.9")), json!(7));
        assert_eq!(t("integer", json!(-2.9)), json!(-2));
        assert_eq!(t("float", json!(3)), json!(3.0));
        assert_eq!(t("boolean", json!("FALSE")), json!(false));
        assert_eq!(t("boolean", json!("yes")), json!(true));
        assert_eq!(t("boolean", json!(0)), json!(false));
        assert_eq!(t("length", json!("abc")), json!(3));
        assert_eq!(t("length", json!([1, 2])), json!(2));
        assert_eq!(t("length", json!(9)), json!(null));
        assert_eq!(t("abs", json!(-4)), json!(4));
    }

    #[test]
    fn test_transform_split_join_round() {
        let split = op(json!({
            "op": "transform", "path": "v", "function": "split", "args": [","]
        }))
        .apply(&json!({"v": "a,b,c"}));
        assert_eq!(split, json!({"v": ["a", "b", "c"]}));

        let joined = op(json!({
            "op": "transform", "path": "v", "function": "join", "args": ["-"]
        }))
        .apply(&json!({"v": ["a", 1, true]}));
        assert_eq!(joined, json!({"v": "a-1-true"}));

        let rounded = op(json!({
            "op": "transform", "path": "v", "function": "round", "args": [2]
        }))
        .apply(&json!({"v": 3.14159}));
        assert_eq!(rounded, json!({"v": 3.14}));
    }

    #[test]
    fn test_transform_coercion_on_absent_path_creates_it() {
        // The absent leaf reads as null, so coercions write their
        // null-coerced result, creating the path like a put.
        let out = op(json!({"op": "transform", "path": "x", "function": "string"}))
            .apply(&json!({}));
        assert_eq!(out, json!({"x": ""}));

        let nested = op(json!({"op": "transform", "path": "a.b", "function": "boolean"}))
            .apply(&json!({}));
        assert_eq!(nested, json!({"a": {"b": false}}));

        let numbered = op(json!({"op": "transform", "path": "n", "function": "number"}))
            .apply(&json!({}));
        assert_eq!(numbered, json!({"n": null}));
    }

    #[test]
    fn test_transform_string_function_on_absent_path_declines() {
        // String-only functions have nothing to say about a null leaf,
        // so nothing is written.
        let out = op(json!({"op": "transform", "path": "x", "function": "uppercase"}))
            .apply(&json!({}));
        assert_eq!(out, json!({}));
    }

    #[test]
    fn test_transform_unknown_function_is_identity() {
        let working = json!({"v": "x"});
        let out = op(json!({"op": "transform", "path": "v", "function": "frobnicate"}))
            .apply(&working);
        assert_eq!(out, working);
    }

    #[test]
    fn test_transform_under_wildcard() {
        let working = json!({"users": [{"n": "ada"}, {"n": "bob"}]});
        let out = op(json!({
            "op": "transform", "path": "users[].n", "function": "uppercase"
        }))
        .apply(&working);
        assert_eq!(out, json!({"users": [{"n": "ADA"}, {"n": "BOB"}]}));
    }

    #[test]
    fn test_format_date_and_unparseable() {
        let working = json!({"d": "2024-01-15T10:30:00Z", "bad": "yesterday"});
        let out = op(json!({"op": "format_date", "path": "d", "format": "date_only"}))
            .apply(&working);
        assert_eq!(out["d"], json!("2024-01-15"));
        let bad = op(json!({"op": "format_date", "path": "bad", "format": "date_only"}))
            .apply(&working);
        assert_eq!(bad["bad"], json!("yesterday"));
    }

    #[test]
    fn test_parse_date_canonicalizes() {
        let working = json!({"d": "1705314600"});
        let out = op(json!({"op": "parse_date", "path": "d"})).apply(&working);
        assert_eq!(out, json!({"d": "2024-01-15T10:30:00Z"}));
    }

    #[test]
    fn test_date_add_negative() {
        let working = json!({"d": "2024-01-15T10:00:00Z"});
        let out = op(json!({
            "op": "date_add", "path": "d", "amount": -1, "unit": "weeks"
        }))
        .apply(&working);
        assert_eq!(out, json!({"d": "2024-01-08T10:00:00Z"}));
    }

    #[test]
    fn test_date_diff_days() {
        let working = json!({"s": "2024-01-15T10:00:00Z", "e": "2024-01-20T10:00:00Z"});
        let out = op(json!({
            "op": "date_diff",
            "from_path": "s", "to_path": "e", "result_path": "days",
            "unit": "days"
        }))
        .apply(&working);
        assert_eq!(out["days"], json!(5.0));
    }

    #[test]
    fn test_date_diff_failure_writes_null() {
        let working = json!({"s": "garbage", "e": "2024-01-20T10:00:00Z"});
        let out = op(json!({
            "op": "date_diff",
            "from_path": "s", "to_path": "e", "result_path": "days"
        }))
        .apply(&working);
        assert_eq!(out["days"], json!(null));
    }

    #[test]
    fn test_current_timestamp_roundtrips() {
        let working = json!({});
        let out = op(json!({"op": "current_timestamp", "path": "now"})).apply(&working);
        assert!(dates::detect(&out["now"]).is_some());
        let unix = op(json!({
            "op": "current_timestamp", "path": "now", "format": "unix"
        }))
        .apply(&working);
        assert!(unix["now"].as_str().unwrap().len() == 10);
    }

    #[test]
    fn test_current_timestamp_then_format_is_stable() {
        let working = op(json!({"op": "current_timestamp", "path": "now"})).apply(&json!({}));
        let reformatted = op(json!({
            "op": "format_date", "path": "now", "format": "iso8601"
        }))
        .apply(&working);
        assert_eq!(reformatted, working);
    }

    #[test]
    fn test_unknown_op_fails_decode() {
        assert!(serde_json::from_value::<Operation>(json!({"op": "explode"})).is_err());
        assert!(serde_json::from_value::<Operation>(json!({"op": "drop", "paths": "x"})).is_err());
    }
}
