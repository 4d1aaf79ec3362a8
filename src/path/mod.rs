//! Dotted-path parsing and wildcard-aware traversal.
//!
//! Every operation in the DSL reads and writes subtrees through the four
//! primitives in this module, so the `[]` wildcard behaves identically
//! everywhere:
//!
//! - [`get`] lifts reads over arrays (`users[].name` returns an array of names)
//! - [`put`] broadcasts the written value into every element
//! - [`update`] applies a function pointwise at the path, creating
//!   intermediate objects like [`put`]
//! - [`delete`] removes a key, mapped over elements under `[]`
//!
//! # Path syntax
//!
//! Paths are dot-separated field names; a field suffixed with `[]` expands
//! into the field followed by the wildcard marker:
//!
//! ```text
//! users[].profile.name  →  [users, [], profile, name]
//! [].id                 →  [[], id]
//! ""                    →  []          (identity path)
//! a..b                  →  [a, b]      (empty segments dropped)
//! ```

use serde_json::{Map, Value};

/// One parsed path segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// An object key.
    Field(String),
    /// The `[]` marker: apply the rest of the path to every array element.
    Wildcard,
}

/// Parse a dotted path string into segments.
///
/// Empty segments (leading/trailing/doubled dots) are dropped, so `""` and
/// `"."` both yield the empty path, which denotes the current subtree.
pub fn parse(path: &str) -> Vec<Segment> {
    let mut segments = Vec::new();

    for part in path.split('.') {
        if part.is_empty() {
            continue;
        }
        if !part.contains("[]") {
            segments.push(Segment::Field(part.to_string()));
            continue;
        }
        // "users[]" → [users, []]; a bare "[]" is just the marker.
        let mut pieces = part.split("[]").peekable();
        while let Some(piece) = pieces.next() {
            if !piece.is_empty() {
                segments.push(Segment::Field(piece.to_string()));
            }
            if pieces.peek().is_some() {
                segments.push(Segment::Wildcard);
            }
        }
    }

    segments
}

/// True if the path contains the `[]` marker.
pub fn has_wildcard(path: &[Segment]) -> bool {
    path.iter().any(|s| matches!(s, Segment::Wildcard))
}

/// Read the value at `path`.
///
/// Missing keys and shape mismatches yield `Null`. Under `[]` the read is
/// lifted: the result is an array of the per-element reads.
pub fn get(value: &Value, path: &[Segment]) -> Value {
    match path.split_first() {
        None => value.clone(),
        Some((Segment::Field(key), rest)) => match value {
            Value::Object(map) => match map.get(key) {
                Some(child) => get(child, rest),
                None => Value::Null,
            },
            _ => Value::Null,
        },
        Some((Segment::Wildcard, rest)) => match value {
            Value::Array(items) => {
                Value::Array(items.iter().map(|item| get(item, rest)).collect())
            }
            _ => Value::Null,
        },
    }
}

/// Write `new_value` at `path`, creating empty objects along missing
/// intermediate keys.
///
/// Under `[]` the same value is broadcast into every element. Writing
/// through a non-object/non-array node leaves the surrounding value intact.
pub fn put(value: &Value, path: &[Segment], new_value: &Value) -> Value {
    match path.split_first() {
        None => new_value.clone(),
        Some((Segment::Field(key), rest)) => match value {
            Value::Object(map) => {
                let child = map
                    .get(key)
                    .cloned()
                    .unwrap_or_else(|| Value::Object(Map::new()));
                let mut out = map.clone();
                out.insert(key.clone(), put(&child, rest, new_value));
                Value::Object(out)
            }
            _ => value.clone(),
        },
        Some((Segment::Wildcard, rest)) => match value {
            Value::Array(items) => Value::Array(
                items.iter().map(|item| put(item, rest, new_value)).collect(),
            ),
            _ => value.clone(),
        },
    }
}

/// Apply `f` to the node(s) at `path`, creating empty objects along
/// missing intermediate keys the same way [`put`] does.
///
/// Under `[]` the function is applied pointwise to each element, never to
/// the array as a whole; an absent/wrong-typed array leaves the value
/// unchanged, as does applying through a non-object node. At an absent
/// leaf `f` sees `Null` (so `update(v, p, f)` agrees with
/// `put(v, p, f(get(v, p)))` on wildcard-free paths); `f` returning
/// `None` leaves the value unchanged and declines to create the leaf.
pub fn update<F>(value: &Value, path: &[Segment], f: &F) -> Value
where
    F: Fn(&Value) -> Option<Value>,
{
    match path.split_first() {
        None => f(value).unwrap_or_else(|| value.clone()),
        Some((Segment::Field(key), rest)) => match value {
            Value::Object(map) => {
                if rest.is_empty() {
                    let current = map.get(key).cloned().unwrap_or(Value::Null);
                    match f(&current) {
                        Some(new_child) => {
                            let mut out = map.clone();
                            out.insert(key.clone(), new_child);
                            Value::Object(out)
                        }
                        None => value.clone(),
                    }
                } else {
                    let child = map
                        .get(key)
                        .cloned()
                        .unwrap_or_else(|| Value::Object(Map::new()));
                    let mut out = map.clone();
                    out.insert(key.clone(), update(&child, rest, f));
                    Value::Object(out)
                }
            }
            _ => value.clone(),
        },
        Some((Segment::Wildcard, rest)) => match value {
            Value::Array(items) => {
                Value::Array(items.iter().map(|item| update(item, rest, f)).collect())
            }
            _ => value.clone(),
        },
    }
}

/// Remove the key at `path`. Deleting an absent key is a no-op; under `[]`
/// the delete is mapped over each element.
pub fn delete(value: &Value, path: &[Segment]) -> Value {
    match path.split_first() {
        None => value.clone(),
        Some((Segment::Field(key), rest)) => match value {
            Value::Object(map) => {
                if rest.is_empty() {
                    let mut out = map.clone();
                    out.remove(key);
                    Value::Object(out)
                } else if let Some(child) = map.get(key) {
                    let mut out = map.clone();
                    out.insert(key.clone(), delete(child, rest));
                    Value::Object(out)
                } else {
                    value.clone()
                }
            }
            _ => value.clone(),
        },
        Some((Segment::Wildcard, rest)) => match value {
            Value::Array(items) => {
                Value::Array(items.iter().map(|item| delete(item, rest)).collect())
            }
            _ => value.clone(),
        },
    }
}
