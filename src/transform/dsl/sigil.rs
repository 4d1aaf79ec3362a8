//! Sigil parsing for `shape` and `value` strings.
//!
//! A sigil is a string whose leading `$token(args)` form is resolved by an
//! operator instead of being taken literally:
//!
//! | Sigil | Recognized by |
//! |---|---|
//! | `$length` | `truncate_list` |
//! | `$slice(i, j)` | `truncate_list` |
//! | `$map_slice(i, j, path)` | `truncate_list` |
//! | `$min(path)` / `$max(path)` | `aggregate_list` |
//! | `$path:source_path` | `set` |
//!
//! Each operator matches only its own subset; any other string stays a
//! literal. The `$root`/`$working` output sigils are resolved by the
//! executor, not here.

use once_cell::sync::Lazy;
use regex::Regex;

/// A parsed shape sigil.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShapeSigil {
    /// `$length` - the array length.
    Length,
    /// `$slice(i, j)` - the sub-array of elements `i..j` (inclusive).
    Slice(usize, usize),
    /// `$map_slice(i, j, path)` - elements `i..j` mapped through `path`.
    MapSlice(usize, usize, String),
    /// `$min(path)` - smallest value of `path` across items.
    Min(String),
    /// `$max(path)` - largest value of `path` across items.
    Max(String),
}

static SLICE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\$slice\(\s*(\d+)\s*,\s*(\d+)\s*\)$").unwrap());

static MAP_SLICE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\$map_slice\(\s*(\d+)\s*,\s*(\d+)\s*,\s*([^)]*?)\s*\)$").unwrap());

static MIN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\$min\(\s*([^)]*?)\s*\)$").unwrap());

static MAX_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\$max\(\s*([^)]*?)\s*\)$").unwrap());

/// Prefix marking a `set` value as a source-path reference.
pub const PATH_PREFIX: &str = "$path:";

/// Parse a shape leaf into a sigil, or `None` if it is a literal.
pub fn parse_shape_sigil(text: &str) -> Option<ShapeSigil> {
    if text == "$length" {
        return Some(ShapeSigil::Length);
    }
    if let Some(caps) = SLICE_RE.captures(text) {
        let from = caps[1].parse().ok()?;
        let to = caps[2].parse().ok()?;
        return Some(ShapeSigil::Slice(from, to));
    }
    if let Some(caps) = MAP_SLICE_RE.captures(text) {
        let from = caps[1].parse().ok()?;
        let to = caps[2].parse().ok()?;
        return Some(ShapeSigil::MapSlice(from, to, caps[3].to_string()));
    }
    if let Some(caps) = MIN_RE.captures(text) {
        return Some(ShapeSigil::Min(caps[1].to_string()));
    }
    if let Some(caps) = MAX_RE.captures(text) {
        return Some(ShapeSigil::Max(caps[1].to_string()));
    }
    None
}

/// Extract the source path from a `$path:` value string, if present.
pub fn parse_path_sigil(text: &str) -> Option<&str> {
    text.strip_prefix(PATH_PREFIX)
}
