//! Dotted-path addressing into nested mappings and sequences.
//!
//! `a.b.c` walks the tree one key at a time; `a[0].b` is accepted as
//! `a.0.b`, and a numeric segment indexes a sequence. A path may contain a
//! single standalone `*` segment, which projects over a sequence:
//!
//! ```text
//! arr.*      every element of `arr`
//! arr.*.v    field `v` plucked from every element of `arr`
//! *.v        field `v` of every element of the root sequence
//! ```

use serde_json::{Map, Value};

use crate::{PathError, PathResult};

/// The sequence-projection segment.
pub const WILDCARD: &str = "*";

/// Anything a path can be resolved against.
///
/// Implemented for `Value` and for a bare `Map`, so a context's flat table
/// of published values can be addressed without wrapping it first.
pub trait PathRoot {
    /// The value stored under one path segment, if any.
    fn child(&self, segment: &str) -> Option<&Value>;

    /// This node viewed as a sequence, if it is one.
    fn as_sequence(&self) -> Option<&[Value]>;
}

impl PathRoot for Value {
    fn child(&self, segment: &str) -> Option<&Value> {
        match self {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        }
    }

    fn as_sequence(&self) -> Option<&[Value]> {
        self.as_array().map(Vec::as_slice)
    }
}

impl PathRoot for Map<String, Value> {
    fn child(&self, segment: &str) -> Option<&Value> {
        self.get(segment)
    }

    fn as_sequence(&self) -> Option<&[Value]> {
        None
    }
}

/// Split a path into segments, normalising `a[0]` to `a.0`.
pub fn segments(path: &str) -> Vec<&str> {
    path.split('.')
        .flat_map(|piece| piece.split('['))
        .map(|segment| segment.trim_end_matches(']'))
        .filter(|segment| !segment.is_empty())
        .collect()
}

/// The first segment of a path, i.e. the name of the value it starts from.
pub fn first_segment(path: &str) -> &str {
    segments(path).first().copied().unwrap_or(path)
}

/// Borrowing walk for wildcard-free paths.
///
/// A `*` in the path is treated as an ordinary key here; use [`resolve`]
/// for projections.
pub fn lookup<'a, R: PathRoot + ?Sized>(root: &'a R, path: &str) -> Option<&'a Value> {
    walk(root, &segments(path))
}

/// Resolve `path` against `root`.
///
/// `Ok(None)` means nothing is stored there, which is distinct from a stored
/// `null` (`Ok(Some(Value::Null))`). A missing intermediate segment is never
/// an error. For wildcard paths, a missing prefix is likewise "not found",
/// while a prefix that exists but is not a sequence is
/// [`PathError::NotIterable`].
pub fn resolve<R: PathRoot + ?Sized>(root: &R, path: &str) -> PathResult<Option<Value>> {
    if !path.contains('*') {
        return Ok(lookup(root, path).cloned());
    }

    let parts = segments(path);
    let unsupported = || PathError::UnsupportedSyntax {
        path: path.to_string(),
    };
    if path.matches('*').count() != 1 {
        return Err(unsupported());
    }
    let Some(position) = parts.iter().position(|segment| *segment == WILDCARD) else {
        return Err(unsupported());
    };
    let (before, after) = (&parts[..position], &parts[position + 1..]);

    let items = if before.is_empty() {
        root.as_sequence()
    } else {
        match walk(root, before) {
            Some(target) => target.as_sequence(),
            None => return Ok(None),
        }
    };
    let Some(items) = items else {
        return Err(PathError::NotIterable {
            path: path.to_string(),
            target: before.join("."),
        });
    };

    let projected = items
        .iter()
        .map(|item| {
            if after.is_empty() {
                item.clone()
            } else {
                walk(item, after).cloned().unwrap_or(Value::Null)
            }
        })
        .collect();
    Ok(Some(Value::Array(projected)))
}

/// The part of `path` in front of its wildcard segment, joined back with
/// dots, or `None` when `path` has no standalone `*`.
pub fn wildcard_target(path: &str) -> Option<String> {
    let parts = segments(path);
    let position = parts.iter().position(|segment| *segment == WILDCARD)?;
    Some(parts[..position].join("."))
}

fn walk<'a, R: PathRoot + ?Sized>(root: &'a R, segments: &[&str]) -> Option<&'a Value> {
    let (first, rest) = segments.split_first()?;
    rest.iter()
        .try_fold(root.child(first)?, |current, segment| current.child(segment))
}
