//! Structural diff and merge over configuration trees.
//!
//! # Semantics
//! - `diff` reports added and changed leaves only, keyed by full dot path.
//! - Keys present in the base but missing from the edited tree are not
//!   reported. Deletions have to be expressed as an explicit edit.
//! - An empty container counts as a leaf.
//! - `merge` never mutates its input and is idempotent.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::tree::path::{index_segment, join_path, MAX_SEQUENCE_INDEX};
use crate::tree::value::ConfigValue;

/// Errors raised while writing a path into a tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    /// A segment asked for a key inside a sequence.
    #[error("path '{path}': segment '{segment}' is not an index but the node is a sequence")]
    ShapeConflict { path: String, segment: String },

    /// The path has an empty segment (`a..b`, `.a`, `a.`).
    #[error("path '{path}' contains an empty segment")]
    EmptySegment { path: String },

    /// A segment addressed a sequence slot past `MAX_SEQUENCE_INDEX`.
    #[error("path '{path}': index {index} exceeds the limit of {}", MAX_SEQUENCE_INDEX)]
    IndexTooLarge { path: String, index: usize },
}

/// Flat mapping from dot path to new leaf value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigDelta(IndexMap<String, ConfigValue>);

impl ConfigDelta {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn insert(&mut self, path: impl Into<String>, value: impl Into<ConfigValue>) {
        self.0.insert(path.into(), value.into());
    }

    pub fn get(&self, path: &str) -> Option<&ConfigValue> {
        self.0.get(path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.0.contains_key(path)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ConfigValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Add every entry of `other`, later entries winning.
    pub fn extend(&mut self, other: ConfigDelta) {
        self.0.extend(other.0);
    }
}

impl FromIterator<(String, ConfigValue)> for ConfigDelta {
    fn from_iter<I: IntoIterator<Item = (String, ConfigValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for ConfigDelta {
    type Item = (String, ConfigValue);
    type IntoIter = indexmap::map::IntoIter<String, ConfigValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Compute the add/change delta from `base` to `edited`.
pub fn diff(base: &ConfigValue, edited: &ConfigValue) -> ConfigDelta {
    diff_at("", base, edited)
}

/// Like [`diff`], with every emitted path prefixed by `prefix`.
///
/// Used when `base` and `edited` are sub-trees rooted at `prefix`.
pub fn diff_at(prefix: &str, base: &ConfigValue, edited: &ConfigValue) -> ConfigDelta {
    let mut out = ConfigDelta::new();
    walk(prefix, Some(base), edited, &mut out);
    out
}

/// Every leaf of `value`, keyed by path under `prefix`.
pub fn leaves(prefix: &str, value: &ConfigValue) -> ConfigDelta {
    let mut out = ConfigDelta::new();
    emit_leaves(prefix, value, &mut out);
    out
}

fn walk(path: &str, base: Option<&ConfigValue>, edited: &ConfigValue, out: &mut ConfigDelta) {
    match (base, edited) {
        (Some(b), e) if b == e => {}
        (Some(ConfigValue::Mapping(b)), ConfigValue::Mapping(e)) => {
            for (key, value) in e {
                walk(&join_path(path, key), b.get(key), value, out);
            }
        }
        (Some(ConfigValue::Sequence(b)), ConfigValue::Sequence(e)) => {
            for (index, value) in e.iter().enumerate() {
                walk(&join_path(path, &index.to_string()), b.get(index), value, out);
            }
        }
        (_, e) => emit_leaves(path, e, out),
    }
}

fn emit_leaves(path: &str, value: &ConfigValue, out: &mut ConfigDelta) {
    match value {
        ConfigValue::Mapping(m) if !m.is_empty() => {
            for (key, child) in m {
                emit_leaves(&join_path(path, key), child, out);
            }
        }
        ConfigValue::Sequence(items) if !items.is_empty() => {
            for (index, child) in items.iter().enumerate() {
                emit_leaves(&join_path(path, &index.to_string()), child, out);
            }
        }
        leaf => out.insert(path, leaf.clone()),
    }
}

/// Apply `delta` to a copy of `target`.
pub fn merge(target: &ConfigValue, delta: &ConfigDelta) -> Result<ConfigValue, TreeError> {
    let mut merged = target.clone();
    for (path, value) in delta.iter() {
        apply_entry(&mut merged, path, value.clone())?;
    }
    Ok(merged)
}

/// Write `value` at `path`, creating intermediate containers on the way.
///
/// A missing or scalar node becomes a sequence when the segment addressing
/// into it is an index, and a mapping otherwise. The empty path replaces the
/// whole tree.
pub fn apply_entry(tree: &mut ConfigValue, path: &str, value: ConfigValue) -> Result<(), TreeError> {
    if path.is_empty() {
        *tree = value;
        return Ok(());
    }
    if path.split('.').any(str::is_empty) {
        return Err(TreeError::EmptySegment { path: path.to_string() });
    }
    // Checked up front so a rejected path leaves the tree untouched.
    if let Some(index) = path
        .split('.')
        .filter_map(index_segment)
        .find(|&i| i > MAX_SEQUENCE_INDEX)
    {
        return Err(TreeError::IndexTooLarge {
            path: path.to_string(),
            index,
        });
    }

    let mut node = tree;
    for segment in path.split('.') {
        node = child_slot(node, segment, path)?;
    }
    *node = value;
    Ok(())
}

fn child_slot<'a>(
    node: &'a mut ConfigValue,
    segment: &str,
    path: &str,
) -> Result<&'a mut ConfigValue, TreeError> {
    if !node.is_container() {
        *node = match index_segment(segment) {
            Some(_) => ConfigValue::Sequence(Vec::new()),
            None => ConfigValue::mapping(),
        };
    }

    match node {
        ConfigValue::Mapping(map) => Ok(map.entry(segment.to_string()).or_default()),
        ConfigValue::Sequence(items) => {
            let index = index_segment(segment).ok_or_else(|| TreeError::ShapeConflict {
                path: path.to_string(),
                segment: segment.to_string(),
            })?;
            let len = index
                .checked_add(1)
                .filter(|_| index <= MAX_SEQUENCE_INDEX)
                .ok_or_else(|| TreeError::IndexTooLarge {
                    path: path.to_string(),
                    index,
                })?;
            if items.len() < len {
                items.resize(len, ConfigValue::Null);
            }
            Ok(&mut items[index])
        }
        _ => Err(TreeError::ShapeConflict {
            path: path.to_string(),
            segment: segment.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tree(value: serde_json::Value) -> ConfigValue {
        ConfigValue::from(value)
    }

    #[test]
    fn test_diff_reports_changed_and_added_leaves() {
        let base = tree(json!({"debug": {"enabled": false}, "ui": {"theme": "light", "font": 12}}));
        let edited = tree(json!({"debug": {"enabled": true}, "ui": {"theme": "light", "font": 12, "scale": 2}}));

        let delta = diff(&base, &edited);
        assert_eq!(delta.len(), 2);
        assert_eq!(delta.get("debug.enabled"), Some(&ConfigValue::Bool(true)));
        assert_eq!(delta.get("ui.scale"), Some(&ConfigValue::from(2i64)));
    }

    #[test]
    fn test_diff_ignores_removed_keys() {
        let base = tree(json!({"a": 1, "b": {"c": 2, "d": 3}}));
        let edited = tree(json!({"b": {"c": 2}}));

        assert!(diff(&base, &edited).is_empty());
    }

    #[test]
    fn test_diff_walks_sequences_by_index() {
        let base = tree(json!({"items": ["a", "b"]}));
        let edited = tree(json!({"items": ["a", "x", "y"]}));

        let delta = diff(&base, &edited);
        let keys: Vec<_> = delta.keys().collect();
        assert_eq!(keys, vec!["items.1", "items.2"]);
    }

    #[test]
    fn test_diff_kind_change_emits_all_new_leaves() {
        let base = tree(json!({"proxy": "none"}));
        let edited = tree(json!({"proxy": {"host": "h", "port": 1}}));

        let delta = diff(&base, &edited);
        assert_eq!(delta.get("proxy.host"), Some(&ConfigValue::from("h")));
        assert_eq!(delta.get("proxy.port"), Some(&ConfigValue::from(1i64)));
    }

    #[test]
    fn test_diff_emits_new_empty_container_as_leaf() {
        let base = tree(json!({"a": {}}));
        let edited = tree(json!({"a": {}, "list": []}));

        let delta = diff(&base, &edited);
        assert_eq!(delta.len(), 1);
        assert_eq!(delta.get("list"), Some(&ConfigValue::Sequence(vec![])));
    }

    #[test]
    fn test_diff_at_prefixes_paths() {
        let base = tree(json!({"theme": "light"}));
        let edited = tree(json!({"theme": "dark"}));

        let delta = diff_at("ui", &base, &edited);
        assert_eq!(delta.get("ui.theme"), Some(&ConfigValue::from("dark")));
    }

    #[test]
    fn test_merge_applies_delta_without_touching_target() {
        let target = tree(json!({"ui": {"theme": "light"}}));
        let mut delta = ConfigDelta::new();
        delta.insert("ui.theme", "dark");
        delta.insert("ui.panels.0.title", "main");

        let merged = merge(&target, &delta).unwrap();
        assert_eq!(merged, tree(json!({"ui": {"theme": "dark", "panels": [{"title": "main"}]}})));
        assert_eq!(target, tree(json!({"ui": {"theme": "light"}})));
    }

    #[test]
    fn test_merge_is_idempotent() {
        let target = tree(json!({"a": {"b": 1}, "list": [1, 2]}));
        let mut delta = ConfigDelta::new();
        delta.insert("a.b", 2i64);
        delta.insert("list.3", 9i64);
        delta.insert("new.0", "x");

        let once = merge(&target, &delta).unwrap();
        let twice = merge(&once, &delta).unwrap();
        assert_eq!(once, twice);
        assert_eq!(once.get_path("list.2"), Some(&ConfigValue::Null));
    }

    #[test]
    fn test_merge_of_diff_reproduces_changed_leaves() {
        let a = tree(json!({"x": 1, "y": {"z": "keep", "w": [true, false]}}));
        let b = tree(json!({"x": 2, "y": {"z": "keep", "w": [true, true]}}));

        assert_eq!(merge(&a, &diff(&a, &b)).unwrap(), b);
    }

    #[test]
    fn test_apply_entry_rejects_key_into_sequence() {
        let mut target = tree(json!({"items": [1, 2]}));
        let err = apply_entry(&mut target, "items.name", ConfigValue::from("x")).unwrap_err();
        assert!(matches!(err, TreeError::ShapeConflict { .. }));

        let err = apply_entry(&mut target, "a..b", ConfigValue::Null).unwrap_err();
        assert!(matches!(err, TreeError::EmptySegment { .. }));
    }

    #[test]
    fn test_apply_entry_bounds_sequence_index() {
        let mut target = tree(json!({"items": [1, 2]}));
        let before = target.clone();

        let err = apply_entry(&mut target, "items.18446744073709551615", ConfigValue::from("x"))
            .unwrap_err();
        assert!(matches!(err, TreeError::IndexTooLarge { index: usize::MAX, .. }));

        let err = apply_entry(&mut target, "fresh.100000000000", ConfigValue::from("y")).unwrap_err();
        assert!(matches!(err, TreeError::IndexTooLarge { index: 100_000_000_000, .. }));
        assert_eq!(target, before);

        let last = format!("items.{}", MAX_SEQUENCE_INDEX);
        apply_entry(&mut target, &last, ConfigValue::from("z")).unwrap();
        assert_eq!(target.get_path(&last), Some(&ConfigValue::from("z")));
    }

    #[test]
    fn test_delta_serializes_as_flat_object() {
        let mut delta = ConfigDelta::new();
        delta.insert("ui.theme", "dark");
        delta.insert("debug.enabled", true);

        let text = serde_json::to_string(&delta).unwrap();
        assert_eq!(text, r#"{"ui.theme":"dark","debug.enabled":true}"#);
        let back: ConfigDelta = serde_json::from_str(&text).unwrap();
        assert_eq!(back, delta);
    }
}
