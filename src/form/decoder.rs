//! Form tree decoding.
//!
//! Rebuilds a nested configuration value from the flat, path-tagged fields
//! an editor submits. Decoding is a pure function of its input.
//!
//! # Rules
//! - The first path segment (the section root) is dropped
//! - Containers are created on first use: a numeric next segment makes a
//!   sequence, anything else a mapping; the choice is never revisited
//! - Checkbox fields decode to booleans, all others to strings as typed

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::tree::path::{index_segment, join_path};
use crate::tree::ConfigValue;

pub use crate::tree::path::MAX_SEQUENCE_INDEX;

/// A single edited control as submitted by an editor.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct FormField {
    pub path: String,
    #[serde(default)]
    pub raw_value: String,
    #[serde(default)]
    pub is_checkbox: bool,
    #[serde(default)]
    pub checked: bool,
}

impl FormField {
    pub fn text(path: impl Into<String>, raw_value: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            raw_value: raw_value.into(),
            is_checkbox: false,
            checked: false,
        }
    }

    pub fn checkbox(path: impl Into<String>, checked: bool) -> Self {
        Self {
            path: path.into(),
            raw_value: String::new(),
            is_checkbox: true,
            checked,
        }
    }

    fn value(&self) -> ConfigValue {
        if self.is_checkbox {
            ConfigValue::Bool(self.checked)
        } else {
            ConfigValue::String(self.raw_value.clone())
        }
    }
}

/// Errors raised when the submitted fields do not describe a tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Index and key children under the same parent.
    #[error("field '{path}': '{segment}' conflicts with the existing {existing} at '{parent}'")]
    ShapeConflict {
        path: String,
        parent: String,
        segment: String,
        existing: &'static str,
    },

    /// A path runs through, or onto, a node already decoded differently.
    #[error("field '{path}' conflicts with the value already decoded at '{parent}'")]
    LeafConflict { path: String, parent: String },

    #[error("field '{path}' contains an empty segment")]
    EmptySegment { path: String },

    #[error("field '{path}' names only the section root")]
    MissingKey { path: String },

    #[error("field '{path}': index {index} exceeds the limit of {}", MAX_SEQUENCE_INDEX)]
    IndexTooLarge { path: String, index: usize },
}

/// Decode flat form fields into a nested value.
///
/// With no fields the result is an empty mapping.
pub fn decode(fields: &[FormField]) -> Result<ConfigValue, DecodeError> {
    let mut root = ConfigValue::Null;

    for field in fields {
        let path = field.path.as_str();
        if path.split('.').any(str::is_empty) {
            return Err(DecodeError::EmptySegment { path: path.to_string() });
        }

        let mut segments = path.split('.');
        let mut walked = segments.next().unwrap_or_default().to_string();
        let keys: Vec<&str> = segments.collect();
        if keys.is_empty() {
            return Err(DecodeError::MissingKey { path: path.to_string() });
        }

        let mut node = &mut root;
        for segment in keys {
            node = descend(node, segment, &walked, path)?;
            walked = join_path(&walked, segment);
        }

        if node.is_container() {
            return Err(DecodeError::LeafConflict {
                path: path.to_string(),
                parent: walked,
            });
        }
        *node = field.value();
    }

    Ok(match root {
        ConfigValue::Null => ConfigValue::mapping(),
        decoded => decoded,
    })
}

/// Step from `node` into its child `segment`, creating `node` if vacant.
///
/// Only `Null` counts as vacant: decoded leaves are always strings or
/// booleans, and sequence padding is `Null`.
fn descend<'a>(
    node: &'a mut ConfigValue,
    segment: &str,
    parent: &str,
    path: &str,
) -> Result<&'a mut ConfigValue, DecodeError> {
    let index = index_segment(segment);
    if let Some(i) = index {
        if i > MAX_SEQUENCE_INDEX {
            return Err(DecodeError::IndexTooLarge {
                path: path.to_string(),
                index: i,
            });
        }
    }

    if matches!(node, ConfigValue::Null) {
        *node = match index {
            Some(_) => ConfigValue::Sequence(Vec::new()),
            None => ConfigValue::mapping(),
        };
    }

    let conflict = |existing: &'static str| DecodeError::ShapeConflict {
        path: path.to_string(),
        parent: parent.to_string(),
        segment: segment.to_string(),
        existing,
    };

    match (node, index) {
        (ConfigValue::Sequence(items), Some(i)) => {
            if items.len() <= i {
                items.resize(i + 1, ConfigValue::Null);
            }
            Ok(&mut items[i])
        }
        (ConfigValue::Mapping(map), None) => Ok(map.entry(segment.to_string()).or_default()),
        (ConfigValue::Sequence(_), None) => Err(conflict("sequence")),
        (ConfigValue::Mapping(_), Some(_)) => Err(conflict("mapping")),
        _ => Err(DecodeError::LeafConflict {
            path: path.to_string(),
            parent: parent.to_string(),
        }),
    }
}
