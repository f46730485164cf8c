//! Field descriptors: per-path editing and reload annotations.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::form::control::{ControlKind, ValueType};
use crate::tree::Mapping;

/// Declared metadata for one configuration path.
///
/// A path without a descriptor is editable, requires a reload when changed,
/// and gets its control inferred from the value.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct FieldDescriptor {
    /// Whether the path is offered for editing at all.
    pub editable: bool,

    /// Whether changing the path requires a process restart.
    pub reload: bool,

    /// Explicit control kind, overriding inference.
    #[serde(rename = "control")]
    pub control_kind: Option<ControlKind>,

    /// Explicit value type, overriding inference.
    #[serde(rename = "type")]
    pub value_type: Option<ValueType>,

    /// Opaque presentation data handed through to the control.
    pub control_data: Mapping,
}

impl Default for FieldDescriptor {
    fn default() -> Self {
        Self {
            editable: true,
            reload: true,
            control_kind: None,
            value_type: None,
            control_data: Mapping::new(),
        }
    }
}

impl FieldDescriptor {
    /// Descriptor for a path that can change without a restart.
    pub fn live() -> Self {
        Self {
            reload: false,
            ..Self::default()
        }
    }

    /// Descriptor for a path hidden from editors.
    pub fn hidden() -> Self {
        Self {
            editable: false,
            ..Self::default()
        }
    }
}

/// Registry of descriptors keyed by full dot path.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct DescriptorRegistry {
    fields: BTreeMap<String, FieldDescriptor>,
}

impl DescriptorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<String>, descriptor: FieldDescriptor) {
        self.fields.insert(path.into(), descriptor);
    }

    pub fn with(mut self, path: impl Into<String>, descriptor: FieldDescriptor) -> Self {
        self.insert(path, descriptor);
        self
    }

    pub fn get(&self, path: &str) -> Option<&FieldDescriptor> {
        self.fields.get(path)
    }

    pub fn is_editable(&self, path: &str) -> bool {
        self.get(path).map_or(true, |d| d.editable)
    }

    /// Whether `path` and every ancestor of it are editable.
    pub fn is_editable_path(&self, path: &str) -> bool {
        path.match_indices('.')
            .map(|(i, _)| &path[..i])
            .chain(std::iter::once(path))
            .all(|prefix| self.is_editable(prefix))
    }

    /// Paths annotated as safe to change without a restart.
    pub fn no_reload_paths(&self) -> impl Iterator<Item = &str> {
        self.fields
            .iter()
            .filter(|(_, d)| !d.reload)
            .map(|(path, _)| path.as_str())
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
