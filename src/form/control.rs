//! Control nodes: the editable view of a configuration sub-tree.

use serde::{Deserialize, Serialize};

use crate::form::builder::build_node;
use crate::form::decoder::FormField;
use crate::tree::path::join_path;
use crate::tree::{ConfigValue, Mapping};

/// Presentation hint for an editor control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlKind {
    Text,
    Checkbox,
    Array,
    Object,
}

/// Declared data type of a control's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    String,
    Boolean,
    Array,
    Object,
    Unknown,
}

/// One node of the inferred control tree.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ControlNode {
    /// Dot path of this node: ancestor names joined with `.`.
    pub path: String,
    pub name: String,
    /// Snapshot of the value at `path` when the tree was built.
    pub value: ConfigValue,
    pub control_kind: ControlKind,
    #[serde(rename = "type")]
    pub value_type: ValueType,
    #[serde(default, skip_serializing_if = "Mapping::is_empty")]
    pub control_data: Mapping,
    #[serde(default)]
    pub children: Vec<ControlNode>,
}

impl ControlNode {
    /// Whether this node renders as a container of child controls.
    pub fn is_container(&self) -> bool {
        matches!(self.control_kind, ControlKind::Array | ControlKind::Object)
            && self.value.is_container()
    }

    /// Find a descendant (or self) by full path.
    pub fn find(&self, path: &str) -> Option<&ControlNode> {
        if self.path == path {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(path))
    }

    /// Flatten the tree into the fields an editor form would submit.
    ///
    /// Boolean leaves become checkboxes, every other leaf a text field.
    /// Containers contribute only their children.
    pub fn to_form_fields(&self) -> Vec<FormField> {
        let mut fields = Vec::new();
        self.collect_fields(&mut fields);
        fields
    }

    fn collect_fields(&self, out: &mut Vec<FormField>) {
        if self.is_container() {
            for child in &self.children {
                child.collect_fields(out);
            }
            return;
        }
        match &self.value {
            ConfigValue::Bool(checked) => out.push(FormField::checkbox(&self.path, *checked)),
            other => out.push(FormField::text(&self.path, other.to_form_string())),
        }
    }

    /// Synthesize a new, blank child for the add-row action.
    ///
    /// Arrays append at the next index and shape the row after the first
    /// existing element (an empty string when there is none). Objects need
    /// an explicit `key`. Returns `None` for leaf nodes or a missing key.
    pub fn new_child(&self, key: Option<&str>) -> Option<ControlNode> {
        match (&self.value_type, &self.value) {
            (ValueType::Array, ConfigValue::Sequence(items)) => {
                let name = items.len().to_string();
                let template = items.first().map(blank).unwrap_or_else(|| ConfigValue::from(""));
                Some(build_node(&template, &name, &join_path(&self.path, &name), None))
            }
            (ValueType::Object, ConfigValue::Mapping(map)) => {
                let key = key?;
                if key.is_empty() || map.contains_key(key) {
                    return None;
                }
                Some(build_node(&ConfigValue::from(""), key, &join_path(&self.path, key), None))
            }
            _ => None,
        }
    }
}

/// Same shape as `value`, with every leaf reset.
fn blank(value: &ConfigValue) -> ConfigValue {
    match value {
        ConfigValue::Bool(_) => ConfigValue::Bool(false),
        ConfigValue::Sequence(_) => ConfigValue::Sequence(Vec::new()),
        ConfigValue::Mapping(map) => {
            ConfigValue::Mapping(map.iter().map(|(k, v)| (k.clone(), blank(v))).collect())
        }
        _ => ConfigValue::from(""),
    }
}
