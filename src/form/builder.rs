//! Control schema inference.
//!
//! Turns a `ConfigValue` sub-tree into a `ControlNode` tree. An explicit
//! descriptor wins; otherwise the control is inferred from the variant.

use crate::form::control::{ControlKind, ControlNode, ValueType};
use crate::form::descriptor::{DescriptorRegistry, FieldDescriptor};
use crate::tree::path::join_path;
use crate::tree::ConfigValue;

/// Infer the control kind and value type from the value's variant.
pub fn infer_control(value: &ConfigValue) -> (ControlKind, ValueType) {
    match value {
        ConfigValue::Bool(_) => (ControlKind::Checkbox, ValueType::Boolean),
        ConfigValue::String(_) | ConfigValue::Pattern(_) => (ControlKind::Text, ValueType::String),
        ConfigValue::Sequence(_) => (ControlKind::Array, ValueType::Array),
        ConfigValue::Mapping(_) => (ControlKind::Object, ValueType::Object),
        ConfigValue::Null | ConfigValue::Number(_) => (ControlKind::Text, ValueType::Unknown),
    }
}

/// Build a control tree for `value` with a single optional descriptor.
///
/// Descendants are built without descriptors.
pub fn build_node(
    value: &ConfigValue,
    name: &str,
    path: &str,
    descriptor: Option<&FieldDescriptor>,
) -> ControlNode {
    ControlSchemaBuilder::unannotated().node(value, name, path, descriptor, None)
}

/// Registry-aware control tree builder.
///
/// Looks up a descriptor for every mapping entry and leaves out entries
/// marked non-editable. Sequence elements are never annotated.
#[derive(Debug, Clone, Copy)]
pub struct ControlSchemaBuilder<'r> {
    registry: Option<&'r DescriptorRegistry>,
}

impl<'r> ControlSchemaBuilder<'r> {
    pub fn new(registry: &'r DescriptorRegistry) -> Self {
        Self {
            registry: Some(registry),
        }
    }

    pub fn unannotated() -> Self {
        Self { registry: None }
    }

    /// Build the control tree rooted at `path`.
    pub fn build(&self, value: &ConfigValue, name: &str, path: &str) -> ControlNode {
        let descriptor = self.registry.and_then(|r| r.get(path));
        self.node(value, name, path, descriptor, self.registry)
    }

    fn node(
        &self,
        value: &ConfigValue,
        name: &str,
        path: &str,
        descriptor: Option<&FieldDescriptor>,
        registry: Option<&DescriptorRegistry>,
    ) -> ControlNode {
        let (inferred_kind, inferred_type) = infer_control(value);
        let control_kind = descriptor
            .and_then(|d| d.control_kind)
            .unwrap_or(inferred_kind);
        let value_type = descriptor
            .and_then(|d| d.value_type)
            .unwrap_or(inferred_type);

        let children = match (control_kind, value) {
            (ControlKind::Array | ControlKind::Object, ConfigValue::Sequence(items)) => items
                .iter()
                .enumerate()
                .map(|(index, item)| {
                    let name = index.to_string();
                    self.node(item, &name, &join_path(path, &name), None, None)
                })
                .collect(),
            (ControlKind::Array | ControlKind::Object, ConfigValue::Mapping(map)) => map
                .iter()
                .filter_map(|(key, item)| {
                    let child_path = join_path(path, key);
                    let child_descriptor = registry.and_then(|r| r.get(&child_path));
                    if child_descriptor.is_some_and(|d| !d.editable) {
                        return None;
                    }
                    Some(self.node(item, key, &child_path, child_descriptor, registry))
                })
                .collect(),
            _ => Vec::new(),
        };

        ControlNode {
            path: path.to_string(),
            name: name.to_string(),
            value: value.clone(),
            control_kind,
            value_type,
            control_data: descriptor.map(|d| d.control_data.clone()).unwrap_or_default(),
            children,
        }
    }
}
