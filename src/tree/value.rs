//! The configuration value tree.
//!
//! A `ConfigValue` is decided once, at construction, to be one of a small set
//! of variants. Everything downstream (schema inference, diffing, form
//! flattening) matches on the variant instead of inspecting raw data.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Number;

use crate::tree::path::{index_segment, split_path};

/// Ordered mapping used for object nodes. Insertion order is preserved.
pub type Mapping = IndexMap<String, ConfigValue>;

/// A regular-expression value, carried in its serialized (source) form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Pattern {
    #[serde(rename = "$pattern")]
    pub source: String,
}

/// A configuration value.
///
/// Serialized untagged, so JSON and TOML documents map onto it directly.
/// A pattern is spelled `{"$pattern": "<source>"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum ConfigValue {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Pattern(Pattern),
    Sequence(Vec<ConfigValue>),
    Mapping(Mapping),
}

impl ConfigValue {
    /// An empty mapping.
    pub fn mapping() -> Self {
        ConfigValue::Mapping(Mapping::new())
    }

    pub fn pattern(source: impl Into<String>) -> Self {
        ConfigValue::Pattern(Pattern { source: source.into() })
    }

    pub fn is_container(&self) -> bool {
        matches!(self, ConfigValue::Sequence(_) | ConfigValue::Mapping(_))
    }

    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            ConfigValue::Mapping(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ConfigValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConfigValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Short name of the variant, used in error messages and logs.
    pub fn kind_name(&self) -> &'static str {
        match self {
            ConfigValue::Null => "null",
            ConfigValue::Bool(_) => "boolean",
            ConfigValue::Number(_) => "number",
            ConfigValue::String(_) => "string",
            ConfigValue::Pattern(_) => "pattern",
            ConfigValue::Sequence(_) => "sequence",
            ConfigValue::Mapping(_) => "mapping",
        }
    }

    /// Child by key (mappings) or index (sequences).
    pub fn child(&self, segment: &str) -> Option<&ConfigValue> {
        match self {
            ConfigValue::Mapping(m) => m.get(segment),
            ConfigValue::Sequence(items) => index_segment(segment).and_then(|i| items.get(i)),
            _ => None,
        }
    }

    /// Look up a dot-delimited path. The empty path is the value itself.
    pub fn get_path(&self, path: &str) -> Option<&ConfigValue> {
        split_path(path).try_fold(self, |node, segment| node.child(segment))
    }

    /// The string shown in a text control for this value.
    pub fn to_form_string(&self) -> String {
        match self {
            ConfigValue::Null => String::new(),
            ConfigValue::Bool(b) => b.to_string(),
            ConfigValue::Number(n) => n.to_string(),
            ConfigValue::String(s) => s.clone(),
            ConfigValue::Pattern(p) => p.source.clone(),
            ConfigValue::Sequence(_) | ConfigValue::Mapping(_) => {
                serde_json::to_string(self).unwrap_or_default()
            }
        }
    }

    /// Reinterpret a form string using `template`'s scalar kind.
    ///
    /// Returns `None` when the template is not a scalar the string can be
    /// read back into (or when it does not parse).
    pub fn parse_like(raw: &str, template: &ConfigValue) -> Option<ConfigValue> {
        match template {
            ConfigValue::Number(_) => {
                let trimmed = raw.trim();
                if let Ok(i) = trimmed.parse::<i64>() {
                    Some(ConfigValue::Number(i.into()))
                } else if let Ok(u) = trimmed.parse::<u64>() {
                    Some(ConfigValue::Number(u.into()))
                } else {
                    trimmed
                        .parse::<f64>()
                        .ok()
                        .and_then(Number::from_f64)
                        .map(ConfigValue::Number)
                }
            }
            ConfigValue::Bool(_) => match raw.trim() {
                "true" => Some(ConfigValue::Bool(true)),
                "false" => Some(ConfigValue::Bool(false)),
                _ => None,
            },
            ConfigValue::Pattern(_) => Some(ConfigValue::pattern(raw)),
            ConfigValue::Null if raw.is_empty() => Some(ConfigValue::Null),
            _ => None,
        }
    }

    /// Retype the string leaves of a decoded form tree after `template`.
    ///
    /// Form submissions carry every text field as a string. Where the live
    /// tree holds a number, boolean, pattern or null at the same path and the
    /// string reads back as that kind, the typed value is used instead. New
    /// sequence rows are shaped after the template's first row.
    pub fn conform_to(&self, template: &ConfigValue) -> ConfigValue {
        match (self, template) {
            (ConfigValue::String(raw), t) if !t.is_container() => {
                ConfigValue::parse_like(raw, t).unwrap_or_else(|| self.clone())
            }
            (ConfigValue::Mapping(decoded), ConfigValue::Mapping(t)) => ConfigValue::Mapping(
                decoded
                    .iter()
                    .map(|(key, value)| {
                        let conformed = match t.get(key) {
                            Some(tv) => value.conform_to(tv),
                            None => value.clone(),
                        };
                        (key.clone(), conformed)
                    })
                    .collect(),
            ),
            (ConfigValue::Sequence(decoded), ConfigValue::Sequence(t)) => ConfigValue::Sequence(
                decoded
                    .iter()
                    .enumerate()
                    .map(|(index, value)| match t.get(index).or_else(|| t.first()) {
                        Some(tv) => value.conform_to(tv),
                        None => value.clone(),
                    })
                    .collect(),
            ),
            _ => self.clone(),
        }
    }

    /// Recursively merge `overlay` on top of `self`.
    ///
    /// Mappings merge key by key; every other combination lets the overlay
    /// win. Used to combine packaged defaults with runtime overrides.
    pub fn deep_merge(&self, overlay: &ConfigValue) -> ConfigValue {
        match (self, overlay) {
            (ConfigValue::Mapping(base), ConfigValue::Mapping(over)) => {
                let mut merged = base.clone();
                for (key, value) in over {
                    let next = match merged.get(key) {
                        Some(existing) => existing.deep_merge(value),
                        None => value.clone(),
                    };
                    merged.insert(key.clone(), next);
                }
                ConfigValue::Mapping(merged)
            }
            (_, over) => over.clone(),
        }
    }
}

impl From<bool> for ConfigValue {
    fn from(b: bool) -> Self {
        ConfigValue::Bool(b)
    }
}

impl From<&str> for ConfigValue {
    fn from(s: &str) -> Self {
        ConfigValue::String(s.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(s: String) -> Self {
        ConfigValue::String(s)
    }
}

impl From<i64> for ConfigValue {
    fn from(n: i64) -> Self {
        ConfigValue::Number(n.into())
    }
}

impl From<u64> for ConfigValue {
    fn from(n: u64) -> Self {
        ConfigValue::Number(n.into())
    }
}

impl From<Vec<ConfigValue>> for ConfigValue {
    fn from(items: Vec<ConfigValue>) -> Self {
        ConfigValue::Sequence(items)
    }
}

impl From<Mapping> for ConfigValue {
    fn from(m: Mapping) -> Self {
        ConfigValue::Mapping(m)
    }
}

impl From<serde_json::Value> for ConfigValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => ConfigValue::Null,
            serde_json::Value::Bool(b) => ConfigValue::Bool(b),
            serde_json::Value::Number(n) => ConfigValue::Number(n),
            serde_json::Value::String(s) => ConfigValue::String(s),
            serde_json::Value::Array(items) => {
                ConfigValue::Sequence(items.into_iter().map(ConfigValue::from).collect())
            }
            serde_json::Value::Object(map) => {
                if map.len() == 1 {
                    if let Some(serde_json::Value::String(source)) = map.get("$pattern") {
                        return ConfigValue::pattern(source.clone());
                    }
                }
                ConfigValue::Mapping(
                    map.into_iter()
                        .map(|(k, v)| (k, ConfigValue::from(v)))
                        .collect(),
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_preserves_order_and_patterns() {
        let value: ConfigValue = serde_json::from_str(
            r#"{"z": 1, "a": {"$pattern": "^foo$"}, "m": [true, "x", null]}"#,
        )
        .unwrap();

        let map = value.as_mapping().unwrap();
        let keys: Vec<_> = map.keys().cloned().collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
        assert_eq!(map["a"], ConfigValue::pattern("^foo$"));
        assert_eq!(
            map["m"],
            ConfigValue::Sequence(vec![true.into(), "x".into(), ConfigValue::Null])
        );
    }

    #[test]
    fn test_toml_documents_deserialize() {
        let value: ConfigValue = toml::from_str(
            r#"
            [ui]
            theme = "light"
            scale = 1.5

            [debug]
            enabled = false
            "#,
        )
        .unwrap();

        assert_eq!(value.get_path("ui.theme"), Some(&ConfigValue::from("light")));
        assert_eq!(value.get_path("debug.enabled"), Some(&ConfigValue::Bool(false)));
        assert!(value.get_path("ui.scale").is_some());
    }

    #[test]
    fn test_get_path_through_sequences() {
        let value = ConfigValue::from(json!({"items": [{"name": "a"}, {"name": "b"}]}));
        assert_eq!(value.get_path("items.1.name"), Some(&ConfigValue::from("b")));
        assert_eq!(value.get_path("items.7.name"), None);
        assert_eq!(value.get_path(""), Some(&value));
    }

    #[test]
    fn test_deep_merge_overlays_nested_keys() {
        let defaults = ConfigValue::from(json!({"ui": {"theme": "light", "font": 12}, "debug": false}));
        let overrides = ConfigValue::from(json!({"ui": {"theme": "dark"}}));

        let merged = defaults.deep_merge(&overrides);
        assert_eq!(
            merged,
            ConfigValue::from(json!({"ui": {"theme": "dark", "font": 12}, "debug": false}))
        );
    }

    #[test]
    fn test_conform_to_live_tree() {
        let live = ConfigValue::from(json!({
            "port": 8080,
            "name": "svc",
            "ratio": 0.5,
            "ports": [1, 2],
            "filter": {"$pattern": "^a$"}
        }));
        let decoded = ConfigValue::from(json!({
            "port": "9090",
            "name": "12",
            "ratio": "oops",
            "ports": ["1", "2", "3"],
            "filter": "^b$",
            "extra": "7"
        }));

        let conformed = decoded.conform_to(&live);
        assert_eq!(conformed.get_path("port"), Some(&ConfigValue::from(9090i64)));
        assert_eq!(conformed.get_path("name"), Some(&ConfigValue::from("12")));
        assert_eq!(conformed.get_path("ratio"), Some(&ConfigValue::from("oops")));
        assert_eq!(conformed.get_path("ports.2"), Some(&ConfigValue::from(3i64)));
        assert_eq!(conformed.get_path("filter"), Some(&ConfigValue::pattern("^b$")));
        assert_eq!(conformed.get_path("extra"), Some(&ConfigValue::from("7")));
    }

    #[test]
    fn test_parse_like_template() {
        let port = ConfigValue::from(8080i64);
        assert_eq!(ConfigValue::parse_like("9090", &port), Some(ConfigValue::from(9090i64)));
        assert_eq!(ConfigValue::parse_like("abc", &port), None);
        assert_eq!(
            ConfigValue::parse_like("true", &ConfigValue::Bool(false)),
            Some(ConfigValue::Bool(true))
        );
        assert_eq!(ConfigValue::parse_like("x", &ConfigValue::from("y")), None);
    }
}
