//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use crate::config::schema::{EditorSettings, SourcesConfig};
use crate::config::validation::{validate_settings, ValidationError};
use crate::tree::ConfigValue;

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Json(serde_json::Error),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Json(e) => write!(f, "JSON parse error: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Load and validate editor settings from a TOML file.
pub fn load_settings(path: &Path) -> Result<EditorSettings, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let settings: EditorSettings = toml::from_str(&content).map_err(ConfigError::Parse)?;

    validate_settings(&settings).map_err(ConfigError::Validation)?;

    Ok(settings)
}

/// Load a configuration tree. `.json` files are read as JSON, anything
/// else as TOML.
pub fn load_value(path: &Path) -> Result<ConfigValue, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    if is_json {
        serde_json::from_str(&content).map_err(ConfigError::Json)
    } else {
        toml::from_str(&content).map_err(ConfigError::Parse)
    }
}

/// Load the packaged defaults and runtime overrides.
///
/// Without an overrides file the overrides are an empty mapping.
pub fn load_sources(sources: &SourcesConfig) -> Result<(ConfigValue, ConfigValue), ConfigError> {
    let defaults = load_value(&sources.defaults)?;
    let overrides = match &sources.overrides {
        Some(path) => load_value(path)?,
        None => ConfigValue::mapping(),
    };
    Ok((defaults, overrides))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_load_settings_validates() {
        let dir = tempfile::tempdir().unwrap();
        let good = write_file(dir.path(), "good.toml", "app_name = \"Demo\"\n");
        let bad = write_file(dir.path(), "bad.toml", "[server]\nrequest_timeout_secs = 0\n");

        assert_eq!(load_settings(&good).unwrap().app_name, "Demo");
        assert!(matches!(load_settings(&bad), Err(ConfigError::Validation(_))));
        assert!(matches!(
            load_settings(&dir.path().join("missing.toml")),
            Err(ConfigError::Io(_))
        ));
    }

    #[test]
    fn test_load_value_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let toml_path = write_file(dir.path(), "defaults.toml", "[ui]\ntheme = \"light\"\n");
        let json_path = write_file(dir.path(), "defaults.json", r#"{"ui": {"theme": "dark"}}"#);

        assert_eq!(
            load_value(&toml_path).unwrap().get_path("ui.theme"),
            Some(&ConfigValue::from("light"))
        );
        assert_eq!(
            load_value(&json_path).unwrap().get_path("ui.theme"),
            Some(&ConfigValue::from("dark"))
        );

        let broken = write_file(dir.path(), "broken.json", "{");
        assert!(matches!(load_value(&broken), Err(ConfigError::Json(_))));
    }

    #[test]
    fn test_sources_without_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let defaults = write_file(dir.path(), "defaults.toml", "debug = false\n");
        let sources = SourcesConfig {
            defaults,
            overrides: None,
            watch: false,
        };

        let (defaults, overrides) = load_sources(&sources).unwrap();
        assert_eq!(defaults.get_path("debug"), Some(&ConfigValue::Bool(false)));
        assert_eq!(overrides, ConfigValue::mapping());
    }
}
