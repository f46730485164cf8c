//! Configuration schema definitions.
//!
//! This module defines the settings the editor service starts from.
//! All types derive Serde traits for deserialization from config files.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::form::DescriptorRegistry;

/// Root settings for the configuration editor.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EditorSettings {
    /// Application name. Determines the storage key of the user delta.
    pub app_name: String,

    /// HTTP listener settings.
    pub server: ServerConfig,

    /// Where the user delta is persisted.
    pub storage: StorageConfig,

    /// Packaged defaults and runtime overrides.
    pub sources: SourcesConfig,

    /// API access control.
    pub api: ApiConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Paths whose changes apply without a restart.
    pub no_reload: Vec<String>,

    /// Per-path field descriptors.
    pub fields: DescriptorRegistry,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            app_name: "config-editor".to_string(),
            server: ServerConfig::default(),
            storage: StorageConfig::default(),
            sources: SourcesConfig::default(),
            api: ApiConfig::default(),
            observability: ObservabilityConfig::default(),
            no_reload: Vec::new(),
            fields: DescriptorRegistry::default(),
        }
    }
}

/// HTTP listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "127.0.0.1:8080").
    pub bind_address: String,

    /// Total time allowed per request in seconds.
    pub request_timeout_secs: u64,

    /// Maximum accepted request body in bytes.
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8080".to_string(),
            request_timeout_secs: 30,
            max_body_bytes: 1024 * 1024, // 1MB
        }
    }
}

/// Storage backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// One JSON file per key under `directory`.
    File,
    /// Process memory; nothing survives the process.
    Memory,
}

/// Persistence configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,

    /// Directory for the file backend.
    pub directory: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::File,
            directory: PathBuf::from("data"),
        }
    }
}

/// Configuration sources merged into the base tree at startup.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SourcesConfig {
    /// Packaged defaults (TOML or JSON).
    pub defaults: PathBuf,

    /// Optional runtime overrides applied on top of the defaults.
    pub overrides: Option<PathBuf>,

    /// Restart when a source file changes on disk.
    pub watch: bool,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            defaults: PathBuf::from("defaults.toml"),
            overrides: None,
            watch: false,
        }
    }
}

/// API access configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Bearer token required on every API request when set.
    pub api_key: Option<String>,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit JSON log lines instead of human-readable output.
    pub json_logs: bool,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
