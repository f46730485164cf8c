//! Settings validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses and value ranges (timeouts > 0, body limit > 0)
//! - Check descriptor paths and no-reload paths are well formed
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: EditorSettings → Result<(), Vec<ValidationError>>
//! - Runs before settings are accepted into the system

use std::fmt;
use std::net::SocketAddr;

use crate::config::schema::{EditorSettings, StorageBackend};

/// A single semantic problem in the settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted settings key the problem refers to.
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Validate settings, collecting every error.
pub fn validate_settings(settings: &EditorSettings) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if settings.app_name.trim().is_empty() {
        errors.push(ValidationError::new("app_name", "must not be empty"));
    }

    if settings.server.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "server.bind_address",
            format!("'{}' is not a socket address", settings.server.bind_address),
        ));
    }
    if settings.server.request_timeout_secs == 0 {
        errors.push(ValidationError::new("server.request_timeout_secs", "must be greater than 0"));
    }
    if settings.server.max_body_bytes == 0 {
        errors.push(ValidationError::new("server.max_body_bytes", "must be greater than 0"));
    }

    if settings.storage.backend == StorageBackend::File
        && settings.storage.directory.as_os_str().is_empty()
    {
        errors.push(ValidationError::new(
            "storage.directory",
            "is required for the file backend",
        ));
    }

    if settings.sources.defaults.as_os_str().is_empty() {
        errors.push(ValidationError::new("sources.defaults", "must name a file"));
    }

    if matches!(settings.api.api_key.as_deref(), Some(key) if key.trim().is_empty()) {
        errors.push(ValidationError::new("api.api_key", "must not be blank when set"));
    }

    if settings.observability.metrics_enabled
        && settings.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", settings.observability.metrics_address),
        ));
    }

    for path in &settings.no_reload {
        if !is_valid_path(path) {
            errors.push(ValidationError::new("no_reload", format!("'{}' is not a dot path", path)));
        }
    }
    for path in settings.fields.paths() {
        if !is_valid_path(path) {
            errors.push(ValidationError::new("fields", format!("'{}' is not a dot path", path)));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn is_valid_path(path: &str) -> bool {
    !path.is_empty() && path.split('.').all(|segment| !segment.is_empty())
}
