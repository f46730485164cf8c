//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! settings file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → EditorSettings (validated, immutable)
//!
//! sources (defaults + overrides, TOML or JSON)
//!     → loader.rs (load_sources)
//!     → ConfigStore::initialize
//!
//! On source change:
//!     watcher.rs detects change
//!     → loader.rs checks the file still parses
//!     → restart requested; the supervisor rebuilds the store
//! ```
//!
//! # Design Decisions
//! - Settings are immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_settings, load_sources, load_value, ConfigError};
pub use schema::{
    ApiConfig, EditorSettings, ObservabilityConfig, ServerConfig, SourcesConfig, StorageBackend,
    StorageConfig,
};
pub use validation::{validate_settings, ValidationError};
pub use watcher::SourceWatcher;
