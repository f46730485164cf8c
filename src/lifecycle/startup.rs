//! Startup orchestration.
//!
//! # Responsibilities
//! - Open the storage backend named in settings
//! - Load configuration sources
//! - Build, initialize and load the configuration store
//!
//! # Design Decisions
//! - Fail fast: a missing or malformed source is fatal
//! - Storage is opened once per process; every restart cycle reuses it
//! - The store is Ready before the listener accepts traffic

use std::sync::Arc;

use thiserror::Error;

use crate::config::{load_sources, ConfigError, EditorSettings, StorageBackend, StorageConfig};
use crate::store::{
    storage_key, Collaborators, ConfigStore, FileStore, KeyValueStore, MemoryStore, ReloadPolicy,
    StoreError,
};
use crate::tree::ConfigValue;

/// Errors that abort startup.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to load configuration sources: {0}")]
    Sources(#[from] ConfigError),

    #[error("failed to prepare configuration store: {0}")]
    Store(#[from] StoreError),
}

/// Open the storage backend named in settings.
pub fn open_storage(config: &StorageConfig) -> Arc<dyn KeyValueStore> {
    match config.backend {
        StorageBackend::File => {
            tracing::info!(directory = ?config.directory, "Using file storage");
            Arc::new(FileStore::new(config.directory.clone()))
        }
        StorageBackend::Memory => {
            tracing::warn!("Using memory storage; user configuration will not survive the process");
            Arc::new(MemoryStore::new())
        }
    }
}

/// Build a Ready store from already-loaded trees.
pub fn build_store(
    settings: &EditorSettings,
    defaults: &ConfigValue,
    overrides: &ConfigValue,
    collaborators: Collaborators,
) -> Result<ConfigStore, StoreError> {
    let policy = ReloadPolicy::from_registry(&settings.fields, settings.no_reload.iter().cloned());
    let mut store = ConfigStore::new(
        storage_key(&settings.app_name),
        settings.fields.clone(),
        policy,
        collaborators,
    );

    store.initialize(defaults, overrides)?;
    store.load_persisted()?;
    Ok(store)
}

/// Load sources from disk and build a Ready store.
pub fn build_store_from_sources(
    settings: &EditorSettings,
    collaborators: Collaborators,
) -> Result<ConfigStore, StartupError> {
    let (defaults, overrides) = load_sources(&settings.sources)?;
    let store = build_store(settings, &defaults, &overrides, collaborators)?;

    tracing::info!(
        key = %store.key(),
        defaults = ?settings.sources.defaults,
        user_overrides = store.has_user_overrides(),
        "Configuration store ready"
    );
    Ok(store)
}
