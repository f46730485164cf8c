//! The authoritative configuration store.
//!
//! # State
//! - `base`: packaged defaults merged with runtime overrides; fixed after
//!   `initialize`
//! - `current`: the live tree, changed by edits and merges
//! - `applied`: what the running process has taken on; reload decisions are
//!   made against it so an applied no-reload change is not reported again
//! - `previous_snapshot`: the watch guard's view of the last saved state
//!
//! # Phases
//! ```text
//! Uninitialized ──initialize──▶ Initialized ──load_persisted──▶ Ready
//!
//! watch: Idle ──save──▶ Saving ──▶ Idle
//!        Idle ◀──set_watching──▶ Suspended
//! ```
//!
//! Storage and restart failures are reported through the notifier and
//! never escape the store; the in-memory `current` stays authoritative.

use std::fmt;
use std::mem;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::form::{decode, ControlNode, ControlSchemaBuilder, DescriptorRegistry, FormField};
use crate::observability::metrics;
use crate::store::error::StoreError;
use crate::store::notice::{NoticeLevel, Notifier};
use crate::store::policy::ReloadPolicy;
use crate::store::restart::RestartTrigger;
use crate::store::storage::KeyValueStore;
use crate::tree::path::last_segment;
use crate::tree::{apply_entry, diff, diff_at, merge, ConfigDelta, ConfigValue};

/// Root name given to whole-tree submissions before decoding.
const WHOLE_TREE_ROOT: &str = "config";

/// Lifecycle phase of the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StorePhase {
    Uninitialized,
    Initialized,
    Ready,
}

impl fmt::Display for StorePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StorePhase::Uninitialized => "uninitialized",
            StorePhase::Initialized => "initialized",
            StorePhase::Ready => "ready",
        };
        f.write_str(name)
    }
}

/// State of the change-watch guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WatchState {
    Idle,
    Saving,
    Suspended,
}

/// Handle returned by [`ConfigStore::on_change`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(Uuid);

/// Delivered to change listeners after `current` mutates.
#[derive(Debug, Clone)]
pub struct ChangeEvent {
    /// Leaves added or changed by this mutation.
    pub delta: ConfigDelta,
}

pub type ChangeCallback = Box<dyn Fn(&ChangeEvent) + Send + Sync>;

/// External collaborators of the store.
#[derive(Clone)]
pub struct Collaborators {
    pub storage: Arc<dyn KeyValueStore>,
    pub restart: Arc<dyn RestartTrigger>,
    pub notifier: Arc<dyn Notifier>,
}

/// Result of a save.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct SaveOutcome {
    /// The durable entry now matches `current`.
    pub persisted: bool,
    /// Entries in the persisted delta.
    pub delta_entries: usize,
    /// Paths changed since the process last applied its state.
    pub pending: usize,
    pub reload: bool,
    pub restart_requested: bool,
}

/// Result of an edit submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct SubmitOutcome {
    pub applied: bool,
    pub reload: bool,
    pub persisted: bool,
    pub restart_requested: bool,
}

/// Result of clearing user configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct ClearOutcome {
    pub removed: bool,
    pub restart_requested: bool,
}

/// Owns the configuration trees and their persisted delta.
pub struct ConfigStore {
    key: String,
    registry: DescriptorRegistry,
    policy: ReloadPolicy,
    storage: Arc<dyn KeyValueStore>,
    restart: Arc<dyn RestartTrigger>,
    notifier: Arc<dyn Notifier>,

    phase: StorePhase,
    watch: WatchState,
    base: ConfigValue,
    current: ConfigValue,
    applied: ConfigValue,
    previous_snapshot: ConfigValue,
    has_user_overrides: bool,
    listeners: Vec<(ListenerId, ChangeCallback)>,
}

impl ConfigStore {
    /// Create an uninitialized store persisting under `key`.
    pub fn new(
        key: impl Into<String>,
        registry: DescriptorRegistry,
        policy: ReloadPolicy,
        collaborators: Collaborators,
    ) -> Self {
        Self {
            key: key.into(),
            registry,
            policy,
            storage: collaborators.storage,
            restart: collaborators.restart,
            notifier: collaborators.notifier,
            phase: StorePhase::Uninitialized,
            watch: WatchState::Idle,
            base: ConfigValue::mapping(),
            current: ConfigValue::mapping(),
            applied: ConfigValue::mapping(),
            previous_snapshot: ConfigValue::mapping(),
            has_user_overrides: false,
            listeners: Vec::new(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn phase(&self) -> StorePhase {
        self.phase
    }

    pub fn watch_state(&self) -> WatchState {
        self.watch
    }

    pub fn base(&self) -> &ConfigValue {
        &self.base
    }

    pub fn current(&self) -> &ConfigValue {
        &self.current
    }

    pub fn registry(&self) -> &DescriptorRegistry {
        &self.registry
    }

    pub fn has_user_overrides(&self) -> bool {
        self.has_user_overrides
    }

    /// Compute `base` from packaged defaults and runtime overrides.
    pub fn initialize(
        &mut self,
        defaults: &ConfigValue,
        overrides: &ConfigValue,
    ) -> Result<(), StoreError> {
        self.require(StorePhase::Uninitialized, "initialize")?;

        self.base = defaults.deep_merge(overrides);
        self.current = self.base.clone();
        self.applied = self.current.clone();
        self.previous_snapshot = self.current.clone();
        self.phase = StorePhase::Initialized;

        tracing::debug!(key = %self.key, "Configuration store initialized");
        Ok(())
    }

    /// Load the persisted delta and merge it into `current`.
    ///
    /// Missing or unreadable data counts as an empty delta. Entries that no
    /// longer fit the shape of the shipped defaults are skipped. Returns the
    /// delta as read from storage.
    pub fn load_persisted(&mut self) -> Result<ConfigDelta, StoreError> {
        self.require(StorePhase::Initialized, "load persisted configuration")?;

        let delta = match self.storage.get(&self.key) {
            Ok(Some(text)) => match serde_json::from_str::<ConfigDelta>(&text) {
                Ok(delta) => delta,
                Err(e) => {
                    self.notifier.notify(
                        &format!(
                            "Ignoring unreadable saved configuration '{}': {}",
                            self.key, e
                        ),
                        NoticeLevel::Warning,
                    );
                    ConfigDelta::new()
                }
            },
            Ok(None) => ConfigDelta::new(),
            Err(e) => {
                self.notifier.notify(
                    &format!("Could not load saved configuration: {}", e),
                    NoticeLevel::Warning,
                );
                ConfigDelta::new()
            }
        };

        let mut loaded = 0;
        for (path, value) in delta.iter() {
            match apply_entry(&mut self.current, path, value.clone()) {
                Ok(()) => loaded += 1,
                Err(e) => self.notifier.notify(
                    &format!("Skipping saved value for '{}': {}", path, e),
                    NoticeLevel::Warning,
                ),
            }
        }

        self.has_user_overrides = !delta.is_empty();
        self.applied = self.current.clone();
        self.previous_snapshot = self.current.clone();
        self.phase = StorePhase::Ready;
        metrics::record_persisted_entries(delta.len());

        tracing::info!(
            key = %self.key,
            entries = delta.len(),
            loaded,
            "Saved configuration loaded"
        );
        Ok(delta)
    }

    /// Persist `diff(base, current)` and decide whether to restart.
    pub fn save(&mut self) -> Result<SaveOutcome, StoreError> {
        self.require(StorePhase::Ready, "save")?;
        if self.watch == WatchState::Saving {
            return Err(StoreError::SaveInProgress);
        }

        let resume = mem::replace(&mut self.watch, WatchState::Saving);
        let outcome = self.persist_and_apply();
        self.watch = resume;
        Ok(outcome)
    }

    fn persist_and_apply(&mut self) -> SaveOutcome {
        let delta = diff(&self.base, &self.current);
        let persisted = self.persist(&delta);

        let pending = diff(&self.applied, &self.current);
        let decision = self.policy.classify(&pending);
        let restart_requested = if decision.reload {
            self.request_restart("configuration change requires a restart", "save")
        } else {
            self.applied = self.current.clone();
            false
        };

        tracing::info!(
            key = %self.key,
            delta_entries = delta.len(),
            pending = decision.changed,
            no_reload = decision.no_reload_changed,
            reload = decision.reload,
            persisted,
            "Configuration saved"
        );

        SaveOutcome {
            persisted,
            delta_entries: delta.len(),
            pending: decision.changed,
            reload: decision.reload,
            restart_requested,
        }
    }

    /// Write or remove the durable entry. Failures are notified, not returned.
    fn persist(&mut self, delta: &ConfigDelta) -> bool {
        let result = if delta.is_empty() {
            self.storage.remove(&self.key)
        } else {
            match serde_json::to_string(delta) {
                Ok(text) => self.storage.set(&self.key, &text),
                Err(e) => {
                    self.notifier.notify(
                        &format!("Saving configuration '{}' failed: {}", self.key, e),
                        NoticeLevel::Error,
                    );
                    metrics::record_save("failed");
                    return false;
                }
            }
        };

        match result {
            Ok(()) => {
                self.has_user_overrides = !delta.is_empty();
                metrics::record_persisted_entries(delta.len());
                metrics::record_save(if delta.is_empty() { "cleared" } else { "persisted" });
                self.notifier.notify("Configuration saved", NoticeLevel::Success);
                true
            }
            Err(e) => {
                metrics::record_save("failed");
                self.notifier.notify(
                    &format!(
                        "Saving configuration failed: {}. Changes apply to this session only; submit again to retry.",
                        e
                    ),
                    NoticeLevel::Error,
                );
                false
            }
        }
    }

    fn request_restart(&self, reason: &str, cause: &'static str) -> bool {
        match self.restart.request_restart(Some(reason)) {
            Ok(()) => {
                metrics::record_restart_requested(cause);
                tracing::info!(reason, "Restart requested");
                true
            }
            Err(e) => {
                self.notifier.notify(
                    &format!(
                        "Restart could not be requested: {}. Saved configuration takes effect on next start.",
                        e
                    ),
                    NoticeLevel::Error,
                );
                false
            }
        }
    }

    /// Drop all user configuration and restart.
    pub fn clear(&mut self) -> Result<ClearOutcome, StoreError> {
        self.require(StorePhase::Ready, "clear user configuration")?;
        if self.watch == WatchState::Saving {
            return Err(StoreError::SaveInProgress);
        }

        let removed = match self.storage.remove(&self.key) {
            Ok(()) => true,
            Err(e) => {
                self.notifier.notify(
                    &format!("Clearing saved configuration failed: {}", e),
                    NoticeLevel::Error,
                );
                false
            }
        };

        let before = mem::replace(&mut self.current, self.base.clone());
        self.previous_snapshot = self.current.clone();
        self.has_user_overrides = false;
        self.emit(diff(&before, &self.current));

        if removed {
            metrics::record_persisted_entries(0);
            self.notifier
                .notify("User configuration cleared", NoticeLevel::Success);
        }
        let restart_requested = self.request_restart("user configuration cleared", "clear");

        Ok(ClearOutcome {
            removed,
            restart_requested,
        })
    }

    /// Apply `f` to `current`, notify listeners and run the watch guard.
    ///
    /// Returns the save outcome when the guard saved.
    pub fn mutate<F>(&mut self, f: F) -> Result<Option<SaveOutcome>, StoreError>
    where
        F: FnOnce(&mut ConfigValue),
    {
        self.require(StorePhase::Ready, "edit")?;

        let before = self.current.clone();
        f(&mut self.current);
        self.emit(diff(&before, &self.current));
        self.on_watch()
    }

    /// Set a single path in `current`.
    pub fn set_value(
        &mut self,
        path: &str,
        value: impl Into<ConfigValue>,
    ) -> Result<Option<SaveOutcome>, StoreError> {
        let mut next = self.current.clone();
        apply_entry(&mut next, path, value.into())?;
        self.mutate(|tree| *tree = next)
    }

    /// Apply several edits with watching suspended, then save once.
    pub fn batch<F>(&mut self, f: F) -> Result<SaveOutcome, StoreError>
    where
        F: FnOnce(&mut ConfigValue),
    {
        self.require(StorePhase::Ready, "edit")?;

        let resume = mem::replace(&mut self.watch, WatchState::Suspended);
        let before = self.current.clone();
        f(&mut self.current);
        self.emit(diff(&before, &self.current));
        self.watch = resume;

        let outcome = self.save()?;
        self.previous_snapshot = self.current.clone();
        Ok(outcome)
    }

    /// Toggle incremental saves on mutation.
    pub fn set_watching(&mut self, watching: bool) {
        if self.watch == WatchState::Saving {
            return;
        }
        self.watch = if watching {
            WatchState::Idle
        } else {
            WatchState::Suspended
        };
    }

    fn on_watch(&mut self) -> Result<Option<SaveOutcome>, StoreError> {
        if self.watch != WatchState::Idle {
            return Ok(None);
        }
        if diff(&self.previous_snapshot, &self.current).is_empty() {
            return Ok(None);
        }

        let outcome = self.save()?;
        self.previous_snapshot = self.current.clone();
        Ok(Some(outcome))
    }

    pub fn on_change<F>(&mut self, callback: F) -> ListenerId
    where
        F: Fn(&ChangeEvent) + Send + Sync + 'static,
    {
        let id = ListenerId(Uuid::new_v4());
        self.listeners.push((id, Box::new(callback)));
        id
    }

    /// Remove a listener. Returns whether it was registered.
    pub fn off_change(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener, _)| *listener != id);
        self.listeners.len() != before
    }

    fn emit(&self, delta: ConfigDelta) {
        if delta.is_empty() {
            return;
        }
        let event = ChangeEvent { delta };
        for (_, callback) in &self.listeners {
            callback(&event);
        }
    }

    /// Control tree for the live sub-tree at `section`.
    ///
    /// The empty section yields the whole tree; a path naming a single
    /// value is refused.
    pub fn get_editable_tree(&self, section: &str) -> Result<ControlNode, StoreError> {
        if self.phase < StorePhase::Initialized {
            return Err(StoreError::Phase {
                operation: "read configuration",
                phase: self.phase,
            });
        }
        let value = self.section(section)?;
        Ok(ControlSchemaBuilder::new(&self.registry).build(value, last_segment(section), section))
    }

    /// Decode, diff, merge and save one editor submission.
    ///
    /// Field paths are full dot paths under `section`; the empty section
    /// accepts edits anywhere in the tree. A decode error leaves `current`
    /// untouched.
    pub fn submit_edits(
        &mut self,
        section: &str,
        fields: &[FormField],
    ) -> Result<SubmitOutcome, StoreError> {
        self.require(StorePhase::Ready, "submit edits")?;
        let live = self.section(section)?.clone();

        let rebased = self.rebase_fields(section, fields)?;
        let decoded = match decode(&rebased) {
            Ok(decoded) => decoded.conform_to(&live),
            Err(e) => {
                metrics::record_decode_error(section);
                self.notifier.notify(
                    &format!("Edits to '{}' were not applied: {}", section, e),
                    NoticeLevel::Error,
                );
                return Err(e.into());
            }
        };

        let base_section = self.base.get_path(section).cloned().unwrap_or_default();
        let mut delta = diff_at(section, &base_section, &decoded);
        delta.extend(diff_at(section, &live, &decoded));
        if delta.is_empty() {
            return Ok(SubmitOutcome {
                applied: false,
                reload: false,
                persisted: false,
                restart_requested: false,
            });
        }

        let merged = merge(&self.current, &delta)?;
        let before = mem::replace(&mut self.current, merged);
        self.emit(diff(&before, &self.current));

        let outcome = self.save()?;
        self.previous_snapshot = self.current.clone();

        Ok(SubmitOutcome {
            applied: true,
            reload: outcome.reload,
            persisted: outcome.persisted,
            restart_requested: outcome.restart_requested,
        })
    }

    /// The live sub-tree at `section`. The empty section is the whole tree.
    fn section(&self, section: &str) -> Result<&ConfigValue, StoreError> {
        if section.is_empty() {
            return Ok(&self.current);
        }
        if !self.registry.is_editable_path(section) {
            return Err(StoreError::NotEditable(section.to_string()));
        }
        let value = self
            .current
            .get_path(section)
            .ok_or_else(|| StoreError::UnknownSection(section.to_string()))?;
        if !value.is_container() {
            return Err(StoreError::NotASection(section.to_string()));
        }
        Ok(value)
    }

    /// Re-root field paths so the section becomes a single leading segment.
    ///
    /// Fields always carry full paths. Under the whole tree they are given
    /// a synthetic root, which decoding drops again.
    fn rebase_fields(&self, section: &str, fields: &[FormField]) -> Result<Vec<FormField>, StoreError> {
        let root = if section.is_empty() {
            WHOLE_TREE_ROOT
        } else {
            last_segment(section)
        };
        fields
            .iter()
            .map(|field| {
                let rest = if section.is_empty() {
                    Some(field.path.as_str()).filter(|path| !path.is_empty())
                } else {
                    field
                        .path
                        .strip_prefix(section)
                        .and_then(|rest| rest.strip_prefix('.'))
                };
                let rest = rest.ok_or_else(|| StoreError::FieldOutsideSection {
                    section: section.to_string(),
                    path: field.path.clone(),
                })?;
                if !self.registry.is_editable_path(&field.path) {
                    return Err(StoreError::NotEditable(field.path.clone()));
                }
                Ok(FormField {
                    path: format!("{}.{}", root, rest),
                    ..field.clone()
                })
            })
            .collect()
    }

    fn require(&self, phase: StorePhase, operation: &'static str) -> Result<(), StoreError> {
        if self.phase == phase {
            Ok(())
        } else {
            Err(StoreError::Phase {
                operation,
                phase: self.phase,
            })
        }
    }
}
