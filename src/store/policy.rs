//! Reload policy.
//!
//! Decides whether a set of changed paths can be applied to the running
//! process or needs a restart. A change is safe only when every changed
//! path is registered as no-reload.

use std::collections::HashSet;

use crate::form::DescriptorRegistry;
use crate::tree::ConfigDelta;

/// True when at least one changed path is not in `no_reload`.
///
/// An empty delta never needs a reload.
pub fn needs_reload(delta: &ConfigDelta, no_reload: &HashSet<String>) -> bool {
    let changed = delta.len();
    let no_reload_changed = delta.keys().filter(|k| no_reload.contains(*k)).count();
    changed > 0 && no_reload_changed < changed
}

/// Outcome of classifying a delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReloadDecision {
    pub changed: usize,
    pub no_reload_changed: usize,
    pub reload: bool,
}

/// The set of paths that can change without a restart.
#[derive(Debug, Clone, Default)]
pub struct ReloadPolicy {
    no_reload: HashSet<String>,
}

impl ReloadPolicy {
    pub fn new<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            no_reload: paths.into_iter().map(Into::into).collect(),
        }
    }

    /// Registry paths annotated `reload = false`, plus `extra`.
    pub fn from_registry<I, S>(registry: &DescriptorRegistry, extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut policy = Self::new(extra);
        policy
            .no_reload
            .extend(registry.no_reload_paths().map(str::to_string));
        policy
    }

    pub fn is_no_reload(&self, path: &str) -> bool {
        self.no_reload.contains(path)
    }

    pub fn classify(&self, delta: &ConfigDelta) -> ReloadDecision {
        let changed = delta.len();
        let no_reload_changed = delta.keys().filter(|k| self.is_no_reload(k)).count();
        ReloadDecision {
            changed,
            no_reload_changed,
            reload: needs_reload(delta, &self.no_reload),
        }
    }
}
