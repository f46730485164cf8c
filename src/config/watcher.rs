//! Source file watcher.
//!
//! The base tree is only computed at startup, so a change to the packaged
//! defaults or the runtime overrides is picked up by restarting.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};

use crate::config::loader::load_value;
use crate::config::schema::SourcesConfig;
use crate::store::RestartTrigger;

/// Watches configuration source files and requests a restart on change.
pub struct SourceWatcher {
    paths: Vec<PathBuf>,
    restart: Arc<dyn RestartTrigger>,
}

impl SourceWatcher {
    pub fn new(sources: &SourcesConfig, restart: Arc<dyn RestartTrigger>) -> Self {
        let paths = std::iter::once(sources.defaults.clone())
            .chain(sources.overrides.clone())
            .collect();
        Self { paths, restart }
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    /// Start watching in a background thread.
    ///
    /// The returned watcher must be kept alive for as long as changes
    /// should be observed.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let restart = self.restart.clone();
        let paths = self.paths.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if !(event.kind.is_modify() || event.kind.is_create()) {
                        return;
                    }
                    let Some(changed) = event.paths.iter().find(|p| is_watched(&paths, p)) else {
                        return;
                    };
                    on_source_changed(changed, restart.as_ref());
                }
                Err(e) => tracing::error!("Watch error: {:?}", e),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        for path in &self.paths {
            watcher.watch(path, RecursiveMode::NonRecursive)?;
        }

        tracing::info!(paths = ?self.paths, "Source watcher started");
        Ok(watcher)
    }
}

fn is_watched(paths: &[PathBuf], candidate: &Path) -> bool {
    paths
        .iter()
        .any(|p| candidate == p || candidate.ends_with(p) || p.file_name() == candidate.file_name())
}

/// Request a restart if the changed source still parses.
fn on_source_changed(path: &Path, restart: &dyn RestartTrigger) {
    tracing::info!(path = ?path, "Configuration source changed");
    if let Err(e) = load_value(path) {
        tracing::error!(
            path = ?path,
            "Changed source does not parse: {}. Keeping current configuration.",
            e
        );
        return;
    }
    if let Err(e) = restart.request_restart(Some("configuration source changed")) {
        tracing::error!("Failed to request restart: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::RestartSender;

    #[test]
    fn test_watches_defaults_and_overrides() {
        let (restart, _rx) = RestartSender::channel();
        let sources = SourcesConfig {
            defaults: PathBuf::from("conf/defaults.toml"),
            overrides: Some(PathBuf::from("conf/local.toml")),
            watch: true,
        };

        let watcher = SourceWatcher::new(&sources, Arc::new(restart));
        assert_eq!(watcher.paths().len(), 2);
        assert!(is_watched(watcher.paths(), Path::new("/abs/conf/local.toml")));
        assert!(!is_watched(watcher.paths(), Path::new("/abs/conf/other.toml")));
    }

    #[test]
    fn test_valid_change_requests_restart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("defaults.toml");
        std::fs::write(&path, "debug = true\n").unwrap();
        let (restart, mut rx) = RestartSender::channel();

        on_source_changed(&path, &restart);
        assert!(rx.try_recv().is_ok());

        std::fs::write(&path, "debug = \n").unwrap();
        on_source_changed(&path, &restart);
        assert!(rx.try_recv().is_err());
    }
}
