//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::json;
use tokio::net::TcpListener;

use config_editor::config::{ApiConfig, EditorSettings, ServerConfig};
use config_editor::form::DescriptorRegistry;
use config_editor::http::EditorServer;
use config_editor::lifecycle::{build_store, Shutdown};
use config_editor::store::{
    Collaborators, ConfigStore, KeyValueStore, MemoryStore, NoticeLog, RestartError,
    RestartTrigger, StorageError,
};
use config_editor::tree::ConfigValue;

/// Defaults shipped with the test application.
pub fn sample_defaults() -> ConfigValue {
    ConfigValue::from(json!({
        "general": {
            "name": "demo",
            "retries": 3,
            "verbose": false,
            "tags": ["alpha", "beta"]
        },
        "ui": {
            "theme": "light",
            "font_size": 12,
            "panels": {"left": {"width": 200}}
        },
        "internal": {"token": "abc"}
    }))
}

/// Settings with live `ui.theme` and a hidden `internal` section.
pub fn sample_settings() -> EditorSettings {
    let mut settings = EditorSettings::default();
    settings.app_name = "Test App".to_string();
    settings.no_reload = vec!["ui.theme".to_string(), "ui.font_size".to_string()];
    settings.fields = DescriptorRegistry::new().with(
        "internal",
        config_editor::form::FieldDescriptor::hidden(),
    );
    settings
}

/// Restart trigger that counts requests.
#[derive(Debug, Default)]
pub struct CountingRestart {
    count: AtomicUsize,
    reasons: Mutex<Vec<String>>,
}

impl CountingRestart {
    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    pub fn reasons(&self) -> Vec<String> {
        self.reasons.lock().unwrap().clone()
    }
}

impl RestartTrigger for CountingRestart {
    fn request_restart(&self, reason: Option<&str>) -> Result<(), RestartError> {
        self.count.fetch_add(1, Ordering::SeqCst);
        if let Some(reason) = reason {
            self.reasons.lock().unwrap().push(reason.to_string());
        }
        Ok(())
    }
}

/// Memory store whose writes can be made to fail.
#[derive(Debug, Default)]
pub struct FailingStore {
    inner: MemoryStore,
    fail: AtomicBool,
}

impl FailingStore {
    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

impl KeyValueStore for FailingStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(StorageError::Write {
                key: key.to_string(),
                source: std::io::Error::other("quota exceeded"),
            });
        }
        self.inner.set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.inner.remove(key)
    }
}

/// Everything a store needs, kept so tests can inspect it afterwards.
pub struct Fixture {
    pub settings: EditorSettings,
    pub storage: Arc<dyn KeyValueStore>,
    pub restart: Arc<CountingRestart>,
    pub notices: Arc<NoticeLog>,
}

impl Fixture {
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self {
            settings: sample_settings(),
            storage,
            restart: Arc::new(CountingRestart::default()),
            notices: Arc::new(NoticeLog::default()),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            storage: self.storage.clone(),
            restart: self.restart.clone(),
            notifier: self.notices.clone(),
        }
    }

    /// Build a Ready store, as a fresh process start would.
    pub fn start(&self) -> ConfigStore {
        build_store(
            &self.settings,
            &sample_defaults(),
            &ConfigValue::mapping(),
            self.collaborators(),
        )
        .unwrap()
    }
}

/// A running API server on an ephemeral port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    handle: tokio::task::JoinHandle<Result<(), std::io::Error>>,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn stop(self) {
        self.shutdown.trigger();
        self.handle.await.unwrap().unwrap();
    }
}

pub async fn start_server(fixture: &Fixture, api_key: Option<&str>) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let store = Arc::new(tokio::sync::Mutex::new(fixture.start()));
    let api = ApiConfig {
        api_key: api_key.map(str::to_string),
    };
    let server = EditorServer::new(&ServerConfig::default(), &api, store, fixture.notices.clone());

    let shutdown = Shutdown::new();
    let handle = tokio::spawn(server.run(listener, shutdown.signalled()));

    TestServer {
        addr,
        shutdown,
        handle,
    }
}
