//! Configuration editor service.
//!
//! Serves a JSON API for viewing and editing an application's layered
//! configuration, persisting only the user's delta from the defaults.
//!
//! # Architecture Overview
//!
//! ```text
//!                  ┌──────────────────────────────────────────────────────┐
//!                  │                   SUPERVISOR (main)                   │
//!                  │                                                       │
//!   settings ─────▶│  open storage ─▶ build store ─▶ serve ─┐              │
//!                  │        ▲                               │              │
//!                  │        └──── restart request ◀─────────┤              │
//!                  │                                        ▼              │
//!                  │                              SIGINT/SIGTERM ─▶ exit   │
//!                  │                                                       │
//!   HTTP client ──▶│  http ─▶ store ─▶ form / tree ─▶ storage              │
//!                  │             │                                         │
//!                  │             └──▶ notices, restart trigger             │
//!                  └──────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::Mutex;

use config_editor::config::{load_settings, EditorSettings, SourceWatcher};
use config_editor::http::EditorServer;
use config_editor::lifecycle::signals::terminate_signal;
use config_editor::lifecycle::{build_store_from_sources, open_storage, Shutdown};
use config_editor::observability::{logging, metrics};
use config_editor::store::{
    Collaborators, NoticeLevel, NoticeLog, Notifier, RestartSender, RestartTrigger,
};

#[derive(Parser, Debug)]
#[command(name = "config-editor", version, about = "Layered configuration editor service")]
struct Args {
    /// Settings file (TOML). Built-in defaults are used when omitted.
    #[arg(short, long, env = "CONFIG_EDITOR_SETTINGS")]
    settings: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let settings = match &args.settings {
        Some(path) => load_settings(path)?,
        None => EditorSettings::default(),
    };

    logging::init(&settings.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "config-editor starting");

    if settings.observability.metrics_enabled {
        match settings.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %settings.observability.metrics_address,
                "Failed to parse metrics address: {}",
                e
            ),
        }
    }

    let storage = open_storage(&settings.storage);
    let notices = Arc::new(NoticeLog::default());
    let (restart, mut restarts) = RestartSender::channel();
    let restart: Arc<dyn RestartTrigger> = Arc::new(restart);

    let _watcher = if settings.sources.watch {
        match SourceWatcher::new(&settings.sources, restart.clone()).run() {
            Ok(watcher) => Some(watcher),
            Err(e) => {
                tracing::error!("Failed to watch configuration sources: {}", e);
                None
            }
        }
    } else {
        None
    };

    let terminate = terminate_signal();
    tokio::pin!(terminate);
    let mut cycle: u64 = 0;

    loop {
        cycle += 1;
        let store = build_store_from_sources(
            &settings,
            Collaborators {
                storage: storage.clone(),
                restart: restart.clone(),
                notifier: notices.clone(),
            },
        )?;
        let store = Arc::new(Mutex::new(store));

        let listener = TcpListener::bind(&settings.server.bind_address).await?;
        tracing::info!(
            address = %listener.local_addr()?,
            cycle,
            "Listening for connections"
        );

        let shutdown = Shutdown::new();
        let server = EditorServer::new(&settings.server, &settings.api, store, notices.clone());
        let serving = tokio::spawn(server.run(listener, shutdown.signalled()));

        let exit = tokio::select! {
            _ = &mut terminate => true,
            request = restarts.recv() => match request {
                Some(request) => {
                    tracing::info!(
                        reason = request.reason.as_deref().unwrap_or("unspecified"),
                        "Restarting"
                    );
                    false
                }
                None => true,
            },
        };

        shutdown.trigger();
        serving.await??;

        if exit {
            break;
        }
        while restarts.try_recv().is_ok() {}
        notices.notify("Configuration reloaded", NoticeLevel::Info);
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
