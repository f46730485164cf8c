//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing, timeout, body limit, request ID, auth)
//! - Bind server to listener and stop on the cycle's shutdown signal
//!
//! # Design Decisions
//! - The store sits behind one async mutex; a request holds it for the
//!   whole decode, merge and save, so submissions never interleave
//! - The notice log is read without touching the store lock
//! - Saves and clears hand the worker's other tasks off before touching
//!   storage, since the file store writes and syncs synchronously

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::HeaderName,
    middleware,
    routing::get,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tower::ServiceBuilder;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::{ApiConfig, ServerConfig};
use crate::http::auth::api_auth_middleware;
use crate::http::handlers;
use crate::store::{ConfigStore, NoticeLog};

pub const X_REQUEST_ID: &str = "x-request-id";

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Mutex<ConfigStore>>,
    pub notices: Arc<NoticeLog>,
    pub api_key: Option<Arc<str>>,
}

/// HTTP server for the configuration API.
pub struct EditorServer {
    router: Router,
}

impl EditorServer {
    pub fn new(
        server: &ServerConfig,
        api: &ApiConfig,
        store: Arc<Mutex<ConfigStore>>,
        notices: Arc<NoticeLog>,
    ) -> Self {
        let state = AppState {
            store,
            notices,
            api_key: api.api_key.as_deref().map(Arc::from),
        };
        Self {
            router: Self::build_router(server, state),
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ServerConfig, state: AppState) -> Router {
        let request_id = HeaderName::from_static(X_REQUEST_ID);

        let api = Router::new()
            .route("/status", get(handlers::get_status))
            .route(
                "/config",
                get(handlers::get_tree)
                    .post(handlers::submit_tree)
                    .delete(handlers::clear_config),
            )
            .route(
                "/config/{section}",
                get(handlers::get_section).post(handlers::submit_section),
            )
            .route("/config/{section}/new-child", get(handlers::new_child))
            .route("/notices", get(handlers::get_notices))
            .layer(middleware::from_fn_with_state(state.clone(), api_auth_middleware));

        Router::new()
            .nest("/api", api)
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::new(request_id.clone(), MakeRequestUuid))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::new(request_id))
                    .layer(RequestBodyLimitLayer::new(config.max_body_bytes))
                    .layer(TimeoutLayer::new(Duration::from_secs(config.request_timeout_secs))),
            )
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve until `shutdown` resolves, then drain in-flight requests.
    pub async fn run<F>(self, listener: TcpListener, shutdown: F) -> Result<(), std::io::Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
