//! API request handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tokio::runtime::{Handle, RuntimeFlavor};

use crate::form::{ControlNode, FormField};
use crate::http::error::{ApiError, ErrorBody};
use crate::http::server::AppState;
use crate::store::{ClearOutcome, Notice, StorePhase, SubmitOutcome, WatchState};

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub version: String,
    pub key: String,
    pub phase: StorePhase,
    pub watch: WatchState,
    pub user_overrides: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitRequest {
    pub fields: Vec<FormField>,
}

#[derive(Debug, Deserialize)]
pub struct NoticesQuery {
    pub since: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct NewChildQuery {
    /// Container control to add a row to.
    pub path: String,
    /// Key for the new entry of an object control.
    pub key: Option<String>,
}

pub async fn get_status(State(state): State<AppState>) -> Json<StatusResponse> {
    let store = state.store.lock().await;
    Json(StatusResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
        key: store.key().to_string(),
        phase: store.phase(),
        watch: store.watch_state(),
        user_overrides: store.has_user_overrides(),
    })
}

pub async fn get_section(
    State(state): State<AppState>,
    Path(section): Path<String>,
) -> Result<Json<ControlNode>, ApiError> {
    let store = state.store.lock().await;
    Ok(Json(store.get_editable_tree(&section)?))
}

pub async fn submit_section(
    State(state): State<AppState>,
    Path(section): Path<String>,
    Json(request): Json<SubmitRequest>,
) -> Result<Json<SubmitOutcome>, ApiError> {
    submit(&state, &section, &request).await
}

/// Control tree for the whole configuration.
pub async fn get_tree(State(state): State<AppState>) -> Result<Json<ControlNode>, ApiError> {
    let store = state.store.lock().await;
    Ok(Json(store.get_editable_tree("")?))
}

/// Edits spanning several top-level sections in one submission.
pub async fn submit_tree(
    State(state): State<AppState>,
    Json(request): Json<SubmitRequest>,
) -> Result<Json<SubmitOutcome>, ApiError> {
    submit(&state, "", &request).await
}

async fn submit(
    state: &AppState,
    section: &str,
    request: &SubmitRequest,
) -> Result<Json<SubmitOutcome>, ApiError> {
    tracing::debug!(section = %section, fields = request.fields.len(), "Submitting edits");
    let mut store = state.store.lock().await;
    let outcome = with_blocking_io(|| store.submit_edits(section, &request.fields))?;
    Ok(Json(outcome))
}

/// Run store work that may write to durable storage.
///
/// On a multi-threaded runtime the worker is handed off first so other
/// tasks keep running during the write.
fn with_blocking_io<T>(f: impl FnOnce() -> T) -> T {
    match Handle::try_current().map(|handle| handle.runtime_flavor()) {
        Ok(RuntimeFlavor::MultiThread) => tokio::task::block_in_place(f),
        _ => f(),
    }
}

/// Blank control for the add-row action of a container.
pub async fn new_child(
    State(state): State<AppState>,
    Path(section): Path<String>,
    Query(query): Query<NewChildQuery>,
) -> Result<Response, ApiError> {
    let store = state.store.lock().await;
    let tree = store.get_editable_tree(&section)?;

    let child = tree
        .find(&query.path)
        .and_then(|node| node.new_child(query.key.as_deref()));

    Ok(match child {
        Some(child) => Json(child).into_response(),
        None => (
            StatusCode::BAD_REQUEST,
            Json(ErrorBody {
                error: format!("cannot add a row to '{}'", query.path),
            }),
        )
            .into_response(),
    })
}

pub async fn clear_config(State(state): State<AppState>) -> Result<Json<ClearOutcome>, ApiError> {
    let mut store = state.store.lock().await;
    Ok(Json(with_blocking_io(|| store.clear())?))
}

pub async fn get_notices(
    State(state): State<AppState>,
    Query(query): Query<NoticesQuery>,
) -> Json<Vec<Notice>> {
    Json(match query.since {
        Some(id) => state.notices.since(id),
        None => state.notices.recent(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_blocking_io_on_multi_thread_runtime() {
        let worker = std::thread::current().id();
        let (value, ran_on) = with_blocking_io(|| (7, std::thread::current().id()));
        assert_eq!(value, 7);
        assert_eq!(ran_on, worker);
    }

    #[tokio::test]
    async fn test_blocking_io_on_current_thread_runtime() {
        assert_eq!(with_blocking_io(|| "done"), "done");
    }

    #[test]
    fn test_blocking_io_outside_runtime() {
        assert_eq!(with_blocking_io(|| 1 + 1), 2);
    }
}
