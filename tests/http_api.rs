//! HTTP API tests against a real listener.

use reqwest::StatusCode;
use serde_json::{json, Value};

use config_editor::form::{ControlNode, FormField};
use config_editor::http::{StatusResponse, SubmitRequest, X_REQUEST_ID};
use config_editor::store::{Notice, StorePhase, SubmitOutcome};
use config_editor::tree::ConfigValue;

mod common;

use common::{start_server, Fixture};

#[tokio::test]
async fn test_status_reports_ready_store() {
    let fixture = Fixture::in_memory();
    let server = start_server(&fixture, None).await;

    let res = reqwest::get(server.url("/api/status")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers().contains_key(X_REQUEST_ID));

    let status: StatusResponse = res.json().await.unwrap();
    assert_eq!(status.key, "test_app_config");
    assert_eq!(status.phase, StorePhase::Ready);
    assert!(!status.user_overrides);

    server.stop().await;
}

#[tokio::test]
async fn test_edit_round_trip() {
    let fixture = Fixture::in_memory();
    let server = start_server(&fixture, None).await;
    let client = reqwest::Client::new();

    let tree: ControlNode = client
        .get(server.url("/api/config/ui"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(tree.name, "ui");

    let mut fields = tree.to_form_fields();
    for field in &mut fields {
        if field.path == "ui.theme" {
            field.raw_value = "dark".to_string();
        }
    }

    let res = client
        .post(server.url("/api/config/ui"))
        .json(&SubmitRequest { fields })
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let outcome: SubmitOutcome = res.json().await.unwrap();
    assert!(outcome.applied);
    assert!(!outcome.reload);

    let tree: ControlNode = client
        .get(server.url("/api/config/ui"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(tree.find("ui.theme").unwrap().value, ConfigValue::from("dark"));

    let notices: Vec<Notice> = client
        .get(server.url("/api/notices"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(notices.iter().any(|n| n.message == "Configuration saved"));

    server.stop().await;
}

#[tokio::test]
async fn test_error_statuses() {
    let fixture = Fixture::in_memory();
    let server = start_server(&fixture, None).await;
    let client = reqwest::Client::new();

    let res = client.get(server.url("/api/config/missing")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = client.get(server.url("/api/config/internal")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let conflicting = SubmitRequest {
        fields: vec![
            FormField::text("general.tags.0", "x"),
            FormField::text("general.tags.label", "y"),
        ],
    };
    let res = client
        .post(server.url("/api/config/general"))
        .json(&conflicting)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = res.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("general.tags"));

    let outside = SubmitRequest {
        fields: vec![FormField::text("ui.theme", "dark")],
    };
    let res = client
        .post(server.url("/api/config/general"))
        .json(&outside)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    server.stop().await;
}

#[tokio::test]
async fn test_new_child_for_sequence() {
    let fixture = Fixture::in_memory();
    let server = start_server(&fixture, None).await;

    let res = reqwest::Client::new()
        .get(server.url("/api/config/general/new-child"))
        .query(&[("path", "general.tags")])
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let row: ControlNode = res.json().await.unwrap();
    assert_eq!(row.path, "general.tags.2");

    let res = reqwest::Client::new()
        .get(server.url("/api/config/general/new-child"))
        .query(&[("path", "general.name")])
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    server.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_clear_restarts() {
    let fixture = Fixture::in_memory();
    let server = start_server(&fixture, None).await;

    let res = reqwest::Client::new()
        .delete(server.url("/api/config"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body, json!({"removed": true, "restart_requested": true}));
    assert_eq!(fixture.restart.count(), 1);

    server.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_whole_tree_edit_spans_sections() {
    let fixture = Fixture::in_memory();
    let server = start_server(&fixture, None).await;
    let client = reqwest::Client::new();

    let tree: ControlNode = client
        .get(server.url("/api/config"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(tree.find("ui.theme").is_some());
    assert!(tree.find("internal.token").is_none());

    let res = client
        .post(server.url("/api/config"))
        .json(&SubmitRequest {
            fields: vec![
                FormField::text("ui.theme", "dark"),
                FormField::checkbox("general.verbose", true),
            ],
        })
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let outcome: SubmitOutcome = res.json().await.unwrap();
    assert!(outcome.applied);
    assert!(outcome.reload);
    assert!(outcome.persisted);
    assert_eq!(fixture.restart.count(), 1);

    let res = client
        .get(server.url("/api/config/ui/new-child"))
        .query(&[("path", "ui.theme")])
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = client.get(server.url("/api/config/ui.theme")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    server.stop().await;
}

#[tokio::test]
async fn test_api_key_required_when_configured() {
    let fixture = Fixture::in_memory();
    let server = start_server(&fixture, Some("secret")).await;
    let client = reqwest::Client::new();

    let res = client.get(server.url("/api/status")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = client
        .get(server.url("/api/status"))
        .bearer_auth("wrong")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = client
        .get(server.url("/api/status"))
        .bearer_auth("secret")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    server.stop().await;
}
