//! HTTP contract tests for the task repository client.
//!
//! These tests pin the wire format of `/tasks/gp` requests, the accepted
//! response shapes and the forced-logout rule on `401`.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::sync::Arc;

use serde_json::json;
use taskflow_app::{
    AccountService, ApiClient, ApiConfig, ApiError, HttpTaskApi, KeyValueStore, MemoryStore,
    SessionContext, SessionEvent, TaskApi,
};
use taskflow_core::{Priority, TaskDraft, TaskId, TaskPatch};
use time::macros::date;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct Harness {
    store: Arc<MemoryStore>,
    session: Arc<SessionContext>,
    api: HttpTaskApi,
}

async fn harness(server: &MockServer, token: Option<&str>) -> Harness {
    let store = Arc::new(MemoryStore::new());
    let session = Arc::new(SessionContext::new(store.clone()));
    let config = ApiConfig::with_base_url(format!("{}/api", server.uri()));
    let client = ApiClient::new(&config, session.clone()).unwrap();
    if let Some(token) = token {
        store.set("token", token).unwrap();
        store.set("userId", "u1").unwrap();
        Mock::given(method("GET"))
            .and(path("/api/user/me"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "user": { "id": "u1", "name": "Ada", "email": "ada@example.com" }
            })))
            .mount(server)
            .await;
        AccountService::new(client.clone())
            .restore()
            .await
            .unwrap()
            .expect("stored session confirmed");
    }
    Harness {
        store,
        session,
        api: HttpTaskApi::new(client),
    }
}

fn task_id(raw: &str) -> TaskId {
    raw.parse().expect("valid task id")
}

#[tokio::test]
async fn list_sends_bearer_token_and_accepts_bare_array() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tasks/gp"))
        .and(header("authorization", "Bearer tok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "_id": "a", "title": "Write report", "priority": "High", "completed": "Yes" },
            { "_id": "b", "title": "Call mom", "completed": 0 }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let h = harness(&server, Some("tok")).await;
    let tasks = h.api.list().await.unwrap();
    assert_eq!(tasks.len(), 2);
    assert_eq!(tasks[0].priority, Some(Priority::High));
    assert!(tasks[0].completed);
    assert!(!tasks[1].completed);
}

#[tokio::test]
async fn list_with_data_envelope_equals_bare_array() {
    let records = json!([
        { "_id": "a", "title": "A", "createdAt": "2025-04-01T10:00:00Z" },
        { "id": 2, "title": "B", "completed": true }
    ]);

    let bare_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tasks/gp"))
        .respond_with(ResponseTemplate::new(200).set_body_json(records.clone()))
        .mount(&bare_server)
        .await;

    let wrapped_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tasks/gp"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true, "data": records })))
        .mount(&wrapped_server)
        .await;

    let bare = harness(&bare_server, Some("tok")).await.api.list().await.unwrap();
    let wrapped = harness(&wrapped_server, Some("tok")).await.api.list().await.unwrap();
    assert_eq!(bare, wrapped);
    assert_eq!(bare.len(), 2);
}

#[tokio::test]
async fn list_with_unknown_shape_is_empty() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tasks/gp"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "items": [] })))
        .mount(&server)
        .await;

    let tasks = harness(&server, Some("tok")).await.api.list().await.unwrap();
    assert!(tasks.is_empty());
}

#[tokio::test]
async fn missing_session_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tasks/gp"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let err = harness(&server, None).await.api.list().await.unwrap_err();
    assert!(matches!(err, ApiError::NotAuthenticated));
    assert_eq!(err.user_message(), "No auth token found");
}

#[tokio::test]
async fn create_posts_normalized_payload() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/tasks/gp"))
        .and(body_json(json!({
            "title": "Buy groceries",
            "description": "",
            "priority": "High",
            "dueDate": "2025-05-02",
            "completed": "No"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "success": true,
            "task": { "_id": "new", "title": "Buy groceries", "priority": "High" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut draft = TaskDraft::new("Buy groceries", date!(2025 - 05 - 02));
    draft.priority = Priority::High;
    let created = harness(&server, Some("tok")).await.api.create(&draft).await.unwrap();
    assert_eq!(created.map(|task| task.id), Some(task_id("new")));
}

#[tokio::test]
async fn toggle_sends_completion_only() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/tasks/abc/gp"))
        .and(body_json(json!({ "completed": "Yes" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(1)
        .mount(&server)
        .await;

    harness(&server, Some("tok")).await
        .api
        .toggle_complete(&task_id("abc"), true)
        .await
        .unwrap();
}

#[tokio::test]
async fn server_message_wins_over_fallback() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/tasks/abc/gp"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "message": "Task not found" })))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/tasks/abc/gp"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let h = harness(&server, Some("tok")).await;
    let patch = TaskPatch {
        title: Some("Renamed".into()),
        ..TaskPatch::default()
    };
    let err = h.api.update(&task_id("abc"), &patch).await.unwrap_err();
    assert!(matches!(err, ApiError::Server { status: 404, .. }));
    assert_eq!(err.user_message(), "Task not found");

    let err = h.api.delete(&task_id("abc")).await.unwrap_err();
    assert_eq!(err.user_message(), "Failed to delete task");
}

#[tokio::test]
async fn delete_accepts_no_content() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/tasks/abc/gp"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    harness(&server, Some("tok")).await
        .api
        .delete(&task_id("abc"))
        .await
        .unwrap();
}

#[tokio::test]
async fn unauthorized_mutation_invalidates_session() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/tasks/abc/gp"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "message": "jwt expired" })))
        .expect(1)
        .mount(&server)
        .await;

    let h = harness(&server, Some("tok")).await;
    let mut events = h.session.subscribe();

    let err = h.api.delete(&task_id("abc")).await.unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized));
    assert!(err.is_auth());
    assert!(!h.session.is_authenticated());
    assert_eq!(h.store.get("token").unwrap(), None);
    assert_eq!(h.store.get("userId").unwrap(), None);
    assert_eq!(events.recv().await.unwrap(), SessionEvent::Invalidated);

    // Further calls fail locally.
    let err = h.api.list().await.unwrap_err();
    assert!(matches!(err, ApiError::NotAuthenticated));
}
