//! Firestore listener tests against a mock `runQuery` endpoint.

#![cfg(not(target_arch = "wasm32"))]

use std::sync::Arc;
use std::time::Duration;

use cumeets_business::{
    Directory, DirectoryView, FirebaseConfig, FirestoreStore, Predicate, Role, StoreError,
};
use serde_json::{Value, json};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_partial_json, method, path, query_param},
};

const RUN_QUERY_PATH: &str = "/v1/projects/cu-meets/databases/(default)/documents:runQuery";

struct FirestoreTestContext {
    mock_server: MockServer,
    config: FirebaseConfig,
}

impl FirestoreTestContext {
    async fn new() -> Self {
        let mock_server = MockServer::start().await;
        let config = FirebaseConfig::new("cu-meets", "test-key")
            .with_base_url(mock_server.uri())
            .with_poll_interval(Duration::from_millis(20));
        Self {
            mock_server,
            config,
        }
    }

    fn store(&self) -> FirestoreStore {
        FirestoreStore::new(self.config.clone()).expect("runtime is available")
    }

    async fn mock_users(&self, type_tag: &str, documents: Value) {
        Mock::given(method("POST"))
            .and(path(RUN_QUERY_PATH))
            .and(query_param("key", "test-key"))
            .and(body_partial_json(json!({
                "structuredQuery": {
                    "from": [{"collectionId": "users"}],
                    "where": {"fieldFilter": {"value": {"stringValue": type_tag}}}
                }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(documents))
            .mount(&self.mock_server)
            .await;
    }

    /// Answers only the first matching poll; later polls fall through to
    /// mocks mounted after this one.
    async fn mock_users_once(&self, type_tag: &str, documents: Value) {
        Mock::given(method("POST"))
            .and(path(RUN_QUERY_PATH))
            .and(body_partial_json(json!({
                "structuredQuery": {
                    "where": {"fieldFilter": {"value": {"stringValue": type_tag}}}
                }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(documents))
            .up_to_n_times(1)
            .mount(&self.mock_server)
            .await;
    }

    async fn mock_failure(&self, status: u16, body: Value) {
        Mock::given(method("POST"))
            .and(path(RUN_QUERY_PATH))
            .respond_with(ResponseTemplate::new(status).set_body_json(body))
            .mount(&self.mock_server)
            .await;
    }

    async fn run_query_requests(&self) -> usize {
        self.mock_server
            .received_requests()
            .await
            .map(|requests| requests.len())
            .unwrap_or_default()
    }
}

fn firestore_user(id: &str, name: &str, major: &str, kind: &str) -> Value {
    json!({
        "document": {
            "name": format!("projects/cu-meets/databases/(default)/documents/users/{id}"),
            "fields": {
                "name": {"stringValue": name},
                "major": {"stringValue": major},
                "graduation": {"integerValue": "2021"},
                "type": {"stringValue": kind}
            },
            "createTime": "2024-01-01T00:00:00Z",
            "updateTime": "2024-01-01T00:00:00Z"
        },
        "readTime": "2024-01-02T00:00:00Z"
    })
}

async fn wait(directory: &mut Directory) {
    tokio::time::timeout(Duration::from_secs(5), directory.wait_for_update())
        .await
        .expect("directory update should arrive");
}

#[test]
fn new_without_runtime_fails() {
    let err = FirestoreStore::new(FirebaseConfig::new("cu-meets", "test-key"))
        .expect_err("no runtime outside async context");
    assert!(matches!(err, StoreError::NoRuntime));
}

#[tokio::test]
async fn fetch_decodes_documents() {
    let ctx = FirestoreTestContext::new().await;
    ctx.mock_users(
        "Alumni",
        json!([firestore_user("a1", "Amy Lee", "CS", "Alumni")]),
    )
    .await;

    let docs = ctx
        .store()
        .fetch("users", &Predicate::equals("type", "Alumni"))
        .await
        .expect("fetch should succeed");

    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].id, "a1");
    assert_eq!(docs[0].field("graduation"), Some(&json!(2021)));
}

#[tokio::test]
async fn fetch_surfaces_firestore_error_message() {
    let ctx = FirestoreTestContext::new().await;
    ctx.mock_failure(
        403,
        json!({"error": {"code": 403, "message": "Missing or insufficient permissions.", "status": "PERMISSION_DENIED"}}),
    )
    .await;

    let err = ctx
        .store()
        .fetch("users", &Predicate::equals("type", "Alumni"))
        .await
        .expect_err("403 should fail");

    assert!(matches!(err, StoreError::Status { status: 403, .. }));
    assert!(err.to_string().contains("Missing or insufficient permissions."));
}

#[tokio::test]
async fn directory_loads_from_firestore() {
    let ctx = FirestoreTestContext::new().await;
    ctx.mock_users(
        "Alumni",
        json!([
            firestore_user("a1", "Amy Lee", "CS", "Alumni"),
            firestore_user("a2", "Bo Park", "Econ", "Alumni"),
        ]),
    )
    .await;

    let mut directory = Directory::from_config(Arc::new(ctx.store()), &ctx.config);
    directory.mount();
    wait(&mut directory).await;

    directory.set_query("CS");
    let users = directory.view().users().iter().map(|u| u.id.clone()).collect::<Vec<_>>();
    assert_eq!(users, vec!["a1"]);
    assert_eq!(directory.users()[0].graduation.as_deref(), Some("2021"));
}

#[tokio::test]
async fn unchanged_results_are_not_redelivered() {
    let ctx = FirestoreTestContext::new().await;
    ctx.mock_users(
        "Alumni",
        json!([firestore_user("a1", "Amy Lee", "CS", "Alumni")]),
    )
    .await;

    let mut directory = Directory::from_config(Arc::new(ctx.store()), &ctx.config);
    directory.mount();
    wait(&mut directory).await;

    // Let several polls happen.
    tokio::time::sleep(Duration::from_millis(150)).await;

    assert!(ctx.run_query_requests().await >= 2);
    assert!(!directory.sync());
}

#[tokio::test]
async fn changed_results_are_redelivered() {
    let ctx = FirestoreTestContext::new().await;
    ctx.mock_users_once(
        "Alumni",
        json!([firestore_user("a1", "Amy Lee", "CS", "Alumni")]),
    )
    .await;
    ctx.mock_users(
        "Alumni",
        json!([
            firestore_user("a1", "Amy Lee", "CS", "Alumni"),
            firestore_user("a2", "Bo Park", "Econ", "Alumni"),
        ]),
    )
    .await;

    let mut directory = Directory::from_config(Arc::new(ctx.store()), &ctx.config);
    directory.mount();
    wait(&mut directory).await;
    assert_eq!(directory.users().len(), 1);

    wait(&mut directory).await;
    let ids: Vec<_> = directory.users().iter().map(|u| u.id.as_str()).collect();
    assert_eq!(ids, vec!["a1", "a2"]);
}

#[tokio::test]
async fn unmount_stops_polling() {
    let ctx = FirestoreTestContext::new().await;
    ctx.mock_users(
        "Alumni",
        json!([firestore_user("a1", "Amy Lee", "CS", "Alumni")]),
    )
    .await;

    let mut directory = Directory::from_config(Arc::new(ctx.store()), &ctx.config);
    directory.mount();
    wait(&mut directory).await;
    tokio::time::sleep(Duration::from_millis(60)).await;

    directory.unmount();
    // A poll already in flight may still land.
    tokio::time::sleep(Duration::from_millis(50)).await;
    let after_unmount = ctx.run_query_requests().await;
    assert!(after_unmount >= 2);

    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(ctx.run_query_requests().await, after_unmount);
}

#[tokio::test]
async fn role_switch_queries_students() {
    let ctx = FirestoreTestContext::new().await;
    ctx.mock_users(
        "Alumni",
        json!([firestore_user("a1", "Amy Lee", "CS", "Alumni")]),
    )
    .await;
    ctx.mock_users(
        "Student",
        json!([firestore_user("s1", "Sam Ortiz", "Biology", "Student")]),
    )
    .await;

    let mut directory = Directory::from_config(Arc::new(ctx.store()), &ctx.config);
    directory.mount();
    wait(&mut directory).await;

    directory.set_role(Role::Student);
    wait(&mut directory).await;

    assert_eq!(directory.role(), Role::Student);
    assert_eq!(directory.users().len(), 1);
    assert_eq!(directory.users()[0].id, "s1");
}

#[tokio::test]
async fn http_failure_reaches_view() {
    let ctx = FirestoreTestContext::new().await;
    ctx.mock_failure(
        500,
        json!([{"error": {"code": 500, "message": "backend unavailable"}}]),
    )
    .await;

    let mut directory = Directory::from_config(Arc::new(ctx.store()), &ctx.config);
    directory.mount();
    wait(&mut directory).await;

    assert!(directory.users().is_empty());
    assert!(!directory.is_loading());
    match directory.view() {
        DirectoryView::Error(message) => assert!(message.contains("backend unavailable")),
        other => panic!("expected error view, got {other:?}"),
    }
}
