//! End-to-end session tests: SQLite file store, in-memory secrets, and the
//! HTTP location sync against a mock backend.
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use tokio::runtime::Handle;
use weathernow_auth::{LoginPayload, MemorySecretStore};
use weathernow_core::{BackendConfig, Location};
use weathernow_session::{HttpLocationSync, SessionStore, SqliteKvStore};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn backend(server: &MockServer) -> BackendConfig {
    BackendConfig {
        base_url: server.uri(),
        request_timeout_secs: 5,
    }
}

fn open_store(dir: &TempDir, server: &MockServer, secrets: Arc<MemorySecretStore>) -> SessionStore {
    let kv = SqliteKvStore::new(dir.path().join("weathernow.db")).unwrap();
    let sync = HttpLocationSync::new(&backend(server)).unwrap();
    SessionStore::new(Arc::new(kv), secrets, Arc::new(sync), Handle::current())
}

/// Wait until the mock server has seen `count` requests.
async fn wait_for_requests(server: &MockServer, count: usize) -> Vec<wiremock::Request> {
    for _ in 0..100 {
        let requests = server.received_requests().await.unwrap_or_default();
        if requests.len() >= count {
            return requests;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("expected {} requests to reach the mock backend", count);
}

fn reno() -> Location {
    Location::new("Reno", 39.5, -119.8)
        .with_state("NV")
        .with_country("US")
}

#[tokio::test]
async fn test_locations_survive_restart() {
    let dir = TempDir::new().unwrap();
    let mock_server = MockServer::start().await;

    {
        let store = open_store(&dir, &mock_server, Arc::new(MemorySecretStore::new()));
        store.restore();
        store.add_location(reno()).unwrap();
        store
            .add_location(Location::new("Tokyo", 35.68, 139.69))
            .unwrap();
    }

    let store = open_store(&dir, &mock_server, Arc::new(MemorySecretStore::new()));
    store.restore();

    let cities: Vec<_> = store.locations().into_iter().map(|l| l.city).collect();
    assert_eq!(cities, vec!["Reno", "Tokyo"]);
    assert!(!store.is_logged_in());

    // Nobody was logged in, so nothing went to the server.
    assert!(mock_server
        .received_requests()
        .await
        .unwrap_or_default()
        .is_empty());
}

#[tokio::test]
async fn test_logged_in_add_reaches_backend() {
    let dir = TempDir::new().unwrap();
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/mobileLocations/add"))
        .and(header("authorization", "Bearer t1"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let store = open_store(&dir, &mock_server, Arc::new(MemorySecretStore::new()));
    store.login(LoginPayload {
        email: "a@b.com".into(),
        token: "t1".into(),
        locations: None,
    });
    assert!(store.add_location(reno()).unwrap());

    let requests = wait_for_requests(&mock_server, 1).await;
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["jsonUserEmail"], "a@b.com");
    assert_eq!(body["jsonCity"], "Reno");
    assert_eq!(body["jsonState"], "NV");
}

#[tokio::test]
async fn test_backend_failure_does_not_undo_delete() {
    let dir = TempDir::new().unwrap();
    let mock_server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/mobileLocations/delete"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(serde_json::json!({"error": "db down"})),
        )
        .mount(&mock_server)
        .await;

    let store = open_store(&dir, &mock_server, Arc::new(MemorySecretStore::new()));
    store.login(LoginPayload {
        email: "a@b.com".into(),
        token: "t1".into(),
        locations: Some(vec![reno()]),
    });

    assert!(store.delete_location(&reno()));
    wait_for_requests(&mock_server, 1).await;

    assert!(store.locations().is_empty());

    let reopened = open_store(&dir, &mock_server, Arc::new(MemorySecretStore::new()));
    reopened.restore();
    assert!(reopened.locations().is_empty());
}

#[tokio::test]
async fn test_logout_after_login_clears_everything() {
    let dir = TempDir::new().unwrap();
    let mock_server = MockServer::start().await;
    let secrets = Arc::new(MemorySecretStore::new());

    let store = open_store(&dir, &mock_server, secrets.clone());
    store.login(LoginPayload {
        email: "a@b.com".into(),
        token: "t1".into(),
        locations: Some(vec![reno()]),
    });
    assert_eq!(store.user().as_deref(), Some("a@b.com"));
    assert_eq!(store.locations().len(), 1);

    store.logout();

    let session = store.snapshot();
    assert_eq!(session.user, None);
    assert_eq!(session.token, None);
    assert!(session.locations.is_empty());
    assert_eq!(secrets.raw_token(), None);
}

#[tokio::test]
async fn test_login_survives_restart() {
    let dir = TempDir::new().unwrap();
    let mock_server = MockServer::start().await;
    let secrets = Arc::new(MemorySecretStore::new());

    Mock::given(method("POST"))
        .and(path("/mobileLocations/add"))
        .and(header("authorization", "Bearer t1"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    {
        let store = open_store(&dir, &mock_server, secrets.clone());
        store.login(LoginPayload {
            email: "a@b.com".into(),
            token: "t1".into(),
            locations: None,
        });
    }

    let store = open_store(&dir, &mock_server, secrets.clone());
    store.restore();
    assert!(store.resume());
    assert!(store.is_logged_in());

    assert!(store.add_location(reno()).unwrap());
    store.wait_for_sync().await;

    let requests = mock_server.received_requests().await.unwrap_or_default();
    assert_eq!(requests.len(), 1);
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["jsonUserEmail"], "a@b.com");
}
