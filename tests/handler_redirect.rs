mod common;

use serde_json::Value;
use slug_shortener::domain::RecordStore;
use std::sync::Arc;

#[tokio::test]
async fn test_redirect_success() {
    let (server, store, _verifier) = common::default_server();
    store.put("Xk3pQ9a", "https://example.com/target").await.unwrap();

    let response = server.get("/Xk3pQ9a").await;

    assert_eq!(response.status_code(), 301);
    assert_eq!(response.header("location"), "https://example.com/target");
}

#[tokio::test]
async fn test_redirect_not_found() {
    let (server, _store, _verifier) = common::default_server();

    let response = server.get("/Xk3pQ9a").await;

    assert_eq!(response.status_code(), 404);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "not_found");
}

#[tokio::test]
async fn test_redirect_malformed_slug_never_reaches_store() {
    let (server, store, _verifier) = common::default_server();
    // Wrong length and a symbol outside the alphabet.
    store.put("short", "https://example.com/a").await.unwrap();
    store.put("Xk3pQ0a", "https://example.com/b").await.unwrap();

    assert_eq!(server.get("/short").await.status_code(), 404);
    assert_eq!(server.get("/Xk3pQ0a").await.status_code(), 404);
}

#[tokio::test]
async fn test_redirect_store_down() {
    let verifier = common::StubVerifier::new(common::VerifierMode::Accept);
    let state = common::create_test_state(
        &common::test_config(),
        Arc::new(common::DownStore),
        verifier,
    );
    let server = common::test_server(state, "127.0.0.1:40000");

    let response = server.get("/Xk3pQ9a").await;

    assert_eq!(response.status_code(), 500);
}

#[tokio::test]
async fn test_redirect_rejects_post() {
    let (server, _store, _verifier) = common::default_server();

    let response = server.post("/Xk3pQ9a").await;

    assert_eq!(response.status_code(), 405);
}

#[tokio::test]
async fn test_unknown_route_is_json_404() {
    let (server, _store, _verifier) = common::default_server();

    let response = server.get("/a/b/c").await;

    assert_eq!(response.status_code(), 404);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "not_found");
}
