mod common;

use common::{StubVerifier, VerifierMode, create_body, create_test_state, test_config, test_server};
use slug_shortener::infrastructure::store::MemoryRecordStore;
use std::sync::Arc;

const LIMIT: u32 = 5;

fn limited_server(peer: &str) -> axum_test::TestServer {
    let mut config = test_config();
    config.rate_limit_per_minute = LIMIT;
    let state = create_test_state(
        &config,
        Arc::new(MemoryRecordStore::new()),
        StubVerifier::new(VerifierMode::Accept),
    );
    test_server(state, peer)
}

#[tokio::test]
async fn test_request_over_limit_is_rejected() {
    let server = limited_server("198.51.100.7:5000");

    for _ in 0..LIMIT {
        let response = server
            .post("/api/v1/create")
            .json(&create_body("https://example.com"))
            .await;
        assert_eq!(response.status_code(), 200);
    }

    let response = server
        .post("/api/v1/create")
        .json(&create_body("https://example.com"))
        .await;
    assert_eq!(response.status_code(), 429);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"]["code"], "rate_limited");
}

#[tokio::test]
async fn test_default_limit_rejects_61st_request() {
    let state = create_test_state(
        &test_config(),
        Arc::new(MemoryRecordStore::new()),
        StubVerifier::new(VerifierMode::Accept),
    );
    let server = test_server(state, "198.51.100.8:5000");

    for i in 1..=60 {
        let response = server
            .put("/api/v1/create")
            .json(&create_body("https://example.com"))
            .await;
        assert_eq!(response.status_code(), 200, "request {i} should be allowed");
    }

    let response = server
        .put("/api/v1/create")
        .json(&create_body("https://example.com"))
        .await;
    assert_eq!(response.status_code(), 429);
}

#[tokio::test]
async fn test_redirects_are_not_counted() {
    let server = limited_server("198.51.100.7:5000");

    for _ in 0..(LIMIT * 3) {
        let response = server.get("/Xk3pQ9a").await;
        assert_eq!(response.status_code(), 404);
    }

    let response = server
        .post("/api/v1/create")
        .json(&create_body("https://example.com"))
        .await;
    assert_eq!(response.status_code(), 200);
}

#[tokio::test]
async fn test_untrusted_peer_cannot_spoof_forwarded_for() {
    let server = limited_server("198.51.100.7:5000");

    for i in 0..LIMIT {
        let response = server
            .post("/api/v1/create")
            .add_header("x-forwarded-for", format!("192.0.2.{i}"))
            .json(&create_body("https://example.com"))
            .await;
        assert_eq!(response.status_code(), 200);
    }

    let response = server
        .post("/api/v1/create")
        .add_header("x-forwarded-for", "192.0.2.200")
        .json(&create_body("https://example.com"))
        .await;
    assert_eq!(response.status_code(), 429);
}

#[tokio::test]
async fn test_trusted_proxy_counts_each_client() {
    let server = limited_server("10.1.2.3:5000");

    for i in 0..(LIMIT * 2) {
        let response = server
            .post("/api/v1/create")
            .add_header("x-forwarded-for", format!("192.0.2.{i}"))
            .json(&create_body("https://example.com"))
            .await;
        assert_eq!(response.status_code(), 200);
    }
}

#[tokio::test]
async fn test_trusted_proxy_limits_forwarded_client() {
    let server = limited_server("10.1.2.3:5000");

    for _ in 0..LIMIT {
        server
            .post("/api/v1/create")
            .add_header("x-forwarded-for", "203.0.113.9, 192.0.2.50")
            .json(&create_body("https://example.com"))
            .await;
    }

    let response = server
        .post("/api/v1/create")
        .add_header("x-forwarded-for", "192.0.2.50")
        .json(&create_body("https://example.com"))
        .await;
    assert_eq!(response.status_code(), 429);
}

#[tokio::test]
async fn test_cdn_edge_uses_connecting_ip() {
    let server = limited_server("173.245.48.10:443");

    for i in 0..(LIMIT * 2) {
        let response = server
            .post("/api/v1/create")
            .add_header("cf-connecting-ip", format!("2001:db8::{i:x}"))
            .json(&create_body("https://example.com"))
            .await;
        assert_eq!(response.status_code(), 200);
    }
}
