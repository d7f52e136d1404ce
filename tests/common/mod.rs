#![allow(dead_code)]

use async_trait::async_trait;
use axum::{Router, extract::ConnectInfo};
use axum_test::TestServer;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use slug_shortener::config::{Config, StoreBackend};
use slug_shortener::domain::{
    RecordStore, StoreError, VerificationOutcome, Verifier, VerifyError,
};
use slug_shortener::infrastructure::store::MemoryRecordStore;
use slug_shortener::routes::app_router;
use slug_shortener::shortening::{DEFAULT_ALPHABET, ShorteningKey};
use slug_shortener::state::AppState;
use tower::Layer;

pub const KEY_HEX: &str = "000102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f";
pub const BASE_URL: &str = "https://s.example/";

/// How the stub verification service answers.
#[derive(Debug, Clone, Copy)]
pub enum VerifierMode {
    Accept,
    Refuse,
    Unreachable,
    Malformed,
}

pub struct StubVerifier {
    mode: VerifierMode,
    calls: AtomicUsize,
}

impl StubVerifier {
    pub fn new(mode: VerifierMode) -> Arc<Self> {
        Arc::new(Self {
            mode,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Verifier for StubVerifier {
    async fn verify(&self, _token: &str) -> Result<VerificationOutcome, VerifyError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.mode {
            VerifierMode::Accept => Ok(VerificationOutcome::passed()),
            VerifierMode::Refuse => Ok(VerificationOutcome::refused(vec![
                "invalid-input-response".to_string(),
            ])),
            VerifierMode::Unreachable => Err(VerifyError::Transport("connection refused".into())),
            VerifierMode::Malformed => Err(VerifyError::MalformedReply("expected value".into())),
        }
    }
}

/// A store whose backend is down.
pub struct DownStore;

#[async_trait]
impl RecordStore for DownStore {
    async fn put(&self, _slug: &str, _long_url: &str) -> Result<(), StoreError> {
        Err(StoreError::Io("connection reset".into()))
    }

    async fn get(&self, _slug: &str) -> Result<String, StoreError> {
        Err(StoreError::Io("connection reset".into()))
    }

    async fn get_into(&self, _slug: &str, _buf: &mut String) -> Result<(), StoreError> {
        Err(StoreError::Io("connection reset".into()))
    }

    async fn health_check(&self) -> bool {
        false
    }
}

pub fn test_config() -> Config {
    Config {
        store_backend: StoreBackend::Memory,
        database_url: None,
        listen_addr: "127.0.0.1:0".to_string(),
        base_url: BASE_URL.to_string(),
        log_level: "debug".to_string(),
        log_format: "text".to_string(),
        shortening_key: ShorteningKey::from_hex(KEY_HEX).unwrap(),
        slug_alphabet: DEFAULT_ALPHABET.to_string(),
        slug_length: 7,
        max_mint_attempts: 100,
        mint_workers: 4,
        rate_limit_per_minute: 60,
        rate_limit_ttl_seconds: 86_400,
        cdn_trusted_cidrs: "173.245.48.0/20".to_string(),
        reverse_proxy_cidrs: "10.0.0.0/8".to_string(),
        captcha_verify_url: "http://127.0.0.1:1/siteverify".to_string(),
        captcha_secret: "test-secret".to_string(),
        captcha_timeout_ms: 200,
        server_user_agent: "slug-shortener-tests".to_string(),
        db_max_connections: 1,
        db_connect_timeout: 1,
        db_idle_timeout: 60,
        db_max_lifetime: 60,
    }
}

pub fn create_test_state(
    config: &Config,
    store: Arc<dyn RecordStore>,
    verifier: Arc<dyn Verifier>,
) -> AppState {
    AppState::from_config(config, store, verifier).unwrap()
}

/// Serves the full application router as if every request came from `peer`.
pub fn test_server(state: AppState, peer: &str) -> TestServer {
    let addr: SocketAddr = peer.parse().unwrap();
    let app: Router = app_router(state).layer(MockConnectInfoLayer(addr));
    TestServer::new(app).unwrap()
}

/// Default setup: in-memory store and an accepting verifier, local peer.
pub fn default_server() -> (TestServer, Arc<MemoryRecordStore>, Arc<StubVerifier>) {
    let store = Arc::new(MemoryRecordStore::new());
    let verifier = StubVerifier::new(VerifierMode::Accept);
    let state = create_test_state(&test_config(), store.clone(), verifier.clone());
    (test_server(state, "127.0.0.1:40000"), store, verifier)
}

pub fn create_body(long_url: &str) -> serde_json::Value {
    serde_json::json!({
        "user_verification_token": "token",
        "long_url": long_url,
    })
}

#[derive(Clone)]
pub struct MockConnectInfoLayer(pub SocketAddr);

impl<S> Layer<S> for MockConnectInfoLayer {
    type Service = MockConnectInfoService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        MockConnectInfoService {
            inner,
            addr: self.0,
        }
    }
}

#[derive(Clone)]
pub struct MockConnectInfoService<S> {
    inner: S,
    addr: SocketAddr,
}

impl<S, B> tower::Service<axum::http::Request<B>> for MockConnectInfoService<S>
where
    S: tower::Service<axum::http::Request<B>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    B: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: axum::http::Request<B>) -> Self::Future {
        req.extensions_mut().insert(ConnectInfo(self.addr));
        self.inner.call(req)
    }
}
