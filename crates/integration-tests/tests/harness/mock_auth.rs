//! Mock OAuth2 authorization server speaking the PKCE exchange
//!
//! `POST /v1/apiauth` records the code challenge and hands out a code;
//! `POST /v1/oauth/token` checks the verifier against that challenge and
//! returns the token as a plain body.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::IntoResponse;
use axum::{Form, Json, Router, routing};
use base64::Engine;
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use sha2::{Digest, Sha256};
use tokio_util::sync::CancellationToken;

pub const CLIENT_ID: &str = "order";
pub const CLIENT_SECRET: &str = "orderSecret";
pub const TOKEN: &str = "jwt-token-for-order";

/// Mock authorization server
pub struct MockAuthServer {
    addr: SocketAddr,
    shutdown: CancellationToken,
    state: Arc<MockAuthState>,
}

struct MockAuthState {
    authorize_count: AtomicU32,
    token_count: AtomicU32,
    /// Number of authorization requests to fail with 503 before succeeding
    authorize_failures: AtomicU32,
    /// Code challenge recorded per issued code
    challenges: Mutex<HashMap<String, String>>,
    /// Query of the last authorization request
    last_query: Mutex<HashMap<String, String>>,
}

impl MockAuthServer {
    /// Start the mock server, returning immediately
    pub async fn start() -> anyhow::Result<Self> {
        Self::start_inner(0).await
    }

    /// Start a mock server that fails the first `n` authorization requests with 503
    pub async fn start_failing_authorize(n: u32) -> anyhow::Result<Self> {
        Self::start_inner(n).await
    }

    async fn start_inner(authorize_failures: u32) -> anyhow::Result<Self> {
        let state = Arc::new(MockAuthState {
            authorize_count: AtomicU32::new(0),
            token_count: AtomicU32::new(0),
            authorize_failures: AtomicU32::new(authorize_failures),
            challenges: Mutex::new(HashMap::new()),
            last_query: Mutex::new(HashMap::new()),
        });

        let app = Router::new()
            .route("/v1/apiauth", routing::post(handle_authorize))
            .route("/v1/oauth/token", routing::post(handle_token))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let shutdown = CancellationToken::new();
        let shutdown_clone = shutdown.clone();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    shutdown_clone.cancelled().await;
                })
                .await
                .ok();
        });

        Ok(Self { addr, shutdown, state })
    }

    /// Authorization server base URL, including `/v1`
    pub fn base_url(&self) -> String {
        format!("http://{}/v1", self.addr)
    }

    pub fn token_url(&self) -> String {
        format!("http://{}/v1/oauth/token", self.addr)
    }

    pub fn authorize_count(&self) -> u32 {
        self.state.authorize_count.load(Ordering::Relaxed)
    }

    pub fn token_count(&self) -> u32 {
        self.state.token_count.load(Ordering::Relaxed)
    }

    /// Query parameter of the last authorization request
    pub fn last_query_param(&self, name: &str) -> Option<String> {
        self.state.last_query.lock().unwrap().get(name).cloned()
    }
}

impl Drop for MockAuthServer {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

async fn handle_authorize(
    State(state): State<Arc<MockAuthState>>,
    Query(query): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    let n = state.authorize_count.fetch_add(1, Ordering::Relaxed) + 1;

    if state
        .authorize_failures
        .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1))
        .is_ok()
    {
        return (StatusCode::SERVICE_UNAVAILABLE, Json(serde_json::json!({ "error": "temporarily_unavailable" })));
    }

    let valid = query.get("client_id").map(String::as_str) == Some(CLIENT_ID)
        && query.get("code_challenge_method").map(String::as_str) == Some("S256")
        && query.get("response_type").map(String::as_str) == Some("code");

    *state.last_query.lock().unwrap() = query.clone();

    if !valid {
        return (StatusCode::BAD_REQUEST, Json(serde_json::json!({ "error": "invalid_request" })));
    }

    let code = format!("code-{n}");
    let challenge = query.get("code_challenge").cloned().unwrap_or_default();
    state.challenges.lock().unwrap().insert(code.clone(), challenge);

    (StatusCode::OK, Json(serde_json::json!({ "code": code })))
}

async fn handle_token(
    State(state): State<Arc<MockAuthState>>,
    headers: HeaderMap,
    Form(form): Form<HashMap<String, String>>,
) -> impl IntoResponse {
    state.token_count.fetch_add(1, Ordering::Relaxed);

    let expected_auth = format!("Basic {}", STANDARD.encode(format!("{CLIENT_ID}:{CLIENT_SECRET}")));
    let authorized = headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()) == Some(expected_auth.as_str());

    if !authorized {
        return (StatusCode::UNAUTHORIZED, "invalid_client".to_owned());
    }

    let code = form.get("code").cloned().unwrap_or_default();
    let Some(challenge) = state.challenges.lock().unwrap().remove(&code) else {
        return (StatusCode::BAD_REQUEST, "unknown code".to_owned());
    };

    let verifier = form.get("code_verifier").cloned().unwrap_or_default();
    let computed = URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()));

    let well_formed = computed == challenge
        && form.get("grant_type").map(String::as_str) == Some("authorization_code")
        && form.get("sub").map(String::as_str) == Some(CLIENT_ID);

    if !well_formed {
        return (StatusCode::BAD_REQUEST, "verifier mismatch".to_owned());
    }

    (StatusCode::OK, TOKEN.to_owned())
}
