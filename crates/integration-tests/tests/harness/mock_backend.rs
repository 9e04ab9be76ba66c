//! Mock REST backend for integration tests
//!
//! Serves JSON items, a multipart batch of files and an endpoint that
//! fails a configurable number of times before answering.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router, routing};
use tokio_util::sync::CancellationToken;

const BOUNDARY: &str = "batch-boundary";

/// Files served by `GET /api/files/{batch}`
pub const BATCH_FILES: [(&str, &str); 3] = [("a.txt", "alpha\n"), ("b.txt", "bravo\n"), ("c.txt", "charlie\n")];

/// Mock backend that checks a fixed `Authorization` header
pub struct MockBackend {
    addr: SocketAddr,
    shutdown: CancellationToken,
    state: Arc<MockBackendState>,
}

struct MockBackendState {
    request_count: AtomicU32,
    /// Number of `/api/flaky` requests to fail before succeeding
    fail_count: AtomicU32,
    expected_authorization: String,
}

impl MockBackend {
    /// Start a backend accepting requests carrying `authorization`
    pub async fn start(authorization: &str) -> anyhow::Result<Self> {
        Self::start_inner(authorization, 0).await
    }

    /// Start a backend whose `/api/flaky` fails the first `n` requests with 503
    pub async fn start_failing(authorization: &str, n: u32) -> anyhow::Result<Self> {
        Self::start_inner(authorization, n).await
    }

    async fn start_inner(authorization: &str, fail_count: u32) -> anyhow::Result<Self> {
        let state = Arc::new(MockBackendState {
            request_count: AtomicU32::new(0),
            fail_count: AtomicU32::new(fail_count),
            expected_authorization: authorization.to_owned(),
        });

        let app = Router::new()
            .route("/api/items/{id}", routing::get(handle_item))
            .route("/api/flaky", routing::get(handle_flaky))
            .route("/api/files/{batch}", routing::get(handle_files))
            .route("/api/plain", routing::get(handle_plain))
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

    /// Base URL including the `/api` prefix
    pub fn base_url(&self) -> String {
        format!("http://{}/api", self.addr)
    }

    /// Base URL with `user:password` userinfo
    pub fn base_url_with_userinfo(&self, user: &str, password: &str) -> String {
        format!("http://{user}:{password}@{}/api", self.addr)
    }

    /// Number of requests received on any route
    pub fn request_count(&self) -> u32 {
        self.state.request_count.load(Ordering::Relaxed)
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

impl MockBackendState {
    fn admit(&self, headers: &HeaderMap) -> Result<(), StatusCode> {
        self.request_count.fetch_add(1, Ordering::Relaxed);

        let presented = headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok());
        if presented == Some(self.expected_authorization.as_str()) {
            Ok(())
        } else {
            Err(StatusCode::UNAUTHORIZED)
        }
    }
}

async fn handle_item(
    State(state): State<Arc<MockBackendState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    if let Err(status) = state.admit(&headers) {
        return status.into_response();
    }

    match id.parse::<u64>() {
        Ok(id) if id < 1000 => Json(serde_json::json!({ "id": id, "name": format!("item-{id}") })).into_response(),
        Ok(_) => StatusCode::NOT_FOUND.into_response(),
        Err(_) => StatusCode::BAD_REQUEST.into_response(),
    }
}

async fn handle_flaky(State(state): State<Arc<MockBackendState>>, headers: HeaderMap) -> Response {
    if let Err(status) = state.admit(&headers) {
        return status.into_response();
    }

    if state
        .fail_count
        .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1))
        .is_ok()
    {
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    }

    Json(serde_json::json!({ "id": 1, "name": "eventually" })).into_response()
}

async fn handle_files(
    State(state): State<Arc<MockBackendState>>,
    headers: HeaderMap,
    Path(_batch): Path<String>,
) -> Response {
    if let Err(status) = state.admit(&headers) {
        return status.into_response();
    }

    let mut body = String::new();
    for (name, content) in BATCH_FILES {
        body.push_str(&format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{name}\"\r\n\
             Content-Type: text/plain\r\n\r\n{content}\r\n"
        ));
    }
    body.push_str(&format!("--{BOUNDARY}--\r\n"));

    (
        [(header::CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))],
        body,
    )
        .into_response()
}

async fn handle_plain(State(state): State<Arc<MockBackendState>>, headers: HeaderMap) -> Response {
    if let Err(status) = state.admit(&headers) {
        return status.into_response();
    }

    "just text".into_response()
}
