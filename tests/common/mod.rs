//! In-process mock of the DataPulse backend for integration tests.

// Each integration test crate uses a different subset of this module.
#![allow(dead_code)]

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Multipart, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use datapulse::config::Settings;

/// A canned response: status code plus optional JSON body.
pub type Canned = (u16, Option<Value>);

fn respond(canned: &Canned) -> Response {
    let status = StatusCode::from_u16(canned.0).expect("valid status code");
    match &canned.1 {
        Some(body) => (status, Json(body.clone())).into_response(),
        None => status.into_response(),
    }
}

/// Shared, mutable mock state. Tests configure responses up front and read
/// back hit counters and captured request data afterwards.
#[derive(Clone)]
pub struct MockBackend {
    pub analyze_hits: Arc<AtomicUsize>,
    pub summary_hits: Arc<AtomicUsize>,
    pub session_hits: Arc<AtomicUsize>,
    pub usage_hits: Arc<AtomicUsize>,

    pub analyze_response: Arc<Mutex<Canned>>,
    pub summary_response: Arc<Mutex<Canned>>,
    pub session_response: Arc<Mutex<Canned>>,
    /// When non-empty, session calls pop from here before falling back to
    /// `session_response` (ordered per-call behavior).
    pub session_sequence: Arc<Mutex<Vec<Canned>>>,
    pub usage_response: Arc<Mutex<Canned>>,

    /// Artificial latency on the analyze endpoint (re-entrancy tests).
    pub analyze_delay: Arc<Mutex<Duration>>,

    pub last_idempotency_key: Arc<Mutex<Option<String>>>,
    pub last_bearer: Arc<Mutex<Option<String>>>,
    pub last_upload_name: Arc<Mutex<Option<String>>>,
    pub last_upload_bytes: Arc<Mutex<usize>>,
    pub last_summary_body: Arc<Mutex<Option<Value>>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            analyze_hits: Arc::new(AtomicUsize::new(0)),
            summary_hits: Arc::new(AtomicUsize::new(0)),
            session_hits: Arc::new(AtomicUsize::new(0)),
            usage_hits: Arc::new(AtomicUsize::new(0)),
            analyze_response: Arc::new(Mutex::new((200, Some(json!({}))))),
            summary_response: Arc::new(Mutex::new((200, Some(json!({}))))),
            session_response: Arc::new(Mutex::new((
                200,
                Some(json!({"authenticated": true, "user_id": "u1", "session_id": "s1"})),
            ))),
            session_sequence: Arc::new(Mutex::new(Vec::new())),
            usage_response: Arc::new(Mutex::new((
                200,
                Some(json!({
                    "today_used": 0,
                    "daily_limit": 3,
                    "can_generate": true,
                    "is_premium": false
                })),
            ))),
            analyze_delay: Arc::new(Mutex::new(Duration::ZERO)),
            last_idempotency_key: Arc::new(Mutex::new(None)),
            last_bearer: Arc::new(Mutex::new(None)),
            last_upload_name: Arc::new(Mutex::new(None)),
            last_upload_bytes: Arc::new(Mutex::new(0)),
            last_summary_body: Arc::new(Mutex::new(None)),
        }
    }

    pub fn set_analyze(&self, status: u16, body: Option<Value>) {
        *self.analyze_response.lock().unwrap() = (status, body);
    }

    pub fn set_summary(&self, status: u16, body: Option<Value>) {
        *self.summary_response.lock().unwrap() = (status, body);
    }

    pub fn set_session(&self, status: u16, body: Option<Value>) {
        *self.session_response.lock().unwrap() = (status, body);
    }

    /// Queue per-call session responses, consumed in order.
    pub fn queue_session(&self, responses: Vec<Canned>) {
        *self.session_sequence.lock().unwrap() = responses;
    }

    pub fn set_usage(&self, status: u16, body: Option<Value>) {
        *self.usage_response.lock().unwrap() = (status, body);
    }

    pub fn set_analyze_delay(&self, delay: Duration) {
        *self.analyze_delay.lock().unwrap() = delay;
    }

    /// Bind on an ephemeral port and serve the mock. Returns the base URL.
    pub async fn spawn(self) -> String {
        let app = Router::new()
            .route("/api/analyze", post(analyze))
            .route("/api/ai-summary", post(ai_summary))
            .route("/api/auth/session", get(session))
            .route("/api/session/start", post(start_session))
            .route("/api/auth/login", post(login))
            .route("/api/auth/logout", post(logout))
            .route("/api/usage", get(usage))
            .route("/api/payments/verify", get(verify_payment))
            .with_state(self);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock backend");
        let addr = listener.local_addr().expect("mock local addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("serve mock backend");
        });
        format!("http://{}", addr)
    }
}

fn record_bearer(state: &MockBackend, headers: &HeaderMap) {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string);
    *state.last_bearer.lock().unwrap() = bearer;
}

async fn analyze(
    State(state): State<MockBackend>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Response {
    state.analyze_hits.fetch_add(1, Ordering::SeqCst);
    record_bearer(&state, &headers);
    *state.last_idempotency_key.lock().unwrap() = headers
        .get("x-idempotency-key")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() == Some("file") {
            *state.last_upload_name.lock().unwrap() = field.file_name().map(str::to_string);
            let bytes = field.bytes().await.unwrap_or_default();
            *state.last_upload_bytes.lock().unwrap() = bytes.len();
        }
    }

    let delay = *state.analyze_delay.lock().unwrap();
    if delay > Duration::ZERO {
        tokio::time::sleep(delay).await;
    }

    let canned = state.analyze_response.lock().unwrap().clone();
    respond(&canned)
}

async fn ai_summary(
    State(state): State<MockBackend>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state.summary_hits.fetch_add(1, Ordering::SeqCst);
    record_bearer(&state, &headers);
    *state.last_summary_body.lock().unwrap() = Some(body);
    let canned = state.summary_response.lock().unwrap().clone();
    respond(&canned)
}

async fn session(State(state): State<MockBackend>, headers: HeaderMap) -> Response {
    state.session_hits.fetch_add(1, Ordering::SeqCst);
    record_bearer(&state, &headers);
    let queued = {
        let mut sequence = state.session_sequence.lock().unwrap();
        if sequence.is_empty() {
            None
        } else {
            Some(sequence.remove(0))
        }
    };
    let canned = queued.unwrap_or_else(|| state.session_response.lock().unwrap().clone());
    respond(&canned)
}

async fn start_session() -> Response {
    (
        StatusCode::OK,
        [(header::SET_COOKIE, "dp_session=anon; Path=/")],
        Json(json!({"ok": true})),
    )
        .into_response()
}

async fn login(State(_state): State<MockBackend>, Json(body): Json<Value>) -> Response {
    let email = body.get("email").and_then(|v| v.as_str()).unwrap_or("");
    if body.get("password").and_then(|v| v.as_str()) == Some("correct horse") {
        (
            StatusCode::OK,
            [(header::SET_COOKIE, "dp_session=logged-in; Path=/")],
            Json(json!({
                "authenticated": true,
                "user_id": email,
                "session_id": "sess-1"
            })),
        )
            .into_response()
    } else {
        (StatusCode::UNAUTHORIZED, "invalid credentials").into_response()
    }
}

async fn logout() -> StatusCode {
    StatusCode::OK
}

async fn usage(State(state): State<MockBackend>, headers: HeaderMap) -> Response {
    state.usage_hits.fetch_add(1, Ordering::SeqCst);
    record_bearer(&state, &headers);
    let canned = state.usage_response.lock().unwrap().clone();
    respond(&canned)
}

async fn verify_payment(State(_state): State<MockBackend>) -> Response {
    Json(json!({"paid": true, "message": "Premium activated"})).into_response()
}

/// Settings pointed at the mock backend, with scratch config dir.
pub fn test_settings(api_base: &str, config_dir: &Path) -> Settings {
    let mut settings = Settings::with_config_dir(config_dir.to_path_buf());
    settings.api_base = api_base.to_string();
    settings.request_timeout = 5;
    settings.upload_timeout = 10;
    settings
}
