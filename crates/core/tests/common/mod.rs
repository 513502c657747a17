//! Test infrastructure for integration tests
//!
//! Starts an in-process stub of the platform API on an ephemeral port and
//! builds isolated application contexts pointing at it. Each test gets its
//! own server and session file so no state is shared.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Json, Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use canopy_core::{AppContext, Config, Node, Notifier, Position, QueueSink, Role};
use serde_json::{Value, json};
use tokio::task::JoinHandle;

/// User ID accepted by the stub login
pub const GOOD_ID: &str = "AL00000001";

/// Password accepted by the stub login
pub const GOOD_PASSWORD: &str = "secret123";

/// Cookie set by a successful login
pub const SESSION_COOKIE: &str = "token=stub-session";

/// Reset token accepted by the stub
pub const RESET_TOKEN: &str = "reset-token";

/// Counters and recorded requests shared with the handlers
#[derive(Default)]
pub struct StubState {
    pub user_hits: AtomicUsize,
    pub tree_hits: AtomicUsize,
    /// Number of upcoming tree requests that answer 503
    pub tree_failures: AtomicUsize,
    pub links: Mutex<Vec<Value>>,
    pub last_signup: Mutex<Option<Value>>,
    pub last_otp_email: Mutex<Option<String>>,
    pub logouts: AtomicUsize,
}

/// A running stub server
pub struct StubServer {
    pub base_url: String,
    pub state: Arc<StubState>,
    handle: JoinHandle<()>,
}

impl StubServer {
    /// Bind to an ephemeral port and start serving.
    pub async fn start() -> Self {
        let state = Arc::new(StubState::default());
        state.links.lock().unwrap().push(json!({
            "id": "link-1",
            "code": GOOD_ID,
            "position": "LEFT",
            "createdAt": "2025-05-01T10:00:00Z",
            "usedBy": "Jane Doe"
        }));

        let app = Router::new()
            .route("/api/v1/auth/login", post(login))
            .route("/api/v1/auth/get-otp", get(get_otp))
            .route("/api/v1/auth/signup", post(signup))
            .route("/api/v1/auth/forgot-password", post(forgot_password))
            .route("/api/v1/auth/reset-password", post(reset_password))
            .route("/api/v1/auth/logout", post(logout))
            .route("/api/v1/user", get(user))
            .route("/api/v1/tree", get(tree))
            .route("/api/v1/ref", get(list_links).post(create_link))
            .route("/api/v1/ref/:code", get(show_link))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}/api/v1", addr),
            state,
            handle,
        }
    }

    pub fn tree_hits(&self) -> usize {
        self.state.tree_hits.load(Ordering::SeqCst)
    }

    pub fn user_hits(&self) -> usize {
        self.state.user_hits.load(Ordering::SeqCst)
    }

    /// Make the next `n` tree requests fail with 503.
    pub fn fail_tree(&self, n: usize) {
        self.state.tree_failures.store(n, Ordering::SeqCst);
    }
}

impl Drop for StubServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Test context: stub server, app context and the captured notifications
pub struct TestContext {
    pub server: StubServer,
    pub ctx: AppContext,
    pub sink: Arc<QueueSink>,
    pub temp_dir: PathBuf,
}

impl TestContext {
    /// Start a server and an unauthenticated context against it.
    pub async fn new(name: &str) -> Self {
        let server = StubServer::start().await;
        let temp_dir = unique_temp_dir(name);
        let sink = Arc::new(QueueSink::new());
        let ctx = AppContext::init(
            Config::for_api(&server.base_url, temp_dir.join("session")),
            Notifier::new(sink.clone()),
        )
        .unwrap();

        Self {
            server,
            ctx,
            sink,
            temp_dir,
        }
    }

    /// Path of this context's session file
    pub fn session_path(&self) -> PathBuf {
        self.temp_dir.join("session")
    }

    /// A second context sharing this one's server and session file.
    pub fn reopen(&self) -> AppContext {
        AppContext::init(
            Config::for_api(&self.server.base_url, self.session_path()),
            Notifier::silent(),
        )
        .unwrap()
    }

    /// Titles of notifications sent so far (drains the queue)
    pub fn notification_titles(&self) -> Vec<String> {
        self.sink.drain().into_iter().map(|n| n.title).collect()
    }
}

impl Drop for TestContext {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.temp_dir);
    }
}

fn unique_temp_dir(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "canopy-integration-{}-{}-{:?}-{}",
        name,
        std::process::id(),
        std::thread::current().id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ))
}

/// Dataset served by `GET /tree`: A -> (B, C), C -> left D where D is missing
pub fn stub_tree() -> Vec<Node> {
    vec![
        Node::new("B", "Bob", Position::Left)
            .with_sponsor("A")
            .with_active(true),
        Node::new("A", "Root Admin", Position::Left)
            .with_role(Role::Admin)
            .with_left("B")
            .with_right("C")
            .with_counts(2, 1),
        Node::new("C", "Carol", Position::Right)
            .with_sponsor("A")
            .with_left("D"),
    ]
}

// ============================================================================
// Handlers
// ============================================================================

fn authed(headers: &HeaderMap) -> bool {
    headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|cookies| cookies.contains(SESSION_COOKIE))
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "message": message }))).into_response()
}

fn unauthorized() -> Response {
    error(StatusCode::UNAUTHORIZED, "Unauthorized")
}

async fn login(Json(body): Json<Value>) -> Response {
    if body["id"] == GOOD_ID && body["password"] == GOOD_PASSWORD {
        (
            [(header::SET_COOKIE, format!("{}; Path=/; HttpOnly", SESSION_COOKIE))],
            Json(json!({ "success": true, "message": "Logged in" })),
        )
            .into_response()
    } else {
        error(StatusCode::UNAUTHORIZED, "Invalid credentials")
    }
}

async fn get_otp(
    State(state): State<Arc<StubState>>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    *state.last_otp_email.lock().unwrap() = query.get("email").cloned();
    Json(json!({ "success": true })).into_response()
}

async fn signup(State(state): State<Arc<StubState>>, Json(body): Json<Value>) -> Response {
    if body["sponsor"] != GOOD_ID {
        return error(StatusCode::BAD_REQUEST, "Invalid sponsor code");
    }
    *state.last_signup.lock().unwrap() = Some(body);
    Json(json!({ "success": true, "message": "User created" })).into_response()
}

async fn forgot_password(Json(_body): Json<Value>) -> Response {
    Json(json!({ "success": true })).into_response()
}

async fn reset_password(Json(body): Json<Value>) -> Response {
    if body["token"] != RESET_TOKEN {
        return error(StatusCode::BAD_REQUEST, "Invalid or expired token");
    }
    // Some endpoints answer with an empty body
    StatusCode::OK.into_response()
}

async fn logout(State(state): State<Arc<StubState>>) -> Response {
    state.logouts.fetch_add(1, Ordering::SeqCst);
    (
        [(header::SET_COOKIE, "token=; Path=/; Max-Age=0")],
        Json(json!({ "success": true })),
    )
        .into_response()
}

async fn user(State(state): State<Arc<StubState>>, headers: HeaderMap) -> Response {
    state.user_hits.fetch_add(1, Ordering::SeqCst);
    if !authed(&headers) {
        return unauthorized();
    }
    Json(json!({
        "data": {
            "id": GOOD_ID,
            "name": "Root Admin",
            "role": "ADMIN",
            "email": "admin@example.com",
            "lastLogin": "ignored"
        }
    }))
    .into_response()
}

async fn tree(State(state): State<Arc<StubState>>, headers: HeaderMap) -> Response {
    state.tree_hits.fetch_add(1, Ordering::SeqCst);
    if !authed(&headers) {
        return unauthorized();
    }
    let failing = state
        .tree_failures
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok();
    if failing {
        return error(StatusCode::SERVICE_UNAVAILABLE, "Try again later");
    }
    // Slow enough for concurrent callers to overlap
    tokio::time::sleep(Duration::from_millis(30)).await;
    Json(stub_tree()).into_response()
}

async fn list_links(State(state): State<Arc<StubState>>, headers: HeaderMap) -> Response {
    if !authed(&headers) {
        return unauthorized();
    }
    let links = state.links.lock().unwrap().clone();
    Json(json!({ "data": links })).into_response()
}

async fn create_link(
    State(state): State<Arc<StubState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !authed(&headers) {
        return unauthorized();
    }
    let mut links = state.links.lock().unwrap();
    let id = format!("link-{}", links.len() + 1);
    let code = format!("AL{:08}", links.len() + 1);
    let created = json!({
        "code": code,
        "position": body["position"],
        "createdAt": "2025-05-02T12:00:00Z"
    });
    links.push(json!({
        "id": id,
        "code": code,
        "position": body["position"],
        "createdAt": "2025-05-02T12:00:00Z",
        "usedBy": null
    }));
    Json(json!({ "data": created })).into_response()
}

async fn show_link(
    State(state): State<Arc<StubState>>,
    headers: HeaderMap,
    Path(code): Path<String>,
) -> Response {
    if !authed(&headers) {
        return unauthorized();
    }
    let links = state.links.lock().unwrap();
    match links.iter().find(|l| l["code"] == code.as_str()) {
        Some(link) => Json(json!({ "data": link })).into_response(),
        None => error(StatusCode::NOT_FOUND, "Referral link not found"),
    }
}
