//! Test infrastructure for integration tests
//!
//! Provides an in-process stub API server, isolated session files and CLI
//! command builders. Each test gets its own server so no state is shared.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use axum::Router;
use axum::extract::{Json, Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use canopy_cli::commands::{LoginCommand, SignupCommand, TreeCommand};
use canopy_core::{AppContext, Config, Node, Notifier, Position, QueueSink, Role};
use serde_json::{Value, json};
use tokio::task::JoinHandle;

pub const GOOD_ID: &str = "AL00000001";
pub const GOOD_PASSWORD: &str = "secret123";
pub const SESSION_COOKIE: &str = "token=cli-session";

/// Referral links and the last signup body seen by the stub
#[derive(Default)]
pub struct StubState {
    pub links: Mutex<Vec<Value>>,
    pub last_signup: Mutex<Option<Value>>,
}

/// Test context: stub server plus an app context pointing at it
pub struct TestContext {
    pub ctx: AppContext,
    pub sink: Arc<QueueSink>,
    pub state: Arc<StubState>,
    pub base_url: String,
    pub temp_dir: PathBuf,
    server: JoinHandle<()>,
}

impl TestContext {
    /// Start a stub server and an unauthenticated context.
    pub async fn new() -> Self {
        let state = Arc::new(StubState::default());
        let app = Router::new()
            .route("/api/v1/auth/login", post(login))
            .route("/api/v1/auth/signup", post(signup))
            .route("/api/v1/auth/logout", post(logout))
            .route("/api/v1/user", get(user))
            .route("/api/v1/tree", get(tree))
            .route("/api/v1/ref", get(list_links).post(create_link))
            .route("/api/v1/ref/:code", get(show_link))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let base_url = format!("http://{}/api/v1", addr);
        let temp_dir = std::env::temp_dir().join(format!(
            "cnp-integration-test-{}-{:?}-{}",
            std::process::id(),
            std::thread::current().id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));
        let sink = Arc::new(QueueSink::new());
        let ctx = AppContext::init(
            Config::for_api(&base_url, temp_dir.join("session")),
            Notifier::new(sink.clone()),
        )
        .unwrap();

        Self {
            ctx,
            sink,
            state,
            base_url,
            temp_dir,
            server,
        }
    }

    /// Start a stub server and log in.
    pub async fn logged_in() -> Self {
        let tc = Self::new().await;
        login_cmd(GOOD_ID, GOOD_PASSWORD)
            .execute(&tc.ctx)
            .await
            .unwrap();
        tc.sink.drain();
        tc
    }

    /// A fresh context reading the same session file, as the next CLI run would.
    pub fn next_run(&self) -> AppContext {
        AppContext::init(
            Config::for_api(&self.base_url, self.temp_dir.join("session")),
            Notifier::silent(),
        )
        .unwrap()
    }
}

impl Drop for TestContext {
    fn drop(&mut self) {
        self.server.abort();
        let _ = std::fs::remove_dir_all(&self.temp_dir);
    }
}

// =============================================================================
// Command Builder Helpers
// =============================================================================

pub fn login_cmd(id: &str, password: &str) -> LoginCommand {
    LoginCommand {
        id: id.to_string(),
        password: Some(password.to_string()),
    }
}

/// Create a SignupCommand with valid fields and the given sponsor source.
pub fn signup_cmd(sponsor: Option<&str>, link: Option<&str>) -> SignupCommand {
    SignupCommand {
        name: "Jane Doe".to_string(),
        email: "jane@example.com".to_string(),
        mobile: "5551234567".to_string(),
        dial_code: "+91".to_string(),
        country: Some("IN".to_string()),
        position: Position::Right,
        sponsor: sponsor.map(String::from),
        link: link.map(String::from),
        password: Some("hunter22".to_string()),
        confirm_password: None,
        otp: Some("654321".to_string()),
        referral_code: None,
    }
}

pub fn tree_cmd(expand_all: bool) -> TreeCommand {
    TreeCommand {
        expand_all,
        expand: vec![],
        json: false,
    }
}

// =============================================================================
// Stub handlers
// =============================================================================

fn stub_tree() -> Vec<Node> {
    vec![
        Node::new(GOOD_ID, "Root Admin", Position::Left)
            .with_role(Role::Admin)
            .with_left("AL00000002")
            .with_right("AL00000003")
            .with_counts(3, 2)
            .with_active(true),
        Node::new("AL00000002", "Bob", Position::Left)
            .with_active(true)
            .with_left("AL00000004"),
        Node::new("AL00000003", "Carol", Position::Right),
        Node::new("AL00000004", "Dave", Position::Left).with_active(true),
    ]
}

fn authed(headers: &HeaderMap) -> bool {
    headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|c| c.contains(SESSION_COOKIE))
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "message": message }))).into_response()
}

async fn login(Json(body): Json<Value>) -> Response {
    if body["id"] == GOOD_ID && body["password"] == GOOD_PASSWORD {
        (
            [(header::SET_COOKIE, format!("{}; Path=/", SESSION_COOKIE))],
            Json(json!({ "success": true })),
        )
            .into_response()
    } else {
        error(StatusCode::UNAUTHORIZED, "Invalid credentials")
    }
}

async fn signup(State(state): State<Arc<StubState>>, Json(body): Json<Value>) -> Response {
    if body["sponsor"] != GOOD_ID {
        return error(StatusCode::BAD_REQUEST, "Invalid sponsor code");
    }
    *state.last_signup.lock().unwrap() = Some(body);
    Json(json!({ "success": true, "message": "Account created, check your email" }))
        .into_response()
}

async fn logout() -> Response {
    Json(json!({ "success": true })).into_response()
}

async fn user(headers: HeaderMap) -> Response {
    if !authed(&headers) {
        return error(StatusCode::UNAUTHORIZED, "Unauthorized");
    }
    Json(json!({ "id": GOOD_ID, "name": "Root Admin", "role": "ADMIN" })).into_response()
}

async fn tree(headers: HeaderMap) -> Response {
    if !authed(&headers) {
        return error(StatusCode::UNAUTHORIZED, "Unauthorized");
    }
    Json(json!({ "data": stub_tree() })).into_response()
}

async fn list_links(State(state): State<Arc<StubState>>, headers: HeaderMap) -> Response {
    if !authed(&headers) {
        return error(StatusCode::UNAUTHORIZED, "Unauthorized");
    }
    Json(state.links.lock().unwrap().clone()).into_response()
}

async fn create_link(
    State(state): State<Arc<StubState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !authed(&headers) {
        return error(StatusCode::UNAUTHORIZED, "Unauthorized");
    }
    let mut links = state.links.lock().unwrap();
    let code = format!("AL{:08}", links.len() + 10);
    let link = json!({
        "id": code.clone(),
        "code": code.clone(),
        "position": body["position"],
        "createdAt": "2025-05-20T08:00:00Z",
        "usedBy": null
    });
    links.push(link);
    Json(json!({
        "code": code,
        "position": body["position"],
        "createdAt": "2025-05-20T08:00:00Z"
    }))
    .into_response()
}

async fn show_link(
    State(state): State<Arc<StubState>>,
    headers: HeaderMap,
    Path(code): Path<String>,
) -> Response {
    if !authed(&headers) {
        return error(StatusCode::UNAUTHORIZED, "Unauthorized");
    }
    let links = state.links.lock().unwrap();
    match links.iter().find(|l| l["code"] == code.as_str()) {
        Some(link) => Json(link.clone()).into_response(),
        None => error(StatusCode::NOT_FOUND, "Referral link not found"),
    }
}
