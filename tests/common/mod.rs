// In-process stand-in for the LM Studio HTTP API.

#![allow(dead_code)]

use axum::Router;
use axum::extract::State;
use axum::http::{StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

#[derive(Clone)]
pub struct Route {
    pub path: &'static str,
    pub status: u16,
    pub body: String,
}

impl Route {
    pub fn ok(path: &'static str, body: impl Into<String>) -> Self {
        Self {
            path,
            status: 200,
            body: body.into(),
        }
    }
}

pub struct StubServer {
    pub base_url: String,
    /// `(path, body)` of every request received, in arrival order.
    pub requests: Arc<Mutex<Vec<(String, String)>>>,
}

#[derive(Clone)]
struct StubState {
    routes: Arc<Vec<Route>>,
    requests: Arc<Mutex<Vec<(String, String)>>>,
}

pub fn models_body(ids: &[&str]) -> String {
    let data: Vec<_> = ids
        .iter()
        .map(|id| {
            serde_json::json!({ "id": id, "object": "model", "owned_by": "organization_owner" })
        })
        .collect();
    serde_json::json!({ "object": "list", "data": data }).to_string()
}

pub fn completion_body(content: &str) -> String {
    serde_json::json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "choices": [{ "index": 0, "message": { "role": "assistant", "content": content } }]
    })
    .to_string()
}

/// Serve `routes` under `/v1` until the test runtime shuts down.
///
/// A route that was not configured answers 404.
pub async fn serve(routes: Vec<Route>) -> StubServer {
    let state = StubState {
        routes: Arc::new(routes),
        requests: Arc::new(Mutex::new(Vec::new())),
    };
    let requests = state.requests.clone();

    let app = Router::new()
        .route("/v1/models", get(models))
        .route("/v1/chat/completions", post(chat_completions))
        .fallback(unrouted)
        .with_state(state);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    StubServer {
        base_url: format!("http://{addr}/v1"),
        requests,
    }
}

async fn models(State(state): State<StubState>, uri: Uri) -> Response {
    reply(&state, uri.path(), String::new())
}

async fn chat_completions(State(state): State<StubState>, uri: Uri, body: String) -> Response {
    reply(&state, uri.path(), body)
}

async fn unrouted(State(state): State<StubState>, uri: Uri, body: String) -> Response {
    state
        .requests
        .lock()
        .unwrap()
        .push((uri.path().to_string(), body));
    not_found()
}

fn reply(state: &StubState, path: &str, body: String) -> Response {
    state.requests.lock().unwrap().push((path.to_string(), body));

    let configured = state
        .routes
        .iter()
        .find(|r| format!("/v1/{}", r.path.trim_start_matches('/')) == path);
    match configured {
        Some(route) => (
            StatusCode::from_u16(route.status).unwrap(),
            [(header::CONTENT_TYPE, "application/json")],
            route.body.clone(),
        )
            .into_response(),
        None => not_found(),
    }
}

fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        [(header::CONTENT_TYPE, "application/json")],
        r#"{"error":"not found"}"#,
    )
        .into_response()
}

/// Write `content` to `.env.toml` in a fresh temp dir.
pub fn config_file(content: &str) -> (tempfile::TempDir, std::path::PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".env.toml");
    std::fs::write(&path, content).unwrap();
    (dir, path)
}
