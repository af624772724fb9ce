use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use cursus::client::{BackendClient, ProgressUpdate};
use serde_json::Value;
use tokio::net::TcpListener;

/// In-memory stand-in for the flat-file backend.
#[derive(Debug, Default)]
pub struct Backend {
    pub courses: HashMap<u64, Value>,
    pub progress: HashMap<u64, Value>,
    pub updates: Vec<ProgressUpdate>,
    pub saved: Vec<(u64, Value)>,
    pub auth: Vec<Option<String>>,
    pub fail_updates: bool,
}

pub type SharedBackend = Arc<Mutex<Backend>>;

pub struct MockServer {
    pub addr: SocketAddr,
    pub backend: SharedBackend,
}

impl MockServer {
    pub fn base_url(&self) -> String {
        format!("http://{}/api", self.addr)
    }

    pub fn client(&self, token: Option<&str>) -> BackendClient {
        BackendClient::new(
            &self.base_url(),
            token.map(str::to_string),
            std::time::Duration::from_secs(5),
        )
        .unwrap()
    }

    pub fn updates(&self) -> Vec<ProgressUpdate> {
        self.backend.lock().unwrap().updates.clone()
    }

    #[allow(unused)]
    pub fn with<R>(&self, f: impl FnOnce(&mut Backend) -> R) -> R {
        f(&mut self.backend.lock().unwrap())
    }
}

fn record_auth(backend: &mut Backend, headers: &HeaderMap) {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    backend.auth.push(auth);
}

async fn get_course(
    State(backend): State<SharedBackend>,
    Path(id): Path<u64>,
    headers: HeaderMap,
) -> Result<Json<Value>, StatusCode> {
    let mut backend = backend.lock().unwrap();
    record_auth(&mut backend, &headers);
    backend
        .courses
        .get(&id)
        .cloned()
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

async fn put_course(
    State(backend): State<SharedBackend>,
    Path(id): Path<u64>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> StatusCode {
    let mut backend = backend.lock().unwrap();
    record_auth(&mut backend, &headers);
    backend.saved.push((id, body));
    StatusCode::OK
}

async fn get_progress(
    State(backend): State<SharedBackend>,
    Path(id): Path<u64>,
) -> Result<Json<Value>, StatusCode> {
    backend
        .lock()
        .unwrap()
        .progress
        .get(&id)
        .cloned()
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

async fn post_progress(
    State(backend): State<SharedBackend>,
    Json(update): Json<ProgressUpdate>,
) -> StatusCode {
    let mut backend = backend.lock().unwrap();
    backend.updates.push(update);
    if backend.fail_updates {
        StatusCode::INTERNAL_SERVER_ERROR
    } else {
        StatusCode::OK
    }
}

pub async fn setup_server(backend: Backend) -> MockServer {
    let backend = Arc::new(Mutex::new(backend));
    let app = Router::new()
        .route("/api/courses/{id}", get(get_course).put(put_course))
        .route("/api/progress/{id}", get(get_progress))
        .route("/api/progress", post(post_progress))
        .with_state(backend.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    MockServer { addr, backend }
}

/// Polls until `pred` holds or a second passes.
#[allow(unused)]
pub async fn eventually<F>(mut pred: F) -> bool
where
    F: FnMut() -> bool,
{
    for _ in 0..100 {
        if pred() {
            return true;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    pred()
}
