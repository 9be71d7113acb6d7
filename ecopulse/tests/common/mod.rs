//! Scriptable stand-in for the metrics API, served by axum on an ephemeral port.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

use ecopulse::api::{HttpApi, HttpApiConfig};

#[derive(Debug, Default)]
pub struct MockState {
    /// Newest sample timestamp served by `/metrics`.
    pub newest: String,
    /// Answer every route with HTTP 500.
    pub fail: bool,
    /// Delay applied before every response.
    pub delay: Duration,
    pub last_limit: Option<usize>,
    pub questions: Vec<String>,
}

#[derive(Clone, Default)]
pub struct Mock(pub Arc<Mutex<MockState>>);

impl Mock {
    pub fn set(&self, f: impl FnOnce(&mut MockState)) {
        f(&mut self.0.lock().unwrap());
    }

    pub fn get<T>(&self, f: impl FnOnce(&MockState) -> T) -> T {
        f(&self.0.lock().unwrap())
    }

    /// Shared gate: sleeps for the configured delay, then reports the failure flag.
    async fn gate(&self) -> Result<(), StatusCode> {
        let (delay, fail) = self.get(|s| (s.delay, s.fail));
        tokio::time::sleep(delay).await;
        if fail {
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        } else {
            Ok(())
        }
    }
}

#[derive(Deserialize)]
struct LimitQuery {
    limit: Option<usize>,
}

async fn metrics(State(m): State<Mock>, Query(q): Query<LimitQuery>) -> Result<Json<Value>, StatusCode> {
    m.gate().await?;
    let newest = m.get(|s| s.newest.clone());
    m.set(|s| s.last_limit = q.limit);
    // newest-first, like the real server
    Ok(Json(json!({
        "count": 3,
        "data": [
            {"timestamp": newest, "cpu": 31.5, "memory": 48.0, "disk": 71.2},
            {"timestamp": "2025-01-01T11:59:58", "cpu": 20.0, "memory": 47.5, "disk": 71.2},
            {"timestamp": "2025-01-01T11:59:56", "cpu": 10.0, "memory": 47.0, "disk": 71.1},
        ]
    })))
}

async fn predict(State(m): State<Mock>) -> Result<Json<Value>, StatusCode> {
    m.gate().await?;
    Ok(Json(json!({
        "status": "ok",
        "cpu": {"linear": 30.0, "forest": 34.0},
        "memory": null,
    })))
}

async fn system(State(m): State<Mock>) -> Result<Json<Value>, StatusCode> {
    m.gate().await?;
    Ok(Json(json!({
        "hostname": "edge-node-1",
        "cpu_arch": "aarch64",
        "os": "Linux",
        "cpu_cores": 4,
        "ram_total": 7.6,
        "disk_used": 12.0,
        "disk_total": 58.0,
    })))
}

#[derive(Deserialize)]
struct Question {
    question: String,
}

async fn chat(State(m): State<Mock>, Json(q): Json<Question>) -> Result<Json<Value>, StatusCode> {
    m.gate().await?;
    let answer = format!("analysed: {}", q.question);
    m.set(|s| s.questions.push(q.question));
    Ok(Json(json!({ "answer": answer })))
}

pub struct TestServer {
    pub addr: SocketAddr,
    pub mock: Mock,
    _shutdown: tokio::task::JoinHandle<()>,
}

impl TestServer {
    pub async fn new() -> Self {
        let mock = Mock::default();
        mock.set(|s| s.newest = "2025-01-01T12:00:00".into());
        let app = Router::new()
            .route("/metrics", get(metrics))
            .route("/predict", get(predict))
            .route("/system", get(system))
            .route("/chat", post(chat))
            .with_state(mock.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Give the server a moment to start accepting
        tokio::time::sleep(Duration::from_millis(20)).await;

        Self {
            addr,
            mock,
            _shutdown: handle,
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn api(&self, request_timeout: Option<Duration>) -> HttpApi {
        HttpApi::new(&HttpApiConfig {
            base_url: self.base_url().parse().unwrap(),
            chat_url: None,
            request_timeout,
            ca_pem: None,
        })
        .unwrap()
    }
}
