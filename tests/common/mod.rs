#![allow(dead_code)]

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use reqwest::Client;
use serde_json::{Value, json};
use tokio::sync::watch;
use uuid::Uuid;

use formhook::actions::{ActionRouter, RetryPolicy, WebhookDelivery};
use formhook::config::{Config, RetentionConfig, WebhookSettings};
use formhook::dispatch::DispatchEngine;
use formhook::models::{Action, Submission};
use formhook::state::{AppState, SharedState};
use formhook::store::{MemoryStore, Store};

/// Backoff base used by tests so retries take milliseconds instead of seconds.
pub const TEST_DELAY: Duration = Duration::from_millis(50);

// ── Mock webhook receiver ───────────────────────────────────────

#[derive(Debug, Clone)]
pub struct ReceivedRequest {
    pub method: Method,
    pub path: String,
    pub headers: HeaderMap,
    pub body: Value,
}

struct ReceiverState {
    script: Mutex<VecDeque<u16>>,
    fallback: u16,
    received: Mutex<Vec<ReceivedRequest>>,
}

/// An HTTP server that answers with scripted status codes and records every request.
pub struct MockReceiver {
    pub addr: SocketAddr,
    state: Arc<ReceiverState>,
}

impl MockReceiver {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn requests(&self) -> Vec<ReceivedRequest> {
        self.state.received.lock().unwrap().clone()
    }
}

async fn record(
    State(state): State<Arc<ReceiverState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    let body = serde_json::from_slice(&body).unwrap_or(Value::Null);
    state.received.lock().unwrap().push(ReceivedRequest {
        method,
        path: uri.path().to_string(),
        headers,
        body,
    });
    let code = state
        .script
        .lock()
        .unwrap()
        .pop_front()
        .unwrap_or(state.fallback);
    StatusCode::from_u16(code).unwrap()
}

/// Answer with `script` in order, then `fallback` for every later request.
pub async fn spawn_receiver(script: &[u16], fallback: u16) -> MockReceiver {
    let state = Arc::new(ReceiverState {
        script: Mutex::new(script.iter().copied().collect()),
        fallback,
        received: Mutex::new(Vec::new()),
    });

    let app = Router::new().fallback(record).with_state(state.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind mock receiver");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Mock receiver failed");
    });

    MockReceiver { addr, state }
}

/// A URL nothing is listening on.
pub async fn unreachable_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}/hook")
}

// ── Engine harness ──────────────────────────────────────────────

pub fn test_policy() -> RetryPolicy {
    RetryPolicy::new(3, TEST_DELAY)
}

pub fn engine(store: Arc<dyn Store>, policy: RetryPolicy) -> DispatchEngine {
    let delivery = WebhookDelivery::new(store.clone(), policy, Duration::from_secs(5))
        .expect("Failed to build webhook client");
    DispatchEngine::new(store, ActionRouter::new(delivery))
}

pub fn actions(value: Value) -> Vec<Action> {
    serde_json::from_value(value).expect("invalid action list")
}

/// Create a form carrying `actions` and one unprocessed submission against it.
pub async fn seed_submission(store: &dyn Store, actions: &[Action]) -> Submission {
    let form = store
        .create_form("Contact us", actions)
        .await
        .expect("create form failed");
    store
        .create_submission(
            form.id,
            &form.title,
            &json!({ "name": "Ada", "email": "ada@example.com" }),
        )
        .await
        .expect("create submission failed")
}

// ── Full application ────────────────────────────────────────────

pub struct TestApp {
    pub addr: SocketAddr,
    pub state: SharedState,
    pub client: Client,
    shutdown: watch::Sender<bool>,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn get(&self, path: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("get request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    pub async fn post(&self, path: &str, body: &Value) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("post request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    pub async fn put(&self, path: &str, body: &Value) -> (Value, StatusCode) {
        let resp = self
            .client
            .put(self.url(path))
            .json(body)
            .send()
            .await
            .expect("put request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    pub async fn delete(&self, path: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .delete(self.url(path))
            .send()
            .await
            .expect("delete request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    /// Create a form, return its JSON.
    pub async fn create_form(&self, title: &str, actions: Value) -> Value {
        let (body, status) = self
            .post("/api/v1/forms", &json!({ "title": title, "actions": actions }))
            .await;
        assert_eq!(status, StatusCode::OK, "create form failed: {body}");
        body
    }

    /// Poll until the submission is marked processed.
    pub async fn wait_processed(&self, submission_id: Uuid) -> Submission {
        for _ in 0..500 {
            let found = self.state.store.find_submission(submission_id).await.unwrap();
            if let Some(submission) = found {
                if submission.processed {
                    return submission;
                }
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("submission {submission_id} was never processed");
    }

    pub fn shutdown(&self) {
        let _ = self.shutdown.send(true);
    }
}

pub fn test_config() -> Config {
    Config {
        database_url: None,
        host: "127.0.0.1".parse().unwrap(),
        port: 0,
        max_body_size: 64 * 1024,
        log_level: "warn".to_string(),
        worker_count: 2,
        queue_capacity: 16,
        requeue_interval: Duration::from_secs(3600),
        webhook: WebhookSettings {
            max_attempts: 3,
            retry_delay: TEST_DELAY,
            timeout: Duration::from_secs(5),
        },
        retention: RetentionConfig::default(),
    }
}

/// Spawn the app on a random port, backed by a fresh in-memory store and a running
/// worker pool.
pub async fn spawn_app() -> TestApp {
    spawn_app_with(test_config()).await
}

pub async fn spawn_app_with(config: Config) -> TestApp {
    let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
    let (state, jobs) = AppState::new(store, config).expect("Failed to build state");

    let (shutdown, shutdown_rx) = watch::channel(false);
    formhook::worker::run_pool(
        state.clone(),
        jobs,
        shutdown_rx.clone(),
        state.config.worker_count,
    );
    formhook::worker::spawn_requeuer(state.clone(), state.config.requeue_interval, shutdown_rx);

    let app = formhook::build_app(state.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to random port");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Server failed");
    });

    TestApp {
        addr,
        state,
        client: Client::new(),
        shutdown,
    }
}
