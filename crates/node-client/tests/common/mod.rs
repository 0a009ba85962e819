//! In-process mock node for integration tests.
//!
//! Binds an axum server to a loopback port, records every request it
//! receives, and answers through a per-test responder.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header::CONTENT_TYPE, HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use protocol::{Message, MessageSerializer, Nonce, PowProvider, ProtocolError};
use serde_json::{json, Value};
use tokio::task::JoinHandle;

pub const TESTNET_NETWORK_ID: u64 = 8_342_982_141_227_064_571;
pub const MIN_POW_SCORE: f64 = 4000.0;
pub const TIP_A: &str = "aa00000000000000000000000000000000000000000000000000000000000001";
pub const TIP_B: &str = "bb00000000000000000000000000000000000000000000000000000000000002";
pub const ACCEPTED_ID: &str = "cc00000000000000000000000000000000000000000000000000000000000003";

/// One request as the mock node saw it.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: Method,
    pub uri: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl Recorded {
    pub fn path(&self) -> &str {
        self.uri.split('?').next().unwrap_or_default()
    }

    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("request body is JSON")
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }
}

/// What the mock node answers with.
#[derive(Debug, Clone)]
pub struct Reply {
    pub status: StatusCode,
    pub content_type: &'static str,
    pub body: Vec<u8>,
    pub delay: Option<Duration>,
}

impl Reply {
    pub fn json(status: u16, body: Value) -> Self {
        Self {
            status: StatusCode::from_u16(status).unwrap(),
            content_type: "application/json",
            body: body.to_string().into_bytes(),
            delay: None,
        }
    }

    pub fn text(status: u16, body: &str) -> Self {
        Self {
            status: StatusCode::from_u16(status).unwrap(),
            content_type: "text/plain",
            body: body.as_bytes().to_vec(),
            delay: None,
        }
    }

    pub fn bytes(status: u16, body: &[u8]) -> Self {
        Self {
            status: StatusCode::from_u16(status).unwrap(),
            content_type: "application/octet-stream",
            body: body.to_vec(),
            delay: None,
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

type Responder = Box<dyn Fn(&Recorded) -> Reply + Send + Sync>;

struct MockState {
    requests: Mutex<Vec<Recorded>>,
    responder: Responder,
}

pub struct MockNode {
    pub url: String,
    state: Arc<MockState>,
    task: JoinHandle<()>,
}

impl MockNode {
    /// Starts a node answering with [`default_reply`].
    pub async fn start() -> Self {
        Self::with_responder(default_reply).await
    }

    pub async fn with_responder(
        responder: impl Fn(&Recorded) -> Reply + Send + Sync + 'static,
    ) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind loopback");
        let addr = listener.local_addr().expect("local addr");
        let state = Arc::new(MockState {
            requests: Mutex::new(Vec::new()),
            responder: Box::new(responder),
        });
        let app = Router::new().fallback(handle).with_state(Arc::clone(&state));
        let task = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("mock node server");
        });
        Self {
            url: format!("http://{addr}"),
            state,
            task,
        }
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.state.requests.lock().unwrap().clone()
    }

    pub fn requests_to(&self, path: &str) -> Vec<Recorded> {
        self.requests()
            .into_iter()
            .filter(|request| request.path() == path)
            .collect()
    }
}

impl Drop for MockNode {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn handle(
    State(state): State<Arc<MockState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let recorded = Recorded {
        method,
        uri: uri.to_string(),
        headers,
        body,
    };
    state.requests.lock().unwrap().push(recorded.clone());
    let reply = (state.responder)(&recorded);
    if let Some(delay) = reply.delay {
        tokio::time::sleep(delay).await;
    }
    (reply.status, [(CONTENT_TYPE, reply.content_type)], reply.body).into_response()
}

pub fn info_body() -> Value {
    json!({
        "name": "HORNET",
        "version": "1.1.3",
        "isHealthy": true,
        "protocol": {
            "networkName": "testnet",
            "bech32HRP": "atoi",
            "minPoWScore": MIN_POW_SCORE
        }
    })
}

/// Answers the routes a submission touches; 404 elsewhere.
pub fn default_reply(request: &Recorded) -> Reply {
    match (request.method.as_str(), request.path()) {
        ("GET", "/health") => Reply::text(200, ""),
        ("GET", "/api/v2/info") => Reply::json(200, json!(info_body())),
        ("GET", "/api/v2/tips") => Reply::json(200, json!({ "tipMessageIds": [TIP_A, TIP_B] })),
        ("POST", "/api/v2/messages")
            if request.header("content-type") == Some("application/octet-stream") =>
        {
            Reply::json(201, json!({ "data": { "messageId": ACCEPTED_ID } }))
        }
        ("POST", "/api/v2/messages") => Reply::json(201, json!({ "messageId": ACCEPTED_ID })),
        _ => Reply::json(
            404,
            json!({ "error": { "code": "404", "message": "route not found" } }),
        ),
    }
}

// ---------------------------------------------------------------------------
// Capability mocks
// ---------------------------------------------------------------------------

/// Serializes messages as compact JSON.
pub struct JsonSerializer;

impl MessageSerializer for JsonSerializer {
    fn serialize(&self, message: &Message) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(message).map_err(|error| ProtocolError::Serialization {
            message: error.to_string(),
        })
    }
}

/// Returns a fixed nonce and records every call.
pub struct FixedPow {
    pub nonce: u64,
    pub calls: Mutex<Vec<(Vec<u8>, f64)>>,
}

impl FixedPow {
    pub fn new(nonce: u64) -> Arc<Self> {
        Arc::new(Self {
            nonce,
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<(Vec<u8>, f64)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PowProvider for FixedPow {
    async fn pow(&self, message: &[u8], target_score: f64) -> Result<Nonce, ProtocolError> {
        self.calls
            .lock()
            .unwrap()
            .push((message.to_vec(), target_score));
        Ok(Nonce::new(self.nonce))
    }
}

/// Always fails.
pub struct FailingPow;

#[async_trait]
impl PowProvider for FailingPow {
    async fn pow(&self, _message: &[u8], _target_score: f64) -> Result<Nonce, ProtocolError> {
        Err(ProtocolError::ProofOfWork {
            message: "worker pool unavailable".to_owned(),
        })
    }
}
