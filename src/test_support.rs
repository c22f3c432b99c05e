//! In-process stand-in for the completion endpoint, bound to an ephemeral port.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::Router;
use serde_json::Value;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

#[derive(Clone)]
pub struct MockReply {
  status: u16,
  body: String,
  content_type: &'static str,
}

impl MockReply {
  pub fn json(status: u16, body: Value) -> Self {
    Self {
      status,
      body: body.to_string(),
      content_type: "application/json",
    }
  }

  pub fn text(status: u16, body: &str) -> Self {
    Self {
      status,
      body: body.to_string(),
      content_type: "text/plain",
    }
  }
}

#[derive(Clone, Debug)]
pub struct SeenRequest {
  pub authorization: Option<String>,
  pub body: Value,
}

struct MockState {
  reply: MockReply,
  seen: Mutex<Vec<SeenRequest>>,
}

pub struct MockUpstream {
  pub url: String,
  state: Arc<MockState>,
  handle: JoinHandle<()>,
}

impl MockUpstream {
  pub async fn start(reply: MockReply) -> Self {
    let state = Arc::new(MockState {
      reply,
      seen: Mutex::new(Vec::new()),
    });
    let app = Router::new()
      .route("/v1/responses", post(respond))
      .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
      .await
      .expect("bind mock upstream");
    let addr = listener.local_addr().expect("mock upstream addr");
    let handle = tokio::spawn(async move {
      let _ = axum::serve(listener, app).await;
    });

    Self {
      url: format!("http://{addr}/v1/responses"),
      state,
      handle,
    }
  }

  pub async fn hits(&self) -> usize {
    self.state.seen.lock().await.len()
  }

  pub async fn last_request(&self) -> Option<SeenRequest> {
    self.state.seen.lock().await.last().cloned()
  }
}

impl Drop for MockUpstream {
  fn drop(&mut self) {
    self.handle.abort();
  }
}

async fn respond(State(state): State<Arc<MockState>>, headers: HeaderMap, body: Bytes) -> Response {
  let authorization = headers
    .get(AUTHORIZATION)
    .and_then(|value| value.to_str().ok())
    .map(str::to_string);
  let body = serde_json::from_slice(&body).unwrap_or(Value::Null);
  state.seen.lock().await.push(SeenRequest { authorization, body });

  let reply = &state.reply;
  let status = StatusCode::from_u16(reply.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
  (status, [(CONTENT_TYPE, reply.content_type)], reply.body.clone()).into_response()
}

/// URL of a local port with nothing listening on it.
pub fn closed_port_url() -> String {
  let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind probe");
  let port = listener.local_addr().expect("probe addr").port();
  drop(listener);
  format!("http://127.0.0.1:{port}/v1/responses")
}
