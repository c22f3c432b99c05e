use std::net::TcpListener;
use std::sync::Arc;
use std::time::Instant;

use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::header::{
  ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
};
use axum::http::{HeaderValue, StatusCode};
use axum::routing::get;
use axum::{Json, Router};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::CoachError;
use crate::models::{CoachReply, CoachRequest, Echo, HealthResponse};
use crate::prompt::build_system_prompt;
use crate::upstream::UpstreamClient;

const RUNTIME: &str = "rust-axum";

/// Largest coach request body accepted, in bytes.
pub const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

pub struct RouterState {
  pub started_at: Instant,
  pub route: String,
  pub upstream: UpstreamClient,
}

pub fn build_router(state: RouterState) -> Router {
  let route = state.route.clone();
  let mut router = Router::new().route(&route, get(health).post(coach).options(preflight));
  if route != "/health" {
    router = router.route("/health", get(health));
  }

  router
    .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
    .layer(SetResponseHeaderLayer::overriding(
      ACCESS_CONTROL_ALLOW_ORIGIN,
      HeaderValue::from_static("*"),
    ))
    .layer(SetResponseHeaderLayer::overriding(
      ACCESS_CONTROL_ALLOW_METHODS,
      HeaderValue::from_static("GET, POST, OPTIONS"),
    ))
    .layer(SetResponseHeaderLayer::overriding(
      ACCESS_CONTROL_ALLOW_HEADERS,
      HeaderValue::from_static("Content-Type, Authorization"),
    ))
    .layer(TraceLayer::new_for_http())
    .with_state(Arc::new(state))
}

pub async fn run_router(listener: TcpListener, state: RouterState) -> anyhow::Result<()> {
  let app = build_router(state);
  let listener = tokio::net::TcpListener::from_std(listener)?;
  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await?;
  Ok(())
}

async fn shutdown_signal() {
  if let Err(err) = tokio::signal::ctrl_c().await {
    warn!(error = %err, "failed to listen for shutdown signal");
    std::future::pending::<()>().await;
  }
  info!("shutdown signal received");
}

async fn health(State(state): State<Arc<RouterState>>) -> Json<HealthResponse> {
  Json(HealthResponse {
    ok: true,
    route: state.route.clone(),
    runtime: RUNTIME.to_string(),
    uptime_ms: state.started_at.elapsed().as_millis() as u64,
  })
}

async fn preflight() -> StatusCode {
  StatusCode::NO_CONTENT
}

async fn coach(
  State(state): State<Arc<RouterState>>,
  body: Result<Bytes, BytesRejection>,
) -> Result<Json<CoachReply>, CoachError> {
  let request_id = Uuid::new_v4();
  let body = body
    .map_err(body_error)
    .inspect_err(|err| warn!(%request_id, error = %err, "unreadable coach request body"))?;
  let req = CoachRequest::from_slice(&body)
    .inspect_err(|err| warn!(%request_id, error = %err, "rejected coach request"))?;

  let system_prompt = build_system_prompt(&req);
  let started = Instant::now();
  let text = state
    .upstream
    .complete(&system_prompt, &req.user_text)
    .await
    .inspect_err(|err| warn!(%request_id, error = %err, "upstream call failed"))?;

  info!(
    %request_id,
    model = state.upstream.model(),
    elapsed_ms = started.elapsed().as_millis() as u64,
    "coach reply ready"
  );
  Ok(Json(assemble_reply(text, req)))
}

fn body_error(rejection: BytesRejection) -> CoachError {
  if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
    CoachError::BodyTooLarge(rejection.body_text())
  } else {
    CoachError::InvalidBody(rejection.body_text())
  }
}

fn assemble_reply(text: String, req: CoachRequest) -> CoachReply {
  CoachReply {
    text,
    echo: Echo {
      user_text: req.user_text,
      memory: req.memory,
    },
  }
}
