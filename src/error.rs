use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

/// Longest slice of an upstream error body that is passed back to callers.
pub const MAX_UPSTREAM_BODY_CHARS: usize = 3000;

#[derive(Debug, Error)]
pub enum CoachError {
  #[error("invalid JSON body: {0}")]
  InvalidBody(String),
  #[error("request body rejected: {0}")]
  BodyTooLarge(String),
  #[error("missing required field `{0}`")]
  MissingField(&'static str),
  #[error("configuration error: {0}")]
  Configuration(String),
  #[error("upstream returned status {status}")]
  Upstream { status: u16, body: String },
  #[error("upstream unreachable")]
  Unreachable(String),
}

impl CoachError {
  pub fn upstream(status: u16, body: &str) -> Self {
    Self::Upstream {
      status,
      body: truncate_chars(body, MAX_UPSTREAM_BODY_CHARS),
    }
  }

  pub fn unreachable(detail: &str) -> Self {
    Self::Unreachable(truncate_chars(detail, MAX_UPSTREAM_BODY_CHARS))
  }

  pub fn status_code(&self) -> StatusCode {
    match self {
      Self::InvalidBody(_) | Self::MissingField(_) => StatusCode::BAD_REQUEST,
      Self::BodyTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
      Self::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
      Self::Upstream { .. } | Self::Unreachable(_) => StatusCode::BAD_GATEWAY,
    }
  }
}

impl IntoResponse for CoachError {
  fn into_response(self) -> Response {
    let status = self.status_code();
    let body = match &self {
      Self::Upstream { status: upstream, body } => serde_json::json!({
        "error": self.to_string(),
        "status": upstream,
        "body": body,
      }),
      Self::Unreachable(detail) => serde_json::json!({
        "error": self.to_string(),
        "status": serde_json::Value::Null,
        "body": detail,
      }),
      _ => serde_json::json!({ "error": self.to_string() }),
    };
    (status, Json(body)).into_response()
  }
}

pub fn truncate_chars(text: &str, max: usize) -> String {
  match text.char_indices().nth(max) {
    Some((idx, _)) => text[..idx].to_string(),
    None => text.to_string(),
  }
}
