use std::time::{Duration, Instant};

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use tracing::{debug, warn};

use crate::config::{ApiKey, AppConfig};
use crate::error::CoachError;
use crate::extract::ReplyShape;
use crate::models::UpstreamRequest;

pub const BACKEND_UNAVAILABLE_TEXT: &str =
  "Coach backend unavailable: no upstream API key is configured.";

/// Client for the completion endpoint. The credential is handed in at
/// construction; without one every call degrades to a labeled text reply.
pub struct UpstreamClient {
  http: reqwest::Client,
  endpoint: String,
  model: String,
  api_key: Option<ApiKey>,
}

impl UpstreamClient {
  pub fn new(config: &AppConfig, api_key: Option<ApiKey>) -> anyhow::Result<Self> {
    let mut builder = reqwest::Client::builder();
    if let Some(secs) = config.request_timeout_secs {
      builder = builder.timeout(Duration::from_secs(secs));
    }

    Ok(Self {
      http: builder.build()?,
      endpoint: config.upstream_url.clone(),
      model: config.model.clone(),
      api_key,
    })
  }

  pub fn model(&self) -> &str {
    &self.model
  }

  pub fn has_credential(&self) -> bool {
    self.api_key.is_some()
  }

  pub async fn complete(&self, system_prompt: &str, user_text: &str) -> Result<String, CoachError> {
    let Some(key) = self.api_key.as_ref() else {
      warn!("no upstream API key configured; answering with degraded text");
      return Ok(BACKEND_UNAVAILABLE_TEXT.to_string());
    };

    let mut headers = HeaderMap::new();
    headers.insert(
      AUTHORIZATION,
      HeaderValue::from_str(&format!("Bearer {}", key.expose()))
        .map_err(|_| CoachError::Configuration("API key is not a valid header value".to_string()))?,
    );

    let payload = UpstreamRequest::new(&self.model, system_prompt, user_text);
    let started = Instant::now();

    let resp = self
      .http
      .post(&self.endpoint)
      .headers(headers)
      .json(&payload)
      .send()
      .await
      .map_err(|err| CoachError::unreachable(&err.to_string()))?;

    let status = resp.status();
    if !status.is_success() {
      let text = resp
        .text()
        .await
        .unwrap_or_else(|_| "upstream request failed".to_string());
      warn!(status = status.as_u16(), "upstream returned an error status");
      return Err(CoachError::upstream(status.as_u16(), &text));
    }

    let bytes = resp
      .bytes()
      .await
      .map_err(|err| CoachError::unreachable(&err.to_string()))?;
    let reply: serde_json::Value = serde_json::from_slice(&bytes).unwrap_or_else(|err| {
      warn!(error = %err, "upstream success body is not JSON");
      serde_json::Value::Null
    });

    let shape = ReplyShape::classify(&reply);
    debug!(
      elapsed_ms = started.elapsed().as_millis() as u64,
      shape = shape.kind(),
      "upstream reply received"
    );
    if shape == ReplyShape::Unrecognized {
      warn!("upstream reply carried no text; using fallback");
    }
    Ok(shape.into_text())
  }
}
