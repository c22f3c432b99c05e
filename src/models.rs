use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CoachError;

/// A validated coach question. Only `user_text` is mandatory; every other
/// field falls back to empty when absent or of the wrong JSON type.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CoachRequest {
  pub user_text: String,
  pub memory: Option<Value>,
  pub goal: Option<String>,
  pub injuries: Vec<String>,
  pub weight_lb: Option<String>,
  pub recent_lifts: Vec<Lift>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Lift {
  pub name: Option<String>,
  pub best: Option<String>,
  pub reps: Option<String>,
}

impl CoachRequest {
  pub fn from_slice(bytes: &[u8]) -> Result<Self, CoachError> {
    let body: Value =
      serde_json::from_slice(bytes).map_err(|err| CoachError::InvalidBody(err.to_string()))?;

    let user_text = coerce_text(body.get("userText")).trim().to_string();
    if user_text.is_empty() {
      return Err(CoachError::MissingField("userText"));
    }

    let injuries = body
      .get("injuries")
      .and_then(Value::as_array)
      .map(|items| items.iter().filter_map(scalar_text).collect())
      .unwrap_or_default();

    // Entries are kept in order, including malformed ones, so the prompt cap
    // applies to the caller's first entries.
    let recent_lifts = body
      .get("recentLifts")
      .and_then(Value::as_array)
      .map(|items| items.iter().map(Lift::from_value).collect())
      .unwrap_or_default();

    Ok(Self {
      user_text,
      memory: body.get("memory").filter(|memory| !memory.is_null()).cloned(),
      goal: body.get("goal").and_then(scalar_text),
      injuries,
      weight_lb: body.get("weightLb").and_then(scalar_text),
      recent_lifts,
    })
  }
}

impl Lift {
  fn from_value(value: &Value) -> Self {
    Self {
      name: value.get("name").and_then(scalar_text),
      best: value.get("best").and_then(scalar_text),
      reps: value.get("reps").and_then(scalar_text),
    }
  }
}

fn coerce_text(value: Option<&Value>) -> String {
  match value {
    None | Some(Value::Null) => String::new(),
    Some(Value::String(text)) => text.clone(),
    Some(other) => other.to_string(),
  }
}

/// 2^53: whole floats below this convert to `i64` exactly.
const MAX_EXACT_F64: f64 = 9_007_199_254_740_992.0;

/// Strings (trimmed, non-empty) and numbers as display text.
fn scalar_text(value: &Value) -> Option<String> {
  match value {
    Value::String(text) => {
      let text = text.trim();
      (!text.is_empty()).then(|| text.to_string())
    }
    Value::Number(number) => Some(match number.as_f64() {
      Some(float) if number.is_f64() && float.fract() == 0.0 && float.abs() < MAX_EXACT_F64 => {
        format!("{}", float as i64)
      }
      _ => number.to_string(),
    }),
    _ => None,
  }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct UpstreamMessage {
  pub role: String,
  pub content: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct UpstreamRequest {
  pub model: String,
  pub input: Vec<UpstreamMessage>,
}

impl UpstreamRequest {
  pub fn new(model: &str, system_prompt: &str, user_text: &str) -> Self {
    Self {
      model: model.to_string(),
      input: vec![
        UpstreamMessage {
          role: "system".to_string(),
          content: system_prompt.to_string(),
        },
        UpstreamMessage {
          role: "user".to_string(),
          content: user_text.to_string(),
        },
      ],
    }
  }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Echo {
  #[serde(rename = "userText")]
  pub user_text: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub memory: Option<Value>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct CoachReply {
  pub text: String,
  pub echo: Echo,
}

#[derive(Serialize, Deserialize)]
pub struct HealthResponse {
  pub ok: bool,
  pub route: String,
  pub runtime: String,
  pub uptime_ms: u64,
}
