use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(default)]
pub struct AppConfig {
  pub host: String,
  pub port: u16,
  pub route: String,
  pub model: String,
  pub upstream_url: String,
  pub request_timeout_secs: Option<u64>,
  pub log_level: String,
}

impl Default for AppConfig {
  fn default() -> Self {
    Self {
      host: "127.0.0.1".to_string(),
      port: 8787,
      route: "/api/coach".to_string(),
      model: "gpt-4.1-mini".to_string(),
      upstream_url: "https://api.openai.com/v1/responses".to_string(),
      request_timeout_secs: None,
      log_level: "info".to_string(),
    }
  }
}

impl AppConfig {
  pub fn validate(&self) -> anyhow::Result<()> {
    if !self.route.starts_with('/') || self.route.len() < 2 {
      anyhow::bail!("route must be an absolute path such as /api/coach, got {:?}", self.route);
    }
    if self.route.contains(['*', ':', '{', '}']) || self.route.contains("//") {
      anyhow::bail!("route must be a literal path without wildcards or parameters, got {:?}", self.route);
    }
    if self.model.trim().is_empty() {
      anyhow::bail!("model must not be empty");
    }
    if self.request_timeout_secs == Some(0) {
      anyhow::bail!("request_timeout_secs must be positive when set");
    }
    if self.upstream_url.trim().is_empty() {
      anyhow::bail!("upstream_url must not be empty");
    }
    Ok(())
  }
}

pub fn load_or_init(path: &Path) -> anyhow::Result<AppConfig> {
  if path.exists() {
    let data = std::fs::read_to_string(path)?;
    let config: AppConfig = serde_json::from_str(&data)?;
    Ok(config)
  } else {
    let config = AppConfig::default();
    save_config(path, &config)?;
    Ok(config)
  }
}

pub fn save_config(path: &Path, config: &AppConfig) -> anyhow::Result<()> {
  let json = serde_json::to_string_pretty(config)?;
  std::fs::write(path, json)?;
  Ok(())
}

/// Bearer credential for the upstream completion service.
///
/// Only constructed from a non-blank value; `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
  pub fn from_value(raw: Option<String>) -> Option<Self> {
    raw
      .map(|value| value.trim().to_string())
      .filter(|value| !value.is_empty())
      .map(Self)
  }

  pub fn from_env(var: &str) -> Option<Self> {
    Self::from_value(std::env::var(var).ok())
  }

  pub fn expose(&self) -> &str {
    &self.0
  }
}

impl fmt::Debug for ApiKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str("ApiKey(***)")
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn load_or_init_writes_defaults_when_missing() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("coach.json");

    let config = load_or_init(&path).expect("defaults should load");
    assert_eq!(config.route, "/api/coach");
    assert!(path.exists());

    let reloaded = load_or_init(&path).expect("saved config should reload");
    assert_eq!(reloaded.model, config.model);
    assert_eq!(reloaded.port, config.port);
  }

  #[test]
  fn partial_config_file_keeps_other_defaults() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("coach.json");
    std::fs::write(&path, r#"{ "model": "gpt-4o-mini", "port": 9000 }"#).expect("write");

    let config = load_or_init(&path).expect("partial config should load");
    assert_eq!(config.model, "gpt-4o-mini");
    assert_eq!(config.port, 9000);
    assert_eq!(config.upstream_url, "https://api.openai.com/v1/responses");
    assert_eq!(config.request_timeout_secs, None);
  }

  #[test]
  fn validate_rejects_unusable_settings() {
    assert!(AppConfig::default().validate().is_ok());

    let relative = AppConfig {
      route: "api/coach".to_string(),
      ..AppConfig::default()
    };
    assert!(relative.validate().is_err());

    let no_model = AppConfig {
      model: " ".to_string(),
      ..AppConfig::default()
    };
    assert!(no_model.validate().is_err());
  }

  #[test]
  fn validate_rejects_pattern_routes() {
    for route in ["/*", "/api/*rest", "/api/:id", "/api/{id}", "/api//coach"] {
      let config = AppConfig {
        route: route.to_string(),
        ..AppConfig::default()
      };
      assert!(config.validate().is_err(), "{route} should be rejected");
    }
  }

  #[test]
  fn validate_rejects_zero_timeout() {
    let zero = AppConfig {
      request_timeout_secs: Some(0),
      ..AppConfig::default()
    };
    assert!(zero.validate().is_err());

    let thirty = AppConfig {
      request_timeout_secs: Some(30),
      ..AppConfig::default()
    };
    assert!(thirty.validate().is_ok());
  }

  #[test]
  fn api_key_rejects_blank_values() {
    assert_eq!(ApiKey::from_value(None), None);
    assert_eq!(ApiKey::from_value(Some("   ".to_string())), None);
    let key = ApiKey::from_value(Some("  sk-test \n".to_string())).expect("key");
    assert_eq!(key.expose(), "sk-test");
  }

  #[test]
  fn api_key_debug_is_redacted() {
    let key = ApiKey::from_value(Some("sk-secret".to_string())).expect("key");
    assert!(!format!("{key:?}").contains("sk-secret"));
  }
}
