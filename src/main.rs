mod config;
mod error;
mod extract;
mod logger;
mod models;
mod prompt;
mod router;
mod upstream;

#[cfg(test)]
mod test_support;

use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};

use config::{load_or_init, ApiKey, AppConfig, API_KEY_ENV};
use router::{run_router, RouterState};
use upstream::UpstreamClient;

#[derive(Parser, Debug)]
#[command(name = "coach-proxy", about = "Fitness coach proxy for an LLM completion endpoint")]
struct Args {
  /// JSON config file; created with defaults when it does not exist.
  #[arg(long)]
  config: Option<PathBuf>,
  #[arg(long)]
  host: Option<String>,
  #[arg(long)]
  port: Option<u16>,
  /// Append logs to this file instead of stderr.
  #[arg(long)]
  log_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  let args = Args::parse();

  let mut config = match args.config.as_deref() {
    Some(path) => load_or_init(path)
      .with_context(|| format!("failed to load config from {}", path.display()))?,
    None => AppConfig::default(),
  };
  if let Some(host) = args.host {
    config.host = host;
  }
  if let Some(port) = args.port {
    config.port = port;
  }
  config.validate()?;

  logger::init(args.log_file.as_deref(), &config.log_level)?;

  let upstream = UpstreamClient::new(&config, ApiKey::from_env(API_KEY_ENV))
    .context("failed to build upstream client")?;
  if !upstream.has_credential() {
    warn!("{API_KEY_ENV} is not set; coach replies will report the backend as unavailable");
  }

  let listener = std::net::TcpListener::bind((config.host.as_str(), config.port))
    .with_context(|| format!("failed to bind {}:{}", config.host, config.port))?;
  listener.set_nonblocking(true)?;
  info!(
    addr = %listener.local_addr()?,
    route = %config.route,
    model = %config.model,
    "coach proxy listening"
  );

  let state = RouterState {
    started_at: Instant::now(),
    route: config.route.clone(),
    upstream,
  };
  run_router(listener, state).await
}
