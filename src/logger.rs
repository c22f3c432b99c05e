use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

/// Installs the global `tracing` subscriber.
///
/// `RUST_LOG` wins over `level`. With a `log_path` the output is appended to
/// that file instead of stderr.
pub fn init(log_path: Option<&Path>, level: &str) -> anyhow::Result<()> {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
  let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);

  let result = match log_path {
    Some(path) => {
      let file = OpenOptions::new().create(true).append(true).open(path)?;
      builder.with_ansi(false).with_writer(Mutex::new(file)).try_init()
    }
    None => builder.try_init(),
  };

  result.map_err(|err| anyhow::anyhow!("failed to install log subscriber: {err}"))
}
