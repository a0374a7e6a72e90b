//! Tracing subscriber setup.

use color_eyre::eyre::eyre;
use color_eyre::Result;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;

const DEFAULT_FILTER: &str = "itam_sync=info";

/// Install the global subscriber. `RUST_LOG` takes precedence over the
/// configured filter.
///
/// When a log file is configured, events are written through a non-blocking
/// appender and the returned guard must be held until shutdown so buffered
/// lines are flushed.
pub fn init(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
  let filter = env_filter(config)?;

  match &config.file {
    Some(path) => {
      let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| std::path::Path::new("."));
      let name = path
        .file_name()
        .ok_or_else(|| eyre!("Log file path has no file name: {}", path.display()))?;
      std::fs::create_dir_all(dir)?;

      let appender = tracing_appender::rolling::never(dir, name);
      let (writer, guard) = tracing_appender::non_blocking(appender);
      tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .try_init()
        .map_err(|e| eyre!("Failed to install tracing subscriber: {}", e))?;
      Ok(Some(guard))
    }
    None => {
      tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
        .try_init()
        .map_err(|e| eyre!("Failed to install tracing subscriber: {}", e))?;
      Ok(None)
    }
  }
}

fn env_filter(config: &LoggingConfig) -> Result<EnvFilter> {
  if let Ok(filter) = EnvFilter::try_from_default_env() {
    return Ok(filter);
  }
  let directive = config.filter.as_deref().unwrap_or(DEFAULT_FILTER);
  EnvFilter::try_new(directive).map_err(|e| eyre!("Invalid log filter '{}': {}", directive, e))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn rejects_malformed_filter() {
    if std::env::var_os("RUST_LOG").is_some() {
      return;
    }
    let config = LoggingConfig {
      filter: Some("itam_sync=loudest".into()),
      file: None,
    };
    assert!(env_filter(&config).is_err());
  }

  #[test]
  fn falls_back_to_default_filter() {
    if std::env::var_os("RUST_LOG").is_some() {
      return;
    }
    assert!(env_filter(&LoggingConfig::default()).is_ok());
  }
}
