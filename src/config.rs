use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable overriding `api.base_url`.
pub const BASE_URL_ENV: &str = "ITAM_API_BASE_URL";
/// Environment variable holding an optional bearer token.
pub const TOKEN_ENV: &str = "ITAM_API_TOKEN";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
  #[serde(default)]
  pub api: ApiConfig,
  #[serde(default)]
  pub cache: CacheConfig,
  #[serde(default)]
  pub retry: RetryConfig,
  #[serde(default)]
  pub health: HealthConfig,
  #[serde(default)]
  pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
  /// Server origin, without the `/api/{version}` prefix
  #[serde(default = "default_base_url")]
  pub base_url: String,
  #[serde(default = "default_version")]
  pub version: String,
  /// Request timeout; the transport default applies when unset
  pub timeout_secs: Option<u64>,
  /// Bearer token; usually supplied through ITAM_API_TOKEN instead
  #[serde(skip)]
  pub token: Option<String>,
}

impl Default for ApiConfig {
  fn default() -> Self {
    Self {
      base_url: default_base_url(),
      version: default_version(),
      timeout_secs: None,
      token: None,
    }
  }
}

fn default_base_url() -> String {
  "http://localhost:8787".to_string()
}

fn default_version() -> String {
  "v1".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
  /// Staleness window for reads that don't declare their own
  #[serde(default = "default_stale_time")]
  pub stale_time_secs: u64,
  /// Idle window after which an unread entry may be purged
  #[serde(default = "default_gc_time")]
  pub gc_time_secs: u64,
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      stale_time_secs: default_stale_time(),
      gc_time_secs: default_gc_time(),
    }
  }
}

impl CacheConfig {
  pub fn stale_time(&self) -> Duration {
    Duration::from_secs(self.stale_time_secs)
  }

  pub fn gc_time(&self) -> Duration {
    Duration::from_secs(self.gc_time_secs)
  }
}

fn default_stale_time() -> u64 {
  5 * 60
}

fn default_gc_time() -> u64 {
  10 * 60
}

#[derive(Debug, Clone, Deserialize)]
pub struct RetryConfig {
  /// Total attempts for reads, including the first
  #[serde(default = "default_query_attempts")]
  pub query_attempts: u32,
  /// Total attempts for writes, including the first
  #[serde(default = "default_mutation_attempts")]
  pub mutation_attempts: u32,
  #[serde(default = "default_base_delay")]
  pub base_delay_ms: u64,
  #[serde(default = "default_max_delay")]
  pub max_delay_ms: u64,
}

impl Default for RetryConfig {
  fn default() -> Self {
    Self {
      query_attempts: default_query_attempts(),
      mutation_attempts: default_mutation_attempts(),
      base_delay_ms: default_base_delay(),
      max_delay_ms: default_max_delay(),
    }
  }
}

fn default_query_attempts() -> u32 {
  3
}

fn default_mutation_attempts() -> u32 {
  2
}

fn default_base_delay() -> u64 {
  1000
}

fn default_max_delay() -> u64 {
  30_000
}

#[derive(Debug, Clone, Deserialize)]
pub struct HealthConfig {
  #[serde(default = "default_poll_interval")]
  pub poll_interval_secs: u64,
}

impl Default for HealthConfig {
  fn default() -> Self {
    Self {
      poll_interval_secs: default_poll_interval(),
    }
  }
}

impl HealthConfig {
  pub fn poll_interval(&self) -> Duration {
    Duration::from_secs(self.poll_interval_secs)
  }
}

fn default_poll_interval() -> u64 {
  30
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
  /// tracing filter directive, e.g. "itam_sync=debug"; RUST_LOG wins
  pub filter: Option<String>,
  /// Log to this file instead of stderr
  pub file: Option<PathBuf>,
}

impl Config {
  /// Load configuration from file, then apply environment overrides.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./itam-sync.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/itam-sync/config.yaml
  ///
  /// With no file found, defaults are used.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    let config = match path {
      Some(p) => Self::load_from_path(&p)?,
      None => Config::default(),
    };

    Ok(config.with_env_overrides())
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("itam-sync.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("itam-sync").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  pub fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    let config: Config = serde_yaml::from_str(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))?;

    config
      .validate()
      .map_err(|e| eyre!("Invalid config file {}: {}", path.display(), e))?;
    Ok(config)
  }

  /// Reject settings that would drive a background loop with no period.
  pub fn validate(&self) -> Result<()> {
    if self.health.poll_interval_secs == 0 {
      return Err(eyre!("health.poll_interval_secs must be at least 1"));
    }
    if self.cache.gc_time_secs == 0 {
      return Err(eyre!("cache.gc_time_secs must be at least 1"));
    }
    Ok(())
  }

  fn with_env_overrides(mut self) -> Self {
    if let Ok(url) = std::env::var(BASE_URL_ENV) {
      self.api.base_url = url;
    }
    self.api.token = Self::get_api_token();
    self
  }

  /// Get the API bearer token from the environment, if set.
  pub fn get_api_token() -> Option<String> {
    std::env::var(TOKEN_ENV).ok().filter(|t| !t.is_empty())
  }
}
