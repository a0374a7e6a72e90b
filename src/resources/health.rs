use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::api::types::HealthStatus;
use crate::api::ApiError;
use crate::retry::RetryPolicy;

use super::{keys, ttl, ResourceContext};

/// Total attempts for a health probe.
const HEALTH_ATTEMPTS: u32 = 2;

/// Shortest period between monitor checks.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Backend liveness.
#[derive(Clone)]
pub struct HealthCheck {
  ctx: ResourceContext,
  policy: RetryPolicy,
}

impl HealthCheck {
  pub fn new(ctx: ResourceContext) -> Self {
    let policy = RetryPolicy::new(HEALTH_ATTEMPTS).with_backoff(ctx.queries.base_delay, ctx.queries.max_delay);
    Self { ctx, policy }
  }

  /// Probe the backend. Never served from cache, but concurrent probes share
  /// one request and the result is stored for [`last_known`](Self::last_known)
  /// and subscribers of the health key.
  pub async fn check(&self) -> Result<HealthStatus, ApiError> {
    let api = self.ctx.api.clone();
    let policy = self.policy;
    let result = self
      .ctx
      .cache
      .read(&keys::health(), ttl::HEALTH, move || async move {
        policy.run(|| api.health()).await
      })
      .await?;
    Ok(result.data)
  }

  /// The most recent successful probe, if any.
  pub fn last_known(&self) -> Option<HealthStatus> {
    self.ctx.cache.peek(&keys::health())
  }

  /// Check health every `interval`, but no more often than [`MIN_POLL_INTERVAL`],
  /// until the returned handle is dropped.
  pub fn spawn_monitor(&self, interval: Duration) -> HealthMonitor {
    let interval = interval.max(MIN_POLL_INTERVAL);
    let check = self.clone();
    let task = tokio::spawn(async move {
      let mut ticker = tokio::time::interval(interval);
      ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
      loop {
        ticker.tick().await;
        match check.check().await {
          Ok(status) => debug!(status = %status.status, version = %status.version, "health probe"),
          Err(err) => warn!(status = err.status, code = %err.code, "health probe failed: {}", err.message),
        }
      }
    });
    HealthMonitor { task }
  }
}

/// Periodic health polling; stops when dropped.
pub struct HealthMonitor {
  task: JoinHandle<()>,
}

impl HealthMonitor {
  pub fn is_running(&self) -> bool {
    !self.task.is_finished()
  }
}

impl Drop for HealthMonitor {
  fn drop(&mut self) {
    self.task.abort();
  }
}
