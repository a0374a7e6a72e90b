//! Application session: one client, one cache, every binding.

use std::sync::Mutex;
use std::time::Duration;

use color_eyre::Result;
use tracing::info;

use crate::api::ApiClient;
use crate::cache::{lock, GcHandle, QueryCache};
use crate::config::Config;
use crate::resources::{
  HardwareAssets, HealthCheck, HealthMonitor, LicenseAssignments, Lookups, ResourceContext,
  SoftwareLicenses,
};
use crate::retry::RetryPolicy;

/// Owns the cache for the lifetime of the application. Bindings handed out
/// by a session all share its cache, so a write through one is observed by
/// reads through every other.
pub struct Session {
  ctx: ResourceContext,
  health_interval: Duration,
  gc: Mutex<Option<GcHandle>>,
}

impl Session {
  pub fn new(config: &Config) -> Result<Self> {
    let api = ApiClient::new(&config.api)?;
    let cache = QueryCache::new(&config.cache);
    let ctx = ResourceContext::new(
      api,
      cache,
      RetryPolicy::queries(&config.retry),
      RetryPolicy::mutations(&config.retry),
    );
    info!(api_url = %ctx.api().api_url(), "session started");
    let session = Self::from_context(ctx, config.health.poll_interval());
    session.start_gc();
    Ok(session)
  }

  /// Build a session around an existing context. Garbage collection is not
  /// started; call [`start_gc`](Self::start_gc) for that.
  pub fn from_context(ctx: ResourceContext, health_interval: Duration) -> Self {
    Self {
      ctx,
      health_interval,
      gc: Mutex::new(None),
    }
  }

  pub fn context(&self) -> &ResourceContext {
    &self.ctx
  }

  pub fn cache(&self) -> &QueryCache {
    self.ctx.cache()
  }

  pub fn hardware(&self) -> HardwareAssets {
    HardwareAssets::new(self.ctx.clone())
  }

  pub fn licenses(&self) -> SoftwareLicenses {
    SoftwareLicenses::new(self.ctx.clone())
  }

  pub fn assignments(&self) -> LicenseAssignments {
    LicenseAssignments::new(self.ctx.clone())
  }

  pub fn lookups(&self) -> Lookups {
    Lookups::new(self.ctx.clone())
  }

  pub fn health(&self) -> HealthCheck {
    HealthCheck::new(self.ctx.clone())
  }

  /// Start polling health at the configured interval.
  pub fn monitor_health(&self) -> HealthMonitor {
    self.health().spawn_monitor(self.health_interval)
  }

  /// Start background garbage collection, once. Runs at the cache's idle
  /// window until the session ends.
  pub fn start_gc(&self) {
    let mut gc = lock(&self.gc);
    if gc.is_none() {
      *gc = Some(self.cache().spawn_gc(self.cache().gc_time()));
    }
  }

  pub fn is_collecting(&self) -> bool {
    lock(&self.gc).is_some()
  }

  /// Stop background work and drop every cached entry.
  pub fn end(self) {
    drop(lock(&self.gc).take());
    self.cache().clear();
    info!("session ended");
  }
}
