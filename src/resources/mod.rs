//! Per-entity bindings between cache keys and API calls.
//!
//! Each binding declares the keys it reads, the loader behind them, how long
//! results stay fresh and how they are retried. Writes go straight to the API
//! and, once the server confirms them, apply a [`MutationRecord`] to the
//! cache so every dependent read observes the change.

mod assignments;
mod hardware;
mod health;
pub mod keys;
mod licenses;
mod lookups;

use std::future::Future;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::api::{ApiClient, ApiError, QueryParams};
use crate::cache::{MutationRecord, QueryCache, QueryKey};
use crate::retry::RetryPolicy;

pub use assignments::LicenseAssignments;
pub use hardware::HardwareAssets;
pub use health::{HealthCheck, HealthMonitor, MIN_POLL_INTERVAL};
pub use licenses::SoftwareLicenses;
pub use lookups::Lookups;

/// Staleness windows by data volatility.
pub mod ttl {
  use std::time::Duration;

  /// Health is always refetched.
  pub const HEALTH: Duration = Duration::ZERO;
  pub const COMPLIANCE: Duration = Duration::from_secs(2 * 60);
  pub const ASSIGNMENTS: Duration = Duration::from_secs(2 * 60);
  pub const COLLECTION: Duration = Duration::from_secs(5 * 60);
  pub const USERS: Duration = Duration::from_secs(10 * 60);
  pub const LOCATIONS: Duration = Duration::from_secs(10 * 60);
  pub const MANUFACTURERS: Duration = Duration::from_secs(15 * 60);
  pub const CATEGORIES: Duration = Duration::from_secs(15 * 60);
  pub const PUBLISHERS: Duration = Duration::from_secs(30 * 60);
}

/// What every binding needs: the client, the session's cache and the retry
/// policies for reads and writes.
#[derive(Clone)]
pub struct ResourceContext {
  pub(crate) api: ApiClient,
  pub(crate) cache: QueryCache,
  pub(crate) queries: RetryPolicy,
  pub(crate) mutations: RetryPolicy,
}

impl ResourceContext {
  pub fn new(api: ApiClient, cache: QueryCache, queries: RetryPolicy, mutations: RetryPolicy) -> Self {
    Self {
      api,
      cache,
      queries,
      mutations,
    }
  }

  pub fn cache(&self) -> &QueryCache {
    &self.cache
  }

  pub fn api(&self) -> &ApiClient {
    &self.api
  }

  /// Cached GET of `path` under `key`, retried with the read policy.
  pub(crate) async fn get_cached<T>(
    &self,
    key: QueryKey,
    ttl: Duration,
    path: String,
    params: Option<QueryParams>,
  ) -> Result<T, ApiError>
  where
    T: Serialize + DeserializeOwned + Send + 'static,
  {
    self
      .get_cached_with(key, ttl, self.queries, path, params)
      .await
  }

  pub(crate) async fn get_cached_with<T>(
    &self,
    key: QueryKey,
    ttl: Duration,
    policy: RetryPolicy,
    path: String,
    params: Option<QueryParams>,
  ) -> Result<T, ApiError>
  where
    T: Serialize + DeserializeOwned + Send + 'static,
  {
    let api = self.api.clone();
    let result = self
      .cache
      .read(&key, ttl, move || async move {
        policy
          .run(|| api.get::<T>(&path, params.as_ref()))
          .await
      })
      .await?;
    Ok(result.data)
  }

  /// Run a write with the write policy and apply its cache effects on
  /// success. A failed write leaves the cache untouched.
  pub(crate) async fn mutate<T, F, Fut, E>(&self, op: F, effects: E) -> Result<T, ApiError>
  where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
    E: FnOnce(&T) -> Result<MutationRecord, ApiError>,
  {
    let value = self.mutations.run(op).await.inspect_err(|err| {
      warn!(
        status = err.status,
        code = %err.code,
        details = ?err.details,
        "mutation failed: {}",
        err.message
      )
    })?;
    let record = effects(&value)?;
    debug!(kind = ?record.kind, entity = record.entity, id = ?record.id, "mutation confirmed");
    self.cache.apply(record);
    Ok(value)
  }
}

/// Ids of zero are placeholders for "nothing selected".
pub(crate) fn valid_id(id: Option<crate::api::types::EntityId>) -> Option<crate::api::types::EntityId> {
  id.filter(|id| *id > 0)
}

/// Build query parameters from a typed query, if any.
pub(crate) fn params_of<Q: Serialize>(query: Option<&Q>) -> Result<Option<QueryParams>, ApiError> {
  query
    .map(|q| QueryParams::from_serialize(q).map_err(|e| ApiError::validation(e.to_string())))
    .transpose()
}
