//! Read results and change events.

use tokio::time::Instant;

use crate::api::ApiError;

/// Result from a cache read, including data and where it came from.
#[derive(Debug, Clone)]
pub struct CacheResult<T> {
  /// The actual data
  pub data: T,
  /// Where the data came from
  pub source: CacheSource,
  /// When the served value was fetched (if from cache)
  pub fetched_at: Option<Instant>,
}

impl<T> CacheResult<T> {
  /// A result produced by a fetch this read started or joined.
  pub fn from_fetch(data: T, source: CacheSource) -> Self {
    Self {
      data,
      source,
      fetched_at: None,
    }
  }

  /// A result served from a fresh cache entry.
  pub fn from_cache(data: T, fetched_at: Instant) -> Self {
    Self {
      data,
      source: CacheSource::Cache,
      fetched_at: Some(fetched_at),
    }
  }

  pub fn map<U>(self, f: impl FnOnce(T) -> U) -> CacheResult<U> {
    CacheResult {
      data: f(self.data),
      source: self.source,
      fetched_at: self.fetched_at,
    }
  }

  pub fn try_map<U, E>(self, f: impl FnOnce(T) -> Result<U, E>) -> Result<CacheResult<U>, E> {
    Ok(CacheResult {
      data: f(self.data)?,
      source: self.source,
      fetched_at: self.fetched_at,
    })
  }
}

/// Indicates where a read's data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheSource {
  /// This read started the network fetch
  Network,
  /// This read joined a fetch another caller had already started
  Coalesced,
  /// Served from cache within its staleness window
  Cache,
}

/// Change notification delivered to subscribers.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheEvent {
  /// A fresh value was stored (fetch completed or direct write)
  Updated,
  /// The entry was marked stale
  Invalidated,
  /// The entry was removed
  Evicted,
  /// A fetch for the entry failed; any previous value is kept
  FetchFailed(ApiError),
}
