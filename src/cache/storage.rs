//! In-memory entry storage for the query cache.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::future::{BoxFuture, Shared};
use serde_json::Value;
use tokio::time::Instant;

use super::key::QueryKey;
use crate::api::ApiError;

pub(crate) type FetchResult = Result<Arc<Value>, ApiError>;
pub(crate) type SharedFetch = Shared<BoxFuture<'static, FetchResult>>;

/// A fetch currently running for an entry.
pub(crate) struct InFlight {
  /// Distinguishes this fetch from any later one for the same key
  pub id: u64,
  pub fetch: SharedFetch,
}

/// A single cached query.
pub(crate) struct CacheEntry {
  pub value: Option<Arc<Value>>,
  pub fetched_at: Option<Instant>,
  pub invalidated: bool,
  pub in_flight: Option<InFlight>,
  pub last_read: Instant,
}

impl CacheEntry {
  fn new(now: Instant) -> Self {
    Self {
      value: None,
      fetched_at: None,
      invalidated: false,
      in_flight: None,
      last_read: now,
    }
  }

  /// The stored value if it may be served without a refetch.
  pub fn fresh_value(&self, now: Instant, ttl: Duration) -> Option<(Arc<Value>, Instant)> {
    if self.invalidated {
      return None;
    }
    let value = self.value.as_ref()?;
    let fetched_at = self.fetched_at?;
    (now.duration_since(fetched_at) < ttl).then(|| (Arc::clone(value), fetched_at))
  }

  pub fn store(&mut self, value: Arc<Value>, now: Instant) {
    self.value = Some(value);
    self.fetched_at = Some(now);
    self.invalidated = false;
  }

  pub fn snapshot(&self) -> EntrySnapshot {
    EntrySnapshot {
      value: self.value.clone(),
      fetched_at: self.fetched_at,
      invalidated: self.invalidated,
    }
  }
}

/// The restorable state of an entry, captured before an optimistic write.
#[derive(Debug, Clone)]
pub struct EntrySnapshot {
  value: Option<Arc<Value>>,
  fetched_at: Option<Instant>,
  invalidated: bool,
}

impl EntrySnapshot {
  pub fn value(&self) -> Option<&Value> {
    self.value.as_deref()
  }
}

/// Entries keyed by query.
#[derive(Default)]
pub(crate) struct MemoryStorage {
  entries: HashMap<QueryKey, CacheEntry>,
}

impl MemoryStorage {
  pub fn get(&self, key: &QueryKey) -> Option<&CacheEntry> {
    self.entries.get(key)
  }

  pub fn get_mut(&mut self, key: &QueryKey) -> Option<&mut CacheEntry> {
    self.entries.get_mut(key)
  }

  /// Existing entry or a new empty one.
  pub fn entry(&mut self, key: &QueryKey, now: Instant) -> &mut CacheEntry {
    self
      .entries
      .entry(key.clone())
      .or_insert_with(|| CacheEntry::new(now))
  }

  pub fn remove(&mut self, key: &QueryKey) -> Option<CacheEntry> {
    self.entries.remove(key)
  }

  /// Entries whose key starts with `prefix`.
  pub fn matching_mut<'a>(
    &'a mut self,
    prefix: &'a QueryKey,
  ) -> impl Iterator<Item = (&'a QueryKey, &'a mut CacheEntry)> + 'a {
    self
      .entries
      .iter_mut()
      .filter(move |(key, _)| key.starts_with(prefix))
  }

  pub fn keys_matching(&self, prefix: &QueryKey) -> Vec<QueryKey> {
    self
      .entries
      .keys()
      .filter(|key| key.starts_with(prefix))
      .cloned()
      .collect()
  }

  /// Put back a snapshot; `None` means the entry did not exist.
  pub fn restore(&mut self, key: &QueryKey, snapshot: Option<EntrySnapshot>, now: Instant) {
    match snapshot {
      Some(snap) => {
        let entry = self.entry(key, now);
        entry.value = snap.value;
        entry.fetched_at = snap.fetched_at;
        entry.invalidated = snap.invalidated;
        entry.in_flight = None;
      }
      None => {
        self.entries.remove(key);
      }
    }
  }

  pub fn retain(&mut self, f: impl FnMut(&QueryKey, &mut CacheEntry) -> bool) {
    self.entries.retain(f);
  }

  pub fn clear(&mut self) {
    self.entries.clear();
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }
}
