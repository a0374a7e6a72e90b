//! Observer registrations for cache changes.

use std::sync::{Arc, Mutex, Weak};

use super::key::QueryKey;
use super::lock;
use super::result::CacheEvent;

pub(crate) type Callback = Arc<dyn Fn(&QueryKey, &CacheEvent) + Send + Sync>;

struct Registration {
  id: u64,
  key: QueryKey,
  callback: Callback,
}

#[derive(Default)]
pub(crate) struct Subscribers {
  next_id: u64,
  registrations: Vec<Registration>,
}

impl Subscribers {
  fn add(&mut self, key: QueryKey, callback: Callback) -> u64 {
    self.next_id += 1;
    let id = self.next_id;
    self.registrations.push(Registration { id, key, callback });
    id
  }

  fn remove(&mut self, id: u64) {
    self.registrations.retain(|r| r.id != id);
  }

  /// Callbacks registered on `key` or on any prefix of it.
  pub fn matching(&self, key: &QueryKey) -> Vec<Callback> {
    self
      .registrations
      .iter()
      .filter(|r| key.starts_with(&r.key))
      .map(|r| Arc::clone(&r.callback))
      .collect()
  }

  /// Keys with at least one registration.
  pub fn keys(&self) -> Vec<QueryKey> {
    self.registrations.iter().map(|r| r.key.clone()).collect()
  }

  pub fn len(&self) -> usize {
    self.registrations.len()
  }
}

/// Registers `callback` for `key` and returns the guard that deregisters it.
pub(crate) fn register(
  registry: &Arc<Mutex<Subscribers>>,
  key: QueryKey,
  callback: Callback,
) -> Subscription {
  let id = lock(registry).add(key, callback);
  Subscription {
    id,
    registry: Arc::downgrade(registry),
  }
}

/// Interest in a cache key. Dropping it deregisters the callback.
#[must_use = "dropping a Subscription immediately deregisters it"]
pub struct Subscription {
  id: u64,
  registry: Weak<Mutex<Subscribers>>,
}

impl Subscription {
  /// Deregister explicitly; equivalent to dropping.
  pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
  fn drop(&mut self) {
    if let Some(registry) = self.registry.upgrade() {
      lock(&registry).remove(self.id);
    }
  }
}

impl std::fmt::Debug for Subscription {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Subscription").field("id", &self.id).finish()
  }
}
