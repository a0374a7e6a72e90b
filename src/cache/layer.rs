//! Query cache that coalesces fetches and tracks staleness per key.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use futures::FutureExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, trace, warn};

use super::key::QueryKey;
use super::lock;
use super::mutation::MutationRecord;
use super::result::{CacheEvent, CacheResult, CacheSource};
use super::storage::{EntrySnapshot, FetchResult, InFlight, MemoryStorage, SharedFetch};
use super::subscription::{self, Subscribers, Subscription};
use crate::api::ApiError;
use crate::config::CacheConfig;

/// Shortest period between garbage collection passes.
pub const MIN_GC_INTERVAL: Duration = Duration::from_secs(1);

struct Inner {
  storage: Mutex<MemoryStorage>,
  subscribers: Arc<Mutex<Subscribers>>,
  next_fetch_id: AtomicU64,
  /// Staleness window for callers without their own
  stale_time: Duration,
  /// How long an unread entry survives garbage collection
  gc_time: Duration,
}

/// Key-addressed, time-aware cache of query results.
///
/// One instance is created per application session and handed to every
/// resource binding; clones share the same state. Values are stored as JSON
/// and replaced wholesale, never mutated in place.
#[derive(Clone)]
pub struct QueryCache {
  inner: Arc<Inner>,
}

impl QueryCache {
  pub fn new(config: &CacheConfig) -> Self {
    Self {
      inner: Arc::new(Inner {
        storage: Mutex::new(MemoryStorage::default()),
        subscribers: Arc::new(Mutex::new(Subscribers::default())),
        next_fetch_id: AtomicU64::new(1),
        stale_time: config.stale_time(),
        gc_time: config.gc_time(),
      }),
    }
  }

  pub fn stale_time(&self) -> Duration {
    self.inner.stale_time
  }

  pub fn gc_time(&self) -> Duration {
    self.inner.gc_time
  }

  /// Read `key`, decoding the cached JSON into `T`.
  ///
  /// See [`read_value`](Self::read_value) for freshness and coalescing.
  pub async fn read<T, F, Fut>(
    &self,
    key: &QueryKey,
    ttl: Duration,
    loader: F,
  ) -> Result<CacheResult<T>, ApiError>
  where
    T: Serialize + DeserializeOwned + Send + 'static,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
  {
    let result = self
      .read_value(key, ttl, move || {
        let fut = loader();
        async move {
          let value = fut.await?;
          serde_json::to_value(value).map_err(ApiError::invalid_response)
        }
      })
      .await?;

    result.try_map(|value| T::deserialize(&*value).map_err(ApiError::invalid_response))
  }

  /// Read `key`, returning the shared cached value.
  ///
  /// 1. Fresh entry (`now - fetched_at < ttl`, not invalidated): returned
  ///    immediately, the loader is not called
  /// 2. A fetch for this key is already running: join it
  /// 3. Otherwise spawn the loader and record it as the key's in-flight fetch
  ///
  /// Every caller joining one fetch receives the same `Arc`. The fetch runs
  /// to completion and stores its result even if all callers stop waiting.
  pub async fn read_value<F, Fut>(
    &self,
    key: &QueryKey,
    ttl: Duration,
    loader: F,
  ) -> Result<CacheResult<Arc<Value>>, ApiError>
  where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Value, ApiError>> + Send + 'static,
  {
    let (fetch, source) = {
      let mut storage = lock(&self.inner.storage);
      let now = Instant::now();
      let entry = storage.entry(key, now);
      entry.last_read = now;

      if let Some((value, fetched_at)) = entry.fresh_value(now, ttl) {
        trace!(key = %key, "cache hit");
        return Ok(CacheResult::from_cache(value, fetched_at));
      }

      if let Some(in_flight) = &entry.in_flight {
        debug!(key = %key, fetch_id = in_flight.id, "joining in-flight fetch");
        (in_flight.fetch.clone(), CacheSource::Coalesced)
      } else {
        let id = self.inner.next_fetch_id.fetch_add(1, Ordering::Relaxed);
        debug!(key = %key, fingerprint = %key.fingerprint(), fetch_id = id, "fetching");
        let fetch = spawn_fetch(Arc::downgrade(&self.inner), key.clone(), id, loader());
        entry.in_flight = Some(InFlight {
          id,
          fetch: fetch.clone(),
        });
        (fetch, CacheSource::Network)
      }
    };

    let value = fetch.await?;
    Ok(CacheResult::from_fetch(value, source))
  }

  /// Current value for `key` without fetching, fresh or not.
  pub fn peek_value(&self, key: &QueryKey) -> Option<Arc<Value>> {
    lock(&self.inner.storage)
      .get(key)
      .and_then(|entry| entry.value.clone())
  }

  /// Current value for `key` decoded as `T`; `None` when absent or not a `T`.
  pub fn peek<T: DeserializeOwned>(&self, key: &QueryKey) -> Option<T> {
    let value = self.peek_value(key)?;
    T::deserialize(&*value).ok()
  }

  /// Whether a read of `key` with `ttl` would go to the network.
  pub fn is_stale(&self, key: &QueryKey, ttl: Duration) -> bool {
    lock(&self.inner.storage)
      .get(key)
      .map_or(true, |entry| entry.fresh_value(Instant::now(), ttl).is_none())
  }

  /// Whether a fetch for `key` is running.
  pub fn is_fetching(&self, key: &QueryKey) -> bool {
    lock(&self.inner.storage)
      .get(key)
      .is_some_and(|entry| entry.in_flight.is_some())
  }

  /// Mark every entry under `prefix` stale so its next read refetches.
  ///
  /// Any fetch running for a matched entry is detached: its callers still get
  /// its result but it is not stored, since it may predate the change that
  /// caused the invalidation. Entries already invalid are left alone. Returns
  /// how many entries changed.
  pub fn invalidate(&self, prefix: &QueryKey) -> usize {
    let touched: Vec<QueryKey> = {
      let mut storage = lock(&self.inner.storage);
      storage
        .matching_mut(prefix)
        .filter_map(|(key, entry)| {
          if entry.invalidated && entry.in_flight.is_none() {
            return None;
          }
          if entry.value.is_none() && entry.in_flight.is_none() {
            return None;
          }
          entry.invalidated = true;
          entry.in_flight = None;
          Some(key.clone())
        })
        .collect()
    };

    debug!(prefix = %prefix, count = touched.len(), "invalidated");
    for key in &touched {
      self.notify(key, &CacheEvent::Invalidated);
    }
    touched.len()
  }

  /// Store `value` under `key`, fresh as of now.
  pub fn write_value(&self, key: &QueryKey, value: Value) {
    {
      let mut storage = lock(&self.inner.storage);
      let now = Instant::now();
      let entry = storage.entry(key, now);
      entry.store(Arc::new(value), now);
      entry.in_flight = None;
    }
    debug!(key = %key, "written");
    self.notify(key, &CacheEvent::Updated);
  }

  pub fn write<T: Serialize>(&self, key: &QueryKey, value: &T) -> Result<(), ApiError> {
    let value = serde_json::to_value(value).map_err(ApiError::invalid_response)?;
    self.write_value(key, value);
    Ok(())
  }

  /// Remove `key` outright. Returns whether it existed.
  pub fn evict(&self, key: &QueryKey) -> bool {
    let existed = lock(&self.inner.storage).remove(key).is_some();
    if existed {
      debug!(key = %key, "evicted");
      self.notify(key, &CacheEvent::Evicted);
    }
    existed
  }

  /// Capture the state of `key` for a later [`restore`](Self::restore).
  pub fn snapshot(&self, key: &QueryKey) -> Option<EntrySnapshot> {
    lock(&self.inner.storage).get(key).map(|entry| entry.snapshot())
  }

  /// Put `key` back exactly as captured; `None` removes it.
  pub fn restore(&self, key: &QueryKey, snapshot: Option<EntrySnapshot>) {
    let existed = snapshot.is_some();
    lock(&self.inner.storage).restore(key, snapshot, Instant::now());
    debug!(key = %key, "restored");
    let event = if existed {
      CacheEvent::Updated
    } else {
      CacheEvent::Evicted
    };
    self.notify(key, &event);
  }

  /// Apply a confirmed write's effects.
  pub fn apply(&self, record: MutationRecord) {
    debug!(
      kind = ?record.kind,
      entity = record.entity,
      id = ?record.id,
      invalidate = record.invalidate.len(),
      evict = record.evict.len(),
      write = record.write.len(),
      "applying mutation"
    );
    for prefix in &record.invalidate {
      self.invalidate(prefix);
    }
    for key in &record.evict {
      self.evict(key);
    }
    for (key, value) in record.write {
      self.write_value(&key, value);
    }
  }

  /// Register `callback` for changes to `key` and every key beneath it.
  pub fn subscribe<F>(&self, key: QueryKey, callback: F) -> Subscription
  where
    F: Fn(&QueryKey, &CacheEvent) + Send + Sync + 'static,
  {
    subscription::register(&self.inner.subscribers, key, Arc::new(callback))
  }

  pub fn subscriber_count(&self) -> usize {
    lock(&self.inner.subscribers).len()
  }

  fn notify(&self, key: &QueryKey, event: &CacheEvent) {
    self.inner.notify(key, event);
  }

  /// Purge entries unread for at least the idle window. Entries with a fetch
  /// in flight or an active subscriber are kept. Returns how many were purged.
  pub fn collect_garbage(&self) -> usize {
    let watched = lock(&self.inner.subscribers).keys();
    let gc_time = self.inner.gc_time;
    let now = Instant::now();

    let mut storage = lock(&self.inner.storage);
    let before = storage.len();
    storage.retain(|key, entry| {
      entry.in_flight.is_some()
        || now.duration_since(entry.last_read) < gc_time
        || watched.iter().any(|w| key.starts_with(w))
    });
    let purged = before - storage.len();
    if purged > 0 {
      debug!(purged, remaining = storage.len(), "garbage collected");
    }
    purged
  }

  /// Run [`collect_garbage`](Self::collect_garbage) every `interval` until
  /// the handle is dropped or the cache is gone. Intervals shorter than
  /// [`MIN_GC_INTERVAL`] are raised to it.
  pub fn spawn_gc(&self, interval: Duration) -> GcHandle {
    let interval = interval.max(MIN_GC_INTERVAL);
    let weak = Arc::downgrade(&self.inner);
    let task = tokio::spawn(async move {
      let mut ticker = tokio::time::interval(interval);
      ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
      ticker.tick().await;
      loop {
        ticker.tick().await;
        let Some(inner) = weak.upgrade() else {
          break;
        };
        QueryCache { inner }.collect_garbage();
      }
    });
    GcHandle { task }
  }

  pub fn len(&self) -> usize {
    lock(&self.inner.storage).len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Drop every entry. Running fetches complete but are not stored.
  pub fn clear(&self) {
    lock(&self.inner.storage).clear();
    debug!("cache cleared");
  }
}

impl Inner {
  fn notify(&self, key: &QueryKey, event: &CacheEvent) {
    let callbacks = lock(&self.subscribers).matching(key);
    for callback in callbacks {
      callback(key, event);
    }
  }

  /// Store a fetch result if the fetch is still the entry's current one.
  fn complete_fetch(&self, key: &QueryKey, id: u64, result: &FetchResult) {
    let event = {
      let mut storage = lock(&self.storage);
      let Some(entry) = storage.get_mut(key) else {
        debug!(key = %key, fetch_id = id, "entry evicted during fetch, result dropped");
        return;
      };
      if entry.in_flight.as_ref().map(|f| f.id) != Some(id) {
        debug!(key = %key, fetch_id = id, "fetch detached, result dropped");
        return;
      }
      entry.in_flight = None;

      match result {
        Ok(value) => {
          entry.store(Arc::clone(value), Instant::now());
          CacheEvent::Updated
        }
        Err(err) => CacheEvent::FetchFailed(err.clone()),
      }
    };
    self.notify(key, &event);
  }
}

fn spawn_fetch<Fut>(inner: Weak<Inner>, key: QueryKey, id: u64, fut: Fut) -> SharedFetch
where
  Fut: Future<Output = Result<Value, ApiError>> + Send + 'static,
{
  let task = tokio::spawn(async move {
    let result: FetchResult = fut.await.map(Arc::new);
    if let Err(err) = &result {
      warn!(
        key = %key,
        status = err.status,
        code = %err.code,
        details = ?err.details,
        "fetch failed: {}",
        err.message
      );
    }
    if let Some(inner) = inner.upgrade() {
      inner.complete_fetch(&key, id, &result);
    }
    result
  });

  task
    .map(|joined| joined.unwrap_or_else(|e| Err(ApiError::network(format!("fetch task failed: {}", e)))))
    .boxed()
    .shared()
}

/// Background garbage collection; stops when dropped.
pub struct GcHandle {
  task: JoinHandle<()>,
}

impl Drop for GcHandle {
  fn drop(&mut self) {
    self.task.abort();
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;
  use std::sync::atomic::AtomicUsize;

  fn cache() -> QueryCache {
    QueryCache::new(&CacheConfig::default())
  }

  fn key(name: &str) -> QueryKey {
    QueryKey::new("hardware-assets").with("list").with(name)
  }

  fn counting_loader(
    calls: &Arc<AtomicUsize>,
    value: Value,
  ) -> impl FnOnce() -> futures::future::BoxFuture<'static, Result<Value, ApiError>> {
    let calls = Arc::clone(calls);
    move || {
      async move {
        calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(50)).await;
        Ok(value)
      }
      .boxed()
    }
  }

  const TTL: Duration = Duration::from_secs(60);

  #[tokio::test(start_paused = true)]
  async fn concurrent_reads_share_one_fetch() {
    let cache = cache();
    let calls = Arc::new(AtomicUsize::new(0));
    let k = key("a");

    let (a, b) = tokio::join!(
      cache.read_value(&k, TTL, counting_loader(&calls, json!([1]))),
      cache.read_value(&k, TTL, counting_loader(&calls, json!([2]))),
    );
    let (a, b) = (a.unwrap(), b.unwrap());

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(Arc::ptr_eq(&a.data, &b.data));
    assert_eq!(a.source, CacheSource::Network);
    assert_eq!(b.source, CacheSource::Coalesced);
  }

  #[tokio::test(start_paused = true)]
  async fn fresh_value_is_served_without_loader() {
    let cache = cache();
    let calls = Arc::new(AtomicUsize::new(0));
    let k = key("a");

    cache
      .read_value(&k, TTL, counting_loader(&calls, json!(1)))
      .await
      .unwrap();
    tokio::time::advance(Duration::from_secs(30)).await;
    let second = cache
      .read_value(&k, TTL, counting_loader(&calls, json!(2)))
      .await
      .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(second.source, CacheSource::Cache);
    assert_eq!(*second.data, json!(1));
  }

  #[tokio::test(start_paused = true)]
  async fn expired_value_is_refetched() {
    let cache = cache();
    let calls = Arc::new(AtomicUsize::new(0));
    let k = key("a");

    cache
      .read_value(&k, TTL, counting_loader(&calls, json!(1)))
      .await
      .unwrap();
    tokio::time::advance(TTL).await;
    let second = cache
      .read_value(&k, TTL, counting_loader(&calls, json!(2)))
      .await
      .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(*second.data, json!(2));
  }

  #[tokio::test(start_paused = true)]
  async fn independent_keys_fetch_in_parallel() {
    let cache = cache();
    let calls = Arc::new(AtomicUsize::new(0));
    let start = Instant::now();

    let (key_a, key_b) = (key("a"), key("b"));
    let (a, b) = tokio::join!(
      cache.read_value(&key_a, TTL, counting_loader(&calls, json!("a"))),
      cache.read_value(&key_b, TTL, counting_loader(&calls, json!("b"))),
    );

    assert_eq!(*a.unwrap().data, json!("a"));
    assert_eq!(*b.unwrap().data, json!("b"));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert!(start.elapsed() < Duration::from_millis(100));
  }

  #[tokio::test(start_paused = true)]
  async fn prefix_invalidation_catches_every_variant() {
    let cache = cache();
    cache.write_value(&key("a"), json!(1));
    cache.write_value(&key("b"), json!(2));
    let detail = QueryKey::new("hardware-assets").with("detail").with(1u64);
    cache.write_value(&detail, json!({"id": 1}));

    let lists = QueryKey::new("hardware-assets").with("list");
    assert_eq!(cache.invalidate(&lists), 2);

    assert!(cache.is_stale(&key("a"), TTL));
    assert!(cache.is_stale(&key("b"), TTL));
    assert!(!cache.is_stale(&detail, TTL));
    // Stale values remain visible until refetched.
    assert_eq!(cache.peek_value(&key("a")).as_deref(), Some(&json!(1)));
  }

  #[tokio::test(start_paused = true)]
  async fn invalidating_twice_is_a_noop() {
    let cache = cache();
    cache.write_value(&key("a"), json!(1));

    assert_eq!(cache.invalidate(&key("a")), 1);
    assert_eq!(cache.invalidate(&key("a")), 0);
    assert_eq!(cache.invalidate(&QueryKey::new("nothing-here")), 0);
  }

  #[tokio::test(start_paused = true)]
  async fn invalidated_entry_refetches_once() {
    let cache = cache();
    let calls = Arc::new(AtomicUsize::new(0));
    let k = key("a");
    cache.write_value(&k, json!("old"));

    cache.invalidate(&k);
    let first = cache
      .read_value(&k, TTL, counting_loader(&calls, json!("new")))
      .await
      .unwrap();
    let second = cache
      .read_value(&k, TTL, counting_loader(&calls, json!("newer")))
      .await
      .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(*first.data, json!("new"));
    assert_eq!(second.source, CacheSource::Cache);
  }

  #[tokio::test(start_paused = true)]
  async fn invalidation_detaches_running_fetch() {
    let cache = cache();
    let calls = Arc::new(AtomicUsize::new(0));
    let k = key("a");

    let pending = {
      let cache = cache.clone();
      let k = k.clone();
      let loader = counting_loader(&calls, json!("before-write"));
      tokio::spawn(async move { cache.read_value(&k, TTL, loader).await })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(cache.is_fetching(&k));

    cache.invalidate(&k);
    let old = pending.await.unwrap().unwrap();
    assert_eq!(*old.data, json!("before-write"));
    // The detached result was not stored as fresh.
    assert!(cache.is_stale(&k, TTL));
  }

  #[tokio::test(start_paused = true)]
  async fn fetch_completes_after_callers_leave() {
    let cache = cache();
    let calls = Arc::new(AtomicUsize::new(0));
    let k = key("a");

    let reader = {
      let cache = cache.clone();
      let k = k.clone();
      let loader = counting_loader(&calls, json!("done"));
      tokio::spawn(async move { cache.read_value(&k, TTL, loader).await })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;
    reader.abort();
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(cache.peek_value(&k).as_deref(), Some(&json!("done")));
    assert!(!cache.is_stale(&k, TTL));
  }

  #[tokio::test(start_paused = true)]
  async fn failed_fetch_keeps_previous_value() {
    let cache = cache();
    let k = key("a");
    cache.write_value(&k, json!("kept"));
    cache.invalidate(&k);

    let err = cache
      .read_value(&k, TTL, || async { Err(ApiError::new(500, "BOOM", "down")) })
      .await
      .unwrap_err();

    assert_eq!(err.status, 500);
    assert_eq!(cache.peek_value(&k).as_deref(), Some(&json!("kept")));
    assert!(!cache.is_fetching(&k));
  }

  #[tokio::test(start_paused = true)]
  async fn evicted_entry_is_gone() {
    let cache = cache();
    let k = key("a");
    cache.write_value(&k, json!(1));

    assert!(cache.evict(&k));
    assert!(cache.peek_value(&k).is_none());
    assert!(!cache.evict(&k));
  }

  #[tokio::test(start_paused = true)]
  async fn typed_read_round_trips() {
    let cache = cache();
    let k = key("typed");
    let result = cache
      .read(&k, TTL, || async { Ok(vec![1u32, 2, 3]) })
      .await
      .unwrap();
    assert_eq!(result.data, vec![1, 2, 3]);
    assert_eq!(cache.peek::<Vec<u32>>(&k), Some(vec![1, 2, 3]));
  }

  #[tokio::test(start_paused = true)]
  async fn gc_purges_idle_entries_only() {
    let cache = QueryCache::new(&CacheConfig {
      stale_time_secs: 60,
      gc_time_secs: 600,
    });
    cache.write_value(&key("idle"), json!(1));
    cache.write_value(&key("watched"), json!(2));
    let _sub = cache.subscribe(key("watched"), |_, _| {});

    tokio::time::advance(Duration::from_secs(300)).await;
    cache.write_value(&key("recent"), json!(3));
    tokio::time::advance(Duration::from_secs(300)).await;

    assert_eq!(cache.collect_garbage(), 1);
    assert!(cache.peek_value(&key("idle")).is_none());
    assert!(cache.peek_value(&key("watched")).is_some());
    assert!(cache.peek_value(&key("recent")).is_some());
  }

  #[tokio::test(start_paused = true)]
  async fn gc_never_purges_in_flight_entries() {
    let cache = QueryCache::new(&CacheConfig {
      stale_time_secs: 60,
      gc_time_secs: 1,
    });
    let k = key("slow");

    let reader = {
      let cache = cache.clone();
      let k = k.clone();
      tokio::spawn(async move {
        cache
          .read_value(&k, TTL, || async {
            tokio::time::sleep(Duration::from_secs(10)).await;
            Ok(json!("slow"))
          })
          .await
      })
    };
    tokio::time::sleep(Duration::from_secs(5)).await;

    assert_eq!(cache.collect_garbage(), 0);
    assert!(cache.is_fetching(&k));
    assert_eq!(*reader.await.unwrap().unwrap().data, json!("slow"));
  }

  #[tokio::test(start_paused = true)]
  async fn background_gc_purges_until_handle_dropped() {
    let cache = QueryCache::new(&CacheConfig {
      stale_time_secs: 60,
      gc_time_secs: 2,
    });
    cache.write_value(&key("idle"), json!(1));
    let gc = cache.spawn_gc(Duration::from_secs(1));

    tokio::time::sleep(Duration::from_secs(4)).await;
    assert!(cache.is_empty());

    drop(gc);
    cache.write_value(&key("later"), json!(2));
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert!(cache.peek_value(&key("later")).is_some());
  }

  #[tokio::test(start_paused = true)]
  async fn zero_gc_interval_is_raised_to_minimum() {
    let cache = QueryCache::new(&CacheConfig {
      stale_time_secs: 60,
      gc_time_secs: 1,
    });
    cache.write_value(&key("idle"), json!(1));
    let _gc = cache.spawn_gc(Duration::ZERO);

    tokio::time::sleep(MIN_GC_INTERVAL * 3).await;

    assert!(cache.is_empty());
  }

  #[tokio::test(start_paused = true)]
  async fn subscribers_see_changes_until_dropped() {
    let cache = cache();
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    let sub = cache.subscribe(QueryKey::new("hardware-assets"), move |key, event| {
      sink.lock().unwrap().push((key.clone(), event.clone()));
    });

    cache.write_value(&key("a"), json!(1));
    cache.invalidate(&key("a"));
    cache.evict(&key("a"));
    cache.write_value(&QueryKey::new("users"), json!([]));

    assert_eq!(
      events.lock().unwrap().clone(),
      vec![
        (key("a"), CacheEvent::Updated),
        (key("a"), CacheEvent::Invalidated),
        (key("a"), CacheEvent::Evicted),
      ]
    );

    drop(sub);
    assert_eq!(cache.subscriber_count(), 0);
    cache.write_value(&key("a"), json!(2));
    assert_eq!(events.lock().unwrap().len(), 3);
  }

  #[tokio::test(start_paused = true)]
  async fn snapshot_restore_round_trip() {
    let cache = cache();
    let k = key("a");
    cache.write_value(&k, json!(["x", "y"]));

    let snap = cache.snapshot(&k);
    cache.write_value(&k, json!(["y"]));
    cache.restore(&k, snap);
    assert_eq!(cache.peek_value(&k).as_deref(), Some(&json!(["x", "y"])));

    let missing = key("missing");
    let none = cache.snapshot(&missing);
    cache.write_value(&missing, json!(1));
    cache.restore(&missing, none);
    assert!(cache.peek_value(&missing).is_none());
  }

  #[tokio::test(start_paused = true)]
  async fn apply_writes_after_invalidating() {
    let cache = cache();
    let lists = QueryKey::new("hardware-assets").with("list");
    let detail = QueryKey::new("hardware-assets").with("detail").with(5u64);
    cache.write_value(&key("a"), json!([]));

    let record = MutationRecord::new(super::super::MutationKind::Create, "hardware-assets", Some(5))
      .invalidate(QueryKey::new("hardware-assets"))
      .write(detail.clone(), &json!({"id": 5}))
      .unwrap();
    cache.apply(record);

    assert!(cache.is_stale(&key("a"), TTL));
    assert!(!cache.is_stale(&detail, TTL));
    assert!(cache.is_stale(&lists.with("never-read"), TTL));
  }
}
