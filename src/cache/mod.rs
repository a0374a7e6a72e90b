//! Client-side query cache.
//!
//! This module provides an in-memory cache keyed by structured query keys
//! that:
//! - Serves values within a caller-supplied staleness window
//! - Coalesces concurrent fetches of the same key into one
//! - Supports invalidation by key prefix, direct writes and eviction
//! - Notifies subscribers of changes
//! - Purges entries left unread past an idle window

mod key;
mod layer;
mod mutation;
mod result;
mod storage;
mod subscription;

use std::sync::{Mutex, MutexGuard, PoisonError};

pub use key::{KeyPart, QueryKey};
pub use layer::{GcHandle, QueryCache, MIN_GC_INTERVAL};
pub use mutation::{MutationKind, MutationRecord};
pub use result::{CacheEvent, CacheResult, CacheSource};
pub use storage::EntrySnapshot;
pub use subscription::Subscription;

/// Lock a cache mutex. Cache state stays consistent between statements, so a
/// panic in a subscriber callback does not poison it for everyone else.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
  mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
