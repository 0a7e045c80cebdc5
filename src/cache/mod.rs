//! In-process TTL cache with single-flight fetch coalescing.
//!
//! Entries expire at an absolute deadline and are evicted lazily on read;
//! there is no background sweep and no capacity bound. `get_or_fetch`
//! guarantees that concurrent callers for the same key share one in-flight
//! computation.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use regex::Regex;
use thiserror::Error;

/// Failure of a `get_or_fetch` computation. Cloneable so that every caller
/// that joined the in-flight fetch observes the same error.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct FetchError(pub Arc<anyhow::Error>);

type PendingFetch<V> = Shared<BoxFuture<'static, Result<V, FetchError>>>;

struct Entry<V> {
    value: V,
    expires_at: DateTime<Utc>,
}

struct Inner<V> {
    entries: HashMap<String, Entry<V>>,
    pending: HashMap<String, PendingFetch<V>>,
}

/// Cloneable cache handle. Instances are created once at startup and
/// injected into whatever consumes them.
pub struct TtlCache<V> {
    inner: Arc<Mutex<Inner<V>>>,
}

impl<V> Clone for TtlCache<V> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<V> Default for TtlCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> TtlCache<V> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                entries: HashMap::new(),
                pending: HashMap::new(),
            })),
        }
    }
}

impl<V: Clone> TtlCache<V> {
    /// Store `value` until `now + ttl`. A non-positive `ttl` yields an entry
    /// that is already expired. Overwrites any existing entry.
    pub fn set(&self, key: impl Into<String>, value: V, ttl: Duration) {
        let mut inner = self.inner.lock().unwrap();
        inner.entries.insert(key.into(), Entry { value, expires_at: Utc::now() + ttl });
    }

    /// Returns the value if present and not expired. A stale entry is
    /// evicted as a side effect.
    pub fn get(&self, key: &str) -> Option<V> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(entry) = inner.entries.get(key) {
            if Utc::now() <= entry.expires_at {
                return Some(entry.value.clone());
            }
            inner.entries.remove(key);
        }
        None
    }

    /// Unconditional, idempotent removal.
    pub fn remove(&self, key: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.entries.remove(key);
    }

    /// Removes every stored key matched by `pattern`. Coarse invalidation
    /// for a whole key family, e.g. everything belonging to one member.
    pub fn remove_matching(&self, pattern: &Regex) {
        let mut inner = self.inner.lock().unwrap();
        inner.entries.retain(|key, _| !pattern.is_match(key));
    }
}

impl<V: Clone + Send + Sync + 'static> TtlCache<V> {
    /// Returns the cached value if fresh, otherwise runs `fetch` and stores
    /// its result under `key` with the given `ttl`.
    ///
    /// Concurrent callers for the same key while no fresh entry exists share
    /// a single `fetch` invocation: all of them observe the same value or
    /// the same [`FetchError`]. A failed fetch is not retried here; the key
    /// becomes fetchable again on the next call.
    pub async fn get_or_fetch<F, Fut>(&self, key: &str, ttl: Duration, fetch: F) -> Result<V, FetchError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<V>> + Send + 'static,
    {
        // Check cache, check pending, register pending: all under one lock
        // so the single-flight guarantee holds on a multi-threaded runtime.
        // The lock is never held across an await.
        let pending = {
            let mut inner = self.inner.lock().unwrap();

            if let Some(entry) = inner.entries.get(key) {
                if Utc::now() <= entry.expires_at {
                    return Ok(entry.value.clone());
                }
                inner.entries.remove(key);
            }

            if let Some(in_flight) = inner.pending.get(key) {
                in_flight.clone()
            } else {
                let state = Arc::clone(&self.inner);
                let owned_key = key.to_string();
                let fut = fetch();
                let in_flight = async move {
                    let result = fut.await;
                    let mut inner = state.lock().unwrap();
                    inner.pending.remove(&owned_key);
                    match result {
                        Ok(value) => {
                            inner.entries.insert(
                                owned_key,
                                Entry { value: value.clone(), expires_at: Utc::now() + ttl },
                            );
                            Ok(value)
                        }
                        Err(err) => Err(FetchError(Arc::new(err))),
                    }
                }
                .boxed()
                .shared();
                inner.pending.insert(key.to_string(), in_flight.clone());
                in_flight
            }
        };

        pending.await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration as StdDuration;

    use anyhow::anyhow;

    #[test]
    fn get_returns_fresh_value() {
        let cache: TtlCache<i32> = TtlCache::new();
        cache.set("answer", 42, Duration::seconds(60));
        assert_eq!(cache.get("answer"), Some(42));
    }

    #[test]
    fn negative_ttl_is_immediately_expired() {
        let cache: TtlCache<i32> = TtlCache::new();
        cache.set("answer", 42, Duration::seconds(-1));
        assert_eq!(cache.get("answer"), None);
    }

    #[test]
    fn set_overwrites_existing_entry() {
        let cache: TtlCache<i32> = TtlCache::new();
        cache.set("answer", 1, Duration::seconds(60));
        cache.set("answer", 2, Duration::seconds(60));
        assert_eq!(cache.get("answer"), Some(2));
    }

    #[tokio::test]
    async fn entry_expires_after_ttl() {
        let cache: TtlCache<i32> = TtlCache::new();
        cache.set("answer", 42, Duration::milliseconds(40));
        assert_eq!(cache.get("answer"), Some(42));
        tokio::time::sleep(StdDuration::from_millis(80)).await;
        assert_eq!(cache.get("answer"), None);
    }

    #[test]
    fn remove_is_idempotent() {
        let cache: TtlCache<i32> = TtlCache::new();
        cache.set("answer", 42, Duration::seconds(60));
        cache.remove("answer");
        assert_eq!(cache.get("answer"), None);
        cache.remove("answer");
    }

    #[test]
    fn remove_matching_clears_key_family() {
        let cache: TtlCache<i32> = TtlCache::new();
        cache.set("a1", 1, Duration::seconds(60));
        cache.set("a2", 2, Duration::seconds(60));
        cache.set("b1", 3, Duration::seconds(60));
        cache.remove_matching(&Regex::new("^a").unwrap());
        assert_eq!(cache.get("a1"), None);
        assert_eq!(cache.get("a2"), None);
        assert_eq!(cache.get("b1"), Some(3));
    }

    #[tokio::test]
    async fn get_or_fetch_stores_result() {
        let cache: TtlCache<i32> = TtlCache::new();
        let calls = Arc::new(AtomicUsize::new(0));

        for _ in 0..2 {
            let calls = calls.clone();
            let value = cache
                .get_or_fetch("answer", Duration::seconds(60), move || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(42)
                })
                .await
                .unwrap();
            assert_eq!(value, 42);
        }
        // The second call was a cache hit.
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn concurrent_fetches_share_one_computation() {
        let cache: TtlCache<i32> = TtlCache::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let gate = Arc::new(tokio::sync::Notify::new());

        let first = {
            let cache = cache.clone();
            let calls = calls.clone();
            let gate = gate.clone();
            tokio::spawn(async move {
                cache
                    .get_or_fetch("board", Duration::seconds(60), move || async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        gate.notified().await;
                        Ok(7)
                    })
                    .await
            })
        };
        // Let the first call register its in-flight fetch before joining it.
        tokio::time::sleep(StdDuration::from_millis(20)).await;

        let second = {
            let cache = cache.clone();
            let calls = calls.clone();
            tokio::spawn(async move {
                cache
                    .get_or_fetch("board", Duration::seconds(60), move || async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        Ok(99)
                    })
                    .await
            })
        };
        tokio::time::sleep(StdDuration::from_millis(20)).await;
        gate.notify_waiters();

        assert_eq!(first.await.unwrap().unwrap(), 7);
        assert_eq!(second.await.unwrap().unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn fetch_failure_reaches_every_awaiter_then_retries() {
        let cache: TtlCache<i32> = TtlCache::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let gate = Arc::new(tokio::sync::Notify::new());

        let first = {
            let cache = cache.clone();
            let calls = calls.clone();
            let gate = gate.clone();
            tokio::spawn(async move {
                cache
                    .get_or_fetch("board", Duration::seconds(60), move || async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        gate.notified().await;
                        Err::<i32, _>(anyhow!("database unreachable"))
                    })
                    .await
            })
        };
        tokio::time::sleep(StdDuration::from_millis(20)).await;

        let second = {
            let cache = cache.clone();
            tokio::spawn(async move {
                cache
                    .get_or_fetch("board", Duration::seconds(60), || async { Ok(1) })
                    .await
            })
        };
        tokio::time::sleep(StdDuration::from_millis(20)).await;
        gate.notify_waiters();

        let first_err = first.await.unwrap().unwrap_err();
        let second_err = second.await.unwrap().unwrap_err();
        assert_eq!(first_err.to_string(), "database unreachable");
        assert_eq!(second_err.to_string(), "database unreachable");
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // The failed attempt was cleared, so the key is fetchable again.
        let value = cache
            .get_or_fetch("board", Duration::seconds(60), {
                let calls = calls.clone();
                move || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(5)
                }
            })
            .await
            .unwrap();
        assert_eq!(value, 5);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
