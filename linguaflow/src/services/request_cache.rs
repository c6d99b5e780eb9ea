//! Request cache
//!
//! Coalesces concurrent calls for the same key into one fetch and keeps
//! successful results in memory for a short time. Expiry is checked
//! lazily on the next `get`; there is no background sweep.
//!
//! The pending fetch resolves its own cache entry, so callers that stop
//! waiting never leave a stale in-flight entry behind.

use crate::config::DEFAULT_CACHE_TTL;
use crate::error::{AppError, Result};
use futures::future::{BoxFuture, FutureExt, Shared};
use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::Instant;

type SharedFetch<V> = Shared<BoxFuture<'static, std::result::Result<V, Arc<AppError>>>>;

enum Entry<V> {
    Ready {
        value: V,
        fetched_at: Instant,
        ttl: Duration,
    },
    Pending {
        id: u64,
        fetch: SharedFetch<V>,
    },
}

struct Inner<V> {
    entries: Mutex<HashMap<String, Entry<V>>>,
    next_id: AtomicU64,
}

impl<V> Inner<V> {
    fn lock(&self) -> MutexGuard<'_, HashMap<String, Entry<V>>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// In-memory cache of API results keyed by request
pub struct RequestCache<V> {
    inner: Arc<Inner<V>>,
}

impl<V> Clone for RequestCache<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V: Clone + Send + Sync + 'static> Default for RequestCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone + Send + Sync + 'static> RequestCache<V> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                entries: Mutex::new(HashMap::new()),
                next_id: AtomicU64::new(0),
            }),
        }
    }

    /// Get with the default 5 minute lifetime
    pub async fn get_default<F, Fut>(&self, key: &str, fetch: F) -> Result<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V>> + Send + 'static,
    {
        self.get(key, fetch, DEFAULT_CACHE_TTL).await
    }

    /// Return a fresh cached value, join an in-flight fetch, or start one.
    ///
    /// `fetch` runs at most once per miss no matter how many callers are
    /// waiting. A failed fetch is evicted so the next call starts over.
    pub async fn get<F, Fut>(&self, key: &str, fetch: F, ttl: Duration) -> Result<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V>> + Send + 'static,
    {
        let pending = {
            let mut entries = self.inner.lock();
            let now = Instant::now();

            match entries.get(key) {
                Some(Entry::Ready {
                    value,
                    fetched_at,
                    ttl,
                }) if now.duration_since(*fetched_at) < *ttl => {
                    tracing::debug!("Request cache hit: {}", key);
                    return Ok(value.clone());
                }
                Some(Entry::Pending { fetch, .. }) => {
                    tracing::debug!("Joining in-flight request: {}", key);
                    fetch.clone()
                }
                _ => {
                    let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
                    let task = self.resolve_entry(key.to_string(), id, now, ttl, fetch());
                    entries.insert(
                        key.to_string(),
                        Entry::Pending {
                            id,
                            fetch: task.clone(),
                        },
                    );
                    task
                }
            }
        };

        pending.await.map_err(AppError::Shared)
    }

    /// Wrap a fetch so that finishing it updates the entry it was started for
    fn resolve_entry<Fut>(
        &self,
        key: String,
        id: u64,
        started_at: Instant,
        ttl: Duration,
        fut: Fut,
    ) -> SharedFetch<V>
    where
        Fut: Future<Output = Result<V>> + Send + 'static,
    {
        let inner = Arc::downgrade(&self.inner);

        async move {
            let result = fut.await.map_err(Arc::new);

            if let Some(inner) = inner.upgrade() {
                let mut entries = inner.lock();
                let still_ours =
                    matches!(entries.get(&key), Some(Entry::Pending { id: current, .. }) if *current == id);

                if still_ours {
                    match &result {
                        Ok(value) => {
                            entries.insert(
                                key,
                                Entry::Ready {
                                    value: value.clone(),
                                    fetched_at: started_at,
                                    ttl,
                                },
                            );
                        }
                        Err(e) => {
                            tracing::debug!("Evicting failed request {}: {}", key, e);
                            entries.remove(&key);
                        }
                    }
                }
            }

            result
        }
        .boxed()
        .shared()
    }

    pub fn invalidate(&self, key: &str) {
        self.inner.lock().remove(key);
    }

    /// Drop every entry whose key starts with `prefix`
    pub fn invalidate_prefix(&self, prefix: &str) {
        self.inner.lock().retain(|key, _| !key.starts_with(prefix));
    }

    pub fn clear(&self) {
        self.inner.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Build a cache key `METHOD:path:{params}` with params in sorted order
pub fn cache_key(method: &str, path: &str, params: &[(&str, String)]) -> String {
    let sorted: BTreeMap<&str, &str> = params.iter().map(|(k, v)| (*k, v.as_str())).collect();
    let params = serde_json::to_string(&sorted).unwrap_or_default();
    format!("{}:{}:{}", method.to_uppercase(), path, params)
}
