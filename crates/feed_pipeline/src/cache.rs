use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

use lru::LruCache;
use tokio::sync::Mutex;
use tokio::time::Instant;

#[derive(Debug)]
pub struct CachedProjection<V> {
    pub value: Arc<V>,
    pub stored_at: Instant,
}

impl<V> Clone for CachedProjection<V> {
    fn clone(&self) -> Self {
        Self {
            value: Arc::clone(&self.value),
            stored_at: self.stored_at,
        }
    }
}

impl<V> CachedProjection<V> {
    pub fn is_fresh(&self, ttl: Duration) -> bool {
        self.stored_at.elapsed() < ttl
    }
}

/// LRU of computed projections with a freshness window. Stale entries are
/// dropped on lookup.
pub struct ProjectionCache<V> {
    inner: Arc<Mutex<LruCache<String, CachedProjection<V>>>>,
    ttl: Duration,
}

impl<V> Clone for ProjectionCache<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            ttl: self.ttl,
        }
    }
}

impl<V> ProjectionCache<V> {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Arc::new(Mutex::new(LruCache::new(capacity))),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub async fn get(&self, key: &str) -> Option<Arc<V>> {
        let mut guard = self.inner.lock().await;
        let entry = guard.get(key)?.clone();
        if entry.is_fresh(self.ttl) {
            Some(entry.value)
        } else {
            guard.pop(key);
            None
        }
    }

    pub async fn put(&self, key: String, value: Arc<V>) {
        let mut guard = self.inner.lock().await;
        guard.put(
            key,
            CachedProjection {
                value,
                stored_at: Instant::now(),
            },
        );
    }

    pub async fn invalidate(&self, key: &str) -> bool {
        self.inner.lock().await.pop(key).is_some()
    }

    /// Drops every entry and returns how many there were.
    pub async fn clear(&self) -> usize {
        let mut guard = self.inner.lock().await;
        let count = guard.len();
        guard.clear();
        count
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn entries_expire_after_ttl() {
        let cache = ProjectionCache::new(4, Duration::from_secs(10));
        cache.put("k".into(), Arc::new(1_u32)).await;
        assert_eq!(cache.get("k").await.as_deref(), Some(&1));

        tokio::time::advance(Duration::from_secs(11)).await;
        assert!(cache.get("k").await.is_none());
        assert_eq!(cache.len().await, 0);
    }

    #[tokio::test]
    async fn capacity_evicts_least_recent() {
        let cache = ProjectionCache::new(2, Duration::from_secs(60));
        cache.put("a".into(), Arc::new("a")).await;
        cache.put("b".into(), Arc::new("b")).await;
        assert!(cache.get("a").await.is_some());
        cache.put("c".into(), Arc::new("c")).await;
        assert!(cache.get("b").await.is_none());
        assert!(cache.get("a").await.is_some());
    }

    #[tokio::test]
    async fn zero_capacity_still_holds_one() {
        let cache = ProjectionCache::new(0, Duration::from_secs(60));
        cache.put("a".into(), Arc::new(())).await;
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn invalidate_and_clear() {
        let cache = ProjectionCache::new(8, Duration::from_secs(60));
        cache.put("a".into(), Arc::new(1)).await;
        cache.put("b".into(), Arc::new(2)).await;
        assert!(cache.invalidate("a").await);
        assert!(!cache.invalidate("a").await);
        assert_eq!(cache.clear().await, 1);
        assert_eq!(cache.len().await, 0);
    }
}
