use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::{Arc, Weak};

use lru::LruCache;
use parking_lot::Mutex;

use super::{Archive, ArchiveCache};
use crate::error::Result;

/// Shares one [`ArchiveCache`] between every path item that names the same
/// physical archive.
///
/// Caches are keyed by absolute archive path (or URL). The pool holds weak
/// references, so a cache closes when its last path item goes away, except
/// that the `capacity` most recently requested caches are also held strongly
/// and stay warm for the next path item that asks for them.
#[derive(Debug)]
pub struct ArchiveCachePool {
    state: Mutex<PoolState>,
}

#[derive(Debug)]
struct PoolState {
    live: HashMap<String, Weak<ArchiveCache>>,
    warm: Option<LruCache<String, Arc<ArchiveCache>>>,
}

impl PoolState {
    fn lookup(&mut self, key: &str) -> Option<Arc<ArchiveCache>> {
        if let Some(cache) = self.warm.as_mut().and_then(|warm| warm.get(key))
            && !cache.is_closed()
        {
            return Some(Arc::clone(cache));
        }

        let cache = self.live.get(key)?.upgrade()?;
        if cache.is_closed() {
            return None;
        }
        self.keep_warm(key, &cache);
        Some(cache)
    }

    fn keep_warm(&mut self, key: &str, cache: &Arc<ArchiveCache>) {
        if let Some(warm) = self.warm.as_mut()
            && let Some((evicted, _)) = warm.push(key.to_string(), Arc::clone(cache))
            && evicted != key
        {
            tracing::trace!(archive = %evicted, "archive cache left the warm set");
        }
    }
}

impl ArchiveCachePool {
    pub fn new(capacity: usize) -> Self {
        Self {
            state: Mutex::new(PoolState {
                live: HashMap::new(),
                warm: NonZeroUsize::new(capacity).map(LruCache::new),
            }),
        }
    }

    /// Return the cache for `key`, opening the archive with `open` when no
    /// live cache exists.
    ///
    /// The archive is opened outside the pool lock; if two callers race, the
    /// first one to publish wins and the other's archive is dropped.
    pub fn get_or_open<F>(&self, key: &str, open: F) -> Result<Arc<ArchiveCache>>
    where
        F: FnOnce() -> Result<Box<dyn Archive>>,
    {
        if let Some(cache) = self.state.lock().lookup(key) {
            tracing::debug!(archive = key, "archive cache hit");
            return Ok(cache);
        }

        let archive = open()?;
        archive.open()?;
        let cache = Arc::new(ArchiveCache::new(archive));

        let mut state = self.state.lock();
        if let Some(existing) = state.lookup(key) {
            return Ok(existing);
        }

        tracing::debug!(archive = key, "archive cache miss");
        state.live.retain(|_, cache| cache.strong_count() > 0);
        state.live.insert(key.to_string(), Arc::downgrade(&cache));
        state.keep_warm(key, &cache);
        Ok(cache)
    }

    /// Number of caches still referenced by someone.
    pub fn len(&self) -> usize {
        self.state
            .lock()
            .live
            .values()
            .filter(|cache| cache.strong_count() > 0)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop the entry index of every live cache. Archives stay open and
    /// rebuild their index on next use.
    pub fn evict_indexes(&self) {
        let caches: Vec<_> = self
            .state
            .lock()
            .live
            .values()
            .filter_map(Weak::upgrade)
            .collect();
        for cache in caches {
            cache.evict();
        }
    }

    /// Forget `key`. Path items already holding the cache keep using it; the
    /// next request opens the archive afresh.
    pub fn invalidate(&self, key: &str) {
        let mut state = self.state.lock();
        state.live.remove(key);
        if let Some(warm) = state.warm.as_mut() {
            warm.pop(key);
        }
    }

    /// Release the warm set. Caches no path item references close now.
    pub fn clear(&self) {
        let warm: Vec<_> = {
            let mut state = self.state.lock();
            match state.warm.as_mut() {
                Some(warm) => std::iter::from_fn(|| warm.pop_lru()).collect(),
                None => Vec::new(),
            }
        };
        drop(warm);
    }
}

impl Default for ArchiveCachePool {
    fn default() -> Self {
        Self::new(16)
    }
}
