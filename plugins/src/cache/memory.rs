use std::num::NonZeroUsize;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use lru::LruCache;

use clipseek_core::api::{CacheEntry, CacheKey, ResultCache, StoreError};

const MIN_CAPACITY: NonZeroUsize = match NonZeroUsize::new(1) {
    Some(n) => n,
    None => unreachable!(),
};

/// In-process cache bounded by entry count, least recently used evicted first.
pub struct MemoryResultCache {
    entries: Mutex<LruCache<CacheKey, CacheEntry>>,
}

impl MemoryResultCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(MIN_CAPACITY);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    fn lock(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, LruCache<CacheKey, CacheEntry>>, StoreError> {
        self.entries
            .lock()
            .map_err(|_| StoreError::Backend("memory cache lock poisoned".into()))
    }
}

#[async_trait]
impl ResultCache for MemoryResultCache {
    fn name(&self) -> &str {
        "memory"
    }

    async fn get(&self, key: &CacheKey) -> Result<Option<CacheEntry>, StoreError> {
        Ok(self.lock()?.get(key).cloned())
    }

    async fn put(&self, key: &CacheKey, payload: Vec<u8>) -> Result<(), StoreError> {
        let entry = CacheEntry {
            key: key.clone(),
            payload,
            written_at: Utc::now(),
        };
        self.lock()?.put(key.clone(), entry);
        Ok(())
    }
}
