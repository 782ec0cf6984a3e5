use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Thread-safe LRU cache for question embeddings
///
/// Repeated questions skip the remote embedding call. Uses LRU eviction to
/// keep memory bounded.
pub struct EmbeddingCache {
    cache: Mutex<LruCache<String, Vec<f32>>>,
}

impl EmbeddingCache {
    /// Create a new embedding cache holding at most `capacity` entries
    /// (a capacity of 0 is treated as 1).
    pub fn new(capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);

        Self {
            cache: Mutex::new(LruCache::new(cap)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<String, Vec<f32>>> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Cached embedding for a question, refreshing its recency
    pub fn get(&self, query: &str) -> Option<Vec<f32>> {
        self.lock().get(query).cloned()
    }

    /// Store an embedding for a question
    pub fn put(&self, query: String, embedding: Vec<f32>) {
        self.lock().put(query, embedding);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }
}
