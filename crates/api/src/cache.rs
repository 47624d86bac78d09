use dashmap::DashMap;
use extract::{AugmentError, Augmenter};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::debug;

/// Model responses keyed by a hash of the prompt.
pub struct ResponseCache {
    responses: DashMap<String, String>,
    max_entries: usize,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

impl ResponseCache {
    pub fn new(max_entries: usize) -> Arc<Self> {
        Arc::new(Self {
            responses: DashMap::new(),
            max_entries,
            hits: AtomicUsize::new(0),
            misses: AtomicUsize::new(0),
        })
    }

    pub fn insert(&self, prompt: &str, response: String) {
        if self.max_entries == 0 {
            return;
        }
        if self.responses.len() >= self.max_entries {
            // Simple eviction: clear 25% when full
            let to_remove: Vec<_> = self.responses.iter()
                .take((self.max_entries / 4).max(1))
                .map(|r| r.key().clone())
                .collect();
            for key in to_remove {
                self.responses.remove(&key);
            }
        }
        self.responses.insert(hash_text(prompt), response);
    }

    pub fn get(&self, prompt: &str) -> Option<String> {
        let found = self.responses.get(&hash_text(prompt)).map(|r| r.value().clone());
        let counter = if found.is_some() { &self.hits } else { &self.misses };
        counter.fetch_add(1, Ordering::Relaxed);
        found
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            responses_cached: self.responses.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

fn hash_text(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hex::encode(hasher.finalize())
}

#[derive(Debug, serde::Serialize)]
pub struct CacheStats {
    pub responses_cached: usize,
    pub hits: usize,
    pub misses: usize,
}

/// Serves repeated prompts from a [`ResponseCache`]. Failures are not cached.
pub struct CachedAugmenter<A> {
    inner: A,
    cache: Arc<ResponseCache>,
}

impl<A> CachedAugmenter<A> {
    pub fn new(inner: A, cache: Arc<ResponseCache>) -> Self {
        Self { inner, cache }
    }

    pub fn inner(&self) -> &A {
        &self.inner
    }
}

impl<A: Augmenter + Sync> Augmenter for CachedAugmenter<A> {
    async fn augment(&self, prompt: &str) -> Result<String, AugmentError> {
        if let Some(response) = self.cache.get(prompt) {
            debug!("Augmentation cache hit");
            return Ok(response);
        }

        let response = self.inner.augment(prompt).await?;
        self.cache.insert(prompt, response.clone());
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Counting {
        calls: AtomicUsize,
    }

    impl Augmenter for Counting {
        async fn augment(&self, prompt: &str) -> Result<String, AugmentError> {
            self.calls.fetch_add(1, Ordering::Relaxed);
            if prompt == "fail" {
                return Err(AugmentError::unavailable("down"));
            }
            Ok(format!("{{\"echo\": \"{}\"}}", prompt))
        }
    }

    #[tokio::test]
    async fn test_repeated_prompt_hits_cache() {
        let cache = ResponseCache::new(100);
        let augmenter = CachedAugmenter::new(Counting { calls: AtomicUsize::new(0) }, cache.clone());

        let first = augmenter.augment("a").await.unwrap();
        let second = augmenter.augment("a").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(augmenter.inner().calls.load(Ordering::Relaxed), 1);
        let stats = cache.stats();
        assert_eq!((stats.responses_cached, stats.hits, stats.misses), (1, 1, 1));
    }

    #[tokio::test]
    async fn test_failures_are_not_cached() {
        let cache = ResponseCache::new(100);
        let augmenter = CachedAugmenter::new(Counting { calls: AtomicUsize::new(0) }, cache.clone());

        assert!(augmenter.augment("fail").await.is_err());
        assert!(augmenter.augment("fail").await.is_err());
        assert_eq!(augmenter.inner().calls.load(Ordering::Relaxed), 2);
        assert_eq!(cache.stats().responses_cached, 0);
    }

    #[test]
    fn test_eviction_keeps_cache_bounded() {
        let cache = ResponseCache::new(4);
        for i in 0..10 {
            cache.insert(&format!("prompt-{i}"), "{}".to_string());
        }
        assert!(cache.stats().responses_cached <= 4);
        assert!(cache.get("prompt-9").is_some());
    }
}
