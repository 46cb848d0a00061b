//! Fingerprinted LLM response cache.
//!
//! Keyed by a 128-bit digest of `(prompt, provider, model, temperature)`.
//! Entries expire after the configured TTL and evict LRU beyond the maximum
//! size. Prompt-template edits are not part of the key (matching the source
//! behavior), so repeated runs across template edits can return stale cached
//! answers until the TTL expires.

use crate::config::CacheSettings;
use lru::LruCache;
use sha2::{Digest, Sha256};
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Computes the 128-bit cache fingerprint for a request.
///
/// SHA-256 over the request components, truncated to 16 bytes, hex-encoded.
#[must_use]
pub fn fingerprint(prompt: &str, provider: &str, model: &str, temperature: f32) -> String {
    let mut hasher = Sha256::new();
    hasher.update(prompt.as_bytes());
    hasher.update([0]);
    hasher.update(provider.as_bytes());
    hasher.update([0]);
    hasher.update(model.as_bytes());
    hasher.update([0]);
    hasher.update(format!("{temperature:.3}").as_bytes());
    let digest = hasher.finalize();
    hex::encode(&digest[..16])
}

/// Cache hit/miss counters and current size.
#[derive(Debug, Clone, Copy, Default)]
pub struct CacheStats {
    /// Lookups served from the cache.
    pub hits: u64,
    /// Lookups that fell through to the provider.
    pub misses: u64,
    /// Current number of live entries.
    pub entries: usize,
}

impl CacheStats {
    /// Hit rate in `[0, 1]`; zero when no lookups were made.
    #[must_use]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

struct CacheEntry {
    response: String,
    inserted_at: Instant,
}

/// TTL + LRU response cache.
pub struct ResponseCache {
    enabled: bool,
    ttl: Duration,
    entries: Mutex<LruCache<String, CacheEntry>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ResponseCache {
    /// Creates a cache from settings.
    #[must_use]
    pub fn new(settings: CacheSettings) -> Self {
        let capacity = NonZeroUsize::new(settings.max_entries.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            enabled: settings.enabled,
            ttl: Duration::from_secs(settings.ttl_secs),
            entries: Mutex::new(LruCache::new(capacity)),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Looks up a response; expired entries are dropped on access.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<String> {
        if !self.enabled {
            return None;
        }
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let expired = entries
            .get(key)
            .map(|entry| entry.inserted_at.elapsed() > self.ttl);
        match expired {
            Some(false) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                entries.get(key).map(|entry| entry.response.clone())
            }
            Some(true) => {
                entries.pop(key);
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Stores a response.
    pub fn put(&self, key: String, response: String) {
        if !self.enabled {
            return;
        }
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        entries.put(
            key,
            CacheEntry {
                response,
                inserted_at: Instant::now(),
            },
        );
    }

    /// Snapshot of the counters.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        let entries = self
            .entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: entries.len(),
        }
    }
}
