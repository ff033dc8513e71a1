use std::num::NonZeroUsize;
use std::sync::Mutex;

use lru::LruCache;
use sha2::{Digest, Sha256};

/// SHA-256 of `bytes`, hex-encoded — the key used for both the message
/// dedup pool and the LMN's `MsgCheck` hash, matching `HashToPool`'s use
/// of the raw (still-gzipped) frame bytes in the original reader loop.
pub fn hash_bytes(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    hex::encode(digest)
}

/// Bounded, concurrency-safe pool of recently seen message hashes. A hit
/// means "drop this frame, we've already processed it"; eviction is plain
/// LRU rather than TTL (SPEC_FULL.md §4.1 leaves the choice to the
/// implementer).
pub struct DedupPool {
    cache: Mutex<LruCache<String, ()>>,
}

impl DedupPool {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::new(1).unwrap());
        Self { cache: Mutex::new(LruCache::new(capacity)) }
    }

    /// Returns `true` if `hash` was already present (and therefore this
    /// frame should be dropped), inserting it either way.
    pub fn seen_or_insert(&self, hash: &str) -> bool {
        let mut cache = self.cache.lock().unwrap();
        if cache.get(hash).is_some() {
            true
        } else {
            cache.put(hash.to_string(), ());
            false
        }
    }

    pub fn contains(&self, hash: &str) -> bool {
        self.cache.lock().unwrap().peek(hash).is_some()
    }
}
