// SPDX-License-Identifier: PMPL-1.0-or-later
//! TTL result cache and input fingerprints.
//!
//! A `ResultCache` is a cloneable handle over a shared concurrent map; clones
//! see the same entries. Expired entries are removed lazily when looked up.
//! Concurrent computations of the same key are not coalesced: the last
//! `set` wins.

use crate::model::ImageDescriptor;
use dashmap::DashMap;
use sha2::{Digest, Sha256};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// A cached value with its expiry
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub value: V,
    pub expiry: Instant,
}

impl<V> CacheEntry<V> {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expiry
    }
}

/// Lookup counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub expired: u64,
}

#[derive(Debug, Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    expired: AtomicU64,
}

/// Keyed TTL store shared across concurrent requests
#[derive(Debug)]
pub struct ResultCache<V> {
    name: &'static str,
    entries: Arc<DashMap<String, CacheEntry<V>>>,
    counters: Arc<Counters>,
}

impl<V> Clone for ResultCache<V> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            entries: Arc::clone(&self.entries),
            counters: Arc::clone(&self.counters),
        }
    }
}

impl<V: Clone> ResultCache<V> {
    /// Create an empty cache; `name` labels log lines
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            entries: Arc::new(DashMap::new()),
            counters: Arc::new(Counters::default()),
        }
    }

    /// Value for `key`, or `None` when absent or expired
    pub fn get(&self, key: &str) -> Option<V> {
        let now = Instant::now();

        if let Some(entry) = self.entries.get(key) {
            if !entry.is_expired(now) {
                self.counters.hits.fetch_add(1, Ordering::Relaxed);
                debug!(cache = self.name, key, "Cache hit");
                return Some(entry.value.clone());
            }
        } else {
            self.counters.misses.fetch_add(1, Ordering::Relaxed);
            debug!(cache = self.name, key, "Cache miss");
            return None;
        }

        // Only remove if still expired: a concurrent `set` may have replaced it.
        if self.entries.remove_if(key, |_, entry| entry.is_expired(now)).is_some() {
            self.counters.expired.fetch_add(1, Ordering::Relaxed);
            debug!(cache = self.name, key, "Cache entry expired");
        }
        self.counters.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    /// Store `value` under `key` for `ttl`
    pub fn set(&self, key: impl Into<String>, value: V, ttl: Duration) {
        let key = key.into();
        let expiry = Instant::now() + ttl;
        debug!(cache = self.name, key = %key, ?ttl, "Cache set");
        self.entries.insert(key, CacheEntry { value, expiry });
    }

    /// Drop a single key
    pub fn invalidate(&self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Drop everything
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Remove every expired entry, returning how many were dropped
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now));
        let purged = before.saturating_sub(self.entries.len());
        self.counters.expired.fetch_add(purged as u64, Ordering::Relaxed);
        purged
    }

    /// Stored entries, including expired ones not yet purged
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            expired: self.counters.expired.load(Ordering::Relaxed),
        }
    }
}

/// Lowercase, collapse whitespace and keep the first `max_chars` characters
fn normalized_slice(text: &str, max_chars: usize) -> String {
    text.split_whitespace()
        .flat_map(|word| std::iter::once(' ').chain(word.chars()))
        .skip(1)
        .flat_map(char::to_lowercase)
        .take(max_chars)
        .collect()
}

/// Report key over a bounded, normalized slice of the content and the image list.
///
/// Inputs that agree on the first `max_chars` normalized characters and on
/// their images share a key.
pub fn report_fingerprint(content: &str, images: &[ImageDescriptor], max_chars: usize, max_image_bytes: usize) -> String {
    let mut hasher = Sha256::new();
    hasher.update(normalized_slice(content, max_chars).as_bytes());
    for image in images {
        hasher.update(b"\0img\0");
        hasher.update(image.src.as_bytes());
        hasher.update(b"\0");
        if let Some(alt) = &image.alt {
            hasher.update(alt.as_bytes());
        }
        if let Some(data) = &image.data {
            hasher.update(b"\0");
            hasher.update(image_fingerprint(data, &image.effective_mime_type(), max_image_bytes).as_bytes());
        }
    }
    format!("report:{}", hex::encode(hasher.finalize()))
}

/// Image key over the mime type, total length and the leading `max_bytes` bytes
pub fn image_fingerprint(data: &[u8], mime_type: &str, max_bytes: usize) -> String {
    let mut hasher = Sha256::new();
    hasher.update(mime_type.as_bytes());
    hasher.update((data.len() as u64).to_le_bytes());
    hasher.update(&data[..data.len().min(max_bytes)]);
    format!("image:{}", hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_then_get() {
        let cache = ResultCache::new("test");
        cache.set("k", 42, Duration::from_millis(100));
        assert_eq!(cache.get("k"), Some(42));
        assert_eq!(cache.stats().hits, 1);
    }

    #[test]
    fn test_expiry() {
        let cache = ResultCache::new("test");
        cache.set("k", "v".to_string(), Duration::from_millis(100));
        assert_eq!(cache.get("k").as_deref(), Some("v"));
        std::thread::sleep(Duration::from_millis(150));
        assert_eq!(cache.get("k"), None);
        assert!(cache.is_empty(), "expired entry should be removed on lookup");
        assert_eq!(cache.stats().expired, 1);
    }

    #[test]
    fn test_zero_ttl_is_never_returned() {
        let cache = ResultCache::new("test");
        cache.set("k", 1, Duration::ZERO);
        assert_eq!(cache.get("k"), None);
    }

    #[test]
    fn test_last_set_wins() {
        let cache = ResultCache::new("test");
        cache.set("k", 1, Duration::from_secs(60));
        cache.set("k", 2, Duration::from_secs(60));
        assert_eq!(cache.get("k"), Some(2));
    }

    #[test]
    fn test_clones_share_entries() {
        let cache = ResultCache::new("test");
        let handle = cache.clone();
        handle.set("k", 7, Duration::from_secs(60));
        assert_eq!(cache.get("k"), Some(7));
        cache.clear();
        assert_eq!(handle.get("k"), None);
    }

    #[test]
    fn test_purge_expired() {
        let cache = ResultCache::new("test");
        cache.set("old", 1, Duration::ZERO);
        cache.set("new", 2, Duration::from_secs(60));
        assert_eq!(cache.purge_expired(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_fingerprint_is_bounded_and_normalized() {
        let a = format!("<P>Hello   World</P>{}", "x".repeat(50));
        let b = format!("<p>hello world</p>{}", "x".repeat(80));
        assert_eq!(report_fingerprint(&a, &[], 30, 64), report_fingerprint(&b, &[], 30, 64));
        assert_ne!(report_fingerprint(&a, &[], 1000, 64), report_fingerprint(&b, &[], 1000, 64));
    }

    #[test]
    fn test_fingerprint_includes_images() {
        let with = [ImageDescriptor::new("a.png").with_alt("Chart")];
        let without = [ImageDescriptor::new("a.png")];
        assert_ne!(
            report_fingerprint("<p>x</p>", &with, 100, 64),
            report_fingerprint("<p>x</p>", &without, 100, 64)
        );
    }

    #[test]
    fn test_image_fingerprint() {
        let data = vec![1u8; 10_000];
        let mut tail_changed = data.clone();
        tail_changed[9_999] = 2;
        assert_eq!(image_fingerprint(&data, "image/png", 4096), image_fingerprint(&tail_changed, "image/png", 4096));
        assert_ne!(image_fingerprint(&data, "image/png", 4096), image_fingerprint(&data[..9_000], "image/png", 4096));
        assert!(image_fingerprint(&data, "image/png", 4096).starts_with("image:"));
    }
}
