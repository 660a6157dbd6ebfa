//! Bounded in-memory cache of processed images.
//!
//! Decoding and resampling are the expensive part of the gallery, so every
//! [`ProcessedImage`] is kept once built and served again whenever its slot
//! scrolls back into view or the lightbox opens it.
//!
//! # Design
//!
//! ## Keys
//!
//! Entries are keyed by the descriptor id. Identity implies content: there is
//! no TTL and no revalidation, and a changed source under the same id keeps
//! serving the old rasters for the lifetime of the cache.
//!
//! ## Eviction
//!
//! The cache holds at most `capacity` entries. When an insert would exceed
//! that, the entry inserted **earliest** among those still held is dropped.
//! Reading an entry does not move it: this is insertion-order eviction, not
//! LRU. Replacing the value of a key that is already present keeps its
//! original position.
//!
//! ## Ownership
//!
//! Each gallery owns its own cache instance. There is no global cache, so two
//! galleries never observe each other's entries.

use crate::types::ProcessedImage;
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Default maximum number of cached images.
pub const DEFAULT_MAX_ENTRIES: usize = 100;

/// Insertion-ordered, capacity-bounded map from image id to processed image.
#[derive(Debug)]
pub struct ImageCache {
    entries: HashMap<String, Arc<ProcessedImage>>,
    /// Keys in insertion order; front is the next eviction victim.
    order: VecDeque<String>,
    capacity: usize,
    stats: CacheStats,
}

impl ImageCache {
    /// Create an empty cache. A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: HashMap::with_capacity(capacity),
            order: VecDeque::with_capacity(capacity),
            capacity,
            stats: CacheStats::default(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Look up an entry without affecting eviction order.
    pub fn peek(&self, id: &str) -> Option<Arc<ProcessedImage>> {
        self.entries.get(id).cloned()
    }

    /// Look up an entry and count the hit or miss.
    pub fn get(&mut self, id: &str) -> Option<Arc<ProcessedImage>> {
        match self.entries.get(id) {
            Some(entry) => {
                self.stats.hit();
                Some(Arc::clone(entry))
            }
            None => {
                self.stats.miss();
                None
            }
        }
    }

    /// Store an entry, evicting the oldest insertion if the cache is full.
    ///
    /// Returns the id of the evicted entry, if any.
    pub fn insert(&mut self, id: String, image: Arc<ProcessedImage>) -> Option<String> {
        if let Some(existing) = self.entries.get_mut(&id) {
            *existing = image;
            return None;
        }

        let evicted = if self.entries.len() >= self.capacity {
            self.evict_oldest()
        } else {
            None
        };

        self.order.push_back(id.clone());
        self.entries.insert(id, image);
        evicted
    }

    /// Ids in insertion order, oldest first.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    fn evict_oldest(&mut self) -> Option<String> {
        let victim = self.order.pop_front()?;
        self.entries.remove(&victim);
        self.stats.evict();
        debug!(id = %victim, "evicted oldest cache entry");
        Some(victim)
    }
}

impl Default for ImageCache {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ENTRIES)
    }
}

/// Summary of cache behaviour over a gallery's lifetime.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u32,
    pub misses: u32,
    pub evictions: u32,
}

impl CacheStats {
    pub fn hit(&mut self) {
        self.hits += 1;
    }

    pub fn miss(&mut self) {
        self.misses += 1;
    }

    pub fn evict(&mut self) {
        self.evictions += 1;
    }

    pub fn total(&self) -> u32 {
        self.hits + self.misses
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.evictions > 0 {
            write!(
                f,
                "{} cached, {} processed, {} evicted ({} lookups)",
                self.hits,
                self.misses,
                self.evictions,
                self.total()
            )
        } else if self.hits > 0 {
            write!(
                f,
                "{} cached, {} processed ({} lookups)",
                self.hits,
                self.misses,
                self.total()
            )
        } else {
            write!(f, "{} processed", self.misses)
        }
    }
}
