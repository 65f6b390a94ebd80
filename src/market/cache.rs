//! String-keyed TTL cache in front of the market-data API.
//!
//! Entries expire after a fixed TTL and are dropped on read. The cache check
//! and upstream call are not atomic: two concurrent misses for the same key
//! may both call upstream and both write (last write wins).

use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use lru::LruCache;

use super::client::RawCoin;
use super::format::SearchResponse;

pub const DEFAULT_TTL: Duration = Duration::from_secs(60);
const DEFAULT_CAPACITY: usize = 256;

struct Entry<V> {
    value: V,
    inserted_at: Instant,
}

/// LRU cache with a shared per-entry TTL.
pub struct TtlCache<V> {
    cache: Mutex<LruCache<String, Entry<V>>>,
    ttl: Duration,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            cache: Mutex::new(LruCache::new(
                NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::new(1).unwrap()),
            )),
            ttl,
        }
    }

    /// Returns the cached value, or `None` when absent or expired.
    pub fn get(&self, key: &str) -> Option<V> {
        let mut cache = self.cache.lock().ok()?;
        if let Some(entry) = cache.get(key) {
            if entry.inserted_at.elapsed() < self.ttl {
                return Some(entry.value.clone());
            }
            cache.pop(key);
        }
        None
    }

    pub fn set(&self, key: &str, value: V) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.put(
                key.to_string(),
                Entry {
                    value,
                    inserted_at: Instant::now(),
                },
            );
        }
    }
}

/// Raw listings page plus the upstream total count.
#[derive(Debug, Clone)]
pub struct CachedListings {
    pub data: Vec<RawCoin>,
    pub total_count: u64,
}

/// The three caches used by the market services, all 60-second TTL.
pub struct MarketCache {
    pub listings: TtlCache<CachedListings>,
    pub quotes: TtlCache<Vec<RawCoin>>,
    pub search: TtlCache<SearchResponse>,
}

impl MarketCache {
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            listings: TtlCache::new(DEFAULT_CAPACITY, ttl),
            quotes: TtlCache::new(DEFAULT_CAPACITY, ttl),
            search: TtlCache::new(DEFAULT_CAPACITY, ttl),
        }
    }
}

impl Default for MarketCache {
    fn default() -> Self {
        Self::with_ttl(DEFAULT_TTL)
    }
}

pub fn listings_key(page: u32, limit: u32) -> String {
    format!("cryptocurrencies_page_{page}_limit_{limit}")
}

pub fn watchlist_key(user_id: uuid::Uuid) -> String {
    format!("watchlist_cryptocurrencies_user_{user_id}")
}

pub fn search_key(query: &str, page: u32, limit: u32) -> String {
    format!("search_{query}_page_{page}_limit_{limit}")
}
