use chrono::{DateTime, Utc};

/// One cached value plus the bookkeeping the eviction policies and TTL
/// logic need. Ownership is exclusive to the cache instance holding it.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub value: V,
    pub expire_at: Option<DateTime<Utc>>,
    pub access_at: DateTime<Utc>,
    pub create_at: DateTime<Utc>,
    pub hit_count: u64,
    pub approx_size: usize,
}

impl<V> CacheEntry<V> {
    pub fn new(value: V, now: DateTime<Utc>, ttl: Option<chrono::Duration>, approx_size: usize) -> Self {
        Self {
            value,
            expire_at: ttl.map(|d| now + d),
            access_at: now,
            create_at: now,
            hit_count: 0,
            approx_size,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        matches!(self.expire_at, Some(at) if now >= at)
    }

    pub fn stats(&self) -> crate::policy::EntryStats {
        crate::policy::EntryStats {
            create_at: self.create_at,
            access_at: self.access_at,
            hit_count: self.hit_count,
        }
    }
}
