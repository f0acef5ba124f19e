use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use tracing::debug;

use crate::clock::Clock;
use crate::entry::CacheEntry;
use crate::policy::EvictionPolicy;
use crate::stats::{CacheStats, CacheStatsSnapshot};

/// Called with `(key, evicted_entry, now)` whenever `set_locked` picks
/// a victim. The layered cache wires this to write an evicted entry
/// down into the next tier when `write_back` is enabled.
pub type EvictSink<V> = Arc<dyn Fn(&str, &CacheEntry<V>, DateTime<Utc>) + Send + Sync>;

/// A single-policy, bounded cache. One mutex guards the entry map;
/// the policy holds its own internal index behind a separate mutex,
/// always acquired after this one (cache before policy, never the
/// reverse, to avoid deadlock).
pub struct SingleTierCache<V> {
    max_size: usize,
    policy: Arc<dyn EvictionPolicy>,
    clock: Arc<dyn Clock>,
    entries: Mutex<HashMap<String, CacheEntry<V>>>,
    stats: CacheStats,
    evict_sink: Mutex<Option<EvictSink<V>>>,
}

impl<V: Clone + Send + Sync> SingleTierCache<V> {
    pub fn new(max_size: usize, policy: Arc<dyn EvictionPolicy>, clock: Arc<dyn Clock>) -> Self {
        Self {
            max_size,
            policy,
            clock,
            entries: Mutex::new(HashMap::new()),
            stats: CacheStats::default(),
            evict_sink: Mutex::new(None),
        }
    }

    /// Install the callback invoked on every eviction. Used by
    /// [`crate::layered::LayeredCache`] to implement `write_back`.
    pub fn set_evict_sink(&self, sink: EvictSink<V>) {
        *self.evict_sink.lock() = Some(sink);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStatsSnapshot {
        self.stats.snapshot()
    }

    /// Absent or expired is a miss; a hit refreshes `access_at` and
    /// increments `hit_count`.
    pub fn get(&self, key: &str) -> Option<V> {
        let now = self.clock.now();
        let mut entries = self.entries.lock();

        match entries.get_mut(key) {
            Some(entry) if !entry.is_expired(now) => {
                entry.access_at = now;
                entry.hit_count += 1;
                let stats = entry.stats();
                let value = entry.value.clone();
                self.policy.on_access(key, stats);
                self.stats.record_hit();
                Some(value)
            }
            Some(_) => {
                entries.remove(key);
                self.policy.on_remove(key);
                self.stats.record_miss();
                None
            }
            None => {
                self.stats.record_miss();
                None
            }
        }
    }

    /// Insert or refresh `key`. Refreshing an existing key updates its
    /// value and expiry without resetting `create_at`/`hit_count`. A
    /// new key at capacity evicts one victim via the configured policy
    /// first.
    pub fn set(&self, key: impl Into<String>, value: V, ttl: Option<Duration>) {
        let now = self.clock.now();
        let mut entries = self.entries.lock();
        self.set_locked(&mut entries, key.into(), value, ttl, now);
    }

    pub fn delete(&self, key: &str) -> bool {
        let mut entries = self.entries.lock();
        let removed = entries.remove(key).is_some();
        if removed {
            self.policy.on_remove(key);
        }
        removed
    }

    /// Atomic with respect to other batch ops on this tier: the whole
    /// read runs under a single lock acquisition.
    pub fn batch_get(&self, keys: &[String]) -> HashMap<String, V> {
        let now = self.clock.now();
        let mut entries = self.entries.lock();
        let mut out = HashMap::with_capacity(keys.len());

        for key in keys {
            match entries.get_mut(key.as_str()) {
                Some(entry) if !entry.is_expired(now) => {
                    entry.access_at = now;
                    entry.hit_count += 1;
                    let stats = entry.stats();
                    out.insert(key.clone(), entry.value.clone());
                    self.policy.on_access(key, stats);
                    self.stats.record_hit();
                }
                Some(_) => {
                    entries.remove(key.as_str());
                    self.policy.on_remove(key);
                    self.stats.record_miss();
                }
                None => self.stats.record_miss(),
            }
        }
        out
    }

    pub fn batch_set(&self, items: Vec<(String, V, Option<Duration>)>) {
        let now = self.clock.now();
        let mut entries = self.entries.lock();
        for (key, value, ttl) in items {
            self.set_locked(&mut entries, key, value, ttl, now);
        }
    }

    pub fn close(&self) {
        let mut entries = self.entries.lock();
        for key in entries.keys() {
            self.policy.on_remove(key);
        }
        entries.clear();
    }

    fn set_locked(
        &self,
        entries: &mut HashMap<String, CacheEntry<V>>,
        key: String,
        value: V,
        ttl: Option<Duration>,
        now: chrono::DateTime<chrono::Utc>,
    ) {
        if let Some(entry) = entries.get_mut(&key) {
            entry.value = value;
            entry.expire_at = ttl.map(|d| now + d);
            entry.access_at = now;
            let stats = entry.stats();
            self.policy.on_insert(&key, stats);
            return;
        }

        if entries.len() >= self.max_size {
            if let Some(victim) = self.policy.victim() {
                if let Some(evicted) = entries.remove(&victim) {
                    self.policy.on_remove(&victim);
                    self.stats.record_eviction();
                    debug!(victim, policy = self.policy.name(), "evicted entry to make room");
                    if let Some(sink) = self.evict_sink.lock().clone() {
                        sink(&victim, &evicted, now);
                    }
                }
            }
        }

        let entry = CacheEntry::new(value, now, ttl, std::mem::size_of::<V>());
        let stats = entry.stats();
        entries.insert(key.clone(), entry);
        self.policy.on_insert(&key, stats);
    }
}
