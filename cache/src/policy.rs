use std::collections::HashMap;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

/// Snapshot of the fields an eviction policy cares about, handed over
/// by the cache after every insert or hit so the policy can maintain
/// its own index without reaching back into the entry map.
#[derive(Debug, Clone, Copy)]
pub struct EntryStats {
    pub create_at: DateTime<Utc>,
    pub access_at: DateTime<Utc>,
    pub hit_count: u64,
}

/// Pluggable victim-selection strategy. Each policy keeps its own
/// internal index (never the cache's map) so `victim()` can run while
/// the cache only holds a read lock.
pub trait EvictionPolicy: Send + Sync {
    fn name(&self) -> &'static str;
    fn on_insert(&self, key: &str, stats: EntryStats);
    fn on_access(&self, key: &str, stats: EntryStats);
    fn on_remove(&self, key: &str);
    fn victim(&self) -> Option<String>;
}

/// Victim = entry with the smallest `access_at`.
#[derive(Default)]
pub struct Lru {
    access_at: Mutex<HashMap<String, DateTime<Utc>>>,
}

impl Lru {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EvictionPolicy for Lru {
    fn name(&self) -> &'static str {
        "lru"
    }

    fn on_insert(&self, key: &str, stats: EntryStats) {
        self.access_at.lock().insert(key.to_string(), stats.access_at);
    }

    fn on_access(&self, key: &str, stats: EntryStats) {
        self.access_at.lock().insert(key.to_string(), stats.access_at);
    }

    fn on_remove(&self, key: &str) {
        self.access_at.lock().remove(key);
    }

    fn victim(&self) -> Option<String> {
        self.access_at
            .lock()
            .iter()
            .min_by_key(|(_, at)| **at)
            .map(|(k, _)| k.clone())
    }
}

/// Victim = entry with the smallest `hit_count`, ties broken by the
/// lowest `access_at`.
#[derive(Default)]
pub struct Lfu {
    index: Mutex<HashMap<String, (u64, DateTime<Utc>)>>,
}

impl Lfu {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EvictionPolicy for Lfu {
    fn name(&self) -> &'static str {
        "lfu"
    }

    fn on_insert(&self, key: &str, stats: EntryStats) {
        self.index
            .lock()
            .insert(key.to_string(), (stats.hit_count, stats.access_at));
    }

    fn on_access(&self, key: &str, stats: EntryStats) {
        self.index
            .lock()
            .insert(key.to_string(), (stats.hit_count, stats.access_at));
    }

    fn on_remove(&self, key: &str) {
        self.index.lock().remove(key);
    }

    fn victim(&self) -> Option<String> {
        self.index
            .lock()
            .iter()
            .min_by(|(_, a), (_, b)| a.0.cmp(&b.0).then(a.1.cmp(&b.1)))
            .map(|(k, _)| k.clone())
    }
}

/// Victim = entry with the smallest `create_at`. `on_access` is a
/// no-op: FIFO ordering is fixed at insert time.
#[derive(Default)]
pub struct Fifo {
    create_at: Mutex<HashMap<String, DateTime<Utc>>>,
}

impl Fifo {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EvictionPolicy for Fifo {
    fn name(&self) -> &'static str {
        "fifo"
    }

    fn on_insert(&self, key: &str, stats: EntryStats) {
        self.create_at.lock().insert(key.to_string(), stats.create_at);
    }

    fn on_access(&self, _key: &str, _stats: EntryStats) {}

    fn on_remove(&self, key: &str) {
        self.create_at.lock().remove(key);
    }

    fn victim(&self) -> Option<String> {
        self.create_at
            .lock()
            .iter()
            .min_by_key(|(_, at)| **at)
            .map(|(k, _)| k.clone())
    }
}
