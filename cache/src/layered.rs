use std::collections::HashMap;
use std::sync::Arc;

use chrono::Duration;

use crate::single_tier::SingleTierCache;
use crate::stats::CacheStatsSnapshot;

/// Composes an ordered list of tiers, each independently configured
/// and locked. `get` probes tiers in order; `set` honours
/// `write_through`/`write_back`.
pub struct LayeredCache<V> {
    tiers: Vec<Arc<SingleTierCache<V>>>,
    promote: bool,
    write_through: bool,
}

impl<V: Clone + Send + Sync + 'static> LayeredCache<V> {
    /// `promote` moves a tier k>0 hit into tier 0. `write_through`
    /// writes every `set` to all tiers; otherwise only tier 0 is
    /// written directly and `write_back` (if set) wires each tier's
    /// evictions to fall through into the next.
    pub fn new(
        tiers: Vec<Arc<SingleTierCache<V>>>,
        promote: bool,
        write_through: bool,
        write_back: bool,
    ) -> Self {
        if write_back {
            for pair in tiers.windows(2) {
                let next = pair[1].clone();
                pair[0].set_evict_sink(Arc::new(move |key, entry, now| {
                    let ttl = entry
                        .expire_at
                        .map(|at| at - now)
                        .filter(|d| *d > Duration::zero());
                    next.set(key.to_string(), entry.value.clone(), ttl);
                }));
            }
        }
        Self {
            tiers,
            promote,
            write_through,
        }
    }

    pub fn get(&self, key: &str) -> Option<V> {
        for (i, tier) in self.tiers.iter().enumerate() {
            if let Some(value) = tier.get(key) {
                if i > 0 && self.promote {
                    self.tiers[0].set(key.to_string(), value.clone(), None);
                }
                return Some(value);
            }
        }
        None
    }

    pub fn set(&self, key: impl Into<String>, value: V, ttl: Option<Duration>) {
        let key = key.into();
        if self.write_through {
            for tier in &self.tiers {
                tier.set(key.clone(), value.clone(), ttl);
            }
        } else if let Some(tier0) = self.tiers.first() {
            tier0.set(key, value, ttl);
        }
    }

    pub fn delete(&self, key: &str) -> bool {
        let mut removed = false;
        for tier in &self.tiers {
            removed |= tier.delete(key);
        }
        removed
    }

    pub fn batch_get(&self, keys: &[String]) -> HashMap<String, V> {
        let mut out = HashMap::new();
        let mut remaining: Vec<String> = keys.to_vec();

        for (i, tier) in self.tiers.iter().enumerate() {
            if remaining.is_empty() {
                break;
            }
            let found = tier.batch_get(&remaining);
            for (k, v) in &found {
                if i > 0 && self.promote {
                    self.tiers[0].set(k.clone(), v.clone(), None);
                }
            }
            remaining.retain(|k| !found.contains_key(k));
            out.extend(found);
        }
        out
    }

    pub fn batch_set(&self, items: Vec<(String, V, Option<Duration>)>) {
        if self.write_through {
            for tier in &self.tiers {
                tier.batch_set(items.clone());
            }
        } else if let Some(tier0) = self.tiers.first() {
            tier0.batch_set(items);
        }
    }

    pub fn close(&self) {
        for tier in &self.tiers {
            tier.close();
        }
    }

    pub fn stats(&self) -> Vec<CacheStatsSnapshot> {
        self.tiers.iter().map(|t| t.stats()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::policy::Lru;

    fn epoch() -> chrono::DateTime<chrono::Utc> {
        chrono::DateTime::<chrono::Utc>::from_timestamp(0, 0).unwrap()
    }

    fn tier(max_size: usize) -> Arc<SingleTierCache<i32>> {
        Arc::new(SingleTierCache::new(
            max_size,
            Arc::new(Lru::new()),
            Arc::new(FixedClock::new(epoch())),
        ))
    }

    #[test]
    fn get_probes_tiers_in_order_and_promotes() {
        let l1 = tier(10);
        let l2 = tier(10);
        l2.set("a", 7, None);

        let layered = LayeredCache::new(vec![l1.clone(), l2.clone()], true, false, false);
        assert_eq!(layered.get("a"), Some(7));
        assert_eq!(l1.get("a"), Some(7));
    }

    #[test]
    fn write_through_populates_every_tier() {
        let l1 = tier(10);
        let l2 = tier(10);
        let layered = LayeredCache::new(vec![l1.clone(), l2.clone()], false, true, false);

        layered.set("a", 1, None);
        assert_eq!(l1.get("a"), Some(1));
        assert_eq!(l2.get("a"), Some(1));
    }

    #[test]
    fn without_write_through_only_tier_zero_is_written() {
        let l1 = tier(10);
        let l2 = tier(10);
        let layered = LayeredCache::new(vec![l1.clone(), l2.clone()], false, false, false);

        layered.set("a", 1, None);
        assert_eq!(l1.get("a"), Some(1));
        assert_eq!(l2.len(), 0);
    }

    #[test]
    fn write_back_pushes_evicted_entries_down_a_tier() {
        let l1 = tier(1);
        let l2 = tier(10);
        let layered = LayeredCache::new(vec![l1.clone(), l2.clone()], false, false, true);

        layered.set("a", 1, None);
        layered.set("b", 2, None);

        assert_eq!(l1.get("b"), Some(2));
        assert_eq!(l2.get("a"), Some(1));
    }

    #[test]
    fn delete_removes_from_every_tier() {
        let l1 = tier(10);
        let l2 = tier(10);
        let layered = LayeredCache::new(vec![l1.clone(), l2.clone()], false, true, false);

        layered.set("a", 1, None);
        assert!(layered.delete("a"));
        assert_eq!(l1.len(), 0);
        assert_eq!(l2.len(), 0);
    }
}
