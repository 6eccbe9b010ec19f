use std::sync::Arc;

use docq_memory::{MemoryBudget, MemoryEstimator, MemoryFootprint, KB, MB};
use docq_registry::BoundedRegistryCache;

/// Test value with a fixed reported size.
#[derive(Debug, PartialEq, Eq)]
struct Blob {
    id: &'static str,
    bytes: u64,
}

impl MemoryFootprint for Blob {
    fn object_count(&self) -> usize {
        1
    }

    fn heap_bytes(&self) -> Option<u64> {
        Some(self.bytes)
    }
}

fn blob(id: &'static str, bytes: u64) -> Arc<Blob> {
    Arc::new(Blob { id, bytes })
}

fn cache(capacity: usize, budget: u64) -> BoundedRegistryCache<Blob> {
    BoundedRegistryCache::new(
        capacity,
        MemoryBudget::from_bytes(budget),
        MemoryEstimator::default(),
    )
}

#[test]
fn lru_with_intervening_get_keeps_promoted_entry() {
    let cache = cache(3, MB);
    for id in ["A", "B", "C"] {
        assert!(cache.put(id, blob(id, KB)).is_empty());
    }
    assert_eq!(cache.size(), 3);

    assert!(cache.get("A").is_some());
    assert_eq!(cache.put("D", blob("D", KB)), ["B"]);

    assert_eq!(cache.size(), 3);
    assert!(cache.get("B").is_none());
    assert!(cache.get("A").is_some());
    assert_eq!(cache.stats().access_order, ["C", "D", "A"]);
}

#[test]
fn overflowing_capacity_evicts_first_inserted() {
    let cache = cache(2, MB);
    cache.put("A", blob("A", 1));
    cache.put("B", blob("B", 1));
    assert_eq!(cache.put("C", blob("C", 1)), ["A"]);
    assert!(!cache.contains("A"));
    assert!(cache.contains("B"));
    assert!(cache.contains("C"));
}

#[test]
fn entry_larger_than_budget_is_evicted_immediately() {
    let cache = cache(10, MB);
    assert_eq!(cache.put("A", blob("A", 2 * MB)), ["A"]);
    assert_eq!(cache.size(), 0);
    assert_eq!(cache.memory_usage(), 0);
    assert!(cache.get("A").is_none());
}

#[test]
fn memory_eviction_removes_as_many_old_entries_as_needed() {
    let cache = cache(10, 10 * KB);
    for id in ["A", "B", "C", "D"] {
        cache.put(id, blob(id, 2 * KB));
    }
    assert_eq!(cache.memory_usage(), 8 * KB);

    assert_eq!(cache.put("E", blob("E", 7 * KB)), ["A", "B", "C"]);
    assert_eq!(cache.stats().access_order, ["D", "E"]);
    assert_eq!(cache.memory_usage(), 9 * KB);
}

#[test]
fn get_returns_the_value_last_put() {
    let cache = cache(3, MB);
    cache.put("A", blob("first", 10));
    cache.put("A", blob("second", 20));

    let value = cache.get("A").unwrap();
    assert_eq!(value.id, "second");
    assert_eq!(cache.size(), 1);
    assert_eq!(cache.memory_usage(), 20);
}

#[test]
fn updating_a_key_in_a_full_cache_evicts_nothing() {
    let cache = cache(2, MB);
    cache.put("A", blob("A", 1));
    cache.put("B", blob("B", 1));

    assert!(cache.put("A", blob("A2", 1)).is_empty());
    assert_eq!(cache.size(), 2);
    assert_eq!(cache.stats().access_order, ["B", "A"]);
}

#[test]
fn zero_capacity_keeps_nothing() {
    let cache = cache(0, MB);
    assert_eq!(cache.put("A", blob("A", 1)), ["A"]);
    assert_eq!(cache.put("B", blob("B", 1)), ["B"]);
    assert_eq!(cache.size(), 0);
    assert!(cache.stats().access_order.is_empty());
}

#[test]
fn evicted_values_stay_valid_for_existing_holders() {
    let cache = cache(1, MB);
    cache.put("A", blob("A", 1));
    let held = cache.get("A").unwrap();

    cache.put("B", blob("B", 1));
    assert!(cache.get("A").is_none());
    assert_eq!(held.id, "A");
}

#[test]
fn contains_does_not_promote() {
    let cache = cache(2, MB);
    cache.put("A", blob("A", 1));
    cache.put("B", blob("B", 1));
    assert!(cache.contains("A"));
    assert_eq!(cache.put("C", blob("C", 1)), ["A"]);
}

#[test]
fn delete_and_clear() {
    let cache = cache(3, MB);
    cache.put("A", blob("A", 1));
    cache.put("B", blob("B", 1));

    assert!(cache.delete("A"));
    assert!(!cache.delete("A"));
    assert_eq!(cache.stats().access_order, ["B"]);

    cache.clear();
    let stats = cache.stats();
    assert_eq!(cache.size(), 0);
    assert_eq!(stats.size, 0);
    assert!(stats.access_order.is_empty());
    assert_eq!(stats.memory_usage_bytes, 0);
}

#[test]
fn stats_report_bounds() {
    let cache = cache(4, 3 * MB);
    cache.put("A", blob("A", 100));
    let stats = cache.stats();
    assert_eq!(stats.capacity, 4);
    assert_eq!(stats.memory_budget_bytes, 3 * MB);
    assert_eq!(stats.memory_usage_bytes, 100);
}

#[test]
fn bounds_hold_after_every_put() {
    let cache = cache(4, 10 * KB);
    let sizes = [1, 3, 9, 2, 11, 4, 4, 4, 1, 7, 2, 6];
    let keys = ["A", "B", "C", "D", "E", "F"];
    for (step, size) in sizes.iter().enumerate() {
        let key = keys[step % keys.len()];
        if step % 3 == 0 {
            cache.get(keys[(step + 1) % keys.len()]);
        }
        cache.put(key, blob(key, size * KB));
        assert!(cache.size() <= 4, "step {step}: size {}", cache.size());
        assert!(
            cache.memory_usage() <= 10 * KB,
            "step {step}: usage {}",
            cache.memory_usage()
        );
        let stats = cache.stats();
        assert_eq!(stats.access_order.len(), stats.size);
    }
}

#[test]
fn concurrent_puts_respect_bounds() {
    let cache = Arc::new(cache(3, 8 * KB));
    let handles: Vec<_> = (0..4)
        .map(|thread| {
            let cache = Arc::clone(&cache);
            std::thread::spawn(move || {
                const KEYS: [&str; 6] = ["A", "B", "C", "D", "E", "F"];
                for i in 0..200 {
                    let key = KEYS[(i + thread) % KEYS.len()];
                    cache.put(key, blob(key, KB * ((i % 4) as u64 + 1)));
                    cache.get(KEYS[i % KEYS.len()]);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    assert!(cache.size() <= 3);
    assert!(cache.memory_usage() <= 8 * KB);
}
