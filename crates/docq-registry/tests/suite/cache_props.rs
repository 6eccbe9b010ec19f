use std::sync::Arc;

use docq_memory::{MemoryBudget, MemoryEstimator, MemoryFootprint, KB};
use docq_registry::BoundedRegistryCache;
use proptest::prelude::*;

const PROPTEST_CASES: u32 = 256;

const KEYS: [&str; 6] = ["A", "B", "C", "D", "E", "F"];

#[derive(Debug)]
struct Weighted(u64);

impl MemoryFootprint for Weighted {
    fn object_count(&self) -> usize {
        1
    }

    fn heap_bytes(&self) -> Option<u64> {
        Some(self.0)
    }
}

#[derive(Debug, Clone)]
enum Op {
    Put(&'static str, u64),
    Get(&'static str),
    Delete(&'static str),
}

fn key_strategy() -> impl Strategy<Value = &'static str> {
    prop::sample::select(KEYS.to_vec())
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (key_strategy(), 0u64..12 * KB).prop_map(|(key, bytes)| Op::Put(key, bytes)),
        2 => key_strategy().prop_map(Op::Get),
        1 => key_strategy().prop_map(Op::Delete),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig { cases: PROPTEST_CASES, .. ProptestConfig::default() })]

    #[test]
    fn bounds_and_recency_hold_after_every_operation(
        capacity in 0usize..5,
        budget in 0u64..24 * KB,
        ops in prop::collection::vec(op_strategy(), 1..64),
    ) {
        let cache: BoundedRegistryCache<Weighted> = BoundedRegistryCache::new(
            capacity,
            MemoryBudget::from_bytes(budget),
            MemoryEstimator::default(),
        );

        for (step, op) in ops.iter().enumerate() {
            match *op {
                Op::Put(key, bytes) => {
                    let evicted = cache.put(key, Arc::new(Weighted(bytes)));
                    if cache.contains(key) {
                        prop_assert!(!evicted.iter().any(|old| old == key), "step {}", step);
                        let stats = cache.stats();
                        prop_assert_eq!(
                            stats.access_order.last().map(String::as_str),
                            Some(key)
                        );
                    }
                }
                Op::Get(key) => {
                    let present = cache.contains(key);
                    prop_assert_eq!(cache.get(key).is_some(), present);
                    if present {
                        let stats = cache.stats();
                        prop_assert_eq!(
                            stats.access_order.last().map(String::as_str),
                            Some(key)
                        );
                    }
                }
                Op::Delete(key) => {
                    let present = cache.contains(key);
                    prop_assert_eq!(cache.delete(key), present);
                    prop_assert!(!cache.contains(key));
                }
            }

            let stats = cache.stats();
            prop_assert!(stats.size <= capacity, "step {}: size {}", step, stats.size);
            prop_assert!(
                stats.memory_usage_bytes <= budget,
                "step {}: usage {} over {}",
                step,
                stats.memory_usage_bytes,
                budget
            );

            let mut order = stats.access_order.clone();
            order.sort();
            let mut stored: Vec<String> = KEYS
                .iter()
                .filter(|key| cache.contains(key))
                .map(|key| (*key).to_owned())
                .collect();
            stored.sort();
            prop_assert_eq!(order, stored, "step {}: access order is not the stored key set", step);
        }
    }
}
