use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use docq_memory::{MemoryBudget, MemoryEstimator, MemoryFootprint};
use serde::Serialize;

use crate::model::Registry;

pub type RegistryCache = BoundedRegistryCache<Registry>;

/// Point-in-time view of a cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub size: usize,
    pub capacity: usize,
    pub memory_budget_bytes: u64,
    pub memory_usage_bytes: u64,
    /// Keys from least to most recently used.
    pub access_order: Vec<String>,
}

struct CacheEntry<V> {
    value: Arc<V>,
    estimated_bytes: u64,
}

struct CacheInner<V> {
    entries: HashMap<String, CacheEntry<V>>,
    /// Least recently used first. Holds exactly the keys of `entries`.
    order: VecDeque<String>,
}

impl<V> CacheInner<V> {
    fn new() -> Self {
        Self {
            entries: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    fn touch(&mut self, key: &str) {
        if let Some(pos) = self.order.iter().position(|k| k == key) {
            if let Some(key) = self.order.remove(pos) {
                self.order.push_back(key);
            }
        }
    }

    fn forget(&mut self, key: &str) {
        if let Some(pos) = self.order.iter().position(|k| k == key) {
            self.order.remove(pos);
        }
    }

    fn pop_lru(&mut self) -> Option<(String, u64)> {
        let key = self.order.pop_front()?;
        let bytes = self
            .entries
            .remove(&key)
            .map(|entry| entry.estimated_bytes)
            .unwrap_or(0);
        Some((key, bytes))
    }

    fn memory_usage(&self) -> u64 {
        self.entries
            .values()
            .fold(0u64, |acc, entry| acc.saturating_add(entry.estimated_bytes))
    }
}

/// LRU cache of shared values bounded by an entry count and an estimated memory budget.
///
/// Every operation holds the single internal lock for its full duration. After each
/// [`put`](Self::put) returns, `size() <= capacity` and `memory_usage() <= budget` hold.
pub struct BoundedRegistryCache<V> {
    capacity: usize,
    budget: MemoryBudget,
    estimator: MemoryEstimator,
    inner: Mutex<CacheInner<V>>,
}

impl<V: MemoryFootprint> BoundedRegistryCache<V> {
    pub fn new(capacity: usize, budget: MemoryBudget, estimator: MemoryEstimator) -> Self {
        Self {
            capacity,
            budget,
            estimator,
            inner: Mutex::new(CacheInner::new()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn budget(&self) -> MemoryBudget {
        self.budget
    }

    /// Returns the cached value and marks it most recently used.
    pub fn get(&self, key: &str) -> Option<Arc<V>> {
        let mut inner = self.lock_inner();
        let value = inner.entries.get(key)?.value.clone();
        inner.touch(key);
        Some(value)
    }

    /// Membership test without touching recency.
    pub fn contains(&self, key: &str) -> bool {
        self.lock_inner().entries.contains_key(key)
    }

    /// Insert or replace `key`, then evict until both bounds hold.
    ///
    /// Replacing an existing key never triggers capacity eviction. A new key evicts the least
    /// recently used entry first when the cache is full. Memory eviction runs after the
    /// insert and may remove any number of entries, including the one just inserted.
    /// With a capacity of zero nothing is retained.
    ///
    /// Returns the evicted keys, oldest first.
    pub fn put(&self, key: impl Into<String>, value: Arc<V>) -> Vec<String> {
        let key = key.into();
        let estimated_bytes = self.estimator.estimate(&*value);

        let mut inner = self.lock_inner();
        let mut evicted = Vec::new();

        if inner.entries.contains_key(&key) {
            inner.forget(&key);
        } else if inner.entries.len() >= self.capacity {
            if let Some((old, bytes)) = inner.pop_lru() {
                self.log_eviction(&old, bytes, "capacity");
                evicted.push(old);
            }
        }

        inner.entries.insert(
            key.clone(),
            CacheEntry {
                value,
                estimated_bytes,
            },
        );
        inner.order.push_back(key);

        // Only reachable with a zero capacity.
        while inner.entries.len() > self.capacity {
            let Some((old, bytes)) = inner.pop_lru() else {
                break;
            };
            self.log_eviction(&old, bytes, "capacity");
            evicted.push(old);
        }

        while self.budget.is_exceeded_by(inner.memory_usage()) {
            let Some((old, bytes)) = inner.pop_lru() else {
                break;
            };
            self.log_eviction(&old, bytes, "memory");
            evicted.push(old);
        }

        evicted
    }

    /// Remove `key` if present. Returns whether an entry was removed.
    pub fn delete(&self, key: &str) -> bool {
        let mut inner = self.lock_inner();
        let removed = inner.entries.remove(key).is_some();
        if removed {
            inner.forget(key);
        }
        removed
    }

    pub fn clear(&self) {
        let mut inner = self.lock_inner();
        inner.entries.clear();
        inner.order.clear();
    }

    pub fn size(&self) -> usize {
        self.lock_inner().entries.len()
    }

    /// Sum of the per-entry estimates, recomputed on every call.
    pub fn memory_usage(&self) -> u64 {
        self.lock_inner().memory_usage()
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.lock_inner();
        CacheStats {
            size: inner.entries.len(),
            capacity: self.capacity,
            memory_budget_bytes: self.budget.total,
            memory_usage_bytes: inner.memory_usage(),
            access_order: inner.order.iter().cloned().collect(),
        }
    }

    fn log_eviction(&self, key: &str, bytes: u64, reason: &'static str) {
        tracing::debug!(
            target: "docq.cache",
            key,
            bytes,
            reason,
            capacity = self.capacity,
            budget = self.budget.total,
            "evicted registry"
        );
    }

    #[track_caller]
    fn lock_inner(&self) -> MutexGuard<'_, CacheInner<V>> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(err) => {
                let loc = std::panic::Location::caller();
                tracing::error!(
                    target: "docq.cache",
                    file = loc.file(),
                    line = loc.line(),
                    column = loc.column(),
                    error = %err,
                    "mutex poisoned; continuing with recovered guard"
                );
                err.into_inner()
            }
        }
    }
}

impl<V> fmt::Debug for BoundedRegistryCache<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundedRegistryCache")
            .field("capacity", &self.capacity)
            .field("budget", &self.budget)
            .finish_non_exhaustive()
    }
}
