/// Bytes charged per object when a value cannot report its own heap size.
pub const FALLBACK_BYTES_PER_OBJECT: u64 = 2048;

/// Self-description used by [`MemoryEstimator`].
///
/// `heap_bytes` is the precise path; returning `None` signals that introspection
/// failed (or is not implemented) and the estimator should fall back to
/// `object_count * bytes_per_object`.
pub trait MemoryFootprint {
    /// Number of top-level objects held by the value.
    fn object_count(&self) -> usize;

    fn heap_bytes(&self) -> Option<u64> {
        None
    }
}

impl<T: MemoryFootprint + ?Sized> MemoryFootprint for std::sync::Arc<T> {
    fn object_count(&self) -> usize {
        (**self).object_count()
    }

    fn heap_bytes(&self) -> Option<u64> {
        (**self).heap_bytes()
    }
}

/// Best-effort byte-size estimator. Never fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryEstimator {
    fallback_bytes_per_object: u64,
}

impl MemoryEstimator {
    pub const fn new(fallback_bytes_per_object: u64) -> Self {
        Self {
            fallback_bytes_per_object,
        }
    }

    pub fn fallback_bytes_per_object(&self) -> u64 {
        self.fallback_bytes_per_object
    }

    pub fn estimate<T: MemoryFootprint + ?Sized>(&self, value: &T) -> u64 {
        if let Some(bytes) = value.heap_bytes() {
            return bytes;
        }

        let objects = value.object_count() as u64;
        let bytes = objects.saturating_mul(self.fallback_bytes_per_object);
        tracing::trace!(
            target: "docq.memory",
            objects,
            bytes,
            "heap size unavailable; using per-object estimate"
        );
        bytes
    }
}

impl Default for MemoryEstimator {
    fn default() -> Self {
        Self::new(FALLBACK_BYTES_PER_OBJECT)
    }
}
