use std::sync::Arc;

use crate::model::Registry;

/// The registry a query session reads from.
///
/// Owned by whoever runs queries (one per session or service) and passed explicitly to the
/// loader; there is no process-global slot. Evicting a registry from the cache does not clear
/// it here: the slot keeps its own `Arc`.
#[derive(Debug, Clone, Default)]
pub struct ActiveRegistry {
    current: Option<Arc<Registry>>,
}

impl ActiveRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Point the slot at `registry`, returning the previously active one.
    pub fn set(&mut self, registry: Arc<Registry>) -> Option<Arc<Registry>> {
        self.current.replace(registry)
    }

    pub fn get(&self) -> Option<&Arc<Registry>> {
        self.current.as_ref()
    }

    pub fn package(&self) -> Option<&str> {
        self.current.as_deref().map(Registry::package)
    }

    pub fn is_active(&self, package: &str) -> bool {
        self.package() == Some(package)
    }
}
