use std::sync::Arc;

use crate::active::ActiveRegistry;
use crate::artifact::ArtifactStore;
use crate::cache::RegistryCache;
use crate::error::{RegistryError, Result};
use crate::generate::ArtifactGenerator;
use crate::model::Registry;
use crate::package::PackageCatalog;

/// Resolves package names to registries: cache first, then the on-disk artifact, generating it
/// once if it is missing.
pub struct RegistryLoader {
    catalog: PackageCatalog,
    store: Box<dyn ArtifactStore>,
    generator: Box<dyn ArtifactGenerator>,
    cache: Arc<RegistryCache>,
}

impl RegistryLoader {
    pub fn new(
        catalog: PackageCatalog,
        store: impl ArtifactStore + 'static,
        generator: impl ArtifactGenerator + 'static,
        cache: Arc<RegistryCache>,
    ) -> Self {
        Self {
            catalog,
            store: Box::new(store),
            generator: Box::new(generator),
            cache,
        }
    }

    pub fn catalog(&self) -> &PackageCatalog {
        &self.catalog
    }

    pub fn cache(&self) -> &Arc<RegistryCache> {
        &self.cache
    }

    /// Make `package` the active registry of `active` and return it.
    ///
    /// A cache hit promotes the entry and does no I/O.
    pub fn load(&self, package: &str, active: &mut ActiveRegistry) -> Result<Arc<Registry>> {
        let registry = self.fetch(package)?;
        active.set(registry.clone());
        Ok(registry)
    }

    /// Like [`RegistryLoader::load`] but leaves every active slot untouched.
    ///
    /// The registry is still inserted into (or promoted in) the cache.
    pub fn fetch(&self, package: &str) -> Result<Arc<Registry>> {
        if let Some(registry) = self.cache.get(package) {
            tracing::trace!(target: "docq.loader", package, "registry cache hit");
            return Ok(registry);
        }

        let info = self
            .catalog
            .get(package)
            .ok_or_else(|| RegistryError::UnknownPackage(package.to_owned()))?;

        let mut path = self.store.artifact_path(info);
        if !self.store.exists(&path) {
            self.generator
                .generate(info, &path)
                .map_err(|source| RegistryError::GenerationFailed {
                    package: package.to_owned(),
                    source,
                })?;

            // The generator may have written a different artifact flavour.
            path = self.store.artifact_path(info);
            if !self.store.exists(&path) {
                tracing::warn!(
                    target: "docq.loader",
                    package,
                    path = %path.display(),
                    "artifact still missing after generation"
                );
                return Err(RegistryError::ArtifactNotFound {
                    package: package.to_owned(),
                    path,
                });
            }
        }

        let registry = self
            .store
            .load(&path)
            .map(Arc::new)
            .map_err(|source| {
                tracing::warn!(
                    target: "docq.loader",
                    package,
                    path = %path.display(),
                    error = %source,
                    "failed to deserialize registry"
                );
                RegistryError::RegistryLoadFailed {
                    package: package.to_owned(),
                    source,
                }
            })?;

        let evicted = self.cache.put(package, registry.clone());
        tracing::debug!(
            target: "docq.loader",
            package,
            version = %info.version,
            objects = registry.len(),
            evicted = evicted.len(),
            "loaded registry from disk"
        );
        Ok(registry)
    }
}

impl std::fmt::Debug for RegistryLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryLoader")
            .field("packages", &self.catalog.len())
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}
