use std::collections::HashSet;
use std::sync::Arc;

use docq_config::{DocqConfig, StreamingConfig};
use docq_fuzzy::{Scorer, SubsequenceScorer};
use docq_memory::MemoryPressureThresholds;
use docq_registry::{
    ActiveRegistry, ArtifactGenerator, CommandGenerator, DocRootPackageSource, FsArtifactStore,
    ManifestPackageSource, NoopGenerator, ObjectIndex, PackageCatalog, Registry, RegistryCache,
    RegistryLoader, Result, SourceLocation,
};
use parking_lot::Mutex;

use crate::report::{Ancestor, CacheReport, Hierarchy, ObjectDoc, PackageSummary, SearchHit};
use crate::stream::chunk_text;

struct ServiceState {
    active: ActiveRegistry,
    index: ObjectIndex,
}

/// Query front end over the registry cache.
///
/// Every query runs as one transaction under the service lock: resolve the owning package,
/// make it active, read from it. Concurrent callers therefore never observe a registry
/// activated by someone else's query.
pub struct DocService {
    loader: RegistryLoader,
    streaming: StreamingConfig,
    scorer: Box<dyn Scorer>,
    thresholds: MemoryPressureThresholds,
    state: Mutex<ServiceState>,
}

impl DocService {
    pub fn new(
        loader: RegistryLoader,
        standard_packages: Vec<String>,
        streaming: StreamingConfig,
    ) -> Self {
        Self {
            loader,
            streaming,
            scorer: Box::new(SubsequenceScorer),
            thresholds: MemoryPressureThresholds::default(),
            state: Mutex::new(ServiceState {
                active: ActiveRegistry::new(),
                index: ObjectIndex::new(standard_packages),
            }),
        }
    }

    /// Build the full stack described by `config`. Installed packages are enumerated here,
    /// once.
    pub fn from_config(config: &DocqConfig) -> Result<Self> {
        let root = config.docs.root();
        let catalog = match &config.docs.packages_manifest {
            Some(manifest) => PackageCatalog::from_source(&ManifestPackageSource::new(manifest))?,
            None => PackageCatalog::from_source(&DocRootPackageSource::new(&root))?,
        };

        let generator: Box<dyn ArtifactGenerator> =
            match config.docs.generator.clone().and_then(CommandGenerator::new) {
                Some(generator) => Box::new(generator),
                None => Box::new(NoopGenerator),
            };

        let cache = Arc::new(RegistryCache::new(
            config.cache.capacity,
            config.cache.budget(),
            config.cache.estimator(),
        ));

        tracing::info!(
            target: "docq.query",
            root = %root.display(),
            packages = catalog.len(),
            capacity = config.cache.capacity,
            budget = config.cache.budget().total,
            "documentation service ready"
        );

        let loader = RegistryLoader::new(catalog, FsArtifactStore::new(root), generator, cache);
        Ok(Self::new(
            loader,
            config.docs.standard_packages.clone(),
            config.streaming.clone(),
        ))
    }

    pub fn with_scorer(mut self, scorer: impl Scorer + 'static) -> Self {
        self.scorer = Box::new(scorer);
        self
    }

    pub fn loader(&self) -> &RegistryLoader {
        &self.loader
    }

    /// Resolve the owner of `path` and make it the active registry.
    fn activate_owner(
        state: &mut ServiceState,
        loader: &RegistryLoader,
        path: &str,
    ) -> Result<Option<Arc<Registry>>> {
        let Some(owner) = state.index.resolve_owner(path, loader)? else {
            tracing::debug!(target: "docq.query", path, "object not found");
            return Ok(None);
        };
        loader.load(&owner, &mut state.active).map(Some)
    }

    pub fn lookup(&self, path: &str) -> Result<Option<ObjectDoc>> {
        let mut guard = self.state.lock();
        let Some(registry) = Self::activate_owner(&mut guard, &self.loader, path)? else {
            return Ok(None);
        };
        Ok(registry
            .get(path)
            .map(|object| ObjectDoc::new(registry.package(), object)))
    }

    pub fn source_location(&self, path: &str) -> Result<Option<SourceLocation>> {
        Ok(self.lookup(path)?.and_then(|doc| doc.source))
    }

    /// Superclass chain, mixins and direct children of `path`.
    ///
    /// Superclasses defined outside the owning package are resolved through the object index;
    /// the chain stops at the first class no installed package defines.
    pub fn hierarchy(&self, path: &str) -> Result<Option<Hierarchy>> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let Some(registry) = Self::activate_owner(state, &self.loader, path)? else {
            return Ok(None);
        };
        let Some(object) = registry.get(path) else {
            return Ok(None);
        };

        let mut ancestors = Vec::new();
        let mut seen = HashSet::from([object.path.clone()]);
        let mut next = object.superclass.clone();
        while let Some(superclass) = next.take() {
            if !seen.insert(superclass.clone()) {
                tracing::warn!(
                    target: "docq.query",
                    path,
                    superclass = %superclass,
                    "superclass cycle"
                );
                break;
            }

            let (package, parent) = if let Some(found) = registry.get(&superclass) {
                (
                    Some(registry.package().to_owned()),
                    found.superclass.clone(),
                )
            } else {
                match state.index.resolve_owner(&superclass, &self.loader)? {
                    Some(owner) => {
                        let parent = self
                            .loader
                            .fetch(&owner)?
                            .get(&superclass)
                            .and_then(|found| found.superclass.clone());
                        (Some(owner), parent)
                    }
                    None => (None, None),
                }
            };

            ancestors.push(Ancestor {
                path: superclass,
                package,
            });
            next = parent;
        }

        Ok(Some(Hierarchy {
            path: object.path.clone(),
            package: registry.package().to_owned(),
            kind: object.kind,
            ancestors,
            mixins: object.mixins.clone(),
            children: registry.children(path).to_vec(),
        }))
    }

    /// Fuzzy search over `package` (which becomes active), else the active registry, else every
    /// installed package in scan order (none of them activated). Best match first; ties are
    /// broken by path, then package.
    pub fn search(
        &self,
        query: &str,
        limit: usize,
        package: Option<&str>,
    ) -> Result<Vec<SearchHit>> {
        let registries = {
            let mut guard = self.state.lock();
            match package {
                Some(name) => vec![self.loader.load(name, &mut guard.active)?],
                None => match guard.active.get() {
                    Some(registry) => vec![Arc::clone(registry)],
                    None => self.installed_registries(guard.index.standard_packages()),
                },
            }
        };

        let query = query.trim();
        if query.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }

        let mut ranked: Vec<_> = registries
            .iter()
            .flat_map(|registry| registry.objects().map(move |object| (registry, object)))
            .filter_map(|(registry, object)| {
                let score = self.scorer.score(query, &object.path)?;
                Some((score.rank_key(), score.score, registry.package(), object))
            })
            .collect();
        ranked.sort_by(|a, b| {
            b.0.cmp(&a.0)
                .then_with(|| a.3.path.cmp(&b.3.path))
                .then_with(|| a.2.cmp(b.2))
        });
        ranked.truncate(limit);

        Ok(ranked
            .into_iter()
            .map(|(_, score, package, object)| SearchHit {
                path: object.path.clone(),
                package: package.to_owned(),
                kind: object.kind,
                score,
            })
            .collect())
    }

    /// Every installed registry that loads, in scan order. Failures are logged and skipped.
    fn installed_registries(&self, standard_packages: &[String]) -> Vec<Arc<Registry>> {
        self.loader
            .catalog()
            .scan_order(standard_packages)
            .into_iter()
            .filter_map(|package| match self.loader.fetch(&package.name) {
                Ok(registry) => Some(registry),
                Err(err) => {
                    tracing::warn!(
                        target: "docq.query",
                        package = %package.name,
                        error = %err,
                        "skipping package in search"
                    );
                    None
                }
            })
            .collect()
    }

    pub fn list_packages(&self) -> Vec<PackageSummary> {
        let guard = self.state.lock();
        self.loader
            .catalog()
            .packages()
            .iter()
            .map(|package| PackageSummary {
                name: package.name.clone(),
                version: package.version.clone(),
                resident: self.loader.cache().contains(&package.name),
                indexed: guard.index.is_indexed(&package.name),
                active: guard.active.is_active(&package.name),
            })
            .collect()
    }

    /// Make `name` the active registry.
    pub fn load_package(&self, name: &str) -> Result<Arc<Registry>> {
        let mut guard = self.state.lock();
        self.loader.load(name, &mut guard.active)
    }

    pub fn active_package(&self) -> Option<String> {
        self.state.lock().active.package().map(str::to_owned)
    }

    pub fn cache_stats(&self) -> CacheReport {
        let guard = self.state.lock();
        let cache = self.loader.cache();
        let stats = cache.stats();
        let budget = cache.budget();
        CacheReport {
            usage_ratio: budget.usage_ratio(stats.memory_usage_bytes),
            pressure: self
                .thresholds
                .level_for_usage(budget, stats.memory_usage_bytes),
            indexed_packages: guard.index.indexed_count(),
            indexed_paths: guard.index.len(),
            active_package: guard.active.package().map(str::to_owned),
            stats,
        }
    }

    /// Drop every resident registry and the object index. The active registry stays readable.
    pub fn clear_cache(&self) {
        let mut guard = self.state.lock();
        let dropped = self.loader.cache().size();
        self.loader.cache().clear();
        guard.index.clear();
        tracing::info!(target: "docq.query", dropped, "cleared registry cache and object index");
    }

    /// The docstring of `path`, split for streaming.
    pub fn render_docstring(&self, path: &str) -> Result<Option<Vec<String>>> {
        Ok(self.lookup(path)?.map(|doc| self.docstring_chunks(&doc)))
    }

    /// Split an already looked-up docstring for streaming, without another query.
    ///
    /// A single chunk is returned when streaming is disabled or the text fits in one chunk.
    pub fn docstring_chunks(&self, doc: &ObjectDoc) -> Vec<String> {
        if !self.streaming.enabled || doc.docstring.len() <= self.streaming.chunk_size {
            return vec![doc.docstring.clone()];
        }
        chunk_text(&doc.docstring, self.streaming.chunk_size)
            .into_iter()
            .map(str::to_owned)
            .collect()
    }
}

impl std::fmt::Debug for DocService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocService")
            .field("loader", &self.loader)
            .field("streaming", &self.streaming)
            .finish_non_exhaustive()
    }
}
