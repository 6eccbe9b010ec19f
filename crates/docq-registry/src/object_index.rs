use std::collections::{HashMap, HashSet};

use crate::error::Result;
use crate::loader::RegistryLoader;
use crate::model::Registry;

/// Every object path `registry` defines, ordered by path.
///
/// Pure: reads nothing but `registry` and never touches any active slot.
pub fn scan(registry: &Registry) -> impl Iterator<Item = &str> + '_ {
    registry.paths()
}

/// Lazily built map from object path to the packages that define it.
///
/// Packages are scanned one at a time, in priority order (standard packages first, then
/// enumeration order), until the requested path turns up. A package is scanned at most once
/// between [`ObjectIndex::clear`] calls. When several packages define the same path the first
/// one scanned owns it; [`ObjectIndex::owners`] keeps the full list.
#[derive(Debug, Clone, Default)]
pub struct ObjectIndex {
    standard_packages: Vec<String>,
    owners: HashMap<String, Vec<String>>,
    indexed: HashSet<String>,
    scans: usize,
}

impl ObjectIndex {
    /// `standard_packages` are scanned before everything else, in the given order.
    pub fn new(standard_packages: Vec<String>) -> Self {
        Self {
            standard_packages,
            ..Self::default()
        }
    }

    pub fn standard_packages(&self) -> &[String] {
        &self.standard_packages
    }

    /// The package owning `path`, scanning unindexed packages as needed.
    ///
    /// Registries are fetched through `loader` without activating them. A package that fails
    /// to load is skipped and stays unindexed so a later call retries it. When no other package
    /// defines `path`, the first loader error is returned unchanged.
    pub fn resolve_owner(&mut self, path: &str, loader: &RegistryLoader) -> Result<Option<String>> {
        if let Some(owner) = self.owner(path) {
            return Ok(Some(owner.to_owned()));
        }

        let pending: Vec<String> = loader
            .catalog()
            .scan_order(&self.standard_packages)
            .into_iter()
            .filter(|package| !self.indexed.contains(&package.name))
            .map(|package| package.name.clone())
            .collect();

        let mut first_error = None;
        for package in pending {
            let registry = match loader.fetch(&package) {
                Ok(registry) => registry,
                Err(err) => {
                    tracing::warn!(
                        target: "docq.index",
                        package = %package,
                        error = %err,
                        "skipping package that failed to load"
                    );
                    first_error.get_or_insert(err);
                    continue;
                }
            };
            self.index_registry(&package, &registry);
            if let Some(owner) = self.owner(path) {
                return Ok(Some(owner.to_owned()));
            }
        }

        if let Some(err) = first_error {
            return Err(err);
        }

        tracing::debug!(
            target: "docq.index",
            path,
            indexed = self.indexed.len(),
            "object path not found in any package"
        );
        Ok(None)
    }

    /// Record every path of `registry` as owned by `package`.
    ///
    /// Returns the number of paths recorded, or `0` when `package` was already indexed.
    pub fn index_registry(&mut self, package: &str, registry: &Registry) -> usize {
        if !self.indexed.insert(package.to_owned()) {
            return 0;
        }
        self.scans += 1;

        let mut recorded = 0;
        for path in scan(registry) {
            let owners = self.owners.entry(path.to_owned()).or_default();
            if !owners.iter().any(|owner| owner == package) {
                owners.push(package.to_owned());
                recorded += 1;
            }
        }

        tracing::debug!(
            target: "docq.index",
            package,
            paths = recorded,
            "indexed package"
        );
        recorded
    }

    /// First-scanned owner of `path`, without scanning.
    pub fn owner(&self, path: &str) -> Option<&str> {
        self.owners
            .get(path)
            .and_then(|owners| owners.first())
            .map(String::as_str)
    }

    /// Every indexed package defining `path`, in scan order.
    pub fn owners(&self, path: &str) -> &[String] {
        self.owners.get(path).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_indexed(&self, package: &str) -> bool {
        self.indexed.contains(package)
    }

    pub fn indexed_count(&self) -> usize {
        self.indexed.len()
    }

    /// Number of package scans performed since construction or the last clear.
    pub fn scan_count(&self) -> usize {
        self.scans
    }

    /// Number of distinct object paths known.
    pub fn len(&self) -> usize {
        self.owners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }

    /// Forget every mapping. The standard package list is kept.
    pub fn clear(&mut self) {
        self.owners.clear();
        self.indexed.clear();
        self.scans = 0;
    }
}
