use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{RegistryError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PackageInfo {
    pub name: String,
    pub version: String,
}

impl PackageInfo {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }

    /// Directory name used for this package's artifacts (`<name>-<version>`).
    pub fn dir_name(&self) -> String {
        format!("{}-{}", self.name, self.version)
    }

    /// Inverse of [`PackageInfo::dir_name`]; the version is everything after the last `-`
    /// that is followed by a digit.
    pub fn from_dir_name(dir_name: &str) -> Option<Self> {
        let (idx, _) = dir_name.match_indices('-').rev().find(|(idx, _)| {
            dir_name[idx + 1..]
                .chars()
                .next()
                .is_some_and(|c| c.is_ascii_digit())
        })?;
        let (name, version) = (&dir_name[..idx], &dir_name[idx + 1..]);
        (!name.is_empty()).then(|| Self::new(name, version))
    }
}

/// Enumerates installed packages.
pub trait PackageSource: Send + Sync {
    fn list_installed_packages(&self) -> Result<Vec<PackageInfo>>;
}

/// A fixed package list.
#[derive(Debug, Clone, Default)]
pub struct StaticPackageSource {
    packages: Vec<PackageInfo>,
}

impl StaticPackageSource {
    pub fn new(packages: impl IntoIterator<Item = PackageInfo>) -> Self {
        Self {
            packages: packages.into_iter().collect(),
        }
    }
}

impl PackageSource for StaticPackageSource {
    fn list_installed_packages(&self) -> Result<Vec<PackageInfo>> {
        Ok(self.packages.clone())
    }
}

/// A JSON manifest: `[{"name": "json", "version": "2.7.1"}, ...]`.
#[derive(Debug, Clone)]
pub struct ManifestPackageSource {
    path: PathBuf,
}

impl ManifestPackageSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl PackageSource for ManifestPackageSource {
    fn list_installed_packages(&self) -> Result<Vec<PackageInfo>> {
        let listing_error = |message: String| RegistryError::PackageListing {
            path: self.path.clone(),
            message,
        };
        let text = std::fs::read_to_string(&self.path).map_err(|err| listing_error(err.to_string()))?;
        serde_json::from_str(&text).map_err(|err| listing_error(err.to_string()))
    }
}

/// Packages discovered from `<root>/<name>-<version>/` directories, sorted by directory name.
#[derive(Debug, Clone)]
pub struct DocRootPackageSource {
    root: PathBuf,
}

impl DocRootPackageSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl PackageSource for DocRootPackageSource {
    fn list_installed_packages(&self) -> Result<Vec<PackageInfo>> {
        let entries = match std::fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(
                    target: "docq.packages",
                    root = %self.root.display(),
                    "documentation root does not exist; no packages installed"
                );
                return Ok(Vec::new());
            }
            Err(err) => {
                return Err(RegistryError::PackageListing {
                    path: self.root.clone(),
                    message: err.to_string(),
                })
            }
        };

        let mut dir_names: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_ok_and(|ty| ty.is_dir()))
            .filter_map(|entry| entry.file_name().into_string().ok())
            .collect();
        dir_names.sort();

        Ok(dir_names
            .iter()
            .filter_map(|name| PackageInfo::from_dir_name(name))
            .collect())
    }
}

/// Installed packages, enumerated once.
///
/// When a name is listed more than once, the later version replaces the earlier one but keeps
/// the earlier enumeration position.
#[derive(Debug, Clone, Default)]
pub struct PackageCatalog {
    packages: Vec<PackageInfo>,
    by_name: HashMap<String, usize>,
}

impl PackageCatalog {
    pub fn new(packages: impl IntoIterator<Item = PackageInfo>) -> Self {
        let mut catalog = Self::default();
        for package in packages {
            match catalog.by_name.get(&package.name) {
                Some(&idx) => {
                    tracing::debug!(
                        target: "docq.packages",
                        name = %package.name,
                        replaced = %catalog.packages[idx].version,
                        version = %package.version,
                        "package listed twice; keeping the later version"
                    );
                    catalog.packages[idx] = package;
                }
                None => {
                    catalog
                        .by_name
                        .insert(package.name.clone(), catalog.packages.len());
                    catalog.packages.push(package);
                }
            }
        }
        catalog
    }

    pub fn from_source(source: &dyn PackageSource) -> Result<Self> {
        Ok(Self::new(source.list_installed_packages()?))
    }

    pub fn get(&self, name: &str) -> Option<&PackageInfo> {
        self.by_name.get(name).map(|&idx| &self.packages[idx])
    }

    /// Packages in enumeration order.
    pub fn packages(&self) -> &[PackageInfo] {
        &self.packages
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    /// `standard` packages first (those that are installed, in the given order), then every
    /// other package in enumeration order.
    pub fn scan_order<'a>(&'a self, standard: &[String]) -> Vec<&'a PackageInfo> {
        let mut order: Vec<&PackageInfo> = Vec::with_capacity(self.packages.len());
        for name in standard {
            if let Some(package) = self.get(name) {
                if !order.iter().any(|p| p.name == package.name) {
                    order.push(package);
                }
            }
        }
        for package in &self.packages {
            if !standard.contains(&package.name) {
                order.push(package);
            }
        }
        order
    }
}
