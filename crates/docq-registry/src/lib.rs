//! On-demand documentation registries.
//!
//! A *registry* is the immutable in-memory documentation index of one package
//! version, deserialized from an on-disk *artifact*. This crate owns the pieces
//! that decide which registries are resident and which one a query reads:
//!
//! - [`BoundedRegistryCache`]: LRU cache bounded by entry count and by an
//!   estimated memory budget.
//! - [`RegistryLoader`]: package name -> artifact -> registry, generating
//!   missing artifacts through an [`ArtifactGenerator`].
//! - [`ActiveRegistry`]: the single registry a query session reads from.
//! - [`ObjectIndex`]: object path -> owning packages, built lazily per package.
//!
//! Registries are shared as `Arc<Registry>`; eviction drops the cache's
//! reference but never invalidates registries held elsewhere.

mod active;
mod artifact;
mod cache;
mod error;
mod generate;
mod loader;
mod model;
mod object_index;
mod package;

pub use active::ActiveRegistry;
pub use artifact::{
    read_artifact, write_artifact, ArtifactError, ArtifactStore, FsArtifactStore,
    ARTIFACT_FORMAT_VERSION, BINARY_ARTIFACT_FILENAME, JSON_ARTIFACT_FILENAME,
};
pub use cache::{BoundedRegistryCache, CacheStats, RegistryCache};
pub use error::{RegistryError, Result};
pub use generate::{ArtifactGenerator, CommandGenerator, GenerationError, NoopGenerator};
pub use loader::RegistryLoader;
pub use model::{DocObject, ObjectKind, Registry, SourceLocation};
pub use object_index::{scan, ObjectIndex};
pub use package::{
    DocRootPackageSource, ManifestPackageSource, PackageCatalog, PackageInfo, PackageSource,
    StaticPackageSource,
};
