use std::path::PathBuf;

use crate::artifact::ArtifactError;
use crate::generate::GenerationError;

pub type Result<T> = std::result::Result<T, RegistryError>;

/// Failures surfaced by the loader and the object index.
///
/// All variants are per-package: a failure for one package never disturbs
/// cached state for another.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("package `{0}` is not installed")]
    UnknownPackage(String),

    #[error("no documentation artifact for `{package}` at {path} (even after generation)")]
    ArtifactNotFound { package: String, path: PathBuf },

    #[error("failed to load registry for `{package}`: {source}")]
    RegistryLoadFailed {
        package: String,
        #[source]
        source: ArtifactError,
    },

    #[error("documentation generation failed for `{package}`: {source}")]
    GenerationFailed {
        package: String,
        #[source]
        source: GenerationError,
    },

    #[error("failed to enumerate installed packages from {path}: {message}")]
    PackageListing { path: PathBuf, message: String },
}

impl RegistryError {
    /// The package the failure is attributed to, if any.
    pub fn package(&self) -> Option<&str> {
        match self {
            RegistryError::UnknownPackage(package)
            | RegistryError::ArtifactNotFound { package, .. }
            | RegistryError::RegistryLoadFailed { package, .. }
            | RegistryError::GenerationFailed { package, .. } => Some(package),
            RegistryError::PackageListing { .. } => None,
        }
    }
}
