//! On-disk registry artifacts.
//!
//! Layout: `<root>/<name>-<version>/registry.bin` (bincode) or, for artifacts
//! produced by external tooling, `<root>/<name>-<version>/registry.json`. Both
//! carry the same [`ArtifactFile`] payload; the binary form wins when both exist.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{DocObject, Registry};
use crate::package::PackageInfo;

pub const ARTIFACT_FORMAT_VERSION: u32 = 1;
pub const BINARY_ARTIFACT_FILENAME: &str = "registry.bin";
pub const JSON_ARTIFACT_FILENAME: &str = "registry.json";

#[derive(Serialize, Deserialize)]
struct ArtifactFile {
    format_version: u32,
    package: String,
    version: String,
    objects: Vec<DocObject>,
}

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("failed to access artifact {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed binary artifact: {0}")]
    Bincode(#[from] bincode::Error),

    #[error("malformed json artifact: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported artifact format version: expected {expected}, found {found}")]
    UnsupportedVersion { expected: u32, found: u32 },
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> ArtifactError + '_ {
    move |source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn is_json(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "json")
}

/// Deserialize the artifact at `path`. The format is chosen by file extension.
pub fn read_artifact(path: &Path) -> Result<Registry, ArtifactError> {
    let bytes = std::fs::read(path).map_err(io_error(path))?;
    let file: ArtifactFile = if is_json(path) {
        serde_json::from_slice(&bytes)?
    } else {
        bincode::deserialize(&bytes)?
    };

    if file.format_version != ARTIFACT_FORMAT_VERSION {
        return Err(ArtifactError::UnsupportedVersion {
            expected: ARTIFACT_FORMAT_VERSION,
            found: file.format_version,
        });
    }

    Ok(Registry::new(file.package, file.version, file.objects))
}

/// Serialize `registry` to `path`, creating parent directories.
///
/// The payload is written to a sibling temp file and renamed into place so readers never
/// observe a partially written artifact.
pub fn write_artifact(path: &Path, registry: &Registry) -> Result<(), ArtifactError> {
    let file = ArtifactFile {
        format_version: ARTIFACT_FORMAT_VERSION,
        package: registry.package().to_owned(),
        version: registry.version().to_owned(),
        objects: registry.objects().cloned().collect(),
    };
    let bytes = if is_json(path) {
        serde_json::to_vec_pretty(&file)?
    } else {
        bincode::serialize(&file)?
    };

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(io_error(parent))?;
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(format!(".tmp.{}", std::process::id()));
    let tmp = PathBuf::from(tmp);
    std::fs::write(&tmp, &bytes).map_err(io_error(&tmp))?;
    std::fs::rename(&tmp, path).map_err(|source| {
        let _ = std::fs::remove_file(&tmp);
        ArtifactError::Io {
            path: path.to_path_buf(),
            source,
        }
    })
}

/// Locates, checks for and deserializes artifacts.
pub trait ArtifactStore: Send + Sync {
    /// Where the artifact for `package` lives (whether or not it exists yet).
    fn artifact_path(&self, package: &PackageInfo) -> PathBuf;

    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn load(&self, path: &Path) -> Result<Registry, ArtifactError> {
        read_artifact(path)
    }
}

/// Artifacts stored under a single root directory.
#[derive(Debug, Clone)]
pub struct FsArtifactStore {
    root: PathBuf,
}

impl FsArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn package_dir(&self, package: &PackageInfo) -> PathBuf {
        self.root.join(package.dir_name())
    }
}

impl ArtifactStore for FsArtifactStore {
    fn artifact_path(&self, package: &PackageInfo) -> PathBuf {
        let dir = self.package_dir(package);
        let binary = dir.join(BINARY_ARTIFACT_FILENAME);
        let json = dir.join(JSON_ARTIFACT_FILENAME);
        if !binary.is_file() && json.is_file() {
            json
        } else {
            binary
        }
    }
}
