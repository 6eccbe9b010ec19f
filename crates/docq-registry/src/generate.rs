use std::path::Path;
use std::process::Command;

use thiserror::Error;

use crate::package::PackageInfo;

/// Cap on the stderr tail kept in [`GenerationError::Failed`].
const STDERR_TAIL_BYTES: usize = 2048;

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("failed to run `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{program}` exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: String,
        stderr: String,
    },

    #[error("{0}")]
    Other(String),
}

/// Produces the on-disk artifact for a package. Synchronous; may take minutes.
pub trait ArtifactGenerator: Send + Sync {
    fn generate(&self, package: &PackageInfo, output: &Path) -> Result<(), GenerationError>;
}

impl<T: ArtifactGenerator + ?Sized> ArtifactGenerator for Box<T> {
    fn generate(&self, package: &PackageInfo, output: &Path) -> Result<(), GenerationError> {
        (**self).generate(package, output)
    }
}

/// Generator used when no extraction command is configured; leaves missing artifacts missing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopGenerator;

impl ArtifactGenerator for NoopGenerator {
    fn generate(&self, package: &PackageInfo, _output: &Path) -> Result<(), GenerationError> {
        tracing::debug!(
            target: "docq.loader",
            package = %package.name,
            "no documentation generator configured"
        );
        Ok(())
    }
}

/// Runs an external extraction command.
///
/// Every argument has `{name}`, `{version}` and `{output}` substituted before the command is
/// spawned. The output's parent directory is created first.
#[derive(Debug, Clone)]
pub struct CommandGenerator {
    program: String,
    args: Vec<String>,
}

impl CommandGenerator {
    /// `argv[0]` is the program. Returns `None` for an empty command line.
    pub fn new(argv: impl IntoIterator<Item = String>) -> Option<Self> {
        let mut argv = argv.into_iter();
        let program = argv.next()?;
        Some(Self {
            program,
            args: argv.collect(),
        })
    }

    fn expand(template: &str, package: &PackageInfo, output: &Path) -> String {
        template
            .replace("{name}", &package.name)
            .replace("{version}", &package.version)
            .replace("{output}", &output.to_string_lossy())
    }
}

impl ArtifactGenerator for CommandGenerator {
    fn generate(&self, package: &PackageInfo, output: &Path) -> Result<(), GenerationError> {
        if let Some(parent) = output.parent() {
            std::fs::create_dir_all(parent).map_err(|err| {
                GenerationError::Other(format!(
                    "failed to create {}: {err}",
                    parent.display()
                ))
            })?;
        }

        let args: Vec<String> = self
            .args
            .iter()
            .map(|arg| Self::expand(arg, package, output))
            .collect();

        tracing::info!(
            target: "docq.loader",
            package = %package.name,
            version = %package.version,
            program = %self.program,
            "generating documentation artifact"
        );

        let result = Command::new(&self.program)
            .args(&args)
            .output()
            .map_err(|source| GenerationError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if result.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&result.stderr);
        let stderr = stderr.trim();
        let tail_start = stderr
            .char_indices()
            .map(|(idx, _)| idx)
            .find(|&idx| stderr.len() - idx <= STDERR_TAIL_BYTES)
            .unwrap_or(stderr.len());
        Err(GenerationError::Failed {
            program: self.program.clone(),
            status: result.status.to_string(),
            stderr: stderr[tail_start..].to_owned(),
        })
    }
}
