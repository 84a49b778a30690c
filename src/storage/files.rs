//! File references for workflow inputs and outputs.
//!
//! Inputs are addressed by a `FileRef`, a location string that is resolved to
//! a local path on demand. Outputs are `OutputFile`s: a file written in the
//! work directory together with the destination it is published to.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::error::StagingError;

/// Joins a destination root and a file name with a single `/`.
pub fn join_remote(root: &str, name: &str) -> String {
    let root = root.strip_suffix('/').unwrap_or(root);
    format!("{}/{}", root, name)
}

/// Lowercase hex SHA-256 of `data`.
pub fn compute_checksum(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Reference to an input file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileRef {
    remote_path: String,
}

impl FileRef {
    pub fn new(remote_path: impl Into<String>) -> Self {
        Self {
            remote_path: remote_path.into(),
        }
    }

    pub fn from_path(path: &Path) -> Self {
        Self::new(path.to_string_lossy().into_owned())
    }

    /// The location this reference points at.
    pub fn remote_path(&self) -> &str {
        &self.remote_path
    }

    /// Last `/`-separated component of the location, if non-empty.
    pub fn file_name(&self) -> Option<&str> {
        self.remote_path
            .rsplit('/')
            .next()
            .filter(|name| !name.is_empty())
    }

    /// Materializes the file locally and returns its local path.
    ///
    /// May copy data, depending on `mode`.
    pub async fn resolve_local(&self, mode: &StagingMode) -> Result<PathBuf, StagingError> {
        mode.stage(self).await
    }
}

impl std::fmt::Display for FileRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.remote_path)
    }
}

/// How input files are made available to a worker.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StagingMode {
    /// Use the source file where it is.
    #[default]
    InPlace,
    /// Copy the source into the given directory before use.
    ///
    /// Staged copies are left in place after the run; each new staging of the
    /// same file name overwrites the previous copy.
    Copy(PathBuf),
}

impl StagingMode {
    /// Resolves `file` to a local path according to this mode.
    pub async fn stage(&self, file: &FileRef) -> Result<PathBuf, StagingError> {
        let source = PathBuf::from(file.remote_path());
        let canonical = fs::canonicalize(&source).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StagingError::NotFound(source.clone())
            } else {
                StagingError::Io(e)
            }
        })?;

        match self {
            StagingMode::InPlace => Ok(canonical),
            StagingMode::Copy(staging_dir) => {
                let name = file
                    .file_name()
                    .ok_or_else(|| StagingError::NoFileName(file.remote_path().to_string()))?;

                fs::create_dir_all(staging_dir).await.map_err(|source| {
                    StagingError::DirectoryCreationFailed {
                        path: staging_dir.clone(),
                        source,
                    }
                })?;

                let destination = staging_dir.join(name);
                if let Ok(existing) = fs::canonicalize(&destination).await {
                    if existing == canonical {
                        debug!(path = %canonical.display(), "Input already in staging directory");
                        return Ok(canonical);
                    }
                }

                fs::copy(&canonical, &destination)
                    .await
                    .map_err(|source| StagingError::CopyFailed {
                        from: canonical.clone(),
                        to: destination.clone(),
                        source,
                    })?;

                debug!(from = %canonical.display(), to = %destination.display(), "Staged input");
                Ok(destination)
            }
        }
    }
}

/// A file produced by the workflow and the destination it belongs at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputFile {
    /// Where the file was written.
    pub local_path: PathBuf,
    /// Where the file is published to.
    pub remote_path: String,
    /// SHA-256 of the written contents.
    pub sha256: String,
}

impl OutputFile {
    /// Writes `contents` to `local_path`, replacing any existing file.
    pub async fn write(
        local_path: impl Into<PathBuf>,
        remote_path: impl Into<String>,
        contents: &[u8],
    ) -> std::io::Result<Self> {
        let local_path = local_path.into();

        let mut file = fs::File::create(&local_path).await?;
        file.write_all(contents).await?;
        file.sync_all().await?;

        Ok(Self {
            local_path,
            remote_path: remote_path.into(),
            sha256: compute_checksum(contents),
        })
    }

    pub fn destination_path(&self) -> &str {
        &self.remote_path
    }

    /// Copies the local file to its destination and returns the destination path.
    ///
    /// A destination that already is the local file is left untouched.
    pub async fn publish(&self) -> Result<PathBuf, StagingError> {
        let destination = PathBuf::from(&self.remote_path);

        if destination == self.local_path || self.is_same_file(&destination).await {
            return Ok(destination);
        }

        if let Some(parent) = destination.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.map_err(|source| {
                StagingError::DirectoryCreationFailed {
                    path: parent.to_path_buf(),
                    source,
                }
            })?;
        }

        fs::copy(&self.local_path, &destination)
            .await
            .map_err(|source| StagingError::CopyFailed {
                from: self.local_path.clone(),
                to: destination.clone(),
                source,
            })?;

        Ok(destination)
    }

    async fn is_same_file(&self, destination: &Path) -> bool {
        match (
            fs::canonicalize(&self.local_path).await,
            fs::canonicalize(destination).await,
        ) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        }
    }
}
