//! Error types for synteny-wf operations.
//!
//! Defines the error types for each pipeline stage:
//! - Input staging and output publishing
//! - External tool probing
//! - Sample discovery
//! - Per-sample quantification
//! - Summary generation

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while materializing inputs or publishing outputs.
#[derive(Debug, Error)]
pub enum StagingError {
    #[error("Input file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to create directory {path:?}: {source}")]
    DirectoryCreationFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to copy {from:?} to {to:?}: {source}")]
    CopyFailed {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Reference has no file name: {0}")]
    NoFileName(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by the external tool version probe.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Tool '{command}' could not be started: {source}")]
    Unavailable {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Tool '{command}' exited with code {code:?}: {stderr}")]
    Failed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("Tool '{command}' timed out after {timeout:?}")]
    Timeout { command: String, timeout: Duration },
}

/// Errors that can occur during sample discovery.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("FASTQ directory does not exist or is not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("Failed to enumerate {path:?}: {message}")]
    Walk { path: PathBuf, message: String },

    #[error("Samples without a complete R1/R2 pair: {}", .0.join(", "))]
    UnmatchedSamples(Vec<String>),
}

/// Errors that can occur while processing one sample.
#[derive(Debug, Error)]
pub enum QuantifyError {
    #[error("Failed to stage reads for sample '{sample}': {source}")]
    Staging {
        sample: String,
        #[source]
        source: StagingError,
    },

    #[error("Failed to write output for sample '{sample}' to {path:?}: {source}")]
    Write {
        sample: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Worker for sample '{0}' terminated unexpectedly")]
    Aborted(String),
}

impl QuantifyError {
    /// Returns the identifier of the sample that failed.
    pub fn sample(&self) -> &str {
        match self {
            QuantifyError::Staging { sample, .. } => sample,
            QuantifyError::Write { sample, .. } => sample,
            QuantifyError::Aborted(sample) => sample,
        }
    }
}

/// Errors that can occur while writing the summary.
#[derive(Debug, Error)]
pub enum SummaryError {
    #[error("Failed to write summary to {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to create work directory {path:?}: {source}")]
    WorkDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
