//! Per-sample processing.
//!
//! Each sample resolves its two read files and records their local paths in
//! `task_<identifier>.txt`, destined for the sample's output root.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::QuantifyError;
use crate::storage::{join_remote, OutputFile, StagingMode};

use super::discover::Sample;

/// Settings shared by every per-sample worker.
#[derive(Debug, Clone)]
pub struct QuantifyContext {
    /// Directory the per-sample file is written to.
    pub work_dir: PathBuf,
    pub staging: StagingMode,
}

impl QuantifyContext {
    pub fn new(work_dir: impl Into<PathBuf>, staging: StagingMode) -> Self {
        Self {
            work_dir: work_dir.into(),
            staging,
        }
    }
}

/// File name of a sample's output.
pub fn output_file_name(identifier: &str) -> String {
    format!("task_{}.txt", identifier)
}

/// Contents of a sample's output file.
pub fn render_record(forward: &Path, reverse: &Path) -> String {
    format!(
        "Forward read: {}\nReverse read: {}\n",
        forward.display(),
        reverse.display()
    )
}

/// Processes one sample and returns its output file.
///
/// Running this again for the same sample overwrites the same file with the
/// same contents.
///
/// # Errors
///
/// Returns `QuantifyError` if a read cannot be resolved or the output cannot
/// be written.
pub async fn quantify_sample(
    sample: &Sample,
    ctx: &QuantifyContext,
) -> Result<OutputFile, QuantifyError> {
    let staging_error = |source| QuantifyError::Staging {
        sample: sample.identifier.clone(),
        source,
    };

    let forward_local = sample
        .forward_read
        .resolve_local(&ctx.staging)
        .await
        .map_err(staging_error)?;
    let reverse_local = sample
        .reverse_read
        .resolve_local(&ctx.staging)
        .await
        .map_err(staging_error)?;

    let file_name = output_file_name(&sample.identifier);
    let output_path = ctx.work_dir.join(&file_name);
    let contents = render_record(&forward_local, &reverse_local);

    let output = OutputFile::write(
        &output_path,
        join_remote(&sample.outdir, &file_name),
        contents.as_bytes(),
    )
    .await
    .map_err(|source| QuantifyError::Write {
        sample: sample.identifier.clone(),
        path: output_path.clone(),
        source,
    })?;

    info!(sample = %sample.identifier, "Information written to {}", output_path.display());

    Ok(output)
}
