//! Summary of processed samples.

use std::path::Path;

use tracing::info;

use crate::error::SummaryError;
use crate::storage::{join_remote, OutputFile};

/// File name of the run summary.
pub const SUMMARY_FILE_NAME: &str = "processed_samples_list.txt";

const HEADER: &str = "List of Processed Sample Files";
const SEPARATOR: &str = "==============================";

/// Renders the summary listing every artifact's destination in input order.
pub fn render_summary(artifacts: &[OutputFile], flag: bool) -> String {
    let mut out = String::new();
    out.push_str(HEADER);
    out.push('\n');
    out.push_str(SEPARATOR);
    out.push('\n');
    out.push_str(&format!("Bool was {}\n\n", flag));
    for artifact in artifacts {
        out.push_str(artifact.destination_path());
        out.push('\n');
    }
    out.push_str(&format!(
        "\nTotal number of processed samples: {}\n",
        artifacts.len()
    ));
    out
}

/// Writes the summary into `work_dir` and returns it as an output file
/// destined for `output_root`.
///
/// # Errors
///
/// Returns `SummaryError` if the work directory or file cannot be written.
pub async fn summarize(
    artifacts: &[OutputFile],
    flag: bool,
    output_root: &str,
    work_dir: &Path,
) -> Result<OutputFile, SummaryError> {
    tokio::fs::create_dir_all(work_dir)
        .await
        .map_err(|source| SummaryError::WorkDir {
            path: work_dir.to_path_buf(),
            source,
        })?;

    let summary_path = work_dir.join(SUMMARY_FILE_NAME);
    let contents = render_summary(artifacts, flag);

    let summary = OutputFile::write(
        &summary_path,
        join_remote(output_root, SUMMARY_FILE_NAME),
        contents.as_bytes(),
    )
    .await
    .map_err(|source| SummaryError::Write {
        path: summary_path.clone(),
        source,
    })?;

    info!(samples = artifacts.len(), "Summary list written to {}", summary_path.display());

    Ok(summary)
}
