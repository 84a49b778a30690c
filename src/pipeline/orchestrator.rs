//! Pipeline orchestrator for the preprocess → quantify → summarize workflow.
//!
//! This module provides the main `PipelineOrchestrator` that coordinates:
//! - The external tool check
//! - Sample discovery
//! - Concurrent per-sample processing
//! - The run summary
//! - Publishing outputs to their destinations

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{DiscoveryError, QuantifyError, StagingError, SummaryError, ToolError};
use crate::execution::ToolVersion;
use crate::storage::{FileRef, OutputFile};

use super::config::{ConfigError, PipelineConfig};
use super::discover::{discover_samples, scan_directory, Discovery, Sample};
use super::quantify::{quantify_sample, QuantifyContext};

/// Errors that can occur during pipeline operations.
///
/// Every variant aborts the run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The external tool is missing or failed its version query.
    #[error("Tool check failed: {0}")]
    Tool(#[from] ToolError),

    /// Input enumeration or pairing failed.
    #[error("Discovery failed: {0}")]
    Discovery(#[from] DiscoveryError),

    /// A sample could not be processed.
    #[error("Quantification failed: {0}")]
    Quantify(#[from] QuantifyError),

    /// The summary could not be written.
    #[error("Summary failed: {0}")]
    Summary(#[from] SummaryError),

    /// An output could not be published.
    #[error("Publishing failed: {0}")]
    Publish(#[from] StagingError),

    /// The work directory could not be created.
    #[error("Failed to create work directory {path:?}: {source}")]
    WorkDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A background task panicked or was cancelled.
    #[error("Background task failed: {0}")]
    TaskJoin(String),
}

/// The four parameters of a workflow run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowParams {
    /// Directory holding the paired FASTQ files.
    pub fastq_directory: PathBuf,
    /// Reference shared by all samples.
    pub reference_file: FileRef,
    /// Flag echoed into the summary.
    pub optional_bool: bool,
    /// Destination root for all outputs.
    pub output_directory: String,
}

impl WorkflowParams {
    pub fn new(
        fastq_directory: impl Into<PathBuf>,
        reference_file: FileRef,
        optional_bool: bool,
        output_directory: impl Into<String>,
    ) -> Self {
        Self {
            fastq_directory: fastq_directory.into(),
            reference_file,
            optional_bool,
            output_directory: output_directory.into(),
        }
    }
}

/// Outcome of the preprocessing stage.
#[derive(Debug, Clone)]
pub struct Preprocessed {
    pub discovery: Discovery,
    /// `None` when the tool check was skipped.
    pub tool_version: Option<ToolVersion>,
}

/// Report of a complete run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub tool_version: Option<ToolVersion>,
    /// Processed sample identifiers, in summary order.
    pub samples: Vec<String>,
    /// Sample keys dropped for lack of a partner read.
    pub unmatched: Vec<String>,
    /// Input files that were not read files.
    pub ignored: usize,
    /// Per-sample outputs, in summary order.
    pub artifacts: Vec<OutputFile>,
    pub summary: OutputFile,
    /// Whether outputs were copied to their destinations.
    pub published: bool,
}

impl RunReport {
    pub fn duration(&self) -> Duration {
        (self.finished_at - self.started_at)
            .to_std()
            .unwrap_or_default()
    }
}

/// Main pipeline orchestrator that coordinates all stages.
pub struct PipelineOrchestrator {
    config: PipelineConfig,
    concurrency_limiter: Arc<Semaphore>,
}

impl PipelineOrchestrator {
    /// Creates a new pipeline orchestrator with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::Config` if the configuration is invalid.
    pub fn new(config: PipelineConfig) -> Result<Self, PipelineError> {
        config.validate()?;

        let concurrency_limiter = Arc::new(Semaphore::new(config.max_concurrent_samples));

        Ok(Self {
            config,
            concurrency_limiter,
        })
    }

    /// Gets the current configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Runs all stages and publishes the outputs.
    ///
    /// Samples are processed in identifier order, so the summary lists them
    /// sorted regardless of directory order or worker completion order.
    pub async fn run(&self, params: &WorkflowParams) -> Result<RunReport, PipelineError> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let start_time = Instant::now();
        info!(%run_id, fastq_directory = %params.fastq_directory.display(), "Starting workflow run");

        let Preprocessed {
            discovery,
            tool_version,
        } = self.preprocess(params).await?;

        let mut samples = discovery.samples;
        samples.sort_by(|a, b| a.identifier.cmp(&b.identifier));

        let artifacts = self.quantify_all(&samples).await?;
        let summary = self
            .summarize(&artifacts, params.optional_bool, &params.output_directory)
            .await?;

        if self.config.publish {
            self.publish(artifacts.iter().chain(std::iter::once(&summary)))
                .await?;
        }

        info!(
            %run_id,
            samples = artifacts.len(),
            unmatched = discovery.unmatched.len(),
            "Workflow finished in {:?}",
            start_time.elapsed()
        );

        Ok(RunReport {
            run_id,
            started_at,
            finished_at: Utc::now(),
            tool_version,
            samples: samples.into_iter().map(|s| s.identifier).collect(),
            unmatched: discovery.unmatched,
            ignored: discovery.ignored,
            artifacts,
            summary,
            published: self.config.publish,
        })
    }

    /// Checks the external tool and groups the input directory into samples.
    ///
    /// # Errors
    ///
    /// Fails if the tool check fails, the directory cannot be listed, or
    /// strict pairing is on and a sample is incomplete.
    pub async fn preprocess(&self, params: &WorkflowParams) -> Result<Preprocessed, PipelineError> {
        info!("synteny-wf version: {}", env!("CARGO_PKG_VERSION"));

        let tool_version = if self.config.skip_tool_check {
            warn!(tool = %self.config.tool_command, "Skipping external tool check");
            None
        } else {
            Some(self.config.tool_probe().check().await?)
        };

        let dir = params.fastq_directory.clone();
        let entries = tokio::task::spawn_blocking(move || scan_directory(&dir))
            .await
            .map_err(|e| PipelineError::TaskJoin(e.to_string()))??;

        let mut discovery = discover_samples(
            entries,
            &params.reference_file,
            &params.output_directory,
        );
        if self.config.strict_pairing {
            discovery = discovery.into_strict()?;
        }

        info!(
            samples = discovery.samples.len(),
            unmatched = discovery.dropped(),
            ignored = discovery.ignored,
            "Discovered samples"
        );
        debug!(samples = ?discovery.samples, "Sample descriptors");

        Ok(Preprocessed {
            discovery,
            tool_version,
        })
    }

    /// Processes every sample concurrently, bounded by `max_concurrent_samples`.
    ///
    /// Outputs are returned in the order of `samples`. If any sample fails,
    /// the first failure in that order is returned once all workers finish.
    pub async fn quantify_all(&self, samples: &[Sample]) -> Result<Vec<OutputFile>, PipelineError> {
        if samples.is_empty() {
            return Ok(Vec::new());
        }

        let work_dir = self.config.work_dir.clone();
        tokio::fs::create_dir_all(&work_dir)
            .await
            .map_err(|source| PipelineError::WorkDir {
                path: work_dir.clone(),
                source,
            })?;

        let ctx = Arc::new(QuantifyContext::new(work_dir, self.config.staging.clone()));

        let handles = self.spawn_bounded(samples, move |sample| {
            let ctx = Arc::clone(&ctx);
            async move { quantify_sample(&sample, &ctx).await }
        });

        let results = futures::future::join_all(handles).await;

        let mut artifacts = Vec::with_capacity(samples.len());
        for (sample, result) in samples.iter().zip(results) {
            match result {
                Ok(Ok(artifact)) => artifacts.push(artifact),
                Ok(Err(e)) => return Err(e.into()),
                Err(join_error) => {
                    warn!(sample = %sample.identifier, error = %join_error, "Worker terminated");
                    return Err(QuantifyError::Aborted(sample.identifier.clone()).into());
                }
            }
        }

        Ok(artifacts)
    }

    /// Spawns one task per sample, each holding a limiter permit while it runs.
    fn spawn_bounded<F, Fut>(
        &self,
        samples: &[Sample],
        work: F,
    ) -> Vec<JoinHandle<Result<OutputFile, QuantifyError>>>
    where
        F: Fn(Sample) -> Fut,
        Fut: Future<Output = Result<OutputFile, QuantifyError>> + Send + 'static,
    {
        samples
            .iter()
            .cloned()
            .map(|sample| {
                let limiter = Arc::clone(&self.concurrency_limiter);
                let identifier = sample.identifier.clone();
                let task = work(sample);
                tokio::spawn(async move {
                    // The limiter is never closed, so this only fails if that changes.
                    let _permit = limiter
                        .acquire_owned()
                        .await
                        .map_err(|_| QuantifyError::Aborted(identifier))?;
                    task.await
                })
            })
            .collect()
    }

    /// Writes the run summary for `artifacts`.
    pub async fn summarize(
        &self,
        artifacts: &[OutputFile],
        flag: bool,
        output_root: &str,
    ) -> Result<OutputFile, PipelineError> {
        let summary =
            super::summarize::summarize(artifacts, flag, output_root, &self.config.work_dir)
                .await?;
        Ok(summary)
    }

    /// Copies each output to its destination.
    pub async fn publish<'a, I>(&self, outputs: I) -> Result<Vec<PathBuf>, PipelineError>
    where
        I: IntoIterator<Item = &'a OutputFile>,
    {
        let mut published = Vec::new();
        for output in outputs {
            let destination = output.publish().await?;
            debug!(from = %output.local_path.display(), to = %destination.display(), "Published output");
            published.push(destination);
        }
        Ok(published)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config_for(temp_dir: &TempDir) -> PipelineConfig {
        PipelineConfig::default()
            .with_work_dir(temp_dir.path().join("work"))
            .with_skip_tool_check(true)
    }

    fn write_reads(dir: &std::path::Path, names: &[&str]) {
        std::fs::create_dir_all(dir).expect("mkdir fastq");
        for name in names {
            std::fs::write(dir.join(name), "@r\nACGT\n+\nIIII\n").expect("write fixture");
        }
    }

    fn params(temp_dir: &TempDir, flag: bool) -> WorkflowParams {
        WorkflowParams::new(
            temp_dir.path().join("fastq"),
            FileRef::from_path(&temp_dir.path().join("ref.fasta")),
            flag,
            temp_dir.path().join("results").to_string_lossy(),
        )
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let result = PipelineOrchestrator::new(PipelineConfig::default().with_max_concurrent_samples(0));
        assert!(matches!(result, Err(PipelineError::Config(_))));
    }

    #[test]
    fn test_pipeline_error_display() {
        let err = PipelineError::TaskJoin("panicked".to_string());
        assert!(err.to_string().contains("panicked"));

        let err: PipelineError = DiscoveryError::UnmatchedSamples(vec!["S2".to_string()]).into();
        assert!(err.to_string().contains("S2"));
    }

    #[tokio::test]
    async fn test_quantify_all_preserves_input_order() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let fastq = temp_dir.path().join("fastq");
        write_reads(
            &fastq,
            &["Z_R1.fq", "Z_R2.fq", "A_R1.fq", "A_R2.fq", "M_R1.fq", "M_R2.fq"],
        );

        let orchestrator = PipelineOrchestrator::new(
            config_for(&temp_dir).with_max_concurrent_samples(2),
        )
        .expect("orchestrator");

        let samples: Vec<Sample> = ["Z", "A", "M"]
            .iter()
            .map(|id| Sample {
                identifier: id.to_string(),
                forward_read: FileRef::from_path(&fastq.join(format!("{}_R1.fq", id))),
                reverse_read: FileRef::from_path(&fastq.join(format!("{}_R2.fq", id))),
                reference_file: FileRef::new("ref.fasta"),
                outdir: "/results".to_string(),
            })
            .collect();

        let artifacts = orchestrator
            .quantify_all(&samples)
            .await
            .expect("quantify_all should succeed");
        let destinations: Vec<&str> = artifacts.iter().map(|a| a.destination_path()).collect();
        assert_eq!(
            destinations,
            vec!["/results/task_Z.txt", "/results/task_A.txt", "/results/task_M.txt"]
        );
    }

    #[tokio::test]
    async fn test_spawn_bounded_respects_concurrency_limit() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let orchestrator = PipelineOrchestrator::new(
            config_for(&temp_dir).with_max_concurrent_samples(2),
        )
        .expect("orchestrator");

        let samples: Vec<Sample> = (0..6)
            .map(|i| Sample {
                identifier: format!("S{}", i),
                forward_read: FileRef::new(format!("S{}_R1.fq", i)),
                reverse_read: FileRef::new(format!("S{}_R2.fq", i)),
                reference_file: FileRef::new("ref.fasta"),
                outdir: "/results".to_string(),
            })
            .collect();

        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let handles = orchestrator.spawn_bounded(&samples, |sample| {
            let active = Arc::clone(&active);
            let peak = Arc::clone(&peak);
            async move {
                let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(20)).await;
                active.fetch_sub(1, Ordering::SeqCst);
                Ok(OutputFile {
                    local_path: PathBuf::from(format!("task_{}.txt", sample.identifier)),
                    remote_path: format!("/results/task_{}.txt", sample.identifier),
                    sha256: String::new(),
                })
            }
        });

        for result in futures::future::join_all(handles).await {
            result.expect("join").expect("worker");
        }
        assert_eq!(peak.load(Ordering::SeqCst), 2);
        assert_eq!(active.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_quantify_all_reports_failing_sample() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let orchestrator = PipelineOrchestrator::new(config_for(&temp_dir)).expect("orchestrator");

        let samples = vec![Sample {
            identifier: "ghost".to_string(),
            forward_read: FileRef::from_path(&temp_dir.path().join("ghost_R1.fq")),
            reverse_read: FileRef::from_path(&temp_dir.path().join("ghost_R2.fq")),
            reference_file: FileRef::new("ref.fasta"),
            outdir: "/results".to_string(),
        }];

        match orchestrator.quantify_all(&samples).await {
            Err(PipelineError::Quantify(e)) => assert_eq!(e.sample(), "ghost"),
            other => panic!("expected quantify error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_run_sorts_samples_and_publishes() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        write_reads(
            &temp_dir.path().join("fastq"),
            &["b_R1.fq", "b_R2.fq", "a_R2.fq", "a_R1.fq", "c_R1.fq", "notes.txt"],
        );

        let orchestrator = PipelineOrchestrator::new(config_for(&temp_dir)).expect("orchestrator");
        let report = orchestrator
            .run(&params(&temp_dir, true))
            .await
            .expect("run should succeed");

        assert_eq!(report.samples, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(report.unmatched, vec!["c".to_string()]);
        assert_eq!(report.ignored, 1);
        assert!(report.tool_version.is_none());
        assert!(report.published);
        assert!(report.finished_at >= report.started_at);

        let results = temp_dir.path().join("results");
        assert!(results.join("task_a.txt").exists());
        assert!(results.join("task_b.txt").exists());
        let summary = std::fs::read_to_string(results.join("processed_samples_list.txt"))
            .expect("read published summary");
        assert!(summary.contains("Bool was true"));
        assert!(summary.ends_with("Total number of processed samples: 2\n"));
    }

    #[tokio::test]
    async fn test_run_without_publish_leaves_destination_empty() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        write_reads(&temp_dir.path().join("fastq"), &["s_R1.fq", "s_R2.fq"]);

        let orchestrator =
            PipelineOrchestrator::new(config_for(&temp_dir).with_publish(false)).expect("orchestrator");
        let report = orchestrator
            .run(&params(&temp_dir, false))
            .await
            .expect("run should succeed");

        assert!(!report.published);
        assert!(report.summary.local_path.exists());
        assert!(!temp_dir.path().join("results").exists());
    }

    #[tokio::test]
    async fn test_strict_pairing_aborts_run() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        write_reads(&temp_dir.path().join("fastq"), &["s_R1.fq", "s_R2.fq", "t_R1.fq"]);

        let orchestrator = PipelineOrchestrator::new(config_for(&temp_dir).with_strict_pairing(true))
            .expect("orchestrator");
        let result = orchestrator.run(&params(&temp_dir, false)).await;

        assert!(matches!(
            result,
            Err(PipelineError::Discovery(DiscoveryError::UnmatchedSamples(ref keys))) if keys == &vec!["t".to_string()]
        ));
    }
}
