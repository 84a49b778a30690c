//! The preprocess → quantify → summarize workflow.
//!
//! # Architecture
//!
//! The pipeline consists of several components:
//!
//! - **Discover**: groups a directory of FASTQ files into paired samples
//! - **Quantify**: processes one sample and produces its output file
//! - **Summarize**: lists every per-sample output in a single report
//! - **Orchestrator**: runs the stages in order, fanning out over samples
//! - **Config**: configuration for all pipeline components
//!
//! # Pipeline Flow
//!
//! 1. **Tool check**: the aligner must answer a version query
//! 2. **Discovery**: `<key>_R1*` and `<key>_R2*` files become one sample
//! 3. **Quantification**: each sample is processed concurrently
//! 4. **Summary**: outputs are listed with a total count
//! 5. **Publishing**: outputs are copied to the output directory
//!
//! # Example
//!
//! ```rust,ignore
//! use synteny_wf::pipeline::{PipelineConfig, PipelineOrchestrator, WorkflowParams};
//! use synteny_wf::storage::FileRef;
//!
//! let config = PipelineConfig::new()
//!     .with_max_concurrent_samples(8)
//!     .with_work_dir("/scratch/work");
//!
//! let orchestrator = PipelineOrchestrator::new(config)?;
//!
//! let params = WorkflowParams::new(
//!     "/data/fastq",
//!     FileRef::new("/data/reference.fasta"),
//!     true,
//!     "/results/run-42",
//! );
//!
//! let report = orchestrator.run(&params).await?;
//! println!("Processed {} samples", report.samples.len());
//! ```
//!
//! # Ordering
//!
//! Discovery emits samples in the order their keys first appear in the
//! sorted directory listing. A full run then processes samples sorted by
//! identifier, and the summary lists them in that order.
//!
//! # Unpaired files
//!
//! A sample with only one read is dropped and reported in
//! `Discovery::unmatched`. With strict pairing enabled the run fails instead.

pub mod config;
pub mod discover;
pub mod orchestrator;
pub mod quantify;
pub mod summarize;

// Re-export main types for convenience
pub use config::{ConfigError, PipelineConfig};
pub use discover::{classify, discover_samples, scan_directory, Discovery, ReadType, Sample};
pub use orchestrator::{PipelineError, PipelineOrchestrator, Preprocessed, RunReport, WorkflowParams};
pub use quantify::{quantify_sample, QuantifyContext};
pub use summarize::{render_summary, summarize, SUMMARY_FILE_NAME};
