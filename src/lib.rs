//! synteny-wf: paired-end FASTQ workflow.
//!
//! This library groups FASTQ files into samples, processes every sample
//! concurrently, and writes a summary of the per-sample outputs.

pub mod cli;
pub mod error;
pub mod execution;
pub mod pipeline;
pub mod storage;

// Re-export commonly used error types
pub use error::{DiscoveryError, QuantifyError, StagingError, SummaryError, ToolError};
