//! Input and output file handling.
//!
//! This module provides the file abstractions the workflow stages exchange:
//! - **FileRef**: an input location, resolved to a local path on demand
//! - **StagingMode**: whether inputs are used in place or copied first
//! - **OutputFile**: a locally written file plus its publish destination
//!
//! # Usage
//!
//! ```rust,ignore
//! use synteny_wf::storage::{FileRef, OutputFile, StagingMode};
//!
//! let reads = FileRef::new("/data/fastq/S1_R1.fastq");
//! let local = reads.resolve_local(&StagingMode::InPlace).await?;
//!
//! let output = OutputFile::write("/work/task_S1.txt", "/results/task_S1.txt", b"...").await?;
//! output.publish().await?;
//! ```

pub mod files;

pub use files::{compute_checksum, join_remote, FileRef, OutputFile, StagingMode};
