//! Command-line interface for synteny-wf.
//!
//! Provides commands for running the workflow, previewing sample discovery,
//! and checking the external aligner.

mod commands;

pub use commands::{parse_cli, run, run_with_cli, Cli, Commands};
