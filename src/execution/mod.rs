//! External process execution for synteny-wf.
//!
//! The workflow calls out to one external program: the sequence aligner,
//! whose version query gates the start of every run.
//!
//! # Example
//!
//! ```ignore
//! use synteny_wf::execution::ToolProbe;
//!
//! let version = ToolProbe::default().check().await?;
//! println!("{} {}", version.command, version.version);
//! ```

pub mod tool;

pub use tool::{ToolProbe, ToolVersion, DEFAULT_TOOL_ARGS, DEFAULT_TOOL_COMMAND, DEFAULT_TOOL_TIMEOUT};
