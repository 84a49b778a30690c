//! External aligner probe.
//!
//! The workflow refuses to start unless the sequence-alignment tool it is
//! configured with answers a version query successfully.

use std::process::Stdio;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tracing::{debug, info};

use crate::error::ToolError;

/// Default aligner binary.
pub const DEFAULT_TOOL_COMMAND: &str = "blastn";

/// Default arguments for the version query.
pub const DEFAULT_TOOL_ARGS: &[&str] = &["-version"];

/// Default timeout for the version query.
pub const DEFAULT_TOOL_TIMEOUT: Duration = Duration::from_secs(30);

/// Version information reported by the tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolVersion {
    pub command: String,
    /// First non-empty line of stdout, or empty if the tool printed nothing.
    pub version: String,
}

/// Runs `<command> <args...>` and checks that it exits successfully.
#[derive(Debug, Clone)]
pub struct ToolProbe {
    command: String,
    args: Vec<String>,
    timeout: Duration,
}

impl Default for ToolProbe {
    fn default() -> Self {
        Self {
            command: DEFAULT_TOOL_COMMAND.to_string(),
            args: DEFAULT_TOOL_ARGS.iter().map(|s| s.to_string()).collect(),
            timeout: DEFAULT_TOOL_TIMEOUT,
        }
    }
}

impl ToolProbe {
    /// Creates a probe for `command` with no arguments.
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            args: Vec::new(),
            timeout: DEFAULT_TOOL_TIMEOUT,
        }
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Runs the version query.
    ///
    /// # Errors
    ///
    /// Returns `ToolError` if the tool cannot be spawned, exits non-zero,
    /// or does not finish within the timeout.
    pub async fn check(&self) -> Result<ToolVersion, ToolError> {
        let start = Instant::now();

        let mut cmd = Command::new(&self.command);
        cmd.args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!(command = %self.command, args = ?self.args, "Probing external tool");

        let child = cmd.spawn().map_err(|source| ToolError::Unavailable {
            command: self.command.clone(),
            source,
        })?;

        // Dropping the future on timeout kills the child.
        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(source)) => {
                return Err(ToolError::Unavailable {
                    command: self.command.clone(),
                    source,
                })
            }
            Err(_) => {
                return Err(ToolError::Timeout {
                    command: self.command.clone(),
                    timeout: self.timeout,
                })
            }
        };

        if !output.status.success() {
            return Err(ToolError::Failed {
                command: self.command.clone(),
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let version = stdout
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .unwrap_or_default()
            .to_string();

        info!(
            command = %self.command,
            version = %version,
            "External tool available ({:?})",
            start.elapsed()
        );

        Ok(ToolVersion {
            command: self.command.clone(),
            version,
        })
    }
}
