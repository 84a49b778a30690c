//! Pipeline configuration for the orchestrator.
//!
//! This module provides configuration options for the workflow: per-sample
//! concurrency, work and staging locations, the external tool probe, pairing
//! strictness, and output publishing.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::execution::{ToolProbe, DEFAULT_TOOL_ARGS, DEFAULT_TOOL_COMMAND, DEFAULT_TOOL_TIMEOUT};
use crate::storage::StagingMode;

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An environment variable has an invalid value.
    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    /// Configuration validation failed.
    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

/// Configuration for the pipeline orchestrator.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    // Execution settings
    /// Maximum number of samples quantified concurrently.
    pub max_concurrent_samples: usize,
    /// Directory where per-sample and summary files are written.
    pub work_dir: PathBuf,
    /// How input reads are made available to workers.
    pub staging: StagingMode,

    // Tool settings
    /// Aligner binary probed before preprocessing.
    pub tool_command: String,
    /// Arguments for the version query.
    pub tool_args: Vec<String>,
    /// Timeout for the version query.
    pub tool_timeout: Duration,
    /// Skip the version query entirely.
    pub skip_tool_check: bool,

    // Discovery settings
    /// Fail the run when a sample lacks its R1 or R2 file.
    pub strict_pairing: bool,

    // Output settings
    /// Copy outputs to their destination paths after the run.
    pub publish: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_concurrent_samples: 4,
            work_dir: PathBuf::from("./work"),
            staging: StagingMode::InPlace,

            tool_command: DEFAULT_TOOL_COMMAND.to_string(),
            tool_args: DEFAULT_TOOL_ARGS.iter().map(|s| s.to_string()).collect(),
            tool_timeout: DEFAULT_TOOL_TIMEOUT,
            skip_tool_check: false,

            strict_pairing: false,

            publish: true,
        }
    }
}

impl PipelineConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `SYNTENY_MAX_CONCURRENT_SAMPLES`: Concurrent samples (default: 4)
    /// - `SYNTENY_WORK_DIR`: Work directory (default: ./work)
    /// - `SYNTENY_STAGING_DIR`: Copy inputs into this directory (default: use in place)
    /// - `SYNTENY_TOOL_COMMAND`: Aligner binary (default: blastn)
    /// - `SYNTENY_TOOL_ARGS`: Comma-separated version query arguments (default: -version)
    /// - `SYNTENY_TOOL_TIMEOUT_SECS`: Version query timeout (default: 30)
    /// - `SYNTENY_SKIP_TOOL_CHECK`: Skip the version query (default: false)
    /// - `SYNTENY_STRICT_PAIRING`: Reject unpaired samples (default: false)
    /// - `SYNTENY_PUBLISH`: Publish outputs to their destinations (default: true)
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if variables have invalid values.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("SYNTENY_MAX_CONCURRENT_SAMPLES") {
            config.max_concurrent_samples =
                parse_env_value(&val, "SYNTENY_MAX_CONCURRENT_SAMPLES")?;
        }

        if let Ok(val) = std::env::var("SYNTENY_WORK_DIR") {
            config.work_dir = PathBuf::from(val);
        }

        if let Ok(val) = std::env::var("SYNTENY_STAGING_DIR") {
            config.staging = StagingMode::Copy(PathBuf::from(val));
        }

        if let Ok(val) = std::env::var("SYNTENY_TOOL_COMMAND") {
            config.tool_command = val;
        }

        if let Ok(val) = std::env::var("SYNTENY_TOOL_ARGS") {
            config.tool_args = parse_env_list(&val);
        }

        if let Ok(val) = std::env::var("SYNTENY_TOOL_TIMEOUT_SECS") {
            let secs: u64 = parse_env_value(&val, "SYNTENY_TOOL_TIMEOUT_SECS")?;
            config.tool_timeout = Duration::from_secs(secs);
        }

        if let Ok(val) = std::env::var("SYNTENY_SKIP_TOOL_CHECK") {
            config.skip_tool_check = parse_env_bool(&val, "SYNTENY_SKIP_TOOL_CHECK")?;
        }

        if let Ok(val) = std::env::var("SYNTENY_STRICT_PAIRING") {
            config.strict_pairing = parse_env_bool(&val, "SYNTENY_STRICT_PAIRING")?;
        }

        if let Ok(val) = std::env::var("SYNTENY_PUBLISH") {
            config.publish = parse_env_bool(&val, "SYNTENY_PUBLISH")?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationFailed` if any values are invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_concurrent_samples == 0 {
            return Err(ConfigError::ValidationFailed(
                "max_concurrent_samples must be greater than 0".to_string(),
            ));
        }

        if self.work_dir.as_os_str().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "work_dir cannot be empty".to_string(),
            ));
        }

        if let StagingMode::Copy(dir) = &self.staging {
            if dir.as_os_str().is_empty() {
                return Err(ConfigError::ValidationFailed(
                    "staging directory cannot be empty".to_string(),
                ));
            }
        }

        if !self.skip_tool_check {
            if self.tool_command.trim().is_empty() {
                return Err(ConfigError::ValidationFailed(
                    "tool_command cannot be empty".to_string(),
                ));
            }

            if self.tool_timeout.is_zero() {
                return Err(ConfigError::ValidationFailed(
                    "tool_timeout must be greater than 0".to_string(),
                ));
            }
        }

        Ok(())
    }

    /// Builds the tool probe described by this configuration.
    pub fn tool_probe(&self) -> ToolProbe {
        ToolProbe::new(&self.tool_command)
            .with_args(self.tool_args.clone())
            .with_timeout(self.tool_timeout)
    }

    /// Builder method to set max concurrent samples.
    pub fn with_max_concurrent_samples(mut self, max: usize) -> Self {
        self.max_concurrent_samples = max;
        self
    }

    /// Builder method to set the work directory.
    pub fn with_work_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.work_dir = path.into();
        self
    }

    /// Builder method to set the staging mode.
    pub fn with_staging(mut self, staging: StagingMode) -> Self {
        self.staging = staging;
        self
    }

    /// Builder method to set the tool command.
    pub fn with_tool_command(mut self, command: impl Into<String>) -> Self {
        self.tool_command = command.into();
        self
    }

    /// Builder method to set the version query arguments.
    pub fn with_tool_args(mut self, args: Vec<String>) -> Self {
        self.tool_args = args;
        self
    }

    /// Builder method to set the version query timeout.
    pub fn with_tool_timeout(mut self, timeout: Duration) -> Self {
        self.tool_timeout = timeout;
        self
    }

    /// Builder method to skip the version query.
    pub fn with_skip_tool_check(mut self, skip: bool) -> Self {
        self.skip_tool_check = skip;
        self
    }

    /// Builder method to enable strict pairing.
    pub fn with_strict_pairing(mut self, strict: bool) -> Self {
        self.strict_pairing = strict;
        self
    }

    /// Builder method to enable or disable publishing.
    pub fn with_publish(mut self, publish: bool) -> Self {
        self.publish = publish;
        self
    }
}

/// Parse an environment variable value into a type.
fn parse_env_value<T: std::str::FromStr>(value: &str, key: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        message: format!("could not parse '{}'", value),
    })
}

/// Parse an environment variable as a boolean.
fn parse_env_bool(value: &str, key: &str) -> Result<bool, ConfigError> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("expected boolean value, got '{}'", value),
        }),
    }
}

/// Parse a comma-separated list, dropping empty items.
fn parse_env_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::default();
        assert_eq!(config.max_concurrent_samples, 4);
        assert_eq!(config.work_dir, PathBuf::from("./work"));
        assert_eq!(config.staging, StagingMode::InPlace);
        assert_eq!(config.tool_command, "blastn");
        assert_eq!(config.tool_args, vec!["-version".to_string()]);
        assert_eq!(config.tool_timeout, Duration::from_secs(30));
        assert!(!config.skip_tool_check);
        assert!(!config.strict_pairing);
        assert!(config.publish);
    }

    #[test]
    fn test_config_builder() {
        let config = PipelineConfig::new()
            .with_max_concurrent_samples(16)
            .with_work_dir("/tmp/work")
            .with_staging(StagingMode::Copy(PathBuf::from("/tmp/stage")))
            .with_tool_command("bowtie2")
            .with_tool_args(vec!["--version".to_string()])
            .with_tool_timeout(Duration::from_secs(5))
            .with_skip_tool_check(true)
            .with_strict_pairing(true)
            .with_publish(false);

        assert_eq!(config.max_concurrent_samples, 16);
        assert_eq!(config.work_dir, PathBuf::from("/tmp/work"));
        assert_eq!(config.staging, StagingMode::Copy(PathBuf::from("/tmp/stage")));
        assert_eq!(config.tool_command, "bowtie2");
        assert_eq!(config.tool_args, vec!["--version".to_string()]);
        assert_eq!(config.tool_timeout, Duration::from_secs(5));
        assert!(config.skip_tool_check);
        assert!(config.strict_pairing);
        assert!(!config.publish);
    }

    #[test]
    fn test_validation_valid_config() {
        assert!(PipelineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validation_zero_concurrency() {
        let result = PipelineConfig::default()
            .with_max_concurrent_samples(0)
            .validate();
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("max_concurrent_samples"));
    }

    #[test]
    fn test_validation_empty_work_dir() {
        let result = PipelineConfig::default().with_work_dir("").validate();
        assert!(result.unwrap_err().to_string().contains("work_dir"));
    }

    #[test]
    fn test_validation_empty_tool_command() {
        let result = PipelineConfig::default().with_tool_command("  ").validate();
        assert!(result.unwrap_err().to_string().contains("tool_command"));

        // Irrelevant when the probe is skipped.
        let config = PipelineConfig::default()
            .with_tool_command("")
            .with_skip_tool_check(true);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_zero_tool_timeout() {
        let result = PipelineConfig::default()
            .with_tool_timeout(Duration::ZERO)
            .validate();
        assert!(result.unwrap_err().to_string().contains("tool_timeout"));
    }

    #[test]
    fn test_tool_probe_from_config() {
        let probe = PipelineConfig::default()
            .with_tool_command("bwa")
            .with_tool_args(vec![])
            .tool_probe();
        assert_eq!(probe.command(), "bwa");
        assert!(probe.args().is_empty());
    }

    #[test]
    fn test_parse_env_bool() {
        assert!(parse_env_bool("true", "test").unwrap());
        assert!(parse_env_bool("YES", "test").unwrap());
        assert!(parse_env_bool("1", "test").unwrap());
        assert!(!parse_env_bool("off", "test").unwrap());
        assert!(!parse_env_bool("0", "test").unwrap());
        assert!(parse_env_bool("maybe", "test").is_err());
    }

    #[test]
    fn test_parse_env_list() {
        assert_eq!(
            parse_env_list("-version, -help ,,"),
            vec!["-version".to_string(), "-help".to_string()]
        );
        assert!(parse_env_list("").is_empty());
    }

    #[test]
    fn test_parse_env_value() {
        let value: usize = parse_env_value(" 8 ", "KEY").unwrap();
        assert_eq!(value, 8);

        let err = parse_env_value::<usize>("eight", "KEY").unwrap_err();
        assert!(err.to_string().contains("KEY"));
        assert!(err.to_string().contains("eight"));
    }
}
