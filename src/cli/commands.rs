//! CLI command definitions for synteny-wf.
//!
//! This module provides the command-line interface for running the workflow,
//! previewing sample discovery, and checking the external aligner.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use serde::Serialize;
use tracing::info;

use crate::execution::ToolProbe;
use crate::pipeline::{
    discover_samples, scan_directory, PipelineConfig, PipelineOrchestrator, RunReport,
    WorkflowParams,
};
use crate::storage::{FileRef, StagingMode};

/// Paired-end FASTQ workflow: preprocess, quantify, summarize.
#[derive(Parser)]
#[command(name = "synteny-wf")]
#[command(about = "Pair FASTQ files into samples, process each sample, and summarize the results")]
#[command(version)]
#[command(
    long_about = "synteny-wf groups paired-end FASTQ files (<sample>_R1*, <sample>_R2*) into samples, processes every sample concurrently, and writes a summary of the outputs.\n\nSettings not given on the command line are read from SYNTENY_* environment variables.\n\nExample usage:\n  synteny-wf run -i ./fastq -r ./ref.fasta -o ./results --optional-bool"
)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info", global = true)]
    pub log_level: String,
}

/// Available CLI subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Run the full workflow.
    Run(RunArgs),

    /// List the samples that would be processed, without processing them.
    #[command(alias = "ls")]
    Discover(DiscoverArgs),

    /// Check that the external aligner is installed.
    CheckTool(CheckToolArgs),
}

/// Inputs shared by `run` and `discover`.
#[derive(clap::Args, Debug, Clone)]
pub struct InputArgs {
    /// Directory of FASTQ files.
    #[arg(short = 'i', long)]
    pub fastq_directory: PathBuf,

    /// Reference FASTA file.
    #[arg(short = 'r', long)]
    pub reference_file: String,

    /// Output directory location.
    #[arg(short = 'o', long)]
    pub output_directory: String,

    /// Fail when a sample is missing its R1 or R2 file.
    #[arg(long)]
    pub strict: bool,
}

/// Arguments for `synteny-wf run`.
#[derive(Parser, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Flag echoed into the summary.
    #[arg(short = 'b', long)]
    pub optional_bool: bool,

    /// Directory for intermediate files (default: SYNTENY_WORK_DIR or ./work).
    #[arg(short = 'w', long)]
    pub work_dir: Option<PathBuf>,

    /// Maximum number of samples processed at once.
    #[arg(short = 'j', long)]
    pub concurrency: Option<usize>,

    /// Copy input reads into this directory before processing.
    #[arg(long)]
    pub staging_dir: Option<PathBuf>,

    /// Aligner binary to check before preprocessing.
    #[arg(long)]
    pub tool: Option<String>,

    /// Skip the aligner check.
    #[arg(long)]
    pub skip_tool_check: bool,

    /// Keep outputs in the work directory instead of copying them to the output directory.
    #[arg(long)]
    pub no_publish: bool,

    /// Output the run report as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Arguments for `synteny-wf discover`.
#[derive(Parser, Debug)]
pub struct DiscoverArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Output the discovered samples as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Arguments for `synteny-wf check-tool`.
#[derive(Parser, Debug)]
pub struct CheckToolArgs {
    /// Aligner binary (default: SYNTENY_TOOL_COMMAND or blastn).
    #[arg(long)]
    pub tool: Option<String>,

    /// Timeout in seconds for the version query.
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Output the version as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Parse CLI arguments and return the Cli struct.
///
/// This allows main.rs to access CLI arguments (like log_level) before running commands.
pub fn parse_cli() -> Cli {
    Cli::parse()
}

/// Run the CLI by parsing arguments and executing the command.
pub async fn run() -> anyhow::Result<()> {
    run_with_cli(parse_cli()).await
}

/// Run the CLI with the parsed arguments.
pub async fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Run(args) => run_workflow_command(args).await,
        Commands::Discover(args) => run_discover_command(args).await,
        Commands::CheckTool(args) => run_check_tool_command(args).await,
    }
}

/// Applies command-line overrides on top of the environment configuration.
fn build_config(args: &RunArgs) -> anyhow::Result<PipelineConfig> {
    let mut config = PipelineConfig::from_env()?;

    if let Some(work_dir) = &args.work_dir {
        config = config.with_work_dir(work_dir);
    }
    if let Some(concurrency) = args.concurrency {
        config = config.with_max_concurrent_samples(concurrency);
    }
    if let Some(staging_dir) = &args.staging_dir {
        config = config.with_staging(StagingMode::Copy(staging_dir.clone()));
    }
    if let Some(tool) = &args.tool {
        config = config.with_tool_command(tool);
    }
    if args.skip_tool_check {
        config = config.with_skip_tool_check(true);
    }
    if args.input.strict {
        config = config.with_strict_pairing(true);
    }
    if args.no_publish {
        config = config.with_publish(false);
    }

    config.validate()?;
    Ok(config)
}

fn workflow_params(input: &InputArgs, optional_bool: bool) -> WorkflowParams {
    WorkflowParams::new(
        input.fastq_directory.clone(),
        FileRef::new(input.reference_file.clone()),
        optional_bool,
        input.output_directory.clone(),
    )
}

async fn run_workflow_command(args: RunArgs) -> anyhow::Result<()> {
    let config = build_config(&args)?;
    let params = workflow_params(&args.input, args.optional_bool);

    let orchestrator = PipelineOrchestrator::new(config)?;
    let report = orchestrator.run(&params).await?;

    if args.json {
        let json = serde_json::to_string_pretty(&report)?;
        println!("{json}");
    } else {
        print_report(&report);
    }

    Ok(())
}

fn print_report(report: &RunReport) {
    println!("\n=== Workflow Results ===");
    println!("Run:              {}", report.run_id);
    if let Some(tool) = &report.tool_version {
        println!("Tool:             {} ({})", tool.command, tool.version);
    }
    println!("Samples:          {}", report.samples.len());
    println!("Unpaired dropped: {}", report.unmatched.len());
    println!("Ignored files:    {}", report.ignored);
    println!("Duration:         {:.1}s", report.duration().as_secs_f64());
    println!();

    for artifact in &report.artifacts {
        println!("  {}", artifact.destination_path());
    }
    if !report.unmatched.is_empty() {
        println!("\n  unpaired: {}", report.unmatched.join(", "));
    }

    let summary_location = if report.published {
        report.summary.destination_path().to_string()
    } else {
        report.summary.local_path.display().to_string()
    };
    println!("\nSummary: {}", summary_location);
}

#[derive(Debug, Serialize)]
struct DiscoverOutput {
    samples: Vec<DiscoverEntry>,
    unmatched: Vec<String>,
    ignored: usize,
    replaced: usize,
}

#[derive(Debug, Serialize)]
struct DiscoverEntry {
    identifier: String,
    forward_read: String,
    reverse_read: String,
    destination: String,
}

async fn run_discover_command(args: DiscoverArgs) -> anyhow::Result<()> {
    let input = args.input;
    let dir = input.fastq_directory.clone();
    let entries = tokio::task::spawn_blocking(move || scan_directory(&dir)).await??;

    let reference = FileRef::new(input.reference_file.clone());
    let mut discovery = discover_samples(entries, &reference, &input.output_directory);
    if input.strict {
        discovery = discovery.into_strict()?;
    }

    info!(
        samples = discovery.samples.len(),
        unmatched = discovery.dropped(),
        "Discovery complete"
    );

    let output = DiscoverOutput {
        samples: discovery
            .samples
            .iter()
            .map(|s| DiscoverEntry {
                identifier: s.identifier.clone(),
                forward_read: s.forward_read.remote_path().to_string(),
                reverse_read: s.reverse_read.remote_path().to_string(),
                destination: crate::storage::join_remote(
                    &s.outdir,
                    &crate::pipeline::quantify::output_file_name(&s.identifier),
                ),
            })
            .collect(),
        unmatched: discovery.unmatched,
        ignored: discovery.ignored,
        replaced: discovery.replaced,
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{} sample(s):", output.samples.len());
        for entry in &output.samples {
            println!(
                "  {:<20} {} + {}",
                entry.identifier, entry.forward_read, entry.reverse_read
            );
        }
        if !output.unmatched.is_empty() {
            println!("unpaired: {}", output.unmatched.join(", "));
        }
    }

    Ok(())
}

async fn run_check_tool_command(args: CheckToolArgs) -> anyhow::Result<()> {
    let config = PipelineConfig::from_env()?;

    let mut probe: ToolProbe = config.tool_probe();
    if let Some(tool) = args.tool {
        probe = ToolProbe::new(tool).with_args(config.tool_args.clone());
    }
    let timeout = args
        .timeout
        .map(Duration::from_secs)
        .unwrap_or(config.tool_timeout);
    probe = probe.with_timeout(timeout);

    let version = probe.check().await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&version)?);
    } else {
        println!("{}: {}", version.command, version.version);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_run_command() {
        let cli = Cli::try_parse_from([
            "synteny-wf",
            "run",
            "-i",
            "/data/fastq",
            "-r",
            "/data/ref.fasta",
            "-o",
            "/results",
            "--optional-bool",
            "--concurrency",
            "8",
            "--skip-tool-check",
            "--json",
        ])
        .expect("parse should succeed");

        assert_eq!(cli.log_level, "info");
        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.input.fastq_directory, PathBuf::from("/data/fastq"));
                assert_eq!(args.input.reference_file, "/data/ref.fasta");
                assert_eq!(args.input.output_directory, "/results");
                assert!(args.optional_bool);
                assert_eq!(args.concurrency, Some(8));
                assert!(args.skip_tool_check);
                assert!(args.json);
                assert!(!args.no_publish);
            }
            _ => panic!("expected run command"),
        }
    }

    #[test]
    fn test_parse_discover_alias() {
        let cli = Cli::try_parse_from([
            "synteny-wf",
            "--log-level",
            "debug",
            "ls",
            "--fastq-directory",
            "fq",
            "--reference-file",
            "ref.fa",
            "--output-directory",
            "out",
            "--strict",
        ])
        .expect("parse should succeed");

        assert_eq!(cli.log_level, "debug");
        match cli.command {
            Commands::Discover(args) => {
                assert!(args.input.strict);
                assert!(!args.json);
            }
            _ => panic!("expected discover command"),
        }
    }

    #[test]
    fn test_run_requires_inputs() {
        let result = Cli::try_parse_from(["synteny-wf", "run", "-i", "fq"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_workflow_params_from_args() {
        let input = InputArgs {
            fastq_directory: PathBuf::from("fq"),
            reference_file: "ref.fa".to_string(),
            output_directory: "out".to_string(),
            strict: false,
        };
        let params = workflow_params(&input, true);
        assert_eq!(params.fastq_directory, PathBuf::from("fq"));
        assert_eq!(params.reference_file.remote_path(), "ref.fa");
        assert!(params.optional_bool);
        assert_eq!(params.output_directory, "out");
    }
}
