mod logging;

use anyhow::Context;
use clap::{ArgAction, Parser};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tabcmp_core::{
    ComparisonConfig, DEFAULT_CONFIG_PATH, Diagnostic, RecordingSink, Tee, ToolError,
    TracingSink, Verdict, compare_files_with_verdict,
};

/// Exit code for a completed comparison that did not match, with
/// `--fail-on-mismatch`.
const MISMATCH_EXIT_CODE: i32 = 1;

pub fn run_from_env() -> i32 {
    match run(std::env::args().skip(1)) {
        Ok(code) => code,
        Err(error) => {
            let tool_error = error.as_tool_error();
            eprintln!("{}", tool_error.diagnostic_line());
            if let Some(summary_line) = tool_error.fatal_exit_line() {
                eprintln!("{}", summary_line);
            }
            tool_error.exit_code()
        }
    }
}

pub fn run<I, S>(args: I) -> Result<i32, CliError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let full_args = std::iter::once("tabcmp".to_string())
        .chain(args.into_iter().map(Into::into))
        .collect::<Vec<_>>();

    match Cli::try_parse_from(&full_args) {
        Ok(cli) => run_comparison(cli),
        Err(err) => match err.kind() {
            clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => {
                print!("{}", err);
                Ok(0)
            }
            _ => Err(CliError::Usage(err.to_string())),
        },
    }
}

#[derive(Parser)]
#[command(
    name = "tabcmp",
    version,
    about = "Compare an expected file against a calculated file"
)]
struct Cli {
    /// First file in comparison (expected)
    #[arg(long = "file_1", alias = "file-1", value_name = "PATH")]
    file_1: PathBuf,

    /// Second file in comparison (calculated)
    #[arg(long = "file_2", alias = "file-2", value_name = "PATH")]
    file_2: PathBuf,

    /// Path to comparison configuration file
    #[arg(long, default_value = DEFAULT_CONFIG_PATH, value_name = "PATH")]
    config: PathBuf,

    /// Label prefixed to progress messages
    #[arg(long, default_value = "test")]
    label: String,

    /// Write the verdict and diagnostics as JSON
    #[arg(long, value_name = "PATH")]
    report: Option<PathBuf>,

    /// Exit with code 1 when the files do not match
    #[arg(long)]
    fail_on_mismatch: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, conflicts_with = "quiet")]
    verbose: u8,

    /// Only log warnings
    #[arg(short, long)]
    quiet: bool,
}

fn run_comparison(cli: Cli) -> Result<i32, CliError> {
    logging::init_logging(logging::level_for(cli.verbose, cli.quiet));

    let config = ComparisonConfig::from_path(&cli.config).map_err(ToolError::from)?;

    let recorder = RecordingSink::new();
    let sink = Tee::new(&TracingSink, &recorder);

    tracing::info!(target: "tabcmp", "Start comparison of files.");
    let verdict = compare_files_with_verdict(
        &cli.file_1,
        &cli.file_2,
        &cli.label,
        Some(&config),
        &sink,
    )
    .map_err(ToolError::from)?;
    tracing::info!(target: "tabcmp", "Finished comparison of files: {}.", verdict.matched);

    if let Some(report_path) = &cli.report {
        let report = ComparisonReport {
            label: &cli.label,
            file_1: &cli.file_1,
            file_2: &cli.file_2,
            config: &cli.config,
            verdict: &verdict,
            diagnostics: recorder.into_entries(),
        };
        write_report(report_path, &report)?;
    }

    println!(
        "Comparison status: {}",
        if verdict.matched { "MATCH" } else { "MISMATCH" }
    );
    for issue in &verdict.issues {
        println!("  {}", issue);
    }

    if !verdict.matched && cli.fail_on_mismatch {
        return Ok(MISMATCH_EXIT_CODE);
    }
    Ok(0)
}

#[derive(Serialize)]
struct ComparisonReport<'a> {
    label: &'a str,
    file_1: &'a Path,
    file_2: &'a Path,
    config: &'a Path,
    verdict: &'a Verdict,
    diagnostics: Vec<Diagnostic>,
}

fn write_report(path: &Path, report: &ComparisonReport<'_>) -> Result<(), CliError> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| {
            format!("failed to create report directory '{}'", parent.display())
        })?;
    }
    let content =
        serde_json::to_string_pretty(report).context("failed to serialize comparison report")?;
    fs::write(path, content)
        .with_context(|| format!("failed to write report '{}'", path.display()))?;
    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),
    #[error("{0}")]
    Tool(#[from] ToolError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl CliError {
    fn as_tool_error(&self) -> ToolError {
        match self {
            Self::Usage(message) => ToolError::input_validation("INPUT.CLI_USAGE", message.clone()),
            Self::Tool(error) => error.clone(),
            Self::Internal(error) => ToolError::io_system("IO.CLI", format!("{error:#}")),
        }
    }
}
